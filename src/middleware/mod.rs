pub mod response;
pub mod scope;

pub use response::{ApiResponse, ApiResult};
pub use scope::attach_scope_middleware;
