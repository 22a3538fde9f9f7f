// handlers/protected/mod.rs - handlers that need a derived security scope
//
// Every handler here takes `RequireScope` (or a typed field extractor), so an
// unscoped request is answered with 401 before any business logic runs.
// Services receive the scope's predicates, never a caller-supplied boundary.
pub mod auth;
pub mod scope;
pub mod workers;
