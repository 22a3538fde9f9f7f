use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Claims decoded fine but carry a role outside the known set
    #[error("Malformed scope: unknown role '{0}'")]
    MalformedScope(String),
}
