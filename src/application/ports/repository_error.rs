/// Failure surfaced by the persistence ports. Adapters translate their
/// driver errors into these variants, so services never see sqlx types.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database unreachable: {0}")]
    ConnectionFailed(String),
    #[error("statement failed: {0}")]
    QueryFailed(String),
    #[error("no such record: {0}")]
    NotFound(String),
    #[error("integrity rule violated: {0}")]
    ConstraintViolation(String),
}
