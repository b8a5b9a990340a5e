use domain::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 应用层结果类型
pub type ApplicationResult<T> = Result<T, ApplicationError>;
