use crate::catalog::CatalogError;
use crate::host::HostError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Worker(#[from] worker::Error),

    #[error(transparent)]
    Host(#[from] HostError),
}

pub type Result<T> = std::result::Result<T, Error>;
