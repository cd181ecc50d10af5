use ltdesk_translator::TranslateError;

use crate::catalog::CatalogError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] TranslateError),

    #[error("No API url/key configured")]
    CredentialsMissing,

    #[error("Presentation channel closed")]
    DisplayClosed,

    #[error("Provider did not answer within {0:?}")]
    Timeout(std::time::Duration),
}
