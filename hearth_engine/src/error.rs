use thiserror::Error;

/// Recoverable placement failures.
///
/// These terminate one branch of an arrangement; sibling branches and the
/// rest of the scene continue. A partial scene is an expected outcome, not an
/// error the caller has to handle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaceError {
    #[error("no model in {0} fits the footprint constraint")]
    NoFit(String),
    #[error("category {0:?} is not in the catalog")]
    InvalidCategory(String),
}

/// Unrecoverable failures that abort a generation session.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("host reply does not match session state {state}")]
    UnexpectedReply { state: &'static str },
    #[error(transparent)]
    Catalog(#[from] hearth_formats::CatalogError),
}
