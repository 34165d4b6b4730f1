use std::{path::PathBuf, time::Duration};


/// Everything that can go wrong while collecting listings.
///
/// Missing optional fields never show up here; those become [`crate::page_scrapers::NOT_AVAILABLE`].
#[derive(Debug, thiserror::Error)]
pub(crate) enum ScrapeError {
    /// The "listings rendered" marker never appeared.
    #[error("listings at {url} did not render within {timeout:?}")]
    LoadTimeout {
        url: String,
        timeout: Duration
    },
    /// A listing without a title or posting date. Only that listing is lost.
    #[error("listing has no {field}")]
    MissingRequiredField {
        field: &'static str
    },
    /// The first page had no listings, so there is no page size to paginate with.
    #[error("the first results page has no listings")]
    EmptyPage,
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },
    #[error("failed to write csv rows to {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error
    },
    #[error("invalid selector {selector:?}: {reason}")]
    Selector {
        selector: String,
        reason: String
    },
    #[error(transparent)]
    Browser(#[from] anyhow::Error)
}
