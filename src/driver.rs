use log::{error, info, warn};
use serde::Deserialize;

use crate::{
    browser::PageLoader,
    error::ScrapeError,
    page_scrapers::{JobStreetScraper, PageResult},
    paginator::{self, PageUrls},
    persistence::CsvSink
};


/// What to do when a page after the first never finishes rendering.
///
/// The first page always ends the run, since there is nothing saved yet.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TimeoutPolicy {
    /// Log the page and carry on with the next one
    #[default]
    Skip,
    /// Stop paginating and keep what was saved so far
    Abort
}


#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) pages_visited: usize,
    pub(crate) pages_skipped: usize,
    /// Listings that became records
    pub(crate) discovered: usize,
    /// Listings that were found but lacked a title or posting date
    pub(crate) rejected: usize,
    pub(crate) persisted: usize
}


impl RunSummary {
    /// Logs and saves one page's listings, consuming them.
    fn save_page(&mut self, sink: &CsvSink, number: usize, page: PageResult) -> Result<(), ScrapeError> {
        for e in &page.errors {
            error!("Page {number}: {e}");
        }
        let mut records = page.records;
        let found = records.len();
        let persisted = sink.append(&mut records)?;
        info!("Page {number}: found {found} listings, saved {persisted}");

        self.pages_visited += 1;
        self.discovered += found;
        self.rejected += page.errors.len();
        self.persisted += persisted;
        Ok(())
    }
}


/// Walks every page of `search_url`, saving each page's listings before loading the next.
///
/// Rows already in the CSV stay there whatever happens to later pages.
pub(crate) fn run(
    loader: &mut impl PageLoader,
    scraper: &JobStreetScraper,
    sink: &CsvSink,
    search_url: &str,
    on_page_timeout: TimeoutPolicy
) -> Result<RunSummary, ScrapeError> {
    sink.initialize()?;
    let mut summary = RunSummary::default();

    let html = loader.load(search_url)?;
    let page = scraper.scrape(&html, true);
    let (page_size, total_count) = (page.fragments, page.total_count);
    summary.save_page(sink, 1, page)?;

    if page_size == 0 {
        warn!("No listings found at {search_url}");
        return Ok(summary);
    }
    let total = total_count.unwrap_or_else(|| {
        warn!("Could not find the total number of results, only the first page will be scraped");
        page_size
    });
    let page_count = paginator::plan(total, page_size)?;
    info!("{total} listings across {page_count} pages");

    for (number, url) in PageUrls::new(search_url, page_count) {
        let html = match loader.load(&url) {
            Ok(html) => html,
            Err(e @ ScrapeError::LoadTimeout { .. }) => match on_page_timeout {
                TimeoutPolicy::Skip => {
                    warn!("Skipping page {number}: {e}");
                    summary.pages_skipped += 1;
                    continue;
                }
                TimeoutPolicy::Abort => {
                    warn!("Stopping at page {number}: {e}");
                    break;
                }
            },
            Err(e) => return Err(e)
        };
        summary.save_page(sink, number, scraper.scrape(&html, false))?;
    }

    info!(
        "Finished: {} listings found, {} saved to {} ({} pages visited, {} skipped, {} listings rejected)",
        summary.discovered,
        summary.persisted,
        sink.path().display(),
        summary.pages_visited,
        summary.pages_skipped,
        summary.rejected
    );
    Ok(summary)
}
