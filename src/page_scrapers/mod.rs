use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

pub(crate) use self::jobstreet::{JobStreetScraper, Selectors};
#[cfg(test)]
pub(crate) use self::jobstreet::tests as fixtures;

mod jobstreet;


/// Written in place of any optional field the listing did not show.
pub(crate) const NOT_AVAILABLE: &str = "N/A";


/// One job posting as it appears on a search results page.
///
/// Every field is always filled in, either with a real value or with [`NOT_AVAILABLE`].
/// The serde names double as the CSV header, so their order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct JobRecord {
    #[serde(rename = "Date Obtained")]
    pub(crate) date_obtained: String,
    #[serde(rename = "Link")]
    pub(crate) link: String,
    #[serde(rename = "Company")]
    pub(crate) company: String,
    #[serde(rename = "Position")]
    pub(crate) position: String,
    /// Every location tag on the listing, joined with `", "`. Empty rather than N/A when there are none.
    #[serde(rename = "Location")]
    pub(crate) location: String,
    #[serde(rename = "Classification")]
    pub(crate) classification: String,
    #[serde(rename = "Industry")]
    pub(crate) industry: String,
    #[serde(rename = "Salary")]
    pub(crate) salary: String,
    #[serde(rename = "Work Arrangement")]
    pub(crate) work_arrangement: String,
    #[serde(rename = "Day Posted")]
    pub(crate) day_posted: String
}


/// Everything gathered from a single rendered results page
#[derive(Debug, Default)]
pub(crate) struct PageResult {
    /// Listings that parsed, in page order
    pub(crate) records: Vec<JobRecord>,
    /// Listings that were found but could not become a record
    pub(crate) errors: Vec<ScrapeError>,
    /// How many listing fragments the page had, including the ones in `errors`
    pub(crate) fragments: usize,
    /// Size of the whole result set. Only looked for on the first page.
    pub(crate) total_count: Option<usize>
}


pub(super) fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: format!("{e:?}")
    })
}


/// All of the text under `element`, with non-breaking spaces made ordinary and the ends trimmed.
pub(super) fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(|x| x.replace('\u{a0}', " "))
        .collect::<String>()
        .trim()
        .to_string()
}


/// Drops exactly the first and last character, e.g. `"(Hybrid)"` becomes `"Hybrid"`.
pub(super) fn strip_enclosing(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}
