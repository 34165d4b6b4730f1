use chrono::Local;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::error::ScrapeError;

use super::{compile, element_text, strip_enclosing, JobRecord, PageResult, NOT_AVAILABLE};


/// CSS selectors that tie the scraper to JobStreet's markup.
///
/// These follow whatever the site currently renders, so they live in `config.toml` rather than
/// in code. Any selector left out of the config falls back to the value in [`Selectors::default`].
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct Selectors {
    /// Shows up once the listings have rendered client side.
    pub(crate) loaded_marker: String,
    /// One match per listing. Every selector below is searched for inside a listing.
    pub(crate) job_card: String,
    pub(crate) title: String,
    /// The element whose `href` points at the full posting.
    pub(crate) link: String,
    /// Companies with a profile page are links...
    pub(crate) company_link: String,
    /// ...and the rest are plain text.
    pub(crate) company_text: String,
    /// Repeated, one per location tag.
    pub(crate) location: String,
    pub(crate) classification: String,
    /// Rendered in brackets, e.g. `(Data Science)`.
    pub(crate) industry: String,
    pub(crate) salary: String,
    /// Rendered in brackets, e.g. `(Hybrid)`.
    pub(crate) work_arrangement: String,
    pub(crate) listing_date: String,
    /// Searched for in the whole document, first page only.
    pub(crate) total_count: String
}


impl Default for Selectors {
    fn default() -> Self {
        Self {
            loaded_marker: "a[data-automation='jobTitle']".into(),
            job_card: "article[data-automation='normalJob']".into(),
            title: "a[data-automation='jobTitle']".into(),
            link: "a[data-automation='jobTitle']".into(),
            company_link: "a[data-automation='jobCompany']".into(),
            company_text: "span[data-automation='jobCompany']".into(),
            location: "a[data-automation='jobLocation']".into(),
            classification: "a[data-automation='jobClassification']".into(),
            industry: "a[data-automation='jobSubClassification']".into(),
            salary: "span[data-automation='jobSalary']".into(),
            work_arrangement: "span[data-testid='work-arrangement']".into(),
            listing_date: "span[data-automation='jobListingDate']".into(),
            total_count: "span[data-automation='totalJobsCount']".into(),
        }
    }
}


/// Turns a rendered JobStreet results page into [`JobRecord`]s
pub(crate) struct JobStreetScraper {
    job_card: Selector,
    title: Selector,
    link: Selector,
    company_link: Selector,
    company_text: Selector,
    location: Selector,
    classification: Selector,
    industry: Selector,
    salary: Selector,
    work_arrangement: Selector,
    listing_date: Selector,
    total_count: Selector,
    /// Scheme and host of the search, prepended to the relative links on each listing.
    origin: String,
    count_digits: Regex
}


impl JobStreetScraper {
    pub(crate) fn new(selectors: &Selectors, search_url: &Url) -> Result<Self, ScrapeError> {
        Ok(Self {
            job_card: compile(&selectors.job_card)?,
            title: compile(&selectors.title)?,
            link: compile(&selectors.link)?,
            company_link: compile(&selectors.company_link)?,
            company_text: compile(&selectors.company_text)?,
            location: compile(&selectors.location)?,
            classification: compile(&selectors.classification)?,
            industry: compile(&selectors.industry)?,
            salary: compile(&selectors.salary)?,
            work_arrangement: compile(&selectors.work_arrangement)?,
            listing_date: compile(&selectors.listing_date)?,
            total_count: compile(&selectors.total_count)?,
            origin: search_url.origin().ascii_serialization(),
            count_digits: Regex::new(r"\d[\d,]*").unwrap()
        })
    }

    /// Scrapes every listing on the page.
    ///
    /// A listing that cannot be turned into a record ends up in [`PageResult::errors`] and does not
    /// stop the rest of the page from being scraped. The total result count is only looked for when
    /// `first_page` is set, since later pages repeat it.
    pub(crate) fn scrape(&self, html: &str, first_page: bool) -> PageResult {
        let document = Html::parse_document(html);
        let captured_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut result = PageResult::default();

        for card in document.select(&self.job_card) {
            result.fragments += 1;
            match self.scrape_card(card, &captured_at) {
                Ok(record) => result.records.push(record),
                Err(e) => result.errors.push(e)
            }
        }

        if first_page {
            result.total_count = document
                .select(&self.total_count)
                .next()
                .and_then(|x| self.parse_count(&element_text(x)));
        }
        result
    }

    fn scrape_card(&self, card: ElementRef, captured_at: &str) -> Result<JobRecord, ScrapeError> {
        let first = |selector: &Selector| card.select(selector).next();
        let text_or_na = |selector: &Selector| {
            first(selector).map(element_text).unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        // The sentinel itself must never be stripped
        let bracketed_or_na = |selector: &Selector| {
            first(selector)
                .map(|x| strip_enclosing(&element_text(x)).to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        let position = first(&self.title)
            .map(element_text)
            .ok_or(ScrapeError::MissingRequiredField { field: "title" })?;
        let day_posted = first(&self.listing_date)
            .map(element_text)
            .ok_or(ScrapeError::MissingRequiredField { field: "listing date" })?;

        let company = first(&self.company_link)
            .or_else(|| first(&self.company_text))
            .map(element_text)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let location = card
            .select(&self.location)
            .map(element_text)
            .collect::<Vec<_>>()
            .join(", ");

        let link = first(&self.link)
            .and_then(|x| x.value().attr("href"))
            .map(|href| self.absolute_link(href))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(JobRecord {
            date_obtained: captured_at.to_string(),
            link,
            company,
            position,
            location,
            classification: text_or_na(&self.classification),
            industry: bracketed_or_na(&self.industry),
            salary: text_or_na(&self.salary),
            work_arrangement: bracketed_or_na(&self.work_arrangement),
            day_posted
        })
    }

    fn absolute_link(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{href}", self.origin)
        } else {
            format!("{}/{href}", self.origin)
        }
    }

    /// Reads counts like `"1,234"` or `"47 jobs"`.
    fn parse_count(&self, text: &str) -> Option<usize> {
        self.count_digits
            .find(text)?
            .as_str()
            .replace(',', "")
            .parse()
            .ok()
    }
}


#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Markup shaped like a JobStreet listing. `None` leaves the element out entirely.
    pub(crate) struct Card<'a> {
        pub(crate) title: Option<&'a str>,
        pub(crate) href: Option<&'a str>,
        pub(crate) company_link: Option<&'a str>,
        pub(crate) company_text: Option<&'a str>,
        pub(crate) locations: &'a [&'a str],
        pub(crate) classification: Option<&'a str>,
        pub(crate) industry: Option<&'a str>,
        pub(crate) salary: Option<&'a str>,
        pub(crate) work_arrangement: Option<&'a str>,
        pub(crate) listing_date: Option<&'a str>
    }

    impl Default for Card<'_> {
        fn default() -> Self {
            Self {
                title: Some("Junior Data Scientist"),
                href: Some("/job/81234567?type=standard"),
                company_link: Some("Acme Analytics"),
                company_text: None,
                locations: &["Makati City", "Metro Manila"],
                classification: Some("Information &amp; Communication Technology"),
                industry: Some("(Data Science)"),
                salary: Some("₱35,000 – ₱45,000 per month"),
                work_arrangement: Some("(Hybrid)"),
                listing_date: Some("2d ago")
            }
        }
    }

    impl Card<'_> {
        pub(crate) fn to_html(&self) -> String {
            let mut html = String::from("<article data-automation=\"normalJob\">");
            if let Some(title) = self.title {
                match self.href {
                    Some(href) => html += &format!("<a data-automation=\"jobTitle\" href=\"{href}\">{title}</a>"),
                    None => html += &format!("<a data-automation=\"jobTitle\">{title}</a>")
                }
            }
            if let Some(x) = self.company_link {
                html += &format!("<a data-automation=\"jobCompany\" href=\"/companies/x\">{x}</a>");
            }
            if let Some(x) = self.company_text {
                html += &format!("<span data-automation=\"jobCompany\">{x}</span>");
            }
            for x in self.locations {
                html += &format!("<a data-automation=\"jobLocation\">{x}</a>");
            }
            if let Some(x) = self.classification {
                html += &format!("<a data-automation=\"jobClassification\">{x}</a>");
            }
            if let Some(x) = self.industry {
                html += &format!("<a data-automation=\"jobSubClassification\">{x}</a>");
            }
            if let Some(x) = self.salary {
                html += &format!("<span data-automation=\"jobSalary\"><span>{x}</span></span>");
            }
            if let Some(x) = self.work_arrangement {
                html += &format!("<span data-testid=\"work-arrangement\">{x}</span>");
            }
            if let Some(x) = self.listing_date {
                html += &format!("<span data-automation=\"jobListingDate\">{x}</span>");
            }
            html + "</article>"
        }
    }

    pub(crate) fn results_page(cards: &[Card], total: Option<&str>) -> String {
        let mut html = String::from("<html><body>");
        if let Some(total) = total {
            html += &format!("<h1><span data-automation=\"totalJobsCount\">{total}</span> jobs</h1>");
        }
        for card in cards {
            html += &card.to_html();
        }
        html + "</body></html>"
    }

    pub(crate) fn scraper() -> JobStreetScraper {
        let url = Url::parse("https://ph.jobstreet.com/junior-data-scientist-jobs/in-Metro-Manila?sortmode=ListedDate").unwrap();
        JobStreetScraper::new(&Selectors::default(), &url).unwrap()
    }

    #[test]
    fn scrapes_every_field() {
        let page = scraper().scrape(&results_page(&[Card::default()], Some("47")), true);
        assert_eq!(page.fragments, 1);
        assert!(page.errors.is_empty());
        assert_eq!(page.total_count, Some(47));

        let record = &page.records[0];
        assert_eq!(record.link, "https://ph.jobstreet.com/job/81234567?type=standard");
        assert_eq!(record.company, "Acme Analytics");
        assert_eq!(record.position, "Junior Data Scientist");
        assert_eq!(record.location, "Makati City, Metro Manila");
        assert_eq!(record.classification, "Information & Communication Technology");
        assert_eq!(record.industry, "Data Science");
        assert_eq!(record.salary, "₱35,000 – ₱45,000 per month");
        assert_eq!(record.work_arrangement, "Hybrid");
        assert_eq!(record.day_posted, "2d ago");
        assert!(!record.date_obtained.is_empty());
    }

    #[test]
    fn optional_fields_fall_back_to_not_available() {
        let card = Card {
            href: None,
            company_link: None,
            locations: &[],
            classification: None,
            industry: None,
            salary: None,
            work_arrangement: None,
            ..Default::default()
        };
        let page = scraper().scrape(&results_page(&[card], None), false);
        let record = &page.records[0];
        assert_eq!(record.link, NOT_AVAILABLE);
        assert_eq!(record.company, NOT_AVAILABLE);
        assert_eq!(record.location, "");
        assert_eq!(record.classification, NOT_AVAILABLE);
        assert_eq!(record.industry, NOT_AVAILABLE);
        assert_eq!(record.salary, NOT_AVAILABLE);
        assert_eq!(record.work_arrangement, NOT_AVAILABLE);
    }

    #[test]
    fn plain_text_company_is_used_when_there_is_no_link() {
        let card = Card { company_link: None, company_text: Some("Private Advertiser"), ..Default::default() };
        let page = scraper().scrape(&results_page(&[card], None), false);
        assert_eq!(page.records[0].company, "Private Advertiser");
    }

    #[test]
    fn missing_required_fields_only_drop_that_listing() {
        let cards = [
            Card { title: None, ..Default::default() },
            Card::default(),
            Card { listing_date: None, ..Default::default() }
        ];
        let page = scraper().scrape(&results_page(&cards, None), false);
        assert_eq!(page.fragments, 3);
        assert_eq!(page.records.len(), 1);
        assert!(matches!(page.errors[..], [
            ScrapeError::MissingRequiredField { field: "title" },
            ScrapeError::MissingRequiredField { field: "listing date" }
        ]));
    }

    #[test]
    fn total_count_is_only_read_on_the_first_page() {
        let html = results_page(&[Card::default()], Some("1,234"));
        assert_eq!(scraper().scrape(&html, true).total_count, Some(1234));
        assert_eq!(scraper().scrape(&html, false).total_count, None);
        assert_eq!(scraper().scrape(&results_page(&[], Some("no")), true).total_count, None);
    }

    #[test]
    fn absolute_links_are_kept() {
        let card = Card { href: Some("https://elsewhere.example/job/1"), ..Default::default() };
        let page = scraper().scrape(&results_page(&[card], None), false);
        assert_eq!(page.records[0].link, "https://elsewhere.example/job/1");

        let card = Card { href: Some("job/2"), ..Default::default() };
        let page = scraper().scrape(&results_page(&[card], None), false);
        assert_eq!(page.records[0].link, "https://ph.jobstreet.com/job/2");
    }

    #[test]
    fn selectors_can_be_partially_overridden() {
        let selectors: Selectors = toml::from_str("salary = \"div.pay\"").unwrap();
        assert_eq!(selectors.salary, "div.pay");
        assert_eq!(selectors.title, Selectors::default().title);
    }
}
