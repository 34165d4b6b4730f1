use std::{path::Path, time::Duration};

use anyhow::Context;
use log::info;
use serde::Deserialize;
use url::Url;
use validator::Validate;

use crate::{
    browser::ChromeLoader,
    driver::TimeoutPolicy,
    page_scrapers::{JobStreetScraper, Selectors},
    persistence::CsvSink
};

mod browser;
mod driver;
mod error;
mod logger;
mod page_scrapers;
mod paginator;
mod persistence;

const DEFAULT_CONFIG_PATH: &str = "config.toml";


/// Everything a run needs, read from `config.toml`.
#[derive(Deserialize, Validate, Debug)]
#[serde(default)]
struct Config {
    /// The first page of search results. Later pages are derived from it.
    #[validate(url)]
    search_url: String,
    /// Rows are appended here, across runs.
    #[validate(length(min = 1))]
    output_path: String,
    /// How long to wait for listings to render on each page.
    #[validate(range(min = 1))]
    load_timeout_secs: u64,
    headless: bool,
    on_page_timeout: TimeoutPolicy,
    selectors: Selectors
}


impl Default for Config {
    fn default() -> Self {
        Self {
            search_url: "https://ph.jobstreet.com/junior-data-scientist-jobs/in-Metro-Manila?sortmode=ListedDate".into(),
            output_path: "jobstreet_jobs.csv".into(),
            load_timeout_secs: 20,
            headless: false,
            on_page_timeout: TimeoutPolicy::default(),
            selectors: Selectors::default()
        }
    }
}


impl Config {
    /// Reads the config at `path`. Without an explicit path, `fallback` is read if it exists and
    /// the defaults are used if it does not.
    async fn load(path: Option<String>, fallback: &Path) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let text = tokio::fs::read_to_string(&path).await.with_context(|| format!("Failed to read {path}"))?;
                toml::from_str(&text).with_context(|| format!("Failed to parse {path}"))?
            }
            None if fallback.exists() => {
                let text = tokio::fs::read_to_string(fallback).await?;
                toml::from_str(&text).with_context(|| format!("Failed to parse {}", fallback.display()))?
            }
            None => {
                info!("No {} found, using defaults", fallback.display());
                Config::default()
            }
        };
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();
    let config = Config::load(std::env::args().nth(1), Path::new(DEFAULT_CONFIG_PATH)).await?;

    let search_url = Url::parse(&config.search_url)?;
    let sink = CsvSink::new(&config.output_path);

    // The browser blocks, so the whole run happens off the async runtime
    let summary = tokio_rayon::spawn(move || {
        let scraper = JobStreetScraper::new(&config.selectors, &search_url)?;
        let mut loader = ChromeLoader::launch(
            config.headless,
            &config.selectors.loaded_marker,
            Duration::from_secs(config.load_timeout_secs)
        ).context("Failed to start Chrome. Is it installed?")?;

        driver::run(&mut loader, &scraper, &sink, &config.search_url, config.on_page_timeout)
            .context("Scraping stopped early")
    }).await?;

    info!("Saved {} of {} listings", summary.persisted, summary.discovered);
    Ok(())
}
