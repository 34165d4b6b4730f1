use std::{ffi::OsStr, sync::Arc, time::Duration};

use anyhow::anyhow;
use headless_chrome::{util::Timeout, Browser, LaunchOptions, Tab};
use log::debug;

use crate::error::ScrapeError;


/// Something that can fetch a results page after it has finished rendering
pub(crate) trait PageLoader {
    /// Navigates to `url` and returns the rendered document once the listings are on screen.
    ///
    /// Returns [`ScrapeError::LoadTimeout`] if they do not show up in time. Whether that ends the run
    /// is up to the caller.
    fn load(&mut self, url: &str) -> Result<String, ScrapeError>;
}


/// A single Chrome tab, reused for every page of the run.
pub(crate) struct ChromeLoader {
    // Closing the browser kills the tab, so it has to outlive it
    _browser: Browser,
    tab: Arc<Tab>,
    loaded_marker: String,
    timeout: Duration
}


impl ChromeLoader {
    pub(crate) fn launch(headless: bool, loaded_marker: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .args(vec![OsStr::new("--disable-gpu")])
            .build()
            .map_err(|e| anyhow!("invalid browser options: {e}"))?;
        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;

        Ok(Self {
            _browser: browser,
            tab,
            loaded_marker: loaded_marker.to_string(),
            timeout
        })
    }
}


impl PageLoader for ChromeLoader {
    fn load(&mut self, url: &str) -> Result<String, ScrapeError> {
        debug!("Navigating to {url}");
        self.tab
            .navigate_to(url)?
            .wait_until_navigated()?;

        // Listings are rendered client side, so the page counts as loaded once one of them exists
        self.tab
            .wait_for_element_with_custom_timeout(&self.loaded_marker, self.timeout)
            .map_err(|e| wait_error(url, self.timeout, e))?;

        Ok(self.tab.get_content()?)
    }
}


/// Only running out of time counts as a timeout. Anything else the browser reports is passed on as is.
fn wait_error(url: &str, timeout: Duration, error: anyhow::Error) -> ScrapeError {
    if error.downcast_ref::<Timeout>().is_some() {
        ScrapeError::LoadTimeout { url: url.to_string(), timeout }
    } else {
        ScrapeError::Browser(error)
    }
}
