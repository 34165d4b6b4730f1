use crate::error::ScrapeError;


/// Number of result pages needed to show `total` listings, `first_page_size` at a time.
pub(crate) fn plan(total: usize, first_page_size: usize) -> Result<usize, ScrapeError> {
    if first_page_size == 0 {
        return Err(ScrapeError::EmptyPage);
    }
    Ok(total.div_ceil(first_page_size))
}


/// `url` pointed at results page `page`.
///
/// The `page` parameter goes in front of whatever query the search already had, so
/// `https://site/x?sortmode=Y` becomes `https://site/x?page=2&sortmode=Y`.
pub(crate) fn page_url(url: &str, page: usize) -> String {
    match url.split_once('?') {
        Some((path, "")) => format!("{path}?page={page}"),
        Some((path, query)) => format!("{path}?page={page}&{query}"),
        None => format!("{url}?page={page}")
    }
}


/// The URLs of pages `2..=page_count`, in order. Page 1 is the search URL itself.
pub(crate) struct PageUrls<'a> {
    url: &'a str,
    next: usize,
    page_count: usize
}


impl<'a> PageUrls<'a> {
    pub(crate) fn new(url: &'a str, page_count: usize) -> Self {
        Self { url, next: 2, page_count }
    }
}


impl Iterator for PageUrls<'_> {
    type Item = (usize, String);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.page_count {
            return None;
        }
        let page = self.next;
        self.next += 1;
        Some((page, page_url(self.url, page)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.page_count + 1).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}


impl ExactSizeIterator for PageUrls<'_> { }
