use std::{fs::OpenOptions, io::{ErrorKind, Write}, path::{Path, PathBuf}};

use log::{info, warn};

use crate::{error::ScrapeError, page_scrapers::JobRecord};

/// Lets spreadsheet programs detect the file as UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";


/// Appends records to a CSV file, one call per results page.
///
/// The file is opened and closed on every append, so whatever was written before a crash stays readable.
pub(crate) struct CsvSink {
    path: PathBuf
}


impl CsvSink {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Creates an empty file if there is nothing at the path yet.
    ///
    /// Returns false, and leaves the file alone, if it already existed.
    pub(crate) fn initialize(&self) -> Result<bool, ScrapeError> {
        match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(_) => {
                info!("Created {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                info!("{} already exists, new rows will be appended to it", self.path.display());
                Ok(false)
            }
            Err(source) => Err(self.io_error(source))
        }
    }

    /// Writes every record in `records` and then empties it.
    ///
    /// The header row is only written when the file is empty. If anything fails, `records`
    /// is left as it was so nothing is lost.
    pub(crate) fn append(&self, records: &mut Vec<JobRecord>) -> Result<usize, ScrapeError> {
        if records.is_empty() {
            warn!("No data to write to {}", self.path.display());
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        let was_empty = file.metadata().map_err(|e| self.io_error(e))?.len() == 0;

        // The page reaches the file in one write, so it is never left half there
        let page = encode_rows(records, was_empty).map_err(|source| ScrapeError::Csv { path: self.path.clone(), source })?;
        file.write_all(&page).map_err(|e| self.io_error(e))?;
        file.flush().map_err(|e| self.io_error(e))?;

        let written = records.len();
        records.clear();
        Ok(written)
    }

    fn io_error(&self, source: std::io::Error) -> ScrapeError {
        ScrapeError::Io { path: self.path.clone(), source }
    }
}


/// `records` as CSV rows, led by the BOM and the header row when `with_header` is set.
fn encode_rows(records: &[JobRecord], with_header: bool) -> Result<Vec<u8>, csv::Error> {
    let mut page = Vec::new();
    if with_header {
        page.extend_from_slice(UTF8_BOM);
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(page);
    for record in records {
        writer.serialize(record)?;
    }
    writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}
