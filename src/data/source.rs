//! Where the long-format CSV comes from: a local file or a single HTTP GET.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use reqwest::blocking::Client;
use tracing::info;

use crate::error::AppError;

/// OWID COVID-19 hospitalization data (long format).
pub const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/owid/covid-19-data/master/public/data/hospitalizations/covid-hospitalizations.csv";

/// Environment variable that overrides `DEFAULT_DATA_URL`.
pub const DATA_URL_ENV: &str = "HOSP_DATA_URL";

/// A readable CSV source.
pub trait CsvSource {
    /// Human-readable location of the data (path or URL).
    fn describe(&self) -> String;

    fn open(&self) -> Result<Box<dyn Read>, AppError>;
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CsvSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn Read>, AppError> {
        let file = File::open(&self.path).map_err(|e| {
            AppError::new(2, format!("Failed to open CSV '{}': {e}", self.path.display()))
        })?;
        Ok(Box::new(file))
    }
}

pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

impl CsvSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn open(&self) -> Result<Box<dyn Read>, AppError> {
        info!(url = %self.url, "downloading source CSV");

        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::new(4, format!("Request to '{}' failed: {e}", self.url)))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Request to '{}' failed with status {}.", self.url, resp.status()),
            ));
        }

        let body = resp
            .bytes()
            .map_err(|e| AppError::new(4, format!("Failed to read response body: {e}")))?;
        info!(bytes = body.len(), "download complete");

        Ok(Box::new(Cursor::new(body)))
    }
}

/// Pick a source from a path-or-URL string.
pub fn source_for(spec: &str) -> Box<dyn CsvSource> {
    if spec.starts_with("http://") || spec.starts_with("https://") {
        Box::new(HttpSource::new(spec))
    } else {
        Box::new(FileSource::new(spec))
    }
}

/// Default source location: `HOSP_DATA_URL` (from the environment or `.env`),
/// else the public OWID file.
pub fn default_source() -> String {
    dotenvy::dotenv().ok();
    std::env::var(DATA_URL_ENV).unwrap_or_else(|_| DEFAULT_DATA_URL.to_string())
}
