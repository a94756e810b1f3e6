use std::path::PathBuf;
use std::time::Duration;

use thirtyfour::error::WebDriverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("no element matched {selector:?} within {timeout:?}")]
    NoProducts { selector: String, timeout: Duration },

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("failed to write {path}: {message}")]
    Export { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of a single browser command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowserError {
    #[error("stale element reference")]
    Stale,

    #[error("webdriver command failed: {0}")]
    Command(String),
}

impl From<WebDriverError> for BrowserError {
    fn from(err: WebDriverError) -> Self {
        match err {
            // thirtyfour reports stale references as NoSuchElement
            WebDriverError::NoSuchElement(_) => BrowserError::Stale,
            other => BrowserError::Command(other.to_string()),
        }
    }
}

/// Chrome / chromedriver provisioning failures.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("unsupported OS: {0}")]
    UnsupportedOs(String),

    #[error("Chrome executable not found")]
    ChromeNotFound,

    #[error("could not parse version from {0:?}")]
    Version(String),

    #[error("could not determine local data directory")]
    NoDataDir,

    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("bad chromedriver archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to start chromedriver: {0}")]
    Spawn(std::io::Error),

    #[error("failed to open WebDriver session: {0}")]
    Session(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_element_maps_to_stale() {
        let err = WebDriverError::NoSuchElement("element is not attached to the page document".to_string());
        assert_eq!(BrowserError::from(err), BrowserError::Stale);
    }

    #[test]
    fn other_webdriver_errors_keep_their_message() {
        let err = WebDriverError::CustomError("chrome not reachable".to_string());
        match BrowserError::from(err) {
            BrowserError::Command(message) => assert!(message.contains("chrome not reachable")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
