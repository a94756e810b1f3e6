pub mod browser;
pub mod chromedriver;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod scraper;
pub mod session;

use std::path::PathBuf;

use log::warn;

pub use browser::{Element, Page};
pub use config::{PaginationMode, ScrapeConfig, Selectors, Timings};
pub use error::{BrowserError, DriverError, ScrapeError};
pub use models::{ProductRecord, COLUMNS};
pub use scraper::{PageTurn, Scraper};
pub use session::{BrowserSession, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub output: PathBuf,
}

/// Starts a browser session, scrapes the configured listing into the
/// configured output file and shuts the session down again, whether or
/// not the scrape succeeded.
pub async fn run(config: &ScrapeConfig) -> Result<RunSummary, ScrapeError> {
    config.validate()?;

    let session = BrowserSession::start(&config.driver).await?;
    run_with(config, session).await
}

/// Scrapes and saves through an already started `session`, then closes it
/// regardless of the outcome.
pub async fn run_with<S: Session>(config: &ScrapeConfig, session: S) -> Result<RunSummary, ScrapeError> {
    let result = scrape_and_save(config, session.page()).await;
    if let Err(e) = session.close().await {
        warn!("Browser cleanup failed: {}", e);
    }
    result
}

/// Scrapes `page` and writes the records. Nothing is written if the scrape
/// fails.
pub async fn scrape_and_save<P: Page>(
    config: &ScrapeConfig,
    page: &P,
) -> Result<RunSummary, ScrapeError> {
    let records = Scraper::new(config).scrape(page).await?;
    let output = config.output_path();
    let rows = export::save(&records, &output)?;
    Ok(RunSummary { rows, output })
}
