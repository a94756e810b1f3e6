use log::{debug, info, warn};
use rand::Rng;
use tokio::time::{sleep, Duration, Instant};

use crate::browser::{Element, Page};
use crate::config::{PaginationMode, ScrapeConfig};
use crate::error::ScrapeError;
use crate::extract::FieldExtractor;
use crate::models::ProductRecord;

/// Result of trying to move to the next listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTurn {
    Advanced,
    NoControl,
    Disabled,
    ClickFailed,
}

pub struct Scraper<'a> {
    config: &'a ScrapeConfig,
}

impl<'a> Scraper<'a> {
    pub fn new(config: &'a ScrapeConfig) -> Self {
        Self { config }
    }

    /// Opens the listing, waits for the product grid and collects every
    /// container it finds, following pagination in `AllPages` mode.
    ///
    /// Only a grid that never shows up is fatal; everything after that
    /// degrades to empty fields or ends the pagination loop.
    pub async fn scrape<P: Page>(&self, page: &P) -> Result<Vec<ProductRecord>, ScrapeError> {
        info!("Opening {}", self.config.url);
        page.goto(&self.config.url).await?;

        wait_for_containers(
            page,
            &self.config.selectors.container,
            self.config.timings.wait_timeout(),
            self.config.timings.poll_interval(),
        )
        .await?;

        let extractor = FieldExtractor::new(&self.config.selectors, &self.config.url);
        let mut records = Vec::new();
        let mut page_number = 1;

        loop {
            let added = self.scrape_current_page(page, &extractor, &mut records).await;
            info!(
                "Page {}: {} products ({} total)",
                page_number,
                added,
                records.len()
            );

            if self.config.mode == PaginationMode::SinglePage {
                break;
            }
            if self.config.max_pages.is_some_and(|max| page_number >= max) {
                info!("Reached page limit of {}", page_number);
                break;
            }

            match self.next_page(page).await {
                PageTurn::Advanced => {
                    pause(self.config.timings.page_settle()).await;
                    page_number += 1;
                }
                turn => {
                    info!("No more pages after page {} ({:?})", page_number, turn);
                    break;
                }
            }
        }

        Ok(records)
    }

    /// Extracts every container currently in the document and returns how
    /// many records were appended.
    pub async fn scrape_current_page<P: Page>(
        &self,
        page: &P,
        extractor: &FieldExtractor<'_>,
        records: &mut Vec<ProductRecord>,
    ) -> usize {
        let containers = match page.find_all(&self.config.selectors.container).await {
            Ok(containers) => containers,
            Err(e) => {
                warn!("Could not list product containers: {}", e);
                return 0;
            }
        };
        debug!("Found {} containers", containers.len());

        let before = records.len();
        for container in &containers {
            // scrolling triggers lazy-loaded images; a stale card is dropped
            if let Err(e) = container.scroll_into_view().await {
                debug!("Skipping container: {}", e);
                continue;
            }
            pause(self.config.timings.scroll_pause()).await;

            records.push(extractor.record(container).await);

            self.throttle().await;
        }
        records.len() - before
    }

    /// Clicks the next-page control unless it is missing or disabled.
    pub async fn next_page<P: Page>(&self, page: &P) -> PageTurn {
        let button = match page.find(&self.config.selectors.next_page).await {
            Ok(Some(button)) => button,
            Ok(None) => return PageTurn::NoControl,
            Err(e) => {
                debug!("Next page lookup failed: {}", e);
                return PageTurn::NoControl;
            }
        };

        if is_disabled(&button).await {
            return PageTurn::Disabled;
        }

        match button.click().await {
            Ok(()) => PageTurn::Advanced,
            Err(e) => {
                warn!("Next page click failed: {}", e);
                PageTurn::ClickFailed
            }
        }
    }

    async fn throttle(&self) {
        let timings = &self.config.timings;
        if timings.throttle_max_ms == 0 {
            return;
        }
        let ms = rand::thread_rng().gen_range(timings.throttle_min_ms..=timings.throttle_max_ms);
        pause(Duration::from_millis(ms)).await;
    }
}

/// Polls until at least one element matches `css`, giving up after `timeout`.
pub async fn wait_for_containers<P: Page>(
    page: &P,
    css: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), ScrapeError> {
    let start = Instant::now();
    loop {
        match page.find_all(css).await {
            Ok(found) if !found.is_empty() => return Ok(()),
            Ok(_) => {}
            Err(e) => debug!("Waiting for {}: {}", css, e),
        }

        if start.elapsed() >= timeout {
            return Err(ScrapeError::NoProducts {
                selector: css.to_string(),
                timeout,
            });
        }
        pause(poll_interval).await;
    }
}

async fn is_disabled<E: Element>(button: &E) -> bool {
    let class = button.attr("class").await.ok().flatten().unwrap_or_default();
    if class_marks_disabled(&class) {
        return true;
    }
    matches!(
        button.attr("aria-disabled").await.ok().flatten().as_deref(),
        Some("true")
    )
}

pub fn class_marks_disabled(class: &str) -> bool {
    class.contains("disabled")
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}
