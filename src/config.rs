use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

pub const DEFAULT_URL: &str =
    "https://www.daraz.com.np/sports-water-bottles/?from=hp_categories&q=still%2Bwater";

const APP_DIR: &str = "daraz-scrape";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    #[default]
    SinglePage,
    AllPages,
}

/// CSS selectors, resolved relative to the page (container, next page) or
/// to a container (everything else).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub container: String,
    pub title: String,
    pub link: String,
    pub image: String,
    pub image_wrapper: String,
    pub price: String,
    pub description: String,
    pub next_page: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            container: ".qmXQo".to_string(),
            title: ".RfADt".to_string(),
            link: "a".to_string(),
            image: "img".to_string(),
            image_wrapper: "div.picture-wrapper".to_string(),
            price: ".ooOxS".to_string(),
            description: ".buTCk".to_string(),
            next_page: ".ant-pagination-next".to_string(),
        }
    }
}

/// Pauses used while driving the page, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub wait_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub scroll_pause_ms: u64,
    pub throttle_min_ms: u64,
    pub throttle_max_ms: u64,
    pub page_settle_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 10_000,
            poll_interval_ms: 500,
            scroll_pause_ms: 200,
            throttle_min_ms: 100,
            throttle_max_ms: 300,
            page_settle_ms: 3_000,
        }
    }
}

impl Timings {
    /// No pauses at all; the container wait still polls once.
    pub fn immediate() -> Self {
        Self {
            wait_timeout_ms: 0,
            poll_interval_ms: 0,
            scroll_pause_ms: 0,
            throttle_min_ms: 0,
            throttle_max_ms: 0,
            page_settle_ms: 0,
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// Connect to an already running WebDriver server instead of
    /// provisioning and spawning chromedriver.
    pub webdriver_url: Option<String>,
    pub headless: bool,
    pub profile_dir: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            headless: true,
            profile_dir: None,
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub url: String,
    pub mode: PaginationMode,
    /// Stop after this many pages even if a next page exists.
    pub max_pages: Option<usize>,
    pub selectors: Selectors,
    pub timings: Timings,
    pub driver: DriverOptions,
    pub output: Option<PathBuf>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            mode: PaginationMode::default(),
            max_pages: None,
            selectors: Selectors::default(),
            timings: Timings::default(),
            driver: DriverOptions::default(),
            output: None,
        }
    }
}

impl ScrapeConfig {
    /// Loads `path`, or the per-user config file if one exists, or falls
    /// back to the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ScrapeError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        info!("Loading config from {:?}", path);
        let raw = fs::read_to_string(&path)
            .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ScrapeError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ScrapeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.url.trim().is_empty() {
            return Err(ScrapeError::Config("url is empty".to_string()));
        }
        if self.selectors.container.trim().is_empty() {
            return Err(ScrapeError::Config("container selector is empty".to_string()));
        }
        if self.timings.throttle_min_ms > self.timings.throttle_max_ms {
            return Err(ScrapeError::Config(format!(
                "throttle_min_ms ({}) exceeds throttle_max_ms ({})",
                self.timings.throttle_min_ms, self.timings.throttle_max_ms
            )));
        }
        if self.max_pages == Some(0) {
            return Err(ScrapeError::Config("max_pages must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        match (&self.output, self.mode) {
            (Some(path), _) => path.clone(),
            (None, PaginationMode::SinglePage) => PathBuf::from("daraz_products.xlsx"),
            (None, PaginationMode::AllPages) => PathBuf::from("daraz_products_all_pages.xlsx"),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
}
