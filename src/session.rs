use async_trait::async_trait;
use log::{info, warn};
use rand::Rng;
use std::process::{Child, Command, Stdio};
use thirtyfour::prelude::*;
use thirtyfour::{error::WebDriverResult, ChromeCapabilities};
use tokio::time::{sleep, Duration};

use crate::browser::{ChromePage, Page};
use crate::chromedriver::ensure_chromedriver;
use crate::config::DriverOptions;
use crate::error::DriverError;

/// A browser held for one run: a page to scrape and a way to let it go.
#[async_trait]
pub trait Session: Send + Sized {
    type Page: Page;

    fn page(&self) -> &Self::Page;

    /// Releases the browser. Called exactly once, on every exit path.
    async fn close(self) -> Result<(), DriverError>;
}

/// A Chrome session for the length of one run.
///
/// Owns the WebDriver client and, unless an external WebDriver URL was
/// configured, the chromedriver process it talks to. Call
/// [`Session::close`] when done; dropping the session without closing
/// still kills chromedriver.
pub struct BrowserSession {
    page: ChromePage,
    child: Option<Child>,
}

impl BrowserSession {
    pub async fn start(options: &DriverOptions) -> Result<Self, DriverError> {
        let (server_url, child) = match &options.webdriver_url {
            Some(url) => {
                info!("Using WebDriver server at {}", url);
                (url.clone(), None)
            }
            None => {
                let driver_path = ensure_chromedriver().await?;
                let port: u16 = rand::thread_rng().gen_range(5000..9000);

                info!("Starting {:?} on port {}", driver_path, port);
                let child = Command::new(&driver_path)
                    .arg(format!("--port={}", port))
                    .stdout(Stdio::null())
                    .spawn()
                    .map_err(DriverError::Spawn)?;

                // give chromedriver time to bind its port
                sleep(Duration::from_secs(2)).await;
                (format!("http://localhost:{}", port), Some(child))
            }
        };

        let driver = match connect(&server_url, options).await {
            Ok(driver) => driver,
            Err(e) => {
                if let Some(child) = child {
                    stop(child);
                }
                return Err(e);
            }
        };

        Ok(Self {
            page: ChromePage::new(driver),
            child,
        })
    }
}

#[async_trait]
impl Session for BrowserSession {
    type Page = ChromePage;

    fn page(&self) -> &ChromePage {
        &self.page
    }

    /// Ends the WebDriver session and stops chromedriver.
    async fn close(mut self) -> Result<(), DriverError> {
        let result = self
            .page
            .clone()
            .into_driver()
            .quit()
            .await
            .map_err(|e| DriverError::Session(e.to_string()));
        if let Some(child) = self.child.take() {
            stop(child);
        }
        result
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(child) = self.child.take() {
            stop(child);
        }
    }
}

fn stop(mut child: Child) {
    if let Err(e) = child.kill() {
        warn!("Failed to stop chromedriver: {}", e);
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap chromedriver: {}", e);
    }
}

async fn connect(server_url: &str, options: &DriverOptions) -> Result<WebDriver, DriverError> {
    let caps = chrome_capabilities(options).map_err(|e| DriverError::Session(e.to_string()))?;
    WebDriver::new(server_url, caps)
        .await
        .map_err(|e| DriverError::Session(e.to_string()))
}

fn chrome_capabilities(options: &DriverOptions) -> WebDriverResult<ChromeCapabilities> {
    let mut caps = DesiredCapabilities::chrome();

    if options.headless {
        caps.set_headless()?;
    }
    caps.set_disable_gpu()?;
    caps.set_no_sandbox()?;
    caps.set_disable_dev_shm_usage()?;
    caps.add_chrome_arg("--window-size=1920,1080")?;

    if let Some(profile) = &options.profile_dir {
        caps.add_chrome_arg(&format!("--user-data-dir={}", profile.display()))?;
    }
    for arg in &options.extra_args {
        caps.add_chrome_arg(arg)?;
    }

    Ok(caps)
}
