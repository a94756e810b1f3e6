use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::info;

use daraz_scrape::{PaginationMode, RunSummary, ScrapeConfig, ScrapeError};

#[derive(Parser, Debug)]
#[clap(name = "daraz-scrape")]
#[clap(about = "Scrape a Daraz product listing into a spreadsheet", long_about = None)]
struct Cli {
    /// Keep clicking "next page" until it is missing or disabled
    #[clap(long)]
    all_pages: bool,

    /// Listing page to open
    #[clap(long)]
    url: Option<String>,

    /// Output file; `.csv` writes CSV, anything else writes xlsx
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// JSON config file with selectors, timings and driver options
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Use a running WebDriver server instead of starting chromedriver
    #[clap(long)]
    webdriver_url: Option<String>,

    /// Show the browser window
    #[clap(long)]
    headful: bool,

    /// Stop after this many pages
    #[clap(long)]
    max_pages: Option<usize>,
}

impl Cli {
    fn apply(self, config: &mut ScrapeConfig) {
        if self.all_pages {
            config.mode = PaginationMode::AllPages;
        }
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(output) = self.output {
            config.output = Some(output);
        }
        if let Some(url) = self.webdriver_url {
            config.driver.webdriver_url = Some(url);
        }
        if self.headful {
            config.driver.headless = false;
        }
        if let Some(max) = self.max_pages {
            config.max_pages = Some(max);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match try_main(Cli::parse()).await {
        Ok(summary) => {
            println!(
                "Scraped {} products successfully and saved to {}",
                summary.rows,
                summary.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let Some(ScrapeError::NoProducts { .. }) = err.downcast_ref::<ScrapeError>() {
                println!("No products found! Check your container selector.");
            } else {
                eprintln!("Error: {:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

async fn try_main(cli: Cli) -> anyhow::Result<RunSummary> {
    let mut config = ScrapeConfig::load(cli.config.as_deref()).context("loading config")?;
    cli.apply(&mut config);
    config.validate()?;

    info!("Scraping {} ({:?})", config.url, config.mode);
    Ok(daraz_scrape::run(&config).await?)
}
