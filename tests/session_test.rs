mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::{cards, config, FakePage, Listing};
use daraz_scrape::{run_with, DriverError, PaginationMode, ScrapeError, Selectors, Session};

struct FakeSession {
    page: FakePage,
    closes: Arc<AtomicUsize>,
    close_fails: bool,
}

impl FakeSession {
    fn new(page: FakePage) -> (Self, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let session = Self {
            page,
            closes: closes.clone(),
            close_fails: false,
        };
        (session, closes)
    }
}

#[async_trait]
impl Session for FakeSession {
    type Page = FakePage;

    fn page(&self) -> &FakePage {
        &self.page
    }

    async fn close(self) -> Result<(), DriverError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.close_fails {
            Err(DriverError::Session("invalid session id".to_string()))
        } else {
            Ok(())
        }
    }
}

fn listing(titles: &[&str]) -> FakePage {
    let s = Selectors::default();
    FakePage::new(vec![Listing::new().cards(&s.container, cards(titles))])
}

#[tokio::test]
async fn closes_session_after_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(PaginationMode::SinglePage);
    config.output = Some(dir.path().join("products.xlsx"));
    let (session, closes) = FakeSession::new(FakePage::new(vec![Listing::new()]));

    let result = run_with(&config, session).await;

    assert!(matches!(result, Err(ScrapeError::NoProducts { .. })));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(!dir.path().join("products.xlsx").exists());
}

#[tokio::test]
async fn closes_session_after_save() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("products.csv");
    let mut config = config(PaginationMode::SinglePage);
    config.output = Some(output.clone());
    let (session, closes) = FakeSession::new(listing(&["Alpha", "Bravo"]));

    let summary = run_with(&config, session).await.unwrap();

    assert_eq!(summary.rows, 2);
    assert!(output.exists());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn closes_session_when_save_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(PaginationMode::SinglePage);
    config.output = Some(dir.path().join("missing").join("products.csv"));
    let (session, closes) = FakeSession::new(listing(&["Alpha"]));

    let result = run_with(&config, session).await;

    assert!(matches!(result, Err(ScrapeError::Export { .. })));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cleanup_failure_does_not_hide_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("products.csv");
    let mut config = config(PaginationMode::SinglePage);
    config.output = Some(output.clone());
    let (mut session, closes) = FakeSession::new(listing(&["Alpha"]));
    session.close_fails = true;

    let summary = run_with(&config, session).await.unwrap();

    assert_eq!(summary.rows, 1);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}
