//! In-memory stand-in for a rendered listing page.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use daraz_scrape::{BrowserError, Element, Page, ScrapeConfig, Selectors, Timings};

#[derive(Clone, Default)]
pub struct FakeElement {
    text: String,
    attrs: HashMap<String, String>,
    children: Vec<(String, FakeElement)>,
    stale: bool,
    advances: bool,
    cursor: Option<Arc<AtomicUsize>>,
}

impl FakeElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self::new().text(text)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a descendant reachable through `css`.
    pub fn child(mut self, css: &str, element: FakeElement) -> Self {
        self.children.push((css.to_string(), element));
        self
    }

    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    /// Clicking this element loads the next listing page.
    pub fn advances(mut self) -> Self {
        self.advances = true;
        self
    }

    fn check(&self) -> Result<(), BrowserError> {
        if self.stale {
            Err(BrowserError::Stale)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Element for FakeElement {
    async fn find(&self, css: &str) -> Result<Option<Self>, BrowserError> {
        self.check()?;
        Ok(self
            .children
            .iter()
            .find(|(selector, _)| selector == css)
            .map(|(_, element)| element.clone()))
    }

    async fn text(&self) -> Result<String, BrowserError> {
        self.check()?;
        Ok(self.text.clone())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError> {
        self.check()?;
        Ok(self.attrs.get(name).cloned())
    }

    async fn scroll_into_view(&self) -> Result<(), BrowserError> {
        self.check()
    }

    async fn click(&self) -> Result<(), BrowserError> {
        self.check()?;
        match (&self.cursor, self.advances) {
            (Some(cursor), true) => {
                cursor.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(BrowserError::Command("element not interactable".to_string())),
        }
    }
}

/// One rendered listing: elements by page-level selector.
#[derive(Clone, Default)]
pub struct Listing {
    elements: HashMap<String, Vec<FakeElement>>,
}

impl Listing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, css: &str, element: FakeElement) -> Self {
        self.elements.entry(css.to_string()).or_default().push(element);
        self
    }

    pub fn cards(self, css: &str, cards: Vec<FakeElement>) -> Self {
        cards.into_iter().fold(self, |listing, card| listing.with(css, card))
    }
}

pub struct FakePage {
    listings: Vec<Listing>,
    cursor: Arc<AtomicUsize>,
    visited: Mutex<Vec<String>>,
    /// Page-level lookups that come back empty before the document "renders".
    hidden_polls: AtomicUsize,
}

impl FakePage {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings,
            cursor: Arc::new(AtomicUsize::new(0)),
            visited: Mutex::new(Vec::new()),
            hidden_polls: AtomicUsize::new(0),
        }
    }

    pub fn render_after(self, polls: usize) -> Self {
        self.hidden_polls.store(polls, Ordering::SeqCst);
        self
    }

    /// Index of the listing currently shown.
    pub fn current(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Page for FakePage {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.visited.lock().unwrap().push(url.to_string());
        self.cursor.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn find_all(&self, css: &str) -> Result<Vec<FakeElement>, BrowserError> {
        if self.hidden_polls.load(Ordering::SeqCst) > 0 {
            self.hidden_polls.fetch_sub(1, Ordering::SeqCst);
            return Ok(Vec::new());
        }
        let Some(listing) = self.listings.get(self.current()) else {
            return Ok(Vec::new());
        };
        Ok(listing
            .elements
            .get(css)
            .map(|elements| {
                elements
                    .iter()
                    .cloned()
                    .map(|mut element| {
                        element.cursor = Some(self.cursor.clone());
                        element
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// A fully populated product card using the default selectors.
pub fn card(title: &str, price: &str) -> FakeElement {
    let s = Selectors::default();
    let slug = title.to_lowercase().replace(' ', "-");
    FakeElement::new()
        .child(&s.title, FakeElement::with_text(&format!("  {}  ", title)))
        .child(
            &s.link,
            FakeElement::new().attr("href", &format!("https://www.daraz.com.np/products/{}.html", slug)),
        )
        .child(
            &s.image,
            FakeElement::new().attr("src", &format!("https://static-01.daraz.com.np/p/{}.jpg", slug)),
        )
        .child(&s.price, FakeElement::with_text(price))
        .child(&s.description, FakeElement::with_text(&format!("{} description", title)))
}

pub fn cards(titles: &[&str]) -> Vec<FakeElement> {
    titles.iter().map(|title| card(title, "Rs. 100")).collect()
}

pub fn next_button() -> FakeElement {
    FakeElement::new().attr("class", "ant-pagination-next").advances()
}

pub fn config(mode: daraz_scrape::PaginationMode) -> ScrapeConfig {
    ScrapeConfig {
        mode,
        timings: Timings::immediate(),
        ..ScrapeConfig::default()
    }
}
