//! The handful of browser capabilities the scraper needs, and their
//! thirtyfour-backed implementations.
//!
//! The scraper only talks to [`Page`] and [`Element`], so extraction and
//! pagination can run against an in-memory DOM in tests.

use async_trait::async_trait;
use thirtyfour::prelude::*;

use crate::error::BrowserError;

#[async_trait]
pub trait Element: Send + Sync + Sized {
    /// First descendant matching `css`, or `None` if there is none.
    async fn find(&self, css: &str) -> Result<Option<Self>, BrowserError>;

    async fn text(&self) -> Result<String, BrowserError>;

    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError>;

    async fn scroll_into_view(&self) -> Result<(), BrowserError>;

    async fn click(&self) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait Page: Send + Sync {
    type Element: Element;

    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Every element in the current document matching `css`, in document order.
    async fn find_all(&self, css: &str) -> Result<Vec<Self::Element>, BrowserError>;

    async fn find(&self, css: &str) -> Result<Option<Self::Element>, BrowserError> {
        Ok(self.find_all(css).await?.into_iter().next())
    }
}

/// A live WebDriver session viewed as a [`Page`].
#[derive(Clone)]
pub struct ChromePage {
    driver: WebDriver,
}

impl ChromePage {
    pub fn new(driver: WebDriver) -> Self {
        Self { driver }
    }

    pub fn into_driver(self) -> WebDriver {
        self.driver
    }
}

#[async_trait]
impl Page for ChromePage {
    type Element = ChromeElement;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn find_all(&self, css: &str) -> Result<Vec<ChromeElement>, BrowserError> {
        let elements = self.driver.find_all(By::Css(css)).await?;
        Ok(elements.into_iter().map(ChromeElement).collect())
    }
}

pub struct ChromeElement(WebElement);

#[async_trait]
impl Element for ChromeElement {
    async fn find(&self, css: &str) -> Result<Option<Self>, BrowserError> {
        // find_all turns "no such element" into an empty vec instead of an error
        let found = self.0.find_all(By::Css(css)).await?;
        Ok(found.into_iter().next().map(ChromeElement))
    }

    async fn text(&self) -> Result<String, BrowserError> {
        Ok(self.0.text().await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.0.attr(name).await?)
    }

    async fn scroll_into_view(&self) -> Result<(), BrowserError> {
        self.0.scroll_into_view().await?;
        Ok(())
    }

    async fn click(&self) -> Result<(), BrowserError> {
        self.0.click().await?;
        Ok(())
    }
}
