//! Per-field extraction from a single product container.
//!
//! Every field is an ordered list of [`FieldSource`]s; the first one that
//! yields a non-empty value wins. Lookup failures never escape: they end up
//! as `None` for that field and the other fields are unaffected.

use log::debug;
use reqwest::Url;

use crate::browser::Element;
use crate::config::Selectors;
use crate::error::BrowserError;
use crate::models::ProductRecord;

const IMAGE_ATTRS: [&str; 3] = ["src", "data-src", "data-lazy-img"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource<'a> {
    /// Trimmed visible text of the first match.
    Text(&'a str),
    /// Attribute of the first match.
    Attr(&'a str, &'a str),
    /// `url(...)` inside the inline `style` of the first match.
    BackgroundImage(&'a str),
}

pub struct FieldExtractor<'a> {
    selectors: &'a Selectors,
    base: Option<Url>,
}

impl<'a> FieldExtractor<'a> {
    /// `page_url` is only used to resolve relative links and image paths.
    pub fn new(selectors: &'a Selectors, page_url: &str) -> Self {
        Self {
            selectors,
            base: Url::parse(page_url).ok(),
        }
    }

    pub fn title_sources(&self) -> Vec<FieldSource<'a>> {
        vec![FieldSource::Text(&self.selectors.title)]
    }

    pub fn link_sources(&self) -> Vec<FieldSource<'a>> {
        vec![FieldSource::Attr(&self.selectors.link, "href")]
    }

    pub fn image_sources(&self) -> Vec<FieldSource<'a>> {
        let img = self.selectors.image.as_str();
        let mut sources: Vec<_> = IMAGE_ATTRS
            .iter()
            .map(|attr| FieldSource::Attr(img, *attr))
            .collect();
        sources.push(FieldSource::BackgroundImage(&self.selectors.image_wrapper));
        sources
    }

    pub fn price_sources(&self) -> Vec<FieldSource<'a>> {
        vec![FieldSource::Text(&self.selectors.price)]
    }

    pub fn description_sources(&self) -> Vec<FieldSource<'a>> {
        vec![FieldSource::Text(&self.selectors.description)]
    }

    pub async fn title<E: Element>(&self, container: &E) -> Option<String> {
        first_match(container, &self.title_sources()).await
    }

    pub async fn link<E: Element>(&self, container: &E) -> Option<String> {
        first_match(container, &self.link_sources())
            .await
            .map(|link| self.absolutize(link))
    }

    pub async fn image<E: Element>(&self, container: &E) -> Option<String> {
        first_match(container, &self.image_sources())
            .await
            .map(|image| self.absolutize(image))
    }

    pub async fn price<E: Element>(&self, container: &E) -> Option<String> {
        first_match(container, &self.price_sources()).await
    }

    pub async fn description<E: Element>(&self, container: &E) -> Option<String> {
        first_match(container, &self.description_sources()).await
    }

    pub async fn record<E: Element>(&self, container: &E) -> ProductRecord {
        ProductRecord {
            title: self.title(container).await.unwrap_or_default(),
            link: self.link(container).await.unwrap_or_default(),
            image: self.image(container).await.unwrap_or_default(),
            price: self.price(container).await.unwrap_or_default(),
            description: self.description(container).await.unwrap_or_default(),
        }
    }

    /// Resolves `url` against the page it was found on, the way a browser
    /// resolves `href`. Values that cannot be resolved are kept as read.
    fn absolutize(&self, url: String) -> String {
        match self.base.as_ref().and_then(|base| base.join(&url).ok()) {
            Some(resolved) => resolved.into(),
            None => url,
        }
    }
}

/// Tries `sources` in order and returns the first non-empty value.
pub async fn first_match<E: Element>(container: &E, sources: &[FieldSource<'_>]) -> Option<String> {
    for source in sources {
        match read_source(container, source).await {
            Ok(Some(value)) if !value.is_empty() => return Some(value),
            Ok(_) => {}
            Err(e) => debug!("{:?} failed: {}", source, e),
        }
    }
    None
}

async fn read_source<E: Element>(
    container: &E,
    source: &FieldSource<'_>,
) -> Result<Option<String>, BrowserError> {
    let css = match *source {
        FieldSource::Text(css) | FieldSource::Attr(css, _) | FieldSource::BackgroundImage(css) => css,
    };
    let Some(element) = container.find(css).await? else {
        return Ok(None);
    };

    let value = match *source {
        FieldSource::Text(_) => Some(element.text().await?),
        FieldSource::Attr(_, name) => element.attr(name).await?,
        FieldSource::BackgroundImage(_) => element
            .attr("style")
            .await?
            .and_then(|style| parse_background_url(&style)),
    };
    Ok(value.map(|v| v.trim().to_string()))
}

/// Pulls the URL out of the first `url(...)` in an inline style string.
pub fn parse_background_url(style: &str) -> Option<String> {
    let start = style.find("url(")? + "url(".len();
    let rest = style[start..].trim_start();

    let url = match rest.chars().next()? {
        quote @ ('"' | '\'') => {
            let inner = &rest[1..];
            &inner[..inner.find(quote)?]
        }
        _ => &rest[..rest.find(')')?],
    };

    let url = url.trim();
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}
