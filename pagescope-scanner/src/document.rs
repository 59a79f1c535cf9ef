use crate::error::{Result, ScanError};
use reqwest::Client;
use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

/// Raw response of a page fetch, before parsing.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    /// Final URL after redirects
    pub base_url: Url,
    pub status_code: u16,
}

/// Fetch a page with a single GET.
///
/// Any HTTP status yields a page; only transport failures are errors.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage> {
    let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;

    debug!("Fetching {}", parsed);
    let response = client.get(parsed).send().await?;
    let status_code = response.status().as_u16();
    let base_url = response.url().clone();
    let body = response.text().await?;
    debug!("Fetched {} ({}, {} bytes)", base_url, status_code, body.len());

    Ok(FetchedPage {
        body,
        base_url,
        status_code,
    })
}

/// A parsed HTML page and the URL it was resolved from.
///
/// `Html` is not `Send`, so a `PageDocument` must not be held across an
/// `.await` in a spawned future. Extract what you need first.
pub struct PageDocument {
    html: Html,
    markup: Option<String>,
    base_url: Url,
}

impl PageDocument {
    pub fn parse(markup: impl Into<String>, base_url: Url) -> Self {
        let markup = markup.into();
        let html = Html::parse_document(&markup);
        Self {
            html,
            markup: Some(markup),
            base_url,
        }
    }

    pub fn from_fetched(page: FetchedPage) -> Self {
        Self::parse(page.body, page.base_url)
    }

    /// Wrap an already parsed tree. Such a document has no source markup.
    pub fn from_tree(html: Html, base_url: Url) -> Self {
        Self {
            html,
            markup: None,
            base_url,
        }
    }

    pub fn raw_markup(&self) -> Result<&str> {
        self.markup.as_deref().ok_or(ScanError::MarkupUnavailable)
    }

    /// The tree's doctype rendered back to markup, or `None` without one.
    ///
    /// The keyword is always `<!DOCTYPE` and the name lowercase, whatever the
    /// source spelled, so `<!doctype html>` renders as `<!DOCTYPE html>`.
    /// Public and system identifiers are kept.
    pub fn doctype_declaration(&self) -> Option<String> {
        let doctype = self
            .html
            .tree
            .root()
            .children()
            .find_map(|node| node.value().as_doctype())?;

        let mut rendered = format!("<!DOCTYPE {}", doctype.name().to_ascii_lowercase());
        let (public_id, system_id) = (doctype.public_id(), doctype.system_id());
        if !public_id.is_empty() {
            rendered.push_str(&format!(" PUBLIC {}", quoted(public_id)));
            if !system_id.is_empty() {
                rendered.push_str(&format!(" {}", quoted(system_id)));
            }
        } else if !system_id.is_empty() {
            rendered.push_str(&format!(" SYSTEM {}", quoted(system_id)));
        }
        rendered.push('>');

        Some(rendered)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// All elements with the given (lowercase) tag name, in document order.
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(move |element| element.value().name() == name)
    }

    pub fn count_elements(&self, name: &str) -> usize {
        self.elements_named(name).count()
    }

    /// Text content of the first element with the given tag name.
    pub fn first_text(&self, name: &str) -> Option<String> {
        self.elements_named(name)
            .next()
            .map(|element| element.text().collect::<String>())
    }
}

fn quoted(value: &str) -> String {
    if value.contains('"') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value)
    }
}

/// Host plus explicit non-default port, e.g. `example.com:8080`.
/// Empty when the URL has no host (`mailto:`, `tel:`, ...).
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
