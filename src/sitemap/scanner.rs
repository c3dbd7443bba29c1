//! HTML scanner reporting titles and links of fetched documents
//!
//! The scanner reads the whole body, releases the reader, then reports:
//! - The text of the `<title>` element in the document head, if any
//! - The raw `href` of every `<a>` element in the body, in document order, in
//!   batches
//!
//! Links are reported exactly as written; resolving them against the
//! document is the resolver's job.

use crate::config::DEFAULT_LINK_BATCH_SIZE;
use crate::crawler::{DocReader, Locator, MessageSink, Scanner};
use scraper::{Html, Selector};
use std::io::Read;
use tracing::{debug, warn};

/// Title and links extracted from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedPage {
    /// Trimmed title text; `None` when missing or blank
    pub title: Option<String>,

    /// Raw `href` values of anchor elements, in document order
    pub links: Vec<Locator>,
}

/// Extracts title and anchor links from an HTML document
///
/// # Example
///
/// ```no_run
/// use sitemapper::sitemap::scan_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let page = scan_html(html);
/// assert_eq!(page.title, Some("Test".to_string()));
/// assert_eq!(page.links.len(), 1);
/// ```
pub fn scan_html(html: &str) -> ScannedPage {
    let document = Html::parse_document(html);

    ScannedPage {
        title: extract_title(&document),
        links: extract_links(&document),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("head title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_links(document: &Html) -> Vec<Locator> {
    let Ok(anchor_selector) = Selector::parse("body a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(Locator::new)
        .collect()
}

/// [`Scanner`] for HTML documents
#[derive(Debug, Clone)]
pub struct HtmlScanner {
    link_batch_size: usize,
}

impl HtmlScanner {
    /// Creates a scanner grouping at most `link_batch_size` links per message
    pub fn new(link_batch_size: usize) -> Self {
        Self {
            link_batch_size: link_batch_size.max(1),
        }
    }
}

impl Default for HtmlScanner {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_BATCH_SIZE)
    }
}

impl Scanner for HtmlScanner {
    fn scan(&self, doc: DocReader, sink: &MessageSink) {
        let DocReader { doc_id, mut reader } = doc;

        let mut body = Vec::new();
        if let Err(e) = reader.read_to_end(&mut body) {
            warn!(doc = %doc_id, error = %e, "Failed to read document body");
            sink.end_of_stream();
            return;
        }
        drop(reader);

        let page = scan_html(&String::from_utf8_lossy(&body));
        debug!(
            doc = %doc_id,
            has_title = page.title.is_some(),
            links = page.links.len(),
            "Scanned document"
        );

        if let Some(title) = page.title {
            sink.title(title);
        }
        for batch in page.links.chunks(self.link_batch_size) {
            sink.links(batch.to_vec());
        }
        sink.end_of_stream();
    }
}
