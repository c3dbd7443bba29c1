//! Site map of a web site
//!
//! This module wires the crawl engine to the web:
//! - `UrlResolver` keeps same-site links and canonicalizes them into ids
//! - `HttpFetcher` requests documents over HTTP(S)
//! - `HtmlScanner` reports the title and anchors of each page
//!
//! `SiteMap` runs the crawl, keeps every document record, and renders the
//! result as an indented tree.

mod fetcher;
mod resolver;
mod scanner;

pub use fetcher::{build_http_client, HttpFetcher};
pub use resolver::{canonical_id, start_id, UrlResolver};
pub use scanner::{scan_html, HtmlScanner, ScannedPage};

use crate::config::Config;
use crate::crawler::{CrawlStats, Crawler, CrawlerOptions, DocumentId, DocumentRecord};
use crate::pool::{FixedPool, WorkerPool};
use crate::{Result, SiteMapError};
use crossbeam_channel::unbounded;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::thread;
use tracing::info;

/// Legend printed above every tree
pub const TREE_HEADER: &str = "SITE MAP
 A line starting with a - character indicates the links of the page are just below it.
 A line starting with a * character indicates the page is already in the output and links
 won't be printed again.


";

/// Documents of one site, keyed by id, with the root the crawl started from
#[derive(Debug, Default)]
pub struct SiteMap {
    config: Config,
    docs: HashMap<DocumentId, DocumentRecord>,
    root: Option<DocumentId>,
}

impl SiteMap {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            docs: HashMap::new(),
            root: None,
        }
    }

    /// Builds a site map from records that were collected elsewhere
    pub fn from_records(root: DocumentId, records: impl IntoIterator<Item = DocumentRecord>) -> Self {
        Self {
            config: Config::default(),
            docs: records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
            root: Some(root),
        }
    }

    /// Crawls the site reachable from `starting_point` over HTTP
    ///
    /// Replaces whatever the map held before. The starting point is validated
    /// before any worker is started.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - Every reachable document was recorded
    /// * `Err(SiteMapError::InvalidStart)` - The starting point is not an
    ///   absolute HTTP(S) URL
    /// * `Err(_)` - The worker pool, runtime or HTTP client could not be set up
    pub fn produce_from(&mut self, starting_point: &str) -> Result<CrawlStats> {
        let root = start_id(starting_point)?;

        let crawler_config = &self.config.crawler;
        let pool = FixedPool::new(crawler_config.workers)?;
        let fetcher = HttpFetcher::new(&self.config.fetcher)?;

        let crawler = Crawler::new(
            HtmlScanner::new(crawler_config.link_batch_size),
            fetcher,
            UrlResolver,
            pool,
        )
        .with_options(CrawlerOptions {
            results_buffer: crawler_config.results_buffer,
        });

        self.produce_with(crawler, root)
    }

    /// Runs a prepared crawler from `root` and records everything it reports
    pub fn produce_with<P>(&mut self, crawler: Crawler<P>, root: DocumentId) -> Result<CrawlStats>
    where
        P: WorkerPool + 'static,
    {
        self.docs.clear();
        self.root = None;

        let (out_tx, out_rx) = unbounded();
        let crawl_root = root.clone();
        let handle = thread::Builder::new()
            .name("crawl".to_string())
            .spawn(move || crawler.crawl(crawl_root, out_tx))?;

        for record in out_rx {
            self.docs.insert(record.id.clone(), record);
        }

        let stats = handle.join().map_err(|_| SiteMapError::CrawlThread)??;

        info!(
            root = %root,
            documents = self.docs.len(),
            failed = stats.failed,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Site map produced"
        );

        self.root = Some(root);
        Ok(stats)
    }

    pub fn root(&self) -> Option<&DocumentId> {
        self.root.as_ref()
    }

    pub fn get(&self, id: &DocumentId) -> Option<&DocumentRecord> {
        self.docs.get(id)
    }

    /// All recorded documents, in no particular order
    pub fn records(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.docs.values()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Writes the site map as an indented tree, depth first from the root
    ///
    /// Each document is expanded once, on its first appearance, as a line
    /// starting with `-` followed by its links one level deeper. Later
    /// appearances print a single line starting with `*`. Lines are indented
    /// by one space per level, starting at one space for the root.
    ///
    /// A `*` line sits at the depth of the link it stands for. Earlier site
    /// mapper output printed it at the indentation of the linking page.
    pub fn write_tree<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(TREE_HEADER.as_bytes())?;

        let Some(root) = &self.root else {
            return Ok(());
        };

        struct Frame<'a> {
            id: &'a DocumentId,
            depth: usize,
            next: usize,
        }

        let mut expanded: HashSet<&DocumentId> = HashSet::new();
        expanded.insert(root);
        self.write_line(out, '-', 0, root)?;

        let mut stack = vec![Frame {
            id: root,
            depth: 0,
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let links = self.links_of(frame.id);
            let Some(link) = links.get(frame.next) else {
                stack.pop();
                continue;
            };
            frame.next += 1;
            let depth = frame.depth + 1;

            if expanded.insert(link) {
                self.write_line(out, '-', depth, link)?;
                stack.push(Frame {
                    id: link,
                    depth,
                    next: 0,
                });
            } else {
                self.write_line(out, '*', depth, link)?;
            }
        }

        Ok(())
    }

    /// Prints the tree to stdout
    pub fn print(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_tree(&mut out)?;
        out.flush()
    }

    fn links_of(&self, id: &DocumentId) -> &[DocumentId] {
        self.docs
            .get(id)
            .map(|record| record.links.as_slice())
            .unwrap_or(&[])
    }

    fn write_line<W: Write>(
        &self,
        out: &mut W,
        marker: char,
        depth: usize,
        id: &DocumentId,
    ) -> io::Result<()> {
        let title = match self.docs.get(id) {
            Some(record) => record.title.trim(),
            None => id.as_str(),
        };
        writeln!(out, "{:indent$}{} {}", "", marker, title, indent = depth + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::DEFAULT_TITLE;

    fn record(id: &str, title: &str, links: &[&str]) -> DocumentRecord {
        let mut record = DocumentRecord::new(DocumentId::new(id));
        record.title = title.to_string();
        record.links = links.iter().map(|l| DocumentId::new(*l)).collect();
        record.completed = true;
        record
    }

    fn render(map: &SiteMap) -> String {
        let mut out = Vec::new();
        map.write_tree(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn body(map: &SiteMap) -> String {
        render(map)[TREE_HEADER.len()..].to_string()
    }

    #[test]
    fn test_empty_map_prints_header_only() {
        let map = SiteMap::new(Config::default());
        assert_eq!(render(&map), TREE_HEADER);
        assert!(map.is_empty());
    }

    #[test]
    fn test_single_document() {
        let map = SiteMap::from_records(DocumentId::new("a"), vec![record("a", "Home", &[])]);
        assert_eq!(body(&map), " - Home\n");
    }

    #[test]
    fn test_nested_links() {
        let map = SiteMap::from_records(
            DocumentId::new("a"),
            vec![
                record("a", "Home", &["b", "c"]),
                record("b", "About", &["d"]),
                record("c", "Contact", &[]),
                record("d", "Team", &[]),
            ],
        );
        assert_eq!(
            body(&map),
            " - Home\n  - About\n   - Team\n  - Contact\n"
        );
    }

    #[test]
    fn test_revisits_are_marked_and_not_expanded() {
        let map = SiteMap::from_records(
            DocumentId::new("a"),
            vec![
                record("a", "Home", &["b", "c"]),
                record("b", "About", &["a", "c"]),
                record("c", "Contact", &["b"]),
            ],
        );
        assert_eq!(
            body(&map),
            " - Home\n  - About\n   * Home\n   - Contact\n    * About\n  * Contact\n"
        );
    }

    #[test]
    fn test_self_link() {
        let map = SiteMap::from_records(DocumentId::new("a"), vec![record("a", "Home", &["a"])]);
        assert_eq!(body(&map), " - Home\n  * Home\n");
    }

    #[test]
    fn test_titles_are_trimmed() {
        let map = SiteMap::from_records(
            DocumentId::new("a"),
            vec![record("a", "  Spaced out \n", &[])],
        );
        assert_eq!(body(&map), " - Spaced out\n");
    }

    #[test]
    fn test_failed_document_uses_default_title() {
        let mut failed = DocumentRecord::new(DocumentId::new("b"));
        failed.completed = true;
        failed.failure = Some("HTTP 404".to_string());

        let map = SiteMap::from_records(
            DocumentId::new("a"),
            vec![record("a", "Home", &["b"]), failed],
        );
        assert_eq!(body(&map), format!(" - Home\n  - {}\n", DEFAULT_TITLE));
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let depth = 10_000;
        let records: Vec<_> = (0..depth)
            .map(|i| {
                let next = (i + 1).to_string();
                let links: Vec<&str> = if i + 1 < depth { vec![next.as_str()] } else { vec![] };
                record(&i.to_string(), &format!("Page {}", i), &links)
            })
            .collect();

        let map = SiteMap::from_records(DocumentId::new("0"), records);
        let rendered = body(&map);
        assert_eq!(rendered.lines().count(), depth);
        assert!(rendered
            .lines()
            .last()
            .unwrap()
            .ends_with(&format!("- Page {}", depth - 1)));
    }

    #[test]
    fn test_produce_from_rejects_invalid_start() {
        let mut map = SiteMap::new(Config::default());
        let result = map.produce_from("not a url");
        assert!(matches!(result, Err(SiteMapError::InvalidStart { .. })));
        assert!(map.root().is_none());
    }
}
