//! Crawl coordinator - task discovery, deduplication and termination
//!
//! A crawl runs two loops around a worker pool:
//!
//! - the *submission loop* (its own thread) turns newly discovered document
//!   ids into fetch-and-scan tasks on the pool
//! - the *result loop* (the calling thread) consumes scan messages, owns the
//!   document registry and the pending counter, resolves links, discovers new
//!   documents and emits completed records
//!
//! The pending counter starts at one for the start document, grows by one per
//! newly discovered document and shrinks by one per terminal message. The
//! crawl is over the moment it reaches zero. Because every task writes through
//! a [`MessageSink`], each submitted document yields exactly one terminal
//! message, so the counter always reaches zero.

use crate::crawler::registry::DocumentRegistry;
use crate::crawler::sink::MessageSink;
use crate::crawler::types::{
    DocReader, DocumentId, DocumentRecord, Fetcher, Resolver, ScanMessage, ScanPayload, Scanner,
};
use crate::pool::WorkerPool;
use crate::SiteMapError;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default capacity of the queue between scanners and the result loop
pub const DEFAULT_RESULTS_BUFFER: usize = 1024;

/// Tunables of a single crawl
#[derive(Debug, Clone)]
pub struct CrawlerOptions {
    /// Capacity of the scan results queue; scanners block while it is full
    pub results_buffer: usize,
}

impl Default for CrawlerOptions {
    fn default() -> Self {
        Self {
            results_buffer: DEFAULT_RESULTS_BUFFER,
        }
    }
}

/// Counters collected during a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Distinct documents discovered, including the start document
    pub discovered: usize,

    /// Tasks handed to the worker pool
    pub submitted: usize,

    /// Documents that reached their terminal state
    pub completed: usize,

    /// Completed documents whose fetch failed
    pub failed: usize,

    /// Locators the resolver turned into document ids
    pub links_accepted: usize,

    /// Locators the resolver rejected
    pub links_rejected: usize,

    pub elapsed: Duration,
}

/// Crawls a document graph on a worker pool
///
/// A crawler runs a single crawl: [`Crawler::crawl`] consumes it because the
/// pool is stopped when the crawl ends.
pub struct Crawler<P: WorkerPool> {
    scanner: Arc<dyn Scanner>,
    fetcher: Arc<dyn Fetcher>,
    resolver: Arc<dyn Resolver>,
    pool: P,
    options: CrawlerOptions,
}

impl<P: WorkerPool> Crawler<P> {
    pub fn new<S, F, R>(scanner: S, fetcher: F, resolver: R, pool: P) -> Self
    where
        S: Scanner + 'static,
        F: Fetcher + 'static,
        R: Resolver + 'static,
    {
        Self {
            scanner: Arc::new(scanner),
            fetcher: Arc::new(fetcher),
            resolver: Arc::new(resolver),
            pool,
            options: CrawlerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CrawlerOptions) -> Self {
        self.options = options;
        self
    }

    /// Crawls every document reachable from `start`
    ///
    /// Sends one record per discovered document on `out`, in completion
    /// order, then drops `out` to close the stream. Returns once the pool has
    /// been stopped and every worker joined.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - The crawl ran to completion
    /// * `Err(SiteMapError::Io)` - The submission thread could not be started;
    ///   nothing was crawled
    pub fn crawl(
        self,
        start: DocumentId,
        out: Sender<DocumentRecord>,
    ) -> Result<CrawlStats, SiteMapError> {
        let started = Instant::now();
        info!(root = %start, "Crawl started");

        let Crawler {
            scanner,
            fetcher,
            resolver,
            pool,
            options,
        } = self;

        let (results_tx, results_rx) = bounded(options.results_buffer.max(1));
        let (discovered_tx, discovered_rx) = unbounded();

        let outcome = thread::scope(|s| {
            let pool = &pool;
            let submitter = thread::Builder::new()
                .name("crawl-submitter".to_string())
                .spawn_scoped(s, move || {
                    run_submission_loop(pool, discovered_rx, scanner, fetcher, results_tx)
                })?;

            let mut stats =
                run_result_loop(resolver.as_ref(), start.clone(), results_rx, discovered_tx, out);

            debug!(root = %start, "Crawl stopping");

            // The discovery queue closed with the result loop, so this returns
            match submitter.join() {
                Ok(submitted) => stats.submitted = submitted,
                Err(_) => error!("Submission loop panicked"),
            }

            Ok::<_, SiteMapError>(stats)
        });

        pool.stop();

        let mut stats = outcome?;
        stats.elapsed = started.elapsed();

        info!(
            root = %start,
            documents = stats.completed,
            failed = stats.failed,
            links = stats.links_accepted,
            ignored_links = stats.links_rejected,
            elapsed = ?stats.elapsed,
            "Crawl stopped"
        );

        Ok(stats)
    }
}

/// Hands every discovered document to the pool until the discovery queue closes
fn run_submission_loop<P: WorkerPool>(
    pool: &P,
    discovered: Receiver<DocumentId>,
    scanner: Arc<dyn Scanner>,
    fetcher: Arc<dyn Fetcher>,
    results: Sender<ScanMessage>,
) -> usize {
    let mut submitted = 0;

    for doc_id in discovered.iter() {
        let scanner = Arc::clone(&scanner);
        let fetcher = Arc::clone(&fetcher);
        let results = results.clone();
        let label = format!("scan {}", doc_id);

        pool.submit(label, move || {
            scan_document(doc_id, fetcher.as_ref(), scanner.as_ref(), results)
        });
        submitted += 1;
    }

    submitted
}

/// Task body: fetch one document and stream it through the scanner
fn scan_document(
    doc_id: DocumentId,
    fetcher: &dyn Fetcher,
    scanner: &dyn Scanner,
    results: Sender<ScanMessage>,
) {
    debug!(doc = %doc_id, "Running task for document scan");

    // Dropping the sink sends the terminal message if the scanner did not
    let sink = MessageSink::new(doc_id.clone(), results);

    match fetcher.request(&doc_id) {
        Ok(reader) => {
            let doc = DocReader {
                doc_id: doc_id.clone(),
                reader,
            };
            scanner.scan(doc, &sink);
            if !sink.is_terminated() {
                warn!(doc = %doc_id, "Scanner returned without end of stream");
            }
        }
        Err(e) => {
            warn!(doc = %doc_id, error = %e, "Error while requesting document");
            sink.fetch_failed(e.to_string());
        }
    }

    debug!(doc = %doc_id, "Finished task for document scan");
}

/// Consumes scan messages until no document is pending
///
/// Sole owner of the registry and the pending counter.
fn run_result_loop(
    resolver: &dyn Resolver,
    start: DocumentId,
    results: Receiver<ScanMessage>,
    discovered: Sender<DocumentId>,
    out: Sender<DocumentRecord>,
) -> CrawlStats {
    let mut registry = DocumentRegistry::new();
    let mut stats = CrawlStats::default();

    registry.discover(&start);
    stats.discovered = 1;
    let mut pending: usize = 1;

    if discovered.send(start.clone()).is_err() {
        error!(doc = %start, "Submission loop gone before the crawl started");
        emit_unsubmitted(&mut registry, &start, &out, &mut stats);
        return stats;
    }

    while pending > 0 {
        let ScanMessage { doc_id, payload } = match results.recv() {
            Ok(message) => message,
            Err(_) => {
                error!(pending, "Results queue closed with documents still pending");
                break;
            }
        };

        match payload {
            ScanPayload::Title(title) => match registry.get_or_create(&doc_id) {
                Some(record) => {
                    debug!(doc = %doc_id, title = %title, "Got title from scanner");
                    record.title = title;
                }
                None => warn!(doc = %doc_id, "Title for completed document ignored"),
            },

            ScanPayload::Links(batch) => {
                if registry.is_completed(&doc_id) {
                    warn!(doc = %doc_id, "Links for completed document ignored");
                    continue;
                }

                for locator in batch {
                    let Some(target) = resolver.resolve(&locator, &doc_id) else {
                        debug!(doc = %doc_id, link = %locator, "Got link - ignored by resolver");
                        stats.links_rejected += 1;
                        continue;
                    };

                    stats.links_accepted += 1;
                    if let Some(record) = registry.get_or_create(&doc_id) {
                        record.links.push(target.clone());
                    }

                    if !registry.discover(&target) {
                        debug!(doc = %doc_id, linked = %target, "Got link - already discovered");
                        continue;
                    }

                    stats.discovered += 1;
                    if discovered.send(target.clone()).is_err() {
                        error!(doc = %target, "Submission loop gone, completing document unscanned");
                        emit_unsubmitted(&mut registry, &target, &out, &mut stats);
                        continue;
                    }

                    debug!(doc = %doc_id, linked = %target, "Got link - requested");
                    pending += 1;
                }
            }

            terminal @ (ScanPayload::EndOfStream | ScanPayload::FetchFailed(_)) => {
                let failure = match terminal {
                    ScanPayload::FetchFailed(reason) => Some(reason),
                    _ => None,
                };

                match registry.complete(&doc_id, failure) {
                    Some(record) => {
                        emit(record, &out, &mut stats);
                        pending -= 1;
                        debug!(doc = %doc_id, pending, "Document completed");
                    }
                    None => warn!(doc = %doc_id, "Duplicate end of stream ignored"),
                }
            }
        }
    }

    debug!(documents = registry.len(), "Result loop finished");
    stats
}

fn emit(record: DocumentRecord, out: &Sender<DocumentRecord>, stats: &mut CrawlStats) {
    stats.completed += 1;
    if record.is_failed() {
        stats.failed += 1;
    }

    if out.send(record).is_err() {
        debug!("Output stream receiver dropped, record discarded");
    }
}

/// Completes a document that could never be handed to the pool
fn emit_unsubmitted(
    registry: &mut DocumentRegistry,
    doc_id: &DocumentId,
    out: &Sender<DocumentRecord>,
    stats: &mut CrawlStats,
) {
    let reason = Some("document was never submitted for scanning".to_string());
    if let Some(record) = registry.complete(doc_id, reason) {
        emit(record, out, stats);
    }
}
