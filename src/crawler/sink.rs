//! Per-document message sink
//!
//! Every crawl task writes its scan messages through a `MessageSink`. The sink
//! guarantees the one property the crawl's termination depends on: exactly one
//! terminal message per document. Messages written after the terminal one are
//! discarded, and a sink dropped without a terminal message sends
//! `FetchFailed` on its way out (this includes tasks that unwind).

use crate::crawler::types::{DocumentId, Locator, ScanMessage, ScanPayload};
use crossbeam_channel::Sender;
use std::cell::Cell;
use tracing::{debug, error};

/// Failure reason recorded when a task ends without a terminal message
const UNTERMINATED_REASON: &str = "scan ended without an end-of-stream message";

/// Writes the scan messages of one document onto the results queue
pub struct MessageSink {
    doc_id: DocumentId,
    results: Sender<ScanMessage>,
    terminated: Cell<bool>,
}

impl MessageSink {
    pub fn new(doc_id: DocumentId, results: Sender<ScanMessage>) -> Self {
        Self {
            doc_id,
            results,
            terminated: Cell::new(false),
        }
    }

    /// Returns true once the terminal message has been sent
    pub fn is_terminated(&self) -> bool {
        self.terminated.get()
    }

    pub fn title(&self, title: impl Into<String>) {
        self.send(ScanPayload::Title(title.into()));
    }

    /// Sends a batch of raw link locators; empty batches are skipped
    pub fn links(&self, batch: Vec<Locator>) {
        if batch.is_empty() {
            return;
        }
        self.send(ScanPayload::Links(batch));
    }

    pub fn end_of_stream(&self) {
        self.send(ScanPayload::EndOfStream);
    }

    /// Reports that the document could not be fetched
    pub fn fetch_failed(&self, reason: impl Into<String>) {
        self.send(ScanPayload::FetchFailed(reason.into()));
    }

    fn send(&self, payload: ScanPayload) {
        if self.terminated.get() {
            debug!(
                doc = %self.doc_id,
                kind = payload.kind(),
                "Discarding message sent after end of stream"
            );
            return;
        }

        if payload.is_terminal() {
            self.terminated.set(true);
        }

        let message = ScanMessage {
            doc_id: self.doc_id.clone(),
            payload,
        };
        if self.results.send(message).is_err() {
            error!(doc = %self.doc_id, "Results queue closed before document finished");
        }
    }
}

impl Drop for MessageSink {
    fn drop(&mut self) {
        if !self.terminated.get() {
            self.fetch_failed(UNTERMINATED_REASON);
        }
    }
}
