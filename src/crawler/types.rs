//! Core crawl data types and collaborator interfaces

use crate::crawler::sink::MessageSink;
use crate::FetchError;
use std::fmt;
use std::io::Read;

/// Title given to documents whose content never provided one
pub const DEFAULT_TITLE: &str = "Untitled document";

/// Canonical identifier of a document
///
/// Two locators that resolve to the same document must yield equal ids; the
/// crawler uses ids as its deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Raw link reference as found inside a document
///
/// May be relative, malformed or point outside the crawl; only a
/// [`Resolver`] can turn it into a [`DocumentId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(locator: &str) -> Self {
        Self::new(locator)
    }
}

impl From<String> for Locator {
    fn from(locator: String) -> Self {
        Self(locator)
    }
}

/// Everything learned about one document during a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: DocumentId,

    /// Document title, [`DEFAULT_TITLE`] until the scanner reports one
    pub title: String,

    /// Every accepted link in document order, repeats included
    pub links: Vec<DocumentId>,

    /// Set once the document reached its terminal state
    pub completed: bool,

    /// Why the document could not be fetched, if it could not
    pub failure: Option<String>,
}

impl DocumentRecord {
    /// Creates the record of a newly discovered document
    pub fn new(id: DocumentId) -> Self {
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            links: Vec::new(),
            completed: false,
            failure: None,
        }
    }

    /// Returns true if the document reached its terminal state through a
    /// fetch failure
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Message produced while fetching and scanning one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMessage {
    pub doc_id: DocumentId,
    pub payload: ScanPayload,
}

/// Content of a [`ScanMessage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    /// The document title
    Title(String),

    /// A batch of raw link locators, in document order
    Links(Vec<Locator>),

    /// Scanning finished; always the last message for a document
    EndOfStream,

    /// The document could not be fetched; terminal like `EndOfStream`
    FetchFailed(String),
}

impl ScanPayload {
    /// Returns true if this payload ends the document's message stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EndOfStream | Self::FetchFailed(_))
    }

    /// Short name used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Title(_) => "Title",
            Self::Links(_) => "Links",
            Self::EndOfStream => "EndOfStream",
            Self::FetchFailed(_) => "FetchFailed",
        }
    }
}

/// Content reader for one document, owned by the task scanning it
pub struct DocReader {
    pub doc_id: DocumentId,
    pub reader: Box<dyn Read + Send>,
}

impl fmt::Debug for DocReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocReader")
            .field("doc_id", &self.doc_id)
            .finish_non_exhaustive()
    }
}

/// Turns a document id into a readable byte stream
///
/// Called concurrently from every worker.
pub trait Fetcher: Send + Sync {
    fn request(&self, doc_id: &DocumentId) -> Result<Box<dyn Read + Send>, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&DocumentId) -> Result<Box<dyn Read + Send>, FetchError> + Send + Sync,
{
    fn request(&self, doc_id: &DocumentId) -> Result<Box<dyn Read + Send>, FetchError> {
        self(doc_id)
    }
}

/// Canonicalizes a locator found inside `origin` into a document id
///
/// Returns `None` for locators that do not lead to a crawlable document.
/// Rejection is ordinary control flow, not an error.
pub trait Resolver: Send + Sync {
    fn resolve(&self, locator: &Locator, origin: &DocumentId) -> Option<DocumentId>;
}

impl<F> Resolver for F
where
    F: Fn(&Locator, &DocumentId) -> Option<DocumentId> + Send + Sync,
{
    fn resolve(&self, locator: &Locator, origin: &DocumentId) -> Option<DocumentId> {
        self(locator, origin)
    }
}

/// Scans a document for its title and outgoing links
///
/// Implementations send at most one title, any number of link batches and
/// finally exactly one end-of-stream through `sink`, and drop the reader
/// before returning.
pub trait Scanner: Send + Sync {
    fn scan(&self, doc: DocReader, sink: &MessageSink);
}
