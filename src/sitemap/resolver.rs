//! URL canonicalization and same-site link resolution
//!
//! Document ids are absolute URLs with everything that can differ between
//! two requests for the same page stripped away.

use crate::crawler::{DocumentId, Locator, Resolver};
use crate::SiteMapError;
use url::Url;

/// Builds the document id of an absolute URL
///
/// # Canonicalization Steps
///
/// 1. Remove the query string
/// 2. Remove the fragment
/// 3. Remove user name and password
/// 4. Remove trailing `/` characters from the path (the root stays `/`)
pub fn canonical_id(url: &Url) -> DocumentId {
    let mut url = url.clone();

    url.set_query(None);
    url.set_fragment(None);

    // Both only fail for URLs that cannot carry credentials at all
    let _ = url.set_username("");
    let _ = url.set_password(None);

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);

    DocumentId::new(String::from(url))
}

/// Parses the locator a crawl starts from
///
/// # Returns
///
/// * `Ok(DocumentId)` - Canonical id of the starting document
/// * `Err(SiteMapError::InvalidStart)` - The locator is not an absolute
///   HTTP(S) URL with a host
pub fn start_id(locator: &str) -> Result<DocumentId, SiteMapError> {
    let invalid = |reason: String| SiteMapError::InvalidStart {
        locator: locator.to_string(),
        reason,
    };

    let url = Url::parse(locator.trim()).map_err(|e| invalid(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!(
            "only HTTP and HTTPS are supported, got {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(canonical_id(&url))
}

/// Resolves links relative to the page they were found on and keeps only
/// those on the same host and scheme
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlResolver;

impl Resolver for UrlResolver {
    fn resolve(&self, locator: &Locator, origin: &DocumentId) -> Option<DocumentId> {
        let origin = Url::parse(origin.as_str()).ok()?;
        let target = origin.join(locator.as_str().trim()).ok()?;

        // Other sites, and the same site over another protocol, are out of scope
        if target.scheme() != origin.scheme() || target.host_str() != origin.host_str() {
            return None;
        }

        Some(canonical_id(&target))
    }
}
