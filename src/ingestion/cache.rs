//! Filesystem cache for downloaded pages.

use std::path::{Path, PathBuf};

use tokio::fs;
use url::Url;

use crate::types::RagError;

/// Disk cache keyed by a sanitized rendering of the URL path and query.
///
/// Cache file names are deterministic, so a URL fetched once is served from
/// disk on every later run.
#[derive(Clone, Debug)]
pub struct PageCache {
    root: PathBuf,
}

impl PageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache file location for a URL.
    pub fn path_for(&self, url: &Url) -> PathBuf {
        let mut name: String = url
            .path()
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(sanitize)
            .collect::<Vec<_>>()
            .join("_");
        if name.is_empty() {
            name.push_str("index");
        }
        if let Some(query) = url.query() {
            name.push('_');
            name.push_str(&sanitize(query));
        }
        if Path::new(&name).extension().is_none() {
            name.push_str(".html");
        }
        self.root.join(name)
    }

    /// Returns the cached content for `url`, if present.
    pub async fn load(&self, url: &Url) -> Result<Option<String>, RagError> {
        let path = self.path_for(url);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path).await?))
    }

    /// Writes `content` to the cache, creating directories as needed.
    pub async fn store(&self, url: &Url, content: &str) -> Result<PathBuf, RagError> {
        let path = self.path_for(url);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
        Ok(path)
    }
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
