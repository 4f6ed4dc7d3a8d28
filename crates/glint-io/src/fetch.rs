//! Local filesystem fetcher.

use std::fs;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::traits::FetchService;
use crate::uri::percent_decode;

/// Reads resolved URIs as files, relative to an optional root directory.
/// Percent escapes in the URI are decoded before the path is opened.
#[derive(Debug, Clone, Default)]
pub struct FsFetcher {
    root: Option<PathBuf>,
}

impl FsFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    fn path_for(&self, uri: &str) -> PathBuf {
        let decoded = String::from_utf8_lossy(&percent_decode(uri)).into_owned();
        let decoded = decoded.strip_prefix("file://").unwrap_or(&decoded).to_string();
        match &self.root {
            Some(root) => root.join(decoded),
            None => PathBuf::from(decoded),
        }
    }
}

#[async_trait(?Send)]
impl FetchService for FsFetcher {
    async fn fetch(&self, uri: &str) -> io::Result<Vec<u8>> {
        let lower = uri.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//") {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "network URIs are not supported by the filesystem fetcher",
            ));
        }
        let path = self.path_for(uri);
        log::debug!("reading {}", path.display());
        fs::read(path)
    }
}
