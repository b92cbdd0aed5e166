mod http;
mod local;

pub use http::HttpStream;
pub use local::LocalStream;

use anyhow::Result;
use std::io::{self, Read};
use std::path::Path;

/// Where the archive bytes come from. Every source is forward-only.
pub enum Source {
    Local(LocalStream),
    Http(HttpStream),
}

impl Source {
    /// Open a path, `-` for stdin, or an `http://` / `https://` URL.
    pub fn open(location: &str) -> Result<Self> {
        if is_http_url(location) {
            Ok(Source::Http(HttpStream::open(location)?))
        } else {
            Ok(Source::Local(LocalStream::open(Path::new(location))?))
        }
    }

    /// Bytes received over the network, for HTTP sources
    pub fn transferred_bytes(&self) -> Option<u64> {
        match self {
            Source::Http(http) => Some(http.transferred_bytes()),
            Source::Local(_) => None,
        }
    }
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Local(local) => local.read(buf),
            Source::Http(http) => http.read(buf),
        }
    }
}

pub fn is_http_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}
