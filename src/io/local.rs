use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// Local file or standard input, read sequentially.
///
/// Files are never seeked, so a FIFO or `/dev/fd/N` works the same as a
/// regular file.
pub enum LocalStream {
    File(File),
    Stdin(io::StdinLock<'static>),
}

impl LocalStream {
    /// Open `path`, with `-` meaning standard input.
    pub fn open(path: &Path) -> Result<Self> {
        if path.as_os_str() == "-" {
            return Ok(LocalStream::Stdin(io::stdin().lock()));
        }
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        Ok(LocalStream::File(file))
    }
}

impl Read for LocalStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            LocalStream::File(file) => file.read(buf),
            LocalStream::Stdin(stdin) => stdin.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_names_the_path() {
        let err = LocalStream::open(Path::new("/nonexistent/archive.zip")).err().unwrap();
        assert!(err.to_string().contains("/nonexistent/archive.zip"));
    }
}
