use reqwest::blocking::{Client, Response};
use std::io::{self, Read};
use std::time::Duration;

use anyhow::{Result, bail};

/// Response body of a plain GET, read front to back.
///
/// No Range requests are made, so any server works, including ones that
/// generate the archive on the fly.
pub struct HttpStream {
    response: Response,
    transferred_bytes: u64,
}

impl HttpStream {
    /// Send the request and wait for the response headers.
    ///
    /// Connection failures and timeouts before the body starts are retried;
    /// once bytes are flowing, errors are returned to the reader.
    pub fn open(url: &str) -> Result<Self> {
        Self::open_with_retries(url, 10)
    }

    pub fn open_with_retries(url: &str, max_retry: u32) -> Result<Self> {
        // The body may take arbitrarily long to stream, so only connecting is bounded.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()?;

        let mut retry_count = 0;
        loop {
            match client.get(url).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        bail!("HTTP request failed with status: {}", response.status());
                    }
                    return Ok(Self {
                        response,
                        transferred_bytes: 0,
                    });
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= max_retry {
                        bail!("Max retries exceeded");
                    }
                    eprintln!("Connection error, retry {}/{}: {}", retry_count, max_retry, e);
                    std::thread::sleep(Duration::from_millis(500 * retry_count as u64));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Get total bytes received from the network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }
}

impl Read for HttpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.response.read(buf)?;
        self.transferred_bytes += n as u64;
        Ok(n)
    }
}
