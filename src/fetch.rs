//! Network fetch for `http`, `https` and `ftp` include targets
//!
//! The includer never talks to the network itself. It hands remote URLs to
//! a [`Fetch`] implementation, which returns a line-oriented reader. With the
//! `http` feature enabled, [`default_fetcher`] returns a blocking `reqwest`
//! client; otherwise remote includes fail to open.

use std::io::{self, BufRead};

use url::Url;

/// Opens remote URLs for reading
pub trait Fetch {
    /// Open `url` and return a reader over its body
    fn fetch(&self, url: &Url) -> io::Result<Box<dyn BufRead>>;
}

impl<F> Fetch for F
where
    F: Fn(&Url) -> io::Result<Box<dyn BufRead>>,
{
    fn fetch(&self, url: &Url) -> io::Result<Box<dyn BufRead>> {
        self(url)
    }
}

/// A fetcher that refuses every URL
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFetcher;

impl Fetch for NoFetcher {
    fn fetch(&self, url: &Url) -> io::Result<Box<dyn BufRead>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no network fetcher configured for {url}"),
        ))
    }
}

/// Blocking HTTP(S) fetcher backed by `reqwest`
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// Create a fetcher with a default client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher around an existing client
    #[must_use]
    pub const fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
impl Fetch for HttpFetcher {
    fn fetch(&self, url: &Url) -> io::Result<Box<dyn BufRead>> {
        match url.scheme() {
            "http" | "https" => {
                log::debug!("GET {url}");
                let response = self
                    .client
                    .get(url.as_str())
                    .send()
                    .and_then(reqwest::blocking::Response::error_for_status)
                    .map_err(io::Error::other)?;
                Ok(Box::new(io::BufReader::new(response)))
            },
            scheme => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{scheme} is not supported by the HTTP fetcher"),
            )),
        }
    }
}

/// The fetcher used when none is supplied explicitly
#[must_use]
pub fn default_fetcher() -> Box<dyn Fetch> {
    #[cfg(feature = "http")]
    {
        Box::new(HttpFetcher::new())
    }
    #[cfg(not(feature = "http"))]
    {
        Box::new(NoFetcher)
    }
}
