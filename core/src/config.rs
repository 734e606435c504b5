use std::time::Duration;
use url::Url;

use crate::error::Result;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Process-wide client settings, resolved once at start-up and shared by
/// every component that talks to the API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub redirect_delay: Duration,
    pub page_size: u32,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // keep the last path segment when joining relative endpoints
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Resolve an API path such as `/api/coaches` against the base url.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Resolve a link returned by the API, which may be absolute or relative.
    pub fn resolve(&self, link: &str) -> Result<Url> {
        match Url::parse(link) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.base_url.join(link)?),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = ClientConfig::new("http://localhost:5000").unwrap();
        assert_eq!(
            config.endpoint("/api/auth/register").unwrap().as_str(),
            "http://localhost:5000/api/auth/register"
        );

        let config = ClientConfig::new("https://example.com/backend").unwrap();
        assert_eq!(
            config.endpoint("/api/coaches").unwrap().as_str(),
            "https://example.com/backend/api/coaches"
        );
    }

    #[test]
    fn test_resolve() {
        let config = ClientConfig::new("https://example.com").unwrap();
        assert_eq!(
            config.resolve("/files/a.pdf").unwrap().as_str(),
            "https://example.com/files/a.pdf"
        );
        assert_eq!(
            config.resolve("https://cdn.example.net/a.pdf").unwrap().as_str(),
            "https://cdn.example.net/a.pdf"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://localhost:5000").unwrap();
        assert_eq!(config.redirect_delay, Duration::from_millis(1500));
        assert_eq!(config.page_size, 9);
        assert_eq!(config.with_page_size(0).page_size, 1);
    }

    #[test]
    fn test_invalid_base() {
        assert!(ClientConfig::new("not a url").is_err());
    }
}
