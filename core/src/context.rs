use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpTransport, Transport};

/// Configuration and transport shared by every view.
#[derive(Clone)]
pub struct Context {
    pub config: Arc<ClientConfig>,
    pub transport: Arc<dyn Transport>,
}

impl Context {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Context over a real reqwest transport. The transport is returned too so
    /// the caller can persist its session.
    pub fn with_http(config: ClientConfig) -> Result<(Self, Arc<HttpTransport>)> {
        let http = Arc::new(HttpTransport::new(&config)?);
        Ok((Self::new(config, http.clone()), http))
    }
}
