use anyhow::anyhow;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::context::Context;
use crate::error::{ClientError, Result};
use crate::model::DownloadFile;

pub const DOWNLOADS_PATH: &str = "/api/downloads/";
pub const SESSION_PARAM: &str = "session_id";
pub const EMPTY_MESSAGE: &str = "No files available";
pub const FAILURE_MESSAGE: &str = "Failed to load downloads";
const MAX_NAME_SUFFIX: u32 = 999;

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadState {
    Ready(Vec<DownloadFile>),
    /// Loaded fine, nothing to download.
    Empty,
    Failure(String),
}

/// `session_id` from the page's query string.
pub fn session_id_from_url(page: &Url) -> Option<String> {
    page.query_pairs()
        .find(|(k, _)| k == SESSION_PARAM)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Decode `{ files: [...] }`. A non-array `files` is an empty list.
pub fn parse_files(value: &Value) -> Vec<DownloadFile> {
    match value.get("files") {
        Some(Value::Array(files)) => files
            .iter()
            .filter_map(|v| match serde_json::from_value::<DownloadFile>(v.clone()) {
                Ok(f) => Some(f),
                Err(e) => {
                    log::warn!("skipping malformed download entry: {}", e);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Keeps a file name inside the target directory.
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "file".to_string(),
        _ => cleaned,
    }
}

/// `name`, then `stem (1).ext`, `stem (2).ext`, ...
fn numbered_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", name, n),
    }
}

/// Create a file in `dir` that does not clobber an existing one.
async fn create_unique(dir: &Path, name: &str) -> Result<(PathBuf, tokio::fs::File)> {
    for n in 0..=MAX_NAME_SUFFIX {
        let path = dir.join(numbered_name(name, n));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(anyhow!("no free file name for {} in {}", name, dir.display()).into())
}

pub struct DownloadPage {
    ctx: Context,
}

impl DownloadPage {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    fn session_url(&self, session_id: &str) -> Result<Url> {
        let mut url = self.ctx.config.endpoint(DOWNLOADS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("base url cannot carry a path"))?
            .pop_if_empty()
            .push(session_id);
        Ok(url)
    }

    async fn fetch(&self, session_id: &str) -> Result<Vec<DownloadFile>> {
        let url = self.session_url(session_id)?;
        let reply = tokio::time::timeout(self.ctx.config.request_timeout, self.ctx.transport.get(url))
            .await
            .map_err(|_| ClientError::Timeout)??
            .error_for_status()?;
        Ok(parse_files(&reply.json::<Value>()?))
    }

    /// Load the files for the checkout session named in the page url.
    pub async fn load(&self, page: &Url) -> DownloadState {
        self.load_session(session_id_from_url(page).as_deref()).await
    }

    pub async fn load_session(&self, session_id: Option<&str>) -> DownloadState {
        let Some(session_id) = session_id.map(str::trim).filter(|s| !s.is_empty()) else {
            return DownloadState::Failure(ClientError::MissingSessionId.to_string());
        };
        match self.fetch(session_id).await {
            Ok(files) if files.is_empty() => DownloadState::Empty,
            Ok(files) => DownloadState::Ready(files),
            Err(e) => {
                log::warn!("downloads for {} failed: {}", session_id, e);
                DownloadState::Failure(e.user_message(FAILURE_MESSAGE))
            }
        }
    }

    /// Fetch one file into `dir`, returning the written path. A name already
    /// taken in `dir` gets a numbered suffix.
    pub async fn save_file(&self, file: &DownloadFile, dir: &Path) -> Result<PathBuf> {
        let url = self.ctx.config.resolve(&file.url)?;
        let reply = self.ctx.transport.get(url).await?.error_for_status()?;
        let name = safe_file_name(&file.display_name());
        let (path, mut out) = create_unique(dir, &name).await?;
        out.write_all(&reply.body).await?;
        out.flush().await?;
        if path.file_name().and_then(|n| n.to_str()) != Some(name.as_str()) {
            log::warn!("{} exists, saved as {}", name, path.display());
        }
        log::info!("saved {} ({} bytes)", path.display(), reply.body.len());
        Ok(path)
    }
}
