pub use bytes::Bytes;
pub use reqwest::header::{HeaderMap, HeaderValue};
pub use reqwest::Client as HttpClient;
pub use reqwest::ClientBuilder as HttpClientBuilder;
pub use reqwest_cookie_store::{CookieStore, CookieStoreRwLock};

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Status and raw body of a finished request.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Bytes,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_reply(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as json, `Null` when it is empty or not json.
    pub fn json_value(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// The `error` (or `message`) string of a json body.
    pub fn error_message(&self) -> Option<String> {
        error_message(&self.json_value())
    }

    /// Turn a non-2xx reply into `ClientError::Server`.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            let message = self.error_message();
            Err(ClientError::server(self.status, message))
        }
    }
}

pub fn error_message(value: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .next()
}

/// The network seam every view goes through.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: Url) -> Result<HttpReply>;
    async fn post_json(&self, url: Url, body: Value) -> Result<HttpReply>;
}

pub trait HasCookieJar {
    fn jar(&self) -> Arc<CookieStoreRwLock>;
}

fn load_(jar: Arc<CookieStoreRwLock>, data: &str) -> Result<()> {
    let loaded = cookie_store::serde::json::load_all(Cursor::new(data))
        .map_err(|e| anyhow!("failed to parse cookie data: {}", e))?;
    let mut jar = jar.write().map_err(|_| anyhow!("cookie jar poisoned"))?;
    *jar = loaded;
    Ok(())
}

fn save_(jar: Arc<CookieStoreRwLock>) -> Result<String> {
    let jar = jar.read().map_err(|_| anyhow!("cookie jar poisoned"))?;
    let mut cursor = Cursor::new(Vec::new());
    cookie_store::serde::json::save_incl_expired_and_nonpersistent(&jar, &mut cursor)
        .map_err(|e| anyhow!("failed to save cookies: {}", e))?;
    Ok(String::from_utf8(cursor.into_inner()).unwrap_or_default())
}

/// Session cookies survive between runs through these.
pub trait Session {
    fn load_session(&self, data: &str) -> Result<()>;
    fn save_session(&self) -> Result<String>;
    fn clear_session(&self) -> Result<()>;
}

impl<T: HasCookieJar> Session for T {
    fn load_session(&self, data: &str) -> Result<()> {
        load_(self.jar(), data)
    }

    fn save_session(&self) -> Result<String> {
        save_(self.jar())
    }

    fn clear_session(&self) -> Result<()> {
        let jar = self.jar();
        let mut jar = jar.write().map_err(|_| anyhow!("cookie jar poisoned"))?;
        jar.clear();
        Ok(())
    }
}

pub fn client_builder_with_jar(jar: Arc<CookieStoreRwLock>) -> HttpClientBuilder {
    HttpClientBuilder::new().cookie_provider(jar)
}

fn map_reqwest(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Transport(e)
    }
}

/// `Transport` over reqwest, with a cookie jar holding the login session.
pub struct HttpTransport {
    client: HttpClient,
    jar: Arc<CookieStoreRwLock>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let jar = Arc::new(CookieStoreRwLock::default());

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = client_builder_with_jar(jar.clone())
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, jar })
    }

    async fn finish(rsp: reqwest::Response) -> Result<HttpReply> {
        let status = rsp.status().as_u16();
        let body = rsp.bytes().await.map_err(map_reqwest)?;
        log::debug!("<- {} ({} bytes)", status, body.len());
        Ok(HttpReply { status, body })
    }
}

impl HasCookieJar for HttpTransport {
    fn jar(&self) -> Arc<CookieStoreRwLock> {
        self.jar.clone()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url) -> Result<HttpReply> {
        log::debug!("-> GET {}", url);
        let rsp = self.client.get(url).send().await.map_err(map_reqwest)?;
        Self::finish(rsp).await
    }

    async fn post_json(&self, url: Url, body: Value) -> Result<HttpReply> {
        log::debug!("-> POST {}", url);
        let rsp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest)?;
        Self::finish(rsp).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Get(String),
        Post(String, Value),
    }

    pub enum Scripted {
        Reply(HttpReply),
        Delayed(Duration, HttpReply),
        Fail(ClientError),
    }

    /// Replays scripted replies in order and records every call.
    #[derive(Default)]
    pub struct FakeTransport {
        replies: Mutex<VecDeque<Scripted>>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, status: u16, value: Value) -> Self {
            self.push(Scripted::Reply(HttpReply::json_reply(status, &value)))
        }

        pub fn bytes(self, status: u16, body: &'static [u8]) -> Self {
            self.push(Scripted::Reply(HttpReply::new(status, body)))
        }

        pub fn delayed(self, delay: Duration, status: u16, value: Value) -> Self {
            self.push(Scripted::Delayed(
                delay,
                HttpReply::json_reply(status, &value),
            ))
        }

        pub fn fail(self, err: ClientError) -> Self {
            self.push(Scripted::Fail(err))
        }

        fn push(self, s: Scripted) -> Self {
            self.replies.lock().unwrap().push_back(s);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn next(&self) -> Result<HttpReply> {
            let next = self.replies.lock().unwrap().pop_front();
            match next {
                Some(Scripted::Reply(r)) => Ok(r),
                Some(Scripted::Delayed(d, r)) => {
                    tokio::time::sleep(d).await;
                    Ok(r)
                }
                Some(Scripted::Fail(e)) => Err(e),
                None => Err(ClientError::Internal(anyhow!("no scripted reply"))),
            }
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, url: Url) -> Result<HttpReply> {
            self.calls.lock().unwrap().push(Call::Get(url.to_string()));
            self.next().await
        }

        async fn post_json(&self, url: Url, body: Value) -> Result<HttpReply> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Post(url.to_string(), body));
            self.next().await
        }
    }
}
