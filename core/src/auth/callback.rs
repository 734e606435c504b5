use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

use crate::context::Context;
use crate::error::{ClientError, Result};
use crate::nav::{Navigator, HOME_ROUTE, LOGIN_ROUTE};

pub const MISSING_TOKEN_ALERT: &str = "Google sign-in failed: no token received.";
pub const EXCHANGE_FAILED_ALERT: &str = "Google sign-in failed. Please try again.";

/// Trades an identity provider token for an application session.
#[async_trait]
pub trait IdentityExchange: Send + Sync {
    async fn exchange(&self, id_token: &str) -> Result<()>;
}

/// Posts the Google id token to the backend; the session cookie lands in
/// the transport's jar.
pub struct GoogleExchange {
    ctx: Context,
}

impl GoogleExchange {
    pub const PATH: &'static str = "/api/auth/google";

    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl IdentityExchange for GoogleExchange {
    async fn exchange(&self, id_token: &str) -> Result<()> {
        let url = self.ctx.config.endpoint(Self::PATH)?;
        let fut = self.ctx.transport.post_json(url, json!({ "token": id_token }));
        tokio::time::timeout(self.ctx.config.request_timeout, fut)
            .await
            .map_err(|_| ClientError::Timeout)??
            .error_for_status()?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct FragmentParams {
    id_token: Option<String>,
}

/// The `id_token` carried in the url fragment. The query string is ignored.
pub fn fragment_token(url: &Url) -> Option<String> {
    let fragment = url.fragment()?;
    serde_urlencoded::from_str::<FragmentParams>(fragment)
        .ok()?
        .id_token
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    SignedIn,
    MissingToken,
    ExchangeFailed(String),
    AlreadyHandled,
}

/// Handles one page load of the sign-in callback. Only the first call does
/// anything.
pub struct CallbackHandler<E> {
    exchange: E,
    handled: AtomicBool,
}

impl<E: IdentityExchange> CallbackHandler<E> {
    pub fn new(exchange: E) -> Self {
        Self {
            exchange,
            handled: AtomicBool::new(false),
        }
    }

    pub async fn handle(&self, url: &Url, nav: &dyn Navigator) -> CallbackOutcome {
        if self.handled.swap(true, Ordering::SeqCst) {
            return CallbackOutcome::AlreadyHandled;
        }

        let Some(token) = fragment_token(url) else {
            log::warn!("sign-in callback without id_token");
            nav.alert(MISSING_TOKEN_ALERT);
            nav.navigate(LOGIN_ROUTE);
            return CallbackOutcome::MissingToken;
        };

        match self.exchange.exchange(&token).await {
            Ok(()) => {
                log::info!("signed in with google");
                nav.navigate(HOME_ROUTE);
                CallbackOutcome::SignedIn
            }
            Err(e) => {
                log::error!("google token exchange failed: {}", e);
                nav.alert(EXCHANGE_FAILED_ALERT);
                nav.navigate(LOGIN_ROUTE);
                CallbackOutcome::ExchangeFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::testing::{Call, FakeTransport};
    use crate::nav::testing::{NavEvent, RecordingNavigator};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct StubExchange {
        reject: bool,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IdentityExchange for StubExchange {
        async fn exchange(&self, id_token: &str) -> Result<()> {
            self.seen.lock().unwrap().push(id_token.to_string());
            if self.reject {
                Err(ClientError::server(401, Some("invalid token".into())))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_fragment_token() {
        let url = Url::parse("http://localhost:3000/auth/google/callback#id_token=abc&state=x").unwrap();
        assert_eq!(fragment_token(&url).as_deref(), Some("abc"));

        let url = Url::parse("http://localhost:3000/auth/google/callback?id_token=abc").unwrap();
        assert_eq!(fragment_token(&url), None);

        let url = Url::parse("http://localhost:3000/auth/google/callback#id_token=").unwrap();
        assert_eq!(fragment_token(&url), None);
    }

    #[tokio::test]
    async fn test_rejected_exchange_redirects_to_login() {
        let handler = CallbackHandler::new(StubExchange {
            reject: true,
            ..Default::default()
        });
        let nav = RecordingNavigator::default();
        let url = Url::parse("http://localhost:3000/auth/google/callback#id_token=abc").unwrap();

        let outcome = handler.handle(&url, &nav).await;
        assert!(matches!(outcome, CallbackOutcome::ExchangeFailed(_)));
        assert_eq!(*handler.exchange.seen.lock().unwrap(), vec!["abc".to_string()]);
        assert_eq!(
            nav.events(),
            vec![
                NavEvent::Alert(EXCHANGE_FAILED_ALERT.into()),
                NavEvent::Navigate("/login".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_token_skips_exchange() {
        let handler = CallbackHandler::new(StubExchange::default());
        let nav = RecordingNavigator::default();
        let url = Url::parse("http://localhost:3000/auth/google/callback?id_token=abc").unwrap();

        assert_eq!(handler.handle(&url, &nav).await, CallbackOutcome::MissingToken);
        assert!(handler.exchange.seen.lock().unwrap().is_empty());
        assert_eq!(
            nav.events(),
            vec![
                NavEvent::Alert(MISSING_TOKEN_ALERT.into()),
                NavEvent::Navigate("/login".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_runs_once() {
        let handler = CallbackHandler::new(StubExchange::default());
        let nav = RecordingNavigator::default();
        let url = Url::parse("http://localhost:3000/auth/google/callback#id_token=abc").unwrap();

        assert_eq!(handler.handle(&url, &nav).await, CallbackOutcome::SignedIn);
        assert_eq!(
            handler.handle(&url, &nav).await,
            CallbackOutcome::AlreadyHandled
        );
        assert_eq!(handler.exchange.seen.lock().unwrap().len(), 1);
        assert_eq!(nav.events(), vec![NavEvent::Navigate("/".into())]);
    }

    #[tokio::test]
    async fn test_google_exchange_posts_token() {
        let transport = Arc::new(FakeTransport::new().reply(200, serde_json::json!({})));
        let ctx = Context::new(
            ClientConfig::new("http://localhost:5000").unwrap(),
            transport.clone(),
        );
        GoogleExchange::new(ctx).exchange("abc").await.unwrap();
        assert_eq!(
            transport.calls(),
            vec![Call::Post(
                "http://localhost:5000/api/auth/google".into(),
                serde_json::json!({ "token": "abc" })
            )]
        );
    }
}
