use serde_json::json;

use crate::context::Context;
use crate::error::{ClientError, Result};
use crate::model::UserProfile;

pub const PROFILE_PATH: &str = "/api/auth/profile";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const NOT_LOGGED_IN: &str = "Not logged in.";

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileState {
    Loaded(UserProfile),
    /// Every failure to fetch the profile ends here.
    NotLoggedIn,
}

pub struct ProfileView {
    ctx: Context,
}

impl ProfileView {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    async fn fetch(&self) -> Result<UserProfile> {
        let url = self.ctx.config.endpoint(PROFILE_PATH)?;
        let reply = tokio::time::timeout(self.ctx.config.request_timeout, self.ctx.transport.get(url))
            .await
            .map_err(|_| ClientError::Timeout)??
            .error_for_status()?;
        reply.json()
    }

    pub async fn load(&self) -> ProfileState {
        match self.fetch().await {
            Ok(profile) => ProfileState::Loaded(profile),
            Err(e) => {
                log::debug!("profile unavailable: {}", e);
                ProfileState::NotLoggedIn
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        let url = self.ctx.config.endpoint(LOGOUT_PATH)?;
        self.ctx
            .transport
            .post_json(url, json!({}))
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::testing::{Call, FakeTransport};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn view(transport: Arc<FakeTransport>) -> ProfileView {
        ProfileView::new(Context::new(
            ClientConfig::new("http://localhost:5000").unwrap(),
            transport,
        ))
    }

    #[tokio::test]
    async fn test_loaded() {
        let transport = Arc::new(FakeTransport::new().reply(
            200,
            serde_json::json!({
                "name": "Ada",
                "email": "ada@example.com",
                "role": "coach",
                "emailVerified": true
            }),
        ));
        let state = view(transport.clone()).load().await;
        assert_eq!(
            state,
            ProfileState::Loaded(UserProfile {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                role: Some("coach".into()),
                email_verified: Some(true),
                phone: None,
            })
        );
        assert_eq!(
            transport.calls(),
            vec![Call::Get("http://localhost:5000/api/auth/profile".into())]
        );
    }

    #[tokio::test]
    async fn test_failures_render_not_logged_in() {
        let transport = Arc::new(
            FakeTransport::new()
                .reply(401, serde_json::json!({ "error": "Unauthorized" }))
                .reply(200, serde_json::json!({ "unexpected": true }))
                .fail(ClientError::Timeout),
        );
        let view = view(transport);
        for _ in 0..3 {
            assert_eq!(view.load().await, ProfileState::NotLoggedIn);
        }
    }

    #[tokio::test]
    async fn test_logout() {
        let transport = Arc::new(FakeTransport::new().reply(200, serde_json::json!({})));
        view(transport.clone()).logout().await.unwrap();
        assert_eq!(
            transport.calls(),
            vec![Call::Post(
                "http://localhost:5000/api/auth/logout".into(),
                serde_json::json!({})
            )]
        );
    }
}
