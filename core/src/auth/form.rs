use serde_json::{json, Value};
use std::marker::PhantomData;
use tokio::sync::watch;
use url::Url;

use super::validate::*;
use crate::context::Context;
use crate::error::{ClientError, ValidationError};
use crate::nav::{Redirect, LOGIN_ROUTE};
use crate::sequence::RequestSequence;

/// A form posted as json to one auth endpoint.
pub trait AuthForm: Send + Sync {
    const PATH: &'static str;
    const SUCCESS_MESSAGE: &'static str;
    const FAILURE_MESSAGE: &'static str;
    const REDIRECT: &'static str;

    fn validate(&self) -> Result<(), ValidationError>;
    fn body(&self) -> Value;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl AuthForm for RegisterForm {
    const PATH: &'static str = "/api/auth/register";
    const SUCCESS_MESSAGE: &'static str = "Registration successful! Redirecting to login...";
    const FAILURE_MESSAGE: &'static str = "Registration failed";
    const REDIRECT: &'static str = LOGIN_ROUTE;

    fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_confirmation(&self.password, &self.confirm_password)?;
        validate_phone(&self.phone)
    }

    fn body(&self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "password": self.password,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetPasswordForm {
    pub token: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    /// Takes the reset token from the `token` query parameter of the page url.
    pub fn from_url(page: &Url, password: &str, confirm_password: &str) -> Self {
        let token = page
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty());
        Self {
            token,
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }
}

impl AuthForm for ResetPasswordForm {
    const PATH: &'static str = "/api/auth/reset-password";
    const SUCCESS_MESSAGE: &'static str = "Password reset successful! Redirecting to login...";
    const FAILURE_MESSAGE: &'static str = "Failed to reset password";
    const REDIRECT: &'static str = LOGIN_ROUTE;

    fn validate(&self) -> Result<(), ValidationError> {
        if self.token.is_none() {
            return Err(ValidationError::MissingResetToken);
        }
        validate_password(&self.password)?;
        validate_confirmation(&self.password, &self.confirm_password)
    }

    fn body(&self) -> Value {
        json!({
            "token": self.token,
            "password": self.password,
        })
    }
}

/// At most one of error and success is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormStatus {
    error: Option<String>,
    success: Option<String>,
}

impl FormStatus {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn is_clear(&self) -> bool {
        self.error.is_none() && self.success.is_none()
    }

    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            success: None,
        }
    }

    fn succeeded(message: String) -> Self {
        Self {
            error: None,
            success: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Blocked locally, nothing was sent.
    Invalid(ValidationError),
    Rejected(String),
    Succeeded { message: String, redirect: Redirect },
    /// A newer submission took over before this one finished.
    Superseded,
}

pub struct FormController<F> {
    ctx: Context,
    seq: RequestSequence,
    status: watch::Sender<FormStatus>,
    _form: PhantomData<fn(&F)>,
}

impl<F: AuthForm> FormController<F> {
    pub fn new(ctx: Context) -> Self {
        let (status, _) = watch::channel(FormStatus::default());
        Self {
            ctx,
            seq: RequestSequence::new(),
            status,
            _form: PhantomData,
        }
    }

    pub fn status(&self) -> FormStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormStatus> {
        self.status.subscribe()
    }

    pub async fn submit(&self, form: &F) -> FormOutcome {
        let mut issued = None;
        self.status.send_modify(|status| {
            issued = Some(self.seq.issue());
            *status = FormStatus::default();
        });
        let Some(ticket) = issued else {
            return FormOutcome::Superseded;
        };

        if let Err(e) = form.validate() {
            log::debug!("{} blocked: {}", F::PATH, e);
            self.publish(ticket.id(), FormStatus::failed(e.to_string()));
            return FormOutcome::Invalid(e);
        }

        let result = match self.ctx.config.endpoint(F::PATH) {
            Ok(url) => {
                let fut = self.ctx.transport.post_json(url, form.body());
                ticket
                    .run(self.ctx.config.request_timeout, fut)
                    .await
                    .and_then(|reply| reply.error_for_status())
            }
            Err(e) => Err(e),
        };

        let (status, outcome) = match result {
            Ok(_) => {
                log::info!("{} succeeded", F::PATH);
                let message = F::SUCCESS_MESSAGE.to_string();
                let redirect = Redirect::after(F::REDIRECT, self.ctx.config.redirect_delay);
                (
                    FormStatus::succeeded(message.clone()),
                    FormOutcome::Succeeded { message, redirect },
                )
            }
            Err(ClientError::Cancelled) => return FormOutcome::Superseded,
            Err(e) => {
                log::warn!("{} failed: {}", F::PATH, e);
                let message = e.user_message(F::FAILURE_MESSAGE);
                (
                    FormStatus::failed(message.clone()),
                    FormOutcome::Rejected(message),
                )
            }
        };

        if self.publish(ticket.id(), status) {
            outcome
        } else {
            FormOutcome::Superseded
        }
    }

    fn publish(&self, ticket: u64, status: FormStatus) -> bool {
        self.status.send_if_modified(|current| {
            if self.seq.current_id() == ticket {
                *current = status;
                true
            } else {
                false
            }
        })
    }
}
