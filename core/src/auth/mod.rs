pub mod callback;
pub mod form;
pub mod validate;

pub use callback::{CallbackHandler, CallbackOutcome, GoogleExchange, IdentityExchange};
pub use form::{AuthForm, FormController, FormOutcome, FormStatus, RegisterForm, ResetPasswordForm};
