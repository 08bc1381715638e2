//! SubTracker client
//!
//! Async client for the SubTracker backend, built around a shared session
//! store:
//!
//! - [`SessionStore`]: one identity snapshot per session, shared by every
//!   consumer through cheap clones, with `sign_in` and `sign_out` as the
//!   only mutators
//! - [`ApiClient`]: cookie-carrying HTTP client for the identity, auth and
//!   subscription endpoints
//! - [`validation`]: sign-in and new-subscription form rules, checked before
//!   anything is sent
//!
//! ```no_run
//! use subtracker_client::{ClientConfig, SessionStore};
//!
//! # async fn run() -> Result<(), subtracker_client::ClientError> {
//! let store = SessionStore::from_config(&ClientConfig::from_env()?)?;
//! store.init().await;
//! if !store.state().is_authenticated() {
//!     store.sign_in("jane@example.com", "correct-horse").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod subscriptions;
pub mod validation;

pub use api::{ApiClient, SessionBackend, User};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use session::{SessionState, SessionStore};
pub use subscriptions::{
    CategorySpend, Frequency, SpendingDetails, Subscription, SubscriptionStatus, UpcomingRenewal,
};
pub use validation::{FieldError, NewSubscription, SignInForm, ValidationErrors};
