//! tasklink — authenticated task-list client.
//!
//! Core pieces:
//! - [`session::SessionManager`] — owns the credential, the
//!   `Unauthenticated / Authenticated / Expired` state machine, and the
//!   idle-inactivity timer.
//! - [`tasks::TaskSynchronizer`] — keeps an in-memory task collection in
//!   sync with the remote API using confirm-before-apply semantics, and
//!   routes any authorization rejection into session expiry.
//! - [`remote::ApiClient`] — the HTTP surface of the remote task API.
//! - [`account`] — login / registration / account-deletion flows bridging
//!   the two.

pub mod account;
pub mod config;
pub mod error;
pub mod remote;
pub mod session;
pub mod tasks;

pub use config::Config;
pub use error::ApiError;
pub use remote::{ApiClient, Task, TaskPatch};
pub use session::{CredentialStore, SessionManager, SessionState};
pub use tasks::{TaskStats, TaskSynchronizer};
