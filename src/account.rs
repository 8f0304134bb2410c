//! Account flows: login, registration, and account deletion.
//!
//! These bridge the remote auth endpoints and the [`SessionManager`]. The
//! manager itself never talks to the network; these functions obtain (or
//! invalidate) the credential and hand the result to it.

use crate::remote::ApiClient;
use crate::session::SessionManager;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Exchange credentials for a token and start an authenticated session.
/// Server-side failures (wrong password, unknown account) propagate with
/// the server's message for the login surface to display.
pub async fn login(
    api: &ApiClient,
    session: &Arc<SessionManager>,
    email: &str,
    password: &str,
) -> Result<()> {
    let token = api
        .login(email, password)
        .await
        .context("login failed")?;
    session.login(&token);
    Ok(())
}

/// Create an account and start an authenticated session with the returned
/// token.
pub async fn register(
    api: &ApiClient,
    session: &Arc<SessionManager>,
    email: &str,
    password: &str,
) -> Result<()> {
    let token = api
        .register(email, password)
        .await
        .context("registration failed")?;
    session.login(&token);
    Ok(())
}

/// Delete the account behind the current session.
///
/// The session is logged out afterwards no matter what: an inconclusive
/// deletion attempt means the credential can no longer be trusted. The
/// failure itself is still reported to the caller.
pub async fn delete_account(api: &ApiClient, session: &Arc<SessionManager>) -> Result<()> {
    let Some(token) = session.credential() else {
        session.logout();
        return Ok(());
    };

    let result = api.delete_account(&token).await;
    session.logout();

    result.context("account deletion failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CredentialStore, SessionState};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> (Arc<SessionManager>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credential"));
        (
            SessionManager::new(store, Duration::from_secs(600)),
            dir,
        )
    }

    #[tokio::test]
    async fn login_stores_token_and_authenticates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok-7"})),
            )
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let (sess, _dir) = session();
        login(&api, &sess, "a@b.c", "hunter22").await.unwrap();

        assert!(sess.is_authenticated());
        assert_eq!(sess.credential(), Some("tok-7".to_string()));
    }

    #[tokio::test]
    async fn failed_login_leaves_session_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "invalid credentials"})),
            )
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let (sess, _dir) = session();
        let err = login(&api, &sess, "a@b.c", "wrong").await.unwrap_err();

        assert!(format!("{err:#}").contains("invalid credentials"));
        assert_eq!(sess.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn register_authenticates_with_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"token": "tok-new"})),
            )
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let (sess, _dir) = session();
        register(&api, &sess, "new@b.c", "hunter22").await.unwrap();
        assert_eq!(sess.credential(), Some("tok-new".to_string()));
    }

    #[tokio::test]
    async fn delete_account_logs_out_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/auth/delete"))
            .and(header("Authorization", "Bearer tok-7"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let (sess, dir) = session();
        sess.login("tok-7");

        delete_account(&api, &sess).await.unwrap();
        assert_eq!(sess.state(), SessionState::Unauthenticated);
        assert!(!dir.path().join("credential").exists());
    }

    #[tokio::test]
    async fn delete_account_logs_out_even_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/auth/delete"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let (sess, _dir) = session();
        sess.login("tok-7");

        let result = delete_account(&api, &sess).await;
        assert!(result.is_err());
        // Inconclusive deletion: the session is treated as untrustworthy.
        assert_eq!(sess.state(), SessionState::Unauthenticated);
        assert_eq!(sess.credential(), None);
    }

    #[tokio::test]
    async fn delete_account_without_credential_just_logs_out() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/auth/delete"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let (sess, _dir) = session();
        delete_account(&api, &sess).await.unwrap();
        assert_eq!(sess.state(), SessionState::Unauthenticated);
    }
}
