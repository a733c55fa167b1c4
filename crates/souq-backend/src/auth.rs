//! Auth-service endpoints: sign-up, password sign-in, session lookup, sign-out.

use reqwest::Method;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::types::{AuthUser, PasswordCredentials, Session, SignUpRequest};

impl BackendClient {
    /// Registers a new seller account.
    ///
    /// Depending on project settings the auth service answers with the bare
    /// user (email confirmation pending) or with a full session; both shapes
    /// are accepted and the user is returned.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Api`] if the service rejects the sign-up, e.g. the
    ///   email is already registered or the password is too weak.
    /// - [`BackendError::Http`] on network failure.
    /// - [`BackendError::Deserialize`] if the response has no user.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, BackendError> {
        let url = self.endpoint::<&str, &str>("auth/v1/signup", &[])?;
        let data = display_name.map_or_else(
            || serde_json::json!({}),
            |name| serde_json::json!({ "display_name": name }),
        );
        let body = SignUpRequest {
            email,
            password,
            data,
        };
        let response = self
            .send_json(Method::POST, url, None, &body, None, "signup")
            .await?;

        let user = match response.get("user") {
            Some(user) if !user.is_null() => user.clone(),
            _ => response,
        };
        serde_json::from_value(user).map_err(|e| BackendError::Deserialize {
            context: "signup".to_string(),
            source: e,
        })
    }

    /// Exchanges email and password for a session.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Api`] with status 400 on invalid credentials.
    /// - [`BackendError::Http`] on network failure.
    /// - [`BackendError::Deserialize`] if the response is not a session.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let url = self.endpoint("auth/v1/token", &[("grant_type", "password")])?;
        let body = PasswordCredentials { email, password };
        let response = self
            .send_json(Method::POST, url, None, &body, None, "token(password)")
            .await?;
        serde_json::from_value(response).map_err(|e| BackendError::Deserialize {
            context: "token(password)".to_string(),
            source: e,
        })
    }

    /// Resolves an access token to the signed-in user.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Unauthorized`] if the token is invalid or expired.
    /// - [`BackendError::Http`] on network failure.
    /// - [`BackendError::Deserialize`] if the response is not a user.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let url = self.endpoint::<&str, &str>("auth/v1/user", &[])?;
        let body = self.get_json(&url, Some(access_token), "user").await?;
        serde_json::from_value(body).map_err(|e| BackendError::Deserialize {
            context: "user".to_string(),
            source: e,
        })
    }

    /// Revokes the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Unauthorized`] if the token was already invalid.
    /// - [`BackendError::Http`] on network failure.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.endpoint::<&str, &str>("auth/v1/logout", &[])?;
        self.send_empty(Method::POST, url, Some(access_token)).await
    }
}
