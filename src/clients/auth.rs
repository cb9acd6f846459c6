use reqwest::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthError, AuthUser};

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    email: Option<String>,
}

/// Client for the hosted auth service (`/auth/v1/user`).
#[derive(Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(base_url: &str, anon_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(base_url),
            anon_key,
        }
    }

    pub async fn get_user(&self, token: &str) -> Result<AuthUser, AuthError> {
        let url = format!("{}/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let user: RemoteUser = response
                    .json()
                    .await
                    .map_err(|e| AuthError::Upstream(e.to_string()))?;
                Ok(AuthUser {
                    id: user.id,
                    email: user.email,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::Rejected),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(AuthError::Upstream(format!(
                    "Auth service responded with {}: {}",
                    status, text
                )))
            }
        }
    }
}

fn normalize_base_url(value: &str) -> String {
    let trimmed = value.trim_end_matches('/');
    if trimmed.ends_with("/auth/v1") {
        trimmed.to_string()
    } else {
        format!("{}/auth/v1", trimmed)
    }
}
