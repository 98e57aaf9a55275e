use crate::config::AppSettings;
use crate::errors::AuthError;
use crate::models::{ErrorResponse, TokenGrant, TokenResponse};
use crate::traits::TokenExchange;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

const REDDIT_AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Scopes requested at consent time
pub const SCOPES: [&str; 2] = ["identity", "read"];

/// Reddit "installed/web app" OAuth client
#[derive(Debug, Clone)]
pub struct RedditOAuth {
    http: Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    authorize_url: String,
    token_url: String,
}

impl RedditOAuth {
    pub fn new(http: Client, settings: &AppSettings) -> Self {
        Self {
            http,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            authorize_url: REDDIT_AUTHORIZE_URL.to_string(),
            token_url: REDDIT_TOKEN_URL.to_string(),
        }
    }

    /// Points token requests at another endpoint
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Trades the refresh token for a short-lived access token
    pub async fn refresh_access_token(
        &self,
        refresh_token: &SecretString,
    ) -> Result<SecretString, AuthError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret().as_str()),
        ];
        let token = self.request_token(&params).await?;
        tracing::debug!("Access token refreshed");
        Ok(SecretString::new(token.access_token))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        // Try to parse as error response first
        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&response_text) {
            return Err(AuthError::OAuthError {
                code: error_response.error,
                description: error_response.error_description,
            });
        }

        if !status.is_success() {
            return Err(AuthError::Generic {
                reason: format!("Token endpoint returned {}: {}", status, response_text),
            });
        }

        Ok(serde_json::from_str::<TokenResponse>(&response_text)?)
    }
}

impl TokenExchange for RedditOAuth {
    fn authorize_url(&self, state: &str) -> Result<Url, AuthError> {
        let scope = SCOPES.join(" ");
        Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("state", state),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("duration", "permanent"),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| AuthError::Generic {
            reason: format!("Failed to build authorization URL: {}", e),
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let token = self.request_token(&params).await?;

        let refresh_token = token.refresh_token.ok_or_else(|| AuthError::Generic {
            reason: "Token response did not include a refresh token".to_string(),
        })?;

        tracing::debug!(
            "Code exchanged, granted scope: {}",
            token.scope.as_deref().unwrap_or("unknown")
        );

        Ok(TokenGrant {
            access_token: SecretString::new(token.access_token),
            refresh_token: SecretString::new(refresh_token),
        })
    }
}
