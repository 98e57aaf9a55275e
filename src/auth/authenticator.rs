use super::callback::CallbackListener;
use crate::credential_store::CredentialStore;
use crate::errors::AuthError;
use crate::traits::{BrowserLauncher, TokenExchange};
use secrecy::{ExposeSecret, SecretString};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use url::Url;

/// Where a login pass currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoCredentials,
    HasStoredCode,
    HasRefreshToken,
    Authenticated,
    Failed,
}

/// Which credential produced the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPath {
    StoredRefreshToken,
    StoredCode,
    BrowserFlow,
}

/// Credentials for API calls after a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub refresh_token: SecretString,
    /// Present when a code exchange already returned one
    pub access_token: Option<SecretString>,
    pub path: LoginPath,
}

/// Polling budget and bind address for the callback listener
#[derive(Debug, Clone)]
pub struct ListenerSettings {
    pub bind_addr: SocketAddr,
    pub attempts: u32,
    pub interval: Duration,
}

impl ListenerSettings {
    pub const DEFAULT_ATTEMPTS: u32 = 50;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    /// Loopback address on the redirect URI's port
    pub fn from_redirect_uri(redirect_uri: &str) -> Result<Self, AuthError> {
        let invalid = |reason: &str| AuthError::InvalidRedirectUri {
            uri: redirect_uri.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(redirect_uri).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid("callback listener only serves plain http"));
        }
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("no port"))?;

        Ok(Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            attempts: Self::DEFAULT_ATTEMPTS,
            interval: Self::DEFAULT_INTERVAL,
        })
    }
}

/// Runs the three-path login decision against the credential store
pub struct Authenticator<'a, X: TokenExchange, B: BrowserLauncher> {
    store: &'a CredentialStore,
    exchange: &'a X,
    browser: &'a B,
    listener: ListenerSettings,
    state: AuthState,
}

impl<'a, X: TokenExchange, B: BrowserLauncher> Authenticator<'a, X, B> {
    pub fn new(
        store: &'a CredentialStore,
        exchange: &'a X,
        browser: &'a B,
        listener: ListenerSettings,
    ) -> Self {
        Self {
            store,
            exchange,
            browser,
            listener,
            state: AuthState::NoCredentials,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Produces a session or the error that should end the process
    pub async fn authenticate(&mut self) -> Result<Session, AuthError> {
        let result = self.run().await;
        self.state = match result {
            Ok(_) => AuthState::Authenticated,
            Err(_) => AuthState::Failed,
        };
        result
    }

    async fn run(&mut self) -> Result<Session, AuthError> {
        if let Some(refresh_token) = self.store.load_refresh_token()? {
            self.state = AuthState::HasRefreshToken;
            tracing::info!("Found stored refresh token");
            return Ok(Session {
                refresh_token,
                access_token: None,
                path: LoginPath::StoredRefreshToken,
            });
        }

        if let Some(code) = self.store.load_code()? {
            self.state = AuthState::HasStoredCode;
            tracing::info!("Found stored auth code, exchanging it for a refresh token");
            return self.exchange_stored_code(&code).await;
        }

        self.state = AuthState::NoCredentials;
        self.browser_flow().await
    }

    async fn exchange_stored_code(&self, code: &str) -> Result<Session, AuthError> {
        match self.exchange.exchange_code(code).await {
            Ok(grant) => {
                tracing::info!("Stored code valid");
                self.store
                    .save_refresh_token(grant.refresh_token.expose_secret())?;
                Ok(Session {
                    refresh_token: grant.refresh_token,
                    access_token: Some(grant.access_token),
                    path: LoginPath::StoredCode,
                })
            }
            Err(e) => {
                tracing::error!("Stored code failed validation: {}", e);
                self.store.delete_code()?;
                Err(AuthError::InvalidStoredCode {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn browser_flow(&self) -> Result<Session, AuthError> {
        let csrf_state = uuid::Uuid::new_v4().to_string();
        let auth_url = self.exchange.authorize_url(&csrf_state)?;

        let mut listener = CallbackListener::start(self.listener.bind_addr, &csrf_state).await?;

        println!("Opening browser for authentication...");
        if let Err(e) = self.browser.open(auth_url.as_str()) {
            tracing::warn!("Failed to open browser: {}", e);
            println!("Open this URL to authorize the application:\n{}", auth_url);
        }

        let code = listener
            .wait_for_code(self.listener.attempts, self.listener.interval)
            .await;
        listener.shutdown().await;

        let Some(code) = code else {
            return Err(AuthError::CallbackTimeout {
                attempts: self.listener.attempts,
            });
        };

        match self.exchange.exchange_code(&code).await {
            Ok(grant) => {
                tracing::info!("New auth code valid");
                self.store.save_code(&code)?;
                self.store
                    .save_refresh_token(grant.refresh_token.expose_secret())?;
                Ok(Session {
                    refresh_token: grant.refresh_token,
                    access_token: Some(grant.access_token),
                    path: LoginPath::BrowserFlow,
                })
            }
            Err(e) => {
                self.store.delete_code()?;
                Err(AuthError::CodeExchangeFailed {
                    reason: e.to_string(),
                })
            }
        }
    }
}
