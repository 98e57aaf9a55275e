use crate::errors::{AuthError, RedditError};
use crate::models::{CandidatePost, TokenGrant};
use url::Url;

/// Exchanges an authorization code with the identity provider
pub trait TokenExchange: Send + Sync {
    /// Consent page URL the user is sent to
    fn authorize_url(&self, state: &str) -> Result<Url, AuthError>;

    fn exchange_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<TokenGrant, AuthError>> + Send;
}

/// Opens a URL for the user, allowing tests to observe the launch
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Default implementation that opens the system browser
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        webbrowser::open(url)
    }
}

/// Source of recent posts for a subreddit
pub trait PostSource: Send + Sync {
    fn new_posts(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<CandidatePost>, RedditError>> + Send;
}
