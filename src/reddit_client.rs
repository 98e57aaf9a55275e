use crate::auth::{RedditOAuth, Session};
use crate::errors::RedditError;
use crate::models::{CandidatePost, Listing, PostData};
use crate::traits::PostSource;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Authenticated client for subreddit listings
pub struct RedditClient {
    http: Client,
    oauth: RedditOAuth,
    refresh_token: SecretString,
    access_token: Mutex<Option<SecretString>>,
    api_base: String,
}

impl RedditClient {
    pub fn new(http: Client, oauth: RedditOAuth, session: Session) -> Self {
        Self {
            http,
            oauth,
            refresh_token: session.refresh_token,
            access_token: Mutex::new(session.access_token),
            api_base: REDDIT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Cached access token, refreshed on first use
    async fn access_token(&self) -> Result<SecretString, RedditError> {
        let mut cached = self.access_token.lock().await;
        if let Some(ref token) = *cached {
            return Ok(token.clone());
        }

        let token = self.oauth.refresh_access_token(&self.refresh_token).await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// `/r/{subreddit}/new`, newest first
    pub async fn get_new_posts(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<PostData>, RedditError> {
        let token = self.access_token().await?;
        let url = format!("{}/r/{}/new", self.api_base, subreddit);
        let limit = limit.to_string();

        let response = self
            .http
            .get(&url)
            .bearer_auth(token.expose_secret())
            .query(&[("limit", limit.as_str()), ("raw_json", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RedditError::ListingFailed {
                subreddit: subreddit.to_string(),
                status: status.as_u16(),
            });
        }

        let listing: Listing<PostData> = response.json().await?;
        tracing::debug!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect())
    }
}

impl PostSource for RedditClient {
    async fn new_posts(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<CandidatePost>, RedditError> {
        let posts = self.get_new_posts(subreddit, limit).await?;
        Ok(posts.into_iter().map(CandidatePost::from).collect())
    }
}
