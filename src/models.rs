use chrono::{DateTime, TimeZone, Utc};
use secrecy::SecretString;
use serde::Deserialize;

// Custom deserialization for Option<SecretString>
pub fn deserialize_secret_option<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.map(SecretString::new))
}

/// Body of a successful `/api/v1/access_token` call
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// OAuth error body; Reddit returns these with 200 as well as 4xx
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

/// Tokens granted for an authorization code
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

// --- Reddit listing models ---
#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData<T> {
    pub children: Vec<ListingChild<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingChild<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostData {
    pub url: String,
    pub score: i64,
    pub created_utc: f64,
}

/// A post considered for the wallpaper
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePost {
    pub url: String,
    pub score: i64,
    pub created: DateTime<Utc>,
}

impl From<PostData> for CandidatePost {
    fn from(post: PostData) -> Self {
        // Fractional seconds are always .0 in listings
        let created = Utc
            .timestamp_opt(post.created_utc as i64, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self {
            url: post.url,
            score: post.score,
            created,
        }
    }
}
