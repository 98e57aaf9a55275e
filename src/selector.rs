use crate::errors::RedditError;
use crate::models::CandidatePost;
use crate::traits::PostSource;
use chrono::{DateTime, Duration, Utc};

/// Posts requested per subreddit
pub const LISTING_LIMIT: u32 = 100;

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Whether the post links straight to an image file
pub fn is_image_url(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| url.ends_with(ext))
}

/// Tracks the best candidate seen so far inside a time window
#[derive(Debug)]
pub struct BestCandidate {
    cutoff: DateTime<Utc>,
    best: Option<CandidatePost>,
}

impl BestCandidate {
    pub fn new(now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            cutoff: now - window,
            best: None,
        }
    }

    pub fn qualifies(&self, post: &CandidatePost) -> bool {
        is_image_url(&post.url) && post.created >= self.cutoff
    }

    /// Keeps `post` if it qualifies and strictly beats the current best
    pub fn offer(&mut self, post: CandidatePost) {
        if !self.qualifies(&post) {
            return;
        }
        tracing::debug!("Found {} with score {}", post.url, post.score);

        let better = match self.best {
            Some(ref best) => post.score > best.score,
            None => true,
        };
        if better {
            self.best = Some(post);
        }
    }

    pub fn into_best(self) -> Option<CandidatePost> {
        self.best
    }
}

/// Highest-scoring image post from the last day across `subreddits`.
///
/// A subreddit whose listing fails is skipped. A failed access token
/// refresh ends the search, since every later listing would fail the same way.
pub async fn choose_best_image<S: PostSource>(
    source: &S,
    subreddits: &[String],
    now: DateTime<Utc>,
) -> Result<Option<CandidatePost>, RedditError> {
    let mut tracker = BestCandidate::new(now, Duration::days(1));

    for name in subreddits {
        tracing::info!("Checking subreddit: {}", name);
        match source.new_posts(name, LISTING_LIMIT).await {
            Ok(posts) => posts.into_iter().for_each(|post| tracker.offer(post)),
            Err(e @ RedditError::TokenRefresh(_)) => return Err(e),
            Err(e) => tracing::warn!("Skipping r/{}: {}", name, e),
        }
    }

    Ok(tracker.into_best())
}
