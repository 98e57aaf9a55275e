//! Authentication module for reddit-wallpaper
//!
//! This module provides the OAuth authorization-code flow: the loopback
//! callback listener, the Reddit token endpoint client, and the
//! authenticator that decides which stored credential to use.

mod authenticator;
mod callback;
mod oauth;

pub use authenticator::{AuthState, Authenticator, ListenerSettings, LoginPath, Session};
pub use callback::{AUTHORIZATION_COMPLETE_PAGE, CallbackListener};
pub use oauth::{RedditOAuth, SCOPES};
