use reddit_wallpaper::{
    AuthError, AuthState, Authenticator, BrowserLauncher, CredentialStore, ListenerSettings,
    LoginPath, TokenExchange, TokenGrant,
};
use secrecy::{ExposeSecret, SecretString};
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;
use url::Url;

/// Accepts exactly one code
struct FakeExchange {
    valid_code: &'static str,
    calls: AtomicUsize,
}

impl FakeExchange {
    fn accepting(valid_code: &'static str) -> Self {
        Self {
            valid_code,
            calls: AtomicUsize::new(0),
        }
    }
}

impl TokenExchange for FakeExchange {
    fn authorize_url(&self, state: &str) -> Result<Url, AuthError> {
        Ok(Url::parse_with_params(
            "https://www.reddit.com/api/v1/authorize",
            &[("client_id", "id"), ("state", state)],
        )
        .unwrap())
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if code == self.valid_code {
            Ok(TokenGrant {
                access_token: SecretString::new("access".to_string()),
                refresh_token: SecretString::new("refresh-from-exchange".to_string()),
            })
        } else {
            Err(AuthError::OAuthError {
                code: "invalid_grant".to_string(),
                description: None,
            })
        }
    }
}

/// Records launches and optionally plays the user approving in the browser
struct FakeBrowser {
    opened: Mutex<Vec<String>>,
    redirect_to: Option<SocketAddr>,
    code: &'static str,
}

impl FakeBrowser {
    fn idle() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            redirect_to: None,
            code: "",
        }
    }

    fn approving(listener: SocketAddr, code: &'static str) -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            redirect_to: Some(listener),
            code,
        }
    }

    fn launches(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

impl BrowserLauncher for FakeBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());

        if let Some(addr) = self.redirect_to {
            let state = Url::parse(url)
                .unwrap()
                .query_pairs()
                .find(|(k, _)| k == "state")
                .map(|(_, v)| v.into_owned())
                .unwrap();
            let callback = format!("http://{}/?state={}&code={}", addr, state, self.code);
            tokio::spawn(async move {
                let response = reqwest::get(&callback).await.unwrap();
                assert!(response.status().is_success());
            });
        }
        Ok(())
    }
}

fn free_loopback_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn listener_settings(addr: SocketAddr, attempts: u32) -> ListenerSettings {
    ListenerSettings {
        bind_addr: addr,
        attempts,
        interval: Duration::from_millis(100),
    }
}

fn write_config(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn test_stored_refresh_token_skips_browser_and_exchange() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    write_config(
        &path,
        "[AUTH]\ncode = \"old\"\n\n[REDDIT]\nrefresh_token = \"stored-refresh\"\n",
    );

    let store = CredentialStore::new(&path);
    let exchange = FakeExchange::accepting("old");
    let browser = FakeBrowser::idle();
    let mut auth = Authenticator::new(
        &store,
        &exchange,
        &browser,
        listener_settings(free_loopback_addr(), 1),
    );

    let session = auth.authenticate().await.unwrap();
    assert_eq!(session.path, LoginPath::StoredRefreshToken);
    assert_eq!(session.refresh_token.expose_secret(), "stored-refresh");
    assert!(session.access_token.is_none());
    assert_eq!(auth.state(), AuthState::Authenticated);
    assert_eq!(exchange.calls.load(Ordering::SeqCst), 0);
    assert_eq!(browser.launches(), 0);
}

#[tokio::test]
async fn test_valid_stored_code_saves_refresh_token() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    write_config(&path, "[AUTH]\ncode = \"good\"\n\n[SUBREDDITS]\nnames = \"wallpapers\"\n");

    let store = CredentialStore::new(&path);
    let exchange = FakeExchange::accepting("good");
    let browser = FakeBrowser::idle();
    let mut auth = Authenticator::new(
        &store,
        &exchange,
        &browser,
        listener_settings(free_loopback_addr(), 1),
    );

    let session = auth.authenticate().await.unwrap();
    assert_eq!(session.path, LoginPath::StoredCode);
    assert_eq!(browser.launches(), 0);
    assert_eq!(
        store.load_refresh_token().unwrap().unwrap().expose_secret(),
        "refresh-from-exchange"
    );
    // Unrelated sections survive the rewrite
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("wallpapers"));
}

#[tokio::test]
async fn test_invalid_stored_code_is_deleted_and_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    write_config(&path, "[AUTH]\ncode = \"stale\"\n");

    let store = CredentialStore::new(&path);
    let exchange = FakeExchange::accepting("fresh");
    let browser = FakeBrowser::idle();
    let mut auth = Authenticator::new(
        &store,
        &exchange,
        &browser,
        listener_settings(free_loopback_addr(), 1),
    );

    let err = auth.authenticate().await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidStoredCode { .. }));
    assert_eq!(auth.state(), AuthState::Failed);
    assert!(store.load_code().unwrap().is_none());
    assert_eq!(browser.launches(), 0);
}

#[tokio::test]
async fn test_browser_flow_persists_code_and_refresh_token() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    write_config(&path, "[REDDIT]\nclient_id = \"id\"\n");

    let addr = free_loopback_addr();
    let store = CredentialStore::new(&path);
    let exchange = FakeExchange::accepting("from-browser");
    let browser = FakeBrowser::approving(addr, "from-browser");
    let mut auth = Authenticator::new(&store, &exchange, &browser, listener_settings(addr, 50));

    let session = auth.authenticate().await.unwrap();
    assert_eq!(session.path, LoginPath::BrowserFlow);
    assert_eq!(browser.launches(), 1);
    assert_eq!(store.load_code().unwrap().as_deref(), Some("from-browser"));
    assert_eq!(
        store.load_refresh_token().unwrap().unwrap().expose_secret(),
        "refresh-from-exchange"
    );
}

#[tokio::test]
async fn test_browser_flow_times_out_without_callback() {
    let dir = tempdir().unwrap();
    let store = CredentialStore::new(dir.path().join("config.toml"));
    let exchange = FakeExchange::accepting("never");
    let browser = FakeBrowser::idle();
    let mut auth = Authenticator::new(
        &store,
        &exchange,
        &browser,
        listener_settings(free_loopback_addr(), 2),
    );

    let err = auth.authenticate().await.unwrap_err();
    assert!(matches!(err, AuthError::CallbackTimeout { attempts: 2 }));
    assert_eq!(browser.launches(), 1);
    assert_eq!(exchange.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_browser_flow_exchange_failure_leaves_no_code() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let addr = free_loopback_addr();
    let store = CredentialStore::new(&path);
    let exchange = FakeExchange::accepting("something-else");
    let browser = FakeBrowser::approving(addr, "rejected");
    let mut auth = Authenticator::new(&store, &exchange, &browser, listener_settings(addr, 50));

    let err = auth.authenticate().await.unwrap_err();
    assert!(matches!(err, AuthError::CodeExchangeFailed { .. }));
    assert!(store.load_code().unwrap().is_none());
    assert!(store.load_refresh_token().unwrap().is_none());
}
