//! The seam between the subsystems and the social network.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::state::{AppTokens, PostedTweet, User};
use crate::util::TWEET_DATETIME_FORMAT;

pub const OUTBOX_FILE: &str = "outbox.jsonl";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid PIN {0:?}")]
    InvalidPin(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Temporary OAuth credentials handed out before the user authorizes the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub key: String,
    pub secret: String,
}

/// A social network the subsystems can authorize users against and post to.
///
/// Calls block; the daemon drives them from the blocking pool.
pub trait Backend: Send + Sync {
    fn request_token(&self, app: &AppTokens) -> Result<RequestToken, BackendError>;
    fn authorize_url(&self, token: &RequestToken) -> String;
    /// Exchange the PIN the user got from [`Backend::authorize_url`] for their credentials.
    fn access_token(
        &self,
        app: &AppTokens,
        token: &RequestToken,
        pin: &str,
    ) -> Result<User, BackendError>;
    fn post_tweet(
        &self,
        app: &AppTokens,
        user: &User,
        content: &str,
    ) -> Result<PostedTweet, BackendError>;
}

/// A [`Backend`] that never leaves the machine.
///
/// Authorization trusts the PIN as the user id, and every post is appended
/// as one JSON line to [`OUTBOX_FILE`] in the configuration directory.
pub struct OutboxBackend {
    outbox: PathBuf,
    append: Mutex<()>,
}

#[derive(serde::Serialize)]
struct OutboxEntry<'a> {
    id: u64,
    author_id: u64,
    author: &'a str,
    content: &'a str,
    created_at: String,
}

impl OutboxBackend {
    pub fn new(config_dir: &Path) -> Self {
        OutboxBackend {
            outbox: config_dir.join(OUTBOX_FILE),
            append: Mutex::new(()),
        }
    }

    fn posted_so_far(&self) -> Result<u64, BackendError> {
        match std::fs::read_to_string(&self.outbox) {
            Ok(raw) => Ok(raw.lines().filter(|l| !l.trim().is_empty()).count() as u64),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl Backend for OutboxBackend {
    fn request_token(&self, app: &AppTokens) -> Result<RequestToken, BackendError> {
        Ok(RequestToken {
            key: format!("outbox-{}", app.key),
            secret: app.secret.clone(),
        })
    }

    fn authorize_url(&self, token: &RequestToken) -> String {
        format!(
            "https://api.twitter.com/oauth/authorize?oauth_token={}",
            token.key
        )
    }

    fn access_token(
        &self,
        _app: &AppTokens,
        token: &RequestToken,
        pin: &str,
    ) -> Result<User, BackendError> {
        let pin = pin.trim();
        if pin.is_empty() || !pin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BackendError::InvalidPin(pin.to_owned()));
        }
        let id = pin
            .parse::<u64>()
            .map_err(|_| BackendError::InvalidPin(pin.to_owned()))?;
        Ok(User {
            id,
            name: format!("outbox-{pin}"),
            access_key: format!("{}-{pin}", token.key),
            access_secret: token.secret.clone(),
        })
    }

    fn post_tweet(
        &self,
        _app: &AppTokens,
        user: &User,
        content: &str,
    ) -> Result<PostedTweet, BackendError> {
        let _guard = self
            .append
            .lock()
            .map_err(|_| BackendError::Rejected("outbox lock poisoned".to_owned()))?;

        let id = self.posted_so_far()? + 1;
        let created_at = Utc::now().format(TWEET_DATETIME_FORMAT).to_string();
        let entry = OutboxEntry {
            id,
            author_id: user.id,
            author: &user.name,
            content,
            created_at,
        };
        let line =
            serde_json::to_string(&entry).map_err(|e| BackendError::Malformed(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outbox)?;
        writeln!(file, "{line}")?;
        debug!(outbox = %self.outbox.display(), id, "appended to outbox");

        // read the timestamp back the way a timeline response would be parsed
        let posted_at = DateTime::parse_from_str(&entry.created_at, TWEET_DATETIME_FORMAT)
            .map_err(|e| BackendError::Malformed(format!("{:?}: {e}", entry.created_at)))?;
        info!("{}#{} posted tweet {id}", user.name, user.id);
        Ok(PostedTweet { id, posted_at })
    }
}
