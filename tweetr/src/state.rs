//! The records the subsystems hand to each other, persisted as JSON in the configuration directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::util::{parse_relative_time, TWEET_DATETIME_FORMAT};
use crate::Outcome;

/// A JSON document living at a fixed name in the configuration directory.
pub trait StateFile: Serialize + DeserializeOwned {
    const FILE_NAME: &'static str;
    /// Human name, used in error messages.
    const DESC: &'static str;
    /// The subsystem that produces this file.
    const PRODUCER: &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppTokens {
    pub key: String,
    pub secret: String,
}

impl AppTokens {
    pub const KEY_LEN: usize = 25;
    pub const SECRET_LEN: usize = 50;
}

impl StateFile for AppTokens {
    const FILE_NAME: &'static str = "app.json";
    const DESC: &'static str = "app configuration";
    const PRODUCER: &'static str = "init";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub access_key: String,
    pub access_secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Users {
    pub users: Vec<User>,
}

impl Users {
    /// Look a user up by screen name (case-insensitive) or numeric id.
    pub fn find(&self, name_or_id: &str) -> Option<&User> {
        let name_or_id = name_or_id.trim();
        let id = name_or_id.parse::<u64>().ok();
        self.users
            .iter()
            .find(|u| Some(u.id) == id || u.name.eq_ignore_ascii_case(name_or_id))
    }

    pub fn by_id(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Insert `user`, replacing any previous entry with the same id.
    pub fn upsert(&mut self, user: User) {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
    }
}

impl StateFile for Users {
    const FILE_NAME: &'static str = "users.json";
    const DESC: &'static str = "users file";
    const PRODUCER: &'static str = "add-user";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedTweet {
    pub id: u64,
    pub posted_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTweet {
    /// Id of the posting [`User`].
    pub author: u64,
    pub content: String,
    pub time: DateTime<FixedOffset>,
    #[serde(default)]
    pub result: Option<PostedTweet>,
}

impl QueuedTweet {
    pub fn is_pending(&self) -> bool {
        self.result.is_none()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && self.time <= now
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tweets {
    pub tweets: Vec<QueuedTweet>,
}

impl Tweets {
    pub fn pending(&self) -> impl Iterator<Item = &QueuedTweet> {
        self.tweets.iter().filter(|t| t.is_pending())
    }
}

impl StateFile for Tweets {
    const FILE_NAME: &'static str = "tweets.json";
    const DESC: &'static str = "tweets file";
    const PRODUCER: &'static str = "queue-tweets";
}

pub fn path<T: StateFile>(config_dir: &Path) -> PathBuf {
    config_dir.join(T::FILE_NAME)
}

/// Load `T`, or `None` if its file does not exist yet.
pub fn load<T: StateFile>(config_dir: &Path) -> Result<Option<T>, Outcome> {
    let path = path::<T>(config_dir);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Outcome::io(format!("reading {}", T::DESC), e)),
    };
    debug!(path = %path.display(), "loaded {}", T::DESC);
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| Outcome::FileParsingFailed {
            desc: T::DESC,
            errors: vec![e.to_string()],
        })
}

/// Load `T`, pointing at its producing subsystem if the file is missing.
pub fn load_required<T: StateFile>(config_dir: &Path) -> Result<T, Outcome> {
    load::<T>(config_dir)?.ok_or_else(|| Outcome::RequiredFileFromSubsystemNonexistant {
        subsys: T::PRODUCER,
        fname: path::<T>(config_dir).display().to_string(),
    })
}

/// Replace the file for `T` with `value`.
///
/// Writes a sibling temp file first so a crash never leaves a half-written document behind.
pub fn save<T: StateFile>(config_dir: &Path, value: &T) -> Result<(), Outcome> {
    let path = path::<T>(config_dir);
    let tmp = path.with_extension("json.tmp");
    let raw = serde_json::to_string_pretty(value).map_err(|e| Outcome::Io {
        desc: format!("serializing {}", T::DESC),
        error: e.to_string(),
    })?;
    std::fs::create_dir_all(config_dir)
        .and_then(|()| std::fs::write(&tmp, raw + "\n"))
        .and_then(|()| std::fs::rename(&tmp, &path))
        .map_err(|e| Outcome::io(format!("writing {}", T::DESC), e))?;
    debug!(path = %path.display(), "saved {}", T::DESC);
    Ok(())
}

/// Parse when a tweet should go out: a relative time from `now`, RFC 3339 or [`TWEET_DATETIME_FORMAT`].
pub fn parse_tweet_time(s: &str, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(delta) = parse_relative_time(s) {
        let delta = chrono::Duration::from_std(delta).ok()?;
        return now.checked_add_signed(delta).map(|t| t.fixed_offset());
    }
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, TWEET_DATETIME_FORMAT))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, name: &str) -> User {
        User {
            id,
            name: name.to_owned(),
            access_key: format!("key-{id}"),
            access_secret: format!("secret-{id}"),
        }
    }

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn users_find_by_name_or_id() {
        let users = Users {
            users: vec![user(1, "Alice"), user(22, "bob")],
        };
        assert_eq!(users.find("alice").map(|u| u.id), Some(1));
        assert_eq!(users.find(" BOB ").map(|u| u.id), Some(22));
        assert_eq!(users.find("22").map(|u| u.id), Some(22));
        assert!(users.find("carol").is_none());
        assert!(users.find("").is_none());
        assert_eq!(users.by_id(1).map(|u| u.name.as_str()), Some("Alice"));
    }

    #[test]
    fn users_upsert_replaces_same_id() {
        let mut users = Users::default();
        users.upsert(user(1, "alice"));
        users.upsert(user(2, "bob"));
        users.upsert(user(1, "alice_renamed"));
        assert_eq!(users.users.len(), 2);
        assert_eq!(users.users[0].name, "alice_renamed");
    }

    #[test]
    fn due_and_pending() {
        let now = at("2016-09-05T20:30:51+00:00").with_timezone(&Utc);
        let mut tweet = QueuedTweet {
            author: 1,
            content: "hi".to_owned(),
            time: at("2016-09-05T22:30:51+02:00"),
            result: None,
        };
        assert!(tweet.is_due(now));
        tweet.time = at("2016-09-05T22:30:52+02:00");
        assert!(!tweet.is_due(now));
        assert!(tweet.is_pending());
        tweet.time = at("2016-09-05T20:00:00+00:00");
        tweet.result = Some(PostedTweet {
            id: 7,
            posted_at: at("2016-09-05T20:00:01+00:00"),
        });
        assert!(!tweet.is_due(now));
        assert!(!tweet.is_pending());
    }

    #[test]
    fn tweet_time_forms() {
        let now = at("2016-09-05T20:30:51+00:00").with_timezone(&Utc);
        assert_eq!(parse_tweet_time("now", now), Some(at("2016-09-05T20:30:51+00:00")));
        assert_eq!(
            parse_tweet_time("in 2 hours", now),
            Some(at("2016-09-05T22:30:51+00:00"))
        );
        assert_eq!(
            parse_tweet_time("2017-01-01T00:00:00+01:00", now),
            Some(at("2017-01-01T00:00:00+01:00"))
        );
        assert_eq!(
            parse_tweet_time("Mon Sep 05 20:30:51 +0000 2016", now),
            Some(at("2016-09-05T20:30:51+00:00"))
        );
        assert_eq!(parse_tweet_time("tomorrow", now), None);
    }

    #[test]
    fn load_missing_and_required() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load::<Users>(dir.path()), Ok(None));
        match load_required::<Tweets>(dir.path()) {
            Err(Outcome::RequiredFileFromSubsystemNonexistant { subsys, fname }) => {
                assert_eq!(subsys, "queue-tweets");
                assert!(fname.ends_with("tweets.json"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn load_garbage_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.json"), "{ not json").unwrap();
        match load::<AppTokens>(dir.path()) {
            Err(Outcome::FileParsingFailed { desc, errors }) => {
                assert_eq!(desc, "app configuration");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let tweets = Tweets {
            tweets: vec![QueuedTweet {
                author: 3,
                content: "multi\nline".to_owned(),
                time: at("2020-02-02T02:02:02-05:00"),
                result: None,
            }],
        };
        save(dir.path(), &tweets).unwrap();
        assert!(!dir.path().join("tweets.json.tmp").exists());
        assert_eq!(load::<Tweets>(dir.path()), Ok(Some(tweets)));
    }
}
