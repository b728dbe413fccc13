//! Queue tweets from the command line and have a daemon post them when they come due.
//!
//! # Usage
//!
//! The work is split into subsystems that run one after the other, each
//! producing a JSON file in the configuration directory for the next:
//!
//! 1. [`ops::init`] asks for the app key and secret.
//! 2. [`ops::add_user`] authorizes a user through a [`Backend`] with a PIN.
//! 3. [`ops::queue_tweets`] schedules tweets for the authorized users.
//! 4. [`ops::start_daemon`] posts every tweet once its time has come.
//!
//! Running a subsystem before its prerequisites yields an [`Outcome`] naming
//! the subsystem to run first; [`Outcome::exit_value`] turns it into a process exit code.
//!
//! ## Example
//!
//! ```rust
//! # use std::io::Cursor;
//! # use std::sync::Arc;
//! # use tweetr::{ops, OutboxBackend};
//! #[tokio::main]
//! async fn main() {
//!     let dir = tempfile::tempdir().unwrap();
//!     let backend = Arc::new(OutboxBackend::new(dir.path()));
//!     let keys = format!("{}\n{}\n", "k".repeat(25), "s".repeat(50));
//!
//!     ops::init(dir.path(), false, &mut Cursor::new(keys), &mut Vec::new()).unwrap();
//!     ops::add_user(dir.path(), backend.as_ref(), &mut Cursor::new("1234\n"), &mut Vec::new())
//!         .unwrap();
//!     ops::queue_tweets(dir.path(), &mut Cursor::new("outbox-1234\nhello\nnow\n\n"), &mut Vec::new())
//!         .unwrap();
//!     ops::start_daemon(
//!         dir.path(),
//!         backend,
//!         std::time::Duration::from_secs(1),
//!         tokio_util::sync::CancellationToken::new(),
//!     )
//!     .await
//!     .unwrap();
//! }
//! ```

pub mod backend;
pub mod metrics;
pub mod ops;
pub mod state;
pub mod util;

mod outcome;

pub use backend::{Backend, BackendError, OutboxBackend};
pub use outcome::Outcome;
