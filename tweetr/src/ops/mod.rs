//! The subsystems, one per command-line verb.
//!
//! Each subsystem produces one state file for the next:
//! [`init`] writes the app tokens, [`add_user`] authorizes users against them,
//! [`queue_tweets`] schedules tweets for those users and [`start_daemon`] posts them.

use std::io;

use crate::Outcome;

mod add_user;
mod init;
mod queue_tweets;
mod start_daemon;


pub use add_user::add_user;
pub use init::init;
pub use queue_tweets::{queue_tweets, MAX_TWEET_LEN};
pub use start_daemon::start_daemon;

fn input_failed(e: io::Error) -> Outcome {
    Outcome::io("reading input", e)
}

fn output_failed(e: io::Error) -> Outcome {
    Outcome::io("writing output", e)
}
