use std::io::{BufRead, Write};
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::state::{self, parse_tweet_time, QueuedTweet, StateFile, Tweets, Users};
use crate::util::{prompt_any_len, prompt_multiline, prompt_nonzero_len};
use crate::Outcome;

use super::{input_failed, output_failed};

/// Longest tweet content, in characters.
pub const MAX_TWEET_LEN: usize = 280;

const TIME_PROMPT: &str = "Time to post the tweet (RFC3339, \"now\" or \"in N unit\")";

/// Interactively append tweets to the queue until an empty author is entered.
///
/// Tweets completed before a prompt fails are still written out.
pub fn queue_tweets<R, W>(config_dir: &Path, input: &mut R, output: &mut W) -> Result<(), Outcome>
where
    R: BufRead,
    W: Write,
{
    let users = state::load_required::<Users>(config_dir)?;
    if users.users.is_empty() {
        return Err(Outcome::RequiredDataFromSubsystemNonexistant {
            subsys: Users::PRODUCER,
            desc: "add at least one user".to_owned(),
        });
    }
    let mut tweets = state::load::<Tweets>(config_dir)?.unwrap_or_default();
    let before = tweets.tweets.len();

    let res = prompt_tweets(&users, &mut tweets, input, output);
    if let Err(outcome) = &res {
        warn!(kept = tweets.tweets.len() - before, "tweet entry interrupted: {outcome:?}");
    }

    state::save(config_dir, &tweets)?;
    info!(
        queued = tweets.tweets.len() - before,
        total = tweets.tweets.len(),
        "tweet queue written"
    );
    res
}

fn prompt_tweets<R, W>(
    users: &Users,
    tweets: &mut Tweets,
    input: &mut R,
    output: &mut W,
) -> Result<(), Outcome>
where
    R: BufRead,
    W: Write,
{
    while let Some(author) =
        prompt_any_len(input, output, "Author (name or id)", |s| users.find(s).is_some())
            .map_err(input_failed)?
    {
        let Some(author) = users.find(&author) else {
            continue;
        };

        let content = prompt_multiline(input, output, "Tweet content", |s| {
            (1..=MAX_TWEET_LEN).contains(&s.chars().count())
        })
        .map_err(input_failed)?;

        let time = loop {
            let answer =
                prompt_nonzero_len(input, output, TIME_PROMPT, |_| true).map_err(input_failed)?;
            match parse_tweet_time(&answer, Utc::now()) {
                Some(time) => break time,
                None => writeln!(output, "Unrecognised time {answer:?}.").map_err(output_failed)?,
            }
        };

        debug!(author = author.id, %time, "queued tweet");
        tweets.tweets.push(QueuedTweet {
            author: author.id,
            content,
            time,
            result: None,
        });
    }
    Ok(())
}
