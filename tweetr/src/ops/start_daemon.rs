use std::path::Path;
use std::sync::{atomic::Ordering, Arc};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::backend::Backend;
use crate::metrics::GLOBAL_STORAGE;
use crate::state::{self, AppTokens, StateFile, Tweets, Users};
use crate::util::span_r;
use crate::Outcome;

/// Post queued tweets as they come due.
///
/// Every pass posts all due tweets in queue order, persisting each result as soon as it's known,
/// then sleeps for `delay`. Returns once nothing is pending or `stop` is cancelled.
#[tracing::instrument(skip_all, fields(config_dir = %config_dir.display()))]
pub async fn start_daemon(
    config_dir: &Path,
    backend: Arc<dyn Backend>,
    delay: Duration,
    stop: CancellationToken,
) -> Result<(), Outcome> {
    info!("daemon starting");
    scopeguard::defer_on_success! {info!("daemon exiting")};
    scopeguard::defer_on_unwind! {error!("daemon panicked")};

    let app = Arc::new(state::load_required::<AppTokens>(config_dir)?);
    let users = state::load_required::<Users>(config_dir)?;
    let mut tweets = state::load_required::<Tweets>(config_dir)?;

    if let Some(orphan) = tweets.pending().find(|t| users.by_id(t.author).is_none()) {
        return Err(Outcome::RequiredDataFromSubsystemNonexistant {
            subsys: Users::PRODUCER,
            desc: format!("add user with ID {}", orphan.author),
        });
    }

    loop {
        GLOBAL_STORAGE.daemon_passes.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();

        for idx in 0..tweets.tweets.len() {
            let tweet = &tweets.tweets[idx];
            if !tweet.is_due(now) {
                continue;
            }
            let user = users
                .by_id(tweet.author)
                .cloned()
                .ok_or_else(|| Outcome::RequiredDataFromSubsystemNonexistant {
                    subsys: Users::PRODUCER,
                    desc: format!("add user with ID {}", tweet.author),
                })?;
            let content = tweet.content.clone();

            let res = match tokio::task::spawn_blocking({
                let app = Arc::clone(&app);
                let backend = Arc::clone(&backend);
                move || span_r(|| backend.post_tweet(&app, &user, &content))
            })
            .await
            {
                Ok((took, Ok(posted))) => {
                    debug!(took_ms = took.num_milliseconds(), "backend call finished");
                    Ok(posted)
                }
                Ok((_, Err(e))) => Err(Outcome::from(e)),
                Err(e) => Err(Outcome::TwitterAPIError(format!("posting task failed: {e}"))),
            };

            match res {
                Ok(posted) => {
                    info!(
                        id = posted.id,
                        author = tweets.tweets[idx].author,
                        "posted tweet"
                    );
                    tweets.tweets[idx].result = Some(posted);
                    GLOBAL_STORAGE.tweets_posted.fetch_add(1, Ordering::Relaxed);
                    state::save(config_dir, &tweets)?;
                }
                Err(outcome) => {
                    GLOBAL_STORAGE.post_failures.fetch_add(1, Ordering::Relaxed);
                    error!(author = tweets.tweets[idx].author, "posting failed: {outcome:?}");
                    state::save(config_dir, &tweets)?;
                    return Err(outcome);
                }
            }
        }

        let pending = tweets.pending().count();
        if pending == 0 {
            info!("no tweets left to post");
            return Ok(());
        }
        debug!(pending, ?delay, "sleeping until next pass");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop.cancelled() => {
                info!(pending, "stop requested");
                return Ok(());
            }
        }
    }
}
