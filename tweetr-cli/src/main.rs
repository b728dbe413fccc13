use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tweetr::{ops, Outcome, OutboxBackend};

#[derive(clap::Parser, Debug)]
#[clap(name = "tweetr", version, about = "Queue tweets and post them when they come due")]
struct Args {
    /// Directory holding app.json, users.json and tweets.json.
    #[clap(short, long, default_value = ".")]
    config_dir: PathBuf,
    /// Override files that already exist.
    #[clap(short, long)]
    force: bool,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[clap(short, long)]
    verbose: bool,
    #[clap(subcommand)]
    subsystem: Subsystem,
}

#[derive(Clone, Copy, Debug, clap::Subcommand)]
enum Subsystem {
    /// Set up the app key and secret.
    Init,
    /// Authorize a user with a PIN.
    AddUser,
    /// Add tweets to the queue.
    QueueTweets,
    /// Post queued tweets as they come due.
    StartDaemon {
        /// How long to sleep between passes over the queue, e.g. "30s" or "5m".
        #[clap(long, default_value = "1m", value_parser = parse_delay)]
        delay: Duration,
    },
}

fn parse_delay(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s).map_err(|e| format!("invalid duration: {e}: {s:?}"))
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_env_filter({
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if args.verbose { "debug" } else { "info" })
            })
        })
        .init();

    let outcome = match run(&args) {
        Ok(()) => Outcome::NoError,
        Err(outcome) => outcome,
    };
    if outcome != Outcome::NoError {
        debug!(exit_value = outcome.exit_value(), "{:?}", outcome);
        // nothing sensible left to do if stderr is gone
        let _ = outcome.print_error(&mut std::io::stderr());
    }
    std::process::exit(outcome.exit_value());
}

fn run(args: &Args) -> Result<(), Outcome> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    let config_dir = args.config_dir.as_path();

    match args.subsystem {
        Subsystem::Init => ops::init(config_dir, args.force, &mut input, &mut output),
        Subsystem::AddUser => {
            let backend = OutboxBackend::new(config_dir);
            ops::add_user(config_dir, &backend, &mut input, &mut output)
        }
        Subsystem::QueueTweets => ops::queue_tweets(config_dir, &mut input, &mut output),
        Subsystem::StartDaemon { delay } => {
            let stop = CancellationToken::new();
            ctrlc::set_handler({
                let stop = stop.clone();
                move || {
                    if stop.is_cancelled() {
                        error!("stop already requested, aborting");
                        std::process::abort();
                    } else {
                        info!("ctrl-c, finishing current pass");
                        stop.cancel();
                    }
                }
            })
            .expect("install ctrl-c handler");

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("build tokio runtime");
            let backend = Arc::new(OutboxBackend::new(config_dir));
            rt.block_on(ops::start_daemon(config_dir, backend, delay, stop))
        }
    }
}
