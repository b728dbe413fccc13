use std::sync::atomic::{AtomicU64, Ordering};

#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub tweets_posted: u64,
    pub post_failures: u64,
    pub daemon_passes: u64,
}

pub(crate) struct MetricsStorage {
    pub(crate) tweets_posted: AtomicU64,
    pub(crate) post_failures: AtomicU64,
    pub(crate) daemon_passes: AtomicU64,
}

impl MetricsStorage {
    pub(crate) const fn new_const() -> Self {
        MetricsStorage {
            tweets_posted: AtomicU64::new(0),
            post_failures: AtomicU64::new(0),
            daemon_passes: AtomicU64::new(0),
        }
    }

    fn make_pub(&self) -> Metrics {
        Metrics {
            tweets_posted: self.tweets_posted.load(Ordering::Relaxed),
            post_failures: self.post_failures.load(Ordering::Relaxed),
            daemon_passes: self.daemon_passes.load(Ordering::Relaxed),
        }
    }
}

pub(crate) static GLOBAL_STORAGE: MetricsStorage = MetricsStorage::new_const();

pub fn global() -> Metrics {
    GLOBAL_STORAGE.make_pub()
}
