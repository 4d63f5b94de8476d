use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;
type Suffix = Arc<dyn Fn() -> String + Send + Sync>;

const SUFFIX_LEN: usize = 6;

/// Issues `order-<millis>-<suffix>` ids. The millis part strictly increases
/// within the process; the random suffix keeps ids apart across restarts.
/// An empty suffix drops the trailing `-<suffix>` part.
#[derive(Clone)]
pub struct OrderIdGenerator {
    last: Arc<AtomicI64>,
    clock: Clock,
    suffix: Suffix,
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::with_clock(|| chrono::Utc::now().timestamp_millis())
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        Self::with_sources(clock, random_suffix)
    }

    pub fn with_sources<F, S>(clock: F, suffix: S) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
        S: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            last: Arc::new(AtomicI64::new(0)),
            clock: Arc::new(clock),
            suffix: Arc::new(suffix),
        }
    }

    pub fn next_id(&self) -> String {
        let now = (self.clock)();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => {
                    let suffix = (self.suffix)();
                    if suffix.is_empty() {
                        return format!("order-{candidate}");
                    }
                    return format!("order-{candidate}-{suffix}");
                }
                Err(actual) => prev = actual,
            }
        }
    }
}
