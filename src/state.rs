use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::db::SubmissionStore;
use crate::email::Notifier;
use crate::rate_limit::SubmissionRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SubmissionStore>,
    pub notifier: Option<Notifier>,
    pub submission_limiter: SubmissionRateLimiter,
    /// Set once the startup mail self-test succeeds.
    pub mail_ready: AtomicBool,
}

impl AppState {
    pub fn mail_ready(&self) -> bool {
        self.mail_ready.load(Ordering::Relaxed)
    }
}
