use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::sync::Arc;
use std::time::Duration;

use crate::rate_limit::RateLimiter;
use crate::store::Store;

/// Login attempts older than this no longer count against anyone.
const RATE_LIMIT_MAX_AGE: Duration = Duration::from_secs(15 * 60);

pub struct BackgroundTasks;

#[rocket::async_trait]
impl Fairing for BackgroundTasks {
    fn info(&self) -> Info {
        Info {
            name: "Background Tasks",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let store = match rocket.state::<Arc<dyn Store>>() {
            Some(s) => Arc::clone(s),
            None => {
                log::error!("[task] Store not in managed state, background tasks disabled");
                return;
            }
        };
        let limiter = rocket.state::<Arc<RateLimiter>>().cloned();

        // Expired sessions and stale login buckets
        tokio::spawn(async move {
            loop {
                let interval = get_interval(&*store, "task_session_cleanup_interval", 30);
                tokio::time::sleep(Duration::from_secs(interval * 60)).await;
                match crate::auth::cleanup_expired_sessions(&*store) {
                    Ok(count) => {
                        if count > 0 {
                            log::info!("[task] Cleaned up {} expired sessions", count);
                        }
                    }
                    Err(e) => log::error!("[task] Session cleanup failed: {}", e),
                }
                if let Some(ref limiter) = limiter {
                    limiter.cleanup(RATE_LIMIT_MAX_AGE);
                }
            }
        });

        log::info!("[task] Background tasks started");
    }
}

fn get_interval(store: &dyn Store, key: &str, default: u64) -> u64 {
    store
        .setting_get_or(key, &default.to_string())
        .parse::<u64>()
        .unwrap_or(default)
        .max(1)
}
