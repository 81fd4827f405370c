//! Connection pool construction
//!
//! Maps the pool knobs onto sqlx:
//! - `size` connections stay open (`min_connections`)
//! - up to `size + max_overflow` under load; overflow connections close
//!   after [`OVERFLOW_IDLE_TIMEOUT`] idle
//! - `recycle` becomes the max connection lifetime
//! - `pre_ping` pings each connection before it is handed out
//! - `acquire_timeout` bounds the wait when every connection is busy

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::PoolSettings;

/// Idle connections above the base pool size are closed after this long
pub const OVERFLOW_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Pool options for `settings`
pub fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(settings.size)
        .max_connections(settings.size + settings.max_overflow)
        .idle_timeout(OVERFLOW_IDLE_TIMEOUT)
        .max_lifetime(settings.recycle)
        .test_before_acquire(settings.pre_ping)
        .acquire_timeout(settings.acquire_timeout)
}

/// Open a pool, establishing one connection up front to prove the database
/// is reachable.
pub async fn connect(
    settings: &PoolSettings,
    options: PgConnectOptions,
) -> Result<PgPool, sqlx::Error> {
    pool_options(settings).connect_with(options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_settings() {
        let options = pool_options(&PoolSettings::default());

        assert_eq!(options.get_min_connections(), 5);
        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(1800)));
        assert_eq!(options.get_idle_timeout(), Some(OVERFLOW_IDLE_TIMEOUT));
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(30));
        assert!(options.get_test_before_acquire());
    }

    #[test]
    fn pre_ping_can_be_disabled() {
        let settings = PoolSettings {
            pre_ping: false,
            max_overflow: 0,
            ..PoolSettings::default()
        };
        let options = pool_options(&settings);

        assert!(!options.get_test_before_acquire());
        assert_eq!(options.get_max_connections(), 5);
    }
}
