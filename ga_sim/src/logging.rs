//! Structured logging configuration.
//!
//! Engine records emitted through the `log` facade are forwarded into the
//! same subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the RUST_LOG env var and default to `info`.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Structured logging initialized");
}

/// Log the outcome of one simulated lobby
///
/// # Arguments
///
/// * `kind` - Game the lobby played
/// * `winners` - Number of winners
/// * `pool` - Coins the lobby paid out or refunded
/// * `duration_ms` - Wall time from creation to settlement
pub fn log_lobby_outcome(kind: &str, winners: usize, pool: u64, duration_ms: u64) {
    if duration_ms > 1000 {
        tracing::warn!(
            kind = kind,
            winners = winners,
            pool = pool,
            duration_ms = duration_ms,
            "Slow lobby"
        );
    } else {
        tracing::info!(
            kind = kind,
            winners = winners,
            pool = pool,
            duration_ms = duration_ms,
            "Lobby settled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_lobby_outcome() {
        // Just ensure it doesn't panic without a subscriber
        log_lobby_outcome("dice", 1, 200, 5);
        log_lobby_outcome("bunker", 0, 0, 2_000);
    }
}
