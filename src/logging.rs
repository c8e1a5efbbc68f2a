//! Internal logging helpers for structured sieve events.

/// Single logging target for sieve.
pub(crate) const LOG_TARGET: &str = "sieve";

macro_rules! sieve_log {
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use sieve_log;
