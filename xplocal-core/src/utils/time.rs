// File: xplocal-core/src/utils/time.rs

use chrono::{DateTime, Duration, Utc};

/// When a user who last completed the recurring task at `last_completion`
/// becomes eligible again.
pub fn next_eligible(last_completion: DateTime<Utc>, cooldown: Duration) -> DateTime<Utc> {
    last_completion + cooldown
}

/// Remaining cooldown as of `now`, or `None` once the window has elapsed.
pub fn cooldown_remaining(
    last_completion: DateTime<Utc>,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let end = next_eligible(last_completion, cooldown);
    if now < end {
        Some(end - now)
    } else {
        None
    }
}

/// "3h 12m 5s left" display helper used by countdown surfaces.
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    format!("{}h {}m {}s left", hours, mins, secs)
}
