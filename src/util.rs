use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer};

/// Milliseconds since the Unix epoch. A clock before 1970 reads as 0.
pub fn now_ms() -> u64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(elapsed).unwrap_or(u64::MAX)
}

/// Civil `(year, month, day)` for a day count since the epoch.
/// Algorithm from Howard Hinnant's `civil_from_days`.
#[allow(clippy::unreadable_literal, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn civil_from_days(days: i64) -> (i64, u64, u64) {
    let z = days + 719468;
    let era = (if z >= 0 { z } else { z - 146096 }) / 146097;
    let doe = (z - era * 146097) as u64; // day of era [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = (yoe as i64) + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Format epoch seconds as `YYYY-MM-DD` (UTC).
#[allow(clippy::cast_possible_wrap)]
pub fn date_from_epoch(epoch_secs: u64) -> String {
    let (y, m, d) = civil_from_days((epoch_secs / 86400) as i64);
    format!("{y:04}-{m:02}-{d:02}")
}

/// Format epoch milliseconds as an ISO-8601 UTC timestamp, e.g.
/// `2025-02-24T13:05:09.120Z`.
#[allow(clippy::cast_possible_wrap)]
pub fn iso8601_from_ms(epoch_ms: u64) -> String {
    let secs = epoch_ms / 1000;
    let (y, m, d) = civil_from_days((secs / 86400) as i64);
    let sod = secs % 86400;
    format!(
        "{y:04}-{m:02}-{d:02}T{:02}:{:02}:{:02}.{:03}Z",
        sod / 3600,
        (sod % 3600) / 60,
        sod % 60,
        epoch_ms % 1000
    )
}

/// Deserialize an id that callers send either as a JSON number or as a
/// numeric string (`3` or `"3"`).
pub fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(u32),
        Str(String),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse::<u32>().map_err(serde::de::Error::custom),
    }
}
