use chrono::{DateTime, Utc};

use crate::domain::DigestFrequency;

/// Whether a digest-mode author is due for an automatic send.
///
/// A never-sent author is always due. Otherwise the elapsed time since
/// the last send must meet the frequency threshold. The frequency is
/// read back from storage as a raw string; anything unparsable means
/// never due.
pub fn is_due(frequency: &str, last_sent_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    let Some(last_sent_at) = last_sent_at else {
        return true;
    };

    match frequency.parse::<DigestFrequency>() {
        Ok(frequency) => now - last_sent_at >= frequency.threshold(),
        Err(_) => false,
    }
}
