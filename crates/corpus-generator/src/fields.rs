//! Synthetic document metadata.
//!
//! Drawn from the item's `Fields` stream so the manifest values and the
//! header fields embedded in payloads (e.g. EML `From`/`Date`) agree.

use crate::seeder::{ItemSeeder, Stream};
use crate::words::{self, CUSTODIANS, DOMAINS};
use chrono::{DateTime, Utc};
use rand::Rng;

/// 2015-01-01T00:00:00Z
const DATE_RANGE_START: i64 = 1_420_070_400;
/// 2025-01-01T00:00:00Z
const DATE_RANGE_END: i64 = 1_735_689_600;
/// Up to 30 days between creation and sending.
const MAX_SEND_DELAY_SECS: i64 = 30 * 86_400;

/// Format used for dates in load files.
pub const MANIFEST_DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Per-item metadata shared by the manifest and the content generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentProfile {
    pub custodian: &'static str,
    pub author: String,
    pub author_email: String,
    pub recipient_email: String,
    pub subject: String,
    pub created: DateTime<Utc>,
    pub sent: DateTime<Utc>,
}

impl DocumentProfile {
    pub fn for_item(seeder: &ItemSeeder, index: u64) -> Self {
        let mut rng = seeder.rng_for(Stream::Fields, index);

        let custodian = words::pick(&mut rng, CUSTODIANS);
        let author = words::pick(&mut rng, CUSTODIANS).to_string();
        let domain = words::pick(&mut rng, DOMAINS);
        let author_email = email_for(&author, domain);
        let recipient = words::pick(&mut rng, CUSTODIANS);
        let recipient_email = email_for(recipient, words::pick(&mut rng, DOMAINS));
        let subject_len = rng.gen_range(3..=7);
        let subject = words::sentence(&mut rng, subject_len)
            .trim_end_matches('.')
            .to_string();

        let created_ts = rng.gen_range(DATE_RANGE_START..DATE_RANGE_END);
        let sent_ts = created_ts + rng.gen_range(0..MAX_SEND_DELAY_SECS);
        let created = DateTime::from_timestamp(created_ts, 0).unwrap_or_default();
        let sent = DateTime::from_timestamp(sent_ts, 0).unwrap_or(created);

        Self {
            custodian,
            author,
            author_email,
            recipient_email,
            subject,
            created,
            sent,
        }
    }

    pub fn created_string(&self) -> String {
        self.created.format(MANIFEST_DATE_FORMAT).to_string()
    }

    pub fn sent_string(&self) -> String {
        self.sent.format(MANIFEST_DATE_FORMAT).to_string()
    }
}

/// `"Chen, Riley"` -> `riley.chen@domain`
fn email_for(name: &str, domain: &str) -> String {
    let local = match name.split_once(", ") {
        Some((last, first)) => format!("{first}.{last}"),
        None => name.replace(' ', "."),
    };
    format!("{}@{domain}", local.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_is_deterministic() {
        let seeder = ItemSeeder::new(42);
        assert_eq!(
            DocumentProfile::for_item(&seeder, 3),
            DocumentProfile::for_item(&seeder, 3)
        );
    }

    #[test]
    fn test_dates_in_range_and_ordered() {
        let seeder = ItemSeeder::new(9);
        for index in 1..=200 {
            let profile = DocumentProfile::for_item(&seeder, index);
            assert!(profile.created.timestamp() >= DATE_RANGE_START);
            assert!(profile.created.timestamp() < DATE_RANGE_END);
            assert!(profile.sent >= profile.created);
        }
    }

    #[test]
    fn test_email_for() {
        assert_eq!(email_for("Chen, Riley", "example.com"), "riley.chen@example.com");
    }
}
