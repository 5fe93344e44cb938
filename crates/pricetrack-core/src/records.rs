use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed price for a product, stamped with when it was seen.
///
/// Only produced when extraction found a price; a missing price never
/// becomes a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Whole currency units as displayed by the site, separators removed.
    pub price: u64,
    pub observed_at: DateTime<Utc>,
}

impl PriceRecord {
    #[must_use]
    pub fn new(price: u64, observed_at: DateTime<Utc>) -> Self {
        Self { price, observed_at }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn serializes_with_rfc3339_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let record = PriceRecord::new(1234, at);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "price": 1234, "observed_at": "2024-03-01T12:30:00Z" })
        );
    }
}
