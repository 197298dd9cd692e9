use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire and storage format for expiry dates.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Expiry date of an API key, rendered as `dd-mm-yyyy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Expiry(NaiveDate);

impl Expiry {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The instant the key stops being valid: midnight at the start of the
    /// expiry day.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.0.and_time(NaiveTime::MIN)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExpiryError {
    #[error(transparent)]
    Parse(#[from] chrono::ParseError),
    #[error("year must have exactly four digits")]
    Year,
}

impl FromStr for Expiry {
    type Err = ExpiryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)?;
        // chrono's %Y also takes short years ("99" becomes 0099).
        let year = s.rsplit('-').next().unwrap_or_default();
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ExpiryError::Year);
        }
        Ok(Self(date))
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    #[serde(rename = "apikey")]
    pub key: String,
    #[serde(rename = "limitup")]
    pub quota: u64,
    #[serde(rename = "expired")]
    pub expiry: Expiry,
}

impl ApiKeyRecord {
    /// Returns true once `now` is past midnight of the expiry day.
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expiry.starts_at() < now
    }

    /// Consume check: quota only, expiry is ignored.
    pub fn has_quota(&self) -> bool {
        self.quota > 0
    }

    /// Gated-read check: unexpired and quota left.
    pub fn is_valid_for_gating(&self, now: NaiveDateTime) -> bool {
        !self.is_expired(now) && self.has_quota()
    }

    pub fn status(&self, now: NaiveDateTime) -> KeyStatus {
        if self.is_expired(now) {
            KeyStatus::Expired
        } else {
            KeyStatus::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Active,
    Expired,
}

impl KeyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            KeyStatus::Active => "active apikey",
            KeyStatus::Expired => "expired apikey",
        }
    }
}

/// The single shared update served to holders of a valid key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(rename = "pesan")]
    pub message: String,
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%d-%m-%Y %H:%M:%S").unwrap()
    }

    fn make_record(quota: u64, expiry: &str) -> ApiKeyRecord {
        ApiKeyRecord {
            key: "abc123".into(),
            quota,
            expiry: expiry.parse().unwrap(),
        }
    }

    #[test]
    fn expiry_parses_day_month_year() {
        let e: Expiry = "31-12-2099".parse().unwrap();
        assert_eq!(e.date(), NaiveDate::from_ymd_opt(2099, 12, 31).unwrap());
        assert_eq!(e.to_string(), "31-12-2099");
    }

    #[test]
    fn expiry_rejects_other_formats() {
        assert!("2099-12-31".parse::<Expiry>().is_err());
        assert!("31/12/2099".parse::<Expiry>().is_err());
        assert!("31-13-2099".parse::<Expiry>().is_err());
        assert!("30-02-2024".parse::<Expiry>().is_err());
        assert!("".parse::<Expiry>().is_err());
    }

    #[test]
    fn expiry_requires_four_digit_year() {
        assert!(matches!("31-12-99".parse::<Expiry>(), Err(ExpiryError::Year)));
        assert!(matches!("31-12-099".parse::<Expiry>(), Err(ExpiryError::Year)));
        assert!("01-01-10000".parse::<Expiry>().is_err());
        assert_eq!("01-02-0999".parse::<Expiry>().unwrap().to_string(), "01-02-0999");
    }

    #[test]
    fn expired_from_start_of_expiry_day() {
        let r = make_record(1, "15-06-2030");
        assert!(!r.is_expired(at("14-06-2030", "23:59:59")));
        assert!(!r.is_expired(at("15-06-2030", "00:00:00")));
        assert!(r.is_expired(at("15-06-2030", "00:00:01")));
        assert!(r.is_expired(at("16-06-2030", "12:00:00")));
    }

    #[test]
    fn status_labels() {
        let r = make_record(1, "15-06-2030");
        assert_eq!(r.status(at("01-01-2030", "00:00:00")).label(), "active apikey");
        assert_eq!(r.status(at("01-01-2031", "00:00:00")).label(), "expired apikey");
    }

    #[test]
    fn gating_needs_quota_and_time() {
        let now = at("01-01-2030", "12:00:00");
        assert!(make_record(1, "31-12-2099").is_valid_for_gating(now));
        assert!(!make_record(0, "31-12-2099").is_valid_for_gating(now));
        assert!(!make_record(5, "01-01-2020").is_valid_for_gating(now));
    }

    #[test]
    fn has_quota_ignores_expiry() {
        let r = make_record(2, "01-01-2000");
        assert!(r.has_quota());
        assert!(!make_record(0, "31-12-2099").has_quota());
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let v = serde_json::to_value(make_record(5, "31-12-2099")).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"apikey": "abc123", "limitup": 5, "expired": "31-12-2099"})
        );
    }
}
