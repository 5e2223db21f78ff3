use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::repository::RepositoryError;

fn default_percent() -> i32 {
    100
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One score entry of a level.
///
/// `user` is the natural key used when reordering. `mobile` is only written
/// out when it is `true`; a record with `mobile: false` serializes without
/// the key at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub user: String,
    pub link: String,
    #[serde(default = "default_percent")]
    pub percent: i32,
    #[serde(default)]
    pub hz: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub mobile: bool,
    /// Keys this version does not know about, written back unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(user: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            link: link.into(),
            percent: default_percent(),
            hz: String::new(),
            mobile: false,
            extra: BTreeMap::new(),
        }
    }

    /// Builds a record from raw form input.
    ///
    /// Text fields are trimmed; `percent` must parse as an integer.
    pub fn from_fields(
        user: &str,
        link: &str,
        percent: &str,
        hz: &str,
        mobile: bool,
    ) -> Result<Self, RepositoryError> {
        let percent = percent.trim().parse::<i32>().map_err(|_| {
            RepositoryError::Validation(format!("percent must be an integer, got '{}'", percent))
        })?;

        let record = Self::new(user.trim(), link.trim())
            .with_percent(percent)
            .with_hz(hz.trim())
            .with_mobile(mobile);
        record.validate()?;
        Ok(record)
    }

    pub fn with_percent(mut self, percent: i32) -> Self {
        self.percent = percent;
        self
    }

    pub fn with_hz(mut self, hz: impl Into<String>) -> Self {
        self.hz = hz.into();
        self
    }

    pub fn with_mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    /// Checks the fields every stored record must have.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        if self.user.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "record user cannot be empty".to_string(),
            ));
        }
        if self.link.trim().is_empty() {
            return Err(RepositoryError::Validation(format!(
                "record link cannot be empty (user '{}')",
                self.user
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}%", self.user, self.percent)?;
        if !self.hz.trim().is_empty() {
            write!(f, " ({})", self.hz.trim())?;
        }
        if self.mobile {
            write!(f, " [mobile]")?;
        }
        write!(f, " <{}>", self.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_new_defaults() {
        let record = Record::new("Zoink", "https://youtu.be/abc");
        assert_eq!(record.percent, 100);
        assert!(record.hz.is_empty());
        assert!(!record.mobile);
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_from_fields_trims_and_parses() {
        let record = Record::from_fields("  Zoink ", " https://x ", " 87 ", " 240 ", true).unwrap();
        assert_eq!(record.user, "Zoink");
        assert_eq!(record.link, "https://x");
        assert_eq!(record.percent, 87);
        assert_eq!(record.hz, "240");
        assert!(record.mobile);
    }

    #[test]
    fn test_from_fields_rejects_non_integer_percent() {
        let err = Record::from_fields("Zoink", "https://x", "ninety", "", false).unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));

        let err = Record::from_fields("Zoink", "https://x", "99.5", "", false).unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
    }

    #[test]
    fn test_from_fields_rejects_blank_user_or_link() {
        assert!(Record::from_fields("   ", "https://x", "100", "", false).is_err());
        assert!(Record::from_fields("Zoink", "", "100", "", false).is_err());
    }

    #[test]
    fn test_mobile_false_is_omitted() {
        let json = serde_json::to_value(Record::new("a", "b")).unwrap();
        assert!(json.get("mobile").is_none());

        let json = serde_json::to_value(Record::new("a", "b").with_mobile(true)).unwrap();
        assert_eq!(json.get("mobile"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_record_display() {
        let record = Record::new("Zoink", "https://x")
            .with_percent(54)
            .with_hz("360")
            .with_mobile(true);
        assert_eq!(record.to_string(), "Zoink - 54% (360) [mobile] <https://x>");
    }
}
