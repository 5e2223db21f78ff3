use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::record::Record;
use crate::repository::RepositoryError;

fn default_percent_to_qualify() -> i32 {
    100
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Record>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Record>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A level file: metadata plus its ranked list of records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LevelDocument {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub verifier: String,
    #[serde(default)]
    pub creators: Vec<String>,
    #[serde(default)]
    pub verification: String,
    #[serde(default = "default_percent_to_qualify")]
    pub percent_to_qualify: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub records: Vec<Record>,
    /// Top-level keys this version does not know about, written back unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl LevelDocument {
    /// Creates a document with the given metadata and no records.
    pub fn new(metadata: LevelMetadata) -> Self {
        Self {
            id: metadata.id,
            name: metadata.name,
            author: metadata.author,
            verifier: metadata.verifier,
            creators: metadata.creators,
            verification: metadata.verification,
            percent_to_qualify: metadata.percent_to_qualify,
            records: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    /// Returns a copy of everything except `records`.
    pub fn metadata(&self) -> LevelMetadata {
        LevelMetadata {
            id: self.id,
            name: self.name.clone(),
            author: self.author.clone(),
            verifier: self.verifier.clone(),
            creators: self.creators.clone(),
            verification: self.verification.clone(),
            percent_to_qualify: self.percent_to_qualify,
        }
    }

    /// Overwrites the metadata fields, leaving `records` and `extra` alone.
    pub(crate) fn apply_metadata(&mut self, metadata: LevelMetadata) {
        self.id = metadata.id;
        self.name = metadata.name;
        self.author = metadata.author;
        self.verifier = metadata.verifier;
        self.creators = metadata.creators;
        self.verification = metadata.verification;
        self.percent_to_qualify = metadata.percent_to_qualify;
    }
}

impl fmt::Display for LevelDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("{} (#{})", self.name, self.id);
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.chars().count()))?;
        writeln!(f, "Author:       {}", self.author)?;
        writeln!(f, "Verifier:     {}", self.verifier)?;
        if !self.creators.is_empty() {
            writeln!(f, "Creators:     {}", self.creators.join(", "))?;
        }
        writeln!(f, "Verification: {}", self.verification)?;
        writeln!(f, "To qualify:   {}%", self.percent_to_qualify)?;

        if self.records.is_empty() {
            writeln!(f, "\nNo records.")?;
        } else {
            writeln!(f, "\nRecords:")?;
            for (i, record) in self.records.iter().enumerate() {
                writeln!(f, "  {:>3}. {}", i + 1, record)?;
            }
        }

        Ok(())
    }
}

/// The editable, non-record fields of a level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LevelMetadata {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub verifier: String,
    pub creators: Vec<String>,
    pub verification: String,
    pub percent_to_qualify: i32,
}

impl LevelMetadata {
    /// Builds metadata from raw form input.
    ///
    /// `id` and `percent_to_qualify` must parse as integers; `creators` is a
    /// comma-separated list.
    pub fn from_fields(
        id: &str,
        name: &str,
        author: &str,
        verifier: &str,
        creators: &str,
        verification: &str,
        percent_to_qualify: &str,
    ) -> Result<Self, RepositoryError> {
        let id = parse_integer("id", id)?;
        let percent_to_qualify = parse_integer("percentToQualify", percent_to_qualify)?;
        let percent_to_qualify = i32::try_from(percent_to_qualify).map_err(|_| {
            RepositoryError::Validation(format!(
                "percentToQualify out of range: {}",
                percent_to_qualify
            ))
        })?;

        Ok(Self {
            id,
            name: name.trim().to_string(),
            author: author.trim().to_string(),
            verifier: verifier.trim().to_string(),
            creators: parse_creators(creators),
            verification: verification.trim().to_string(),
            percent_to_qualify,
        })
    }

    /// Checks the constraints every stored level must satisfy.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        if self.name.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "level name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Stricter check applied when a brand new level is created: every
    /// descriptive field must be filled in.
    pub fn validate_for_create(&self) -> Result<(), RepositoryError> {
        self.validate()?;
        let missing: Vec<&str> = [
            ("author", &self.author),
            ("verifier", &self.verifier),
            ("verification", &self.verification),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(RepositoryError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    /// File name a new level with this name is stored under.
    pub fn file_name(&self) -> Result<String, RepositoryError> {
        level_file_name(&self.name)
    }
}

/// Derives `<slug>.json` from a level name: lowercase, spaces become
/// underscores, anything outside `[a-z0-9_]` is dropped.
pub fn level_file_name(name: &str) -> Result<String, RepositoryError> {
    let slug: String = name
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();

    if slug.is_empty() {
        return Err(RepositoryError::Validation(format!(
            "level name '{}' does not produce a valid file name",
            name
        )));
    }
    Ok(format!("{}.json", slug))
}

/// Splits a comma-separated creator list, trimming entries and dropping blanks.
pub fn parse_creators(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

fn parse_integer(field: &str, value: &str) -> Result<i64, RepositoryError> {
    value.trim().parse::<i64>().map_err(|_| {
        RepositoryError::Validation(format!("{} must be an integer, got '{}'", field, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> LevelMetadata {
        LevelMetadata::from_fields(
            "86407629",
            "Tidal Wave",
            "OniLink",
            "Zoink",
            "OniLink, , Zoink ",
            "https://youtu.be/tidal",
            "100",
        )
        .unwrap()
    }

    #[test]
    fn test_from_fields() {
        let meta = metadata();
        assert_eq!(meta.id, 86407629);
        assert_eq!(meta.name, "Tidal Wave");
        assert_eq!(meta.creators, vec!["OniLink", "Zoink"]);
        assert_eq!(meta.percent_to_qualify, 100);
    }

    #[test]
    fn test_from_fields_rejects_non_integers() {
        let err = LevelMetadata::from_fields("abc", "n", "a", "v", "", "l", "100").unwrap_err();
        assert!(err.to_string().contains("id must be an integer"));

        let err = LevelMetadata::from_fields("1", "n", "a", "v", "", "l", "").unwrap_err();
        assert!(err.to_string().contains("percentToQualify"));
    }

    #[test]
    fn test_validate_for_create_lists_missing_fields() {
        let mut meta = metadata();
        meta.author.clear();
        meta.verification = "  ".to_string();
        let err = meta.validate_for_create().unwrap_err();
        assert!(err.to_string().contains("author, verification"));
    }

    #[test]
    fn test_level_file_name() {
        assert_eq!(level_file_name("Tidal Wave").unwrap(), "tidal_wave.json");
        assert_eq!(level_file_name("Sakupen Circles!").unwrap(), "sakupen_circles.json");
        assert_eq!(level_file_name("Ñandú 2").unwrap(), "and_2.json");
        assert!(level_file_name("???").is_err());
    }

    #[test]
    fn test_new_document_has_no_records() {
        let doc = LevelDocument::new(metadata());
        assert!(doc.records.is_empty());
        assert_eq!(doc.metadata(), metadata());
    }

    #[test]
    fn test_apply_metadata_keeps_records() {
        let mut doc = LevelDocument::new(metadata()).with_records(vec![Record::new("a", "b")]);
        let mut meta = metadata();
        meta.name = "Renamed".to_string();
        doc.apply_metadata(meta);
        assert_eq!(doc.name, "Renamed");
        assert_eq!(doc.records.len(), 1);
    }

    #[test]
    fn test_display_numbers_records_from_one() {
        let doc = LevelDocument::new(metadata())
            .with_records(vec![Record::new("Zoink", "https://x")]);
        let output = doc.to_string();
        assert!(output.contains("Tidal Wave (#86407629)"));
        assert!(output.contains("  1. Zoink - 100%"));
    }
}
