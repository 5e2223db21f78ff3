//! In-memory editing of one loaded level document.
//!
//! Every operation either applies completely or leaves the document
//! untouched.

use thiserror::Error;

use crate::merge::{self, ReorderReport, Reordered};
use crate::models::{LevelDocument, LevelMetadata, Record};
use crate::store::RemoteBlobHandle;

/// Errors from repository operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Record index {index} is out of range ({len} records)")]
    OutOfRange { index: usize, len: usize },
}

/// A loaded level document and the remote version it came from.
#[derive(Debug, Clone)]
pub struct LevelRepository {
    document: LevelDocument,
    handle: RemoteBlobHandle,
}

impl LevelRepository {
    pub fn new(document: LevelDocument, handle: RemoteBlobHandle) -> Self {
        Self { document, handle }
    }

    pub fn document(&self) -> &LevelDocument {
        &self.document
    }

    pub fn handle(&self) -> &RemoteBlobHandle {
        &self.handle
    }

    pub fn records(&self) -> &[Record] {
        &self.document.records
    }

    pub fn record(&self, index: usize) -> Result<&Record, RepositoryError> {
        self.document
            .records
            .get(index)
            .ok_or(RepositoryError::OutOfRange {
                index,
                len: self.document.records.len(),
            })
    }

    /// Appends a record.
    pub fn add(&mut self, record: Record) -> Result<(), RepositoryError> {
        record.validate()?;
        self.document.records.push(record);
        Ok(())
    }

    /// Replaces the record at `index`, returning the previous one.
    pub fn update(&mut self, index: usize, record: Record) -> Result<Record, RepositoryError> {
        self.check_index(index)?;
        record.validate()?;
        Ok(std::mem::replace(&mut self.document.records[index], record))
    }

    /// Removes and returns the record at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Record, RepositoryError> {
        self.check_index(index)?;
        Ok(self.document.records.remove(index))
    }

    /// Replaces the whole record sequence.
    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.document.records = records;
    }

    /// Replaces the non-record fields. Records are kept as they are.
    pub fn update_metadata(&mut self, metadata: LevelMetadata) -> Result<(), RepositoryError> {
        metadata.validate()?;
        self.document.apply_metadata(metadata);
        Ok(())
    }

    /// Replaces the entire document, e.g. after a manual edit of its text.
    pub fn replace_document(&mut self, document: LevelDocument) -> Result<(), RepositoryError> {
        document.metadata().validate()?;
        for (i, record) in document.records.iter().enumerate() {
            record.validate().map_err(|e| match e {
                RepositoryError::Validation(msg) => {
                    RepositoryError::Validation(format!("record {}: {}", i + 1, msg))
                }
                other => other,
            })?;
        }
        self.document = document;
        Ok(())
    }

    /// Reorders the records by key; see [`merge::reorder`].
    pub fn reorder(&mut self, order: &[String]) -> ReorderReport {
        let Reordered { records, report } = merge::reorder(&self.document.records, order);
        self.replace_all(records);
        report
    }

    pub(crate) fn set_token(&mut self, token: String) {
        self.handle.set_token(token);
    }

    fn check_index(&self, index: usize) -> Result<(), RepositoryError> {
        let len = self.document.records.len();
        if index >= len {
            return Err(RepositoryError::OutOfRange { index, len });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> LevelRepository {
        let document = LevelDocument::new(LevelMetadata {
            id: 1,
            name: "Tidal Wave".to_string(),
            author: "OniLink".to_string(),
            verifier: "Zoink".to_string(),
            creators: vec!["OniLink".to_string()],
            verification: "https://v".to_string(),
            percent_to_qualify: 100,
        })
        .with_records(vec![
            Record::new("A", "https://a"),
            Record::new("B", "https://b").with_percent(80),
            Record::new("C", "https://c").with_percent(90),
        ]);
        LevelRepository::new(document, RemoteBlobHandle::new("data/tidal_wave.json", "t1"))
    }

    fn users(repo: &LevelRepository) -> Vec<&str> {
        repo.records().iter().map(|r| r.user.as_str()).collect()
    }

    #[test]
    fn test_add_appends() {
        let mut repo = repository();
        repo.add(Record::new("D", "https://d")).unwrap();
        assert_eq!(users(&repo), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_add_empty_user_fails_and_changes_nothing() {
        let mut repo = repository();
        let before = repo.document().clone();
        let err = repo.add(Record::new("", "x")).unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
        assert_eq!(repo.document(), &before);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut repo = repository();
        let old = repo
            .update(1, Record::new("B", "https://b2").with_mobile(true))
            .unwrap();
        assert_eq!(old.link, "https://b");
        assert_eq!(repo.record(1).unwrap().link, "https://b2");
        assert!(repo.record(1).unwrap().mobile);
    }

    #[test]
    fn test_update_checks_index_then_fields() {
        let mut repo = repository();
        let err = repo.update(3, Record::new("", "")).unwrap_err();
        assert_eq!(err, RepositoryError::OutOfRange { index: 3, len: 3 });

        let err = repo.update(0, Record::new("A", " ")).unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
        assert_eq!(repo.record(0).unwrap().link, "https://a");
    }

    #[test]
    fn test_remove() {
        let mut repo = repository();
        let removed = repo.remove(0).unwrap();
        assert_eq!(removed.user, "A");
        assert_eq!(users(&repo), vec!["B", "C"]);

        let err = repo.remove(2).unwrap_err();
        assert_eq!(err, RepositoryError::OutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn test_update_metadata_preserves_records() {
        let mut repo = repository();
        let mut meta = repo.document().metadata();
        meta.name = "Tidal Wave (rebuff)".to_string();
        meta.percent_to_qualify = 60;
        repo.update_metadata(meta).unwrap();

        assert_eq!(repo.document().name, "Tidal Wave (rebuff)");
        assert_eq!(repo.document().percent_to_qualify, 60);
        assert_eq!(users(&repo), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_update_metadata_rejects_empty_name() {
        let mut repo = repository();
        let mut meta = repo.document().metadata();
        meta.name = "  ".to_string();
        assert!(repo.update_metadata(meta).is_err());
        assert_eq!(repo.document().name, "Tidal Wave");
    }

    #[test]
    fn test_replace_document_is_all_or_nothing() {
        let mut repo = repository();
        let mut replacement = repo.document().clone();
        replacement.records.push(Record::new("D", ""));

        let err = repo.replace_document(replacement.clone()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: record 4: record link cannot be empty (user 'D')"
        );
        assert_eq!(repo.records().len(), 3);

        replacement.records.pop();
        replacement.records.reverse();
        repo.replace_document(replacement).unwrap();
        assert_eq!(users(&repo), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_reorder_replaces_records() {
        let mut repo = repository();
        let report = repo.reorder(&["C".to_string(), "A".to_string()]);
        assert_eq!(users(&repo), vec!["C", "A", "B"]);
        assert_eq!(report.placed, 2);
        assert_eq!(repo.handle().token(), "t1");
    }
}
