//! Reconciles an externally authored key order with a record list.
//!
//! Records are matched to order keys by `user`. Matched records come first in
//! order-list order; every other record follows, sorted by key. No record is
//! ever created or dropped.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::models::Record;

/// Result of a reorder: the new record list and what happened to each key.
#[derive(Debug, Clone, PartialEq)]
pub struct Reordered {
    pub records: Vec<Record>,
    pub report: ReorderReport,
}

/// Summary of a reorder, for display and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderReport {
    /// Number of records placed by the order list.
    pub placed: usize,
    /// Order keys that matched no record.
    pub unknown: Vec<String>,
    /// Order keys listed more than once; only the first occurrence is used.
    pub repeated: Vec<String>,
    /// Record keys shared by more than one record. The first record wins the
    /// key; the others are appended with the unplaced records.
    pub duplicate_records: Vec<String>,
    /// Keys of the records appended after the placed ones, in output order.
    pub tail: Vec<String>,
}

impl ReorderReport {
    pub fn has_warnings(&self) -> bool {
        !self.unknown.is_empty() || !self.repeated.is_empty() || !self.duplicate_records.is_empty()
    }
}

/// Orders `records` by `order`.
pub fn reorder(records: &[Record], order: &[String]) -> Reordered {
    let mut first_by_key: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    let mut duplicate_records = Vec::new();
    for (i, record) in records.iter().enumerate() {
        match first_by_key.entry(record.user.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
            Entry::Occupied(_) => duplicate_records.push(record.user.clone()),
        }
    }

    let mut used = vec![false; records.len()];
    let mut output = Vec::with_capacity(records.len());
    let mut unknown = Vec::new();
    let mut repeated = Vec::new();

    for key in order {
        match first_by_key.get(key.as_str()) {
            Some(&i) if !used[i] => {
                used[i] = true;
                output.push(records[i].clone());
            }
            Some(_) => repeated.push(key.clone()),
            None => unknown.push(key.clone()),
        }
    }
    let placed = output.len();

    let mut rest: Vec<&Record> = records
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(record, _)| record)
        .collect();
    // Stable, so records sharing a key keep their original relative order.
    rest.sort_by(|a, b| a.user.cmp(&b.user));

    let tail: Vec<String> = rest.iter().map(|r| r.user.clone()).collect();
    output.extend(rest.into_iter().cloned());

    duplicate_records.sort();
    duplicate_records.dedup();
    repeated.sort();
    repeated.dedup();

    if !duplicate_records.is_empty() {
        tracing::warn!(
            keys = ?duplicate_records,
            "several records share a user; later ones can only be placed in the tail"
        );
    }
    if !repeated.is_empty() {
        tracing::warn!(keys = ?repeated, "order list repeats keys; later entries ignored");
    }

    Reordered {
        records: output,
        report: ReorderReport {
            placed,
            unknown,
            repeated,
            duplicate_records,
            tail,
        },
    }
}
