//! Registry of referenced icons
//!
//! Keys are kept in first-registration order, which fixes the order of the
//! generated module no matter when each icon's transform completes. The set
//! only grows: a build packs every icon referenced at any point in the run.

use crate::error::IconpackError;
use crate::transform::TransformResult;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;

/// Why an icon could not be packed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Not present in any search root
    NotFound,
    /// Key cannot name a file inside a search root
    InvalidKey,
    /// Source found but the optimizer or rasterizer rejected it
    Transform,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not found",
            Self::InvalidKey => "invalid key",
            Self::Transform => "transform failed",
        };
        write!(f, "{}", name)
    }
}

/// A recorded per-icon failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub kind: FailureKind,
    pub message: String,
    /// Attempt again on the next compile
    pub retryable: bool,
}

impl From<&IconpackError> for RecordError {
    fn from(err: &IconpackError) -> Self {
        let kind = match err {
            IconpackError::NotFound { .. } => FailureKind::NotFound,
            IconpackError::InvalidKey { .. } => FailureKind::InvalidKey,
            _ => FailureKind::Transform,
        };
        Self {
            kind,
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// Everything known about one referenced icon
#[derive(Debug, Clone, Default)]
pub struct ResourceRecord {
    pub key: String,
    /// Raw source bytes of the last successful resolution
    pub raw_bytes: Option<Vec<u8>>,
    /// File the bytes were read from
    pub source_path: Option<PathBuf>,
    pub transformed: Option<TransformResult>,
    pub error: Option<RecordError>,
}

impl ResourceRecord {
    fn new(key: String) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    /// Whether the next compile should resolve and transform this icon
    pub fn needs_work(&self) -> bool {
        match (&self.transformed, &self.error) {
            (Some(_), _) => false,
            (None, Some(error)) => error.retryable,
            (None, None) => true,
        }
    }
}

/// Ordered, grow-only map of icon key to record
#[derive(Debug, Default)]
pub struct ResourceSet {
    records: IndexMap<String, ResourceRecord>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key` if unseen; returns whether it was new
    ///
    /// Registering a known key changes nothing: its position and any
    /// computed result are kept.
    pub fn register(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.records.insert(key.clone(), ResourceRecord::new(key));
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ResourceRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Keys the next compile has to process, in registration order
    pub fn pending_keys(&self) -> Vec<String> {
        self.records
            .values()
            .filter(|r| r.needs_work())
            .map(|r| r.key.clone())
            .collect()
    }

    /// Store a successful transform for `key`
    pub fn record_success(
        &mut self,
        key: &str,
        raw_bytes: Vec<u8>,
        source_path: PathBuf,
        result: TransformResult,
    ) {
        if let Some(record) = self.records.get_mut(key) {
            record.raw_bytes = Some(raw_bytes);
            record.source_path = Some(source_path);
            record.transformed = Some(result);
            record.error = None;
        }
    }

    /// Store a failure for `key`
    pub fn record_failure(&mut self, key: &str, error: RecordError) {
        if let Some(record) = self.records.get_mut(key) {
            record.transformed = None;
            record.error = Some(error);
        }
    }

    /// Successful records in registration order
    pub fn completed(&self) -> Vec<&ResourceRecord> {
        self.records
            .values()
            .filter(|r| r.transformed.is_some())
            .collect()
    }

    /// Failed records in registration order
    pub fn failed(&self) -> Vec<&ResourceRecord> {
        self.records
            .values()
            .filter(|r| r.transformed.is_none() && r.error.is_some())
            .collect()
    }
}
