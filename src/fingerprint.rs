use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::dataset::TabularDataset;
use crate::error::SummaryError;

/// SHA-256 digest of a dataset's compact JSON form, lowercase hex
///
/// Only used as a cache key. Two datasets whose rows carry the same values in
/// a different key order hash differently, which is fine because re-uploads
/// of the same file parse in the same order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for file names and log lines
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of a dataset
///
/// # Arguments
/// * `dataset` - Parsed rows to hash
///
/// # Returns
/// * `Result<Fingerprint, SummaryError>` - The digest, or a serialization error
///
/// # Examples
/// ```
/// use sheet_summary::dataset::TabularDataset;
/// use sheet_summary::fingerprint::fingerprint;
///
/// let empty = TabularDataset::default();
/// let fp = fingerprint(&empty).unwrap();
/// assert_eq!(fp.as_str().len(), 64);
/// ```
pub fn fingerprint(dataset: &TabularDataset) -> Result<Fingerprint, SummaryError> {
    let bytes = serde_json::to_vec(dataset)?;
    let digest = Sha256::digest(&bytes);
    Ok(Fingerprint(hex::encode(digest)))
}
