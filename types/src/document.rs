//! Document slots and storage references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;
use crate::time::Timestamp;

/// Logical slot a document is filed under.
///
/// The wire form is the camelCase slot name; additional documents carry
/// their index in brackets, e.g. `additionalDocument[2]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DocumentSlot {
    IdDocument,
    ProofOfAddress,
    BusinessRegistration,
    AdditionalDocument(u8),
}

impl DocumentSlot {
    const ADDITIONAL_PREFIX: &'static str = "additionalDocument";

    pub fn is_additional(&self) -> bool {
        matches!(self, Self::AdditionalDocument(_))
    }
}

impl fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdDocument => f.write_str("idDocument"),
            Self::ProofOfAddress => f.write_str("proofOfAddress"),
            Self::BusinessRegistration => f.write_str("businessRegistration"),
            Self::AdditionalDocument(i) => write!(f, "{}[{i}]", Self::ADDITIONAL_PREFIX),
        }
    }
}

impl FromStr for DocumentSlot {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idDocument" => return Ok(Self::IdDocument),
            "proofOfAddress" => return Ok(Self::ProofOfAddress),
            "businessRegistration" => return Ok(Self::BusinessRegistration),
            _ => {}
        }
        s.strip_prefix(Self::ADDITIONAL_PREFIX)
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|idx| idx.parse::<u8>().ok())
            .map(Self::AdditionalDocument)
            .ok_or_else(|| TypeError::InvalidSlot(s.to_string()))
    }
}

impl TryFrom<String> for DocumentSlot {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocumentSlot> for String {
    fn from(slot: DocumentSlot) -> Self {
        slot.to_string()
    }
}

/// Opaque reference returned by the document store for an uploaded blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A reference that is empty or only whitespace points at nothing.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document attached to a verification request. Immutable once attached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDocument {
    pub slot: DocumentSlot,
    pub blob_ref: BlobRef,
    pub uploaded_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names_roundtrip() {
        for slot in [
            DocumentSlot::IdDocument,
            DocumentSlot::ProofOfAddress,
            DocumentSlot::BusinessRegistration,
            DocumentSlot::AdditionalDocument(0),
            DocumentSlot::AdditionalDocument(4),
        ] {
            assert_eq!(slot.to_string().parse::<DocumentSlot>().unwrap(), slot);
        }
    }

    #[test]
    fn malformed_additional_slots_are_rejected() {
        assert!("additionalDocument".parse::<DocumentSlot>().is_err());
        assert!("additionalDocument[]".parse::<DocumentSlot>().is_err());
        assert!("additionalDocument[x]".parse::<DocumentSlot>().is_err());
        assert!("passport".parse::<DocumentSlot>().is_err());
    }

    #[test]
    fn required_slots_sort_before_additional() {
        let mut slots = vec![
            DocumentSlot::AdditionalDocument(1),
            DocumentSlot::BusinessRegistration,
            DocumentSlot::AdditionalDocument(0),
            DocumentSlot::IdDocument,
            DocumentSlot::ProofOfAddress,
        ];
        slots.sort();
        assert_eq!(
            slots,
            vec![
                DocumentSlot::IdDocument,
                DocumentSlot::ProofOfAddress,
                DocumentSlot::BusinessRegistration,
                DocumentSlot::AdditionalDocument(0),
                DocumentSlot::AdditionalDocument(1),
            ]
        );
    }

    #[test]
    fn slot_serializes_as_json_string() {
        let json = serde_json::to_string(&DocumentSlot::AdditionalDocument(3)).unwrap();
        assert_eq!(json, "\"additionalDocument[3]\"");
        let back: DocumentSlot = serde_json::from_str("\"proofOfAddress\"").unwrap();
        assert_eq!(back, DocumentSlot::ProofOfAddress);
    }

    #[test]
    fn blank_blob_ref() {
        assert!(BlobRef::new("  ").is_blank());
        assert!(!BlobRef::new("s3://bucket/key").is_blank());
    }
}
