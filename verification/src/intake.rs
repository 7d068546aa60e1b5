//! Intake validation for new submissions.
//!
//! Intake is structural: required slots present, additional documents within
//! the allowance, every document already uploaded. Content is never inspected.

use std::collections::BTreeMap;

use vetting_store::{DocumentStore, NewRequest, StoreError};
use vetting_types::{BlobRef, DocumentSlot, Role, Timestamp, UserId, VerificationDocument};

use crate::error::IntakeError;
use crate::requirements::DocumentRequirements;

/// Documents keyed by slot, each already stored by the document store.
pub type SubmittedDocuments = BTreeMap<DocumentSlot, BlobRef>;

/// Checks role-conditioned completeness of a submission.
#[derive(Clone, Debug, Default)]
pub struct IntakeValidator {
    requirements: DocumentRequirements,
}

impl IntakeValidator {
    pub fn new(requirements: DocumentRequirements) -> Self {
        Self { requirements }
    }

    pub fn requirements(&self) -> &DocumentRequirements {
        &self.requirements
    }

    /// Validate `documents` for a submitter holding `role`.
    pub fn check(&self, role: Role, documents: &SubmittedDocuments) -> Result<(), IntakeError> {
        let max = self.requirements.additional_limit();
        let additional: Vec<u8> = documents
            .keys()
            .filter_map(|slot| match slot {
                DocumentSlot::AdditionalDocument(i) => Some(*i),
                _ => None,
            })
            .collect();
        // An index past the allowance implies that many positions in use.
        let count = additional
            .iter()
            .map(|&i| usize::from(i) + 1)
            .max()
            .unwrap_or(0)
            .max(additional.len());
        if count > max {
            return Err(IntakeError::TooManyAdditionalDocuments { count, max });
        }

        if let Some(&slot) = self
            .requirements
            .required_for(role)
            .iter()
            .find(|slot| !documents.contains_key(slot))
        {
            return Err(IntakeError::MissingRequiredDocument(slot));
        }

        if let Some((&slot, _)) = documents.iter().find(|(_, blob)| blob.is_blank()) {
            return Err(IntakeError::MissingStorageReference(slot));
        }

        Ok(())
    }

    /// Validate and build the record to persist. Documents are ordered by slot
    /// and stamped with the submission time.
    pub fn prepare(
        &self,
        user_id: UserId,
        role: Role,
        documents: SubmittedDocuments,
        now: Timestamp,
    ) -> Result<NewRequest, IntakeError> {
        self.check(role, &documents)?;
        let documents = documents
            .into_iter()
            .map(|(slot, blob_ref)| VerificationDocument {
                slot,
                blob_ref,
                uploaded_at: now,
            })
            .collect();
        Ok(NewRequest {
            user_id,
            role,
            documents,
            submitted_at: now,
        })
    }
}

/// Push every payload to the document store. Stops at the first failure; the
/// caller must not create a request in that case.
pub fn upload_documents<D>(
    store: &D,
    uploads: BTreeMap<DocumentSlot, Vec<u8>>,
) -> Result<SubmittedDocuments, StoreError>
where
    D: DocumentStore + ?Sized,
{
    uploads
        .into_iter()
        .map(|(slot, bytes)| Ok((slot, store.store(slot, &bytes)?)))
        .collect()
}
