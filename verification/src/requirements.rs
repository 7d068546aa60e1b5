//! Role-conditioned document requirements.
//!
//! Which slots each role must supply is data, not code: the table below is
//! the default and can be replaced from the daemon's configuration file.

use serde::{Deserialize, Serialize};

use vetting_types::{DocumentSlot, Role};

/// Hard upper bound on additional documents; slots run
/// `additionalDocument[0]` to `additionalDocument[4]`.
pub const MAX_ADDITIONAL_DOCUMENTS: usize = 5;

fn default_identity_slots() -> Vec<DocumentSlot> {
    vec![DocumentSlot::IdDocument, DocumentSlot::ProofOfAddress]
}

fn default_founder_slots() -> Vec<DocumentSlot> {
    vec![
        DocumentSlot::IdDocument,
        DocumentSlot::ProofOfAddress,
        DocumentSlot::BusinessRegistration,
    ]
}

fn default_max_additional() -> usize {
    MAX_ADDITIONAL_DOCUMENTS
}

/// Required slots per role plus the additional-document allowance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequirements {
    #[serde(default = "default_founder_slots")]
    pub founder: Vec<DocumentSlot>,
    #[serde(default = "default_identity_slots")]
    pub investor: Vec<DocumentSlot>,
    #[serde(default = "default_identity_slots")]
    pub admin: Vec<DocumentSlot>,
    #[serde(default = "default_identity_slots")]
    pub user: Vec<DocumentSlot>,
    #[serde(default = "default_max_additional")]
    pub max_additional: usize,
}

impl Default for DocumentRequirements {
    fn default() -> Self {
        Self {
            founder: default_founder_slots(),
            investor: default_identity_slots(),
            admin: default_identity_slots(),
            user: default_identity_slots(),
            max_additional: default_max_additional(),
        }
    }
}

impl DocumentRequirements {
    pub fn required_for(&self, role: Role) -> &[DocumentSlot] {
        match role {
            Role::Founder => &self.founder,
            Role::Investor => &self.investor,
            Role::Admin => &self.admin,
            Role::User => &self.user,
        }
    }

    /// Effective allowance, never above [`MAX_ADDITIONAL_DOCUMENTS`].
    pub fn additional_limit(&self) -> usize {
        self.max_additional.min(MAX_ADDITIONAL_DOCUMENTS)
    }

    /// Reject tables that could never be satisfied or that name additional
    /// slots as mandatory.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_additional > MAX_ADDITIONAL_DOCUMENTS {
            return Err(format!(
                "max_additional is {}, at most {} is supported",
                self.max_additional, MAX_ADDITIONAL_DOCUMENTS
            ));
        }
        for role in Role::ALL {
            if let Some(slot) = self.required_for(role).iter().find(|s| s.is_additional()) {
                return Err(format!("{slot} cannot be required for role {role}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn founder_needs_business_registration() {
        let reqs = DocumentRequirements::default();
        assert!(reqs
            .required_for(Role::Founder)
            .contains(&DocumentSlot::BusinessRegistration));
        for role in [Role::Investor, Role::Admin, Role::User] {
            assert!(!reqs
                .required_for(role)
                .contains(&DocumentSlot::BusinessRegistration));
            assert!(reqs.required_for(role).contains(&DocumentSlot::IdDocument));
            assert!(reqs.required_for(role).contains(&DocumentSlot::ProofOfAddress));
        }
        assert!(reqs.validate().is_ok());
    }

    #[test]
    fn partial_table_falls_back_to_defaults() {
        let reqs: DocumentRequirements =
            serde_json::from_str(r#"{"investor":["idDocument"],"max_additional":2}"#).unwrap();
        assert_eq!(reqs.investor, vec![DocumentSlot::IdDocument]);
        assert_eq!(reqs.founder, DocumentRequirements::default().founder);
        assert_eq!(reqs.additional_limit(), 2);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let mut reqs = DocumentRequirements {
            max_additional: 9,
            ..Default::default()
        };
        assert!(reqs.validate().is_err());

        reqs.max_additional = 5;
        reqs.user.push(DocumentSlot::AdditionalDocument(0));
        assert!(reqs.validate().is_err());
    }
}
