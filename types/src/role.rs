//! Platform roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// The role a user holds on the platform. Owned by the identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Founder,
    Investor,
    Admin,
    User,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Founder, Role::Investor, Role::Admin, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Founder => "founder",
            Self::Investor => "investor",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Stable one-byte encoding used by storage indexes.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Founder => 0,
            Self::Investor => 1,
            Self::Admin => 2,
            Self::User => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.tag() == tag)
    }

    /// Only admins may decide requests or browse the review queue.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "founder" => Ok(Self::Founder),
            "investor" => Ok(Self::Investor),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(TypeError::InvalidRole(s.to_string())),
        }
    }
}
