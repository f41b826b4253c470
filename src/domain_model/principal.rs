use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier a principal is known by across the token subsystem.
/// Supplied by the external user directory; opaque to everything here.
#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct SubjectId(pub uuid::Uuid);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SubjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(SubjectId)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// What the directory knows about a subject, as far as tokens care.
/// Immutable for the life of any token minted from it.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub subject: SubjectId,
    pub role: Role,
    pub email: Option<String>,
}
