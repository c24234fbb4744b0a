use std::str::FromStr;

use hearth_core::{AppError, AppResult, FamilyId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Family member identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(Uuid);

impl MemberId {
    /// Creates a new random member identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a member identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a transport value into a member identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid member id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Organizational role of a family member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Created the family; full control.
    Owner,
    /// Trusted adult with full control.
    Admin,
    /// Regular member; needs explicit grants.
    Member,
    /// Child account; needs explicit grants.
    Child,
}

impl MemberRole {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Child => "child",
        }
    }

    /// Returns whether the role carries blanket access when no grant exists.
    #[must_use]
    pub fn has_implicit_access(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

impl FromStr for MemberRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "child" => Ok(Self::Child),
            _ => Err(AppError::Validation(format!(
                "unknown member role '{value}'"
            ))),
        }
    }
}

/// Family member resolved for the current request.
///
/// Built from the active member roster for an authenticated session
/// identity. It is never written back by the access layer and does not
/// change for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Member identifier.
    pub id: MemberId,
    /// Family the member belongs to.
    pub family_id: FamilyId,
    /// Organizational role.
    pub role: MemberRole,
    /// Login email.
    pub email: String,
    /// Name shown in listings.
    pub display_name: String,
}

/// Display attributes of a member, used in "who has access" listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    /// Member identifier.
    pub id: MemberId,
    /// Name shown in listings.
    pub display_name: String,
    /// Short initials for avatars.
    pub initials: Option<String>,
    /// Avatar color token.
    pub color: Option<String>,
}
