use std::fmt::{Display, Formatter};
use std::str::FromStr;

use hearth_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of family data that permissions and credential bundles can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Recurring or one-time bill.
    Bill,
    /// Credit card account.
    CreditCard,
    /// Photo album.
    PhotoAlbum,
    /// Single photo.
    Photo,
    /// Stored document.
    Document,
    /// Messaging channel.
    Channel,
    /// Vehicle record.
    Vehicle,
    /// Health record.
    HealthRecord,
    /// Family member profile.
    FamilyMember,
    /// Calendar event.
    Event,
    /// Chore assignment.
    Chore,
    /// Reusable form template.
    FormTemplate,
}

impl ResourceType {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bill => "bill",
            Self::CreditCard => "credit_card",
            Self::PhotoAlbum => "photo_album",
            Self::Photo => "photo",
            Self::Document => "document",
            Self::Channel => "channel",
            Self::Vehicle => "vehicle",
            Self::HealthRecord => "health_record",
            Self::FamilyMember => "family_member",
            Self::Event => "event",
            Self::Chore => "chore",
            Self::FormTemplate => "form_template",
        }
    }

    /// Returns all known resource types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceType] = &[
            ResourceType::Bill,
            ResourceType::CreditCard,
            ResourceType::PhotoAlbum,
            ResourceType::Photo,
            ResourceType::Document,
            ResourceType::Channel,
            ResourceType::Vehicle,
            ResourceType::HealthRecord,
            ResourceType::FamilyMember,
            ResourceType::Event,
            ResourceType::Chore,
            ResourceType::FormTemplate,
        ];

        ALL
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown resource type '{value}'")))
    }
}

impl Display for ResourceType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Address of one resource: its kind plus an opaque identifier owned by
/// whichever subsystem stores the resource itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    resource_type: ResourceType,
    resource_id: String,
}

impl ResourceRef {
    /// Creates a resource address, rejecting blank identifiers.
    pub fn new(resource_type: ResourceType, resource_id: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            resource_type,
            resource_id: NonEmptyString::new(resource_id)?.into(),
        })
    }

    /// Addresses a resource whose identifier is a UUID.
    #[must_use]
    pub fn from_uuid(resource_type: ResourceType, resource_id: Uuid) -> Self {
        Self {
            resource_type,
            resource_id: resource_id.to_string(),
        }
    }

    /// Parses transport values into a resource address.
    pub fn parse(resource_type: &str, resource_id: &str) -> AppResult<Self> {
        Self::new(ResourceType::from_str(resource_type)?, resource_id)
    }

    /// Returns the resource kind.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns the opaque resource identifier.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }
}

impl Display for ResourceRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}/{}", self.resource_type, self.resource_id)
    }
}
