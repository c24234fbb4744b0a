use std::fmt::{Debug, Formatter};

use hearth_application::CredentialInput;
use hearth_domain::{
    CredentialBundleView, CredentialFields, CredentialMetadata, CredentialPatch, FieldChange,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming credential values.
///
/// On create, missing and empty values are both left unset. On update, a
/// missing key keeps the stored value and an empty string clears it.
#[derive(Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/credentials-request.ts"
)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CredentialsRequest {
    /// Converts the payload into a full credential input.
    #[must_use]
    pub fn into_input(self) -> CredentialInput {
        let present = |value: Option<String>| value.filter(|value| !value.is_empty());

        CredentialInput {
            fields: CredentialFields {
                account_number: present(self.account_number),
                username: present(self.username),
                password: present(self.password),
                pin: present(self.pin),
            },
            metadata: CredentialMetadata {
                website: present(self.website),
                phone: present(self.phone),
                notes: present(self.notes),
            },
        }
    }

    /// Converts the payload into a partial update.
    #[must_use]
    pub fn into_patch(self) -> CredentialPatch {
        CredentialPatch {
            account_number: FieldChange::from_transport(self.account_number),
            username: FieldChange::from_transport(self.username),
            password: FieldChange::from_transport(self.password),
            pin: FieldChange::from_transport(self.pin),
            website: FieldChange::from_transport(self.website),
            phone: FieldChange::from_transport(self.phone),
            notes: FieldChange::from_transport(self.notes),
        }
    }
}

/// Decrypted credentials of one resource. Fields that are unset or could
/// not be decrypted are `null`.
#[derive(Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/credentials-response.ts"
)]
pub struct CredentialsResponse {
    pub account_number: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pin: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl From<CredentialBundleView> for CredentialsResponse {
    fn from(view: CredentialBundleView) -> Self {
        Self {
            account_number: view.fields.account_number,
            username: view.fields.username,
            password: view.fields.password,
            pin: view.fields.pin,
            website: view.metadata.website,
            phone: view.metadata.phone,
            notes: view.metadata.notes,
        }
    }
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() { "<set>" } else { "<unset>" }
}

impl Debug for CredentialsRequest {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CredentialsRequest")
            .field("account_number", &presence(&self.account_number))
            .field("username", &presence(&self.username))
            .field("password", &presence(&self.password))
            .field("pin", &presence(&self.pin))
            .field("website", &self.website)
            .field("phone", &self.phone)
            .field("notes", &self.notes)
            .finish()
    }
}

impl Debug for CredentialsResponse {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CredentialsResponse")
            .field("account_number", &presence(&self.account_number))
            .field("username", &presence(&self.username))
            .field("password", &presence(&self.password))
            .field("pin", &presence(&self.pin))
            .field("website", &self.website)
            .field("phone", &self.phone)
            .field("notes", &self.notes)
            .finish()
    }
}

/// Non-secret credential fields shown in listings.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/credential-metadata-response.ts"
)]
pub struct CredentialMetadataResponse {
    pub website: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl From<CredentialMetadata> for CredentialMetadataResponse {
    fn from(metadata: CredentialMetadata) -> Self {
        Self {
            website: metadata.website,
            phone: metadata.phone,
            notes: metadata.notes,
        }
    }
}
