use std::fmt::{Debug, Formatter};

use hearth_core::FamilyId;
use serde::{Deserialize, Serialize};

use crate::ResourceRef;

/// Opaque base64 ciphertext envelope for one field value.
///
/// Layout of the decoded bytes is `nonce (16) || tag (16) || ciphertext`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(String);

impl Envelope {
    /// Wraps a stored envelope value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the encoded envelope.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Envelope> for String {
    fn from(value: Envelope) -> Self {
        value.0
    }
}

/// Names of the sensitive fields in a credential bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    /// Account number.
    AccountNumber,
    /// Login username.
    Username,
    /// Login password.
    Password,
    /// PIN.
    Pin,
}

impl CredentialField {
    /// Returns the stable column name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountNumber => "account_number",
            Self::Username => "username",
            Self::Password => "password",
            Self::Pin => "pin",
        }
    }
}

/// The four sensitive credential fields, each independently present or not.
///
/// Used with `String` for plaintext and [`Envelope`] for sealed values.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialFields<T> {
    /// Account number.
    pub account_number: Option<T>,
    /// Login username.
    pub username: Option<T>,
    /// Login password.
    pub password: Option<T>,
    /// PIN.
    pub pin: Option<T>,
}

impl<T> CredentialFields<T> {
    /// A bundle with every field absent.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            account_number: None,
            username: None,
            password: None,
            pin: None,
        }
    }

    /// Returns whether every field is absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.account_number.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.pin.is_none()
    }

    /// Returns the value of one field.
    #[must_use]
    pub fn get(&self, field: CredentialField) -> Option<&T> {
        match field {
            CredentialField::AccountNumber => self.account_number.as_ref(),
            CredentialField::Username => self.username.as_ref(),
            CredentialField::Password => self.password.as_ref(),
            CredentialField::Pin => self.pin.as_ref(),
        }
    }

    /// Applies `transform` to every present field, passing the field name.
    pub fn map<U>(
        self,
        mut transform: impl FnMut(CredentialField, T) -> U,
    ) -> CredentialFields<U> {
        CredentialFields {
            account_number: self
                .account_number
                .map(|value| transform(CredentialField::AccountNumber, value)),
            username: self
                .username
                .map(|value| transform(CredentialField::Username, value)),
            password: self
                .password
                .map(|value| transform(CredentialField::Password, value)),
            pin: self.pin.map(|value| transform(CredentialField::Pin, value)),
        }
    }

    /// Fallible variant of [`Self::map`]; stops at the first error.
    pub fn try_map<U, E>(
        self,
        mut transform: impl FnMut(CredentialField, T) -> Result<U, E>,
    ) -> Result<CredentialFields<U>, E> {
        Ok(CredentialFields {
            account_number: self
                .account_number
                .map(|value| transform(CredentialField::AccountNumber, value))
                .transpose()?,
            username: self
                .username
                .map(|value| transform(CredentialField::Username, value))
                .transpose()?,
            password: self
                .password
                .map(|value| transform(CredentialField::Password, value))
                .transpose()?,
            pin: self
                .pin
                .map(|value| transform(CredentialField::Pin, value))
                .transpose()?,
        })
    }

    /// Borrows every field.
    #[must_use]
    pub fn as_ref(&self) -> CredentialFields<&T> {
        CredentialFields {
            account_number: self.account_number.as_ref(),
            username: self.username.as_ref(),
            password: self.password.as_ref(),
            pin: self.pin.as_ref(),
        }
    }
}

impl<T> CredentialFields<Option<T>> {
    /// Drops fields whose inner value is absent.
    #[must_use]
    pub fn flatten(self) -> CredentialFields<T> {
        CredentialFields {
            account_number: self.account_number.flatten(),
            username: self.username.flatten(),
            password: self.password.flatten(),
            pin: self.pin.flatten(),
        }
    }
}

impl CredentialFields<String> {
    /// Treats empty strings as "not set".
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            account_number: self.account_number.filter(|value| !value.is_empty()),
            username: self.username.filter(|value| !value.is_empty()),
            password: self.password.filter(|value| !value.is_empty()),
            pin: self.pin.filter(|value| !value.is_empty()),
        }
    }
}

impl<T> Default for CredentialFields<T> {
    fn default() -> Self {
        Self::empty()
    }
}

// Values are redacted so plaintext bundles never end up in logs.
impl<T> Debug for CredentialFields<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let presence = |value: &Option<T>| if value.is_some() { "<set>" } else { "<unset>" };
        formatter
            .debug_struct("CredentialFields")
            .field("account_number", &presence(&self.account_number))
            .field("username", &presence(&self.username))
            .field("password", &presence(&self.password))
            .field("pin", &presence(&self.pin))
            .finish()
    }
}

/// Per-field change requested by a partial update.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum FieldChange {
    /// Leave the stored value untouched.
    #[default]
    Keep,
    /// Remove the stored value.
    Clear,
    /// Replace the stored value.
    Set(String),
}

impl Debug for FieldChange {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keep => formatter.write_str("Keep"),
            Self::Clear => formatter.write_str("Clear"),
            Self::Set(_) => formatter.write_str("Set(<redacted>)"),
        }
    }
}

impl FieldChange {
    /// Interprets a transport value: missing keeps, empty clears.
    #[must_use]
    pub fn from_transport(value: Option<String>) -> Self {
        match value {
            None => Self::Keep,
            Some(value) if value.is_empty() => Self::Clear,
            Some(value) => Self::Set(value),
        }
    }

    /// Applies the change to a plaintext value.
    #[must_use]
    pub fn apply(self, current: Option<String>) -> Option<String> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }
}

/// Plaintext, non-sensitive fields stored beside the envelopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialMetadata {
    /// Login website.
    pub website: Option<String>,
    /// Support phone number.
    pub phone: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Partial update of a credential bundle.
///
/// Untouched secret fields keep their stored envelope byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPatch {
    /// Account number change.
    pub account_number: FieldChange,
    /// Username change.
    pub username: FieldChange,
    /// Password change.
    pub password: FieldChange,
    /// PIN change.
    pub pin: FieldChange,
    /// Website change.
    pub website: FieldChange,
    /// Phone change.
    pub phone: FieldChange,
    /// Notes change.
    pub notes: FieldChange,
}

impl CredentialPatch {
    /// Returns the change requested for one secret field.
    #[must_use]
    pub fn secret_change(&self, field: CredentialField) -> &FieldChange {
        match field {
            CredentialField::AccountNumber => &self.account_number,
            CredentialField::Username => &self.username,
            CredentialField::Password => &self.password,
            CredentialField::Pin => &self.pin,
        }
    }

    /// Returns whether the patch changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        [
            &self.account_number,
            &self.username,
            &self.password,
            &self.pin,
            &self.website,
            &self.phone,
            &self.notes,
        ]
        .into_iter()
        .all(|change| *change == FieldChange::Keep)
    }

    /// Applies the metadata part of the patch.
    #[must_use]
    pub fn apply_metadata(&self, current: CredentialMetadata) -> CredentialMetadata {
        CredentialMetadata {
            website: self.website.clone().apply(current.website),
            phone: self.phone.clone().apply(current.phone),
            notes: self.notes.clone().apply(current.notes),
        }
    }
}

/// Encrypted credential bundle attached to exactly one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedCredentialBundle {
    /// Family partition.
    pub family_id: FamilyId,
    /// Owning resource; also the bundle's unique key.
    pub resource: ResourceRef,
    /// Sealed sensitive fields.
    pub fields: CredentialFields<Envelope>,
    /// Plaintext metadata.
    pub metadata: CredentialMetadata,
}

/// Decrypted, response-ready view of a credential bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialBundleView {
    /// Plaintext sensitive fields; `None` when absent or unrecoverable.
    pub fields: CredentialFields<String>,
    /// Plaintext metadata.
    pub metadata: CredentialMetadata,
}

#[cfg(test)]
mod tests {
    use super::{
        CredentialField, CredentialFields, CredentialMetadata, CredentialPatch, FieldChange,
    };

    #[test]
    fn normalized_drops_empty_strings_only() {
        let fields = CredentialFields {
            account_number: Some(String::new()),
            username: Some(" ".to_owned()),
            password: Some("secret".to_owned()),
            pin: None,
        }
        .normalized();

        assert_eq!(fields.account_number, None);
        assert_eq!(fields.username.as_deref(), Some(" "));
        assert_eq!(fields.password.as_deref(), Some("secret"));
        assert!(fields.pin.is_none());
    }

    #[test]
    fn debug_output_redacts_values() {
        let fields = CredentialFields {
            password: Some("hunter2".to_owned()),
            ..CredentialFields::empty()
        };
        let rendered = format!("{fields:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<set>"));
    }

    #[test]
    fn patch_debug_output_hides_new_values() {
        let patch = CredentialPatch {
            pin: FieldChange::Set("8642".to_owned()),
            phone: FieldChange::Clear,
            ..CredentialPatch::default()
        };
        let rendered = format!("{patch:?}");
        assert!(!rendered.contains("8642"));
        assert!(rendered.contains("Set(<redacted>)"));
        assert!(rendered.contains("Clear"));
    }

    #[test]
    fn try_map_reports_field_names() {
        let fields = CredentialFields {
            pin: Some("1234".to_owned()),
            ..CredentialFields::empty()
        };
        let visited: Result<CredentialFields<CredentialField>, ()> =
            fields.try_map(|field, _| Ok(field));
        assert_eq!(
            visited.ok().and_then(|fields| fields.pin),
            Some(CredentialField::Pin)
        );
    }

    #[test]
    fn field_change_from_transport() {
        assert_eq!(FieldChange::from_transport(None), FieldChange::Keep);
        assert_eq!(
            FieldChange::from_transport(Some(String::new())),
            FieldChange::Clear
        );
        assert_eq!(
            FieldChange::from_transport(Some("x".to_owned())).apply(None),
            Some("x".to_owned())
        );
    }

    #[test]
    fn patch_metadata_keeps_untouched_values() {
        let patch = CredentialPatch {
            phone: FieldChange::Clear,
            notes: FieldChange::Set("autopay on the 5th".to_owned()),
            ..CredentialPatch::default()
        };
        assert!(!patch.is_noop());
        assert_eq!(
            patch.secret_change(CredentialField::Password),
            &FieldChange::Keep
        );
        let metadata = patch.apply_metadata(CredentialMetadata {
            website: Some("https://power.example".to_owned()),
            phone: Some("555-0100".to_owned()),
            notes: None,
        });
        assert_eq!(metadata.website.as_deref(), Some("https://power.example"));
        assert_eq!(metadata.phone, None);
        assert_eq!(metadata.notes.as_deref(), Some("autopay on the 5th"));
        assert!(CredentialPatch::default().is_noop());
    }
}
