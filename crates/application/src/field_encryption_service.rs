//! Field-level encryption of credential secrets.
//!
//! Every field is sealed into its own envelope so fields can be updated and
//! recovered independently. Reads are fail-soft: a field that cannot be
//! opened is reported as absent and never fails the surrounding request.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use hearth_core::AppResult;
use hearth_domain::{CredentialField, CredentialFields, Envelope};
use tracing::warn;

/// Port for the authenticated cipher protecting single fields at rest.
///
/// Implementations are synchronous and CPU bound.
pub trait FieldCipher: Send + Sync {
    /// Encrypts one plaintext into a self-contained envelope.
    fn seal(&self, plaintext: &str) -> AppResult<Envelope>;

    /// Opens an envelope produced by [`FieldCipher::seal`].
    fn open(&self, envelope: &Envelope) -> Result<String, OpenFailure>;
}

/// Reason an envelope could not be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    /// The envelope is not valid base64.
    Encoding,
    /// The decoded envelope is shorter than nonce plus tag.
    Truncated,
    /// Tag verification failed: tampered data or a different key.
    Authentication,
    /// The decrypted bytes are not UTF-8.
    Utf8,
}

impl Display for OpenFailure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Encoding => "invalid envelope encoding",
            Self::Truncated => "envelope too short",
            Self::Authentication => "authentication failed",
            Self::Utf8 => "plaintext is not valid utf-8",
        };
        formatter.write_str(reason)
    }
}

/// Outcome of opening an optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDecryption {
    /// No envelope was stored.
    Absent,
    /// The envelope opened successfully.
    Plaintext(String),
    /// An envelope was stored but could not be opened.
    Unrecoverable(OpenFailure),
}

impl FieldDecryption {
    /// Collapses the outcome to the plaintext, if any.
    #[must_use]
    pub fn into_plaintext(self) -> Option<String> {
        match self {
            Self::Plaintext(value) => Some(value),
            Self::Absent | Self::Unrecoverable(_) => None,
        }
    }
}

/// Application service applying a [`FieldCipher`] to optional fields and
/// credential bundles.
#[derive(Clone)]
pub struct FieldEncryptionService {
    cipher: Arc<dyn FieldCipher>,
}

impl FieldEncryptionService {
    /// Creates a new field encryption service.
    #[must_use]
    pub fn new(cipher: Arc<dyn FieldCipher>) -> Self {
        Self { cipher }
    }

    /// Encrypts an optional plaintext. Absent input stays absent.
    pub fn encrypt_field(&self, plaintext: Option<&str>) -> AppResult<Option<Envelope>> {
        plaintext.map(|value| self.cipher.seal(value)).transpose()
    }

    /// Decrypts an optional envelope. Absent or unrecoverable input yields
    /// `None`.
    #[must_use]
    pub fn decrypt_field(&self, envelope: Option<&Envelope>) -> Option<String> {
        self.try_decrypt_field(envelope).into_plaintext()
    }

    /// Decrypts an optional envelope and reports why a value is missing.
    #[must_use]
    pub fn try_decrypt_field(&self, envelope: Option<&Envelope>) -> FieldDecryption {
        let Some(envelope) = envelope else {
            return FieldDecryption::Absent;
        };

        match self.cipher.open(envelope) {
            Ok(plaintext) => FieldDecryption::Plaintext(plaintext),
            Err(failure) => FieldDecryption::Unrecoverable(failure),
        }
    }

    /// Encrypts every present field of a credential bundle.
    pub fn encrypt_credentials(
        &self,
        fields: CredentialFields<String>,
    ) -> AppResult<CredentialFields<Envelope>> {
        fields.try_map(|_, value| self.cipher.seal(&value))
    }

    /// Decrypts every present field of a credential bundle. Fields that
    /// cannot be opened are dropped and logged by name.
    #[must_use]
    pub fn decrypt_credentials(
        &self,
        fields: &CredentialFields<Envelope>,
    ) -> CredentialFields<String> {
        fields
            .as_ref()
            .map(|field, envelope| match self.cipher.open(envelope) {
                Ok(plaintext) => Some(plaintext),
                Err(failure) => {
                    log_unrecoverable(field, failure);
                    None
                }
            })
            .flatten()
    }

    /// Decrypts every present field and keeps the per-field outcome.
    #[must_use]
    pub fn try_decrypt_credentials(
        &self,
        fields: &CredentialFields<Envelope>,
    ) -> CredentialFields<FieldDecryption> {
        fields
            .as_ref()
            .map(|_, envelope| self.try_decrypt_field(Some(envelope)))
    }
}

fn log_unrecoverable(field: CredentialField, failure: OpenFailure) {
    warn!(field = field.as_str(), %failure, "credential field could not be decrypted");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hearth_core::{AppError, AppResult};
    use hearth_domain::{CredentialFields, Envelope};

    use super::{FieldCipher, FieldDecryption, FieldEncryptionService, OpenFailure};

    /// Reversible stand-in cipher: envelopes are `sealed:<plaintext>`.
    struct PrefixCipher;

    impl FieldCipher for PrefixCipher {
        fn seal(&self, plaintext: &str) -> AppResult<Envelope> {
            if plaintext == "unsealable" {
                return Err(AppError::Internal("failed to encrypt field".to_owned()));
            }
            Ok(Envelope::new(format!("sealed:{plaintext}")))
        }

        fn open(&self, envelope: &Envelope) -> Result<String, OpenFailure> {
            envelope
                .as_str()
                .strip_prefix("sealed:")
                .map(str::to_owned)
                .ok_or(OpenFailure::Authentication)
        }
    }

    fn service() -> FieldEncryptionService {
        FieldEncryptionService::new(Arc::new(PrefixCipher))
    }

    #[test]
    fn absent_field_stays_absent_both_ways() -> AppResult<()> {
        let service = service();

        assert_eq!(service.encrypt_field(None)?, None);
        assert_eq!(service.decrypt_field(None), None);
        assert_eq!(service.try_decrypt_field(None), FieldDecryption::Absent);
        Ok(())
    }

    #[test]
    fn present_field_round_trips() -> AppResult<()> {
        let service = service();

        let envelope = service.encrypt_field(Some("hunter2"))?;
        assert_eq!(
            service.decrypt_field(envelope.as_ref()),
            Some("hunter2".to_owned())
        );
        Ok(())
    }

    #[test]
    fn unreadable_envelope_is_distinguished_from_absent() {
        let service = service();
        let corrupt = Envelope::new("garbage");

        assert_eq!(service.decrypt_field(Some(&corrupt)), None);
        assert_eq!(
            service.try_decrypt_field(Some(&corrupt)),
            FieldDecryption::Unrecoverable(OpenFailure::Authentication)
        );
    }

    #[test]
    fn encryption_failure_propagates() {
        let service = service();

        let result = service.encrypt_field(Some("unsealable"));
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn credentials_are_processed_per_field() -> AppResult<()> {
        let service = service();
        let fields = CredentialFields {
            account_number: Some("12345".to_owned()),
            username: None,
            password: Some("secret".to_owned()),
            pin: None,
        };

        let mut sealed = service.encrypt_credentials(fields)?;
        assert_eq!(sealed.username, None);
        assert_eq!(sealed.pin, None);

        sealed.account_number = Some(Envelope::new("tampered"));
        let opened = service.decrypt_credentials(&sealed);
        assert_eq!(opened.account_number, None);
        assert_eq!(opened.password, Some("secret".to_owned()));
        assert_eq!(opened.username, None);
        Ok(())
    }
}
