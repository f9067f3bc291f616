pub mod extensions;
pub mod params;

use der::{Decode, Encode, EncodePem};
use extensions::{BasicConstraints, SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension};
use params::DistinguishedName;
use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use sha2::Sha256;
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::error::{CertGenError, Result};

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats and to
/// read back the fields this crate issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Parses a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| CertGenError::DecodingError(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertGenError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(der::pem::LineEnding::LF)
            .map_err(|e| CertGenError::EncodingError(e.to_string()))
    }

    pub fn subject_name(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer_name(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(self.subject_name())
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(self.issuer_name())
    }

    /// Serial number as lower-case hex.
    pub fn serial_number_hex(&self) -> String {
        self.inner
            .tbs_certificate
            .serial_number
            .as_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    pub fn not_before(&self) -> OffsetDateTime {
        OffsetDateTime::from(self.inner.tbs_certificate.validity.not_before.to_system_time())
    }

    pub fn not_after(&self) -> OffsetDateTime {
        OffsetDateTime::from(self.inner.tbs_certificate.validity.not_after.to_system_time())
    }

    /// Decodes the first extension of type `E`, if the certificate has one.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
            .transpose()
    }

    /// True when Basic Constraints marks the certificate as a CA.
    pub fn is_ca(&self) -> Result<bool> {
        Ok(self
            .extension::<BasicConstraints>()?
            .map(|bc| bc.is_ca)
            .unwrap_or(false))
    }

    /// The Subject Alternative Names, empty when the extension is absent.
    pub fn subject_alt_name(&self) -> Result<SubjectAltName> {
        Ok(self.extension::<SubjectAltName>()?.unwrap_or_default())
    }

    pub fn subject_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.extension::<SubjectKeyIdentifier>()?.map(|ski| ski.0))
    }

    /// Human readable name of the subject public key algorithm.
    pub fn public_key_algorithm(&self) -> String {
        let oid = self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .algorithm
            .oid;
        match oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => "RSA".to_string(),
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => "ECDSA".to_string(),
            const_oid::db::rfc8410::ID_ED_25519 => "Ed25519".to_string(),
            other => other.to_string(),
        }
    }

    /// Checks the certificate signature against an issuer's RSA public key.
    pub fn verify_signature(&self, issuer_key: &RsaPublicKey) -> Result<()> {
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = Signature::try_from(self.inner.signature.raw_bytes())
            .map_err(|e| CertGenError::DecodingError(e.to_string()))?;
        VerifyingKey::<Sha256>::new(issuer_key.clone())
            .verify(&tbs, &signature)
            .map_err(|e| CertGenError::SigningError(e.to_string()))
    }
}
