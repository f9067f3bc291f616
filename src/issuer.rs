use std::io::Write;

use der::Encode;
use der::asn1::BitString;
use tracing::{info, warn};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::config::IssuanceConfig;
use crate::error::{CertGenError, Result};
use crate::key::KeyPair;
use crate::pem_bundle::{PemBundle, extract_pem};
use crate::profile::{AuthorityMaterial, CertificateRequestProfile};
use crate::tbs_certificate::TbsCertificate;
use crate::template::{CertificateTemplate, compose_template_with};

/// Represents an entity capable of issuing certificates.
///
/// Implemented by a self-signing key ([`SelfIssuer`]) and by a previously issued CA
/// ([`SigningAuthority`]).
pub trait Issuer {
    /// Returns the name placed in the issuer field of signed certificates.
    fn issuer_name(&self) -> Result<Name>;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Key identifier for the Authority Key Identifier extension, `None` when self-signing.
    fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>>;

    /// Signs `template` over `subject_key`'s public half.
    ///
    /// # Errors
    /// `SigningError` when the certificate cannot be encoded or signed; `InvalidInput` when
    /// the template's subject cannot be encoded.
    fn issue(&self, template: &CertificateTemplate, subject_key: &KeyPair) -> Result<Certificate> {
        let signing_key = self.signing_key();
        let signature_algorithm = signing_key.signature_algorithm();

        let tbs_cert = TbsCertificate {
            serial_number: template.serial_number_bytes(),
            signature_algorithm: signature_algorithm.clone(),
            issuer: self.issuer_name()?,
            validity: template.validity.clone(),
            subject: template.subject.as_x509_name()?,
            subject_public_key: subject_key.as_spki().map_err(into_signing_error)?,
            extensions: template.extensions(
                subject_key.key_identifier().map_err(into_signing_error)?,
                self.authority_key_identifier()?,
            )?,
        };

        let tbs_cert_inner = tbs_cert
            .to_tbs_certificate_inner()
            .map_err(into_signing_error)?;
        let tbs_der = tbs_cert_inner
            .to_der()
            .map_err(|e| CertGenError::SigningError(e.to_string()))?;
        let signature = signing_key.sign_data(&tbs_der)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm,
            signature: BitString::from_bytes(&signature)
                .map_err(|e| CertGenError::SigningError(e.to_string()))?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

fn into_signing_error(err: CertGenError) -> CertGenError {
    match err {
        CertGenError::EncodingError(msg) | CertGenError::InvalidInput(msg) => {
            CertGenError::SigningError(msg)
        }
        other => other,
    }
}

/// A key signing its own certificate: the subject doubles as the issuer.
pub struct SelfIssuer<'a> {
    name: Name,
    key: &'a KeyPair,
}

impl<'a> SelfIssuer<'a> {
    pub fn new(template: &CertificateTemplate, key: &'a KeyPair) -> Result<Self> {
        Ok(Self {
            name: template.subject.as_x509_name()?,
            key,
        })
    }
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Result<Name> {
        Ok(self.name.clone())
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// A CA certificate together with the private key that signs for it.
///
/// Passed explicitly to every leaf issuance; nothing in the crate keeps one around
/// between calls.
#[derive(Debug, Clone)]
pub struct SigningAuthority {
    certificate: Certificate,
    key: KeyPair,
}

impl SigningAuthority {
    /// Pairs a CA certificate with its private key.
    ///
    /// # Errors
    /// `AuthorityParseError` when the key does not belong to the certificate.
    pub fn new(certificate: Certificate, key: KeyPair) -> Result<Self> {
        let spki = &certificate.inner.tbs_certificate.subject_public_key_info;
        if !key.matches_spki(spki)? {
            warn!(
                subject = %certificate.subject_name(),
                "CA private key does not match the CA certificate"
            );
            return Err(CertGenError::AuthorityParseError(
                "private key does not match the CA certificate's public key".to_string(),
            ));
        }
        if !certificate.is_ca().unwrap_or(false) {
            warn!(
                subject = %certificate.subject_name(),
                "signing with a certificate that is not marked as a CA"
            );
        }
        Ok(Self { certificate, key })
    }

    /// Parses a DER certificate and a DER (PKCS#1 or PKCS#8) RSA private key.
    pub fn from_der(certificate_der: &[u8], private_key_der: &[u8]) -> Result<Self> {
        let certificate = Certificate::from_der(certificate_der).map_err(|e| {
            CertGenError::AuthorityParseError(format!("CA certificate: {}", e))
        })?;
        let key = KeyPair::from_der(private_key_der).map_err(|e| {
            CertGenError::AuthorityParseError(format!("CA private key: {}", e))
        })?;
        Self::new(certificate, key)
    }

    pub fn from_material(material: &AuthorityMaterial) -> Result<Self> {
        Self::from_der(&material.certificate_der, &material.private_key_der)
    }

    /// Builds an authority from extracted PEM blocks; both must be present.
    pub fn from_pem_bundle(bundle: PemBundle) -> Result<Self> {
        let material = AuthorityMaterial::from_pem_bundle(bundle)
            .map_err(|e| CertGenError::AuthorityParseError(e.to_string()))?;
        Self::from_material(&material)
    }

    /// Reads a CA certificate and key, in either order, from one PEM stream.
    pub fn from_pem<R: std::io::Read>(stream: R) -> Result<Self> {
        Self::from_pem_bundle(extract_pem(stream)?)
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }
}

impl Issuer for SigningAuthority {
    fn issuer_name(&self) -> Result<Name> {
        // The name of the issuer is the subject of the CA certificate
        Ok(self.certificate.subject_name().clone())
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        match self.certificate.subject_key_identifier()? {
            Some(ski) => Ok(Some(ski)),
            None => Ok(Some(self.key.key_identifier()?)),
        }
    }
}

/// The outcome of one issuance: the signed certificate and its freshly generated key.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    pub certificate_pem: String,
    pub private_key_pem: String,
    private_key: KeyPair,
}

impl IssuedCertificate {
    fn new(certificate: Certificate, private_key: KeyPair) -> Result<Self> {
        Ok(Self {
            certificate_pem: certificate.to_pem()?,
            private_key_pem: private_key.to_pem()?,
            certificate,
            private_key,
        })
    }

    pub fn private_key(&self) -> &KeyPair {
        &self.private_key
    }

    pub fn certificate_der(&self) -> Result<Vec<u8>> {
        self.certificate.to_der()
    }

    pub fn private_key_der(&self) -> Result<Vec<u8>> {
        self.private_key.to_pkcs1_der()
    }

    /// Certificate block followed by private key block.
    pub fn to_pem(&self) -> String {
        format!("{}{}", self.certificate_pem, self.private_key_pem)
    }

    /// Writes [`Self::to_pem`] to `sink` in a single write.
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<()> {
        sink.write_all(self.to_pem().as_bytes())
            .and_then(|_| sink.flush())
            .map_err(|e| CertGenError::SinkWriteError(e.to_string()))
    }

    /// Uses this certificate and its key to sign further certificates.
    pub fn signing_authority(&self) -> Result<SigningAuthority> {
        SigningAuthority::new(self.certificate.clone(), self.private_key.clone())
    }
}

/// Issues certificates according to an [`IssuanceConfig`].
#[derive(Debug, Clone, Default)]
pub struct CertificateIssuer {
    config: IssuanceConfig,
}

impl CertificateIssuer {
    pub fn new(config: IssuanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IssuanceConfig {
        &self.config
    }

    /// Issues the certificate described by `profile`.
    ///
    /// CA requests are self-signed with the new key. Leaf requests are signed by the CA
    /// material carried in the profile, parsed afresh for this call.
    pub fn issue(&self, profile: &CertificateRequestProfile) -> Result<IssuedCertificate> {
        profile.validate()?;

        if profile.kind.is_ca() {
            let template = compose_template_with(profile, &self.config)?;
            let key = KeyPair::generate_rsa(self.config.rsa_key_bits)?;
            let certificate = SelfIssuer::new(&template, &key)?.issue(&template, &key)?;
            return self.finish(profile, certificate, key);
        }

        let material = profile.signing_authority.as_ref().ok_or_else(|| {
            CertGenError::InvalidInput("missing CA material".to_string())
        })?;
        let authority = SigningAuthority::from_material(material)?;
        self.issue_leaf(profile, &authority)
    }

    /// Issues a leaf certificate signed by `authority`, ignoring any CA material in the
    /// profile.
    pub fn issue_with_authority(
        &self,
        profile: &CertificateRequestProfile,
        authority: &SigningAuthority,
    ) -> Result<IssuedCertificate> {
        if profile.kind.is_ca() {
            return Err(CertGenError::InvalidInput(
                "CA certificates are self-signed and take no signing authority".to_string(),
            ));
        }
        profile.validate_fields()?;
        self.issue_leaf(profile, authority)
    }

    /// Issues the certificate described by `profile` and writes certificate then key PEM
    /// to `sink`. Nothing is written unless issuance succeeds.
    pub fn issue_certificate<W: Write>(
        &self,
        profile: &CertificateRequestProfile,
        sink: W,
    ) -> Result<()> {
        self.issue(profile)?.write_to(sink)
    }

    fn issue_leaf(
        &self,
        profile: &CertificateRequestProfile,
        authority: &SigningAuthority,
    ) -> Result<IssuedCertificate> {
        let template = compose_template_with(profile, &self.config)?;
        let key = KeyPair::generate_rsa(self.config.rsa_key_bits)?;
        let certificate = authority.issue(&template, &key)?;
        self.finish(profile, certificate, key)
    }

    fn finish(
        &self,
        profile: &CertificateRequestProfile,
        certificate: Certificate,
        key: KeyPair,
    ) -> Result<IssuedCertificate> {
        let issued = IssuedCertificate::new(certificate, key)?;
        info!(
            kind = ?profile.kind,
            serial = %issued.certificate.serial_number_hex(),
            subject = %issued.certificate.subject_name(),
            issuer = %issued.certificate.issuer_name(),
            "issued certificate"
        );
        Ok(issued)
    }
}

/// Issues the certificate described by `profile` with the default configuration and
/// writes certificate then key PEM to `sink`.
pub fn issue_certificate<W: Write>(profile: &CertificateRequestProfile, sink: W) -> Result<()> {
    CertificateIssuer::default().issue_certificate(profile, sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_without_key_is_an_authority_error() {
        let bundle = PemBundle {
            certificate_der: Some(vec![0x30, 0x00]),
            private_key_der: None,
        };
        let err = SigningAuthority::from_pem_bundle(bundle).unwrap_err();
        assert!(matches!(err, CertGenError::AuthorityParseError(_)));
    }

    #[test]
    fn empty_stream_is_a_pem_error() {
        let err = SigningAuthority::from_pem(&b""[..]).unwrap_err();
        assert!(matches!(err, CertGenError::PemDecodeError(_)));
    }

    #[test]
    fn authority_errors_pass_through_signing_error_mapping() {
        let err = into_signing_error(CertGenError::AuthorityParseError("x".to_string()));
        assert_eq!(err, CertGenError::AuthorityParseError("x".to_string()));
        let err = into_signing_error(CertGenError::EncodingError("y".to_string()));
        assert_eq!(err, CertGenError::SigningError("y".to_string()));
    }
}
