//! Certificate request profiles, as gathered from a requester.

use bon::Builder;

use crate::error::{CertGenError, Result};
use crate::pem_bundle::PemBundle;

/// The kinds of certificate the issuer produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CertificateKind {
    /// A self-signed certificate authority.
    CertificateAuthority,
    /// A leaf certificate with caller supplied DNS and IP names.
    ServerCertificate,
    /// A leaf certificate named after a Kubernetes in-cluster service, plus any caller
    /// supplied names.
    KubernetesServiceCertificate,
}

impl CertificateKind {
    pub fn is_ca(self) -> bool {
        self == CertificateKind::CertificateAuthority
    }
}

/// Identifies a Kubernetes service: `{env_name}-{service_name}` in `namespace`.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct KubeService {
    #[builder(into)]
    pub service_name: String,
    #[builder(into)]
    pub env_name: String,
    #[builder(into)]
    pub namespace: String,
}

/// Raw DER of the CA certificate and private key a leaf is to be signed with.
///
/// Nothing is parsed until issuance; see [`crate::issuer::SigningAuthority`].
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct AuthorityMaterial {
    pub certificate_der: Vec<u8>,
    pub private_key_der: Vec<u8>,
}

impl AuthorityMaterial {
    pub fn is_empty(&self) -> bool {
        self.certificate_der.is_empty() || self.private_key_der.is_empty()
    }

    /// Takes the certificate and key out of an extracted PEM bundle.
    ///
    /// # Errors
    /// `InvalidInput` when either half is missing from the bundle.
    pub fn from_pem_bundle(bundle: PemBundle) -> Result<Self> {
        match (bundle.certificate_der, bundle.private_key_der) {
            (Some(certificate_der), Some(private_key_der)) => Ok(Self {
                certificate_der,
                private_key_der,
            }),
            (None, _) => Err(CertGenError::InvalidInput(
                "CA material has no certificate block".to_string(),
            )),
            (_, None) => Err(CertGenError::InvalidInput(
                "CA material has no private key block".to_string(),
            )),
        }
    }
}

/// Everything needed to issue one certificate.
///
/// `dns_names` and `ip_addresses` hold the raw comma separated input; an empty string
/// means none were supplied.
#[derive(Clone, Debug, Builder)]
pub struct CertificateRequestProfile {
    pub kind: CertificateKind,
    #[builder(into)]
    pub organization: String,
    #[builder(into)]
    pub country: String,
    #[builder(into)]
    pub common_name: String,
    #[builder(into, default)]
    pub dns_names: String,
    #[builder(into, default)]
    pub ip_addresses: String,
    pub kube_service: Option<KubeService>,
    pub signing_authority: Option<AuthorityMaterial>,
}

impl CertificateRequestProfile {
    /// Checks that the profile is complete enough to issue from.
    ///
    /// Subject fields must be non-empty, Kubernetes requests need a fully named service and
    /// every leaf request needs CA material. CA material on a CA request is ignored.
    pub fn validate(&self) -> Result<()> {
        self.validate_fields()?;

        let has_authority = self
            .signing_authority
            .as_ref()
            .is_some_and(|material| !material.is_empty());
        if !self.kind.is_ca() && !has_authority {
            return Err(CertGenError::InvalidInput(
                "a CA certificate and private key are required to sign this certificate"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Checks the subject fields and Kubernetes details, leaving CA material aside.
    pub(crate) fn validate_fields(&self) -> Result<()> {
        for (field, value) in [
            ("organization", &self.organization),
            ("country", &self.country),
            ("common name", &self.common_name),
        ] {
            if value.trim().is_empty() {
                return Err(CertGenError::InvalidInput(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }

        if self.kind == CertificateKind::KubernetesServiceCertificate {
            self.require_kube_service()?;
        }

        Ok(())
    }

    pub(crate) fn require_kube_service(&self) -> Result<&KubeService> {
        let service = self.kube_service.as_ref().ok_or_else(|| {
            CertGenError::InvalidInput("Kubernetes service details are missing".to_string())
        })?;
        if service.service_name.is_empty()
            || service.env_name.is_empty()
            || service.namespace.is_empty()
        {
            return Err(CertGenError::InvalidInput(
                "Kubernetes service name, environment and namespace are all required".to_string(),
            ));
        }
        Ok(service)
    }
}
