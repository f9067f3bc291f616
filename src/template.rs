//! Translation of request profiles into certificate templates.

use std::net::{IpAddr, Ipv4Addr};

use rand::Rng;
use tracing::{debug, warn};

use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, FlagSet,
    KeyUsage, KeyUsages, SubjectAltName, SubjectKeyIdentifier,
};
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::config::{IpLiteralPolicy, IssuanceConfig};
use crate::error::{CertGenError, Result};
use crate::profile::{CertificateKind, CertificateRequestProfile, KubeService};

/// Serials are drawn from `1..=MAX_SERIAL`, i.e. 63 random bits.
///
/// Nothing tracks issued serials, so two certificates from the same CA may collide.
pub const MAX_SERIAL: u64 = i64::MAX as u64;

/// A fully specified certificate, minus keys and signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateTemplate {
    pub serial_number: u64,
    pub subject: DistinguishedName,
    pub san_dns_names: Vec<String>,
    /// `None` marks a literal kept under [`IpLiteralPolicy::Lenient`] that did not parse.
    pub san_ip_addresses: Vec<Option<IpAddr>>,
    pub validity: Validity,
    pub is_certificate_authority: bool,
    pub key_usage: KeyUsage,
    pub extended_key_usage: ExtendedKeyUsage,
}

impl CertificateTemplate {
    /// Serial number as a minimal, positive, big-endian DER integer body.
    pub fn serial_number_bytes(&self) -> Vec<u8> {
        let bytes = self.serial_number.to_be_bytes();
        let first = bytes
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(bytes.len() - 1);
        let mut serial = bytes[first..].to_vec();
        if serial[0] & 0x80 != 0 {
            serial.insert(0, 0);
        }
        serial
    }

    pub fn subject_alt_name(&self) -> SubjectAltName {
        SubjectAltName {
            dns_names: self.san_dns_names.clone(),
            ip_addresses: self.san_ip_addresses.clone(),
        }
    }

    /// The extensions to encode, in order.
    ///
    /// `authority_key_id` is `None` for self-signed certificates.
    pub fn extensions(
        &self,
        subject_key_id: Vec<u8>,
        authority_key_id: Option<Vec<u8>>,
    ) -> Result<Vec<ExtensionParam>> {
        let mut extensions = vec![
            ExtensionParam::from_extension(self.key_usage, true)?,
            ExtensionParam::from_extension(self.extended_key_usage.clone(), false)?,
            ExtensionParam::from_extension(
                BasicConstraints {
                    is_ca: self.is_certificate_authority,
                    max_path_length: None,
                },
                true,
            )?,
            ExtensionParam::from_extension(SubjectKeyIdentifier(subject_key_id), false)?,
        ];

        if let Some(key_identifier) = authority_key_id {
            extensions.push(ExtensionParam::from_extension(
                AuthorityKeyIdentifier { key_identifier },
                false,
            )?);
        }

        let san = self.subject_alt_name();
        if !san.is_empty() {
            extensions.push(ExtensionParam::from_extension(san, false)?);
        }

        Ok(extensions)
    }
}

/// Builds a template from `profile` with the default configuration.
pub fn compose_template(profile: &CertificateRequestProfile) -> Result<CertificateTemplate> {
    compose_template_with(profile, &IssuanceConfig::default())
}

/// Builds a template from `profile`.
///
/// Kubernetes requests start from [`kubernetes_san_seed`] and then take the caller's names
/// exactly as server requests do. CA requests carry no SANs.
pub fn compose_template_with(
    profile: &CertificateRequestProfile,
    config: &IssuanceConfig,
) -> Result<CertificateTemplate> {
    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    let mut key_usage: FlagSet<KeyUsages> = KeyUsages::DigitalSignature.into();
    let mut is_certificate_authority = false;

    match profile.kind {
        CertificateKind::KubernetesServiceCertificate => {
            let (seed_dns, seed_ips) = kubernetes_san_seed(profile.require_kube_service()?);
            dns_names = seed_dns;
            ip_addresses = seed_ips;
            append_server_sans(profile, config.ip_policy, &mut dns_names, &mut ip_addresses)?;
        }
        CertificateKind::ServerCertificate => {
            append_server_sans(profile, config.ip_policy, &mut dns_names, &mut ip_addresses)?;
        }
        CertificateKind::CertificateAuthority => {
            key_usage = KeyUsages::DigitalSignature | KeyUsages::KeyCertSign;
            is_certificate_authority = true;
        }
    }

    let template = CertificateTemplate {
        serial_number: rand::rng().random_range(1..=MAX_SERIAL),
        subject: DistinguishedName {
            common_name: profile.common_name.clone(),
            organization: profile.organization.clone(),
            country: profile.country.clone(),
        },
        san_dns_names: dns_names,
        san_ip_addresses: ip_addresses,
        validity: Validity::for_years(config.validity_years)?,
        is_certificate_authority,
        key_usage: KeyUsage(key_usage),
        extended_key_usage: ExtendedKeyUsage {
            usage: vec![
                ExtendedKeyUsageOption::ClientAuth,
                ExtendedKeyUsageOption::ServerAuth,
            ],
        },
    };

    debug!(
        kind = ?profile.kind,
        serial = template.serial_number,
        dns_names = template.san_dns_names.len(),
        ip_addresses = template.san_ip_addresses.len(),
        "composed certificate template"
    );
    Ok(template)
}

/// The names every in-cluster client may use to reach `service`, and the loopback address.
pub fn kubernetes_san_seed(service: &KubeService) -> (Vec<String>, Vec<Option<IpAddr>>) {
    let base = format!("{}-{}", service.env_name, service.service_name);
    let dns_names = vec![
        "localhost".to_string(),
        base.clone(),
        format!("{}.{}", base, service.namespace),
        format!("{}.{}.svc", base, service.namespace),
        format!("{}.{}.svc.cluster.local", base, service.namespace),
    ];
    (dns_names, vec![Some(IpAddr::V4(Ipv4Addr::LOCALHOST))])
}

/// Appends the caller's comma separated DNS names and IP literals.
fn append_server_sans(
    profile: &CertificateRequestProfile,
    policy: IpLiteralPolicy,
    dns_names: &mut Vec<String>,
    ip_addresses: &mut Vec<Option<IpAddr>>,
) -> Result<()> {
    dns_names.extend(split_list(&profile.dns_names).map(str::to_string));

    for literal in split_list(&profile.ip_addresses) {
        match literal.parse::<IpAddr>() {
            Ok(ip) => ip_addresses.push(Some(ip)),
            Err(_) if policy == IpLiteralPolicy::Lenient => {
                warn!(literal, "keeping unparseable IP address as an empty SAN entry");
                ip_addresses.push(None);
            }
            Err(_) => {
                return Err(CertGenError::InvalidInput(format!(
                    "{:?} is not an IP address",
                    literal
                )));
            }
        }
    }

    Ok(())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::ToAndFromX509Extension;

    fn profile(kind: CertificateKind) -> CertificateRequestProfile {
        CertificateRequestProfile::builder()
            .kind(kind)
            .organization("Acme")
            .country("NL")
            .common_name("api.acme.test")
            .build()
    }

    fn prod_api() -> KubeService {
        KubeService::builder()
            .service_name("api")
            .env_name("prod")
            .namespace("ns1")
            .build()
    }

    #[test]
    fn kubernetes_names_come_first() {
        let mut profile = profile(CertificateKind::KubernetesServiceCertificate);
        profile.kube_service = Some(prod_api());
        profile.dns_names = "api.example.com".to_string();
        profile.ip_addresses = "10.0.0.7".to_string();

        let template = compose_template(&profile).unwrap();
        assert_eq!(
            template.san_dns_names,
            vec![
                "localhost",
                "prod-api",
                "prod-api.ns1",
                "prod-api.ns1.svc",
                "prod-api.ns1.svc.cluster.local",
                "api.example.com",
            ]
        );
        assert_eq!(
            template.san_ip_addresses,
            vec![
                Some("127.0.0.1".parse().unwrap()),
                Some("10.0.0.7".parse().unwrap()),
            ]
        );
        assert!(!template.is_certificate_authority);
    }

    #[test]
    fn kubernetes_seed_alone() {
        let mut profile = profile(CertificateKind::KubernetesServiceCertificate);
        profile.kube_service = Some(prod_api());

        let template = compose_template(&profile).unwrap();
        assert_eq!(template.san_dns_names.len(), 5);
        assert_eq!(
            template.san_ip_addresses,
            vec![Some(IpAddr::V4(Ipv4Addr::LOCALHOST))]
        );
    }

    #[test]
    fn kubernetes_without_service_is_rejected() {
        let profile = profile(CertificateKind::KubernetesServiceCertificate);
        assert!(matches!(
            compose_template(&profile).unwrap_err(),
            CertGenError::InvalidInput(_)
        ));
    }

    #[test]
    fn server_lists_are_split_and_trimmed() {
        let mut profile = profile(CertificateKind::ServerCertificate);
        profile.dns_names = "a.com, b.com,,".to_string();
        profile.ip_addresses = "192.168.1.1,::1".to_string();

        let template = compose_template(&profile).unwrap();
        assert_eq!(template.san_dns_names, vec!["a.com", "b.com"]);
        assert_eq!(
            template.san_ip_addresses,
            vec![
                Some("192.168.1.1".parse().unwrap()),
                Some("::1".parse().unwrap()),
            ]
        );
        assert_eq!(template.key_usage, KeyUsage(KeyUsages::DigitalSignature.into()));
    }

    #[test]
    fn server_without_names_has_no_sans() {
        let template = compose_template(&profile(CertificateKind::ServerCertificate)).unwrap();
        assert!(template.subject_alt_name().is_empty());
    }

    #[test]
    fn malformed_ip_is_rejected_by_default() {
        let mut profile = profile(CertificateKind::ServerCertificate);
        profile.ip_addresses = "10.0.0.1,10.0.0.300".to_string();
        assert_eq!(
            compose_template(&profile).unwrap_err(),
            CertGenError::InvalidInput("\"10.0.0.300\" is not an IP address".to_string())
        );
    }

    #[test]
    fn malformed_ip_is_kept_when_lenient() {
        let mut profile = profile(CertificateKind::ServerCertificate);
        profile.ip_addresses = "10.0.0.1,not-an-ip".to_string();
        let config = IssuanceConfig::builder()
            .ip_policy(IpLiteralPolicy::Lenient)
            .build();

        let template = compose_template_with(&profile, &config).unwrap();
        assert_eq!(
            template.san_ip_addresses,
            vec![Some("10.0.0.1".parse().unwrap()), None]
        );
    }

    #[test]
    fn ca_template() {
        let mut profile = profile(CertificateKind::CertificateAuthority);
        profile.dns_names = "ignored.example".to_string();

        let template = compose_template(&profile).unwrap();
        assert!(template.is_certificate_authority);
        assert!(template.subject_alt_name().is_empty());
        assert_eq!(
            template.key_usage,
            KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyCertSign)
        );
    }

    #[test]
    fn shared_fields() {
        let template = compose_template(&profile(CertificateKind::ServerCertificate)).unwrap();
        assert_eq!(template.subject.common_name, "api.acme.test");
        assert_eq!(template.subject.organization, "Acme");
        assert_eq!(template.subject.country, "NL");
        assert!((1..=MAX_SERIAL).contains(&template.serial_number));
        assert_eq!(
            template.validity.not_after.year() - template.validity.not_before.year(),
            10
        );
        assert_eq!(
            template.extended_key_usage.usage,
            vec![
                ExtendedKeyUsageOption::ClientAuth,
                ExtendedKeyUsageOption::ServerAuth,
            ]
        );
    }

    #[test]
    fn serial_bytes_are_minimal_and_positive() {
        let mut template = compose_template(&profile(CertificateKind::ServerCertificate)).unwrap();

        template.serial_number = 0x7f;
        assert_eq!(template.serial_number_bytes(), vec![0x7f]);

        template.serial_number = 0x80;
        assert_eq!(template.serial_number_bytes(), vec![0x00, 0x80]);

        template.serial_number = MAX_SERIAL;
        assert_eq!(
            template.serial_number_bytes(),
            vec![0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn leaf_extensions_include_authority_key_id() {
        let template = compose_template(&profile(CertificateKind::ServerCertificate)).unwrap();
        let self_signed = template.extensions(vec![1; 20], None).unwrap();
        let signed = template.extensions(vec![1; 20], Some(vec![2; 20])).unwrap();
        assert_eq!(self_signed.len(), 4);
        assert_eq!(signed.len(), 5);
        assert_eq!(signed[4].oid, AuthorityKeyIdentifier::OID);
    }
}
