#![allow(dead_code)]

use certgen::config::IssuanceConfig;
use certgen::issuer::{CertificateIssuer, IssuedCertificate};
use certgen::profile::{CertificateKind, CertificateRequestProfile, KubeService};

/// 2048-bit keys keep the suite fast; everything else is the default configuration.
pub fn test_issuer() -> CertificateIssuer {
    CertificateIssuer::new(IssuanceConfig::builder().rsa_key_bits(2048).build())
}

pub fn ca_profile(common_name: &str) -> CertificateRequestProfile {
    CertificateRequestProfile::builder()
        .kind(CertificateKind::CertificateAuthority)
        .organization("Crab widgits SE")
        .country("SE")
        .common_name(common_name)
        .build()
}

pub fn server_profile(dns_names: &str, ip_addresses: &str) -> CertificateRequestProfile {
    CertificateRequestProfile::builder()
        .kind(CertificateKind::ServerCertificate)
        .organization("Crab widgits SE")
        .country("SE")
        .common_name("server.myca.local")
        .dns_names(dns_names)
        .ip_addresses(ip_addresses)
        .build()
}

pub fn kube_profile(dns_names: &str) -> CertificateRequestProfile {
    CertificateRequestProfile::builder()
        .kind(CertificateKind::KubernetesServiceCertificate)
        .organization("Crab widgits SE")
        .country("SE")
        .common_name("api")
        .dns_names(dns_names)
        .kube_service(
            KubeService::builder()
                .service_name("api")
                .env_name("prod")
                .namespace("ns1")
                .build(),
        )
        .build()
}

pub fn generate_ca_cert() -> IssuedCertificate {
    test_issuer()
        .issue(&ca_profile("myca.local"))
        .expect("CA issuance failed")
}
