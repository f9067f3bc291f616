use certgen::config::IssuanceConfig;
use certgen::error::CertGenError;
use certgen::inspect_certificate;
use certgen::issuer::CertificateIssuer;
use certgen::profile::{CertificateKind, CertificateRequestProfile, KubeService};
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), CertGenError> {
    // RUST_LOG=certgen=debug shows template composition as well
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let issuer = CertificateIssuer::new(IssuanceConfig::default());

    // Self-signed CA
    let ca = issuer.issue(
        &CertificateRequestProfile::builder()
            .kind(CertificateKind::CertificateAuthority)
            .organization("Crab widgits SE")
            .country("SE")
            .common_name("Crab widgits Root CA")
            .build(),
    )?;
    println!("CA Certificate PEM:\n{}", ca.certificate_pem);

    // Certificate for prod-billing in the payments namespace, reachable at an extra name
    let service = issuer.issue_with_authority(
        &CertificateRequestProfile::builder()
            .kind(CertificateKind::KubernetesServiceCertificate)
            .organization("Crab widgits SE")
            .country("SE")
            .common_name("billing")
            .dns_names("billing.crabs.example")
            .kube_service(
                KubeService::builder()
                    .service_name("billing")
                    .env_name("prod")
                    .namespace("payments")
                    .build(),
            )
            .build(),
        &ca.signing_authority()?,
    )?;
    println!("Service Certificate PEM:\n{}", service.certificate_pem);

    let mut report = Vec::new();
    inspect_certificate(service.to_pem().as_bytes(), &mut report)?;
    print!("{}", String::from_utf8_lossy(&report));

    Ok(())
}
