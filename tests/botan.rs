mod util;

use botan::Certificate as BotanCertificate;

use certgen::issuer::IssuedCertificate;

fn check_cert(cert_der: &[u8]) {
    // Use botan crate to parse the DER and assert it succeeds
    BotanCertificate::load(cert_der).expect("Botan failed to parse certificate");
}

fn with_ca(ca: &IssuedCertificate) -> certgen::issuer::SigningAuthority {
    ca.signing_authority().unwrap()
}

#[test]
#[ignore]
fn test_botan_ca() {
    let ca = util::generate_ca_cert();
    check_cert(&ca.certificate_der().unwrap());
}

#[test]
#[ignore]
fn test_botan_server() {
    let ca = util::generate_ca_cert();
    let server = util::test_issuer()
        .issue_with_authority(&util::server_profile("a.com", "10.1.2.3"), &with_ca(&ca))
        .unwrap();
    check_cert(&server.certificate_der().unwrap());
}

#[test]
#[ignore]
fn test_botan_kubernetes_service() {
    let ca = util::generate_ca_cert();
    let service = util::test_issuer()
        .issue_with_authority(&util::kube_profile(""), &with_ca(&ca))
        .unwrap();
    check_cert(&service.certificate_der().unwrap());
}
