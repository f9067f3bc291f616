//! Human readable reports on issued certificates.

use std::fmt;
use std::io::{Read, Write};
use std::net::IpAddr;

use time::OffsetDateTime;
use tracing::debug;

use crate::cert::Certificate;
use crate::error::{CertGenError, Result};
use crate::pem_bundle::extract_pem;

/// The fields of a certificate worth showing to a person.
///
/// Rendering via `Display` prints, in order: CA flag, subject, issuer, public key
/// algorithm, DNS names and IP addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateReport {
    pub is_ca: bool,
    pub subject: String,
    pub issuer: String,
    pub key_algorithm: String,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<Option<IpAddr>>,
    pub serial_number: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl CertificateReport {
    pub fn from_certificate(certificate: &Certificate) -> Result<Self> {
        let san = certificate.subject_alt_name()?;
        Ok(Self {
            is_ca: certificate.is_ca()?,
            subject: certificate.subject_name().to_string(),
            issuer: certificate.issuer_name().to_string(),
            key_algorithm: certificate.public_key_algorithm(),
            dns_names: san.dns_names,
            ip_addresses: san.ip_addresses,
            serial_number: certificate.serial_number_hex(),
            not_before: certificate.not_before(),
            not_after: certificate.not_after(),
        })
    }
}

impl fmt::Display for CertificateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ip_addresses: Vec<String> = self
            .ip_addresses
            .iter()
            .map(|ip| match ip {
                Some(ip) => ip.to_string(),
                None => "<invalid>".to_string(),
            })
            .collect();

        writeln!(f, "Is it a CA cert: {}", self.is_ca)?;
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f, "Issuer: {}", self.issuer)?;
        writeln!(f, "Key algorithm: {}", self.key_algorithm)?;
        writeln!(f, "DNS names: {}", list_or_none(&self.dns_names))?;
        writeln!(f, "IP addresses: {}", list_or_none(&ip_addresses))
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

/// Reads PEM material from `stream`, parses its certificate and writes a report to `sink`.
///
/// A private key block in the stream is ignored. Nothing is written on failure.
///
/// # Errors
/// `PemDecodeError` when the stream has no certificate block, `DecodingError` when the
/// certificate does not parse and `SinkWriteError` when the report cannot be written.
pub fn inspect_certificate<R: Read, W: Write>(stream: R, mut sink: W) -> Result<()> {
    let certificate_der = extract_pem(stream)?.certificate_der.ok_or_else(|| {
        CertGenError::PemDecodeError("no CERTIFICATE block found".to_string())
    })?;

    let certificate = Certificate::from_der(&certificate_der)?;
    let report = CertificateReport::from_certificate(&certificate)?;
    debug!(serial = %report.serial_number, "inspected certificate");

    sink.write_all(report.to_string().as_bytes())
        .map_err(|e| CertGenError::SinkWriteError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pem_bundle::tests::FailingReader;
    use crate::pem_bundle::{RSA_PRIVATE_KEY_LABEL, der_to_pem};

    #[test]
    fn unreadable_stream_writes_nothing() {
        let mut out = Vec::new();
        let err = inspect_certificate(FailingReader, &mut out).unwrap_err();
        assert!(matches!(err, CertGenError::StreamReadError(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn key_only_stream_has_no_certificate() {
        let input = der_to_pem(&[0x30, 0x00], RSA_PRIVATE_KEY_LABEL);
        let mut out = Vec::new();
        let err = inspect_certificate(input.as_bytes(), &mut out).unwrap_err();
        assert!(matches!(err, CertGenError::PemDecodeError(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn garbage_certificate_writes_nothing() {
        let input = der_to_pem(&[0x30, 0x03, 0x02, 0x01, 0x05], "CERTIFICATE");
        let mut out = Vec::new();
        let err = inspect_certificate(input.as_bytes(), &mut out).unwrap_err();
        assert!(matches!(err, CertGenError::DecodingError(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn report_layout() {
        let report = CertificateReport {
            is_ca: false,
            subject: "CN=svc,O=Acme,C=NL".to_string(),
            issuer: "CN=Acme Root,O=Acme,C=NL".to_string(),
            key_algorithm: "RSA".to_string(),
            dns_names: vec!["a.com".to_string(), "b.com".to_string()],
            ip_addresses: vec![Some("127.0.0.1".parse().unwrap()), None],
            serial_number: "01".to_string(),
            not_before: OffsetDateTime::UNIX_EPOCH,
            not_after: OffsetDateTime::UNIX_EPOCH,
        };
        assert_eq!(
            report.to_string(),
            "Is it a CA cert: false\n\
             Subject: CN=svc,O=Acme,C=NL\n\
             Issuer: CN=Acme Root,O=Acme,C=NL\n\
             Key algorithm: RSA\n\
             DNS names: a.com, b.com\n\
             IP addresses: 127.0.0.1, <invalid>\n"
        );
    }
}
