use std::time::SystemTime;

use der::asn1::{GeneralizedTime, UtcTime};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::Time;

use crate::cert::params::{ExtensionParam, Validity};
use crate::error::{CertGenError, Result};

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian, minimally encoded positive serial.
/// * `signature_algorithm` - The algorithm the issuer signs with.
/// * `issuer` - The issuer name, copied from the signing certificate's subject.
/// * `validity` - The validity period.
/// * `subject` - The subject name.
/// * `subject_public_key` - The public key being certified.
/// * `extensions` - X.509 v3 extensions, in encoding order.
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509_extension)
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: x509_time(self.validity.not_before)?,
            not_after: x509_time(self.validity.not_after)?,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())
            .map_err(|e| CertGenError::InvalidInput(format!("serial number: {}", e)))?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.clone(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: if extensions.is_empty() {
                None
            } else {
                Some(extensions)
            },
        })
    }
}

/// UTCTime through 2049, GeneralizedTime afterwards.
fn x509_time(at: OffsetDateTime) -> Result<Time> {
    let system_time: SystemTime = at.into();
    match UtcTime::from_system_time(system_time) {
        Ok(utc) => Ok(Time::UtcTime(utc)),
        Err(_) => Ok(Time::GeneralTime(GeneralizedTime::from_system_time(
            system_time,
        )?)),
    }
}
