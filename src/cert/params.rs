use bon::Builder;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519::{COMMON_NAME, COUNTRY_NAME, ORGANIZATION_NAME};
use der::Tag;
use der::asn1::{AnyRef, OctetString, PrintableStringRef, SetOfVec};
use time::{Duration, Month, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::{CertGenError, Result};

/// Subject or issuer name of a certificate.
///
/// Only the three attributes collected from the requester are modeled. They are encoded
/// in the conventional order C, O, CN; empty attributes are left out.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    #[builder(into)]
    pub common_name: String,
    #[builder(into, default)]
    pub organization: String,
    #[builder(into, default)]
    pub country: String,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 `Name`.
    ///
    /// The country is a PrintableString when its characters allow, UTF8String otherwise.
    pub fn as_x509_name(&self) -> Result<Name> {
        let mut rdns = Vec::with_capacity(3);

        if !self.country.is_empty() {
            let tag = match PrintableStringRef::new(&self.country) {
                Ok(_) => Tag::PrintableString,
                Err(_) => Tag::Utf8String,
            };
            rdns.push(single_attribute(
                COUNTRY_NAME,
                AnyRef::new(tag, self.country.as_bytes())?,
            )?);
        }
        if !self.organization.is_empty() {
            rdns.push(single_attribute(
                ORGANIZATION_NAME,
                AnyRef::new(Tag::Utf8String, self.organization.as_bytes())?,
            )?);
        }
        if !self.common_name.is_empty() {
            rdns.push(single_attribute(
                COMMON_NAME,
                AnyRef::new(Tag::Utf8String, self.common_name.as_bytes())?,
            )?);
        }

        Ok(RdnSequence(rdns))
    }

    /// Reads the common name, organization and country back out of an X.509 `Name`.
    ///
    /// Other attributes are ignored. When an attribute repeats, the last one wins.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let value = String::from_utf8_lossy(attr.value.value()).into_owned();
                match attr.oid {
                    COMMON_NAME => dn.common_name = value,
                    ORGANIZATION_NAME => dn.organization = value,
                    COUNTRY_NAME => dn.country = value,
                    _ => {}
                }
            }
        }

        dn
    }
}

fn single_attribute(oid: ObjectIdentifier, value: AnyRef<'_>) -> Result<RelativeDistinguishedName> {
    let atv = AttributeTypeAndValue {
        oid,
        value: value.into(),
    };
    Ok(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?))
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now and lasting the given number of calendar years.
    ///
    /// Sub-second precision is dropped so the period matches what is encoded.
    pub fn for_years(years: u8) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        let now = now - Duration::nanoseconds(i64::from(now.nanosecond()));
        Self::starting_at(now, years)
    }

    /// Creates a validity period from `not_before` lasting `years` calendar years.
    ///
    /// A start on 29 February ends on 1 March when the final year is not a leap year.
    pub fn starting_at(not_before: OffsetDateTime, years: u8) -> Result<Self> {
        let target = not_before.year() + i32::from(years);
        let not_after = match not_before.replace_year(target) {
            Ok(shifted) => shifted,
            Err(_) if not_before.month() == Month::February && not_before.day() == 29 => {
                not_before
                    .replace_day(28)
                    .and_then(|d| d.replace_year(target))
                    .map(|d| d + Duration::days(1))
                    .map_err(|e| CertGenError::InvalidInput(e.to_string()))?
            }
            Err(e) => return Err(CertGenError::InvalidInput(e.to_string())),
        };
        Ok(Self {
            not_before,
            not_after,
        })
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Converts into the `x509_cert` representation.
    pub fn to_x509_extension(&self) -> Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::Tagged;
    use time::macros::datetime;

    #[test]
    fn name_round_trip() {
        let dn = DistinguishedName::builder()
            .common_name("api.example.com")
            .organization("Example Inc")
            .country("US")
            .build();
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 3);
        assert_eq!(DistinguishedName::from_x509_name(&name), dn);
        assert_eq!(name.to_string(), "CN=api.example.com,O=Example Inc,C=US");
    }

    #[test]
    fn empty_attributes_are_omitted() {
        let dn = DistinguishedName::builder().common_name("only-cn").build();
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 1);
    }

    #[test]
    fn country_string_type() {
        let country_tag = |country: &str| {
            let dn = DistinguishedName::builder()
                .common_name("x")
                .country(country)
                .build();
            let name = dn.as_x509_name().unwrap();
            assert_eq!(DistinguishedName::from_x509_name(&name), dn);
            name.0[0].0.iter().next().unwrap().value.tag()
        };

        assert_eq!(country_tag("SE"), Tag::PrintableString);
        // '@' is outside the PrintableString alphabet
        assert_eq!(country_tag("R@"), Tag::Utf8String);
    }

    #[test]
    fn ten_years_is_calendar_years() {
        let start = datetime!(2024-06-15 12:00:00 UTC);
        let validity = Validity::starting_at(start, 10).unwrap();
        assert_eq!(validity.not_after, datetime!(2034-06-15 12:00:00 UTC));
    }

    #[test]
    fn leap_day_rolls_forward() {
        let start = datetime!(2024-02-29 08:30:00 UTC);
        let validity = Validity::starting_at(start, 10).unwrap();
        assert_eq!(validity.not_after, datetime!(2034-03-01 08:30:00 UTC));
    }
}
