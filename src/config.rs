//! Issuance settings.

use bon::Builder;

use crate::key::DEFAULT_RSA_BITS;

/// Calendar years a certificate stays valid unless configured otherwise.
pub const DEFAULT_VALIDITY_YEARS: u8 = 10;

/// What to do with an IP SAN entry that does not parse as an IP literal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IpLiteralPolicy {
    /// Fail composition with `InvalidInput`.
    #[default]
    Reject,
    /// Keep the entry as an empty address and carry on.
    Lenient,
}

/// Settings shared by every issuance performed by a [`crate::issuer::CertificateIssuer`].
///
/// ```
/// use certgen::config::{IpLiteralPolicy, IssuanceConfig};
///
/// let config = IssuanceConfig::builder()
///     .rsa_key_bits(3072)
///     .ip_policy(IpLiteralPolicy::Lenient)
///     .build();
/// assert_eq!(config.validity_years, 10);
/// ```
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct IssuanceConfig {
    /// Modulus size of generated RSA keys. Values below 2048 are refused at issuance.
    #[builder(default = DEFAULT_RSA_BITS)]
    pub rsa_key_bits: usize,
    #[builder(default = DEFAULT_VALIDITY_YEARS)]
    pub validity_years: u8,
    #[builder(default)]
    pub ip_policy: IpLiteralPolicy,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
