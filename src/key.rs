use der::Encode;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::error::{CertGenError, Result};
use crate::pem_bundle::{RSA_PRIVATE_KEY_LABEL, der_to_pem};

/// Smallest RSA modulus accepted for newly generated keys.
pub const MIN_RSA_BITS: usize = 2048;

/// Modulus size used when no configuration overrides it.
pub const DEFAULT_RSA_BITS: usize = 4096;

/// An RSA key pair.
///
/// This is the only key algorithm modeled by the crate: every issued certificate carries an
/// RSA public key and is signed with SHA-256 and PKCS#1 v1.5 padding.
#[derive(Clone, Debug)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: RsaPublicKey,
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    ///
    /// # Errors
    /// `InvalidInput` when `bits` is below [`MIN_RSA_BITS`], `KeyGenerationError` when the
    /// system random source or prime search fails.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        if bits < MIN_RSA_BITS {
            return Err(CertGenError::InvalidInput(format!(
                "RSA key size {} is below the minimum of {} bits",
                bits, MIN_RSA_BITS
            )));
        }

        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CertGenError::KeyGenerationError(e.to_string()))?;
        Ok(Self::from_private(private))
    }

    /// Import a private key from DER.
    ///
    /// PKCS#1 (`RSA PRIVATE KEY`) is tried first, then PKCS#8 (`PRIVATE KEY`).
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let private = match RsaPrivateKey::from_pkcs1_der(der) {
            Ok(key) => key,
            Err(pkcs1_err) => RsaPrivateKey::from_pkcs8_der(der).map_err(|pkcs8_err| {
                CertGenError::DecodingError(format!(
                    "not an RSA private key (PKCS#1: {}; PKCS#8: {})",
                    pkcs1_err, pkcs8_err
                ))
            })?,
        };
        Ok(Self::from_private(private))
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        Self {
            private: Box::new(private),
            public,
        }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Encodes the private key as PKCS#1 DER.
    pub fn to_pkcs1_der(&self) -> Result<Vec<u8>> {
        Ok(self.private.to_pkcs1_der()?.as_bytes().to_vec())
    }

    /// Encodes the private key as an `RSA PRIVATE KEY` PEM block.
    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_pkcs1_der()?, RSA_PRIVATE_KEY_LABEL))
    }

    /// Returns the public half as a `SubjectPublicKeyInfo`.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.public.clone())?)
    }

    /// SHA-1 over the subject public key bits, as used for key identifiers.
    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        let spki = self.as_spki()?;
        Ok(Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec())
    }

    /// Returns true if `spki` carries this pair's public key.
    pub fn matches_spki(&self, spki: &SubjectPublicKeyInfoOwned) -> Result<bool> {
        Ok(self.as_spki()?.to_der()? == spki.to_der()?)
    }

    /// The algorithm identifier placed in certificates signed by this key.
    pub fn signature_algorithm(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            parameters: Some(der::asn1::AnyRef::NULL.into()),
        }
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 over SHA-256.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_key = RsaSigningKey::<Sha256>::new((*self.private).clone());
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| CertGenError::SigningError(e.to_string()))?;
        Ok(signature.to_vec())
    }
}
