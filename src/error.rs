//! Error types for certificate issuance and inspection.
//!
//! ```
//! use certgen::error::CertGenError;
//! use certgen::pem_bundle::extract_pem;
//!
//! match extract_pem(&b"not a pem stream"[..]) {
//!     Err(CertGenError::PemDecodeError(msg)) => println!("no PEM block: {}", msg),
//!     Err(e) => println!("other error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use thiserror::Error;

/// Represents errors that can occur while composing, issuing or inspecting certificates.
///
/// Every public operation surfaces these to its caller; none are retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertGenError {
    /// The input stream could not be read.
    #[error("Failed to read input stream: {0}")]
    StreamReadError(String),

    /// No valid PEM block was found, or a block was malformed.
    #[error("Failed to decode PEM: {0}")]
    PemDecodeError(String),

    /// Key pair generation failed.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// The externally supplied CA certificate or private key is unusable.
    #[error("Invalid signing authority: {0}")]
    AuthorityParseError(String),

    /// Signing the certificate failed.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// The output sink rejected the write.
    #[error("Failed to write output: {0}")]
    SinkWriteError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),
}

pub type Result<T> = std::result::Result<T, CertGenError>;

impl From<der::Error> for CertGenError {
    /// Converts a `der::Error` into a `CertGenError`.
    fn from(err: der::Error) -> Self {
        CertGenError::EncodingError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for CertGenError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        CertGenError::EncodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CertGenError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CertGenError::EncodingError(err.to_string())
    }
}

impl From<pem::PemError> for CertGenError {
    fn from(err: pem::PemError) -> Self {
        CertGenError::PemDecodeError(err.to_string())
    }
}
