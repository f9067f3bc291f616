//! Extraction of certificate and private-key material from PEM streams.
//!
//! A stream carries at most two blocks in any order, typically a CA certificate and its key
//! pasted together. Blocks are classified by their label rather than their position.

use std::io::Read;

use tracing::debug;

use crate::error::{CertGenError, Result};

/// PEM label for X.509 certificates.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// PEM label for PKCS#1 RSA private keys.
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/// A second block is only looked for when more than this many bytes follow the first one.
const SECOND_BLOCK_THRESHOLD: usize = 32;

/// Certificate and private-key DER recovered from a PEM stream.
///
/// Either side may be missing. When a stream holds two blocks of the same kind the later
/// one wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PemBundle {
    pub certificate_der: Option<Vec<u8>>,
    pub private_key_der: Option<Vec<u8>>,
}

impl PemBundle {
    /// Decodes up to two PEM blocks from `input`.
    ///
    /// # Errors
    /// `PemDecodeError` if the first block is missing or malformed, or if the trailing data
    /// is long enough to be a second block but does not decode as one.
    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        let mut bundle = PemBundle::default();

        let (first, rest) = decode_block(input)?;
        bundle.classify(first);

        if rest.len() > SECOND_BLOCK_THRESHOLD && !is_blank(rest) {
            let (second, _) = decode_block(rest)?;
            bundle.classify(second);
        }

        Ok(bundle)
    }

    /// True when the bundle holds both a certificate and a private key.
    pub fn is_complete(&self) -> bool {
        self.certificate_der.is_some() && self.private_key_der.is_some()
    }

    fn classify(&mut self, block: pem::Pem) {
        let label = block.tag().to_string();
        if label.contains("PRIVATE KEY") {
            debug!(label = %label, "classified PEM block as private key");
            self.private_key_der = Some(block.into_contents());
        } else if label.contains(CERTIFICATE_LABEL) {
            debug!(label = %label, "classified PEM block as certificate");
            self.certificate_der = Some(block.into_contents());
        } else {
            debug!(label = %label, "ignoring PEM block with unrecognised label");
        }
    }
}

/// Reads `stream` to the end and extracts its certificate and private-key blocks.
pub fn extract_pem<R: Read>(mut stream: R) -> Result<PemBundle> {
    let mut input = Vec::new();
    stream
        .read_to_end(&mut input)
        .map_err(|e| CertGenError::StreamReadError(e.to_string()))?;
    PemBundle::from_bytes(&input)
}

/// Convert DER-encoded data into a PEM-encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let block = pem::Pem::new(label, der);
    pem::encode_config(
        &block,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Decodes the first block of `input` and returns it with the bytes that follow it.
fn decode_block(input: &[u8]) -> Result<(pem::Pem, &[u8])> {
    if is_blank(input) {
        return Err(CertGenError::PemDecodeError("input is empty".to_string()));
    }

    let block = pem::parse(input)?;
    let end = block_end(input).ok_or_else(|| {
        CertGenError::PemDecodeError("unterminated PEM block".to_string())
    })?;
    Ok((block, &input[end..]))
}

fn is_blank(input: &[u8]) -> bool {
    input.iter().all(u8::is_ascii_whitespace)
}

/// Offset just past the first `-----END ...-----` line, including its line ending.
fn block_end(input: &[u8]) -> Option<usize> {
    let begin = find(input, b"-----BEGIN ")?;
    let end_marker = begin + find(&input[begin..], b"-----END ")?;
    let label_start = end_marker + b"-----END ".len();
    let mut end = label_start + find(&input[label_start..], b"-----")? + b"-----".len();

    if input[end..].starts_with(b"\r\n") {
        end += 2;
    } else if input[end..].starts_with(b"\n") {
        end += 1;
    }
    Some(end)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io;

    /// A stream that fails on the first read.
    pub(crate) struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("connection reset"))
        }
    }

    const CERT_DER: &[u8] = &[0x30, 0x82, 0x01, 0x0a, 0x02, 0x82, 0x01, 0x01];
    const KEY_DER: &[u8] = &[0x30, 0x82, 0x04, 0xa4, 0x02, 0x01, 0x00];

    fn cert_pem() -> String {
        der_to_pem(CERT_DER, CERTIFICATE_LABEL)
    }

    fn key_pem() -> String {
        der_to_pem(KEY_DER, RSA_PRIVATE_KEY_LABEL)
    }

    #[test]
    fn certificate_then_key() {
        let input = format!("{}{}", cert_pem(), key_pem());
        let bundle = PemBundle::from_bytes(input.as_bytes()).unwrap();
        assert_eq!(bundle.certificate_der.as_deref(), Some(CERT_DER));
        assert_eq!(bundle.private_key_der.as_deref(), Some(KEY_DER));
        assert!(bundle.is_complete());
    }

    #[test]
    fn key_then_certificate() {
        let input = format!("{}{}", key_pem(), cert_pem());
        let bundle = PemBundle::from_bytes(input.as_bytes()).unwrap();
        assert_eq!(bundle.certificate_der.as_deref(), Some(CERT_DER));
        assert_eq!(bundle.private_key_der.as_deref(), Some(KEY_DER));
    }

    #[test]
    fn single_block_leaves_other_side_empty() {
        let bundle = PemBundle::from_bytes(cert_pem().as_bytes()).unwrap();
        assert_eq!(bundle.certificate_der.as_deref(), Some(CERT_DER));
        assert!(bundle.private_key_der.is_none());
        assert!(!bundle.is_complete());
    }

    #[test]
    fn pkcs8_label_counts_as_private_key() {
        let input = der_to_pem(KEY_DER, "PRIVATE KEY");
        let bundle = PemBundle::from_bytes(input.as_bytes()).unwrap();
        assert_eq!(bundle.private_key_der.as_deref(), Some(KEY_DER));
    }

    #[test]
    fn same_kind_twice_keeps_the_last() {
        let other: &[u8] = &[0x30, 0x01, 0xff];
        let input = format!("{}{}", cert_pem(), der_to_pem(other, CERTIFICATE_LABEL));
        let bundle = PemBundle::from_bytes(input.as_bytes()).unwrap();
        assert_eq!(bundle.certificate_der.as_deref(), Some(other));
        assert!(bundle.private_key_der.is_none());
    }

    #[test]
    fn short_trailer_is_ignored() {
        let input = format!("{}\n# trailing note\n", cert_pem());
        let bundle = PemBundle::from_bytes(input.as_bytes()).unwrap();
        assert_eq!(bundle.certificate_der.as_deref(), Some(CERT_DER));
    }

    #[test]
    fn blank_trailer_is_ignored() {
        let input = format!("{}{}", cert_pem(), "\n".repeat(40));
        let bundle = PemBundle::from_bytes(input.as_bytes()).unwrap();
        assert_eq!(bundle.certificate_der.as_deref(), Some(CERT_DER));
        assert!(bundle.private_key_der.is_none());

        let crlf = format!("{}{}", key_pem(), "\r\n  \t".repeat(20));
        let bundle = PemBundle::from_bytes(crlf.as_bytes()).unwrap();
        assert_eq!(bundle.private_key_der.as_deref(), Some(KEY_DER));
    }

    #[test]
    fn long_non_pem_trailer_is_an_error() {
        let input = format!("{}{}", cert_pem(), "x".repeat(64));
        let err = PemBundle::from_bytes(input.as_bytes()).unwrap_err();
        assert!(matches!(err, CertGenError::PemDecodeError(_)));
    }

    #[test]
    fn empty_stream_is_a_decode_error() {
        let err = extract_pem(&b""[..]).unwrap_err();
        assert!(matches!(err, CertGenError::PemDecodeError(_)));
    }

    #[test]
    fn non_pem_stream_is_a_decode_error() {
        let err = extract_pem(&b"hello, this is definitely not a certificate"[..]).unwrap_err();
        assert!(matches!(err, CertGenError::PemDecodeError(_)));
    }

    #[test]
    fn leading_text_before_block_is_skipped() {
        let input = format!("CA pair follows:\n{}{}", key_pem(), cert_pem());
        let bundle = extract_pem(input.as_bytes()).unwrap();
        assert!(bundle.is_complete());
    }

    #[test]
    fn read_failure_is_a_stream_error() {
        let err = extract_pem(FailingReader).unwrap_err();
        assert_eq!(
            err,
            CertGenError::StreamReadError("connection reset".to_string())
        );
    }
}
