//! # certgen - X.509 issuance for small private PKIs
//!
//! certgen issues three kinds of certificate, all with freshly generated RSA keys:
//!
//! - **Certificate authorities**: self-signed, `CA:TRUE`, allowed to sign certificates.
//! - **Server certificates**: signed by a CA, with caller supplied DNS names and IP addresses.
//! - **Kubernetes service certificates**: server certificates that also carry every name a
//!   pod can use to reach `{env}-{service}` in its namespace, plus `localhost` and `127.0.0.1`.
//!
//! It also pulls certificate/key pairs out of pasted PEM text and prints a short report on
//! an existing certificate. Everything is built on RustCrypto crates; no OpenSSL or ring.
//!
//! ## Quick Start
//!
//! ### Issuing a CA and a server certificate
//!
//! ```rust,no_run
//! use certgen::{
//!     config::IssuanceConfig,
//!     issuer::CertificateIssuer,
//!     profile::{CertificateKind, CertificateRequestProfile},
//! };
//!
//! # fn main() -> Result<(), certgen::error::CertGenError> {
//! let issuer = CertificateIssuer::new(IssuanceConfig::default());
//!
//! let ca = issuer.issue(
//!     &CertificateRequestProfile::builder()
//!         .kind(CertificateKind::CertificateAuthority)
//!         .organization("Example Corp")
//!         .country("US")
//!         .common_name("Example Root CA")
//!         .build(),
//! )?;
//!
//! let server = issuer.issue_with_authority(
//!     &CertificateRequestProfile::builder()
//!         .kind(CertificateKind::ServerCertificate)
//!         .organization("Example Corp")
//!         .country("US")
//!         .common_name("api.example.com")
//!         .dns_names("api.example.com,www.example.com")
//!         .ip_addresses("10.0.0.10")
//!         .build(),
//!     &ca.signing_authority()?,
//! )?;
//!
//! println!("{}", server.to_pem());
//! # Ok(())
//! # }
//! ```
//!
//! ### Signing with CA material pasted as PEM
//!
//! ```rust,no_run
//! use certgen::{
//!     issue_certificate,
//!     pem_bundle::extract_pem,
//!     profile::{AuthorityMaterial, CertificateKind, CertificateRequestProfile, KubeService},
//! };
//!
//! # fn main() -> Result<(), certgen::error::CertGenError> {
//! # let pasted_ca_pem = String::new();
//! let material = AuthorityMaterial::from_pem_bundle(extract_pem(pasted_ca_pem.as_bytes())?)?;
//!
//! let profile = CertificateRequestProfile::builder()
//!     .kind(CertificateKind::KubernetesServiceCertificate)
//!     .organization("Example Corp")
//!     .country("US")
//!     .common_name("billing")
//!     .kube_service(
//!         KubeService::builder()
//!             .service_name("billing")
//!             .env_name("prod")
//!             .namespace("payments")
//!             .build(),
//!     )
//!     .signing_authority(material)
//!     .build();
//!
//! let mut out = Vec::new();
//! issue_certificate(&profile, &mut out)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Inspecting a certificate
//!
//! ```rust,no_run
//! # fn main() -> Result<(), certgen::error::CertGenError> {
//! # let certificate_pem = String::new();
//! let mut report = Vec::new();
//! certgen::inspect_certificate(certificate_pem.as_bytes(), &mut report)?;
//! print!("{}", String::from_utf8_lossy(&report));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`profile`]: What a requester asks for
//! - [`template`]: Turning a request into certificate fields and SANs
//! - [`issuer`]: Key generation, signing authorities and issuance
//! - [`inspect`]: Certificate reports
//! - [`pem_bundle`]: Classifying certificate and key blocks in PEM input
//! - [`cert`]: Certificate encoding/decoding and X.509 extensions
//! - [`key`]: RSA key pairs
//! - [`config`]: Issuance settings
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure assembly

pub mod cert;
pub mod config;
pub mod error;
pub mod inspect;
pub mod issuer;
pub mod key;
pub mod pem_bundle;
pub mod profile;
pub mod tbs_certificate;
pub mod template;

pub use inspect::inspect_certificate;
pub use issuer::issue_certificate;
pub use pem_bundle::extract_pem;
pub use template::compose_template;
