//! # TrustProbe - Browser Trust-Store Verification for TLS Chains
//!
//! TrustProbe inspects the TLS certificate chain presented by a remote host
//! and determines whether the chain's root certificate is recognized as
//! trusted by each of three independently maintained browser trust stores
//! (Microsoft Edge, Google Chrome, Mozilla Firefox).
//!
//! The engine has four parts, leaf to root:
//!
//! - [`extract`]: parses one X.509 certificate (DER or PEM) into a canonical
//!   [`CertificateRecord`](record::CertificateRecord).
//! - [`chain`]: opens a TLS connection and returns the peer's certificate
//!   chain, leaf first.
//! - [`store`]: imports a concatenated PEM bundle or a quoted CSV export
//!   into a named, read-only [`TrustStore`](store::TrustStore).
//! - [`verify`]: exact-fingerprint membership lookups against each store,
//!   bundled into a per-store [`TrustVerdict`](verify::TrustVerdict).
//!
//! TrustProbe does **not** validate signatures along the chain, check
//! revocation, or perform RFC 5280 path validation. It answers one
//! question: is the root certificate's SHA-1 fingerprint a member of each
//! browser's trust store?
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use trustprobe::{TrustStoreSources, TrustStores, Verifier};
//!
//! # fn main() -> Result<(), trustprobe::TrustProbeError> {
//! let sources = TrustStoreSources::builder()
//!     .edge_csv(PathBuf::from("data/Microsoft_Edge.csv"))
//!     .chrome_pem(PathBuf::from("data/Google_Chrome.pem"))
//!     .firefox_pem(PathBuf::from("data/Mozilla_Firefox.pem"))
//!     .build();
//!
//! // Build once, freeze, share for the rest of the process.
//! let stores = TrustStores::load(&sources)?.install();
//!
//! let verifier = Verifier::new(stores);
//! let verdict = verifier.verify_host("example.com")?;
//! for (store, trusted) in verdict.entries() {
//!     println!("{store}: {trusted}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Inspecting a chain without verifying it
//!
//! ```rust,no_run
//! use trustprobe::chain::{self, FetchOptions};
//!
//! # fn main() -> Result<(), trustprobe::TrustProbeError> {
//! let chain = chain::fetch_chain("example.com", &FetchOptions::default())?;
//! let root = chain.root_record()?;
//! println!("root: {:?}", root.common_name);
//! println!("sha1: {}", root.sha1_fingerprint);
//! # Ok(())
//! # }
//! ```
//!
//! ## Handshake policy
//!
//! By default the retriever tolerates chains the platform itself would
//! reject, since a host with an unrecognized root is exactly the kind of
//! host worth probing. Pass
//! [`HandshakePolicy::RequirePlatformTrust`](chain::HandshakePolicy) in
//! [`FetchOptions`](chain::FetchOptions) to fail fast instead.

pub mod chain;
pub mod error;
pub mod extract;
pub mod record;
pub mod store;
pub mod verify;

pub use chain::{CertificateChain, FetchOptions, HandshakePolicy};
pub use error::{Result, TrustProbeError};
pub use record::{CertificateRecord, DisplayRecord, KeyUsageFlags, Sha1Fingerprint};
pub use store::{StoreName, TrustStore, TrustStoreSources, TrustStores};
pub use verify::{TrustVerdict, Verifier};
