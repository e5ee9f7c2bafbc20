//! Live TLS certificate-chain retrieval.
//!
//! Opens a TLS connection to `host:port`, completes the handshake, and hands
//! back the peer's certificate chain in leaf-to-root order. The handshake is
//! only a transport for obtaining the chain; whether it must also pass the
//! platform's own trust verification is a configuration switch
//! ([`HandshakePolicy`]), not an inherited ambiguity.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use bon::Builder;
pub use rustls::pki_types::CertificateDer;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore};
use tracing::debug;

use crate::error::{Result, TrustProbeError};
use crate::extract;
use crate::record::CertificateRecord;

pub const DEFAULT_TLS_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether chain retrieval requires the live chain to already verify under
/// the platform's default trust path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakePolicy {
    /// Accept any chain during the handshake so the engine can always
    /// evaluate per-browser trust afterwards. This is the default: a host
    /// whose root is unknown to the local webpki set is exactly the kind of
    /// host worth probing.
    #[default]
    TolerateUntrusted,
    /// Fail fast when the chain does not verify against the bundled webpki
    /// root set, before any store lookup happens.
    RequirePlatformTrust,
}

/// Options for [`fetch_chain`].
#[derive(Debug, Clone, Builder)]
pub struct FetchOptions {
    #[builder(default = DEFAULT_TLS_PORT)]
    pub port: u16,
    /// Bounds TCP connect and the TLS handshake. There are no internal
    /// retries; retry policy belongs to the caller.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    #[builder(default)]
    pub policy: HandshakePolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Ordered certificate chain as presented by a TLS peer, leaf first.
///
/// The last element is treated as the root for trust purposes; the engine
/// does not independently verify self-signedness.
#[derive(Debug, Clone)]
pub struct CertificateChain {
    certs: Vec<CertificateDer<'static>>,
}

impl CertificateChain {
    pub fn new(certs: Vec<CertificateDer<'static>>) -> Self {
        Self { certs }
    }

    pub fn leaf(&self) -> Option<&CertificateDer<'static>> {
        self.certs.first()
    }

    pub fn root(&self) -> Option<&CertificateDer<'static>> {
        self.certs.last()
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CertificateDer<'static>> {
        self.certs.iter()
    }

    /// Extracts the canonical record of the root certificate.
    ///
    /// # Errors
    /// `MalformedCertificate` when the chain is empty or the root does not
    /// parse.
    pub fn root_record(&self) -> Result<CertificateRecord> {
        let root = self.root().ok_or_else(|| {
            TrustProbeError::MalformedCertificate("empty certificate chain".to_string())
        })?;
        extract::record_from_der(root)
    }

    /// Renders the leaf certificate as a PEM block, if the chain is
    /// non-empty.
    pub fn leaf_pem(&self) -> Option<String> {
        self.leaf()
            .map(|der| pem::encode(&pem::Pem::new("CERTIFICATE", der.as_ref())))
    }
}

// Building a rustls ClientConfig is expensive and should happen once per
// process, not once per connection; one shared config per policy.
static TOLERANT_TLS_CONFIG: LazyLock<Arc<ClientConfig>> = LazyLock::new(|| {
    let config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(danger::AcceptAnyServerCert))
        .with_no_client_auth();
    Arc::new(config)
});

static WEBPKI_TLS_CONFIG: LazyLock<Arc<ClientConfig>> = LazyLock::new(|| {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Arc::new(config)
});

fn client_config(policy: HandshakePolicy) -> Arc<ClientConfig> {
    match policy {
        HandshakePolicy::TolerateUntrusted => TOLERANT_TLS_CONFIG.clone(),
        HandshakePolicy::RequirePlatformTrust => WEBPKI_TLS_CONFIG.clone(),
    }
}

/// Retrieves the certificate chain presented by `host`.
///
/// # Errors
/// * `Connection` - DNS resolution or TCP connect failed.
/// * `Timeout` - connect or handshake exceeded `options.timeout`.
/// * `Tls` - the handshake failed at the protocol level (including
///   verification failures under [`HandshakePolicy::RequirePlatformTrust`]).
pub fn fetch_chain(host: &str, options: &FetchOptions) -> Result<CertificateChain> {
    let addr = (host, options.port)
        .to_socket_addrs()
        .map_err(|e| TrustProbeError::Connection {
            host: host.to_string(),
            reason: e.to_string(),
        })?
        .next()
        .ok_or_else(|| TrustProbeError::Connection {
            host: host.to_string(),
            reason: "no addresses resolved".to_string(),
        })?;

    debug!(host, port = options.port, %addr, "opening TCP connection");
    let mut tcp =
        TcpStream::connect_timeout(&addr, options.timeout).map_err(|e| classify_io(host, e))?;
    tcp.set_read_timeout(Some(options.timeout))
        .map_err(|e| classify_io(host, e))?;
    tcp.set_write_timeout(Some(options.timeout))
        .map_err(|e| classify_io(host, e))?;

    let server_name =
        ServerName::try_from(host.to_string()).map_err(|e| TrustProbeError::Tls {
            host: host.to_string(),
            reason: e.to_string(),
        })?;
    let mut tls = ClientConnection::new(client_config(options.policy), server_name).map_err(
        |e| TrustProbeError::Tls {
            host: host.to_string(),
            reason: e.to_string(),
        },
    )?;

    while tls.is_handshaking() {
        tls.complete_io(&mut tcp).map_err(|e| classify_io(host, e))?;
    }

    let certs = tls
        .peer_certificates()
        .ok_or_else(|| TrustProbeError::Tls {
            host: host.to_string(),
            reason: "peer presented no certificate chain".to_string(),
        })?
        .to_vec();
    debug!(host, depth = certs.len(), "received certificate chain");

    Ok(CertificateChain::new(certs))
}

/// Sorts an I/O failure into the error taxonomy. rustls surfaces handshake
/// failures from `complete_io` as `InvalidData` I/O errors.
fn classify_io(host: &str, err: io::Error) -> TrustProbeError {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TrustProbeError::Timeout {
            host: host.to_string(),
        },
        io::ErrorKind::InvalidData => TrustProbeError::Tls {
            host: host.to_string(),
            reason: err.to_string(),
        },
        _ => TrustProbeError::Connection {
            host: host.to_string(),
            reason: err.to_string(),
        },
    }
}

mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, SignatureScheme};

    /// Accepts every server certificate so the chain can be captured even
    /// when the platform would reject it.
    #[derive(Debug)]
    pub(super) struct AcceptAnyServerCert;

    impl ServerCertVerifier for AcceptAnyServerCert {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> std::result::Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            rustls::crypto::ring::default_provider()
                .signature_verification_algorithms
                .supported_schemes()
        }
    }
}
