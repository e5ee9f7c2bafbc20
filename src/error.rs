use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrustProbeError>;

/// Represents errors that can occur while retrieving chains, extracting
/// certificate records, or importing trust stores.
///
/// Absence of the Key Usage extension is deliberately *not* an error: the
/// extractor reports it with a sentinel label instead.
#[derive(Debug, Error, Clone)]
pub enum TrustProbeError {
    /// DNS resolution or TCP connect failure.
    #[error("failed to connect to {host}: {reason}")]
    Connection { host: String, reason: String },

    /// The connect or TLS handshake exceeded the configured timeout.
    #[error("timed out while negotiating TLS with {host}")]
    Timeout { host: String },

    /// TLS protocol or handshake failure.
    #[error("TLS failure while talking to {host}: {reason}")]
    Tls { host: String, reason: String },

    /// The input could not be parsed as an X.509 certificate.
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// A trust-store bundle or export row failed to parse. The whole store
    /// is rejected; dropping individual records would silently turn into
    /// false "not trusted" verdicts.
    #[error("malformed {store} trust store: {reason}")]
    MalformedTrustStore { store: String, reason: String },

    /// A CSV export date carried a month abbreviation outside the fixed
    /// 12-entry English table.
    #[error("unknown month abbreviation: {0:?}")]
    UnknownMonth(String),

    /// A CSV export date did not have the `"YYYY Mon DD"` shape.
    #[error("invalid trust-store export date: {0:?}")]
    InvalidDate(String),

    /// A fingerprint string was not 20 bytes of hex.
    #[error("invalid SHA-1 fingerprint: {0}")]
    InvalidFingerprint(String),
}

impl From<der::Error> for TrustProbeError {
    /// Converts a `der::Error` into a `TrustProbeError`.
    fn from(err: der::Error) -> Self {
        TrustProbeError::MalformedCertificate(err.to_string())
    }
}
