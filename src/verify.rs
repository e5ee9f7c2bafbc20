//! Trust verdicts.
//!
//! Evaluates a root fingerprint against each of the three pre-built stores
//! and bundles the per-store booleans into one [`TrustVerdict`]. Store
//! membership never changes mid-run, so verdicts are memoized per
//! fingerprint.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::info;

use crate::chain::{self, CertificateChain, FetchOptions};
use crate::error::Result;
use crate::record::Sha1Fingerprint;
use crate::store::{StoreName, TrustStores};

/// Per-store trust membership of one root fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrustVerdict {
    pub edge: bool,
    pub chrome: bool,
    pub firefox: bool,
}

impl TrustVerdict {
    /// The verdict as `(store name, trusted)` pairs, in fixed order.
    pub fn entries(&self) -> [(StoreName, bool); 3] {
        [
            (StoreName::Edge, self.edge),
            (StoreName::Chrome, self.chrome),
            (StoreName::Firefox, self.firefox),
        ]
    }

    pub fn any_trusted(&self) -> bool {
        self.edge || self.chrome || self.firefox
    }

    pub fn all_trusted(&self) -> bool {
        self.edge && self.chrome && self.firefox
    }
}

/// Evaluates hosts, chains, and fingerprints against a frozen store set.
pub struct Verifier<'a> {
    stores: &'a TrustStores,
    options: FetchOptions,
    memo: Mutex<HashMap<Sha1Fingerprint, TrustVerdict>>,
}

impl<'a> Verifier<'a> {
    /// Creates a verifier with default fetch options (port 443, 10 s
    /// timeout, tolerate-untrusted handshake).
    pub fn new(stores: &'a TrustStores) -> Self {
        Self::with_options(stores, FetchOptions::default())
    }

    pub fn with_options(stores: &'a TrustStores, options: FetchOptions) -> Self {
        Self {
            stores,
            options,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches the host's live chain and evaluates its root against each
    /// store.
    ///
    /// # Errors
    /// Propagates chain-retrieval and extraction failures unchanged; a
    /// failed fetch never yields a partial verdict.
    pub fn verify_host(&self, host: &str) -> Result<TrustVerdict> {
        let chain = chain::fetch_chain(host, &self.options)?;
        let verdict = self.verify_chain(&chain)?;
        info!(
            host,
            edge = verdict.edge,
            chrome = verdict.chrome,
            firefox = verdict.firefox,
            "host verified"
        );
        Ok(verdict)
    }

    /// Evaluates an already-retrieved chain; the network-free half of
    /// [`Self::verify_host`].
    pub fn verify_chain(&self, chain: &CertificateChain) -> Result<TrustVerdict> {
        let root = chain.root_record()?;
        Ok(self.verify_fingerprint(&root.sha1_fingerprint))
    }

    /// Evaluates a fingerprint against each store, memoized per process
    /// run.
    pub fn verify_fingerprint(&self, fingerprint: &Sha1Fingerprint) -> TrustVerdict {
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(verdict) = memo.get(fingerprint) {
            return *verdict;
        }
        let verdict = TrustVerdict {
            edge: self.stores.edge().is_trusted(fingerprint),
            chrome: self.stores.chrome().is_trusted(fingerprint),
            firefox: self.stores.firefox().is_trusted(fingerprint),
        };
        memo.insert(*fingerprint, verdict);
        verdict
    }
}
