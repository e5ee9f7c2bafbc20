//! Browser trust stores.
//!
//! A [`TrustStore`] is a named, ordered collection of canonical certificate
//! records built from one of two structurally different export formats: a
//! concatenated PEM bundle or a quoted CSV export. Stores are built once
//! from static external data and treated as read-only snapshots afterwards,
//! so they are safe to share across concurrent verification requests.

mod csv;
mod pem;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::OnceLock;

use bon::Builder;
use tracing::info;

use crate::error::{Result, TrustProbeError};
use crate::record::{CertificateRecord, Sha1Fingerprint};

/// The three browser root programs this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreName {
    Edge,
    Chrome,
    Firefox,
}

impl StoreName {
    pub const fn as_str(self) -> &'static str {
        match self {
            StoreName::Edge => "edge",
            StoreName::Chrome => "chrome",
            StoreName::Firefox => "firefox",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named collection of certificate records, read-only once built.
///
/// Source order is preserved; lookups treat the collection as a set.
#[derive(Debug, Clone)]
pub struct TrustStore {
    name: StoreName,
    records: Vec<CertificateRecord>,
}

impl TrustStore {
    /// Creates an empty store, which trusts nothing.
    pub fn empty(name: StoreName) -> Self {
        Self {
            name,
            records: Vec::new(),
        }
    }

    /// Imports a concatenated PEM bundle.
    ///
    /// # Errors
    /// `MalformedTrustStore` when any segment fails to parse; a partially
    /// imported store is never returned.
    pub fn from_pem_bundle(name: StoreName, text: &str) -> Result<Self> {
        let records = pem::import(name, text)?;
        info!(store = %name, records = records.len(), "imported PEM trust store");
        Ok(Self { name, records })
    }

    /// Imports a quoted CSV export with header-driven field lookup.
    ///
    /// # Errors
    /// `MalformedTrustStore` when a row is malformed, `UnknownMonth` when a
    /// date carries an unrecognized month abbreviation.
    pub fn from_csv_export<R: Read>(name: StoreName, reader: R) -> Result<Self> {
        let records = csv::import(name, reader)?;
        info!(store = %name, records = records.len(), "imported CSV trust store");
        Ok(Self { name, records })
    }

    pub fn name(&self) -> StoreName {
        self.name
    }

    pub fn records(&self) -> &[CertificateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact fingerprint membership; true on first match, false for an
    /// empty store. No partial or case-insensitive matching happens here:
    /// both sides are already canonical.
    pub fn is_trusted(&self, fingerprint: &Sha1Fingerprint) -> bool {
        self.records
            .iter()
            .any(|record| record.sha1_fingerprint == *fingerprint)
    }
}

/// Locations of the three trust-store data files.
#[derive(Debug, Clone, Builder)]
pub struct TrustStoreSources {
    /// Microsoft Edge CSV export.
    pub edge_csv: PathBuf,
    /// Google Chrome PEM bundle.
    pub chrome_pem: PathBuf,
    /// Mozilla Firefox PEM bundle.
    pub firefox_pem: PathBuf,
}

static INSTALLED: OnceLock<TrustStores> = OnceLock::new();

/// The three browser trust stores, built once per process run.
#[derive(Debug, Clone)]
pub struct TrustStores {
    edge: TrustStore,
    chrome: TrustStore,
    firefox: TrustStore,
}

impl TrustStores {
    /// Assembles a store set from already-imported stores.
    pub fn new(edge: TrustStore, chrome: TrustStore, firefox: TrustStore) -> Self {
        Self {
            edge,
            chrome,
            firefox,
        }
    }

    /// Loads all three stores from their data files.
    ///
    /// # Errors
    /// Any unreadable or malformed source fails the whole load; an
    /// incomplete store set would produce false "not trusted" verdicts.
    pub fn load(sources: &TrustStoreSources) -> Result<Self> {
        let edge_file = File::open(&sources.edge_csv).map_err(|e| read_failure(
            StoreName::Edge,
            &sources.edge_csv,
            &e,
        ))?;
        let edge = TrustStore::from_csv_export(StoreName::Edge, edge_file)?;

        let chrome_text = std::fs::read_to_string(&sources.chrome_pem)
            .map_err(|e| read_failure(StoreName::Chrome, &sources.chrome_pem, &e))?;
        let chrome = TrustStore::from_pem_bundle(StoreName::Chrome, &chrome_text)?;

        let firefox_text = std::fs::read_to_string(&sources.firefox_pem)
            .map_err(|e| read_failure(StoreName::Firefox, &sources.firefox_pem, &e))?;
        let firefox = TrustStore::from_pem_bundle(StoreName::Firefox, &firefox_text)?;

        Ok(Self::new(edge, chrome, firefox))
    }

    /// Installs this set as the process-wide snapshot and returns it.
    ///
    /// The first call wins; a concurrent or repeated call returns the
    /// already-installed snapshot and drops its own (construct-then-freeze).
    pub fn install(self) -> &'static TrustStores {
        INSTALLED.get_or_init(|| self)
    }

    /// Returns the process-wide snapshot, if one has been installed.
    pub fn installed() -> Option<&'static TrustStores> {
        INSTALLED.get()
    }

    pub fn edge(&self) -> &TrustStore {
        &self.edge
    }

    pub fn chrome(&self) -> &TrustStore {
        &self.chrome
    }

    pub fn firefox(&self) -> &TrustStore {
        &self.firefox
    }

    pub fn stores(&self) -> [&TrustStore; 3] {
        [&self.edge, &self.chrome, &self.firefox]
    }
}

fn read_failure(
    name: StoreName,
    path: &std::path::Path,
    err: &std::io::Error,
) -> TrustProbeError {
    TrustProbeError::MalformedTrustStore {
        store: name.to_string(),
        reason: format!("{}: {err}", path.display()),
    }
}
