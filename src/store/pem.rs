//! PEM-bundle import path.

use crate::error::{Result, TrustProbeError};
use crate::extract;
use crate::record::CertificateRecord;
use crate::store::StoreName;

const END_CERTIFICATE: &str = "-----END CERTIFICATE-----";

/// Splits a concatenated PEM bundle on the end-of-certificate delimiter and
/// feeds each reconstructed block to the extractor.
///
/// A trailing delimiter leaves an empty (or whitespace-only) tail segment,
/// which is discarded. Any other unparseable segment fails the whole store.
pub(super) fn import(name: StoreName, text: &str) -> Result<Vec<CertificateRecord>> {
    let mut segments: Vec<&str> = text.split(END_CERTIFICATE).collect();
    if segments.last().is_some_and(|tail| tail.trim().is_empty()) {
        segments.pop();
    }

    let mut records = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let block = format!("{segment}{END_CERTIFICATE}");
        let record = extract::record_from_pem(&block).map_err(|e| {
            TrustProbeError::MalformedTrustStore {
                store: name.to_string(),
                reason: format!("certificate {}: {e}", index + 1),
            }
        })?;
        records.push(record);
    }
    Ok(records)
}
