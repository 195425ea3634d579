//! Chunk availability diagnostics for CDC envelopes.

use std::collections::BTreeSet;

use serde::Serialize;
use thnsync_manifest::{CdcDeltaManifest, Envelope, Manifest};
use thnsync_store::ChunkStore;

/// How the shipped chunks compare to the chunks the manifest references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PayloadCompleteness {
    /// Distinct chunk ids referenced by write entries.
    pub expected: usize,
    /// Referenced ids shipped in the envelope.
    pub present: usize,
    /// Referenced ids not shipped.
    pub missing: Vec<String>,
    /// Shipped ids nothing references.
    pub extra: Vec<String>,
}

/// Whether the referenced chunks can be found at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkHealth {
    /// Store namespace that was consulted.
    pub target: String,
    /// Whether a local store was available.
    pub has_store: bool,
    /// Distinct chunk ids referenced.
    pub unique_chunk_ids: usize,
    /// Ids found neither in the envelope nor in the store.
    pub missing_chunks: Vec<String>,
}

/// Diagnostics reported for `cdc-delta` envelopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CdcDiagnostics {
    /// Envelope contents versus references.
    pub payload_completeness: PayloadCompleteness,
    /// Availability across envelope and store.
    pub chunk_health: ChunkHealth,
}

impl CdcDiagnostics {
    /// Returns true if every referenced chunk is available.
    pub fn is_complete(&self) -> bool {
        self.chunk_health.missing_chunks.is_empty()
    }
}

/// Looks up a chunk in the envelope, then in the store.
pub(crate) fn find_chunk(
    envelope: &Envelope,
    store: Option<&dyn ChunkStore>,
    target: &str,
    id: &str,
) -> Option<Vec<u8>> {
    if let Some(data) = envelope.chunks.get(id) {
        return Some(data.clone());
    }
    store.and_then(|s| s.get(target, id).ok())
}

fn store_has(store: Option<&dyn ChunkStore>, target: &str, id: &str) -> bool {
    store.is_some_and(|s| s.contains(target, id).unwrap_or(false))
}

/// Computes diagnostics for a CDC manifest.
pub fn diagnose_cdc(
    manifest: &CdcDeltaManifest,
    envelope: &Envelope,
    target: &str,
    store: Option<&dyn ChunkStore>,
) -> CdcDiagnostics {
    let referenced: BTreeSet<String> = manifest.referenced_chunks().into_iter().collect();
    let shipped: BTreeSet<&String> = envelope.chunks.keys().collect();

    let missing_from_payload: Vec<String> = referenced
        .iter()
        .filter(|id| !shipped.contains(id))
        .cloned()
        .collect();
    let extra = shipped
        .iter()
        .filter(|id| !referenced.contains(id.as_str()))
        .map(|id| id.to_string())
        .collect();
    let missing_chunks = missing_from_payload
        .iter()
        .filter(|id| !store_has(store, target, id))
        .cloned()
        .collect();

    CdcDiagnostics {
        payload_completeness: PayloadCompleteness {
            expected: referenced.len(),
            present: referenced.len() - missing_from_payload.len(),
            missing: missing_from_payload,
            extra,
        },
        chunk_health: ChunkHealth {
            target: target.to_string(),
            has_store: store.is_some(),
            unique_chunk_ids: referenced.len(),
            missing_chunks,
        },
    }
}

/// Computes diagnostics for any envelope; `None` for `raw-zip`.
pub fn diagnose_envelope(
    envelope: &Envelope,
    target: &str,
    store: Option<&dyn ChunkStore>,
) -> Option<CdcDiagnostics> {
    match &envelope.manifest {
        Manifest::CdcDelta(m) => Some(diagnose_cdc(m, envelope, target, store)),
        Manifest::RawZip(_) => None,
    }
}
