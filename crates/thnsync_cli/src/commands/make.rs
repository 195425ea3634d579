//! Make command implementation.

use serde::Serialize;
use std::path::Path;
use thnsync_chunker::{Chunker, ChunkerConfig};
use thnsync_manifest::{
    build_cdc_envelope, build_raw_envelope, summarize_manifest, Envelope, Manifest,
    ManifestSummary,
};

use crate::error::{CliError, CliResult};
use crate::output::{emit, human_bytes};

/// Build result.
#[derive(Debug, Serialize)]
pub struct MakeResult {
    /// Envelope written.
    pub envelope: String,
    /// Manifest summary.
    pub manifest: ManifestSummary,
    /// Distinct chunks shipped.
    pub chunk_count: usize,
    /// Bytes of shipped chunk data.
    pub chunk_bytes: u64,
}

/// Runs the make command.
pub fn run(
    source: &Path,
    out: &Path,
    cdc: bool,
    target: &str,
    previous: Option<&Path>,
    config: ChunkerConfig,
    json: bool,
) -> CliResult<bool> {
    let envelope = if cdc {
        let chunker = Chunker::new(config)?;
        let index = match previous {
            Some(path) => match Envelope::read_from(path)?.manifest {
                Manifest::CdcDelta(m) => Some(m.snapshot_index()),
                Manifest::RawZip(_) => {
                    return Err(CliError::usage(
                        "--previous must name a cdc-delta envelope",
                    ))
                }
            },
            None => None,
        };
        build_cdc_envelope(source, Some(target), &chunker, index.as_ref())?
    } else {
        if previous.is_some() {
            return Err(CliError::usage("--previous only applies to cdc-delta"));
        }
        build_raw_envelope(source, Some(target))?
    };
    envelope.write_to(out)?;

    let result = MakeResult {
        envelope: out.display().to_string(),
        manifest: summarize_manifest(&envelope.manifest.to_value()),
        chunk_count: envelope.chunks.len(),
        chunk_bytes: envelope.chunks.values().map(|c| c.len() as u64).sum(),
    };
    emit(json, &result, |r| {
        format!(
            "wrote {} ({} manifest, {} files, {}; {} chunks, {})",
            r.envelope,
            r.manifest.mode,
            r.manifest.file_count,
            human_bytes(r.manifest.total_size),
            r.chunk_count,
            human_bytes(r.chunk_bytes)
        )
    })?;
    Ok(true)
}
