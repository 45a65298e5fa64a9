//! The patch pipeline orchestrator.
//!
//! Sequences a full run: extract the manifest → decode (external codec) →
//! patch (rules and/or custom override) → encode (external codec) → rebuild
//! the archive → optionally sign (external signer). The pipeline is the only
//! component that touches the external collaborators.
//!
//! A run executes on one worker thread with no internal parallelism; the
//! target archive is a single append-only stream. Each run owns a scratch
//! directory that is removed on success and failure alike, and emits a
//! one-way stream of log lines to the caller's [`LogSink`]. Multiple runs
//! are independent and share only the read-only [`SignatureDatabase`].
//!
//! # Recovery points
//!
//! Two failures are deliberately recovered:
//!
//! - an unparseable manifest is repackaged unchanged (see
//!   [`patch_manifest`][crate::patch_manifest]);
//! - a signing failure ships the rebuilt unsigned APK with a distinct log
//!   message; the rebuild is never discarded.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{info, warn};
use zip::read::ZipArchive;

use crate::error::{Error, Result};
use crate::events::{CancelFlag, LogSink};
use crate::patch::{self, CustomPatch, PatchEvent, PatchStats};
use crate::repack::{self, MANIFEST_ENTRY, ManifestCompression, RebuildOptions, RebuildSummary};
use crate::signatures::SignatureDatabase;

/// The binary AXML ⇄ text codec boundary.
///
/// The pipeline assumes nothing about the codec's representation, only that
/// decoding is deterministic for valid input and signals failure distinctly
/// from returning empty output.
pub trait ManifestCodec {
    /// Decodes a binary manifest payload to XML text.
    fn decode(&self, axml: &[u8]) -> Result<String>;

    /// Encodes XML text back to a binary manifest payload.
    ///
    /// `resources` is the package's `resources.arsc` payload when the source
    /// archive carries one: the opaque context an encoder needs to resolve
    /// `@string/…`-style references. The pipeline passes it through
    /// unmodified.
    fn encode(&self, xml: &str, resources: Option<&[u8]>) -> Result<Vec<u8>>;
}

/// The external signing boundary (v1/v2/v3 schemes live behind it).
pub trait ApkSigner {
    /// Signs `unsigned` into `signed`, all-or-nothing.
    fn sign(&self, unsigned: &Path, signed: &Path) -> Result<()>;
}

/// Report for a completed pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Patch counters.
    pub stats: PatchStats,
    /// Ordered patch event log.
    pub events: Vec<PatchEvent>,
    /// Archive rebuild summary.
    pub rebuild: RebuildSummary,
    /// `false` when the patch stage fell back to the unchanged manifest.
    pub patched: bool,
    /// `true` when a signer was configured and succeeded.
    pub signed: bool,
}

/// Orchestrates a full patch-and-repackage run.
///
/// # Example
///
/// ```rust,no_run
/// use apkscrub::{PatchPipeline, SignatureDatabase, CustomPatch, NoLog, Result};
/// # use apkscrub::ManifestCodec;
/// # struct MyCodec;
/// # impl ManifestCodec for MyCodec {
/// #     fn decode(&self, _: &[u8]) -> Result<String> { unimplemented!() }
/// #     fn encode(&self, _: &str, _: Option<&[u8]>) -> Result<Vec<u8>> { unimplemented!() }
/// # }
///
/// # fn main() -> Result<()> {
/// let pipeline = PatchPipeline::new(MyCodec, SignatureDatabase::default())
///     .custom_patch(CustomPatch::new().delete("com.example.UnwantedService"));
/// let report = pipeline.run("in.apk".as_ref(), "out.apk".as_ref(), &mut NoLog)?;
/// # Ok(())
/// # }
/// ```
pub struct PatchPipeline<C> {
    codec: C,
    db: SignatureDatabase,
    rules: bool,
    custom: Option<CustomPatch>,
    signer: Option<Box<dyn ApkSigner>>,
    manifest_compression: ManifestCompression,
    cancel: CancelFlag,
}

impl<C: ManifestCodec> PatchPipeline<C> {
    /// Creates a pipeline with the rule engine enabled.
    pub fn new(codec: C, db: SignatureDatabase) -> Self {
        Self {
            codec,
            db,
            rules: true,
            custom: None,
            signer: None,
            manifest_compression: ManifestCompression::default(),
            cancel: CancelFlag::new(),
        }
    }

    /// Enables or disables the rule engine.
    ///
    /// Disabled together with a configured [`custom_patch`][Self::custom_patch],
    /// the pipeline applies only the user's explicit selections.
    pub fn rules(mut self, enabled: bool) -> Self {
        self.rules = enabled;
        self
    }

    /// Layers a user-authored override after the rule engine.
    pub fn custom_patch(mut self, patch: CustomPatch) -> Self {
        self.custom = Some(patch);
        self
    }

    /// Configures an external signer for the rebuilt archive.
    pub fn signer(mut self, signer: Box<dyn ApkSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Sets the compression method for the injected manifest entry.
    pub fn manifest_compression(mut self, method: ManifestCompression) -> Self {
        self.manifest_compression = method;
        self
    }

    /// Returns a handle for cooperative cancellation.
    ///
    /// The flag is polled between archive entries during the rebuild.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Runs the pipeline, writing the result to `output`.
    ///
    /// Scratch files live in a per-run temp directory that is removed on
    /// every exit path; a failed run never leaves a partial `output`
    /// behind unless signing was skipped mid-copy by an I/O error.
    pub fn run(&self, input: &Path, output: &Path, sink: &mut dyn LogSink) -> Result<PipelineReport> {
        let workspace = tempfile::tempdir()?;

        sink.log("extracting AndroidManifest.xml");
        let (manifest, resources) = {
            let mut archive = ZipArchive::new(BufReader::new(File::open(input)?))?;
            let manifest =
                read_entry(&mut archive, MANIFEST_ENTRY)?.ok_or_else(|| Error::ManifestMissing {
                    path: input.display().to_string(),
                })?;
            let resources = read_entry(&mut archive, "resources.arsc")?;
            (manifest, resources)
        };

        sink.log("decoding binary manifest");
        let xml = self.codec.decode(&manifest)?;

        sink.log("patching manifest");
        let db = if self.rules { Some(&self.db) } else { None };
        let (patched_xml, report) = patch::patch_manifest(&xml, db, self.custom.as_ref());
        for event in &report.events {
            sink.log(&event.to_string());
        }
        if report.fallback {
            sink.log("manifest patch failed; repackaging the original manifest");
        }

        sink.log("encoding patched manifest");
        let payload = self.codec.encode(&patched_xml, resources.as_deref())?;

        sink.log("rebuilding archive");
        let unsigned = workspace.path().join("unsigned.apk");
        let rebuild_options = RebuildOptions {
            manifest_compression: self.manifest_compression,
            cancel: Some(self.cancel.clone()),
        };
        let summary = repack::rebuild_path(input, &payload, &unsigned, &rebuild_options)?;

        let mut signed = false;
        if let Some(signer) = &self.signer {
            sink.log("signing");
            match signer.sign(&unsigned, output) {
                Ok(()) => {
                    signed = true;
                    info!("signed output written to {}", output.display());
                }
                Err(err) => {
                    // Signing is all-or-nothing; the rebuilt archive is
                    // shipped unsigned rather than discarded.
                    warn!("signing failed: {err}");
                    sink.log(&format!("signing failed ({err}); shipping unsigned output"));
                }
            }
        }
        if !signed {
            std::fs::copy(&unsigned, output)?;
        }

        sink.log(&format!(
            "done: {} removed, {} disabled",
            report.stats.removed, report.stats.disabled
        ));
        Ok(PipelineReport {
            stats: report.stats,
            events: report.events,
            rebuild: summary,
            patched: !report.fallback,
            signed,
        })
    }
}

/// Reads one entry's decompressed bytes, matching the name
/// case-insensitively.
fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    let actual = archive
        .file_names()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
        .map(str::to_string);
    let Some(actual) = actual else {
        return Ok(None);
    };
    let mut entry = archive.by_name(&actual)?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_report_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<PipelineReport>();
    }

    #[test]
    fn test_read_entry_case_insensitive() {
        use std::io::{Cursor, Write};
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("androidmanifest.XML", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"payload").unwrap();
        let cursor = writer.finish().unwrap();

        let mut archive = ZipArchive::new(cursor).unwrap();
        let bytes = read_entry(&mut archive, MANIFEST_ENTRY).unwrap().unwrap();
        assert_eq!(bytes, b"payload");
        assert!(read_entry(&mut archive, "resources.arsc").unwrap().is_none());
    }
}
