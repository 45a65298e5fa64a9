//! Streaming APK rebuild.
//!
//! The target archive is written as a single append-only stream while the
//! source directory is walked entry by entry. Entries are classified into
//! four buckets:
//!
//! - the old `AndroidManifest.xml` is skipped and the replacement payload is
//!   injected exactly once at the end with a freshly computed size and CRC;
//! - stale signature files under `META-INF/` are dropped (any content change
//!   invalidates them; re-signing is a separate external step);
//! - native libraries and `resources.arsc` are rewritten uncompressed, which
//!   preserves the layout some Android versions require for those entries;
//! - everything else is recompressed under a new entry descriptor carrying
//!   the original name and timestamp.
//!
//! Any I/O or archive error aborts the rebuild, leaving a partially written
//! target the caller must discard.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use log::{debug, info};
use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::checksum::Crc32Reader;
use crate::error::{Error, Result};
use crate::events::CancelFlag;

/// The sole structurally significant entry name in an APK.
pub const MANIFEST_ENTRY: &str = "AndroidManifest.xml";

/// Compression method for the injected manifest entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ManifestCompression {
    /// Deflate the manifest payload (the default).
    #[default]
    Deflated,
    /// Store the manifest payload uncompressed.
    Stored,
}

/// Knobs for a single rebuild.
#[derive(Debug, Clone, Default)]
pub struct RebuildOptions {
    /// How to write the injected manifest entry.
    pub manifest_compression: ManifestCompression,
    /// Polled between entries; a triggered flag aborts with
    /// [`Error::Cancelled`].
    pub cancel: Option<CancelFlag>,
}

/// Result of a rebuild.
#[must_use = "rebuild summary should be checked to verify the expected entries were written"]
#[derive(Debug, Clone, Default)]
pub struct RebuildSummary {
    /// Entries recompressed under a new descriptor.
    pub entries_copied: usize,
    /// Entries rewritten in STORED mode (`.so`, `resources.arsc`).
    pub entries_stored: usize,
    /// Signature files dropped from `META-INF/`.
    pub signatures_dropped: usize,
    /// Whether the source archive contained a manifest entry to replace.
    pub manifest_replaced: bool,
    /// Size of the injected manifest payload.
    pub manifest_bytes: usize,
}

impl RebuildSummary {
    /// Returns the number of entries written to the target, including the
    /// injected manifest.
    pub fn total_written(&self) -> usize {
        self.entries_copied + self.entries_stored + 1
    }
}

/// Rebuilds an archive around a replacement manifest payload.
///
/// See the module docs for the entry classification. The manifest is
/// injected after the copy pass completes, guaranteeing it is present
/// exactly once regardless of how many (or zero) manifest entries the
/// source carried.
pub fn rebuild<R: Read + Seek, W: Write + Seek>(
    source: R,
    manifest: &[u8],
    target: W,
    options: &RebuildOptions,
) -> Result<RebuildSummary> {
    let mut archive = ZipArchive::new(source)?;
    let mut writer = ZipWriter::new(target);
    let mut summary = RebuildSummary {
        manifest_bytes: manifest.len(),
        ..RebuildSummary::default()
    };

    for index in 0..archive.len() {
        if let Some(cancel) = &options.cancel {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }

        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        if name.eq_ignore_ascii_case(MANIFEST_ENTRY) {
            summary.manifest_replaced = true;
            continue;
        }
        if is_signature_file(&name) {
            debug!("dropping stale signature file: {name}");
            summary.signatures_dropped += 1;
            continue;
        }
        if entry.is_dir() {
            // Directory structure is implied by entry names.
            continue;
        }

        let mut entry_options = SimpleFileOptions::default();
        if let Some(modified) = entry.last_modified() {
            entry_options = entry_options.last_modified_time(modified);
        }

        if is_stored_target(&name) {
            // Read fully, verify against the recorded CRC, and rewrite with
            // compressed size equal to uncompressed size.
            let expected = entry.crc32();
            let size = entry.size() as usize;
            let mut reader = Crc32Reader::new(&mut entry);
            let mut bytes = Vec::with_capacity(size);
            reader.read_to_end(&mut bytes)?;
            let actual = reader.crc();
            if actual != expected {
                return Err(Error::CrcMismatch {
                    entry: name,
                    expected,
                    actual,
                });
            }
            writer.start_file(
                &*name,
                entry_options.compression_method(CompressionMethod::Stored),
            )?;
            writer.write_all(&bytes)?;
            summary.entries_stored += 1;
        } else {
            // A fresh descriptor with a recomputed size, CRC, and compressed
            // size; the source compressed-size field is never trusted
            // through recompression.
            writer.start_file(
                &*name,
                entry_options.compression_method(CompressionMethod::Deflated),
            )?;
            io::copy(&mut entry, &mut writer)?;
            summary.entries_copied += 1;
        }
    }

    let method = match options.manifest_compression {
        ManifestCompression::Deflated => CompressionMethod::Deflated,
        ManifestCompression::Stored => CompressionMethod::Stored,
    };
    writer.start_file(
        MANIFEST_ENTRY,
        SimpleFileOptions::default().compression_method(method),
    )?;
    writer.write_all(manifest)?;
    writer.finish()?;

    info!(
        "rebuilt archive: {} copied, {} stored, {} signatures dropped",
        summary.entries_copied, summary.entries_stored, summary.signatures_dropped
    );
    Ok(summary)
}

/// Path-based convenience wrapper around [`rebuild`].
pub fn rebuild_path(
    source: &Path,
    manifest: &[u8],
    target: &Path,
    options: &RebuildOptions,
) -> Result<RebuildSummary> {
    let reader = BufReader::new(File::open(source)?);
    let writer = BufWriter::new(File::create(target)?);
    rebuild(reader, manifest, writer, options)
}

/// Signature files invalidated by any content change.
fn is_signature_file(name: &str) -> bool {
    if !name.starts_with("META-INF/") {
        return false;
    }
    let upper = name.to_ascii_uppercase();
    upper.ends_with(".SF")
        || upper.ends_with(".RSA")
        || upper.ends_with(".DSA")
        || upper.ends_with(".EC")
        || upper == "META-INF/MANIFEST.MF"
}

/// Entries Android expects to find uncompressed.
fn is_stored_target(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".so") || name.eq_ignore_ascii_case("resources.arsc")
}
