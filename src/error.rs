//! Error types for APK patching and repackaging.
//!
//! This module provides the [`Error`] enum covering all failure modes of the
//! patch pipeline, along with a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations return `Result<T, Error>`:
//!
//! ```rust,no_run
//! use apkscrub::{Error, Result, rebuild_path, RebuildOptions};
//!
//! fn repackage(input: &str, output: &str, manifest: &[u8]) -> Result<()> {
//!     match rebuild_path(input.as_ref(), manifest, output.as_ref(), &RebuildOptions::default()) {
//!         Ok(summary) => {
//!             println!("wrote {} entries", summary.total_written());
//!             Ok(())
//!         }
//!         Err(Error::Io(e)) => {
//!             eprintln!("I/O error: {e}");
//!             Err(Error::Io(e))
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! # Recovery Points
//!
//! Two errors are recovered rather than propagated, by design:
//!
//! - [`Error::Patch`]: the patch stage falls back to the unmodified
//!   manifest payload; a malformed manifest never blocks repackaging.
//! - [`Error::Sign`]: the pipeline ships the rebuilt unsigned APK with a
//!   distinct log message; signing failure never discards the rebuild.
//!
//! Everything else is fatal for the current run.

use std::io;

/// The main error type for APK patching operations.
///
/// Each variant carries enough context to produce a human-readable message;
/// nothing is silently swallowed except the deliberate patch fallback
/// documented at the module level.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source or target archive could not be read or written.
    ///
    /// Wraps the underlying ZIP-format error: a corrupt central directory,
    /// a truncated entry, an unsupported compression method, and so on.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The source archive contains no `AndroidManifest.xml` entry.
    ///
    /// Raised before decoding; a package without a manifest is not a
    /// patchable APK.
    #[error("no AndroidManifest.xml entry in {path}")]
    ManifestMissing {
        /// The archive that was searched.
        path: String,
    },

    /// The binary manifest codec rejected the payload.
    #[error("manifest decode failed: {0}")]
    Decode(String),

    /// The manifest codec could not re-encode the patched text.
    #[error("manifest encode failed: {0}")]
    Encode(String),

    /// Manifest tree parsing or transformation failed.
    ///
    /// Never surfaced by the pipeline: [`patch_manifest`] catches it and
    /// returns the pre-patch payload unchanged, reporting the fallback in
    /// its event log.
    ///
    /// [`patch_manifest`]: crate::patch_manifest
    #[error("manifest patch failed: {0}")]
    Patch(String),

    /// Decompressed entry bytes do not match the CRC recorded in the source
    /// archive.
    ///
    /// Raised while rewriting an uncompressed-target entry (`.so`,
    /// `resources.arsc`); the source archive is corrupt and the rebuild is
    /// aborted rather than producing a package that cannot install.
    #[error("CRC mismatch for entry {entry}: expected {expected:#x}, got {actual:#x}")]
    CrcMismatch {
        /// The entry name with the CRC mismatch.
        entry: String,
        /// The CRC value recorded in the source archive.
        expected: u32,
        /// The CRC computed over the decompressed bytes.
        actual: u32,
    },

    /// The external signer failed.
    ///
    /// Recovered at the pipeline level only: the unsigned output is shipped
    /// and the failure is logged.
    #[error("signing failed: {0}")]
    Sign(String),

    /// The operation was cancelled.
    ///
    /// Raised at the cooperative checkpoint between archive entries when a
    /// [`CancelFlag`] has been triggered. The partially written target must
    /// be discarded by the caller.
    ///
    /// [`CancelFlag`]: crate::CancelFlag
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if this error aborts the pipeline run.
    ///
    /// [`Patch`][Self::Patch] and [`Sign`][Self::Sign] are recovered at
    /// their respective stages; everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Patch(_) | Error::Sign(_))
    }

    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CrcMismatch { .. })
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::CrcMismatch { entry, .. } => Some(entry.as_str()),
            _ => None,
        }
    }
}

/// A specialized Result type for APK patching operations.
pub type Result<T> = std::result::Result<T, Error>;
