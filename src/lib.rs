//! # apkscrub
//!
//! A pure-Rust library for rewriting Android application packages (APKs):
//! tracker, advertising, and analytics components are removed or neutralized
//! from the binary manifest, and the archive is rebuilt without invalidating
//! the container semantics the Android package installer requires.
//!
//! The library deliberately does **not** implement the binary AXML codec or
//! APK signing. Both are external collaborators behind the [`ManifestCodec`]
//! and [`ApkSigner`] traits. Everything in between lives here: signature
//! matching, manifest tree surgery, and the byte-exact archive rebuild.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apkscrub::{PatchPipeline, SignatureDatabase, NoLog, Result};
//! # use apkscrub::ManifestCodec;
//! # struct MyCodec;
//! # impl ManifestCodec for MyCodec {
//! #     fn decode(&self, _: &[u8]) -> Result<String> { unimplemented!() }
//! #     fn encode(&self, _: &str, _: Option<&[u8]>) -> Result<Vec<u8>> { unimplemented!() }
//! # }
//!
//! fn main() -> Result<()> {
//!     let pipeline = PatchPipeline::new(MyCodec, SignatureDatabase::default());
//!     let report = pipeline.run(
//!         "input.apk".as_ref(),
//!         "output.apk".as_ref(),
//!         &mut NoLog,
//!     )?;
//!     println!(
//!         "removed {} components, disabled {}",
//!         report.stats.removed, report.stats.disabled
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Patching Without a Full Pipeline
//!
//! The patch engine also works directly on decoded manifest text:
//!
//! ```rust
//! use apkscrub::{patch_manifest, SignatureDatabase};
//!
//! let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
//!     <application>
//!         <service android:name="com.google.android.gms.ads.AdService"/>
//!     </application>
//! </manifest>"#;
//!
//! let db = SignatureDatabase::default();
//! let (patched, report) = patch_manifest(xml, Some(&db), None);
//! assert_eq!(report.stats.removed, 1);
//! assert!(!patched.contains("AdService"));
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. A failed manifest patch is the one
//! deliberate exception: patching is best-effort, and a manifest the engine
//! cannot parse is repackaged unchanged rather than blocking the rebuild.
//!
//! ## Safety Model
//!
//! Some tracker SDK classes are referenced by reflection or merger-injected
//! code elsewhere in the app; deleting them causes a class-load crash at
//! runtime. The [`SignatureDatabase`] therefore carries a disable-override
//! list checked *before* delete patterns: matching components are kept but
//! rendered inert with `android:enabled="false"` and
//! `android:exported="false"`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Default buffer size for read operations (8 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

pub mod checksum;
pub mod error;
pub mod events;
pub mod manifest;
pub mod patch;
pub mod pipeline;
pub mod repack;
pub mod signatures;

pub use error::{Error, Result};

// Re-export the signature API at crate root for convenience
pub use signatures::{Action, SignatureDatabase};

// Re-export the manifest tree API
pub use manifest::{ANDROID_NS, AttrName, ManifestTree, NodeId};

// Re-export the patch API
pub use patch::{
    CustomPatch, PatchEvent, PatchReport, PatchStats, apply_custom, apply_rules, patch_manifest,
};

// Re-export the repackaging API
pub use repack::{
    MANIFEST_ENTRY, ManifestCompression, RebuildOptions, RebuildSummary, rebuild, rebuild_path,
};

// Re-export the pipeline API
pub use pipeline::{ApkSigner, ManifestCodec, PatchPipeline, PipelineReport};

// Re-export the event/cancellation API
pub use events::{CancelFlag, LogFn, LogSink, MemoryLog, NoLog, log_fn};
