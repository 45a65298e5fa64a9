//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test
//! file compiles as a separate crate and may only use a subset of these
//! helpers.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use apkscrub::{Error, ManifestCodec, Result};
use zip::CompressionMethod;
use zip::read::ZipArchive;
use zip::write::SimpleFileOptions;

/// A fixed timestamp so tests can assert it survives the rebuild.
pub fn fixed_time() -> zip::DateTime {
    zip::DateTime::from_date_and_time(2023, 4, 5, 6, 7, 8).unwrap()
}

/// Builds an in-memory ZIP archive from `(name, data, method)` triples.
pub fn build_archive(entries: &[(&str, &[u8], CompressionMethod)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data, method) in entries {
        let options = SimpleFileOptions::default()
            .compression_method(*method)
            .last_modified_time(fixed_time());
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Builds a minimal plausible APK around the given manifest payload.
///
/// The manifest is stored as plain text so the [`TextCodec`] can stand in
/// for a real AXML codec.
pub fn build_apk(manifest: &str) -> Vec<u8> {
    build_archive(&[
        ("AndroidManifest.xml", manifest.as_bytes(), CompressionMethod::Deflated),
        ("classes.dex", b"dex bytes", CompressionMethod::Deflated),
        ("resources.arsc", b"resource table", CompressionMethod::Stored),
        ("lib/arm64-v8a/libapp.so", b"native code", CompressionMethod::Stored),
        ("assets/config.json", b"{}", CompressionMethod::Deflated),
        ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0", CompressionMethod::Deflated),
        ("META-INF/CERT.SF", b"signature", CompressionMethod::Deflated),
        ("META-INF/CERT.RSA", b"cert", CompressionMethod::Deflated),
        ("META-INF/services/com.example.Spi", b"impl", CompressionMethod::Deflated),
    ])
}

/// Lists entry names in archive order.
pub fn entry_names(archive_bytes: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes.to_vec())).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Reads one entry's decompressed bytes.
pub fn entry_bytes(archive_bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes.to_vec())).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    bytes
}

/// A codec that treats the binary payload as UTF-8 manifest text.
///
/// Stands in for the external AXML codec: decoding fails distinctly on
/// non-UTF-8 payloads, encoding is the identity.
pub struct TextCodec;

impl ManifestCodec for TextCodec {
    fn decode(&self, axml: &[u8]) -> Result<String> {
        String::from_utf8(axml.to_vec()).map_err(|e| Error::Decode(e.to_string()))
    }

    fn encode(&self, xml: &str, _resources: Option<&[u8]>) -> Result<Vec<u8>> {
        Ok(xml.as_bytes().to_vec())
    }
}

/// A codec whose decode always fails.
pub struct BrokenCodec;

impl ManifestCodec for BrokenCodec {
    fn decode(&self, _axml: &[u8]) -> Result<String> {
        Err(Error::Decode("unsupported chunk type".into()))
    }

    fn encode(&self, _xml: &str, _resources: Option<&[u8]>) -> Result<Vec<u8>> {
        Err(Error::Encode("unreachable".into()))
    }
}

/// A manifest exercising every rule pass.
pub const TRACKED_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <uses-permission android:name="android.permission.INTERNET"/>
    <uses-permission android:name="com.google.android.gms.permission.AD_ID"/>
    <queries>
        <package android:name="com.facebook.ads.helper"/>
        <package android:name="com.example.companion"/>
        <intent>
            <action android:name="com.google.android.gms.ads.identifier.service.START"/>
            <action android:name="android.intent.action.VIEW"/>
        </intent>
        <intent>
            <action android:name="android.intent.action.SEND"/>
        </intent>
    </queries>
    <application android:label="Example">
        <activity android:name="com.example.MainActivity"/>
        <service android:name="com.google.android.gms.ads.AdService"/>
        <receiver android:name="com.onesignal.core.services.SyncJobService"/>
        <meta-data android:name="com.google.firebase.analytics.FLAG" android:value="true"/>
    </application>
</manifest>"#;
