//! Integration tests for the rule-based patch engine.

mod common;

use apkscrub::manifest::{parse_document, write_document};
use apkscrub::{PatchEvent, PatchStats, SignatureDatabase, apply_rules, patch_manifest};

use common::TRACKED_MANIFEST;

#[test]
fn removes_tracker_service_and_ad_id_permission() {
    let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
        <uses-permission android:name="com.google.android.gms.permission.AD_ID"/>
        <application>
            <service android:name="com.google.android.gms.ads.AdService"/>
        </application>
    </manifest>"#;

    let db = SignatureDatabase::default();
    let mut tree = parse_document(xml).unwrap();
    let report = apply_rules(&mut tree, &db);

    assert_eq!(report.stats, PatchStats { removed: 2, disabled: 0 });
    let out = write_document(&tree).unwrap();
    assert!(!out.contains("AdService"));
    assert!(!out.contains("AD_ID"));
}

#[test]
fn disable_override_keeps_component_inert() {
    let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
        <application>
            <receiver android:name="com.onesignal.core.services.SyncJobService"/>
        </application>
    </manifest>"#;

    let db = SignatureDatabase::default();
    let mut tree = parse_document(xml).unwrap();
    let report = apply_rules(&mut tree, &db);

    assert_eq!(report.stats, PatchStats { removed: 0, disabled: 1 });
    let receiver = tree.elements_by_tag(tree.root(), "receiver")[0];
    assert_eq!(tree.android_attr(receiver, "enabled"), Some("false"));
    assert_eq!(tree.android_attr(receiver, "exported"), Some("false"));
}

#[test]
fn apply_is_idempotent() {
    let db = SignatureDatabase::default();
    let mut tree = parse_document(TRACKED_MANIFEST).unwrap();

    let first = apply_rules(&mut tree, &db);
    assert!(!first.stats.is_empty());
    let after_first = write_document(&tree).unwrap();

    let second = apply_rules(&mut tree, &db);
    assert_eq!(second.stats, PatchStats { removed: 0, disabled: 0 });
    assert!(second.events.is_empty());
    assert_eq!(write_document(&tree).unwrap(), after_first);
}

#[test]
fn full_rule_sweep_over_tracked_manifest() {
    let db = SignatureDatabase::default();
    let mut tree = parse_document(TRACKED_MANIFEST).unwrap();
    let report = apply_rules(&mut tree, &db);

    // service + meta-data + permission + queried package + queried intent
    assert_eq!(report.stats, PatchStats { removed: 5, disabled: 1 });

    let out = write_document(&tree).unwrap();
    assert!(out.contains("com.example.MainActivity"));
    assert!(out.contains("android.permission.INTERNET"));
    assert!(out.contains("com.example.companion"));
    assert!(!out.contains("AdService"));
    assert!(!out.contains("com.facebook.ads.helper"));
    assert!(!out.contains("com.google.firebase.analytics.FLAG"));
}

#[test]
fn query_intent_removed_as_a_unit() {
    let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
        <queries>
            <intent>
                <action android:name="com.google.android.gms.ads.identifier.service.START"/>
                <action android:name="android.intent.action.VIEW"/>
            </intent>
        </queries>
    </manifest>"#;

    let db = SignatureDatabase::default();
    let mut tree = parse_document(xml).unwrap();
    let report = apply_rules(&mut tree, &db);

    assert_eq!(report.stats.removed, 1);
    // The whole intent is gone, including the non-matching action.
    assert!(tree.elements_by_tag(tree.root(), "intent").is_empty());
    assert!(tree.elements_by_tag(tree.root(), "action").is_empty());
    let queries = tree.elements_by_tag(tree.root(), "queries");
    assert_eq!(queries.len(), 1);
}

#[test]
fn unqualified_name_attribute_still_classified() {
    // Decoders sometimes drop namespace bindings; the engine falls back to
    // the bare attribute.
    let xml = r#"<manifest>
        <application>
            <service name="com.google.android.gms.ads.AdService"/>
        </application>
    </manifest>"#;

    let db = SignatureDatabase::default();
    let mut tree = parse_document(xml).unwrap();
    let report = apply_rules(&mut tree, &db);
    assert_eq!(report.stats.removed, 1);
}

#[test]
fn activity_alias_uses_library_and_property_are_covered() {
    let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
        <application>
            <activity-alias android:name="com.applovin.EntryAlias"/>
            <uses-library android:name="com.huawei.hms.core"/>
            <property android:name="android.adservices.AD_SERVICES_CONFIG" android:resource="@xml/x"/>
        </application>
    </manifest>"#;

    let db = SignatureDatabase::default();
    let mut tree = parse_document(xml).unwrap();
    let report = apply_rules(&mut tree, &db);
    assert_eq!(report.stats.removed, 3);

    let app = tree.application().unwrap();
    assert!(tree.children(app).is_empty());
}

#[test]
fn event_log_names_each_change() {
    let db = SignatureDatabase::default();
    let mut tree = parse_document(TRACKED_MANIFEST).unwrap();
    let report = apply_rules(&mut tree, &db);

    assert!(report.events.contains(&PatchEvent::ComponentRemoved {
        tag: "service".into(),
        name: "com.google.android.gms.ads.AdService".into(),
    }));
    assert!(report.events.contains(&PatchEvent::ComponentDisabled {
        tag: "receiver".into(),
        name: "com.onesignal.core.services.SyncJobService".into(),
    }));
    assert!(report.events.contains(&PatchEvent::PermissionRemoved {
        name: "com.google.android.gms.permission.AD_ID".into(),
    }));
    assert_eq!(report.events.len(), 6);
}

#[test]
fn malformed_manifest_passes_through_unchanged() {
    let db = SignatureDatabase::default();
    let input = "<manifest><application></manifest>";
    let (out, report) = patch_manifest(input, Some(&db), None);
    assert_eq!(out, input);
    assert!(report.fallback);
    assert!(report.stats.is_empty());
}

#[test]
fn patch_manifest_text_level_end_to_end() {
    let db = SignatureDatabase::default();
    let (out, report) = patch_manifest(TRACKED_MANIFEST, Some(&db), None);
    assert!(!report.fallback);
    assert_eq!(report.stats, PatchStats { removed: 5, disabled: 1 });
    assert!(out.starts_with("<?xml"));
    assert!(out.contains(r#"xmlns:android="http://schemas.android.com/apk/res/android""#));
    assert!(!out.contains("AdService"));
}
