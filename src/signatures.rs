//! Tracker signature database and classification.
//!
//! The database is an ordered set of substring patterns identifying
//! advertising, analytics, and crash-reporting SDK components, plus two
//! special lists:
//!
//! - a **disable override**: components that are matched but must never be
//!   deleted, because code elsewhere in the app still references them by
//!   reflection or merger-injected calls. Deleting the class crashes the app
//!   at class-load time; disabling leaves it resolvable but inert.
//! - a **permission denylist**: exact permission names removed regardless of
//!   pattern match.
//!
//! The database is immutable once built and shared read-only across
//! concurrent pipeline runs. [`SignatureDatabase::default`] returns the
//! built-in table; custom tables are assembled with the builder methods.
//!
//! # Example
//!
//! ```rust
//! use apkscrub::{Action, SignatureDatabase};
//!
//! let db = SignatureDatabase::default();
//! assert_eq!(db.classify("com.google.android.gms.ads.AdService"), Action::Delete);
//! assert_eq!(db.classify("com.example.MainActivity"), Action::Keep);
//! assert_eq!(
//!     db.classify_permission("com.google.android.gms.permission.AD_ID"),
//!     Action::Delete
//! );
//! ```

/// The decision for a single manifest element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Leave the element untouched.
    Keep,
    /// Keep the element but set `android:enabled="false"` and
    /// `android:exported="false"`.
    Disable,
    /// Detach the element from its parent.
    Delete,
}

/// An immutable table of tracker name signatures.
///
/// Pattern matching is case-insensitive substring containment; the
/// permission denylist is matched exactly. See the module docs for the
/// override semantics.
#[derive(Debug, Clone)]
pub struct SignatureDatabase {
    /// Substring patterns, lowercased at construction.
    patterns: Vec<String>,
    /// Names matched before patterns and disabled instead of deleted.
    disable_override: Vec<String>,
    /// Exact permission names always removed.
    permission_denylist: Vec<String>,
}

impl SignatureDatabase {
    /// Creates an empty database that keeps everything.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            disable_override: Vec::new(),
            permission_denylist: Vec::new(),
        }
    }

    /// Adds a delete pattern (case-insensitive substring).
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into().to_lowercase());
        self
    }

    /// Adds a disable-override name (case-insensitive substring, checked
    /// before the delete patterns).
    pub fn with_disable_override(mut self, name: impl Into<String>) -> Self {
        self.disable_override.push(name.into().to_lowercase());
        self
    }

    /// Adds an exact-match permission to the denylist.
    pub fn with_denied_permission(mut self, name: impl Into<String>) -> Self {
        self.permission_denylist.push(name.into());
        self
    }

    /// Returns the number of delete patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Classifies a component by its qualified name.
    ///
    /// The disable override is checked before the pattern set. This is a
    /// safety override, not a specificity priority: a name matching both
    /// lists must be disabled, never deleted.
    pub fn classify(&self, name: &str) -> Action {
        if name.is_empty() {
            return Action::Keep;
        }
        let lower = name.to_lowercase();
        if self.disable_override.iter().any(|n| lower.contains(n)) {
            return Action::Disable;
        }
        if self.matches_lowered(&lower) {
            return Action::Delete;
        }
        Action::Keep
    }

    /// Classifies a `uses-permission` name.
    ///
    /// Exact match against the denylist or substring match against the
    /// pattern set yields [`Action::Delete`]; never [`Action::Disable`].
    pub fn classify_permission(&self, name: &str) -> Action {
        if name.is_empty() {
            return Action::Keep;
        }
        if self.permission_denylist.iter().any(|p| p == name) {
            return Action::Delete;
        }
        if self.matches_pattern(name) {
            return Action::Delete;
        }
        Action::Keep
    }

    /// Returns `true` if the name matches any delete pattern.
    ///
    /// This is the raw pattern test, without the disable override; the
    /// queries pass uses it to match `intent` action names.
    pub fn matches_pattern(&self, name: &str) -> bool {
        !name.is_empty() && self.matches_lowered(&name.to_lowercase())
    }

    fn matches_lowered(&self, lower: &str) -> bool {
        self.patterns.iter().any(|p| lower.contains(p))
    }
}

impl Default for SignatureDatabase {
    /// Returns the built-in signature table.
    fn default() -> Self {
        let mut db = Self::empty();
        for name in DISABLE_OVERRIDE {
            db = db.with_disable_override(*name);
        }
        for name in PERMISSION_DENYLIST {
            db = db.with_denied_permission(*name);
        }
        for pattern in PATTERNS {
            db = db.with_pattern(*pattern);
        }
        db
    }
}

/// Components that must not be deleted (class-load crash otherwise) but are
/// rendered inert instead.
const DISABLE_OVERRIDE: &[&str] = &[
    "com.onesignal.core.activities.PermissionsActivity",
    "com.onesignal.core.services.SyncJobService",
];

/// Permissions removed unconditionally.
const PERMISSION_DENYLIST: &[&str] = &[
    "com.google.android.gms.permission.AD_ID",
    "android.permission.AD_ID",
    "android.permission.AD_SERVICES_CONFIG",
    "android.permission.ACCESS_ADSERVICES_AD_ID",
    "android.permission.ACCESS_ADSERVICES_ATTRIBUTION",
    "android.permission.ACCESS_ADSERVICES_TOPICS",
];

/// The built-in tracker pattern corpus.
const PATTERNS: &[&str] = &[
    // Google & Firebase
    "com.google.android.gms.ads",
    "com.google.android.gms.analytics",
    "com.google.android.gms.measurement",
    "com.google.android.gms.tagmanager",
    "com.google.android.finsky.permission.BIND_GET_INSTALL_REFERRER_SERVICE",
    "google.android.datatransport",
    "com.google.firebase.analytics",
    "com.google.firebase.crashlytics",
    "io.invertase.firebase",
    "android.billingclient",
    "com.android.vending.billing",
    "android.adservices",
    "google.android.gms.ads.mediationtestsuite",
    // Meta / Facebook
    "com.facebook.ads",
    "com.facebook.sdk.appevents",
    "com.facebook.sdk.advertiserid",
    "facebook.ads.AudienceNetworkContentProvider",
    // Amazon
    "amazon.device.ads",
    "amazon.aps.ads",
    "amazon.client.metrics",
    "amazonaws",
    // Huawei
    "huawei.hms",
    "huawei.agconnect",
    "huawei.appmarket.service",
    "huawei.hff",
    "huawei.hwid",
    // Analytics / crash / attribution
    "com.appsflyer",
    "com.adjust.sdk",
    "io.sentry",
    "com.bugsnag",
    "com.instabug",
    "org.acra",
    "ch.tutti.acra",
    "com.flurry",
    "com.mixpanel",
    "com.amplitude",
    "com.segment",
    "com.contentsquare",
    "com.clevertap",
    "com.moengage",
    "com.braze",
    "com.urbanairship",
    "cn.thinkingdata.analytics",
    "gameanalytics",
    "com.uxcam",
    "com.appsee",
    "io.appmetrica",
    "yandex.metrica",
    "com.sensorsdata",
    "cn.jpush",
    "heytap.msp",
    "wandoujia.zendesk",
    "com.appbrain",
    // OneSignal (component-precise entries; core classes live in the
    // disable override)
    "onesignal.notificationDismissReceiver",
    "onesignal.notificationOpenedReceiver",
    "onesignal.FCMBroadcastReceiver",
    "onesignal.HmsMessageServiceOneSignal",
    "onesignal.FCMIntentService",
    "onesignal.NotificationOpenedActivity",
    "onesignal.UpgradeReceiver",
    "onesignal.BootUpReceiver",
    "onesignal.BadgeCount",
    "onesignal.notifications.services",
    "onesignal.notifications.receivers",
    "onesignal.core.receivers",
    "onesignal.core.services",
    "onesignal.core.activities",
    // Ad networks
    "com.applovin",
    "com.mopub",
    "com.ironsource",
    "com.unity3d.ads",
    "com.unity3d.services.ads",
    "com.vungle",
    "com.adcolony",
    "com.chartboost",
    "com.startapp",
    "com.inmobi",
    "com.tapjoy",
    "com.fyber",
    "com.ogury",
    "com.onesignal",
    "io.presage",
    "com.criteo",
    "com.pubmatic",
    "net.pubnative",
    "com.appnext",
    "com.appodeal",
    "com.smaato",
    "com.smartadserver",
    "com.yoc.visx",
    "io.bidmachine",
    "com.tradplus",
    "com.anythink",
    "com.adxcorp",
    "com.mbridge.msdk",
    "com.mintegral",
    "com.bytedance.sdk",
    "com.pangle",
    "yandex.mobile.ads",
    "my.target",
    "my.tracker",
    "com.mytarget",
    "ru.vk.api.sdk",
    "tv.superawesome.sdk",
    "tv.teads.sdk",
    "com.mobilefuse",
    "com.wortise.ads",
    "com.loopme",
    "io.didomi.sdk",
    "com.adadapted",
    "com.explorestack",
    "sg.bigo.ads",
    "com.helpshift",
    "com.anzu.sdk",
    "com.hyprmx",
    "com.tappx",
    "com.gomfactory.adpie",
    "com.igaworks",
    "com.kakao.adfit",
    "com.mobon.sdk",
    "com.admixer",
    "com.coupang.ads",
    "tech.crackle",
    "co.notix",
    "com.five_corp.ad",
    "com.admost.sdk",
    "net.nend",
    "com.mngads",
    "org.prebid",
    "com.adswizz",
    "com.feedad",
    "com.rtb.sdk",
    "com.miui.systemAdSolution",
    "com.sina.weibo.sdk",
    "com.moloco.sdk",
    "tp.adx.sdk",
    "tutelatechnologies",
    "jio.jioads",
    "braintreepayments",
    "io.adjoe.sdk",
    // Meta-data flag keys
    "google_analytics_",
    "firebase_performance_",
    "firebase_analytics_",
    "firebase_crashlytics_",
    "firebase_crash_collection",
    "app_measurement_",
    "app_data_collection",
    "auto_data_collection",
    "analytics_collection",
    "ad_personalization",
    "ad_storage",
    "user_data_policy",
    "advertiser_id_collection",
    "delivery_metrics_exported",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_kept() {
        let db = SignatureDatabase::default();
        assert_eq!(db.classify(""), Action::Keep);
        assert_eq!(db.classify_permission(""), Action::Keep);
        assert!(!db.matches_pattern(""));
    }

    #[test]
    fn test_pattern_match_is_substring_and_case_insensitive() {
        let db = SignatureDatabase::default();
        assert_eq!(db.classify("com.google.android.gms.ads.AdService"), Action::Delete);
        assert_eq!(db.classify("COM.GOOGLE.ANDROID.GMS.ADS.ADSERVICE"), Action::Delete);
        assert_eq!(db.classify("com.example.MainActivity"), Action::Keep);
    }

    #[test]
    fn test_disable_override_wins_over_pattern() {
        // "com.onesignal" is a delete pattern, but the SyncJobService is in
        // the override list and must be disabled, never deleted.
        let db = SignatureDatabase::default();
        assert_eq!(
            db.classify("com.onesignal.core.services.SyncJobService"),
            Action::Disable
        );
        assert_eq!(
            db.classify("com.onesignal.UpgradeReceiver"),
            Action::Delete
        );
    }

    #[test]
    fn test_permission_denylist_exact_match() {
        let db = SignatureDatabase::default();
        assert_eq!(
            db.classify_permission("com.google.android.gms.permission.AD_ID"),
            Action::Delete
        );
        assert_eq!(
            db.classify_permission("android.permission.CAMERA"),
            Action::Keep
        );
        // Not in the denylist, but matches the pattern set.
        assert_eq!(
            db.classify_permission("com.google.android.gms.ads.SOME_PERMISSION"),
            Action::Delete
        );
    }

    #[test]
    fn test_custom_database_builder() {
        let db = SignatureDatabase::empty()
            .with_pattern("com.tracker")
            .with_disable_override("com.tracker.KeepMe")
            .with_denied_permission("com.tracker.permission.SPY");
        assert_eq!(db.pattern_count(), 1);
        assert_eq!(db.classify("com.tracker.Service"), Action::Delete);
        assert_eq!(db.classify("com.tracker.KeepMe"), Action::Disable);
        assert_eq!(db.classify("org.unrelated"), Action::Keep);
        assert_eq!(
            db.classify_permission("com.tracker.permission.SPY"),
            Action::Delete
        );
    }

    #[test]
    fn test_permission_never_disabled() {
        let db = SignatureDatabase::empty()
            .with_pattern("spyware")
            .with_disable_override("spyware.special");
        // classify_permission has no disable path; the pattern still hits.
        assert_eq!(db.classify_permission("com.spyware.special.X"), Action::Delete);
    }
}
