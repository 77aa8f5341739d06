//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Device-side paths
pub mod paths {
    /// Location config read by the on-device module
    pub const LOCATION_CONF: &str = "/data/adb/modules/mockgps/location.conf";

    /// Well-known su locations across root solutions (Magisk, KernelSU, legacy SuperSU)
    pub const KNOWN_SU_PATHS: &[&str] = &[
        "/system/bin/su",
        "/system/xbin/su",
        "/sbin/su",
        "/debug_ramdisk/su",
        "/su/bin/su",
    ];

    /// Sink for discarded stderr inside elevated commands
    pub const DEV_NULL: &str = "/dev/null";
}

/// Elevated channel protocol
pub mod shell {
    /// Default su binary (resolved through PATH)
    pub const DEFAULT_SU: &str = "su";

    /// Instruction written after every command so the channel closes
    pub const EXIT: &str = "exit";

    /// Permission mode applied to the config file after every write
    pub const FILE_MODE: &str = "644";

    /// Line openings su implementations print when they refuse elevation
    pub const DENIAL_MARKERS: &[&str] = &[
        "superuser request rejected",
        "request rejected",
        "not allowed to su",
        "access denied",
    ];
}

/// User-facing notification texts
pub mod messages {
    pub const SAVED: &str = "Config saved \u{2713}";
    pub const ROOT_REQUIRED: &str = "Root access required!";
}

/// Settings file location
pub mod config {
    /// Directory under the user's config dir
    pub const APP_DIR: &str = "mockgps-bridge";

    /// Settings filename
    pub const FILENAME: &str = "settings.json";

    /// Environment override for the target config path
    pub const ENV_CONFIG_PATH: &str = "MOCKGPS_CONFIG_PATH";

    /// Environment override for the su binary
    pub const ENV_SU: &str = "MOCKGPS_SU";
}

/// Watch loop defaults
pub mod watch {
    /// Poll interval used by the on-device module's own config watcher
    pub const DEFAULT_INTERVAL_SECS: u64 = 3;
}
