use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use mockgps_bridge::bridge::{ConfigBridge, ResultSink};
use mockgps_bridge::privilege::SuChannel;
use mockgps_bridge::settings::BridgeSettings;

/// Scratch device: `/bin/sh` plays su, a temp file plays location.conf
pub struct TestDevice {
    tmp: TempDir,
    pub config_path: PathBuf,
}

impl TestDevice {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("mock gps").join("location.conf");
        fs::create_dir_all(config_path.parent().unwrap()).expect("create module dir");
        Self { tmp, config_path }
    }

    pub fn settings(&self, su: &Path) -> BridgeSettings {
        BridgeSettings {
            config_path: self.config_path.to_string_lossy().into_owned(),
            su_binary: su.to_string_lossy().into_owned(),
            ..BridgeSettings::default()
        }
    }

    pub fn bridge(&self) -> ConfigBridge<SuChannel> {
        self.bridge_with(Path::new("/bin/sh"))
    }

    pub fn bridge_with(&self, su: &Path) -> ConfigBridge<SuChannel> {
        let settings = self.settings(su);
        let (sink, _rx) = ResultSink::channel();
        ConfigBridge::new(SuChannel::new(&settings.su_binary), &settings, sink)
    }

    /// Write an executable script that stands in for su
    pub fn fake_su(&self, body: &str) -> PathBuf {
        let path = self.tmp.path().join("fake-su");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake su");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake su");
        path
    }
}
