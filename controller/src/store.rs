//! JSON-file settings store. A missing file means the device was never
//! provisioned, which [`SettingsStore::load`] reports as `None`.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use wordclock_common::{DeviceSettings, SettingsStore, StoreError};

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("WORDCLOCK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.wordclock"));
        Self::at(data_dir.join("settings.json"))
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SettingsStore for FileStore {
    fn load(&mut self) -> Result<Option<DeviceSettings>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, settings: &DeviceSettings) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(settings)?;
        std::fs::write(&self.path, payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("wordclock-store-{name}-{}", std::process::id()))
            .join("settings.json")
    }

    #[test]
    fn never_written_store_loads_none() {
        let mut store = FileStore::at(scratch_path("empty"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn settings_round_trip_through_the_file() {
        let path = scratch_path("roundtrip");
        let mut store = FileStore::at(&path);

        let mut settings = DeviceSettings::default();
        settings.wifi_ssid = "home".to_string();
        settings.led_brightness = 42;
        store.save(&settings).unwrap();

        let restored = store.load().unwrap().unwrap();
        assert_eq!(restored, settings);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_record_is_an_error_not_none() {
        let path = scratch_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        let mut store = FileStore::at(&path);
        assert!(store.load().is_err());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
