use serde::{Deserialize, Serialize};

/// Access point the provisioning portal advertises while unconfigured.
pub const PROVISIONING_AP_NAME: &str = "wordclock-setup";
pub const PROVISIONING_AP_PASS: &str = "wordclock";

/// Indoor sensor sampling cadence. Not user-configurable.
pub const SENSOR_SAMPLE_INTERVAL_MS: u64 = 30_000;

/// How often the clock face is re-encoded. Rendering only happens when the
/// resulting phrase differs from the last one pushed to the LEDs.
pub const CLOCK_REDRAW_INTERVAL_MS: u64 = 10_000;

/// Everything the device persists across power cycles. Replaced wholesale on
/// every save; a store with no record at all means "not provisioned yet",
/// which is a different condition from any default value here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(rename = "wifiSsid")]
    pub wifi_ssid: String,
    #[serde(rename = "wifiPass")]
    pub wifi_pass: String,
    #[serde(rename = "ntpServer")]
    pub ntp_server: String,
    #[serde(rename = "utcOffsetHours")]
    pub utc_offset_hours: i8,
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "weatherRefreshMin")]
    pub weather_refresh_min: u32,
    #[serde(rename = "pollenRefreshMin")]
    pub pollen_refresh_min: u32,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "indoorDwellS")]
    pub indoor_dwell_s: u32,
    #[serde(rename = "outdoorDwellS")]
    pub outdoor_dwell_s: u32,
    #[serde(rename = "clockColor")]
    pub clock_color: [u8; 3],
    #[serde(rename = "ledBrightness")]
    pub led_brightness: u8,
    pub volume: u8,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_pass: String::new(),
            ntp_server: "ntp.metas.ch".to_string(),
            utc_offset_hours: 2,
            api_key: String::new(),
            weather_refresh_min: 15,
            pollen_refresh_min: 180,
            latitude: 46.774,
            longitude: 7.640,
            indoor_dwell_s: 8,
            outdoor_dwell_s: 8,
            clock_color: [255, 240, 200],
            led_brightness: 60,
            volume: 12,
        }
    }
}

impl DeviceSettings {
    /// Clamp every field to its usable range before the settings are acted on.
    pub fn sanitize(&mut self) {
        self.utc_offset_hours = self.utc_offset_hours.clamp(-12, 14);
        self.weather_refresh_min = self.weather_refresh_min.clamp(1, 1_440);
        self.pollen_refresh_min = self.pollen_refresh_min.clamp(1, 1_440);
        self.latitude = self.latitude.clamp(-90.0, 90.0);
        self.longitude = self.longitude.clamp(-180.0, 180.0);
        self.indoor_dwell_s = self.indoor_dwell_s.clamp(2, 600);
        self.outdoor_dwell_s = self.outdoor_dwell_s.clamp(2, 600);
        self.led_brightness = self.led_brightness.min(100);
        self.volume = self.volume.min(30);
        if self.ntp_server.trim().is_empty() {
            self.ntp_server = Self::default().ntp_server;
        }
    }

    /// Whether the record carries network credentials at all.
    pub fn has_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }

    pub fn weather_refresh_ms(&self) -> u64 {
        u64::from(self.weather_refresh_min) * 60_000
    }

    pub fn pollen_refresh_ms(&self) -> u64 {
        u64::from(self.pollen_refresh_min) * 60_000
    }

    pub fn dwell_ms(&self, indoor: bool) -> u64 {
        let seconds = if indoor {
            self.indoor_dwell_s
        } else {
            self.outdoor_dwell_s
        };
        u64::from(seconds) * 1_000
    }
}
