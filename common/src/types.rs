use serde::{Deserialize, Serialize};

/// RGB colour triple as sent to the LED strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(value: [u8; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    pub fn from_api_str(value: &str) -> Self {
        match value {
            "CLEAR" => Self::Clear,
            "PARTLY_CLOUDY" => Self::PartlyCloudy,
            "CLOUDY" => Self::Cloudy,
            "RAIN" => Self::Rain,
            "SNOW" => Self::Snow,
            "THUNDERSTORM" => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }
}

/// Last successfully fetched outdoor weather values. Replaced wholesale on a
/// successful fetch, untouched on failure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(rename = "temperatureC")]
    pub temperature_c: f32,
    #[serde(rename = "relativeHumidity")]
    pub relative_humidity: f32,
    pub condition: WeatherCondition,
}

/// Pollen load per plant group, levels 0 (none) to 5 (very high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollenSnapshot {
    pub grass: u8,
    pub tree: u8,
    pub weed: u8,
}

impl PollenSnapshot {
    /// The single level driving the pollen indicator LED.
    pub fn worst_level(&self) -> u8 {
        self.grass.max(self.tree).max(self.weed).min(5)
    }
}

/// One sample of the indoor I2C sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndoorReading {
    pub temperature_c: f32,
    pub relative_humidity: f32,
    /// IAQ index, 0 (worst) to 100 (best).
    pub air_quality: f32,
}

/// Which reading set the numeric displays currently show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPage {
    Indoor,
    Outdoor,
}

impl DisplayPage {
    pub fn next(self) -> Self {
        match self {
            Self::Indoor => Self::Outdoor,
            Self::Outdoor => Self::Indoor,
        }
    }
}
