//! Remote data clients for outdoor weather and pollen load, plus the
//! network-dependent bring-up that configures them once per connectivity
//! acquisition.
//!
//! The appliance talks HTTPS+JSON to the weather and pollen services; the
//! transport lives behind these traits and the host build substitutes
//! deterministic simulated readings.

use thiserror::Error;
use tracing::info;

use wordclock_common::{
    DeviceSettings, LinkError, NetworkServices, PollenSnapshot, WeatherCondition, WeatherSnapshot,
};

pub const WEATHER_API_HOST: &str = "weather.googleapis.com";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("client not configured")]
    NotConfigured,
    #[error("remote request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, Copy)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

pub trait WeatherClient {
    fn fetch(&mut self, coordinates: Coordinates) -> Result<WeatherSnapshot, FetchError>;
}

pub trait PollenClient {
    fn fetch(&mut self, coordinates: Coordinates) -> Result<PollenSnapshot, FetchError>;
}

/// Simulated weather service. Readings drift a little per fetch so display
/// updates are visible on the host.
pub struct SimWeatherClient {
    api_key: Option<String>,
    tick: u64,
}

impl SimWeatherClient {
    pub fn new() -> Self {
        Self {
            api_key: None,
            tick: 0,
        }
    }

    pub fn configure(&mut self, api_key: &str) {
        self.api_key = Some(api_key.to_string());
    }
}

impl WeatherClient for SimWeatherClient {
    fn fetch(&mut self, _coordinates: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        if self.api_key.is_none() {
            return Err(FetchError::NotConfigured);
        }

        self.tick = self.tick.wrapping_add(1);
        Ok(WeatherSnapshot {
            temperature_c: 14.0 + (self.tick % 10) as f32 * 0.3,
            relative_humidity: 55.0 + (self.tick % 7) as f32,
            condition: WeatherCondition::PartlyCloudy,
        })
    }
}

/// Simulated pollen service.
pub struct SimPollenClient {
    api_key: Option<String>,
    tick: u64,
}

impl SimPollenClient {
    pub fn new() -> Self {
        Self {
            api_key: None,
            tick: 0,
        }
    }

    pub fn configure(&mut self, api_key: &str) {
        self.api_key = Some(api_key.to_string());
    }
}

impl PollenClient for SimPollenClient {
    fn fetch(&mut self, _coordinates: Coordinates) -> Result<PollenSnapshot, FetchError> {
        if self.api_key.is_none() {
            return Err(FetchError::NotConfigured);
        }

        self.tick = self.tick.wrapping_add(1);
        Ok(PollenSnapshot {
            grass: (self.tick % 6) as u8,
            tree: ((self.tick / 2) % 4) as u8,
            weed: 1,
        })
    }
}

/// Owns both remote clients and performs the one-time, network-dependent
/// initialization: NTP synchronization and API configuration.
pub struct RemoteClients {
    pub weather: SimWeatherClient,
    pub pollen: SimPollenClient,
}

impl RemoteClients {
    pub fn new() -> Self {
        Self {
            weather: SimWeatherClient::new(),
            pollen: SimPollenClient::new(),
        }
    }
}

impl NetworkServices for RemoteClients {
    fn bring_up(&mut self, settings: &DeviceSettings) -> Result<(), LinkError> {
        // The host build takes its time from the system clock; on the
        // appliance this is where the NTP client starts.
        info!(
            "time sync against {} (utc offset {}h)",
            settings.ntp_server, settings.utc_offset_hours
        );

        self.weather.configure(&settings.api_key);
        self.pollen.configure(&settings.api_key);
        info!("remote clients configured for {WEATHER_API_HOST}");
        Ok(())
    }
}
