//! Host stand-in for the station-mode Wi-Fi radio. The real appliance build
//! plugs the radio driver in behind the same trait.

use tracing::info;

use wordclock_common::{LinkError, NetworkConnector};

/// Simulated Wi-Fi link. Joins any non-empty SSID; setting
/// `WORDCLOCK_SIM_OFFLINE=1` makes the link report as down, which exercises
/// the reconnect path by hand.
pub struct HostWifi {
    connected: bool,
}

impl HostWifi {
    pub fn new() -> Self {
        Self { connected: false }
    }

    fn forced_offline() -> bool {
        std::env::var("WORDCLOCK_SIM_OFFLINE")
            .map(|value| value == "1")
            .unwrap_or(false)
    }
}

impl NetworkConnector for HostWifi {
    fn connect(&mut self, ssid: &str, _pass: &str) -> Result<(), LinkError> {
        if ssid.is_empty() {
            return Err(LinkError::Connect("no SSID configured".to_string()));
        }
        if Self::forced_offline() {
            return Err(LinkError::Connect("simulated association failure".to_string()));
        }

        info!("joined network '{ssid}'");
        self.connected = true;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        if Self::forced_offline() {
            self.connected = false;
        }
        self.connected
    }
}
