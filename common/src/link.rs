//! Connectivity state machine: provisioning, connection, and reconnection.
//!
//! The manager owns the [`ConnectivityState`] and the adopted
//! [`DeviceSettings`]; all side effects go through the collaborator traits so
//! the machine itself stays host-testable. One `step()` call performs at most
//! one transition.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{DeviceSettings, PROVISIONING_AP_NAME, PROVISIONING_AP_PASS};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings store i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings record corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("network connect failed: {0}")]
    Connect(String),
    #[error("provisioning portal failed to start: {0}")]
    PortalStart(String),
    #[error("network bring-up failed: {0}")]
    BringUp(String),
}

/// Persists the device settings across power cycles. A store that was never
/// written reports `Ok(None)`.
pub trait SettingsStore {
    fn load(&mut self) -> Result<Option<DeviceSettings>, StoreError>;
    fn save(&mut self, settings: &DeviceSettings) -> Result<(), StoreError>;
}

/// The station-mode radio link.
pub trait NetworkConnector {
    fn connect(&mut self, ssid: &str, pass: &str) -> Result<(), LinkError>;
    fn is_connected(&mut self) -> bool;
}

/// Notification drained from the provisioning portal. The original firmware
/// delivered this through a callback from the web server's call stack; here
/// it is a value returned from `poll()`.
#[derive(Debug, Clone)]
pub enum PortalEvent {
    SettingsSaved(DeviceSettings),
}

/// The browser-facing configuration server. `start` is idempotent; a start
/// failure is the device's only fatal condition.
pub trait ProvisioningPortal {
    fn start(&mut self, ap_name: &str, ap_pass: &str) -> Result<(), LinkError>;
    fn poll(&mut self) -> Option<PortalEvent>;
}

/// Network-dependent one-time initialization: NTP sync and remote API
/// configuration. Runs once per connectivity acquisition.
pub trait NetworkServices {
    fn bring_up(&mut self, settings: &DeviceSettings) -> Result<(), LinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Initializing,
    ProvisioningMode,
    Connecting,
    Operating,
    ConnectivityLost,
}

impl ConnectivityState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::ProvisioningMode => "PROVISIONING",
            Self::Connecting => "CONNECTING",
            Self::Operating => "OPERATING",
            Self::ConnectivityLost => "CONNECTIVITY_LOST",
        }
    }
}

/// What the control loop has to act on after a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Entered operating state through a fresh connect; force every
    /// remote-data task once.
    pub force_remote_refresh: bool,
    /// New settings were adopted this step.
    pub settings_changed: bool,
}

#[derive(Debug)]
pub struct LinkManager {
    state: ConnectivityState,
    settings: Option<DeviceSettings>,
    bring_up_done: bool,
}

impl Default for LinkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkManager {
    pub fn new() -> Self {
        Self {
            state: ConnectivityState::Initializing,
            settings: None,
            bring_up_done: false,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn settings(&self) -> Option<&DeviceSettings> {
        self.settings.as_ref()
    }

    pub fn is_operating(&self) -> bool {
        self.state == ConnectivityState::Operating
    }

    /// Advance the machine by at most one transition. The only error that
    /// escapes is a portal start failure, which the caller treats as fatal.
    pub fn step<S, N, P, V>(
        &mut self,
        store: &mut S,
        net: &mut N,
        portal: &mut P,
        services: &mut V,
    ) -> Result<StepOutcome, LinkError>
    where
        S: SettingsStore,
        N: NetworkConnector,
        P: ProvisioningPortal,
        V: NetworkServices,
    {
        let mut outcome = StepOutcome::default();

        match self.state {
            ConnectivityState::Initializing => match store.load() {
                Ok(Some(mut settings)) => {
                    settings.sanitize();
                    if settings.has_credentials() {
                        self.settings = Some(settings);
                        self.transition(ConnectivityState::Connecting);
                    } else {
                        self.enter_provisioning(portal)?;
                    }
                }
                Ok(None) => self.enter_provisioning(portal)?,
                Err(err) => {
                    warn!("settings load failed, treating store as empty: {err}");
                    self.enter_provisioning(portal)?;
                }
            },

            ConnectivityState::ProvisioningMode => {
                if let Some(PortalEvent::SettingsSaved(settings)) = portal.poll() {
                    self.adopt(settings, store);
                    outcome.settings_changed = true;
                    self.transition(ConnectivityState::Connecting);
                }
            }

            ConnectivityState::Connecting => {
                let Some(settings) = self.settings.clone() else {
                    self.enter_provisioning(portal)?;
                    return Ok(outcome);
                };

                match net.connect(&settings.wifi_ssid, &settings.wifi_pass) {
                    Ok(()) => {
                        self.try_bring_up(services, &settings);
                        // The same server carries the operating-mode
                        // configuration endpoint.
                        portal.start(PROVISIONING_AP_NAME, PROVISIONING_AP_PASS)?;
                        outcome.force_remote_refresh = true;
                        self.transition(ConnectivityState::Operating);
                    }
                    Err(err) => {
                        warn!("connect failed: {err}");
                        self.enter_provisioning(portal)?;
                    }
                }
            }

            ConnectivityState::Operating => {
                if let Some(PortalEvent::SettingsSaved(settings)) = portal.poll() {
                    let credentials_changed = self
                        .settings
                        .as_ref()
                        .map(|old| {
                            old.wifi_ssid != settings.wifi_ssid
                                || old.wifi_pass != settings.wifi_pass
                        })
                        .unwrap_or(true);
                    self.adopt(settings, store);
                    outcome.settings_changed = true;

                    if credentials_changed {
                        self.transition(ConnectivityState::Connecting);
                        return Ok(outcome);
                    }
                }

                if !net.is_connected() {
                    warn!("connectivity check failed");
                    self.transition(ConnectivityState::ConnectivityLost);
                }
            }

            ConnectivityState::ConnectivityLost => {
                let Some(settings) = self.settings.clone() else {
                    self.enter_provisioning(portal)?;
                    return Ok(outcome);
                };

                match net.connect(&settings.wifi_ssid, &settings.wifi_pass) {
                    Ok(()) => {
                        // Initialization that already succeeded is not
                        // repeated; one still pending gets its retry here.
                        self.try_bring_up(services, &settings);
                        self.transition(ConnectivityState::Operating);
                    }
                    Err(err) => {
                        warn!("reconnect failed: {err}");
                        self.enter_provisioning(portal)?;
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Run the network-dependent initialization if it has not succeeded yet
    /// for this settings record. A failure is transient: the flag stays
    /// clear so the next connectivity acquisition tries again.
    fn try_bring_up<V: NetworkServices>(&mut self, services: &mut V, settings: &DeviceSettings) {
        if self.bring_up_done {
            return;
        }
        match services.bring_up(settings) {
            Ok(()) => self.bring_up_done = true,
            Err(err) => warn!("network bring-up failed, continuing with stale data: {err}"),
        }
    }

    /// Take new settings from the portal: sanitize, persist, and require a
    /// fresh bring-up since NTP server or API credential may have changed.
    fn adopt<S: SettingsStore>(&mut self, mut settings: DeviceSettings, store: &mut S) {
        settings.sanitize();
        if let Err(err) = store.save(&settings) {
            warn!("settings save failed, keeping in-memory copy: {err}");
        }
        self.settings = Some(settings);
        self.bring_up_done = false;
    }

    fn enter_provisioning<P: ProvisioningPortal>(&mut self, portal: &mut P) -> Result<(), LinkError> {
        portal.start(PROVISIONING_AP_NAME, PROVISIONING_AP_PASS)?;
        self.transition(ConnectivityState::ProvisioningMode);
        Ok(())
    }

    fn transition(&mut self, next: ConnectivityState) {
        if self.state != next {
            info!("link state {} -> {}", self.state.as_str(), next.as_str());
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    #[derive(Default)]
    struct MockStore {
        record: Option<DeviceSettings>,
        saves: usize,
        fail_load: bool,
    }

    impl SettingsStore for MockStore {
        fn load(&mut self) -> Result<Option<DeviceSettings>, StoreError> {
            if self.fail_load {
                return Err(StoreError::Io(std::io::Error::other("disk gone")));
            }
            Ok(self.record.clone())
        }

        fn save(&mut self, settings: &DeviceSettings) -> Result<(), StoreError> {
            self.saves += 1;
            self.record = Some(settings.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockNet {
        connect_results: VecDeque<bool>,
        connected: bool,
        connect_calls: usize,
    }

    impl NetworkConnector for MockNet {
        fn connect(&mut self, _ssid: &str, _pass: &str) -> Result<(), LinkError> {
            self.connect_calls += 1;
            if self.connect_results.pop_front().unwrap_or(true) {
                self.connected = true;
                Ok(())
            } else {
                self.connected = false;
                Err(LinkError::Connect("association timeout".into()))
            }
        }

        fn is_connected(&mut self) -> bool {
            self.connected
        }
    }

    #[derive(Default)]
    struct MockPortal {
        events: VecDeque<PortalEvent>,
        start_calls: usize,
        fail_start: bool,
    }

    impl ProvisioningPortal for MockPortal {
        fn start(&mut self, _ap_name: &str, _ap_pass: &str) -> Result<(), LinkError> {
            self.start_calls += 1;
            if self.fail_start {
                Err(LinkError::PortalStart("bind refused".into()))
            } else {
                Ok(())
            }
        }

        fn poll(&mut self) -> Option<PortalEvent> {
            self.events.pop_front()
        }
    }

    #[derive(Default)]
    struct MockServices {
        bring_up_calls: usize,
        fail_next: bool,
    }

    impl NetworkServices for MockServices {
        fn bring_up(&mut self, _settings: &DeviceSettings) -> Result<(), LinkError> {
            self.bring_up_calls += 1;
            if self.fail_next {
                self.fail_next = false;
                return Err(LinkError::BringUp("ntp unreachable".into()));
            }
            Ok(())
        }
    }

    fn provisioned_settings() -> DeviceSettings {
        DeviceSettings {
            wifi_ssid: "home".to_string(),
            wifi_pass: "secret".to_string(),
            ..DeviceSettings::default()
        }
    }

    struct Rig {
        link: LinkManager,
        store: MockStore,
        net: MockNet,
        portal: MockPortal,
        services: MockServices,
    }

    impl Rig {
        fn new(record: Option<DeviceSettings>) -> Self {
            Self {
                link: LinkManager::new(),
                store: MockStore {
                    record,
                    ..MockStore::default()
                },
                net: MockNet::default(),
                portal: MockPortal::default(),
                services: MockServices::default(),
            }
        }

        fn step(&mut self) -> StepOutcome {
            self.link
                .step(
                    &mut self.store,
                    &mut self.net,
                    &mut self.portal,
                    &mut self.services,
                )
                .expect("step failed")
        }
    }

    #[test]
    fn empty_store_routes_to_provisioning() {
        let mut rig = Rig::new(None);
        rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::ProvisioningMode);
        assert_eq!(rig.portal.start_calls, 1);
    }

    #[test]
    fn store_load_failure_is_treated_as_unprovisioned() {
        let mut rig = Rig::new(None);
        rig.store.fail_load = true;
        rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::ProvisioningMode);
    }

    #[test]
    fn stored_credentials_connect_and_enter_operating() {
        let mut rig = Rig::new(Some(provisioned_settings()));
        rig.step();
        assert_eq!(rig.link.state(), ConnectivityState::Connecting);

        let outcome = rig.step();
        assert_eq!(rig.link.state(), ConnectivityState::Operating);
        assert!(outcome.force_remote_refresh);
        assert_eq!(rig.services.bring_up_calls, 1);
    }

    #[test]
    fn connect_failure_falls_back_to_provisioning() {
        let mut rig = Rig::new(Some(provisioned_settings()));
        rig.net.connect_results.push_back(false);

        rig.step();
        rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::ProvisioningMode);
        assert_eq!(rig.portal.start_calls, 1);
        assert_eq!(rig.services.bring_up_calls, 0);
    }

    #[test]
    fn portal_save_adopts_sanitized_settings_and_connects() {
        let mut rig = Rig::new(None);
        rig.step();

        let mut saved = provisioned_settings();
        saved.volume = 200;
        rig.portal
            .events
            .push_back(PortalEvent::SettingsSaved(saved));

        let outcome = rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::Connecting);
        assert!(outcome.settings_changed);
        assert_eq!(rig.store.saves, 1);
        assert_eq!(rig.link.settings().unwrap().volume, 30);
    }

    #[test]
    fn connectivity_drop_is_detected_in_the_same_step() {
        let mut rig = Rig::new(Some(provisioned_settings()));
        rig.step();
        rig.step();
        assert_eq!(rig.link.state(), ConnectivityState::Operating);

        rig.net.connected = false;
        rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::ConnectivityLost);
    }

    #[test]
    fn reconnect_skips_one_time_initialization() {
        let mut rig = Rig::new(Some(provisioned_settings()));
        rig.step();
        rig.step();
        rig.net.connected = false;
        rig.step();

        let outcome = rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::Operating);
        assert_eq!(rig.services.bring_up_calls, 1);
        assert!(!outcome.force_remote_refresh);
    }

    #[test]
    fn failed_bring_up_retries_on_next_acquisition() {
        let mut rig = Rig::new(Some(provisioned_settings()));
        rig.services.fail_next = true;

        rig.step();
        rig.step();
        assert_eq!(rig.link.state(), ConnectivityState::Operating);
        assert_eq!(rig.services.bring_up_calls, 1);

        // The link drops; the reconnect is a fresh acquisition, so the
        // still-pending initialization runs again.
        rig.net.connected = false;
        rig.step();
        rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::Operating);
        assert_eq!(rig.services.bring_up_calls, 2);

        // Once it has succeeded, further reconnects leave it alone.
        rig.net.connected = false;
        rig.step();
        rig.step();
        assert_eq!(rig.services.bring_up_calls, 2);
    }

    #[test]
    fn reconnect_failure_restarts_provisioning() {
        let mut rig = Rig::new(Some(provisioned_settings()));
        rig.step();
        rig.step();
        rig.net.connected = false;
        rig.step();

        rig.net.connect_results.push_back(false);
        rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::ProvisioningMode);
    }

    #[test]
    fn portal_start_failure_is_fatal() {
        let mut rig = Rig::new(None);
        rig.portal.fail_start = true;

        let result = rig.link.step(
            &mut rig.store,
            &mut rig.net,
            &mut rig.portal,
            &mut rig.services,
        );

        assert!(matches!(result, Err(LinkError::PortalStart(_))));
    }

    #[test]
    fn operating_settings_edit_without_credential_change_stays_operating() {
        let mut rig = Rig::new(Some(provisioned_settings()));
        rig.step();
        rig.step();

        let mut edited = provisioned_settings();
        edited.weather_refresh_min = 5;
        rig.portal
            .events
            .push_back(PortalEvent::SettingsSaved(edited));

        let outcome = rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::Operating);
        assert!(outcome.settings_changed);
        assert_eq!(rig.link.settings().unwrap().weather_refresh_min, 5);
    }

    #[test]
    fn operating_credential_change_reconnects_and_reinitializes() {
        let mut rig = Rig::new(Some(provisioned_settings()));
        rig.step();
        rig.step();
        assert_eq!(rig.services.bring_up_calls, 1);

        let mut edited = provisioned_settings();
        edited.wifi_ssid = "other".to_string();
        rig.portal
            .events
            .push_back(PortalEvent::SettingsSaved(edited));

        rig.step();
        assert_eq!(rig.link.state(), ConnectivityState::Connecting);

        rig.step();
        assert_eq!(rig.link.state(), ConnectivityState::Operating);
        assert_eq!(rig.services.bring_up_calls, 2);
    }

    #[test]
    fn stored_record_without_credentials_still_provisions() {
        let mut rig = Rig::new(Some(DeviceSettings::default()));
        rig.step();

        assert_eq!(rig.link.state(), ConnectivityState::ProvisioningMode);
    }
}
