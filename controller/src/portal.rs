//! Browser-facing configuration server. While unprovisioned it serves the
//! credentials form; once the device operates it keeps serving the settings
//! API. Saves are handed to the control loop as [`PortalEvent`]s over a
//! channel; the loop is the only writer to the settings store.

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use wordclock_common::{DeviceSettings, LinkError, PortalEvent, ProvisioningPortal};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Word Clock Setup</title>
</head>
<body>
    <h1>Network Configuration</h1>
    <form action="/save" method="POST">
        <label for="ssid">SSID:</label>
        <input type="text" id="ssid" name="ssid" required><br>
        <label for="password">Password:</label>
        <input type="password" id="password" name="password"><br>
        <input type="submit" value="Save and Connect">
    </form>
</body>
</html>
"#;

pub struct HttpPortal {
    port: u16,
    started: bool,
    events_rx: mpsc::UnboundedReceiver<PortalEvent>,
    shared: PortalState,
}

#[derive(Clone)]
struct PortalState {
    events_tx: mpsc::UnboundedSender<PortalEvent>,
    settings: Arc<Mutex<DeviceSettings>>,
}

impl HttpPortal {
    pub fn from_env() -> Self {
        let port = std::env::var("WORDCLOCK_HTTP_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);
        Self::on_port(port)
    }

    pub fn on_port(port: u16) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            port,
            started: false,
            events_rx,
            shared: PortalState {
                events_tx,
                settings: Arc::new(Mutex::new(DeviceSettings::default())),
            },
        }
    }

    /// Mirror the settings adopted by the control loop so the API reports
    /// what the device actually runs with.
    pub fn update_view(&self, settings: &DeviceSettings) {
        let mut view = self
            .shared
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *view = settings.clone();
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/", get(handle_index))
            .route("/save", post(handle_save_credentials))
            .route("/api/settings", get(handle_get_settings))
            .route("/api/settings", put(handle_put_settings))
            .with_state(self.shared.clone())
    }
}

impl ProvisioningPortal for HttpPortal {
    fn start(&mut self, ap_name: &str, _ap_pass: &str) -> Result<(), LinkError> {
        if self.started {
            return Ok(());
        }

        // On the appliance this also raises the soft AP; the host build only
        // binds the configuration server.
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = std::net::TcpListener::bind(&addr)
            .and_then(|listener| {
                listener.set_nonblocking(true)?;
                Ok(listener)
            })
            .map_err(|err| LinkError::PortalStart(format!("bind {addr}: {err}")))?;

        let router = self.router();
        tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::from_std(listener) {
                Ok(listener) => listener,
                Err(err) => {
                    warn!("portal listener conversion failed: {err}");
                    return;
                }
            };
            if let Err(err) = axum::serve(listener, router).await {
                warn!("portal server stopped: {err}");
            }
        });

        info!("configuration portal '{ap_name}' listening on http://{addr}");
        self.started = true;
        Ok(())
    }

    fn poll(&mut self) -> Option<PortalEvent> {
        self.events_rx.try_recv().ok()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct CredentialsForm {
    ssid: String,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct SettingsView {
    #[serde(rename = "wifiSsid")]
    wifi_ssid: String,
    #[serde(rename = "wifiPassSet")]
    wifi_pass_set: bool,
    #[serde(rename = "ntpServer")]
    ntp_server: String,
    #[serde(rename = "utcOffsetHours")]
    utc_offset_hours: i8,
    #[serde(rename = "apiKeySet")]
    api_key_set: bool,
    #[serde(rename = "weatherRefreshMin")]
    weather_refresh_min: u32,
    #[serde(rename = "pollenRefreshMin")]
    pollen_refresh_min: u32,
    latitude: f64,
    longitude: f64,
    #[serde(rename = "indoorDwellS")]
    indoor_dwell_s: u32,
    #[serde(rename = "outdoorDwellS")]
    outdoor_dwell_s: u32,
    #[serde(rename = "clockColor")]
    clock_color: [u8; 3],
    #[serde(rename = "ledBrightness")]
    led_brightness: u8,
    volume: u8,
}

#[derive(Debug, Deserialize)]
struct SettingsUpdate {
    #[serde(rename = "wifiSsid")]
    wifi_ssid: String,
    #[serde(rename = "wifiPass", default)]
    wifi_pass: Option<String>,
    #[serde(rename = "ntpServer")]
    ntp_server: String,
    #[serde(rename = "utcOffsetHours")]
    utc_offset_hours: i8,
    #[serde(rename = "apiKey", default)]
    api_key: Option<String>,
    #[serde(rename = "weatherRefreshMin")]
    weather_refresh_min: u32,
    #[serde(rename = "pollenRefreshMin")]
    pollen_refresh_min: u32,
    latitude: f64,
    longitude: f64,
    #[serde(rename = "indoorDwellS")]
    indoor_dwell_s: u32,
    #[serde(rename = "outdoorDwellS")]
    outdoor_dwell_s: u32,
    #[serde(rename = "clockColor")]
    clock_color: [u8; 3],
    #[serde(rename = "ledBrightness")]
    led_brightness: u8,
    volume: u8,
}

fn build_view(settings: &DeviceSettings) -> SettingsView {
    SettingsView {
        wifi_ssid: settings.wifi_ssid.clone(),
        wifi_pass_set: !settings.wifi_pass.is_empty(),
        ntp_server: settings.ntp_server.clone(),
        utc_offset_hours: settings.utc_offset_hours,
        api_key_set: !settings.api_key.is_empty(),
        weather_refresh_min: settings.weather_refresh_min,
        pollen_refresh_min: settings.pollen_refresh_min,
        latitude: settings.latitude,
        longitude: settings.longitude,
        indoor_dwell_s: settings.indoor_dwell_s,
        outdoor_dwell_s: settings.outdoor_dwell_s,
        clock_color: settings.clock_color,
        led_brightness: settings.led_brightness,
        volume: settings.volume,
    }
}

fn current_settings(state: &PortalState) -> DeviceSettings {
    state
        .settings
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_save_credentials(
    State(state): State<PortalState>,
    Form(form): Form<CredentialsForm>,
) -> axum::response::Response {
    if form.ssid.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "SSID must not be empty");
    }

    let mut settings = current_settings(&state);
    settings.wifi_ssid = form.ssid;
    settings.wifi_pass = form.password.unwrap_or_default();

    if state
        .events_tx
        .send(PortalEvent::SettingsSaved(settings))
        .is_err()
    {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Device loop is gone");
    }

    (
        StatusCode::OK,
        "Configuration saved. The clock will now try to join the network.",
    )
        .into_response()
}

async fn handle_get_settings(State(state): State<PortalState>) -> impl IntoResponse {
    Json(build_view(&current_settings(&state)))
}

async fn handle_put_settings(
    State(state): State<PortalState>,
    Json(update): Json<SettingsUpdate>,
) -> axum::response::Response {
    if update.wifi_ssid.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "wifiSsid cannot be empty");
    }

    let stored = current_settings(&state);
    let settings = DeviceSettings {
        wifi_ssid: update.wifi_ssid,
        // Absent secrets keep their stored value.
        wifi_pass: update.wifi_pass.unwrap_or(stored.wifi_pass),
        ntp_server: update.ntp_server,
        utc_offset_hours: update.utc_offset_hours,
        api_key: update.api_key.unwrap_or(stored.api_key),
        weather_refresh_min: update.weather_refresh_min,
        pollen_refresh_min: update.pollen_refresh_min,
        latitude: update.latitude,
        longitude: update.longitude,
        indoor_dwell_s: update.indoor_dwell_s,
        outdoor_dwell_s: update.outdoor_dwell_s,
        clock_color: update.clock_color,
        led_brightness: update.led_brightness,
        volume: update.volume,
    };

    let view = build_view(&settings);
    if state
        .events_tx
        .send(PortalEvent::SettingsSaved(settings))
        .is_err()
    {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Device loop is gone");
    }

    Json(view).into_response()
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
