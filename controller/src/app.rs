//! Device control loop. One task owns every collaborator; the loop advances
//! the connectivity machine, then dispatches at most one due periodic task
//! per tick so no activity can starve the others.

use std::{
    sync::OnceLock,
    time::{Duration, Instant},
};

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use tracing::{error, info, warn};

use wordclock_common::{
    config::{CLOCK_REDRAW_INTERVAL_MS, SENSOR_SAMPLE_INTERVAL_MS},
    encode,
    presenter::{air_quality_color, pollen_color, split_percentage, split_reading},
    ClockPhrase, DeviceSettings, DisplayPage, IndoorReading, LinkError, LinkManager,
    PollenSnapshot, Rgb, StepOutcome, TaskId, TaskTable, WeatherSnapshot,
};

use crate::{
    audio::{ChimePlayer, LogChimePlayer, CHIME_TRACK},
    display::{
        init_strip, render_percentage, render_phrase, render_reading, LedStrip, LogLedStrip,
        LogNumericDisplay, NumericDisplay, AIR_QUALITY_LED, HUMI_PAGE_LED, INDOOR_PAGE_COLOR,
        OUTDOOR_PAGE_COLOR, POLLEN_LED, TEMP_PAGE_LED,
    },
    net::HostWifi,
    portal::HttpPortal,
    remote::{Coordinates, PollenClient, RemoteClients, WeatherClient},
    sensor::{IndoorSensor, SimIndoorSensor},
    store::FileStore,
};

const LOOP_TICK_MS: u64 = 250;

struct App {
    link: LinkManager,
    tasks: TaskTable,
    store: FileStore,
    wifi: HostWifi,
    portal: HttpPortal,
    remote: RemoteClients,
    sensor: SimIndoorSensor,
    strip: LogLedStrip,
    digits: LogNumericDisplay,
    chime: LogChimePlayer,
    page: DisplayPage,
    last_phrase: Option<ClockPhrase>,
    indoor: Option<IndoorReading>,
    weather: Option<WeatherSnapshot>,
    pollen: Option<PollenSnapshot>,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut app = App::new();
    info!("word clock starting");

    let mut ticker = tokio::time::interval(Duration::from_millis(LOOP_TICK_MS));
    loop {
        ticker.tick().await;
        let now_ms = monotonic_ms();

        let outcome = match app.link.step(
            &mut app.store,
            &mut app.wifi,
            &mut app.portal,
            &mut app.remote,
        ) {
            Ok(outcome) => outcome,
            Err(err) => halt(err).await,
        };

        if outcome.settings_changed {
            app.apply_settings();
        }
        if outcome.force_remote_refresh {
            app.tasks.force_remote();
        }

        app.dispatch(now_ms);
    }
}

impl App {
    fn new() -> Self {
        let mut strip = LogLedStrip;
        init_strip(&mut strip, DeviceSettings::default().led_brightness);

        Self {
            link: LinkManager::new(),
            tasks: TaskTable::new(),
            store: FileStore::from_env(),
            wifi: HostWifi::new(),
            portal: HttpPortal::from_env(),
            remote: RemoteClients::new(),
            sensor: SimIndoorSensor::new(),
            strip,
            digits: LogNumericDisplay,
            chime: LogChimePlayer::new(),
            page: DisplayPage::Indoor,
            last_phrase: None,
            indoor: None,
            weather: None,
            pollen: None,
        }
    }

    fn settings(&self) -> DeviceSettings {
        self.link.settings().cloned().unwrap_or_default()
    }

    /// React to freshly adopted settings: mirror them to the portal, retune
    /// the hardware, and repaint the face in case the color changed.
    fn apply_settings(&mut self) {
        let settings = self.settings();
        self.portal.update_view(&settings);
        self.strip.set_brightness(settings.led_brightness);
        self.chime.set_volume(settings.volume);
        self.last_phrase = None;
        self.tasks.force(TaskId::ClockRedraw);
    }

    /// Run the first due task in priority order, then stop. Fire time is
    /// recorded whether or not the work succeeded.
    fn dispatch(&mut self, now_ms: u64) {
        let settings = self.settings();

        for id in TaskId::ALL {
            if id.requires_connectivity() && !self.link.is_operating() {
                continue;
            }
            if !self.tasks.is_due(id, now_ms, self.interval_for(id, &settings)) {
                continue;
            }

            self.run_task(id, &settings);
            self.tasks.mark_fired(id, now_ms);
            break;
        }
    }

    fn interval_for(&self, id: TaskId, settings: &DeviceSettings) -> u64 {
        match id {
            TaskId::SensorSample => SENSOR_SAMPLE_INTERVAL_MS,
            TaskId::ClockRedraw => CLOCK_REDRAW_INTERVAL_MS,
            TaskId::PageRotate => settings.dwell_ms(self.page == DisplayPage::Indoor),
            TaskId::WeatherRefresh => settings.weather_refresh_ms(),
            TaskId::PollenRefresh => settings.pollen_refresh_ms(),
        }
    }

    fn run_task(&mut self, id: TaskId, settings: &DeviceSettings) {
        match id {
            TaskId::SensorSample => self.sample_indoor(),
            TaskId::ClockRedraw => self.redraw_clock(settings),
            TaskId::PageRotate => {
                self.page = self.page.next();
                self.render_page();
            }
            TaskId::WeatherRefresh => self.refresh_weather(settings),
            TaskId::PollenRefresh => self.refresh_pollen(settings),
        }
    }

    fn sample_indoor(&mut self) {
        match self.sensor.sample() {
            Ok(reading) => {
                self.strip
                    .set_pixel(AIR_QUALITY_LED, air_quality_color(reading.air_quality));
                self.indoor = Some(reading);
                if self.page == DisplayPage::Indoor {
                    self.render_page();
                }
            }
            Err(err) => warn!("indoor sample failed: {err}"),
        }
    }

    fn redraw_clock(&mut self, settings: &DeviceSettings) {
        let (hour, minute) = local_hour_minute(settings.utc_offset_hours);
        let phrase = encode(hour, minute);

        if self.last_phrase.as_ref() == Some(&phrase) {
            return;
        }

        render_phrase(&mut self.strip, &phrase, Rgb::from(settings.clock_color));
        if should_chime(self.last_phrase.as_ref(), &phrase, settings.volume) {
            self.chime.play_track(CHIME_TRACK);
        }
        self.last_phrase = Some(phrase);
    }

    fn refresh_weather(&mut self, settings: &DeviceSettings) {
        match self.remote.weather.fetch(coordinates(settings)) {
            Ok(snapshot) => {
                info!(
                    "weather: {:.1}C {:.0}% {:?}",
                    snapshot.temperature_c, snapshot.relative_humidity, snapshot.condition
                );
                self.weather = Some(snapshot);
                if self.page == DisplayPage::Outdoor {
                    self.render_page();
                }
            }
            // Stale data stays on display; the next slot retries.
            Err(err) => warn!("weather refresh failed: {err}"),
        }
    }

    fn refresh_pollen(&mut self, settings: &DeviceSettings) {
        match self.remote.pollen.fetch(coordinates(settings)) {
            Ok(snapshot) => {
                self.strip
                    .set_pixel(POLLEN_LED, pollen_color(snapshot.worst_level()));
                self.pollen = Some(snapshot);
            }
            Err(err) => warn!("pollen refresh failed: {err}"),
        }
    }

    /// Paint the numeric displays and page indicators for the current page.
    fn render_page(&mut self) {
        let (reading, page_color) = match self.page {
            DisplayPage::Indoor => (
                self.indoor
                    .as_ref()
                    .map(|indoor| (indoor.temperature_c, indoor.relative_humidity)),
                INDOOR_PAGE_COLOR,
            ),
            DisplayPage::Outdoor => (
                self.weather
                    .as_ref()
                    .map(|weather| (weather.temperature_c, weather.relative_humidity)),
                OUTDOOR_PAGE_COLOR,
            ),
        };

        self.strip.set_pixel(TEMP_PAGE_LED, page_color);
        self.strip.set_pixel(HUMI_PAGE_LED, page_color);

        match reading {
            Some((temperature, humidity)) => {
                render_reading(&mut self.digits, split_reading(temperature, 1));
                render_percentage(&mut self.digits, split_percentage(humidity));
            }
            None => {
                for position in 0..5 {
                    self.digits.blank(position);
                }
            }
        }
    }
}

/// Without the portal the device can never be configured again, so there is
/// nothing sensible left to run. Hold the loop in idle until power cycle.
async fn halt(err: LinkError) -> StepOutcome {
    error!("unrecoverable failure, halting: {err}");
    std::future::pending().await
}

fn coordinates(settings: &DeviceSettings) -> Coordinates {
    Coordinates {
        latitude: settings.latitude,
        longitude: settings.longitude,
    }
}

/// The chime marks the transition onto a full hour, never the boot render.
fn should_chime(previous: Option<&ClockPhrase>, next: &ClockPhrase, volume: u8) -> bool {
    next.chime && previous.is_some() && volume > 0
}

fn local_hour_minute(utc_offset_hours: i8) -> (u8, u8) {
    hour_minute_at(Utc::now(), utc_offset_hours)
}

fn hour_minute_at(now: DateTime<Utc>, utc_offset_hours: i8) -> (u8, u8) {
    let time = match FixedOffset::east_opt(i32::from(utc_offset_hours) * 3_600) {
        Some(offset) => now.with_timezone(&offset).time(),
        None => now.time(),
    };
    (time.hour() as u8, time.minute() as u8)
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn utc_offset_shifts_the_wall_clock() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 22, 40, 0).unwrap();

        assert_eq!(hour_minute_at(now, 0), (22, 40));
        assert_eq!(hour_minute_at(now, 2), (0, 40));
        assert_eq!(hour_minute_at(now, -3), (19, 40));
    }

    #[tokio::test]
    async fn halted_device_never_resumes() {
        let result = tokio::time::timeout(
            Duration::from_millis(50),
            halt(LinkError::PortalStart("bind refused".to_string())),
        )
        .await;

        assert!(result.is_err());
    }

    #[test]
    fn chime_fires_only_on_hour_transitions() {
        let before = encode(9, 55);
        let on_hour = encode(10, 0);

        assert!(should_chime(Some(&before), &on_hour, 12));
        // Muted device stays silent.
        assert!(!should_chime(Some(&before), &on_hour, 0));
        // First render after boot lands mid-state, no chime.
        assert!(!should_chime(None, &on_hour, 12));
        // Ordinary redraws are silent.
        assert!(!should_chime(Some(&on_hour), &encode(10, 5), 12));
    }
}
