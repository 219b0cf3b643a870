pub mod clockface;
pub mod config;
pub mod link;
pub mod presenter;
pub mod schedule;
pub mod types;

pub use clockface::{encode, ClockPhrase, Connective, MinuteWord};
pub use config::DeviceSettings;
pub use link::{
    ConnectivityState, LinkError, LinkManager, NetworkConnector, NetworkServices, PortalEvent,
    ProvisioningPortal, SettingsStore, StepOutcome, StoreError,
};
pub use presenter::{DigitGroup, DigitSlot, GradientScale};
pub use schedule::{TaskId, TaskTable};
pub use types::{
    DisplayPage, IndoorReading, PollenSnapshot, Rgb, WeatherCondition, WeatherSnapshot,
};
