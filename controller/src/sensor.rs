//! Indoor environment sensing. On the appliance this wraps the ENV-style
//! temperature/humidity sensor and the IAQ sensor on the I2C bus; the host
//! build produces drifting simulated readings.

use thiserror::Error;

use wordclock_common::IndoorReading;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor read failed: {0}")]
    Read(String),
}

pub trait IndoorSensor {
    fn sample(&mut self) -> Result<IndoorReading, SensorError>;
}

pub struct SimIndoorSensor {
    tick: u64,
}

impl SimIndoorSensor {
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

impl IndoorSensor for SimIndoorSensor {
    fn sample(&mut self) -> Result<IndoorReading, SensorError> {
        self.tick = self.tick.wrapping_add(1);
        Ok(IndoorReading {
            temperature_c: 21.5 + (self.tick % 8) as f32 * 0.2,
            relative_humidity: 42.0 + (self.tick % 6) as f32 * 0.5,
            air_quality: 70.0 + (self.tick % 5) as f32 * 4.0,
        })
    }
}
