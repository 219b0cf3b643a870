//! Chime playback. The appliance drives a serial MP3 module; the host build
//! logs what would be played.

use tracing::info;

/// Track slot on the playback module that holds the hourly chime.
pub const CHIME_TRACK: u16 = 1;

pub trait ChimePlayer {
    /// Volume range is 0..=30, module convention.
    fn set_volume(&mut self, volume: u8);
    fn play_track(&mut self, track: u16);
}

pub struct LogChimePlayer {
    volume: u8,
}

impl LogChimePlayer {
    pub fn new() -> Self {
        Self { volume: 0 }
    }
}

impl ChimePlayer for LogChimePlayer {
    fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(30);
        info!("chime volume set to {}", self.volume);
    }

    fn play_track(&mut self, track: u16) {
        info!("playing track {track} at volume {}", self.volume);
    }
}
