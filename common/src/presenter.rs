//! Pure mappings from sensor and remote readings to display primitives:
//! seven-segment digit groups and gradient indicator colours.

use crate::types::Rgb;

/// Content of one seven-segment position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitSlot {
    Digit { value: u8, decimal_point: bool },
    Minus,
    Blank,
}

impl DigitSlot {
    const fn digit(value: u8) -> Self {
        Self::Digit {
            value,
            decimal_point: false,
        }
    }

    const fn digit_with_point(value: u8) -> Self {
        Self::Digit {
            value,
            decimal_point: true,
        }
    }
}

/// Three-position digit group for the signed reading displays, least
/// significant position first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitGroup {
    pub ones: DigitSlot,
    pub tens: DigitSlot,
    pub hundreds: DigitSlot,
}

/// Split a real-valued reading into the three seven-segment positions,
/// keeping `decimals` fractional digits.
///
/// Non-negative values fill ones and tens (decimal point on the tens position
/// when one fractional digit is kept) and only use the hundreds position once
/// the scaled magnitude reaches 100. Negative values put a minus glyph on the
/// hundreds position; when the scaled magnitude exceeds 99 the grouping
/// shifts up one digit, dropping the fractional digit instead of overflowing
/// the display.
pub fn split_reading(value: f32, decimals: u8) -> DigitGroup {
    let scale = 10_i32.pow(u32::from(decimals));
    let scaled = (value * scale as f32).round() as i32;

    if scaled >= 0 {
        let ones = DigitSlot::digit((scaled % 10) as u8);
        let tens_value = ((scaled / 10) % 10) as u8;
        let tens = if decimals == 1 {
            DigitSlot::digit_with_point(tens_value)
        } else {
            DigitSlot::digit(tens_value)
        };
        let hundreds = if scaled >= 100 {
            DigitSlot::digit(((scaled / 100) % 10) as u8)
        } else {
            DigitSlot::Blank
        };
        return DigitGroup {
            ones,
            tens,
            hundreds,
        };
    }

    let magnitude = scaled.unsigned_abs() as i32;
    if magnitude <= 99 {
        let tens_value = ((magnitude / 10) % 10) as u8;
        DigitGroup {
            ones: DigitSlot::digit((magnitude % 10) as u8),
            tens: if decimals == 1 {
                DigitSlot::digit_with_point(tens_value)
            } else {
                DigitSlot::digit(tens_value)
            },
            hundreds: DigitSlot::Minus,
        }
    } else {
        // Shifted grouping: the fractional digit is dropped so the integer
        // part still fits next to the minus glyph.
        DigitGroup {
            ones: DigitSlot::digit(((magnitude / 10) % 10) as u8),
            tens: DigitSlot::digit(((magnitude / 100) % 10) as u8),
            hundreds: DigitSlot::Minus,
        }
    }
}

/// Two-position integer split for the humidity pair, least significant
/// position first. The tens position is blanked below 10.
pub fn split_percentage(value: f32) -> [DigitSlot; 2] {
    let clamped = value.max(0.0) as i32;
    let ones = DigitSlot::digit((clamped % 10) as u8);
    let tens = if clamped >= 10 {
        DigitSlot::digit(((clamped / 10) % 10) as u8)
    } else {
        DigitSlot::Blank
    };
    [ones, tens]
}

/// Piecewise-linear red -> yellow -> green sweep over a bounded scale.
///
/// Below `low` the colour is pure red, above `high` pure green. Between `low`
/// and `mid` the green channel ramps up at full red; between `mid` and `high`
/// the red channel ramps down at full green. Inputs are clamped to
/// `[floor, ceil]` first.
#[derive(Debug, Clone, Copy)]
pub struct GradientScale {
    pub floor: f32,
    pub low: f32,
    pub mid: f32,
    pub high: f32,
    pub ceil: f32,
}

/// Indoor air quality index, 0..=100.
pub const AIR_QUALITY_SCALE: GradientScale = GradientScale {
    floor: 0.0,
    low: 20.0,
    mid: 55.0,
    high: 90.0,
    ceil: 100.0,
};

/// Pollen load on the inverted severity axis (0 = worst, 5 = pollen-free).
const POLLEN_SCALE: GradientScale = GradientScale {
    floor: 0.0,
    low: 0.5,
    mid: 2.5,
    high: 4.5,
    ceil: 5.0,
};

impl GradientScale {
    pub fn color_for(&self, value: f32) -> Rgb {
        let v = value.clamp(self.floor, self.ceil);
        if v <= self.low {
            Rgb::RED
        } else if v >= self.high {
            Rgb::GREEN
        } else if v <= self.mid {
            Rgb::new(255, lerp_channel(v, self.low, self.mid, 0.0, 255.0), 0)
        } else {
            Rgb::new(lerp_channel(v, self.mid, self.high, 255.0, 0.0), 255, 0)
        }
    }
}

/// Colour for the air-quality indicator LED.
pub fn air_quality_color(index: f32) -> Rgb {
    AIR_QUALITY_SCALE.color_for(index)
}

/// Colour for the pollen indicator LED. Level 0 (no load) renders green,
/// level 5 (very high) renders red.
pub fn pollen_color(level: u8) -> Rgb {
    let inverted = 5.0 - f32::from(level.min(5));
    POLLEN_SCALE.color_for(inverted)
}

fn lerp_channel(value: f32, from_lo: f32, from_hi: f32, to_lo: f32, to_hi: f32) -> u8 {
    let t = (value - from_lo) / (from_hi - from_lo);
    (to_lo + t * (to_hi - to_lo)).round().clamp(0.0, 255.0) as u8
}
