//! Display collaborators and rendering: the word-clock LED field, the status
//! LEDs next to it, and the five seven-segment positions for numeric
//! readings.

use tracing::debug;

use wordclock_common::{
    clockface::{ClockPhrase, Connective, MinuteWord},
    presenter::{DigitGroup, DigitSlot},
    Rgb,
};

/// Seven-segment positions: 0..=2 signed reading (ones, tens, hundreds),
/// 3..=4 humidity pair (ones, tens).
pub trait NumericDisplay {
    fn show_digit(&mut self, position: usize, digit: u8, decimal_point: bool);
    fn show_minus(&mut self, position: usize);
    fn blank(&mut self, position: usize);
}

/// Addressable LED strip behind the clock face.
pub trait LedStrip {
    fn set_pixel(&mut self, index: usize, color: Rgb);
    fn set_range(&mut self, start: usize, count: usize, color: Rgb);
    fn set_brightness(&mut self, percent: u8);
    fn clear_all(&mut self);
}

/// The word field occupies the strip head; status LEDs sit after it.
pub const CLOCK_FIELD_LEN: usize = 110;
pub const AIR_QUALITY_LED: usize = 110;
pub const POLLEN_LED: usize = 111;
pub const TEMP_PAGE_LED: usize = 112;
pub const HUMI_PAGE_LED: usize = 113;
pub const STRIP_LEN: usize = 114;

/// Page indicator colours: yellow for indoor readings, red for outdoor.
pub const INDOOR_PAGE_COLOR: Rgb = Rgb::YELLOW;
pub const OUTDOOR_PAGE_COLOR: Rgb = Rgb::RED;

#[derive(Debug, Clone, Copy)]
pub struct WordSpan {
    pub start: usize,
    pub len: usize,
}

const fn span(start: usize, len: usize) -> WordSpan {
    WordSpan { start, len }
}

// Word positions on the 11x10 face, row-major.
const IT_IS: [WordSpan; 2] = [span(0, 2), span(3, 4)];
const MIN_FIVE: WordSpan = span(8, 3);
const MIN_TWENTY: WordSpan = span(11, 6);
const MIN_TEN: WordSpan = span(18, 3);
const MIN_QUARTER: WordSpan = span(22, 6);
const TO: WordSpan = span(29, 3);
const PAST: WordSpan = span(33, 2);
const HALF: WordSpan = span(36, 5);
const HOURS: [WordSpan; 12] = [
    span(44, 3), // one
    span(48, 4), // two
    span(52, 3), // three
    span(55, 5), // four
    span(60, 4), // five
    span(66, 6), // six
    span(72, 5), // seven
    span(77, 5), // eight
    span(82, 4), // nine
    span(86, 4), // ten
    span(90, 4), // eleven
    span(94, 6), // twelve
];

fn light(strip: &mut impl LedStrip, word: WordSpan, color: Rgb) {
    strip.set_range(word.start, word.len, color);
}

/// Power-on initialization: everything dark until the first render, at the
/// configured brightness.
pub fn init_strip(strip: &mut impl LedStrip, brightness: u8) {
    strip.clear_all();
    strip.set_brightness(brightness);
}

/// Push one encoded phrase onto the word field. The field is cleared first;
/// the status LEDs past [`CLOCK_FIELD_LEN`] are left alone.
pub fn render_phrase(strip: &mut impl LedStrip, phrase: &ClockPhrase, color: Rgb) {
    strip.set_range(0, CLOCK_FIELD_LEN, Rgb::BLACK);

    if phrase.it_is {
        for word in IT_IS {
            light(strip, word, color);
        }
    }

    match phrase.minute_word {
        Some(MinuteWord::Five) => light(strip, MIN_FIVE, color),
        Some(MinuteWord::Ten) => light(strip, MIN_TEN, color),
        Some(MinuteWord::Quarter) => light(strip, MIN_QUARTER, color),
        Some(MinuteWord::Twenty) => light(strip, MIN_TWENTY, color),
        None => {}
    }

    match phrase.connective {
        Some(Connective::Past) => light(strip, PAST, color),
        Some(Connective::To) => light(strip, TO, color),
        None => {}
    }

    if phrase.half {
        light(strip, HALF, color);
    }

    let hour_index = usize::from(phrase.hour.clamp(1, 12)) - 1;
    light(strip, HOURS[hour_index], color);
}

fn apply_slot(bank: &mut impl NumericDisplay, position: usize, slot: DigitSlot) {
    match slot {
        DigitSlot::Digit {
            value,
            decimal_point,
        } => bank.show_digit(position, value, decimal_point),
        DigitSlot::Minus => bank.show_minus(position),
        DigitSlot::Blank => bank.blank(position),
    }
}

/// Signed reading on positions 0..=2.
pub fn render_reading(bank: &mut impl NumericDisplay, group: DigitGroup) {
    apply_slot(bank, 0, group.ones);
    apply_slot(bank, 1, group.tens);
    apply_slot(bank, 2, group.hundreds);
}

/// Humidity pair on positions 3..=4.
pub fn render_percentage(bank: &mut impl NumericDisplay, slots: [DigitSlot; 2]) {
    apply_slot(bank, 3, slots[0]);
    apply_slot(bank, 4, slots[1]);
}

/// Host stand-ins that log what the bus drivers would latch.
pub struct LogNumericDisplay;

impl NumericDisplay for LogNumericDisplay {
    fn show_digit(&mut self, position: usize, digit: u8, decimal_point: bool) {
        debug!("7seg[{position}] = {digit}{}", if decimal_point { "." } else { "" });
    }

    fn show_minus(&mut self, position: usize) {
        debug!("7seg[{position}] = -");
    }

    fn blank(&mut self, position: usize) {
        debug!("7seg[{position}] blank");
    }
}

pub struct LogLedStrip;

impl LedStrip for LogLedStrip {
    fn set_pixel(&mut self, index: usize, color: Rgb) {
        debug!("led[{index}] = ({}, {}, {})", color.r, color.g, color.b);
    }

    fn set_range(&mut self, start: usize, count: usize, color: Rgb) {
        debug!(
            "led[{start}..{}] = ({}, {}, {})",
            start + count,
            color.r,
            color.g,
            color.b
        );
    }

    fn set_brightness(&mut self, percent: u8) {
        debug!("led brightness {percent}%");
    }

    fn clear_all(&mut self) {
        debug!("led clear");
    }
}
