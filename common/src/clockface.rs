//! Time-to-words encoding for the five-minute-resolution clock face.
//!
//! The face speaks the Bernese idiom: minutes past the 25 mark are phrased
//! relative to the coming half hour ("five to half six"), and everything from
//! 25 minutes on names the *next* hour.

/// Minute word lit on the face, at most one per phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinuteWord {
    Five,
    Ten,
    Quarter,
    Twenty,
}

/// Connective between minute word and hour word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    /// "ab"
    Past,
    /// "vor"
    To,
}

/// The complete set of word groups to illuminate for one point in time.
/// Produced fresh on every encode; never mutated incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockPhrase {
    /// The "it is" prefix, always lit.
    pub it_is: bool,
    pub minute_word: Option<MinuteWord>,
    pub connective: Option<Connective>,
    /// The "half" word.
    pub half: bool,
    /// Hour word, normalized to 1..=12.
    pub hour: u8,
    /// The hourly chime fires exactly at the top of the hour.
    pub chime: bool,
}

/// Encode `(hour, minute)` into the word groups to light.
///
/// Minute buckets (boundary minutes open their bucket):
///
/// | minute  | words                 |
/// |---------|-----------------------|
/// | 0..=4   | (hour only)           |
/// | 5..=9   | five past             |
/// | 10..=14 | ten past              |
/// | 15..=19 | quarter past          |
/// | 20..=24 | twenty past           |
/// | 25..=29 | five to half          |
/// | 30..=34 | half                  |
/// | 35..=39 | five past half        |
/// | 40..=44 | twenty to             |
/// | 45..=49 | quarter to            |
/// | 50..=54 | ten to                |
/// | 55..=59 | five to               |
///
/// From minute 25 the phrase names the next hour.
pub fn encode(hour: u8, minute: u8) -> ClockPhrase {
    debug_assert!(hour < 24, "hour out of range: {hour}");
    debug_assert!(minute < 60, "minute out of range: {minute}");

    let (minute_word, connective, half) = match minute {
        0..=4 => (None, None, false),
        5..=9 => (Some(MinuteWord::Five), Some(Connective::Past), false),
        10..=14 => (Some(MinuteWord::Ten), Some(Connective::Past), false),
        15..=19 => (Some(MinuteWord::Quarter), Some(Connective::Past), false),
        20..=24 => (Some(MinuteWord::Twenty), Some(Connective::Past), false),
        25..=29 => (Some(MinuteWord::Five), Some(Connective::To), true),
        30..=34 => (None, None, true),
        35..=39 => (Some(MinuteWord::Five), Some(Connective::Past), true),
        40..=44 => (Some(MinuteWord::Twenty), Some(Connective::To), false),
        45..=49 => (Some(MinuteWord::Quarter), Some(Connective::To), false),
        50..=54 => (Some(MinuteWord::Ten), Some(Connective::To), false),
        _ => (Some(MinuteWord::Five), Some(Connective::To), false),
    };

    let carried = if minute >= 25 { hour + 1 } else { hour };
    let hour_word = normalize_hour(carried);

    ClockPhrase {
        it_is: true,
        minute_word,
        connective,
        half,
        hour: hour_word,
        chime: minute == 0,
    }
}

/// Map a 0..=24 hour onto the 1..=12 face: 0 becomes 12, values above 12
/// drop by 12.
fn normalize_hour(hour: u8) -> u8 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn bucket(minute: u8) -> (Option<MinuteWord>, Option<Connective>, bool) {
        let phrase = encode(9, minute);
        (phrase.minute_word, phrase.connective, phrase.half)
    }

    #[test]
    fn exact_hour_lights_hour_word_only() {
        let phrase = encode(9, 0);
        assert!(phrase.it_is);
        assert_eq!(phrase.minute_word, None);
        assert_eq!(phrase.connective, None);
        assert!(!phrase.half);
        assert_eq!(phrase.hour, 9);
        assert!(phrase.chime);
    }

    #[test]
    fn minute_buckets_match_table() {
        use Connective::{Past, To};
        use MinuteWord::{Five, Quarter, Ten, Twenty};

        let expected: [(u8, Option<MinuteWord>, Option<Connective>, bool); 12] = [
            (0, None, None, false),
            (5, Some(Five), Some(Past), false),
            (10, Some(Ten), Some(Past), false),
            (15, Some(Quarter), Some(Past), false),
            (20, Some(Twenty), Some(Past), false),
            (25, Some(Five), Some(To), true),
            (30, None, None, true),
            (35, Some(Five), Some(Past), true),
            (40, Some(Twenty), Some(To), false),
            (45, Some(Quarter), Some(To), false),
            (50, Some(Ten), Some(To), false),
            (55, Some(Five), Some(To), false),
        ];

        for (start, word, connective, half) in expected {
            // Boundary minutes open their bucket; the whole band agrees.
            for offset in 0..5 {
                let minute = start + offset;
                assert_eq!(
                    bucket(minute),
                    (word, connective, half),
                    "minute {minute}"
                );
            }
        }
    }

    #[test]
    fn half_hour_band_has_no_connective() {
        for minute in 30..=34 {
            let phrase = encode(14, minute);
            assert_eq!(phrase.minute_word, None);
            assert_eq!(phrase.connective, None);
            assert!(phrase.half);
        }
    }

    #[test]
    fn twenty_five_reads_five_to_half() {
        let phrase = encode(17, 25);
        assert_eq!(phrase.minute_word, Some(MinuteWord::Five));
        assert_eq!(phrase.connective, Some(Connective::To));
        assert!(phrase.half);
        assert_eq!(phrase.hour, 6);
    }

    #[test]
    fn hour_carries_from_minute_25_for_all_hours() {
        for hour in 0..24u8 {
            for minute in 0..60u8 {
                let phrase = encode(hour, minute);
                let expected = if minute >= 25 {
                    match (hour + 1) % 12 {
                        0 => 12,
                        h => h,
                    }
                } else {
                    match hour % 12 {
                        0 => 12,
                        h => h,
                    }
                };
                assert_eq!(phrase.hour, expected, "h={hour} m={minute}");
            }
        }
    }

    #[test]
    fn midnight_and_noon_read_twelve() {
        assert_eq!(encode(0, 0).hour, 12);
        assert_eq!(encode(12, 10).hour, 12);
        // 11:25 onward already names twelve.
        assert_eq!(encode(11, 25).hour, 12);
        // 23:40 names the coming midnight.
        assert_eq!(encode(23, 40).hour, 12);
    }

    #[test]
    fn minute_59_carries_and_reads_five_to() {
        let phrase = encode(7, 59);
        assert_eq!(phrase.minute_word, Some(MinuteWord::Five));
        assert_eq!(phrase.connective, Some(Connective::To));
        assert!(!phrase.half);
        assert_eq!(phrase.hour, 8);
        assert!(!phrase.chime);
    }

    #[test]
    fn chime_fires_only_at_top_of_hour() {
        for hour in 0..24u8 {
            for minute in 0..60u8 {
                assert_eq!(encode(hour, minute).chime, minute == 0);
            }
        }
    }
}
