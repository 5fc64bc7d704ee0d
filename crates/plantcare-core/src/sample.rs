//! The sensor sample exchanged between the acquisition task and its readers.
//!
//! A [`SensorSample`] is built once per acquisition cycle and never mutated
//! after it is published. For storage inside the
//! [`StatePlane`](crate::state_plane::StatePlane) it is flattened into a fixed
//! array of 32-bit words.
//!
//! Word layout (little-endian within each word):
//! - 0..=3: soil raw, soil mV, light raw, light mV
//! - 4..=5: temperature ×100, humidity ×100
//! - 6..=8: acceleration x/y/z (g×100)
//! - 9: clear | red << 16
//! - 10: green | blue << 16
//! - 11: dominant color | GPS length << 8
//! - 12..=27: GPS sentence bytes (64 bytes, zero padded)

use core::fmt::Display;

use heapless::String;
use serde::{Deserialize, Serialize};

/// Maximum number of bytes kept from the last GPS sentence
pub const GPS_SENTENCE_CAPACITY: usize = 63;

/// Number of words holding the GPS sentence bytes (capacity + terminator slot)
const GPS_WORDS: usize = (GPS_SENTENCE_CAPACITY + 1) / 4;

/// Index of the first GPS word
const GPS_OFFSET: usize = 12;

/// Number of 32-bit words an encoded sample occupies
pub const SAMPLE_WORDS: usize = GPS_OFFSET + GPS_WORDS;

/// Strongest color channel seen by the color sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DominantColor {
    #[default]
    Unknown = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
}

impl DominantColor {
    /// Pick the channel with the greatest value.
    ///
    /// Ties are resolved Red, then Green, then Blue: Red wins any tie it is
    /// part of, Green beats Blue on a tie.
    pub const fn classify(red: u32, green: u32, blue: u32) -> Self {
        if red >= green && red >= blue {
            Self::Red
        } else if green >= blue {
            Self::Green
        } else {
            Self::Blue
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Red,
            2 => Self::Green,
            3 => Self::Blue,
            _ => Self::Unknown,
        }
    }

    /// Get the display label for this color
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Red => "RED",
            Self::Green => "GREEN",
            Self::Blue => "BLUE",
        }
    }
}

/// One full acquisition cycle worth of sensor readings.
///
/// Every field reflects the same cycle. The zero value (`Default`) is what a
/// reader observes before the first publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorSample {
    /// Soil moisture ADC count
    pub soil_raw: i16,
    /// Soil moisture sensor voltage in millivolts
    pub soil_mv: i32,
    /// Ambient light ADC count
    pub light_raw: i16,
    /// Ambient light sensor voltage in millivolts
    pub light_mv: i32,
    /// Temperature in °C × 100
    pub temperature_x100: i32,
    /// Relative humidity in %RH × 100
    pub humidity_x100: i32,
    /// Acceleration along X in g × 100
    pub accel_x_g100: i32,
    /// Acceleration along Y in g × 100
    pub accel_y_g100: i32,
    /// Acceleration along Z in g × 100
    pub accel_z_g100: i32,
    pub color_clear: u16,
    pub color_red: u16,
    pub color_green: u16,
    pub color_blue: u16,
    /// Per-sample color classification, see [`DominantColor::classify`]
    pub dominant_color: DominantColor,
    /// Last complete line received from the GPS, passed through verbatim
    pub gps_last_sentence: String<GPS_SENTENCE_CAPACITY>,
}

impl SensorSample {
    /// Replace the stored GPS sentence.
    ///
    /// Lines longer than [`GPS_SENTENCE_CAPACITY`] are cut at the last
    /// character that fits. Returns `true` if the line was truncated.
    pub fn set_gps_sentence(&mut self, line: &str) -> bool {
        self.gps_last_sentence.clear();
        for c in line.chars() {
            if self.gps_last_sentence.push(c).is_err() {
                return true;
            }
        }
        false
    }

    /// The last GPS sentence, empty if none has been received yet
    pub fn gps_sentence(&self) -> &str {
        self.gps_last_sentence.as_str()
    }

    /// Flatten the sample into its word representation.
    pub fn to_words(&self) -> [u32; SAMPLE_WORDS] {
        let mut words = [0u32; SAMPLE_WORDS];

        words[0] = i32::from(self.soil_raw) as u32;
        words[1] = self.soil_mv as u32;
        words[2] = i32::from(self.light_raw) as u32;
        words[3] = self.light_mv as u32;
        words[4] = self.temperature_x100 as u32;
        words[5] = self.humidity_x100 as u32;
        words[6] = self.accel_x_g100 as u32;
        words[7] = self.accel_y_g100 as u32;
        words[8] = self.accel_z_g100 as u32;
        words[9] = u32::from(self.color_clear) | (u32::from(self.color_red) << 16);
        words[10] = u32::from(self.color_green) | (u32::from(self.color_blue) << 16);

        let gps = self.gps_last_sentence.as_bytes();
        words[11] = self.dominant_color as u32 | ((gps.len() as u32) << 8);

        for (i, chunk) in gps.chunks(4).enumerate() {
            let mut bytes = [0u8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            words[GPS_OFFSET + i] = u32::from_le_bytes(bytes);
        }

        words
    }

    /// Rebuild a sample from its word representation.
    ///
    /// A GPS payload that is not valid UTF-8 decodes as an empty sentence.
    pub fn from_words(words: &[u32; SAMPLE_WORDS]) -> Self {
        let mut gps_bytes = [0u8; GPS_WORDS * 4];
        for (i, word) in words[GPS_OFFSET..].iter().enumerate() {
            gps_bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
        }
        let gps_len = (((words[11] >> 8) & 0xFF) as usize).min(GPS_SENTENCE_CAPACITY);

        let mut sample = Self {
            soil_raw: words[0] as i32 as i16,
            soil_mv: words[1] as i32,
            light_raw: words[2] as i32 as i16,
            light_mv: words[3] as i32,
            temperature_x100: words[4] as i32,
            humidity_x100: words[5] as i32,
            accel_x_g100: words[6] as i32,
            accel_y_g100: words[7] as i32,
            accel_z_g100: words[8] as i32,
            color_clear: words[9] as u16,
            color_red: (words[9] >> 16) as u16,
            color_green: words[10] as u16,
            color_blue: (words[10] >> 16) as u16,
            dominant_color: DominantColor::from_u8(words[11] as u8),
            gps_last_sentence: String::new(),
        };

        if let Ok(line) = core::str::from_utf8(&gps_bytes[..gps_len]) {
            sample.set_gps_sentence(line);
        }

        sample
    }
}

impl Display for SensorSample {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[SensorSample] soil: {} ({} mV), light: {} ({} mV), temperature: {:.2}°C, \
             humidity: {:.2}%, accel: ({}, {}, {}) g×100, color: {}",
            self.soil_raw,
            self.soil_mv,
            self.light_raw,
            self.light_mv,
            self.temperature_x100 as f32 / 100.0,
            self.humidity_x100 as f32 / 100.0,
            self.accel_x_g100,
            self.accel_y_g100,
            self.accel_z_g100,
            self.dominant_color.label(),
        )
    }
}
