//! GPS line framing
//!
//! The GPS collaborator only hands over bytes. Lines are assembled here and
//! passed on verbatim; NMEA content is never parsed.

use heapless::{String, Vec};
use log::{debug, warn};

use super::SensorError;
use crate::sample::{GPS_SENTENCE_CAPACITY, SensorSample};

/// Non-blocking byte source for the GPS receiver (typically a UART)
pub trait GpsSource {
    /// Next received byte, or `None` if nothing is buffered right now
    fn read_byte(&mut self) -> Option<u8>;
}

/// Assembles GPS bytes into complete lines.
///
/// `\r` is ignored and `\n` completes a line. A line longer than
/// [`GPS_SENTENCE_CAPACITY`] is dropped whole: the rest of it is skipped up
/// to its `\n` and assembly restarts with the line after. The buffer is
/// never written past its bound.
pub struct NmeaLineAssembler {
    line: Vec<u8, GPS_SENTENCE_CAPACITY>,
    last_line: String<GPS_SENTENCE_CAPACITY>,
    /// Skipping the tail of an overflowed line
    discarding: bool,
}

impl NmeaLineAssembler {
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            last_line: String::new(),
            discarding: false,
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Ok(true)` when the byte completed a non-empty line, now
    /// available from [`last_line`](Self::last_line). The byte that overflows
    /// the buffer returns [`SensorError::Overflow`].
    pub fn feed(&mut self, byte: u8) -> Result<bool, SensorError> {
        if self.discarding {
            if byte == b'\n' {
                self.discarding = false;
            }
            return Ok(false);
        }

        match byte {
            b'\r' => Ok(false),
            b'\n' => Ok(self.complete_line()),
            _ => {
                if self.line.push(byte).is_err() {
                    self.line.clear();
                    self.discarding = true;
                    return Err(SensorError::Overflow {
                        capacity: GPS_SENTENCE_CAPACITY,
                    });
                }
                Ok(false)
            }
        }
    }

    fn complete_line(&mut self) -> bool {
        let completed = match core::str::from_utf8(&self.line) {
            Ok("") => false,
            Ok(line) => {
                self.last_line.clear();
                // Cannot overflow, both buffers share the same capacity
                let _ = self.last_line.push_str(line);
                true
            }
            Err(_) => {
                warn!("Dropping GPS line with invalid UTF-8");
                false
            }
        };
        self.line.clear();
        completed
    }

    /// The most recent complete line, empty until one arrives
    pub fn last_line(&self) -> &str {
        self.last_line.as_str()
    }

    /// Drain up to `max_bytes` from `gps` and store the newest complete line
    /// in `sample`.
    ///
    /// Returns whether a new line was stored. Overflows are logged and
    /// otherwise ignored.
    pub fn drain_into<G: GpsSource>(
        &mut self,
        gps: &mut G,
        max_bytes: u16,
        sample: &mut SensorSample,
    ) -> bool {
        let mut updated = false;

        for _ in 0..max_bytes {
            let Some(byte) = gps.read_byte() else {
                break;
            };
            match self.feed(byte) {
                Ok(completed) => updated |= completed,
                Err(e) => warn!("GPS: {}", e),
            }
        }

        if updated {
            debug!("GPS line: {}", self.last_line());
            sample.set_gps_sentence(self.last_line());
        }
        updated
    }
}

impl Default for NmeaLineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bytes<'a>(&'a [u8]);

    impl GpsSource for Bytes<'_> {
        fn read_byte(&mut self) -> Option<u8> {
            let (first, rest) = self.0.split_first()?;
            self.0 = rest;
            Some(*first)
        }
    }

    #[test]
    fn test_crlf_framing() {
        let mut assembler = NmeaLineAssembler::new();
        let mut sample = SensorSample::default();
        let mut gps = Bytes(b"$GPGLL,4916.45,N*2D\r\n");

        assert!(assembler.drain_into(&mut gps, 200, &mut sample));
        assert_eq!(sample.gps_sentence(), "$GPGLL,4916.45,N*2D");
    }

    #[test]
    fn test_newest_line_wins() {
        let mut assembler = NmeaLineAssembler::new();
        let mut sample = SensorSample::default();
        let mut gps = Bytes(b"$A\n$B\n\n$C");

        assert!(assembler.drain_into(&mut gps, 200, &mut sample));
        assert_eq!(sample.gps_sentence(), "$B");

        // "$C" completes on a later cycle
        let mut gps = Bytes(b"\n");
        assert!(assembler.drain_into(&mut gps, 200, &mut sample));
        assert_eq!(sample.gps_sentence(), "$C");
    }

    #[test]
    fn test_overflow_drops_partial_line() {
        let mut assembler = NmeaLineAssembler::new();
        for _ in 0..GPS_SENTENCE_CAPACITY {
            assert_eq!(assembler.feed(b'x'), Ok(false));
        }
        assert_eq!(
            assembler.feed(b'x'),
            Err(SensorError::Overflow {
                capacity: GPS_SENTENCE_CAPACITY
            })
        );

        // The tail of the oversized line is skipped, not assembled
        for byte in b"TAIL" {
            assert_eq!(assembler.feed(*byte), Ok(false));
        }
        assert_eq!(assembler.feed(b'\n'), Ok(false));
        assert_eq!(assembler.last_line(), "");

        // Assembly restarts with the next line
        for byte in b"$OK" {
            assert_eq!(assembler.feed(*byte), Ok(false));
        }
        assert_eq!(assembler.feed(b'\n'), Ok(true));
        assert_eq!(assembler.last_line(), "$OK");
    }

    #[test]
    fn test_oversized_line_keeps_previous_sentence() {
        let mut assembler = NmeaLineAssembler::new();
        let mut sample = SensorSample::default();
        let mut gps = Bytes(b"$GPGGA,1\r\n");
        assert!(assembler.drain_into(&mut gps, 200, &mut sample));

        let mut long = [b'A'; 81];
        long[70..80].copy_from_slice(b"TAILTAILTA");
        long[80] = b'\n';
        let mut gps = Bytes(&long);

        assert!(!assembler.drain_into(&mut gps, 200, &mut sample));
        assert_eq!(sample.gps_sentence(), "$GPGGA,1");
        assert_eq!(assembler.last_line(), "$GPGGA,1");
    }

    #[test]
    fn test_byte_budget_bounds_each_cycle() {
        let mut assembler = NmeaLineAssembler::new();
        let mut sample = SensorSample::default();
        let mut gps = Bytes(b"$GPRMC\n");

        // 7 bytes at 3 per cycle: "$GP", "RMC", then "\n"
        assert!(!assembler.drain_into(&mut gps, 3, &mut sample));
        assert!(!assembler.drain_into(&mut gps, 3, &mut sample));
        assert_eq!(sample.gps_sentence(), "");
        assert!(assembler.drain_into(&mut gps, 3, &mut sample));
        assert_eq!(sample.gps_sentence(), "$GPRMC");
        assert!(gps.0.is_empty());
    }
}
