//! NMEA 0183 Stream Reader
//!
//! Reads newline terminated sentences from any buffered source (file,
//! serial device, TCP stream) and decodes them with [`nmea0183::Parser`].
//! Blank lines and non-NMEA chatter (e.g. gpsd JSON reports) are skipped.
//! Lines holding anything but ASCII are rejected before decoding, so binary
//! noise on the wire never reaches the sentence parser.
//!
//! # Usage
//!
//! ```no_run
//! use gnss_fix::NmeaStreamReader;
//!
//! let file = std::fs::File::open("track.nmea").unwrap();
//! let mut reader = NmeaStreamReader::new(std::io::BufReader::new(file));
//!
//! while let Ok(Some(frame)) = reader.next_frame() {
//!     println!("{}", frame.raw);
//! }
//! ```

use std::fmt;
use std::io::BufRead;

use nmea0183::{ParseResult, Parser};

/// A decoded NMEA 0183 sentence and the line it came from
#[derive(Debug)]
pub struct NmeaFrame {
    pub sentence: ParseResult,
    pub raw: String,
}

/// Why a line could not be decoded
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    MissingStart,
    NonAscii,
    /// Rejected by the sentence parser (checksum, unsupported type, bad field)
    Rejected(String),
    Incomplete,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrameError::MissingStart => write!(f, "sentence does not start with '$'"),
            FrameError::NonAscii => write!(f, "non-ASCII bytes in sentence"),
            FrameError::Rejected(reason) => write!(f, "{}", reason),
            FrameError::Incomplete => write!(f, "incomplete sentence"),
        }
    }
}

#[derive(Debug)]
pub enum ReadError {
    Io(std::io::Error),
    Parse { line: String, error: FrameError },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadError::Io(e) => write!(f, "read error: {}", e),
            ReadError::Parse { line, error } => write!(f, "{} in '{}'", error, line),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        ReadError::Io(e)
    }
}

/// Decode one line with `parser`.
///
/// Returns `Ok(None)` for lines that are not NMEA sentences at all.
pub fn parse_line(parser: &mut Parser, line: &[u8]) -> Result<Option<ParseResult>, FrameError> {
    let line = line.trim_ascii();
    if line.is_empty() || line.starts_with(b"{") {
        return Ok(None);
    }
    if !line.is_ascii() {
        return Err(FrameError::NonAscii);
    }
    if !line.starts_with(b"$") {
        return Err(FrameError::MissingStart);
    }

    // the parser completes a sentence on its CR LF terminator
    let mut decoded = None;
    for &byte in line.iter().chain(b"\r\n") {
        if let Some(result) = parser.parse_from_byte(byte) {
            decoded = Some(result);
        }
    }
    match decoded {
        Some(Ok(sentence)) => Ok(Some(sentence)),
        Some(Err(reason)) => Err(FrameError::Rejected(reason.to_string())),
        None => Err(FrameError::Incomplete),
    }
}

/// NMEA 0183 stream reader that pulls lines from a source and decodes them
pub struct NmeaStreamReader<R: BufRead> {
    source: R,
    parser: Parser,
    line: Vec<u8>,
    skipped_lines: u64,
}

impl<R: BufRead> NmeaStreamReader<R> {
    /// Create a new NMEA 0183 stream reader
    pub fn new(source: R) -> Self {
        Self {
            source,
            parser: Parser::new(),
            line: Vec::new(),
            skipped_lines: 0,
        }
    }

    /// Read until the next decodable sentence
    ///
    /// # Returns
    /// `Ok(Some(NmeaFrame))` for a sentence, `Ok(None)` at end of stream,
    /// `Err(ReadError::Parse)` for a corrupt line (reading can continue) and
    /// `Err(ReadError::Io)` when the source failed.
    pub fn next_frame(&mut self) -> Result<Option<NmeaFrame>, ReadError> {
        loop {
            self.line.clear();
            // raw bytes: a stray non-UTF-8 byte is a bad line, not an I/O failure
            if self.source.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            match parse_line(&mut self.parser, &self.line) {
                Ok(Some(sentence)) => {
                    return Ok(Some(NmeaFrame {
                        sentence,
                        raw: String::from_utf8_lossy(self.line.trim_ascii()).into_owned(),
                    }));
                }
                Ok(None) => self.skipped_lines += 1,
                Err(error) => {
                    return Err(ReadError::Parse {
                        line: String::from_utf8_lossy(self.line.trim_ascii()).into_owned(),
                        error,
                    });
                }
            }
        }
    }

    /// Number of blank or non-NMEA lines skipped so far
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    #[test]
    fn test_sentence_is_decoded() {
        let mut parser = Parser::new();
        let sentence = parse_line(&mut parser, GGA.as_bytes()).unwrap().unwrap();
        assert!(matches!(sentence, ParseResult::GGA(Some(_))));

        let sentence = parse_line(&mut parser, RMC.as_bytes()).unwrap().unwrap();
        assert!(matches!(sentence, ParseResult::RMC(Some(_))));
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut parser = Parser::new();
        let line = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*48";
        assert!(matches!(
            parse_line(&mut parser, line.as_bytes()),
            Err(FrameError::Rejected(_))
        ));
        // the parser recovers on the next sentence
        assert!(parse_line(&mut parser, GGA.as_bytes()).unwrap().is_some());
    }

    #[test]
    fn test_non_nmea_lines() {
        let mut parser = Parser::new();
        assert!(matches!(parse_line(&mut parser, b""), Ok(None)));
        assert!(matches!(parse_line(&mut parser, b"{\"class\":\"VERSION\"}"), Ok(None)));
        assert!(matches!(
            parse_line(&mut parser, b"GPRMC,123519"),
            Err(FrameError::MissingStart)
        ));
    }

    #[test]
    fn test_non_ascii_fields_are_rejected() {
        let mut parser = Parser::new();
        let in_time = "$GPRMC,1é3456,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
        let in_date = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,2é0394,003.1,W*6A";
        assert!(matches!(parse_line(&mut parser, in_time.as_bytes()), Err(FrameError::NonAscii)));
        assert!(matches!(parse_line(&mut parser, in_date.as_bytes()), Err(FrameError::NonAscii)));
        assert!(parse_line(&mut parser, RMC.as_bytes()).unwrap().is_some());
    }

    #[test]
    fn test_reader_survives_binary_noise() {
        let mut input = b"\xff\xfe\x00garbage\n".to_vec();
        input.extend_from_slice(GGA.as_bytes());
        input.push(b'\n');
        let mut reader = NmeaStreamReader::new(Cursor::new(input));

        assert!(matches!(
            reader.next_frame(),
            Err(ReadError::Parse { error: FrameError::NonAscii, .. })
        ));
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.raw, GGA);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_reader_skips_noise_and_reports_errors() {
        let input = format!(
            "\n{{\"class\":\"WATCH\"}}\r\n$GPVTG,089.0,T,,,15.2,N,,,A*12\r\n$GPGGA,1*00\n{}\n",
            GGA
        );
        let mut reader = NmeaStreamReader::new(Cursor::new(input));

        let frame = reader.next_frame().unwrap().unwrap();
        assert!(matches!(frame.sentence, ParseResult::VTG(Some(_))));
        assert_eq!(reader.skipped_lines(), 2);

        assert!(matches!(reader.next_frame(), Err(ReadError::Parse { .. })));
        assert!(reader.next_frame().unwrap().is_some());
        assert!(reader.next_frame().unwrap().is_none());
    }
}
