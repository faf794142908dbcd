//! GNSS fix assembly on top of the `nmea0183` sentence parser
//!
//! This library turns a text stream of NMEA 0183 sentences into position fixes:
//! - Line reader that frames sentences and hands them to [`nmea0183::Parser`]
//! - Fix assembly: RMC, GGA and VTG sentences sharing a UTC time are merged
//!   into one [`Fix`], with vertical speed derived from consecutive altitudes
//! - Message handler trait for processing decoded sentences
//!
//! # Example
//!
//! ```no_run
//! use gnss_fix::{FixAssembler, MessageHandler, NmeaStreamReader};
//!
//! let file = std::fs::File::open("track.nmea").unwrap();
//! let mut reader = NmeaStreamReader::new(std::io::BufReader::new(file));
//! let mut assembler = FixAssembler::new();
//!
//! while let Ok(Some(frame)) = reader.next_frame() {
//!     assembler.handle_message(&frame);
//!     while let Some(fix) = assembler.pop_fix() {
//!         println!("{:?}, {:?}", fix.latitude, fix.longitude);
//!     }
//! }
//! ```

pub mod fix_assembler;
pub mod message_handler;
pub mod stream_reader;

// Re-export commonly used types
pub use fix_assembler::{Fix, FixAssembler};
pub use message_handler::MessageHandler;
pub use nmea0183::ParseResult;
pub use stream_reader::{FrameError, NmeaFrame, NmeaStreamReader, ReadError, parse_line};
