use crate::NmeaFrame;

/// Trait for components that handle NMEA 0183 sentences
///
/// This trait allows consumers to receive all sentences and decide internally
/// which ones they're interested in, reducing coupling between the read loop
/// and individual consumers.
pub trait MessageHandler {
    /// Process an incoming NMEA 0183 sentence
    ///
    /// Implementations should check the message type and handle only the
    /// sentences they're interested in, ignoring others.
    fn handle_message(&mut self, frame: &NmeaFrame);
}
