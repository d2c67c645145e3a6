use failure::Fail;

use crate::smf::Port;
use crate::time::ClockTime;

/// A message ready to be handed to an output port at `time` after playback starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEvent {
  pub time: ClockTime,
  pub port: Port,
  pub bytes: Vec<u8>,
}

impl DispatchEvent {
  pub fn new(time: ClockTime, port: Port, bytes: Vec<u8>) -> DispatchEvent {
    DispatchEvent { time, port, bytes }
  }
}

#[derive(Debug, Fail)]
pub enum SinkError {
  #[fail(display = "Failed to initialise the output driver: {}", cause)]
  Init { cause: String },

  #[fail(display = "Output driver not found: {}", id)]
  DriverNotFound { id: String },

  #[fail(display = "Failed to open an output port: {}", cause)]
  Open { cause: String },
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for dispatched messages.
///
/// Sends addressed to a port the sink does not have open are dropped.
pub trait OutputSink {
  fn name(&self) -> &str;

  fn port_count(&self) -> usize;

  fn open(&mut self) -> SinkResult<()>;

  fn close(&mut self);

  /// `at` is the absolute time of the message, relative to playback start.
  fn send(&mut self, port: Port, bytes: &[u8], at: ClockTime);
}
