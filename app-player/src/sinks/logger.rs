use log::{info, trace};

use smf_player_core::output::{OutputSink, SinkResult};
use smf_player_core::smf::Port;
use smf_player_core::time::ClockTime;

use super::port_label;

pub const ID: &str = "log";

/// Writes every message to the log instead of a device.
pub struct LogSink {
  port_count: usize,
  is_open: bool,
  sent: usize,
}

impl LogSink {
  pub fn new(port_count: usize) -> LogSink {
    LogSink {
      port_count,
      is_open: false,
      sent: 0,
    }
  }

  #[allow(dead_code)]
  pub fn sent(&self) -> usize {
    self.sent
  }
}

impl OutputSink for LogSink {
  fn name(&self) -> &str {
    ID
  }

  fn port_count(&self) -> usize {
    self.port_count
  }

  fn open(&mut self) -> SinkResult<()> {
    info!("Logging MIDI output for {} ports", self.port_count);
    self.is_open = true;
    Ok(())
  }

  fn close(&mut self) {
    if self.is_open {
      info!("Closing MIDI log output after {} messages", self.sent);
      self.is_open = false;
    }
  }

  fn send(&mut self, port: Port, bytes: &[u8], at: ClockTime) {
    if !self.is_open || usize::from(port) >= self.port_count {
      trace!("Dropping message for port {}", port_label(port));
      return;
    }
    info!(
      "{:>10.3} ms  {}  {:02X?}",
      at.millis(),
      port_label(port),
      bytes
    );
    self.sent += 1;
  }
}
