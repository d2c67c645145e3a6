use std::path::Path;

use failure::Error;
use log::{debug, info};

use crate::output::DispatchEvent;
use crate::scheduler::{Scheduler, TempoAnchor};
use crate::smf::{self, Format, Header, Port, Sequence};
use crate::time::{ClockTime, TimeBase};

/// Everything needed to play a file: timed messages plus the tempo map they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
  header: Header,
  events: Vec<DispatchEvent>,
  tempo_map: Vec<TempoAnchor>,
}

impl Performance {
  pub fn from_sequence(sequence: Sequence) -> Performance {
    let mut scheduler = Scheduler::new(sequence.time_base());
    let events = scheduler.schedule(sequence.events);

    Performance {
      header: sequence.header,
      events,
      tempo_map: scheduler.into_tempo_map(),
    }
  }

  pub fn from_bytes(data: &[u8]) -> smf::Result<Performance> {
    smf::parse(data).map(Performance::from_sequence)
  }

  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Performance, Error> {
    let path = path.as_ref();
    info!("Loading {} ...", path.display());

    let data = std::fs::read(path)?;
    let performance = Performance::from_bytes(&data)?;

    debug!(
      "{} events, {} tempo changes, {:.3} s",
      performance.len(),
      performance.tempo_map.len() - 1,
      performance.duration().to_seconds()
    );

    Ok(performance)
  }

  pub fn header(&self) -> &Header {
    &self.header
  }

  pub fn format(&self) -> Format {
    self.header.format
  }

  pub fn time_base(&self) -> TimeBase {
    self.header.time_base
  }

  pub fn track_count(&self) -> u16 {
    self.header.track_count
  }

  pub fn events(&self) -> &[DispatchEvent] {
    &self.events
  }

  pub fn into_events(self) -> Vec<DispatchEvent> {
    self.events
  }

  pub fn tempo_map(&self) -> &[TempoAnchor] {
    &self.tempo_map
  }

  pub fn has_tempo_changes(&self) -> bool {
    self.tempo_map.len() > 1
  }

  pub fn len(&self) -> usize {
    self.events.len()
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  /// Time of the last message
  pub fn duration(&self) -> ClockTime {
    self
      .events
      .last()
      .map(|event| event.time)
      .unwrap_or_else(ClockTime::zero)
  }

  /// Highest port addressed by any message.
  pub fn max_port(&self) -> Option<Port> {
    self.events.iter().map(|event| event.port).max()
  }
}
