use log::debug;

use crate::output::DispatchEvent;
use crate::smf::{MergedEvent, MetaEvent, Payload, SequenceEvent};
use crate::time::{ClockTime, Tempo, TicksTime, TimeBase};

/// Start of the tempo segment currently in effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoAnchor {
  pub tick: TicksTime,
  pub elapsed: ClockTime,
  pub tempo: Tempo,
}

impl Default for TempoAnchor {
  fn default() -> TempoAnchor {
    TempoAnchor {
      tick: TicksTime::zero(),
      elapsed: ClockTime::zero(),
      tempo: Tempo::DEFAULT,
    }
  }
}

impl TempoAnchor {
  /// Elapsed time at `tick`, assuming no tempo change since the anchor.
  pub fn elapsed_at(&self, tick: TicksTime, time_base: TimeBase) -> ClockTime {
    let quarters = (tick - self.tick).to_quarters(time_base);
    self.elapsed + ClockTime::from_millis(quarters * self.tempo.millis_per_quarter())
  }
}

/// Converts tick positions into milliseconds from the start of playback.
pub struct Scheduler {
  time_base: TimeBase,
  anchor: TempoAnchor,
  tempo_map: Vec<TempoAnchor>,
}

impl Scheduler {
  pub fn new(time_base: TimeBase) -> Scheduler {
    let anchor = TempoAnchor::default();
    Scheduler {
      time_base,
      anchor,
      tempo_map: vec![anchor],
    }
  }

  pub fn anchor(&self) -> &TempoAnchor {
    &self.anchor
  }

  /// Every anchor committed so far, starting with the default one.
  pub fn tempo_map(&self) -> &[TempoAnchor] {
    &self.tempo_map
  }

  pub fn into_tempo_map(self) -> Vec<TempoAnchor> {
    self.tempo_map
  }

  /// Events must arrive in non-decreasing tick order.
  pub fn process(&mut self, event: SequenceEvent) -> Option<DispatchEvent> {
    let elapsed = self.anchor.elapsed_at(event.tick, self.time_base);

    match event.payload {
      Payload::Meta(MetaEvent::SetTempo(tempo)) => {
        debug!(
          "Tempo {:.2} BPM from tick {} ({:.3} ms)",
          tempo.bpm(),
          event.tick.ticks(),
          elapsed.millis()
        );
        self.anchor = TempoAnchor {
          tick: event.tick,
          elapsed,
          tempo,
        };
        self.tempo_map.push(self.anchor);
        None
      }
      Payload::Meta(_) => None,
      Payload::Channel(msg) => Some(DispatchEvent::new(elapsed, msg.port, msg.bytes)),
      Payload::SysEx(msg) => Some(DispatchEvent::new(elapsed, msg.port, msg.bytes)),
    }
  }

  pub fn schedule<I>(&mut self, events: I) -> Vec<DispatchEvent>
  where
    I: IntoIterator<Item = MergedEvent>,
  {
    events
      .into_iter()
      .filter_map(|merged| self.process(merged.event))
      .collect()
  }
}
