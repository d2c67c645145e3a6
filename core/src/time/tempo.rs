pub const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Microseconds per quarter note, the unit of the Set Tempo meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tempo(u32);

impl Tempo {
  /// 120 BPM, in effect until the first Set Tempo event
  pub const DEFAULT: Tempo = Tempo(500_000);

  pub fn new(micros_per_quarter: u32) -> Tempo {
    Tempo(micros_per_quarter)
  }

  pub fn micros_per_quarter(&self) -> u32 {
    self.0
  }

  pub fn millis_per_quarter(&self) -> f64 {
    f64::from(self.0) / 1000.0
  }

  pub fn bpm(&self) -> f64 {
    MICROS_PER_MINUTE / f64::from(self.0)
  }
}

impl Default for Tempo {
  fn default() -> Tempo {
    Tempo::DEFAULT
  }
}

#[cfg(test)]
mod test {

  use super::Tempo;

  #[test]
  pub fn tempo_new() {
    let tempo = Tempo::new(250_000);
    assert_eq!(tempo.micros_per_quarter(), 250_000);
    assert_eq!(tempo.millis_per_quarter(), 250.0);
  }

  #[test]
  pub fn tempo_default() {
    let tempo = Tempo::default();
    assert_eq!(tempo.micros_per_quarter(), 500_000);
    assert!((tempo.bpm() - 120.0).abs() < 1e-9);
  }
}
