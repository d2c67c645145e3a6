use std::ops::Add;
use std::time::Duration;

pub const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Elapsed wall-clock time in (fractional) milliseconds
#[derive(Debug, PartialOrd, PartialEq, Clone, Copy, Default)]
pub struct ClockTime(f64);

impl ClockTime {
  pub fn zero() -> ClockTime {
    ClockTime(0.0)
  }

  pub fn from_millis(millis: f64) -> ClockTime {
    ClockTime(millis)
  }

  pub fn millis(&self) -> f64 {
    self.0
  }

  pub fn to_seconds(&self) -> f64 {
    self.0 / 1000.0
  }

  /// Rounds to whole nanoseconds. Negative values clamp to zero.
  pub fn to_duration(&self) -> Duration {
    let nanos = (self.0 * NANOS_PER_MILLI).round();
    if nanos > 0.0 {
      Duration::from_nanos(nanos as u64)
    } else {
      Duration::from_nanos(0)
    }
  }
}

impl Add for ClockTime {
  type Output = ClockTime;

  fn add(self, rhs: ClockTime) -> ClockTime {
    ClockTime(self.0 + rhs.0)
  }
}

#[cfg(test)]
mod test {
  use super::ClockTime;
  use std::time::Duration;

  #[test]
  pub fn clock_time_zero() {
    assert_eq!(ClockTime::zero().millis(), 0.0);
  }

  #[test]
  pub fn clock_time_add() {
    let time1 = ClockTime::from_millis(500.0);
    let time2 = ClockTime::from_millis(250.0);
    assert_eq!(time1 + time2, ClockTime::from_millis(750.0));
  }

  #[test]
  pub fn clock_time_seconds() {
    assert_eq!(ClockTime::from_millis(250.0).to_seconds(), 0.25);
  }

  #[test]
  pub fn clock_time_to_duration() {
    assert_eq!(
      ClockTime::from_millis(500.0).to_duration(),
      Duration::from_millis(500)
    );
    assert_eq!(
      ClockTime::from_millis(0.0015).to_duration(),
      Duration::from_nanos(1500)
    );
    assert_eq!(ClockTime::from_millis(-3.0).to_duration(), Duration::from_nanos(0));
  }
}
