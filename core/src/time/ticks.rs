use std::{
  cmp::{min, Ordering},
  ops::{Add, AddAssign, Sub},
};

use crate::time::TimeBase;

#[derive(Debug, Eq, Copy, Clone, Default, Hash)]
pub struct TicksTime(u64);

impl TicksTime {
  pub fn new(ticks: u64) -> TicksTime {
    TicksTime(ticks)
  }

  pub fn zero() -> TicksTime {
    TicksTime(0)
  }

  pub fn ticks(&self) -> u64 {
    self.0
  }

  /// Position expressed in quarter notes for the given resolution.
  pub fn to_quarters(&self, time_base: TimeBase) -> f64 {
    self.0 as f64 / f64::from(time_base)
  }
}

impl Ord for TicksTime {
  fn cmp(&self, other: &TicksTime) -> Ordering {
    self.0.cmp(&other.0)
  }
}

impl PartialOrd for TicksTime {
  fn partial_cmp(&self, other: &TicksTime) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for TicksTime {
  fn eq(&self, other: &TicksTime) -> bool {
    self.0 == other.0
  }
}

impl Add<u32> for TicksTime {
  type Output = TicksTime;
  fn add(self, rhs: u32) -> Self {
    TicksTime::new(self.0 + u64::from(rhs))
  }
}

impl AddAssign<u32> for TicksTime {
  fn add_assign(&mut self, rhs: u32) {
    *self = *self + rhs;
  }
}

impl Sub for TicksTime {
  type Output = TicksTime;
  fn sub(self, rhs: TicksTime) -> Self {
    TicksTime::new(self.0 - min(self.0, rhs.0))
  }
}
