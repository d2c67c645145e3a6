pub mod clock;
pub mod tempo;
pub mod ticks;

pub use self::clock::ClockTime;
pub use self::tempo::Tempo;
pub use self::ticks::TicksTime;

/// Ticks per quarter note, as declared by the file header
pub type TimeBase = u16;
