use crate::time::{Tempo, TicksTime};

pub type Port = u8;

pub const META_STATUS: u8 = 0xFF;
pub const SYSEX_STATUS: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;

/// Channel voice message with its status byte, ready to be sent as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
  pub port: Port,
  pub bytes: Vec<u8>,
}

/// System exclusive message framed as `F0 <data> F7`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysExMessage {
  pub port: Port,
  pub bytes: Vec<u8>,
}

/// Channel voice messages, keyed by the high nibble of the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
  NoteOff,
  NoteOn,
  PolyphonicKeyPressure,
  ControlChange,
  ProgramChange,
  ChannelPressure,
  PitchBend,
}

impl ChannelKind {
  pub fn from_status(status: u8) -> Option<ChannelKind> {
    match (status >> 4) & 0x0f {
      0b1000 => Some(ChannelKind::NoteOff),
      0b1001 => Some(ChannelKind::NoteOn),
      0b1010 => Some(ChannelKind::PolyphonicKeyPressure),
      0b1011 => Some(ChannelKind::ControlChange),
      0b1100 => Some(ChannelKind::ProgramChange),
      0b1101 => Some(ChannelKind::ChannelPressure),
      0b1110 => Some(ChannelKind::PitchBend),
      _ => None,
    }
  }

  pub fn data_size(&self) -> usize {
    match self {
      ChannelKind::NoteOff => 2,
      ChannelKind::NoteOn => 2,
      ChannelKind::PolyphonicKeyPressure => 2,
      ChannelKind::ControlChange => 2,
      ChannelKind::ProgramChange => 1,
      ChannelKind::ChannelPressure => 1,
      ChannelKind::PitchBend => 2,
    }
  }
}

/// Meta events recognised but carrying nothing playback cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
  SequenceNumber,
  Text,
  Copyright,
  TrackName,
  InstrumentName,
  Lyric,
  Marker,
  CuePoint,
  ProgramName,
  DeviceName,
  ChannelPrefix,
  SmpteOffset,
  TimeSignature,
  KeySignature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaEvent {
  EndOfTrack,
  SetTempo(Tempo),
  PortSelect(Port),
  Ignored(MetaKind),
}

impl MetaEvent {
  pub const END_OF_TRACK: u8 = 0x2F;
  pub const SET_TEMPO: u8 = 0x51;
  pub const PORT_SELECT: u8 = 0x21;

  /// Only tempo and port changes survive decoding.
  pub fn is_retained(&self) -> bool {
    match self {
      MetaEvent::SetTempo(_) | MetaEvent::PortSelect(_) => true,
      MetaEvent::EndOfTrack | MetaEvent::Ignored(_) => false,
    }
  }
}

impl MetaKind {
  pub fn from_type(meta_type: u8) -> Option<MetaKind> {
    match meta_type {
      0x00 => Some(MetaKind::SequenceNumber),
      0x01 => Some(MetaKind::Text),
      0x02 => Some(MetaKind::Copyright),
      0x03 => Some(MetaKind::TrackName),
      0x04 => Some(MetaKind::InstrumentName),
      0x05 => Some(MetaKind::Lyric),
      0x06 => Some(MetaKind::Marker),
      0x07 => Some(MetaKind::CuePoint),
      0x08 => Some(MetaKind::ProgramName),
      0x09 => Some(MetaKind::DeviceName),
      0x20 => Some(MetaKind::ChannelPrefix),
      0x54 => Some(MetaKind::SmpteOffset),
      0x58 => Some(MetaKind::TimeSignature),
      0x59 => Some(MetaKind::KeySignature),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
  Channel(ChannelMessage),
  SysEx(SysExMessage),
  Meta(MetaEvent),
}

impl Payload {
  /// Output port and bytes for anything that can be transmitted.
  pub fn message(&self) -> Option<(Port, &[u8])> {
    match self {
      Payload::Channel(msg) => Some((msg.port, msg.bytes.as_slice())),
      Payload::SysEx(msg) => Some((msg.port, msg.bytes.as_slice())),
      Payload::Meta(_) => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceEvent {
  pub tick: TicksTime,
  pub payload: Payload,
}

impl SequenceEvent {
  pub fn new(tick: TicksTime, payload: Payload) -> SequenceEvent {
    SequenceEvent { tick, payload }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn channel_kinds() {
    assert_eq!(ChannelKind::from_status(0x80), Some(ChannelKind::NoteOff));
    assert_eq!(ChannelKind::from_status(0x9F), Some(ChannelKind::NoteOn));
    assert_eq!(ChannelKind::from_status(0xB3).map(|k| k.data_size()), Some(2));
    assert_eq!(ChannelKind::from_status(0xC0).map(|k| k.data_size()), Some(1));
    assert_eq!(ChannelKind::from_status(0xD5).map(|k| k.data_size()), Some(1));
    assert_eq!(ChannelKind::from_status(0xE0).map(|k| k.data_size()), Some(2));
    assert_eq!(ChannelKind::from_status(0xF0), None);
    assert_eq!(ChannelKind::from_status(0xF7), None);
    assert_eq!(ChannelKind::from_status(0x3C), None);
  }

  #[test]
  fn meta_kinds() {
    for meta_type in (0x00..=0x09).chain(vec![0x20, 0x54, 0x58, 0x59]) {
      assert!(MetaKind::from_type(meta_type).is_some(), "0x{:02X}", meta_type);
    }
    assert_eq!(MetaKind::from_type(0x03), Some(MetaKind::TrackName));
    assert_eq!(MetaKind::from_type(MetaEvent::SET_TEMPO), None);
    assert_eq!(MetaKind::from_type(MetaEvent::PORT_SELECT), None);
    assert_eq!(MetaKind::from_type(MetaEvent::END_OF_TRACK), None);
    assert_eq!(MetaKind::from_type(0x7F), None);
  }

  #[test]
  fn retained_meta_events() {
    assert!(MetaEvent::SetTempo(Tempo::DEFAULT).is_retained());
    assert!(MetaEvent::PortSelect(1).is_retained());
    assert!(!MetaEvent::EndOfTrack.is_retained());
    assert!(!MetaEvent::Ignored(MetaKind::Marker).is_retained());
  }

  #[test]
  fn payload_message() {
    let note = Payload::Channel(ChannelMessage {
      port: 2,
      bytes: vec![0x90, 0x3C, 0x64],
    });
    assert_eq!(note.message(), Some((2, &[0x90u8, 0x3C, 0x64][..])));
    assert_eq!(Payload::Meta(MetaEvent::PortSelect(2)).message(), None);
  }
}
