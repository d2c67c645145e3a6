pub mod chunks;
pub mod decoder;
pub mod events;
pub mod merger;
pub mod vlq;

use failure::Fail;
use log::debug;

pub use self::chunks::{Format, Header, RawFile};
pub use self::decoder::{decode_track, DecoderContext, TrackDecoder};
pub use self::events::{
  ChannelKind, ChannelMessage, MetaEvent, MetaKind, Payload, Port, SequenceEvent, SysExMessage,
};
pub use self::merger::{merge_tracks, MergedEvent};

use crate::time::TimeBase;

#[derive(Debug, Fail, PartialEq, Eq, Clone)]
pub enum SmfError {
  #[fail(display = "Malformed header: {}", cause)]
  Header { cause: String },

  #[fail(display = "Missing MTrk signature at offset {}", offset)]
  TrackSignature { offset: usize },

  #[fail(display = "Unterminated variable-length quantity at offset {}", offset)]
  UnterminatedQuantity { offset: usize },

  #[fail(display = "Value {} does not fit in a variable-length quantity", value)]
  QuantityOverflow { value: u32 },

  #[fail(display = "Unknown meta event 0x{:02X} at offset {}", meta_type, offset)]
  UnknownMetaEvent { meta_type: u8, offset: usize },

  #[fail(display = "Unknown channel message 0x{:02X} at offset {}", status, offset)]
  UnknownChannelMessage { status: u8, offset: usize },

  #[fail(
    display = "Buffer overrun at offset {}: {} bytes required, {} available",
    offset, required, available
  )]
  BufferOverrun {
    offset: usize,
    required: usize,
    available: usize,
  },

  #[fail(display = "Data byte without a previous status at offset {}", offset)]
  UnterminatedRunningStatus { offset: usize },
}

pub type Result<T> = std::result::Result<T, SmfError>;

/// A fully decoded file: every track merged into a single tick-ordered sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
  pub header: Header,
  pub events: Vec<MergedEvent>,
}

impl Sequence {
  pub fn time_base(&self) -> TimeBase {
    self.header.time_base
  }
}

/// Splits, decodes and merges every track of an SMF byte buffer.
///
/// Any malformed chunk or event aborts the whole file.
pub fn parse(data: &[u8]) -> Result<Sequence> {
  let raw = RawFile::parse(data)?;

  let tracks = raw
    .tracks
    .iter()
    .enumerate()
    .map(|(index, track)| -> Result<Vec<SequenceEvent>> {
      let events = decode_track(track)?;
      debug!("Track {}: {} events", index, events.len());
      Ok(events)
    })
    .collect::<Result<Vec<Vec<SequenceEvent>>>>()?;

  let events = merge_tracks(tracks);
  debug!("Merged {} events", events.len());

  Ok(Sequence {
    header: raw.header,
    events,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::time::{Tempo, TicksTime};

  fn track_chunk(data: &[u8]) -> Vec<u8> {
    let mut chunk = b"MTrk".to_vec();
    chunk.extend_from_slice(&(data.len() as u32).to_be_bytes());
    chunk.extend_from_slice(data);
    chunk
  }

  fn smf(format: u16, time_base: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut data = b"MThd".to_vec();
    data.extend_from_slice(&[0, 0, 0, 6]);
    data.extend_from_slice(&format.to_be_bytes());
    data.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    data.extend_from_slice(&time_base.to_be_bytes());
    for track in tracks {
      data.extend(track_chunk(track));
    }
    data
  }

  #[test]
  fn parse_single_track() {
    let data = smf(
      0,
      480,
      &[&[0x00, 0x90, 0x3C, 0x64, 0x83, 0x60, 0x3C, 0x00, 0x00, 0xFF, 0x2F, 0x00]],
    );
    let sequence = parse(&data).unwrap();
    assert_eq!(sequence.time_base(), 480);
    assert_eq!(sequence.header.format, Format::SingleTrack);
    let ticks: Vec<u64> = sequence.events.iter().map(|e| e.event.tick.ticks()).collect();
    assert_eq!(ticks, vec![0, 480]);
  }

  #[test]
  fn parse_merges_tracks() {
    let conductor: &[u8] = &[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, 0x00, 0xFF, 0x2F, 0x00];
    let notes: &[u8] = &[0x0A, 0x90, 0x40, 0x40, 0x0A, 0x80, 0x40, 0x00, 0x00, 0xFF, 0x2F, 0x00];
    let sequence = parse(&smf(1, 96, &[conductor, notes])).unwrap();

    assert_eq!(sequence.events.len(), 3);
    assert_eq!(sequence.events[0].track, 0);
    assert_eq!(
      sequence.events[0].event.payload,
      Payload::Meta(MetaEvent::SetTempo(Tempo::new(500_000)))
    );
    assert_eq!(sequence.events[1].event.tick, TicksTime::new(10));
    assert_eq!(sequence.events[2].event.tick, TicksTime::new(20));
  }

  #[test]
  fn parse_bad_signature_yields_nothing() {
    let mut data = smf(0, 480, &[&[0x00, 0x90, 0x3C, 0x64]]);
    data[0] = b'X';
    match parse(&data) {
      Err(SmfError::Header { .. }) => {}
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn parse_aborts_on_any_bad_track() {
    let good: &[u8] = &[0x00, 0x90, 0x3C, 0x64];
    let bad: &[u8] = &[0x00, 0xFF, 0x7F, 0x00];
    assert_eq!(
      parse(&smf(1, 480, &[good, bad])),
      Err(SmfError::UnknownMetaEvent {
        meta_type: 0x7F,
        offset: 1
      })
    );
  }
}
