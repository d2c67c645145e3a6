use log::trace;

use super::events::{
  ChannelKind, ChannelMessage, MetaEvent, MetaKind, Payload, Port, SequenceEvent, SysExMessage,
  META_STATUS, SYSEX_END, SYSEX_STATUS,
};
use super::vlq;
use super::{Result, SmfError};
use crate::time::{Tempo, TicksTime};

const STATUS_BIT: u8 = 0b1000_0000;
const NO_STATUS: u8 = 0;

const TEMPO_DATA_SIZE: usize = 3;

/// Per-track state that carries from one event to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderContext {
  /// Last channel status byte seen, `0` until the first one
  pub running_status: u8,
  /// Port selected by the last Port Select meta event
  pub port: Port,
}

impl DecoderContext {
  pub fn new() -> DecoderContext {
    DecoderContext::default()
  }

  fn with_running_status(self, running_status: u8) -> DecoderContext {
    DecoderContext {
      running_status,
      ..self
    }
  }

  fn with_port(self, port: Port) -> DecoderContext {
    DecoderContext { port, ..self }
  }
}

pub type Step = (Option<SequenceEvent>, DecoderContext);

/// Cursor over the payload of one `MTrk` chunk.
pub struct TrackDecoder<'a> {
  pos: usize,
  tick: TicksTime,
  data: &'a [u8],
}

impl<'a> TrackDecoder<'a> {
  pub fn new(data: &'a [u8]) -> TrackDecoder<'a> {
    TrackDecoder {
      pos: 0,
      tick: TicksTime::zero(),
      data,
    }
  }

  pub fn is_finished(&self) -> bool {
    self.pos >= self.data.len()
  }

  /// Decodes one delta-time plus event.
  ///
  /// Events that are consumed without effect come back as `None`; the returned
  /// context must be passed to the following step.
  pub fn step(&mut self, context: DecoderContext) -> Result<Step> {
    let delta = self.next_quantity()?;
    self.tick += delta;

    let start = self.pos;
    match self.peek()? {
      META_STATUS => self.decode_meta(start, context),
      SYSEX_STATUS => self.decode_sysex(context),
      _ => self.decode_channel(start, context),
    }
  }

  fn overrun(&self, offset: usize, required: usize) -> SmfError {
    SmfError::BufferOverrun {
      offset,
      required,
      available: self.data.len().saturating_sub(offset),
    }
  }

  fn peek(&self) -> Result<u8> {
    self
      .data
      .get(self.pos)
      .cloned()
      .ok_or_else(|| self.overrun(self.pos, 1))
  }

  fn take(&mut self, length: usize) -> Result<&'a [u8]> {
    let end = self.pos + length;
    if end > self.data.len() {
      return Err(self.overrun(self.pos, length));
    }
    let data = self.data;
    let bytes = &data[self.pos..end];
    self.pos = end;
    Ok(bytes)
  }

  fn next_byte(&mut self) -> Result<u8> {
    self.take(1).map(|bytes| bytes[0])
  }

  fn next_quantity(&mut self) -> Result<u32> {
    let (value, length) = vlq::decode(self.data, self.pos)?;
    self.pos += length;
    Ok(value)
  }

  fn event(&self, payload: Payload) -> SequenceEvent {
    SequenceEvent::new(self.tick, payload)
  }

  fn decode_meta(&mut self, start: usize, context: DecoderContext) -> Result<Step> {
    self.pos += 1;
    let meta_type = self.next_byte()?;

    let ignored = match meta_type {
      MetaEvent::SET_TEMPO | MetaEvent::PORT_SELECT | MetaEvent::END_OF_TRACK => None,
      _ => Some(
        MetaKind::from_type(meta_type).ok_or(SmfError::UnknownMetaEvent {
          meta_type,
          offset: start,
        })?,
      ),
    };

    let length = self.next_quantity()? as usize;
    let data_offset = self.pos;
    let data = self.take(length)?;

    let meta = match ignored {
      Some(kind) => MetaEvent::Ignored(kind),
      None => match meta_type {
        MetaEvent::SET_TEMPO => {
          if data.len() < TEMPO_DATA_SIZE {
            return Err(SmfError::BufferOverrun {
              offset: data_offset,
              required: TEMPO_DATA_SIZE,
              available: data.len(),
            });
          }
          let micros = (u32::from(data[0]) << 16) | (u32::from(data[1]) << 8) | u32::from(data[2]);
          MetaEvent::SetTempo(Tempo::new(micros))
        }
        MetaEvent::PORT_SELECT => {
          let port = *data.first().ok_or(SmfError::BufferOverrun {
            offset: data_offset,
            required: 1,
            available: 0,
          })?;
          MetaEvent::PortSelect(port)
        }
        _ => MetaEvent::EndOfTrack,
      },
    };

    trace!("{:?} at tick {:?}", meta, self.tick);

    let context = match meta {
      MetaEvent::PortSelect(port) => context.with_port(port),
      _ => context,
    };

    let event = if meta.is_retained() {
      Some(self.event(Payload::Meta(meta)))
    } else {
      None
    };

    Ok((event, context))
  }

  fn decode_sysex(&mut self, context: DecoderContext) -> Result<Step> {
    self.pos += 1;
    let length = self.next_quantity()? as usize;
    let data = self.take(length)?;

    let body = match data.split_last() {
      Some((&SYSEX_END, body)) => body,
      _ => data,
    };

    let mut bytes = Vec::with_capacity(body.len() + 2);
    bytes.push(SYSEX_STATUS);
    bytes.extend_from_slice(body);
    bytes.push(SYSEX_END);

    trace!("SysEx of {} bytes at tick {:?}", bytes.len(), self.tick);

    let message = SysExMessage {
      port: context.port,
      bytes,
    };
    Ok((Some(self.event(Payload::SysEx(message))), context))
  }

  fn decode_channel(&mut self, start: usize, context: DecoderContext) -> Result<Step> {
    let first = self.peek()?;
    let status = if first & STATUS_BIT != 0 {
      self.pos += 1;
      first
    } else if context.running_status == NO_STATUS {
      return Err(SmfError::UnterminatedRunningStatus { offset: start });
    } else {
      context.running_status
    };

    let kind = ChannelKind::from_status(status)
      .ok_or(SmfError::UnknownChannelMessage { status, offset: start })?;

    let data = self.take(kind.data_size())?;

    let mut bytes = Vec::with_capacity(1 + data.len());
    bytes.push(status);
    bytes.extend_from_slice(data);

    trace!("{:?} {:02X?} at tick {:?}", kind, bytes, self.tick);

    let message = ChannelMessage {
      port: context.port,
      bytes,
    };
    Ok((
      Some(self.event(Payload::Channel(message))),
      context.with_running_status(status),
    ))
  }
}

/// Decodes every event of one track, starting from a fresh context.
pub fn decode_track(data: &[u8]) -> Result<Vec<SequenceEvent>> {
  let mut decoder = TrackDecoder::new(data);
  let mut context = DecoderContext::new();
  let mut events = Vec::new();

  while !decoder.is_finished() {
    let (event, next_context) = decoder.step(context)?;
    events.extend(event);
    context = next_context;
  }

  Ok(events)
}
