use log::debug;

use super::{Result, SmfError};
use crate::time::TimeBase;

pub const HEADER_SIGNATURE: &[u8; 4] = b"MThd";
pub const TRACK_SIGNATURE: &[u8; 4] = b"MTrk";

const HEADER_LENGTH: u32 = 6;
const CHUNK_PREFIX_LENGTH: usize = 8;
const HEADER_CHUNK_LENGTH: usize = CHUNK_PREFIX_LENGTH + HEADER_LENGTH as usize;

const SMPTE_DIVISION: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  SingleTrack,
  MultiTrack,
}

impl Format {
  fn from_u16(value: u16) -> Option<Format> {
    match value {
      0 => Some(Format::SingleTrack),
      1 => Some(Format::MultiTrack),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  pub format: Format,
  pub track_count: u16,
  pub time_base: TimeBase,
}

/// Header fields plus the payload of every `MTrk` chunk, borrowed from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile<'a> {
  pub header: Header,
  pub tracks: Vec<&'a [u8]>,
}

fn read_u16(data: &[u8], pos: usize) -> u16 {
  u16::from_be_bytes([data[pos], data[pos + 1]])
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
  u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn header_error<T: Into<String>>(cause: T) -> SmfError {
  SmfError::Header {
    cause: cause.into(),
  }
}

impl<'a> RawFile<'a> {
  pub fn parse(data: &'a [u8]) -> Result<RawFile<'a>> {
    let header = Self::parse_header(data)?;
    debug!(
      "Header: format={:?} tracks={} time_base={}",
      header.format, header.track_count, header.time_base
    );

    let mut tracks = Vec::with_capacity(usize::from(header.track_count));
    let mut pos = HEADER_CHUNK_LENGTH;

    for _ in 0..header.track_count {
      let available = data.len() - pos;
      if available < CHUNK_PREFIX_LENGTH {
        return Err(SmfError::BufferOverrun {
          offset: pos,
          required: CHUNK_PREFIX_LENGTH,
          available,
        });
      }
      if &data[pos..pos + 4] != TRACK_SIGNATURE {
        return Err(SmfError::TrackSignature { offset: pos });
      }

      let length = read_u32(data, pos + 4) as usize;
      let start = pos + CHUNK_PREFIX_LENGTH;
      let available = data.len() - start;
      if length > available {
        return Err(SmfError::BufferOverrun {
          offset: start,
          required: length,
          available,
        });
      }

      tracks.push(&data[start..start + length]);
      pos = start + length;
    }

    Ok(RawFile { header, tracks })
  }

  fn parse_header(data: &[u8]) -> Result<Header> {
    if data.len() < HEADER_CHUNK_LENGTH {
      return Err(header_error(format!(
        "expected at least {} bytes, found {}",
        HEADER_CHUNK_LENGTH,
        data.len()
      )));
    }

    if &data[0..4] != HEADER_SIGNATURE {
      return Err(header_error("missing MThd signature"));
    }

    let length = read_u32(data, 4);
    if length != HEADER_LENGTH {
      return Err(header_error(format!(
        "header length is {}, expected {}",
        length, HEADER_LENGTH
      )));
    }

    let format_value = read_u16(data, 8);
    let format = Format::from_u16(format_value)
      .ok_or_else(|| header_error(format!("unsupported format {}", format_value)))?;

    let track_count = read_u16(data, 10);

    let time_base = read_u16(data, 12);
    if time_base & SMPTE_DIVISION != 0 {
      return Err(header_error("unsupported division (SMPTE timing)"));
    }
    if time_base == 0 {
      return Err(header_error("time base is zero"));
    }

    Ok(Header {
      format,
      track_count,
      time_base,
    })
  }
}
