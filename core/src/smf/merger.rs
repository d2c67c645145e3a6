use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::events::SequenceEvent;
use crate::time::TicksTime;

/// An event tagged with the index of the track it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEvent {
  pub track: usize,
  pub event: SequenceEvent,
}

/// Merges per-track sequences (each ascending by tick) into one ascending sequence.
///
/// Events sharing a tick come out in track order, and keep their relative
/// order within a track.
pub fn merge_tracks(tracks: Vec<Vec<SequenceEvent>>) -> Vec<MergedEvent> {
  let total = tracks.iter().map(Vec::len).sum();
  let mut merged = Vec::with_capacity(total);

  let mut cursors: Vec<_> = tracks
    .into_iter()
    .map(|track| track.into_iter().peekable())
    .collect();

  // One entry per non-exhausted track: the tick of its head event
  let mut heads: BinaryHeap<Reverse<(TicksTime, usize)>> = cursors
    .iter_mut()
    .enumerate()
    .filter_map(|(track, cursor)| cursor.peek().map(|event| Reverse((event.tick, track))))
    .collect();

  while let Some(Reverse((_tick, track))) = heads.pop() {
    let cursor = &mut cursors[track];
    if let Some(event) = cursor.next() {
      merged.push(MergedEvent { track, event });
    }
    if let Some(next) = cursor.peek() {
      heads.push(Reverse((next.tick, track)));
    }
  }

  merged
}
