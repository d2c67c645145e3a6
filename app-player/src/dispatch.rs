use std::thread;
use std::thread::JoinHandle;
use std::time::Instant;

use failure::Fail;
use log::{debug, info};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use uuid::Uuid;

use smf_player_core::output::{DispatchEvent, OutputSink, SinkResult};
use smf_player_core::time::ClockTime;

#[derive(Debug, Fail)]
pub enum DispatchError {
  #[fail(display = "Failed to create the MIDI dispatch thread: {}", cause)]
  Start { cause: String },

  #[fail(display = "Failed to open the MIDI output: {}", cause)]
  Open { cause: String },

  #[fail(display = "The MIDI dispatch thread is gone")]
  Disconnected,

  #[fail(display = "Failed to join the MIDI dispatch thread")]
  Stop,
}

pub type SessionId = Uuid;

pub struct Session {
  id: SessionId,
  start: Instant,
  events: Vec<DispatchEvent>,
}

pub enum Protocol {
  Play(Session),
  Stop,
  Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
  Started(SessionId),
  Finished(SessionId),
  Cancelled { id: SessionId, pending: usize },
}

struct Active {
  session: Session,
  next: usize,
}

impl Active {
  fn deadline(&self) -> Option<Instant> {
    self
      .session
      .events
      .get(self.next)
      .map(|event| self.session.start + event.time.to_duration())
  }

  fn pending(&self) -> usize {
    self.session.events.len() - self.next
  }
}

struct DispatchThread {
  sink: Box<dyn OutputSink>,
  active: Option<Active>,
  status_tx: Sender<Status>,
}

impl DispatchThread {
  fn new<F>(factory: F, status_tx: Sender<Status>) -> SinkResult<DispatchThread>
  where
    F: FnOnce() -> SinkResult<Box<dyn OutputSink>>,
  {
    let mut sink = factory()?;
    sink.open()?;
    info!(
      "MIDI output '{}' opened with {} ports",
      sink.name(),
      sink.port_count()
    );

    Ok(DispatchThread {
      sink,
      active: None,
      status_tx,
    })
  }

  fn handle_messages(&mut self, protocol_rx: Receiver<Protocol>) {
    info!("Handling MIDI dispatch messages ...");

    loop {
      let deadline = self.active.as_ref().and_then(Active::deadline);

      let message = match deadline {
        Some(deadline) => match protocol_rx.recv_deadline(deadline) {
          Ok(message) => Some(message),
          Err(RecvTimeoutError::Timeout) => None,
          Err(RecvTimeoutError::Disconnected) => break,
        },
        None => match protocol_rx.recv() {
          Ok(message) => Some(message),
          Err(_) => break,
        },
      };

      match message {
        None => self.send_due(),

        Some(Protocol::Play(session)) => {
          self.cancel();
          self.begin(session);
        }

        Some(Protocol::Stop) => self.cancel(),

        Some(Protocol::Shutdown) => {
          self.cancel();
          info!("MIDI dispatch thread stopped ...");
          break;
        }
      }
    }

    self.sink.close();
  }

  fn begin(&mut self, session: Session) {
    debug!(
      "Starting session {} with {} events",
      session.id,
      session.events.len()
    );
    drop(self.status_tx.send(Status::Started(session.id)));
    self.active = Some(Active { session, next: 0 });
    self.send_due();
  }

  fn send_due(&mut self) {
    let now = Instant::now();

    let finished = match self.active.as_mut() {
      Some(active) => {
        while let Some(event) = active.session.events.get(active.next) {
          if active.session.start + event.time.to_duration() > now {
            break;
          }
          self.sink.send(event.port, &event.bytes, event.time);
          active.next += 1;
        }
        active.pending() == 0
      }
      None => false,
    };

    if finished {
      if let Some(active) = self.active.take() {
        debug!("Session {} finished", active.session.id);
        drop(self.status_tx.send(Status::Finished(active.session.id)));
      }
    }
  }

  fn cancel(&mut self) {
    if let Some(active) = self.active.take() {
      let pending = active.pending();
      debug!(
        "Session {} cancelled with {} pending events",
        active.session.id, pending
      );
      drop(self.status_tx.send(Status::Cancelled {
        id: active.session.id,
        pending,
      }));
    }
  }
}

/// Cancels the current session from any thread.
#[derive(Clone)]
pub struct Stopper {
  protocol_tx: Sender<Protocol>,
}

impl Stopper {
  pub fn stop(&self) -> Result<(), DispatchError> {
    self
      .protocol_tx
      .send(Protocol::Stop)
      .map_err(|_| DispatchError::Disconnected)
  }
}

/// Owns the thread that delivers dispatch events to an output sink on time.
pub struct Dispatcher {
  handler: JoinHandle<()>,
  protocol_tx: Sender<Protocol>,
  status_rx: Receiver<Status>,
  lead_in: ClockTime,
}

impl Dispatcher {
  /// The sink is built and opened by `factory` inside the dispatch thread,
  /// so it does not need to be `Send`.
  pub fn start<F>(factory: F, lead_in: ClockTime) -> Result<Dispatcher, DispatchError>
  where
    F: FnOnce() -> SinkResult<Box<dyn OutputSink>> + Send + 'static,
  {
    info!("Spawning MIDI dispatch thread ...");

    let (protocol_tx, protocol_rx) = crossbeam_channel::unbounded::<Protocol>();
    let (status_tx, status_rx) = crossbeam_channel::unbounded::<Status>();
    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);

    let handler = thread::Builder::new()
      .name("midi-dispatch".into())
      .spawn(move || match DispatchThread::new(factory, status_tx) {
        Ok(mut dispatch_thread) => {
          drop(ready_tx.send(Ok(())));
          dispatch_thread.handle_messages(protocol_rx)
        }
        Err(err) => drop(ready_tx.send(Err(err.to_string()))),
      })
      .map_err(|err| DispatchError::Start {
        cause: err.to_string(),
      })?;

    match ready_rx.recv() {
      Ok(Ok(())) => Ok(Dispatcher {
        handler,
        protocol_tx,
        status_rx,
        lead_in,
      }),
      Ok(Err(cause)) => {
        drop(handler.join());
        Err(DispatchError::Open { cause })
      }
      Err(_) => {
        drop(handler.join());
        Err(DispatchError::Disconnected)
      }
    }
  }

  /// Replaces whatever is playing. The start instant is taken now.
  pub fn play(&self, events: Vec<DispatchEvent>) -> Result<SessionId, DispatchError> {
    let session = Session {
      id: Uuid::new_v4(),
      start: Instant::now() + self.lead_in.to_duration(),
      events,
    };
    let id = session.id;

    self
      .protocol_tx
      .send(Protocol::Play(session))
      .map_err(|_| DispatchError::Disconnected)
      .map(|()| id)
  }

  pub fn stopper(&self) -> Stopper {
    Stopper {
      protocol_tx: self.protocol_tx.clone(),
    }
  }

  #[allow(dead_code)]
  pub fn stop(&self) -> Result<(), DispatchError> {
    self.stopper().stop()
  }

  #[allow(dead_code)]
  pub fn status(&self) -> &Receiver<Status> {
    &self.status_rx
  }

  /// Blocks until the session finishes or is cancelled, skipping notifications
  /// about other sessions.
  pub fn wait(&self, id: SessionId) -> Result<Status, DispatchError> {
    loop {
      let status = self
        .status_rx
        .recv()
        .map_err(|_| DispatchError::Disconnected)?;

      match status {
        Status::Finished(session_id) if session_id == id => return Ok(status),
        Status::Cancelled { id: session_id, .. } if session_id == id => return Ok(status),
        _ => {}
      }
    }
  }

  pub fn shutdown(self) -> Result<(), DispatchError> {
    info!("Stopping MIDI dispatch thread ...");

    self
      .protocol_tx
      .send(Protocol::Shutdown)
      .map_err(|_| DispatchError::Stop)
      .and_then(|()| self.handler.join().map_err(|_| DispatchError::Stop))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::sync::{Arc, Mutex};

  use smf_player_core::output::SinkError;
  use smf_player_core::smf::Port;

  #[derive(Default)]
  struct Recording {
    sent: Vec<(Port, Vec<u8>, Instant)>,
    closed: bool,
  }

  struct RecordingSink {
    recording: Arc<Mutex<Recording>>,
  }

  impl OutputSink for RecordingSink {
    fn name(&self) -> &str {
      "recording"
    }

    fn port_count(&self) -> usize {
      4
    }

    fn open(&mut self) -> SinkResult<()> {
      Ok(())
    }

    fn close(&mut self) {
      self.recording.lock().unwrap().closed = true;
    }

    fn send(&mut self, port: Port, bytes: &[u8], _at: ClockTime) {
      self
        .recording
        .lock()
        .unwrap()
        .sent
        .push((port, bytes.to_vec(), Instant::now()));
    }
  }

  fn start(lead_in: ClockTime) -> (Dispatcher, Arc<Mutex<Recording>>) {
    let recording = Arc::new(Mutex::new(Recording::default()));
    let sink_recording = recording.clone();
    let dispatcher = Dispatcher::start(
      move || {
        Ok(Box::new(RecordingSink {
          recording: sink_recording,
        }) as Box<dyn OutputSink>)
      },
      lead_in,
    )
    .unwrap();
    (dispatcher, recording)
  }

  fn event(millis: f64, port: Port, note: u8) -> DispatchEvent {
    DispatchEvent::new(ClockTime::from_millis(millis), port, vec![0x90, note, 0x64])
  }

  fn sent_bytes(recording: &Arc<Mutex<Recording>>) -> Vec<Vec<u8>> {
    recording
      .lock()
      .unwrap()
      .sent
      .iter()
      .map(|(_, bytes, _)| bytes.clone())
      .collect()
  }

  fn sent_instants(recording: &Arc<Mutex<Recording>>) -> Vec<Instant> {
    recording
      .lock()
      .unwrap()
      .sent
      .iter()
      .map(|(_, _, at)| *at)
      .collect()
  }

  #[test]
  fn delivers_in_order_and_finishes() {
    let (dispatcher, recording) = start(ClockTime::zero());

    let id = dispatcher
      .play(vec![event(0.0, 0, 60), event(10.0, 1, 62), event(20.0, 0, 64)])
      .unwrap();

    assert_eq!(dispatcher.wait(id).unwrap(), Status::Finished(id));
    assert_eq!(
      sent_bytes(&recording),
      vec![vec![0x90, 60, 0x64], vec![0x90, 62, 0x64], vec![0x90, 64, 0x64]]
    );
    let ports: Vec<Port> = recording
      .lock()
      .unwrap()
      .sent
      .iter()
      .map(|(port, _, _)| *port)
      .collect();
    assert_eq!(ports, vec![0, 1, 0]);

    dispatcher.shutdown().unwrap();
  }

  #[test]
  fn empty_session_finishes_immediately() {
    let (dispatcher, recording) = start(ClockTime::zero());

    let id = dispatcher.play(vec![]).unwrap();
    assert_eq!(dispatcher.wait(id).unwrap(), Status::Finished(id));
    assert!(sent_bytes(&recording).is_empty());

    dispatcher.shutdown().unwrap();
  }

  #[test]
  fn waits_for_event_time() {
    let (dispatcher, recording) = start(ClockTime::zero());

    let before = Instant::now();
    let id = dispatcher
      .play(vec![event(0.0, 0, 60), event(60.0, 0, 62)])
      .unwrap();
    dispatcher.wait(id).unwrap();

    let sent = sent_instants(&recording);
    assert_eq!(sent.len(), 2);
    assert!(sent[1].duration_since(before).as_millis() >= 60);

    dispatcher.shutdown().unwrap();
  }

  #[test]
  fn lead_in_delays_start() {
    let (dispatcher, recording) = start(ClockTime::from_millis(50.0));

    let before = Instant::now();
    let id = dispatcher.play(vec![event(0.0, 0, 60)]).unwrap();
    dispatcher.wait(id).unwrap();

    let sent = sent_instants(&recording);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].duration_since(before).as_millis() >= 50);

    dispatcher.shutdown().unwrap();
  }

  #[test]
  fn stop_cancels_pending_events() {
    let (dispatcher, recording) = start(ClockTime::zero());

    let id = dispatcher
      .play(vec![event(0.0, 0, 60), event(5000.0, 0, 62)])
      .unwrap();
    dispatcher.stop().unwrap();

    assert_eq!(
      dispatcher.wait(id).unwrap(),
      Status::Cancelled { id, pending: 1 }
    );
    assert_eq!(sent_bytes(&recording), vec![vec![0x90, 60, 0x64]]);

    dispatcher.shutdown().unwrap();
    assert_eq!(sent_bytes(&recording).len(), 1);
  }

  #[test]
  fn stopper_cancels_from_another_thread() {
    let (dispatcher, recording) = start(ClockTime::zero());

    let id = dispatcher
      .play(vec![event(0.0, 0, 60), event(5000.0, 0, 62), event(5001.0, 0, 64)])
      .unwrap();
    let stopper = dispatcher.stopper();
    std::thread::spawn(move || stopper.stop().unwrap())
      .join()
      .unwrap();

    assert_eq!(
      dispatcher.wait(id).unwrap(),
      Status::Cancelled { id, pending: 2 }
    );
    assert_eq!(sent_bytes(&recording), vec![vec![0x90, 60, 0x64]]);

    dispatcher.shutdown().unwrap();
  }

  #[test]
  fn play_replaces_current_session() {
    let (dispatcher, recording) = start(ClockTime::zero());

    let old_id = dispatcher
      .play(vec![event(5000.0, 0, 40), event(5001.0, 0, 41)])
      .unwrap();
    let new_id = dispatcher.play(vec![event(0.0, 2, 72)]).unwrap();

    let mut statuses = Vec::new();
    loop {
      let status = dispatcher.status().recv().unwrap();
      let done = status == Status::Finished(new_id);
      statuses.push(status);
      if done {
        break;
      }
    }

    assert_eq!(
      statuses,
      vec![
        Status::Started(old_id),
        Status::Cancelled {
          id: old_id,
          pending: 2
        },
        Status::Started(new_id),
        Status::Finished(new_id),
      ]
    );
    assert_eq!(sent_bytes(&recording), vec![vec![0x90, 72, 0x64]]);

    dispatcher.shutdown().unwrap();
  }

  #[test]
  fn open_failure_is_reported() {
    let result = Dispatcher::start(
      || {
        Err(SinkError::Open {
          cause: "no device".to_string(),
        })
      },
      ClockTime::zero(),
    );

    match result {
      Err(DispatchError::Open { cause }) => assert!(cause.contains("no device")),
      Err(err) => panic!("unexpected error {}", err),
      Ok(_) => panic!("dispatcher should not start"),
    }
  }

  #[test]
  fn shutdown_closes_sink() {
    let (dispatcher, recording) = start(ClockTime::zero());

    dispatcher.play(vec![event(5000.0, 0, 60)]).unwrap();
    dispatcher.shutdown().unwrap();

    let recording = recording.lock().unwrap();
    assert!(recording.closed);
    assert!(recording.sent.is_empty());
  }
}
