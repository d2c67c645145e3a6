use std::io::BufRead;
use std::path::Path;
use std::thread;

use log::{debug, info, warn, LevelFilter};

use failure;
use failure::{Error, Fail};

use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

use smf_player_core::performance::Performance;

mod config;
use crate::config::Config;

mod dispatch;
use crate::dispatch::{Dispatcher, Status, Stopper};

mod sinks;
use crate::sinks::{index_label, Sinks};

const SMF_PLAYER_CONFIG: &str = "SMF_PLAYER_CONFIG";
const DEFAULT_SMF_PLAYER_CONFIG: &str = "player.toml";

const SMF_PLAYER_LOG_CONFIG: &str = "SMF_PLAYER_LOG_CONFIG";
const DEFAULT_SMF_PLAYER_LOG_CONFIG: &str = "log4rs.yaml";

const DEFAULT_LOG_PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l:<5})} [{T}] {m}{n}";

#[derive(Debug, Fail)]
enum MainError {
  #[fail(display = "Failed to init logging: {}", cause)]
  LoggingInit { cause: String },

  #[fail(display = "Usage: smf-player <file.mid>")]
  Usage,
}

fn main() -> Result<(), Error> {
  init_logging()?;

  let path = std::env::args().nth(1).ok_or(MainError::Usage)?;

  let config = init_config()?;

  let performance = Performance::from_file(path.as_str())?;
  info!(
    "{}: format {:?}, {} tracks, {} ticks per quarter, {} events, {:.3} s",
    path,
    performance.format(),
    performance.track_count(),
    performance.time_base(),
    performance.len(),
    performance.duration().to_seconds()
  );
  for anchor in performance.tempo_map().iter().skip(1) {
    debug!(
      "Tempo {:.2} bpm at tick {} ({:.3} ms)",
      anchor.tempo.bpm(),
      anchor.tick.ticks(),
      anchor.elapsed.millis()
    );
  }

  let port_count = config.playback.port_count;
  if let Some(max_port) = performance.max_port() {
    if usize::from(max_port) >= port_count {
      warn!(
        "Events addressed to port {} and beyond will be dropped, only {} ports are configured",
        index_label(port_count),
        port_count
      );
    }
  }

  let output = config.output.clone();
  let dispatcher = Dispatcher::start(
    move || Sinks::new().create(&output, port_count),
    config.playback.lead_in(),
  )?;

  let id = dispatcher.play(performance.into_events())?;
  watch_stdin(dispatcher.stopper());
  match dispatcher.wait(id)? {
    Status::Cancelled { pending, .. } => warn!("Playback cancelled with {} pending events", pending),
    status => debug!("{:?}", status),
  }

  dispatcher.shutdown()?;

  Ok(())
}

/// Pressing Enter stops playback. A closed stdin leaves it running to the end.
fn watch_stdin(stopper: Stopper) {
  let spawned = thread::Builder::new()
    .name("stdin-stop".into())
    .spawn(move || {
      let mut line = String::new();
      let stdin = std::io::stdin();
      if let Ok(read) = stdin.lock().read_line(&mut line) {
        if read > 0 {
          info!("Stopping playback ...");
          drop(stopper.stop());
        }
      }
    });

  if let Err(err) = spawned {
    warn!("Playback can not be stopped from the keyboard: {}", err);
  }
}

fn init_logging() -> Result<(), Error> {
  let log_config_path = std::env::var(SMF_PLAYER_LOG_CONFIG)
    .unwrap_or_else(|_| DEFAULT_SMF_PLAYER_LOG_CONFIG.to_string());

  if Path::new(log_config_path.as_str()).exists() {
    log4rs::init_file(log_config_path.as_str(), Default::default()).map_err(|err| {
      MainError::LoggingInit {
        cause: err.to_string(),
      }
    })?;
  } else {
    let stdout = ConsoleAppender::builder()
      .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
      .build();

    let log_config = LogConfig::builder()
      .appender(Appender::builder().build("stdout", Box::new(stdout)))
      .build(Root::builder().appender("stdout").build(LevelFilter::Info))
      .map_err(|err| MainError::LoggingInit {
        cause: err.to_string(),
      })?;

    log4rs::init_config(log_config).map_err(|err| MainError::LoggingInit {
      cause: err.to_string(),
    })?;
  }

  Ok(())
}

fn init_config() -> Result<Config, Error> {
  let config_path =
    std::env::var(SMF_PLAYER_CONFIG).unwrap_or_else(|_| DEFAULT_SMF_PLAYER_CONFIG.to_string());

  let config = if Path::new(config_path.as_str()).exists() {
    info!("Loading player configuration from {} ...", config_path);
    Config::from_file(config_path.as_str())?
  } else {
    warn!("{} not found, using the default configuration", config_path);
    Config::default()
  };
  debug!("{:#?}", config);

  Ok(config)
}
