#[cfg(feature = "portmidi")]
mod portmidi;

mod logger;
pub use self::logger::{LogSink, ID as LOG_ID};

use std::collections::HashMap;
use std::convert::TryFrom;

use smf_player_core::output::{OutputSink, SinkError, SinkResult};
use smf_player_core::smf::Port;

use crate::config::Output as OutputConfig;

type SinkFactory = Box<dyn Fn(&OutputConfig, usize) -> SinkResult<Box<dyn OutputSink>>>;

/// Output drivers available in this build, by id.
pub struct Sinks {
  factories: HashMap<String, SinkFactory>,
}

impl Sinks {
  pub fn new() -> Sinks {
    let mut factories: HashMap<String, SinkFactory> = HashMap::new();

    Self::add_common_sinks(&mut factories);

    Self::add_hardware_sinks(&mut factories);

    Sinks { factories }
  }

  fn add_common_sinks(factories: &mut HashMap<String, SinkFactory>) {
    let log_factory: SinkFactory = Box::new(|_config: &OutputConfig, port_count: usize| {
      Ok(Box::new(LogSink::new(port_count)) as Box<dyn OutputSink>)
    });
    factories.insert(LOG_ID.to_string(), log_factory);
  }

  #[cfg(feature = "portmidi")]
  fn add_hardware_sinks(factories: &mut HashMap<String, SinkFactory>) {
    let portmidi_factory: SinkFactory = Box::new(|config: &OutputConfig, port_count: usize| {
      self::portmidi::PortMidiSink::new(config, port_count)
        .map(|sink| Box::new(sink) as Box<dyn OutputSink>)
    });
    factories.insert(self::portmidi::ID.to_string(), portmidi_factory);
  }

  #[cfg(not(feature = "portmidi"))]
  fn add_hardware_sinks(_factories: &mut HashMap<String, SinkFactory>) {}

  #[allow(dead_code)]
  pub fn ids(&self) -> Vec<&String> {
    let mut ids: Vec<&String> = self.factories.keys().collect();
    ids.sort();
    ids
  }

  pub fn create(&self, config: &OutputConfig, port_count: usize) -> SinkResult<Box<dyn OutputSink>> {
    self
      .factories
      .get(&config.driver)
      .map(|factory| factory(config, port_count))
      .unwrap_or_else(|| {
        Err(SinkError::DriverNotFound {
          id: config.driver.clone(),
        })
      })
  }
}

/// Ports are labelled A, B, C, ... the way they are presented to the user.
pub fn port_label(port: Port) -> String {
  index_label(usize::from(port))
}

/// Label of a port index that may lie past the addressable range.
pub fn index_label(index: usize) -> String {
  match u8::try_from(index) {
    Ok(port) if port < 26 => char::from(b'A' + port).to_string(),
    _ => format!("#{}", index),
  }
}
