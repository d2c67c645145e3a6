use log::{debug, info, warn};

use std::rc::Rc;

use portmidi::{DeviceInfo, MidiEvent, MidiMessage, OutputPort, PortMidi};

use smf_player_core::output::{OutputSink, SinkError, SinkResult};
use smf_player_core::smf::events::SYSEX_STATUS;
use smf_player_core::smf::Port;
use smf_player_core::time::ClockTime;

use crate::config::Output as OutputConfig;

use super::port_label;

pub const ID: &str = "portmidi";

const MIDI_BUF_LEN: usize = 8 * 1024;

/// Hardware output. Port N is the device named by the N-th entry of the output config.
pub struct PortMidiSink {
  context: Rc<PortMidi>,
  device_names: Vec<Option<String>>,
  ports: Vec<Option<OutputPort>>,
}

impl PortMidiSink {
  pub fn new(config: &OutputConfig, port_count: usize) -> SinkResult<PortMidiSink> {
    let context = PortMidi::new().map_err(|err| SinkError::Init {
      cause: format!("{:?}", err),
    })?;

    let device_names = (0..port_count)
      .map(|port| config.device_name(port).map(str::to_string))
      .collect();

    Ok(PortMidiSink {
      context: Rc::new(context),
      device_names,
      ports: Vec::new(),
    })
  }

  fn open_device(&self, outputs: &[DeviceInfo], name: &str) -> SinkResult<OutputPort> {
    let device = outputs
      .iter()
      .find(|device| device.name() == name)
      .ok_or_else(|| SinkError::Open {
        cause: format!("Device not found: {:?}", name),
      })?;

    self
      .context
      .output_port(device.clone(), MIDI_BUF_LEN)
      .map_err(|err| SinkError::Open {
        cause: format!("Device={:?}, Error={:?}", name, err),
      })
  }
}

impl OutputSink for PortMidiSink {
  fn name(&self) -> &str {
    ID
  }

  fn port_count(&self) -> usize {
    self.device_names.len()
  }

  fn open(&mut self) -> SinkResult<()> {
    let outputs: Vec<DeviceInfo> = self
      .context
      .devices()
      .map_err(|err| SinkError::Init {
        cause: format!("{:?}", err),
      })?
      .into_iter()
      .filter(DeviceInfo::is_output)
      .collect();

    debug!("Output devices:");
    for device in outputs.iter() {
      debug!("=> {:?}", device.name());
    }

    let mut ports = Vec::with_capacity(self.device_names.len());
    for (port, device_name) in self.device_names.iter().enumerate() {
      let output = match device_name {
        Some(name) => match self.open_device(&outputs, name) {
          Ok(output) => {
            info!("Port {} -> {}", port_label(port as Port), name);
            Some(output)
          }
          Err(err) => {
            warn!("Port {} will be silent: {}", port_label(port as Port), err);
            None
          }
        },
        None => None,
      };
      ports.push(output);
    }
    self.ports = ports;

    Ok(())
  }

  fn close(&mut self) {
    self.ports.clear();
  }

  fn send(&mut self, port: Port, bytes: &[u8], _at: ClockTime) {
    let output = match self.ports.get_mut(usize::from(port)) {
      Some(Some(output)) => output,
      _ => return,
    };

    let result = if bytes.first() == Some(&SYSEX_STATUS) {
      output.write_sysex(0, bytes)
    } else {
      let message = MidiMessage {
        status: bytes.get(0).cloned().unwrap_or(0),
        data1: bytes.get(1).cloned().unwrap_or(0),
        data2: bytes.get(2).cloned().unwrap_or(0),
      };
      output.write_event(MidiEvent {
        message,
        timestamp: 0,
      })
    };

    if let Err(err) = result {
      warn!("Failed to send to port {}: {:?}", port_label(port), err);
    }
  }
}
