use failure;
use failure::Error;

use serde_derive::Deserialize;

use std::fs::File;
use std::io::Read;

use smf_player_core::config::Playback;

use crate::sinks::LOG_ID;

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
  pub playback: Playback,
  pub output: Output,
}

impl Config {
  pub fn from_file<'a, T>(path: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let mut content = String::new();
    let path_str = path.into();
    let mut file = File::open(path_str)?;
    file.read_to_string(&mut content)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
  }

  #[allow(dead_code)]
  pub fn from_str<'a, T>(content: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let config: Config = toml::from_str(content.into())?;
    Ok(config)
  }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Output {
  /// Output driver id (`log`, `portmidi`)
  pub driver: String,
  /// Device name for each port index; an empty name leaves the port unassigned
  pub ports: Vec<String>,
}

impl Default for Output {
  fn default() -> Output {
    Output {
      driver: LOG_ID.to_string(),
      ports: Vec::new(),
    }
  }
}

impl Output {
  pub fn device_name(&self, port: usize) -> Option<&str> {
    self
      .ports
      .get(port)
      .map(String::as_str)
      .filter(|name| !name.is_empty())
  }
}
