use failure::Error;

use serde_derive::Deserialize;

use std::fs::File;
use std::io::Read;

use crate::time::ClockTime;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Playback {
  /// Number of addressable output ports (A, B, C, D, ...)
  pub port_count: usize,
  /// Delay between starting playback and the time of the first tick
  pub lead_in_ms: f64,
}

impl Default for Playback {
  fn default() -> Playback {
    Playback {
      port_count: 4,
      lead_in_ms: 0.0,
    }
  }
}

impl Playback {
  pub fn lead_in(&self) -> ClockTime {
    ClockTime::from_millis(self.lead_in_ms.max(0.0))
  }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
  pub playback: Playback,
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

  pub fn from_str<'a, T>(content: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let config: Config = toml::from_str(content.into())?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let config = Config::from_str("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.playback.port_count, 4);
    assert_eq!(config.playback.lead_in(), ClockTime::zero());
  }

  #[test]
  fn playback_section() {
    let config = Config::from_str("[playback]\nport_count = 2\nlead_in_ms = 150.0\n").unwrap();
    assert_eq!(config.playback.port_count, 2);
    assert_eq!(config.playback.lead_in(), ClockTime::from_millis(150.0));
  }

  #[test]
  fn negative_lead_in_is_ignored() {
    let config = Config::from_str("[playback]\nlead_in_ms = -20.0\n").unwrap();
    assert_eq!(config.playback.lead_in(), ClockTime::zero());
  }

  #[test]
  fn invalid_toml() {
    assert!(Config::from_str("[playback\n").is_err());
  }
}
