//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Timebase settings shared by every generator
    #[serde(default)]
    pub timebase: RawTimebase,

    /// Named generators
    #[serde(default)]
    pub generators: Vec<RawGenerator>,
}

/// Timebase settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTimebase {
    /// Wait strategy: "spin", "yield", or "sleep" (default: spin)
    pub wait: Option<String>,

    /// Sleep between clock reads when `wait = "sleep"` (default: 100)
    pub sleep_interval_micros: Option<u64>,

    /// Run every generator on one shared timebase
    #[serde(default)]
    pub shared: bool,
}

/// Raw generator definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawGenerator {
    /// Unique name used to select the generator
    pub name: String,

    /// Tag embedded verbatim in every ID
    pub system_tag: String,

    /// Counter value to resume from
    pub initial_sequence: Option<u32>,
}
