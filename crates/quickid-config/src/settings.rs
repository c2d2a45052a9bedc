//! Validated settings

use crate::schema::{RawConfig, RawGenerator, RawTimebase};
use crate::validation::parse_wait_strategy;
use quickid_core::{QuickId, SharedTimebase, Timebase};
use quickid_util::{Result, WaitStrategy};

/// Validated configuration ready for building generators
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub timebase: TimebaseSettings,
    pub generators: Vec<GeneratorSettings>,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            timebase: TimebaseSettings::from_raw(&raw.timebase),
            generators: raw.generators.into_iter().map(GeneratorSettings::from_raw).collect(),
        }
    }

    /// Get generator by name
    pub fn generator(&self, name: &str) -> Option<&GeneratorSettings> {
        self.generators.iter().find(|g| g.name == name)
    }

    /// Build every generator on one timebase, in configuration order
    pub fn build_shared(&self) -> Result<(SharedTimebase, Vec<QuickId<SharedTimebase>>)> {
        let shared = SharedTimebase::from_timebase(self.timebase.build());
        let generators = self
            .generators
            .iter()
            .map(|g| {
                QuickId::with_shared_timebase(&shared, g.system_tag.as_str())
                    .with_initial_sequence(g.initial_sequence)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((shared, generators))
    }
}

/// Timebase configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimebaseSettings {
    pub wait: WaitStrategy,
    pub shared: bool,
}

impl TimebaseSettings {
    fn from_raw(raw: &RawTimebase) -> Self {
        Self {
            // Validation has already rejected bad values
            wait: parse_wait_strategy(raw.wait.as_deref(), raw.sleep_interval_micros)
                .unwrap_or_default(),
            shared: raw.shared,
        }
    }

    /// A fresh timebase on the system clock
    pub fn build(&self) -> Timebase {
        Timebase::new().with_wait_strategy(self.wait)
    }
}

/// Validated generator definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    pub name: String,
    pub system_tag: String,
    pub initial_sequence: u32,
}

impl GeneratorSettings {
    fn from_raw(raw: RawGenerator) -> Self {
        Self {
            name: raw.name,
            system_tag: raw.system_tag,
            initial_sequence: raw.initial_sequence.unwrap_or(0),
        }
    }

    /// Build this generator with its own timebase
    pub fn build(&self, timebase: &TimebaseSettings) -> Result<QuickId> {
        QuickId::with_timebase(timebase.build(), self.system_tag.as_str())
            .with_initial_sequence(self.initial_sequence)
    }
}
