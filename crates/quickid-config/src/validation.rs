//! Configuration validation

use crate::schema::{RawConfig, RawGenerator, RawTimebase};
use quickid_core::base32::SEQ_LIMIT;
use quickid_util::WaitStrategy;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Default sleep between clock reads for `wait = "sleep"`
pub const DEFAULT_SLEEP_INTERVAL_MICROS: u64 = 100;

/// Longest sleep between clock reads; a wait must resolve within a millisecond
pub const MAX_SLEEP_INTERVAL_MICROS: u64 = 1_000;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Generator '{name}': {message}")]
    GeneratorError { name: String, message: String },

    #[error("Duplicate generator name: {0}")]
    DuplicateGeneratorName(String),

    #[error("Generators '{first}' and '{second}' share system tag '{tag}'")]
    DuplicateSystemTag {
        tag: String,
        first: String,
        second: String,
    },

    #[error("Unknown wait strategy '{0}' (expected spin, yield, or sleep)")]
    InvalidWaitStrategy(String),

    #[error("Sleep interval {0}us must be between 1 and 1000")]
    InvalidSleepInterval(u64),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_timebase(&config.timebase));

    let mut seen_names = HashSet::new();
    for generator in &config.generators {
        if !seen_names.insert(&generator.name) {
            errors.push(ValidationError::DuplicateGeneratorName(generator.name.clone()));
        }
    }

    // Two generators on one tag can mint the same ID
    let mut seen_tags: HashMap<&str, &str> = HashMap::new();
    for generator in &config.generators {
        if let Some(first) = seen_tags.insert(&generator.system_tag, &generator.name) {
            errors.push(ValidationError::DuplicateSystemTag {
                tag: generator.system_tag.clone(),
                first: first.to_string(),
                second: generator.name.clone(),
            });
        }
    }

    for generator in &config.generators {
        errors.extend(validate_generator(generator));
    }

    errors
}

fn validate_timebase(timebase: &RawTimebase) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(e) = parse_wait_strategy(timebase.wait.as_deref(), timebase.sleep_interval_micros) {
        errors.push(e);
    }

    errors
}

fn validate_generator(generator: &RawGenerator) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if generator.name.trim().is_empty() {
        errors.push(ValidationError::GeneratorError {
            name: generator.name.clone(),
            message: "name cannot be empty".into(),
        });
    }

    if generator.system_tag.chars().any(char::is_control) {
        errors.push(ValidationError::GeneratorError {
            name: generator.name.clone(),
            message: "system_tag cannot contain control characters".into(),
        });
    }

    if let Some(seq) = generator.initial_sequence
        && seq >= SEQ_LIMIT
    {
        errors.push(ValidationError::GeneratorError {
            name: generator.name.clone(),
            message: format!("initial_sequence {} must be below {}", seq, SEQ_LIMIT),
        });
    }

    errors
}

/// Parse a wait strategy name and its sleep interval
pub fn parse_wait_strategy(
    wait: Option<&str>,
    sleep_interval_micros: Option<u64>,
) -> Result<WaitStrategy, ValidationError> {
    match wait.map(|w| w.trim().to_lowercase()).as_deref() {
        None | Some("spin") => Ok(WaitStrategy::Spin),
        Some("yield") => Ok(WaitStrategy::Yield),
        Some("sleep") => {
            let interval = sleep_interval_micros.unwrap_or(DEFAULT_SLEEP_INTERVAL_MICROS);
            if interval == 0 || interval > MAX_SLEEP_INTERVAL_MICROS {
                return Err(ValidationError::InvalidSleepInterval(interval));
            }
            Ok(WaitStrategy::Sleep {
                interval_micros: interval,
            })
        }
        Some(_) => Err(ValidationError::InvalidWaitStrategy(
            wait.unwrap_or_default().to_string(),
        )),
    }
}
