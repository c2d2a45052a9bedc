//! Config validation CLI tool
//!
//! Validates a quickid configuration file and reports any errors.

use quickid_core::base32::MIN_ID_LEN;
use quickid_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a quickid configuration file.");
            eprintln!();
            eprintln!("Default location: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config quickid.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match quickid_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", quickid_config::CURRENT_CONFIG_VERSION);
            println!("  Wait strategy: {}", settings.timebase.wait.name());
            println!("  Shared timebase: {}", settings.timebase.shared);
            println!("  Generators: {}", settings.generators.len());

            if !settings.generators.is_empty() {
                println!();
                println!("Generators:");
                for generator in &settings.generators {
                    println!(
                        "  - {} [tag {:?}, {}-byte IDs]: starts after sequence {}",
                        generator.name,
                        generator.system_tag,
                        MIN_ID_LEN + generator.system_tag.len(),
                        generator.initial_sequence
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                quickid_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                quickid_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                quickid_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                quickid_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        quickid_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
