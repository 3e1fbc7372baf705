// src/bin/confcheck.rs
//
// Configuration checker binary.
//
// This binary supports four subcommands:
// - check <CONFIG_PATH>: Load and validate a config document
// - dump <CONFIG_PATH> [--json]: Print the normalized record
// - fingerprint <CONFIG_PATH>: Print the record's SHA-256 fingerprint
// - keys: List the document key tables and known model types
//
// Usage:
//   cargo run --bin confcheck -- check configs/stdim_baseline.yaml
//   cargo run --bin confcheck -- dump configs/stdim_baseline.yaml --json
//   cargo run --bin confcheck -- fingerprint configs/stdim_baseline.yaml
//   cargo run --bin confcheck -- keys

use std::env;
use std::path::PathBuf;

use drivenc::output::config_fingerprint;
use drivenc::schema::print_keys;
use drivenc::TrainingConfig;

// =============================================================================
// Command-line argument parsing
// =============================================================================

#[derive(Debug)]
enum Command {
    Check(PathBuf),
    Dump { config_path: PathBuf, json: bool },
    Fingerprint(PathBuf),
    Keys,
}

fn usage() -> &'static str {
    "\
confcheck - Training configuration checker

USAGE:
  confcheck check <CONFIG_PATH>
  confcheck dump <CONFIG_PATH> [--json]
  confcheck fingerprint <CONFIG_PATH>
  confcheck keys

SUBCOMMANDS:
  check        Load and validate a config document
  dump         Print the normalized record (YAML, or JSON with --json)
  fingerprint  Print the record's SHA-256 fingerprint
  keys         List required/optional document keys and known model types

COMMON OPTIONS:
  --help       Show this help

EXAMPLES:
  confcheck check configs/stdim_baseline.yaml
  confcheck dump configs/stdim_baseline.yaml --json
  confcheck fingerprint configs/stdim_baseline.yaml
  confcheck keys
"
}

fn parse_args() -> Result<Command, String> {
    let mut args = env::args().skip(1);

    let subcommand = args
        .next()
        .ok_or_else(|| "Missing subcommand".to_string())?;

    match subcommand.as_str() {
        "--help" | "-h" => {
            println!("{}", usage());
            std::process::exit(0);
        }
        "check" => {
            let path = parse_config_path(&mut args)?;
            Ok(Command::Check(path))
        }
        "dump" => {
            let mut config_path: Option<PathBuf> = None;
            let mut json = false;

            for arg in args.by_ref() {
                match arg.as_str() {
                    "--help" | "-h" => {
                        println!("{}", usage());
                        std::process::exit(0);
                    }
                    "--json" => {
                        json = true;
                    }
                    _ if arg.starts_with('-') => {
                        return Err(format!("Unknown option: {}", arg));
                    }
                    _ => {
                        if config_path.is_some() {
                            return Err("Multiple config paths provided".to_string());
                        }
                        config_path = Some(PathBuf::from(arg));
                    }
                }
            }

            let config_path =
                config_path.ok_or_else(|| "Missing required argument: <CONFIG_PATH>".to_string())?;
            Ok(Command::Dump { config_path, json })
        }
        "fingerprint" => {
            let path = parse_config_path(&mut args)?;
            Ok(Command::Fingerprint(path))
        }
        "keys" => {
            if let Some(arg) = args.next() {
                return Err(format!("Unexpected argument: {}", arg));
            }
            Ok(Command::Keys)
        }
        other => Err(format!("Unknown subcommand: {}", other)),
    }
}

/// Parse the single <CONFIG_PATH> argument shared by check/fingerprint.
fn parse_config_path(args: &mut impl Iterator<Item = String>) -> Result<PathBuf, String> {
    let mut config_path: Option<PathBuf> = None;

    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config_path.is_some() {
                    return Err("Multiple config paths provided".to_string());
                }
                config_path = Some(PathBuf::from(arg));
            }
        }
    }

    config_path.ok_or_else(|| "Missing required argument: <CONFIG_PATH>".to_string())
}

// =============================================================================
// Subcommands
// =============================================================================

fn cmd_check(path: PathBuf) -> i32 {
    match TrainingConfig::from_yaml_file(&path) {
        Ok(config) => {
            println!(
                "OK: {} ({} keys checked, model={}, {} checkpoint(s))",
                path.display(),
                drivenc::REQUIRED_KEYS.len() + drivenc::OPTIONAL_KEYS.len(),
                config.encoder_model_type,
                config.save_schedule.len()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_dump(path: PathBuf, json: bool) -> i32 {
    let config = match TrainingConfig::from_yaml_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rendered = if json {
        serde_json::to_string_pretty(&config).map_err(|e| e.to_string())
    } else {
        config.to_yaml_string().map_err(|e| e.to_string())
    };

    match rendered {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: could not serialize config: {}", e);
            1
        }
    }
}

fn cmd_fingerprint(path: PathBuf) -> i32 {
    let config = match TrainingConfig::from_yaml_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match config_fingerprint(&config) {
        Ok(fp) => {
            println!("{}", fp);
            0
        }
        Err(e) => {
            eprintln!("Error: could not fingerprint config: {}", e);
            1
        }
    }
}

fn cmd_keys() -> i32 {
    print_keys();
    0
}

// =============================================================================
// Main
// =============================================================================

fn main() {
    let cmd = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, usage());
            std::process::exit(2);
        }
    };

    let exit_code = match cmd {
        Command::Check(path) => cmd_check(path),
        Command::Dump { config_path, json } => cmd_dump(config_path, json),
        Command::Fingerprint(path) => cmd_fingerprint(path),
        Command::Keys => cmd_keys(),
    };

    std::process::exit(exit_code);
}
