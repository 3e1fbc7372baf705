// src/main.rs
//
// CLI entrypoint for the drivenc configuration layer.
//
// Constraints:
// - Config path precedence:
//     --config overrides env;
//     if missing use DRIVENC_CONFIG (default baseline path).
// - Print concise run header (source document, fingerprint, key knobs).
// - Optional provenance dump (--dump-resolved DIR) writes the
//   normalized document plus load_info.json.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use drivenc::output::{self, LoadInfo};
use drivenc::resolve::resolve_config_path;
use drivenc::TrainingConfig;

#[derive(Debug, Parser)]
#[command(
    name = "drivenc",
    about = "Training configuration loader for the drivenc perception-encoder harness",
    version
)]
struct Args {
    /// Config document path (optional).
    /// If omitted, uses DRIVENC_CONFIG (default: configs/stdim_baseline.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write config_resolved.yaml and load_info.json under DIR/<dataset>/<fp[..8]>/.
    #[arg(long, value_name = "DIR")]
    dump_resolved: Option<PathBuf>,

    /// Verbosity: -v, -vv
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Resolve config path with proper precedence: CLI > env > default
    let effective = resolve_config_path(args.config);
    effective.log_startup();

    let config = match TrainingConfig::from_yaml_file(&effective.path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let fingerprint = match output::config_fingerprint(&config) {
        Ok(fp) => fp,
        Err(e) => {
            eprintln!("Error: could not fingerprint config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "drivenc | config={} | sha256={} | model={} | dataset={} | iters={} | batch={}",
        effective.path.display(),
        &fingerprint[..16],
        config.encoder_model_type,
        config.dataset_name,
        config.num_iterations,
        config.batch_size
    );

    if args.verbose >= 1 {
        println!(
            "  schedule: {} checkpoint(s), lr={} decay={}x every {} iters",
            config.save_schedule.len(),
            config.learning_rate,
            config.learning_rate_decay_level,
            config.learning_rate_decay_interval
        );
        println!(
            "  data: workers={} seed={} data_used={} noise={} files={}",
            config.num_loading_workers,
            config.seed,
            config.data_used,
            config.use_noise_data,
            config.experience_files.len()
        );
    }
    if args.verbose >= 2 {
        for (name, shape) in &config.sensors {
            let fused = config.fused_shape(name).unwrap_or(*shape);
            println!(
                "  sensor {}: [{}, {}, {}] (fused channels: {})",
                name, shape.channels, shape.height, shape.width, fused.channels
            );
        }
        println!("  targets: {}", config.targets.join(", "));
        println!("  inputs: {}", config.inputs.join(", "));
    }

    if let Some(base_dir) = args.dump_resolved {
        let dir = match output::create_resolved_dir(&base_dir, &config.dataset_name, &fingerprint)
        {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Error: could not create output dir: {}", e);
                return ExitCode::FAILURE;
            }
        };
        let info = LoadInfo::capture(&effective.path, &fingerprint);
        let resolved_path = dir.join(output::CONFIG_RESOLVED_FILE);
        let info_path = dir.join(output::LOAD_INFO_FILE);
        if let Err(e) = output::write_config_resolved(&resolved_path, &config)
            .and_then(|_| output::write_load_info(&info_path, &info))
        {
            eprintln!("Error: could not write provenance artifacts: {}", e);
            return ExitCode::FAILURE;
        }
        println!("Resolved config written to: {}/", dir.display());
    }

    ExitCode::SUCCESS
}
