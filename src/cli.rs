//! Command line interface for the lab

use clap::Parser;
use log::info;

use crate::app::SimulatorKind;
use physlab::config::LabConfig;

/// Physics Lab - interactive school physics simulators
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Random seed for every simulator (overrides config file)
    #[arg(short = 's', long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Simulator shown on startup
    #[arg(long, value_enum, value_name = "KIND", default_value = "pendulum")]
    pub simulator: SimulatorKind,

    /// Longest time a single frame may advance, in seconds (overrides config file)
    #[arg(long, value_name = "SECONDS")]
    pub max_frame_dt: Option<f64>,

    /// Write the default configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub write_default_config: Option<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Writes the built-in defaults to `path` without reading any existing file there
pub fn write_default_config(path: &str) -> bool {
    match LabConfig::default().save(path) {
        Ok(()) => {
            info!("Wrote default configuration to {path}");
            true
        }
        Err(err) => {
            log::error!("Could not write configuration to {path}: {err}");
            false
        }
    }
}

/// Loads configuration from file or defaults, then applies command-line overrides
pub fn load_and_apply_config(args: &Args) -> LabConfig {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {path}");
            LabConfig::load_or_default(path)
        }
        None => LabConfig::default(),
    };

    if let Some(seed) = args.seed {
        info!("Using random seed: {seed}");
        config.seed = Some(seed);
    }

    if let Some(max_dt) = args.max_frame_dt {
        if max_dt.is_finite() && max_dt > 0.0 {
            info!("Overriding maximum frame step to: {max_dt}");
            config.scheduler.max_frame_dt = max_dt;
        } else {
            log::warn!("Ignoring non-positive --max-frame-dt {max_dt}");
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let args = Args::parse_from(["physlab", "--seed", "42", "--simulator", "free-fall", "--max-frame-dt", "0.1"]);
        assert_eq!(args.simulator, SimulatorKind::FreeFall);
        let config = load_and_apply_config(&args);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.scheduler.max_frame_dt, 0.1);
        assert_eq!(config.pendulum, LabConfig::default().pendulum);
    }

    #[test]
    fn test_bad_frame_step_is_ignored() {
        let args = Args::parse_from(["physlab", "--max-frame-dt=-1"]);
        let config = load_and_apply_config(&args);
        assert_eq!(config.scheduler.max_frame_dt, LabConfig::default().scheduler.max_frame_dt);
        assert_eq!(args.simulator, SimulatorKind::Pendulum);
    }

    #[test]
    fn test_default_config_replaces_malformed_file() {
        let path = std::env::temp_dir().join(format!("physlab-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "this is [not toml").unwrap();
        let path_text = path.to_string_lossy().into_owned();
        assert!(write_default_config(&path_text));
        let loaded = LabConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, LabConfig::default());
    }
}
