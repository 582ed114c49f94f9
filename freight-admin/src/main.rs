use std::path::PathBuf;

use freight_admin::config::{write_default_config, AppConfig};
use freight_admin::utils::path_resolver;

const USAGE: &str = "\
Usage: freight-admin [OPTIONS]

Options:
  --tui                      Run the interactive terminal UI (default)
  --tui-smoke[=SCREEN]       Render one frame and exit
                             SCREEN: login|otp|dashboard|bookings|users|booking|shipment|staff|customer|receive
  --config <PATH>            Load configuration from PATH
  --write-default-config     Write the default configuration file and exit
  -h, --help                 Show this help";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("freight-admin: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> anyhow::Result<()> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config_path = match args.iter().position(|a| a == "--config") {
        Some(i) => match args.get(i + 1) {
            Some(path) => Some(PathBuf::from(path)),
            None => anyhow::bail!("--config needs a path\n\n{}", USAGE),
        },
        None => None,
    };

    if args.iter().any(|a| a == "--write-default-config") {
        let path = config_path.unwrap_or_else(path_resolver::default_config_path);
        write_default_config(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = AppConfig::load(config_path.as_deref())?;

    // Usage: --tui-smoke or --tui-smoke=dashboard|login|otp|...
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        return freight_admin::run_tui_smoke(&config, target);
    }

    freight_admin::run_tui(&config)
}
