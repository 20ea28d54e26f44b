pub mod cli;
pub mod config;
pub mod error;
pub mod hardware;
pub mod models;
pub mod mqtt;
pub mod protocol;
pub mod runtime;

use cli::output::print_error;
use config::{DeviceConfig, OutputMode, RuntimeConfig};
use error::AppError;

pub async fn run(cli_args: cli::Cli) -> i32 {
    init_logging(&cli_args);

    let config = RuntimeConfig {
        output_mode: if cli_args.table {
            OutputMode::Table
        } else {
            OutputMode::Json
        },
        verbose: cli_args.verbose,
    };

    let result = match device_config(&cli_args) {
        Ok(device) => dispatch(cli_args.command, &device, &config).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            print_error(&err);
            err.exit_code()
        }
    }
}

/// Config file, then flags and environment on top.
fn device_config(cli_args: &cli::Cli) -> Result<DeviceConfig, AppError> {
    let mut device = config::load_device_config(cli_args.config.as_deref())?;
    cli_args.device.apply_to(&mut device);
    device.validate()?;
    Ok(device)
}

fn init_logging(cli_args: &cli::Cli) {
    let default_filter = if cli_args.verbose {
        "debug"
    } else if matches!(cli_args.command, cli::Commands::Run) {
        "info"
    } else {
        "warn"
    };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

async fn dispatch(
    command: cli::Commands,
    device: &DeviceConfig,
    config: &RuntimeConfig,
) -> Result<(), AppError> {
    match command {
        cli::Commands::Run => cli::run::handle(device).await,
        cli::Commands::Discovery => cli::discovery::handle(device, config),
        cli::Commands::Mix {
            off,
            brightness,
            kelvin,
        } => cli::mix::handle(off, brightness, kelvin, device, config),
        cli::Commands::Decode { payload } => cli::decode::handle(&payload, device),
    }
}
