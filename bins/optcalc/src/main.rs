//! Option calculator CLI and server binary
//!
//! Serves the pricing API, or runs a single calculation and prints the
//! result to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use cli::{Cli, Commands, GridArgs, LogFormatArg};
use config::{generate_default_config, load_config, save_config, validate_config, MasterConfig};
use observability::{init_logging, init_metrics, LogFormat};
use pricing_engine::api::{create_router, PricingApiState};
use pricing_engine::{
    ModelKind, OptionLeg, OptionType, PricingEngine, SingleOptionRequest, Strategy,
    StrategyRequest,
};
use server::{validate_port_available, HttpServer, ServerConfig, ServerExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    if let Commands::Init { output } = &cli.command {
        init_logging("optcalc", log_format(cli.log_format, None))?;
        return init_command(output);
    }

    let config_found = cli.config.exists();
    let config = if config_found {
        load_config(&cli.config)?
    } else {
        MasterConfig::default()
    };

    init_logging("optcalc", log_format(cli.log_format, Some(&config)))?;
    debug!(?cli, "CLI arguments parsed");
    if !config_found {
        info!(path = ?cli.config, "No configuration file found, using defaults");
    }

    if !matches!(cli.command, Commands::Validate) {
        ensure_valid(&config)?;
    }

    match cli.command {
        Commands::Serve { port } => serve_command(config, port).await,
        Commands::Validate => validate_command(&cli.config, config_found, &config),
        Commands::Init { .. } => Ok(()),
        Commands::MarketStatus => market_status_command(&config),
        Commands::Price {
            option_type,
            spot,
            strike,
            years,
            vol,
            model,
        } => price_command(&config, option_type, spot, strike, years, vol, model),
        Commands::Table {
            strike,
            option_type,
            grid,
        } => table_command(&config, strike, option_type, grid),
        Commands::Strategy { legs, grid } => strategy_command(&config, legs, grid),
    }
}

/// Command line beats the config file; unknown config values fall back to pretty.
fn log_format(cli: Option<LogFormatArg>, config: Option<&MasterConfig>) -> LogFormat {
    match (cli, config) {
        (Some(arg), _) => LogFormat::parse(arg.as_str()),
        (None, Some(config)) => LogFormat::parse(&config.logging.format),
        (None, None) => None,
    }
    .unwrap_or(LogFormat::Pretty)
}

/// Log warnings and refuse to run on configuration errors
fn ensure_valid(config: &MasterConfig) -> Result<()> {
    let report = validate_config(config);

    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot run due to configuration errors");
    }
    Ok(())
}

async fn serve_command(config: MasterConfig, port_override: Option<u16>) -> Result<()> {
    if let Some(metrics) = config.metrics.as_ref().filter(|metrics| metrics.enabled) {
        init_metrics(metrics.port).context("Failed to start metrics exporter")?;
    }

    let engine = PricingEngine::from_config(&config).context("Failed to build pricing engine")?;
    let state = Arc::new(PricingApiState::new(
        Arc::new(engine),
        config.market_data.clone(),
    ));

    let mut server_config = ServerConfig::from_settings(&config.server);
    if let Some(port) = port_override {
        debug!(port, "Overriding configured HTTP port");
        server_config = server_config.with_port(port);
    }
    validate_port_available(&server_config).await?;

    info!(
        host = %server_config.host,
        port = server_config.port,
        "Starting option calculator"
    );

    HttpServer::new(server_config, create_router(state))
        .run_with_signals()
        .await?;

    Ok(())
}

fn validate_command(path: &Path, config_found: bool, config: &MasterConfig) -> Result<()> {
    if !config_found {
        anyhow::bail!("Configuration file not found: {:?}", path);
    }
    info!(?path, "Validating configuration");

    let report = validate_config(config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!(
        "Market hours: {}-{} (UTC{:+} / UTC{:+} in DST)",
        config.calendar.market_open,
        config.calendar.market_close,
        config.calendar.standard_utc_offset_hours,
        config.calendar.dst_utc_offset_hours
    );
    println!("Holidays: {}", config.calendar.holidays.len());
    println!(
        "Model: {} ({} lattice steps)",
        config.pricing.model, config.pricing.lattice_steps
    );
    println!("Candidate rates: {:?}", config.pricing.candidate_rates);
    println!("Listen: {}:{}", config.server.host, config.server.port);

    Ok(())
}

fn init_command(output_path: &Path) -> Result<()> {
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Adjust market hours, holidays and candidate rates as needed");
    println!(
        "  2. Run 'optcalc validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'optcalc serve --config {:?}' to start the API",
        output_path
    );

    Ok(())
}

fn market_status_command(config: &MasterConfig) -> Result<()> {
    let engine = PricingEngine::from_config(config)?;
    let instant = engine.market_instant()?;
    println!("{}", serde_json::to_string_pretty(&instant)?);
    Ok(())
}

fn price_command(
    config: &MasterConfig,
    option_type: OptionType,
    spot: f64,
    strike: f64,
    years: f64,
    volatility: f64,
    model: Option<ModelKind>,
) -> Result<()> {
    let engine = PricingEngine::from_config(config)?;
    let range = engine.price_range(option_type, spot, strike, years, volatility, model)?;
    println!("{}", range);
    Ok(())
}

fn table_command(
    config: &MasterConfig,
    strike: f64,
    option_type: OptionType,
    grid: GridArgs,
) -> Result<()> {
    let engine = PricingEngine::from_config(config)?;
    let table = engine.generate_single_option_table(&SingleOptionRequest {
        spot: grid.spot,
        strike,
        volatility: grid.vol,
        start: grid.start,
        expiration: engine.calendar().close_on(grid.expiration),
        price_increment: grid.increment,
        option_type,
        model: grid.model,
    })?;

    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}

fn strategy_command(config: &MasterConfig, legs: Vec<OptionLeg>, grid: GridArgs) -> Result<()> {
    let engine = PricingEngine::from_config(config)?;
    let strategy = Strategy::new(legs)?;
    let table = engine.generate_strategy_table(&StrategyRequest {
        spot: grid.spot,
        volatility: grid.vol,
        start: grid.start,
        expiration: engine.calendar().close_on(grid.expiration),
        price_increment: grid.increment,
        strategy,
        model: grid.model,
    })?;

    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
