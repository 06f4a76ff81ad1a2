use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sla_risk_console::chart::terminal::TerminalCanvas;
use sla_risk_console::chart::{Canvas, ChartBackend};
use sla_risk_console::client::http::HttpDashboardApi;
use sla_risk_console::client::DashboardApi;
use sla_risk_console::config::{Config, ConfigOverrides};
use sla_risk_console::controller::{RunOutcome, SimulationControls, SimulationController};
use sla_risk_console::output::csv::{curves_to_csv, dataset_to_csv};
use sla_risk_console::output::json::render_json;
use sla_risk_console::output::table::{
    render_dataset, render_executive, render_overview, render_simulation,
};
use sla_risk_console::session::run_session;
use sla_risk_console::views::{load_dataset, load_executive, load_overview};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "sla-risk-console",
    about = "Delivery SLA-risk analytics and cost simulation"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long = "api-url")]
    api_url: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Headline stats, risk distribution and recommended actions
    Overview,
    /// Sample of the underlying delivery records
    Dataset,
    /// Financial summary at the executive reference parameters
    Executive,
    /// One simulation run with both charts
    Simulate {
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long = "cost-fn")]
        cost_fn: Option<f64>,
        #[arg(long = "cost-fp")]
        cost_fp: Option<f64>,
    },
    /// Read control commands from stdin and re-run on each change
    Interactive {
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long = "cost-fn")]
        cost_fn: Option<f64>,
        #[arg(long = "cost-fp")]
        cost_fp: Option<f64>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    let (threshold, cost_fn, cost_fp) = match &cli.command {
        Commands::Simulate {
            threshold,
            cost_fn,
            cost_fp,
        }
        | Commands::Interactive {
            threshold,
            cost_fn,
            cost_fp,
        } => (*threshold, *cost_fn, *cost_fp),
        _ => (None, None, None),
    };
    config.apply_overrides(ConfigOverrides {
        base_url: cli.api_url.clone(),
        threshold,
        cost_fn,
        cost_fp,
    });

    if let Commands::Config { init, show } = &cli.command {
        return handle_config_command(*init, *show, &config, &config_path);
    }

    let http = HttpDashboardApi::new(&config.api).context("failed to set up backend client")?;
    info!("using analytics backend at {}", http.base_url());
    let api: Arc<dyn DashboardApi> = Arc::new(http);

    match &cli.command {
        Commands::Overview => {
            let Some(view) = load_overview(api.as_ref()).await else {
                return Ok(());
            };
            match cli.output {
                OutputFormat::Table => {
                    let mut canvas = TerminalCanvas::default();
                    let chart = canvas.create(Canvas::RiskDistribution, &view.risk_chart)?;
                    println!(
                        "{}",
                        render_overview(&view, canvas.frame(Canvas::RiskDistribution))
                    );
                    canvas.destroy(chart);
                }
                OutputFormat::Json => println!("{}", render_json(&view)?),
                OutputFormat::Csv => {
                    warn!("CSV output for overview not implemented, using JSON");
                    println!("{}", render_json(&view)?);
                }
            }
        }
        Commands::Dataset => {
            let view = load_dataset(api.as_ref()).await;
            match cli.output {
                OutputFormat::Table => println!("{}", render_dataset(&view)),
                OutputFormat::Json => println!("{}", render_json(&view)?),
                OutputFormat::Csv => print!("{}", dataset_to_csv(&view)?),
            }
        }
        Commands::Executive => {
            let request = config.executive.request();
            let Some(view) = load_executive(api.as_ref(), &request).await else {
                return Ok(());
            };
            match cli.output {
                OutputFormat::Table => println!("{}", render_executive(&view)),
                OutputFormat::Json => println!("{}", render_json(&view)?),
                OutputFormat::Csv => {
                    warn!("CSV output for executive not implemented, using JSON");
                    println!("{}", render_json(&view)?);
                }
            }
        }
        Commands::Simulate { .. } => {
            let mut controller = build_controller(api, &config);
            if controller.load().await == RunOutcome::Applied {
                print_simulation(&controller, cli.output)?;
            }
            controller.teardown();
        }
        Commands::Interactive { .. } => {
            let mut controller = build_controller(api, &config);
            let stdin = BufReader::new(tokio::io::stdin());
            run_session(&mut controller, stdin, |ctl| {
                println!("{}", render_simulation(ctl));
            })
            .await?;
        }
        Commands::Config { .. } => unreachable!("config command handled before dispatch"),
    }

    Ok(())
}

fn build_controller(
    api: Arc<dyn DashboardApi>,
    config: &Config,
) -> SimulationController<TerminalCanvas> {
    SimulationController::new(
        api,
        TerminalCanvas::default(),
        SimulationControls {
            threshold: config.simulation.threshold,
            cost_fn: config.simulation.cost_fn,
            cost_fp: config.simulation.cost_fp,
        },
        config.simulation.stale_policy(),
    )
}

fn print_simulation(
    controller: &SimulationController<TerminalCanvas>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_simulation(controller)),
        OutputFormat::Json => {
            if let Some(response) = controller.last_response() {
                println!("{}", render_json(response)?);
            }
        }
        OutputFormat::Csv => {
            if let Some(response) = controller.last_response() {
                print!("{}", curves_to_csv(&response.curves)?);
            }
        }
    }
    Ok(())
}

fn handle_config_command(
    init: bool,
    show: bool,
    config: &Config,
    config_path: &PathBuf,
) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}
