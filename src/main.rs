use clap::{Parser, Subcommand, ValueEnum};
use horizon::config::{Config, init_tracing};
use horizon::core::{AllocationSlice, RiskProfile, SimulationSeries, asset_mix, country_exposure};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRiskProfile {
    Low,
    Medium,
    High,
}

impl From<CliRiskProfile> for RiskProfile {
    fn from(value: CliRiskProfile) -> Self {
        match value {
            CliRiskProfile::Low => RiskProfile::Low,
            CliRiskProfile::Medium => RiskProfile::Medium,
            CliRiskProfile::High => RiskProfile::High,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "horizon",
    about = "HorizonOne: tax-free vs. taxed portfolio growth for expatriate investors"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard and JSON API
    Serve {
        #[arg(long, help = "Overrides the port from HORIZON_LISTEN_ADDR")]
        port: Option<u16>,
    },
    /// Print the sheltered vs. taxed growth series
    Simulate {
        #[arg(long, value_enum, default_value_t = CliRiskProfile::High)]
        risk_profile: CliRiskProfile,
        #[arg(long, help = "Emit JSON instead of a table")]
        json: bool,
    },
    /// Print the asset mix and geographic exposure
    Allocation {
        #[arg(long, value_enum, default_value_t = CliRiskProfile::High)]
        risk_profile: CliRiskProfile,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_format);

    match cli.command {
        Command::Serve { port } => {
            let config = match port {
                Some(port) => config.with_port(port),
                None => config,
            };
            if let Err(e) = horizon::api::run_http_server(&config).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Simulate { risk_profile, json } => {
            let series = match horizon::core::simulate_portfolio(risk_profile.into()) {
                Ok(series) => series,
                Err(e) => {
                    eprintln!("Simulation error: {e}");
                    std::process::exit(1);
                }
            };
            if json {
                match serde_json::to_string_pretty(&series) {
                    Ok(out) => println!("{out}"),
                    Err(e) => {
                        eprintln!("Serialization error: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                print_series(&series);
            }
        }
        Command::Allocation { risk_profile } => {
            let profile: RiskProfile = risk_profile.into();
            println!("{profile} portfolio");
            print_slices("Asset Mix", asset_mix(profile));
            print_slices("Geographic Exposure", country_exposure(profile));
        }
    }
}

fn print_series(series: &SimulationSeries) {
    println!("Sample '{}' Portfolio (QAR)", series.risk_profile);
    println!(
        "{:<12} {:>10} {:>16} {:>16} {:>12}",
        "Year", "Return", "Qatar (0% tax)", "Home (12.5%)", "Tax paid"
    );
    for p in &series.points {
        println!(
            "{:<12} {:>9.2}% {:>16.2} {:>16.2} {:>12.2}",
            p.year,
            p.annual_return * 100.0,
            p.sheltered_value,
            p.taxed_value,
            p.tax_paid
        );
    }
    println!(
        "\nTax drag after {} years: {:.2} QAR",
        series.len().saturating_sub(1),
        series.tax_drag()
    );
}

fn print_slices(title: &str, slices: &[AllocationSlice]) {
    println!("\n{title}");
    for s in slices {
        println!("  {:<30} {:>5.1}%", s.label, s.percentage);
    }
}
