use std::path::PathBuf;

use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use profile_harvester::SourceType;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Profile Harvester: run config-driven scrapers and merge the results into one CSV
#[derive(Parser)]
#[command(name = "harvest", version, styles = STYLES)]
struct Cli {
    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run target configs and write the merged CSV
    Run {
        /// YAML target config paths (default: all in the targets directory)
        configs: Vec<String>,

        /// Run every config in the targets directory
        #[arg(long)]
        all: bool,

        /// Directory scanned when no explicit configs are given
        #[arg(short, long, default_value = "targets")]
        targets_dir: String,

        /// Output CSV path
        #[arg(short, long, default_value = "harvest.csv")]
        output: String,
    },

    /// List the registered source-type tags
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Run {
            configs,
            all,
            targets_dir,
            output,
        } => {
            let paths = if all || configs.is_empty() {
                profile_harvester::cli::discover_configs(&targets_dir)?
            } else {
                configs.into_iter().map(PathBuf::from).collect()
            };
            let output = PathBuf::from(output);
            let count = profile_harvester::cli::run_harvest(&paths, &output).await?;
            println!(
                "Scraped {} records -> {}",
                count.green(),
                output.display().bright_black()
            );
        }
        Commands::Sources => {
            for tag in SourceType::KNOWN_TAGS {
                println!("{}", tag.green());
            }
        }
    }

    Ok(())
}
