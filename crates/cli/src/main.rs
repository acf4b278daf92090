use anyhow::Context;
use clap::{Parser, Subcommand};
use shop_app::modules::fortune::{
    calculator,
    routes::{parse_date, FortuneReading},
};
use shop_kernel::settings::Settings;
use time::Date;

#[derive(Debug, Parser)]
#[command(name = "shop-cli", version, about = "Book shop service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API until interrupted
    Serve,
    /// Print a fortune without starting the server
    Fortune {
        /// Birth date as YYYY-MM-DD
        #[arg(long, value_parser = date_arg)]
        birth_date: Date,
        /// One of A, B, O, AB
        #[arg(long)]
        blood_type: calculator::BloodType,
        /// Draw for this date instead of today
        #[arg(long, value_parser = date_arg)]
        date: Option<Date>,
    },
    /// Print the effective settings as JSON
    Config,
}

fn date_arg(value: &str) -> Result<Date, String> {
    parse_date(value)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load shop settings")?;

    match cli.command {
        Command::Serve => {
            shop_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "shop CLI serving");
            shop_app::run(settings).await
        }
        Command::Fortune {
            birth_date,
            blood_type,
            date,
        } => {
            let current_date = match date {
                Some(date) => date,
                None => calculator::today(settings.fortune.utc_offset()?),
            };
            let reading = FortuneReading::new(birth_date, blood_type, current_date);
            println!("{}", serde_json::to_string_pretty(&reading)?);
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
