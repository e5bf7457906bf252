//! Optimo Telegram bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx OPENAI_API_KEY=xxx ASSEMBLYAI_API_KEY=xxx cargo run -p optimo-telegram
//! ```

use std::time::Duration;

use clap::Parser;
use optimo_core::BotConfig;
use optimo_telegram::{OptimoBot, RunOptions};
use tracing_subscriber::EnvFilter;

/// Optimo - reminders, notes and decisions on Telegram
#[derive(Parser, Debug)]
#[command(name = "optimo-telegram")]
#[command(about = "Telegram webhook bot for reminders, notes and decisions")]
struct Args {
    /// Bind host (overrides OPTIMO_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Also sweep reminders in-process every N seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    sweep_interval: Option<u64>,

    /// Don't call setWebhook on startup
    #[arg(long)]
    no_register_webhook: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    optimo_core::load_dotenv();

    let filter = match args.verbose {
        0 => "optimo_telegram=info,optimo_core=info,optimo_persistence=info,tower_http=warn,teloxide=warn",
        1 => "optimo_telegram=debug,optimo_core=debug,optimo_persistence=debug,tower_http=info,teloxide=info",
        2 => "optimo_telegram=trace,optimo_core=trace,optimo_persistence=trace,tower_http=debug,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = BotConfig::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing::info!(
        store = config.store.name(),
        timezone = %config.timezone,
        addr = %config.bind_address(),
        "Configuration loaded"
    );

    let register_webhook = !args.no_register_webhook && config.webhook_url.is_some();
    if !args.no_register_webhook && config.webhook_url.is_none() {
        tracing::warn!("WEBHOOK_URL not set; assuming the webhook is registered elsewhere");
    }

    let mut bot = OptimoBot::new(config)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] Optimo Telegram Bot");
            println!("   Bot: @{}", username);
            if let Some(url) = bot.webhook_url() {
                println!("   Webhook: {}", url);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\n   Press Ctrl+C to stop\n");

    bot.run(RunOptions {
        register_webhook,
        sweep_interval: args.sweep_interval.map(Duration::from_secs),
    })
    .await?;

    Ok(())
}
