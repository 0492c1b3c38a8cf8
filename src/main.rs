use clap::Parser;

use leadrelay::cli::{Cli, Command};
use leadrelay::{logging, server, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli.bind.clone(), cli.port);
    config.validate()?;

    match cli.command() {
        Command::CheckConfig => {
            print!("{}", config.to_redacted_toml()?);
            if !config.telegram.is_configured() {
                anyhow::bail!("Telegram relay is not configured (set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID)");
            }
            Ok(())
        }
        Command::Serve => {
            let _guard = logging::init_tracing(&config.logging)?;
            tracing::info!("leadrelay v{}", leadrelay::VERSION);
            server::start_server(&config).await
        }
    }
}
