use clap::Parser;

mod cli;
mod commands;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = commands::load_config(&cli)?;
    logging::init_logging(config.log.format, &config.log.level);
    commands::run_command(cli, config).await
}
