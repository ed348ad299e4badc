use clap::Parser;

use fintrack::cli::Cli;
use fintrack::config::{get_config, init_config_from};
use fintrack::runtime::modes;
use fintrack::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(cli.config.as_deref());

    match cli.command {
        // CLI Mode
        Some(cmd) => {
            if let Err(e) = modes::run_cli(cmd).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }

        // Server Mode
        None => {
            let config = get_config();
            // guard 必须在整个进程生命周期内存活
            let _log_guard = init_logging(&config.logging)?;
            modes::run_server().await
        }
    }
}
