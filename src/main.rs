use clap::Parser;
use glidepath::api::{self, Cli};
use glidepath::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    if let Err(msg) = api::run_cli(cli).await {
        eprintln!("{msg}");
        std::process::exit(1);
    }
}
