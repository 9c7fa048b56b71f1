use anyhow::Result;
use clap::Parser;
use deepresearch_rs::cli;
use deepresearch_rs::workflow::launch;
use tracing_subscriber::EnvFilter;

/// 初始化日志，RUST_LOG 优先于 -v
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "deepresearch_rs=debug"
    } else {
        "deepresearch_rs=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let request = args.research_request();
    let config = args.into_config()?;

    init_tracing(config.verbose);

    launch(&config, &request).await
}
