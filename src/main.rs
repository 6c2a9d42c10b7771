use clap::Parser;
use laminate::cli;

#[tokio::main]
async fn main() -> laminate::Result<()> {
    let args = cli::Args::parse();
    cli::run(args).await
}
