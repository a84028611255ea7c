use anyhow::Result;
use clap::Parser;
use chefchat::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    chefchat::run(args).await
}
