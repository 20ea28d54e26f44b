use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = tunelight::cli::Cli::parse();
    let exit_code = tunelight::run(cli).await;
    std::process::exit(exit_code);
}
