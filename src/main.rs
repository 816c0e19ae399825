//! s3-athena-workflow CLI.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "s3-athena-workflow",
    version,
    about = "Synthesize the S3 + Glue + Athena query workflow stack"
)]
struct Cli {
    #[command(subcommand)]
    command: s3_athena_workflow::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = s3_athena_workflow::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
