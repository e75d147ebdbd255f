//! Converts a market deployment spreadsheet (CSV) into deployment JSON.

use std::{fs::File, io::BufReader, path::PathBuf, process::exit};

use clap::Parser;
use termmax_tools::deploy::{self, Schema};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "convert_market_configs")]
#[command(about = "Convert a market deployment spreadsheet into deployment JSON")]
#[command(after_help = "Example: convert_market_configs deploydata/eth-mainnet.csv deploydata/eth-mainnet.json")]
struct Args {
    /// Spreadsheet exported as CSV
    input: PathBuf,

    /// Output JSON file, parent directories are created when missing
    output: PathBuf,

    /// Column layout of the spreadsheet (v1 or v2)
    #[arg(long, default_value = "v1")]
    schema: Schema,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion error: {0}")]
    Convert(#[from] termmax_tools::error::DeployConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn run(args: &Args) -> Result<usize, Error> {
    info!(input = %args.input.display(), schema = %args.schema, "reading spreadsheet");
    let config = deploy::convert(BufReader::new(File::open(&args.input)?), args.schema)?;

    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&args.output, config.to_json()?)?;
    Ok(config.configs().len())
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            exit(code);
        }
    };

    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run(&args) {
        Ok(markets) => println!(
            "Conversion complete, {markets} markets written to {}",
            args.output.display()
        ),
        Err(e) => {
            error!(%e, "Conversion failed");
            exit(1);
        }
    }
}
