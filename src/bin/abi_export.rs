//! Exports interface descriptors from compiler artifacts.
//!
//! Reads `<out-dir>/<Name>.sol/<Name>.json` artifacts and writes their `abi`
//! array to `<abi-dir>/<Name>.json`.

use std::{
    path::{Path, PathBuf},
    process::exit,
};

use clap::Parser;
use tracing::{error, info};

const CONTRACTS: [&str; 6] = [
    "Faucet",
    "GearingTokenWithERC20",
    "TermMaxMarket",
    "TermMaxOrder",
    "TermMaxRouter",
    "TermMaxVault",
];

#[derive(Parser, Debug)]
#[command(name = "abi_export")]
#[command(about = "Extract interface descriptors from compiler artifacts")]
struct Args {
    /// Contract names (default: all protocol contracts)
    contracts: Vec<String>,

    /// Compiler artifacts directory
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Descriptors directory
    #[arg(long, default_value = "abi")]
    abi_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact has no `abi` array")]
    MissingAbi,
}

/// Pretty printed `abi` array of a compiler artifact.
fn extract_abi(artifact: &str) -> Result<String, Error> {
    let mut artifact: serde_json::Value = serde_json::from_str(artifact)?;
    match artifact.get_mut("abi").map(serde_json::Value::take) {
        Some(abi @ serde_json::Value::Array(_)) => Ok(serde_json::to_string_pretty(&abi)?),
        _ => Err(Error::MissingAbi),
    }
}

fn export(name: &str, out_dir: &Path, abi_dir: &Path) -> Result<PathBuf, Error> {
    let source = out_dir.join(format!("{name}.sol")).join(format!("{name}.json"));
    let abi = extract_abi(&std::fs::read_to_string(&source)?)?;
    let target = abi_dir.join(format!("{name}.json"));
    std::fs::write(&target, abi + "\n")?;
    Ok(target)
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let contracts = if args.contracts.is_empty() {
        CONTRACTS.iter().map(|c| c.to_string()).collect()
    } else {
        args.contracts
    };

    if let Err(e) = std::fs::create_dir_all(&args.abi_dir) {
        eprintln!("Failed to create {}: {}", args.abi_dir.display(), e);
        exit(1);
    }

    let mut failed = 0;
    for name in &contracts {
        match export(name, &args.out_dir, &args.abi_dir) {
            Ok(target) => info!(contract = %name, target = %target.display(), "descriptor exported"),
            Err(e) => {
                error!(contract = %name, %e, "failed to export descriptor");
                failed += 1;
            }
        }
    }
    info!(exported = contracts.len() - failed, failed, "done");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_abi() {
        let artifact = r#"{"abi":[{"type":"event","name":"Ping","inputs":[]}],"bytecode":"0x00"}"#;
        let abi: serde_json::Value = serde_json::from_str(&extract_abi(artifact).unwrap()).unwrap();
        assert_eq!(abi[0]["name"], "Ping");
        assert!(abi.as_array().unwrap().len() == 1);
    }

    #[test]
    fn test_extract_abi_missing() {
        assert!(matches!(extract_abi(r#"{"bytecode":"0x"}"#), Err(Error::MissingAbi)));
        assert!(matches!(extract_abi(r#"{"abi":{}}"#), Err(Error::MissingAbi)));
        assert!(matches!(extract_abi("nope"), Err(Error::Json(_))));
    }
}
