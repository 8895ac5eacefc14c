//! Binary entry point for the Ashlar database consistency checker.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use ashlar_dbcheck::{check_snapshot, Result, RunReport, Snapshot, Summary};

#[derive(Parser, Debug)]
#[command(
    name = "ashlar-dbcheck",
    version,
    about = "Consistency checker for Ashlar control-plane database exports"
)]
struct Cli {
    /// Snapshot produced by `ashlar db export`, or `-` to read stdin.
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for the report"
    )]
    format: OutputFormat,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let snapshot = match load_snapshot(&cli.snapshot) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };

    let report = RunReport::new(Summary::scan(&snapshot), check_snapshot(&snapshot));
    match cli.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err}");
                process::exit(2);
            }
        },
        OutputFormat::Text => print!("{report}"),
    }

    if !report.success {
        process::exit(1);
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes)?;
        Snapshot::from_slice(&bytes)
    } else {
        Snapshot::from_path(path)
    }
}
