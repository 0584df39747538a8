pub mod cli;
pub mod config;
pub mod dates;
pub mod derive;
pub mod error;
pub mod interval;
pub mod io_utils;
pub mod preview;
pub mod process;
pub mod range;
pub mod schema;
pub mod summary;
pub mod table;
pub mod transform;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::{
    cli::{Cli, Commands},
    config::PipelineConfig,
};

pub use crate::{
    error::ReportError,
    process::{Report, run_pipeline},
    table::{ColumnRef, Table},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("shipment_report", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Process(args) => process::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Config => {
            print!("{}", PipelineConfig::default().to_yaml()?);
            Ok(())
        }
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
