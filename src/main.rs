use clap::Parser;
use log::{error, info};
use requests_converter::configuration::{CliArgs, Config, LogLevel};
use requests_converter::converter::PythonRequestsConverter;
use requests_converter::error_handling::types::HarnessError;
use requests_converter::harness::{Harness, RunSummary};
use requests_converter::storage::FileStorage;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};

fn init_logging(level: LogLevel) {
    // RUST_LOG still wins for the modules it names
    env_logger::Builder::from_default_env()
        .filter_level(level.to_filter())
        .format_target(false)
        .init();
}

fn run(config: &Config) -> Result<RunSummary, HarnessError> {
    let converter = PythonRequestsConverter::new();
    let storage = match &config.script_dir {
        Some(dir) => Some(FileStorage::new(dir)?),
        None => None,
    };
    let mut harness = Harness::new(&converter);
    if let Some(storage) = &storage {
        harness = harness.with_store(storage);
    }

    let output: Box<dyn io::Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    match &config.input {
        Some(path) => harness.run(BufReader::new(File::open(path)?), output),
        None => harness.run(io::stdin().lock(), output),
    }
}

fn main() {
    let args = CliArgs::parse();

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            init_logging(LogLevel::default());
            error!("Unable to import configuration: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(config.log_level);
    info!("Configuration imported successfully");

    match run(&config) {
        Ok(summary) => info!(
            "Done: {} stream(s), {} chunk(s) written, {} script(s) saved",
            summary.streams, summary.chunks_written, summary.scripts_saved
        ),
        Err(e) => {
            error!("Conversion failed: {}", e);
            std::process::exit(1);
        }
    }
}
