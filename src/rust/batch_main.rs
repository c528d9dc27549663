use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use digitserve::{run_batch, BatchArgs, BatchConfig};
use log::info;

fn main() -> ExitCode {
    digitserve::init_logger();
    let config = BatchConfig::from(BatchArgs::parse());

    let start_time = Instant::now();
    match run_batch(&config) {
        Ok(summary) => {
            println!("Processed {} images successfully", summary.processed);
            println!("Skipped {} images due to errors", summary.skipped);
            println!("Results written to {}", config.output.display());
            info!("Total time: {:.2?}", start_time.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
