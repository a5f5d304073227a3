use clap::Parser;
use league_miles::utils::{logger, validation::Validate};
use league_miles::{CliConfig, EtlEngine, LeaguePipeline, LocalStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting league-miles");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("error: {}", e);
        std::process::exit(2);
    }

    let storage = LocalStorage::new(config.data_dir.clone());
    let pipeline = LeaguePipeline::new(storage, config)?;
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            let s = report.summary;
            println!(
                "Teams geocoded: {} | Venues geocoded: {} | Pairs resolved: {} | Pairs failed: {} | Warnings: {}",
                s.teams_geocoded, s.venues_geocoded, s.pairs_resolved, s.pairs_failed, s.warnings
            );
            println!("Output saved to: {}", report.output_path);
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
