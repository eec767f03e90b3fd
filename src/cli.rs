use crate::analyzer::{self, AnalysisReport};
use crate::config::{ModelConfig, ScalePreset, DEFAULT_BLOCK_SIZE};
use crate::error::ModelError;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})";

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Block entropy model inspector for the HLC platform"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ModelArgs {
    /// Input file to model
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Frequency scale [fast, balanced, max] or a number in [256..65536]
    #[arg(short, long, default_value = "fast")]
    scale: ScalePreset,

    /// Block size in bytes
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Number of threads to use (default: all available cores)
    #[arg(short, long)]
    threads: Option<usize>,
}

impl ModelArgs {
    fn config(&self) -> ModelConfig {
        ModelConfig::default()
            .with_scale(self.scale)
            .with_block_size(self.block_size)
            .with_threads(self.threads.unwrap_or_else(num_cpus::get))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Builds the block models of a file and reports them
    Inspect {
        #[command(flatten)]
        model: ModelArgs,

        /// Write the serialized model headers to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Show progress
        #[arg(short, long)]
        progress: bool,
    },
    /// Checks that the model headers of a file decode back to the same models
    Verify {
        #[command(flatten)]
        model: ModelArgs,
    },
}

pub fn run() -> Result<(), ModelError> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Inspect { model, output, json, progress } => {
            let config = model.config();
            let data = fs::read(&model.input)?;

            let start = Instant::now();
            let report = if *progress {
                let pb = ProgressBar::new(data.len() as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template(PROGRESS_TEMPLATE)
                        .map_err(|e| ModelError::Config(e.to_string()))?
                        .progress_chars("#>-"),
                );
                let report = analyzer::analyze_with_progress(&data, &config, &pb)?;
                pb.finish_with_message("Modeling finished");
                report
            } else {
                analyzer::analyze(&data, &config)?
            };
            let duration = start.elapsed();

            if let Some(path) = output {
                fs::write(path, report.headers())?;
            }

            if *json {
                let json =
                    serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
                println!("{}", json);
            } else {
                print_report(&report);
                println!("  Elapsed Time:     {:.2?}", duration);
            }
        }
        Commands::Verify { model } => {
            let config = model.config();
            let data = fs::read(&model.input)?;

            if !analyzer::verify(&data, &config)? {
                return Err(ModelError::InvalidBitstream(format!(
                    "model headers of {} do not decode to the same models",
                    model.input.display()
                )));
            }
            println!("Verification successful!");
        }
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("Modeling successful!");
    println!("  Input Size:       {} bytes", report.total_bytes);
    println!("  Blocks:           {} ({} stored)", report.blocks.len(), report.stored_blocks);
    println!("  Scale:            {}", report.scale);
    println!("  Header Size:      {} bytes", report.header_bytes);

    for block in &report.blocks {
        println!(
            "  #{:<4} offset {:>10}  len {:>8}  entropy {:>4}/1024  \
             symbols {:>3}  header {:>5} bits{}",
            block.index,
            block.offset,
            block.length,
            block.entropy_1024,
            block.alphabet_size,
            block.header_bits,
            if block.stored { "  [stored]" } else { "" }
        );
    }
}
