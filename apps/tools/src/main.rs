use analysis_engine::{templates, MockAnalysisEngine, MockEngineOptions};
use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::intake;
use shared::protocol::FileDescriptor;

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the mock engine's analysis steps.
    Steps {
        #[arg(long)]
        json: bool,
    },
    /// Run a file name through the upload allowlist.
    Check {
        file: String,
        /// Declared MIME type; guessed from the extension when absent.
        #[arg(long)]
        mime: Option<String>,
    },
    /// Print a mock analysis result as JSON.
    Sample {
        name: String,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Steps { json } => {
            let steps = templates::analysis_steps();
            if json {
                println!("{}", serde_json::to_string_pretty(&steps)?);
            } else {
                for step in steps {
                    println!("{} {}: {}", step.id, step.title, step.description);
                }
            }
        }
        Command::Check { file, mime } => {
            let mime = mime.or_else(|| {
                mime_guess::from_path(&file)
                    .first()
                    .map(|guess| guess.essence_str().to_string())
            });
            let descriptor = FileDescriptor::named(file, mime.as_deref());
            match intake::validate(&descriptor) {
                Ok(accepted) => {
                    println!("accepted name={} type={}", descriptor.name, accepted.label)
                }
                Err(err) => {
                    println!("rejected {}", serde_json::to_string(&err.report())?);
                    std::process::exit(1);
                }
            }
        }
        Command::Sample { name, seed } => {
            let options = MockEngineOptions::default();
            let engine = match seed {
                Some(seed) => MockAnalysisEngine::with_rng_seed(options, seed),
                None => MockAnalysisEngine::new(options),
            };
            println!("{}", serde_json::to_string_pretty(&engine.synthesize(&name))?);
        }
    }

    Ok(())
}
