use std::fs;
use std::io::Read;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};

use goalsim::engine::SimulationEngine;
use goalsim::types::{MatchContext, SimulationResponse};

/// JSON-in/JSON-out runner: reads a simulation request from the file given
/// as the first argument (or stdin when absent) and prints the response.
/// Set SIM_SEED to make a run reproducible.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let started = Instant::now();
    let response = run().unwrap_or_else(|err| {
        SimulationResponse::failure(format!("{err:#}"), started.elapsed().as_secs_f64())
    });

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize response: {err}");
            return ExitCode::FAILURE;
        }
    }

    if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run() -> Result<SimulationResponse> {
    let raw = match std::env::args().nth(1) {
        Some(path) => {
            fs::read_to_string(&path).with_context(|| format!("read request file {path}"))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read request from stdin")?;
            buf
        }
    };

    let ctx: MatchContext = serde_json::from_str(&raw).context("parse simulation request")?;
    let engine = SimulationEngine::default();

    let seed = std::env::var("SIM_SEED")
        .ok()
        .and_then(|val| val.parse::<u64>().ok());
    let response = match seed {
        Some(seed) => engine.run_seeded(&ctx, seed)?,
        None => engine.run(&ctx)?,
    };
    Ok(response)
}
