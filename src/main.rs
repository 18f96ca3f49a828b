//! kinbag - train a bag-of-entities classifier on a triples file.
//!
//! ```text
//! kinbag <triples.tsv> [config.json]
//! ```
//!
//! Writes `entity_embeddings.svg` and `entity_embeddings.json` to the
//! current directory.

use std::env;
use std::fs;

use kinbag::{render_svg, run, Result, RunConfig, RunReport};
use tracing_subscriber::EnvFilter;

const SVG_PATH: &str = "entity_embeddings.svg";
const JSON_PATH: &str = "entity_embeddings.json";

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kinbag=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <triples.tsv> [config.json]", args[0]);
        std::process::exit(2);
    }

    if let Err(e) = execute(&args[1], args.get(2).map(String::as_str)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn execute(triples_path: &str, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => RunConfig::from_path(path)?,
        None => RunConfig::default(),
    };
    tracing::debug!(config = %serde_json::to_string(&config)?, "run configuration");

    let report = run(triples_path, &config)?;
    print_report(&report)?;

    fs::write(SVG_PATH, render_svg(&report.projection, 1000, 800))?;
    fs::write(JSON_PATH, report.projection.to_json()?)?;
    println!("\nWrote {} and {}", SVG_PATH, JSON_PATH);

    Ok(())
}

fn print_report(report: &RunReport) -> Result<()> {
    println!(
        "{} entities, {} relations",
        report.vocabulary.len(),
        report.relations.len()
    );
    let (train, val, test) = report.split_sizes;
    println!("Examples: {} train / {} validation / {} test\n", train, val, test);

    println!("{}\n", report.model.summary());

    if let Some(last) = report.history.last() {
        match last.validation {
            Some(val) => println!(
                "After {} epochs: train loss {:.4}, val loss {:.4}, val accuracy {:.4}",
                last.epoch, last.train_loss, val.loss, val.accuracy
            ),
            None => println!(
                "After {} epochs: train loss {:.4} (no validation split)",
                last.epoch, last.train_loss
            ),
        }
    }
    match report.test {
        Some(test) => println!("Test loss {:.4}, test accuracy {:.4}", test.loss, test.accuracy),
        None => println!("No test split"),
    }

    println!("\nMost probable relations:");
    for head in 1..report.vocabulary.len().min(5) {
        let tail = head + 1;
        let ranked: Vec<String> = report
            .model
            .predict(head, tail, 2)?
            .into_iter()
            .map(|(r, p)| format!("{} ({:.3})", report.relations.name(r).unwrap_or("?"), p))
            .collect();
        println!(
            "  ({}, {}): {}",
            report.vocabulary.label(head).unwrap_or("?"),
            report.vocabulary.label(tail).unwrap_or("?"),
            ranked.join(", ")
        );
    }

    println!("\nNearest neighbours:");
    for index in 1..=report.vocabulary.len().min(5) {
        let label = report.vocabulary.label(index).unwrap_or("?");
        let neighbours: Vec<String> = report
            .model
            .nearest(index, 3)?
            .into_iter()
            .map(|(i, sim)| format!("{} ({:.3})", report.vocabulary.label(i).unwrap_or("?"), sim))
            .collect();
        println!("  {}: {}", label, neighbours.join(", "));
    }

    Ok(())
}
