mod clients;
mod config;
mod deploy;
mod retry;
mod runbook;
mod sdk;
mod teardown;
mod web;

use std::process::exit;

use clap::{Parser, Subcommand};

use crate::clients::AwsClients;
use crate::config::{CommonArgs, DeployArgs, SimulateLowStockArgs, UploadArgs};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "inventory",
    about = "Deploy and operate the serverless inventory pipeline",
    long_about = "Provisions the uploads bucket, inventory table, Lambda functions,\n\
                  HTTP API, low stock topic and web page, and drives the runbook\n\
                  steps against them. Settings fall back to the environment and .env."
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update every resource of the pipeline
    Deploy(DeployArgs),
    /// Upload an inventory CSV to the uploads bucket
    Upload(UploadArgs),
    /// Write a low stock item directly to the table to trigger an alert
    SimulateLowStock(SimulateLowStockArgs),
    /// Delete every resource created by deploy
    Teardown,
}

// ── helpers ────────────────────────────────────────────────────────

pub(crate) fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("ERROR: {message}");
    exit(1);
}

// ── entry point ────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let names = cli.common.resource_names().unwrap_or_else(|error| fail(error));
    let clients = AwsClients::load(&cli.common.region).await;

    match cli.command {
        Commands::Deploy(args) => {
            let settings = args.settings().unwrap_or_else(|error| fail(error));
            match deploy::run_deploy(&clients, &names, &settings).await {
                Ok(outputs) => println!("{}", deploy::render_summary(&outputs)),
                Err(error) => fail(error),
            }
        }
        Commands::Upload(args) => {
            step("Upload CSV");
            match runbook::upload_csv(&clients, &names, &args).await {
                Ok(location) => {
                    println!("Uploaded {} to {location}", args.file.display());
                    println!("The load function imports it into {} within seconds.", names.table);
                }
                Err(error) => fail(error),
            }
        }
        Commands::SimulateLowStock(args) => {
            step("Simulate low stock");
            match runbook::simulate_low_stock(&clients, &names, &args).await {
                Ok(item) => {
                    println!("Wrote {item} to {}", names.table);
                    println!("Check the subscribed inbox for the low stock alert.");
                }
                Err(error) => fail(error),
            }
        }
        Commands::Teardown => {
            let report = teardown::run_teardown(&clients, &names).await;
            println!("{}", report.render());
            if !report.succeeded() {
                exit(1);
            }
        }
    }
}
