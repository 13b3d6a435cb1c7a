//! Run command - one synchronous decision from the terminal

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::observability;

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    /// The decision to analyze
    pub query: String,

    /// Print every intermediate stage output, not just the selection
    #[arg(long)]
    pub full: bool,
}

/// Execute one decision synchronously and print the summary
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    observability::init_tracing(&config.logging);

    let state = crate::build_app_state(&config).await?;

    info!(query = %args.query, "Running decision workflow");
    let summary = state.run_manager.run_sync(&args.query).await?;

    println!("Selected decision:\n{}\n", summary.selected_decision);
    println!("Why:\n{}\n", summary.selected_decision_comment);
    println!("Alternative:\n{}\n", summary.alternative_decision);
    println!("Why:\n{}", summary.alternative_decision_comment);

    if args.full {
        println!("\n--- Full analysis ---");
        println!("Trigger:\n{}\n", summary.trigger);
        println!("Root cause:\n{}\n", summary.root_cause);
        println!("Scope:\n{}\n", summary.scope);
        println!("Draft:\n{}\n", summary.draft);
        println!("Goals:\n{}\n", summary.goals);
        println!("Information needs:\n{}\n", summary.information_needs);
        if let Some(info) = &summary.retrieved_info {
            println!("Retrieved information:\n{}\n", info);
        }
        if let Some(draft) = &summary.updated_draft {
            println!("Updated draft:\n{}\n", draft);
        }
        println!("Alternatives:\n{}", summary.alternatives);
    }

    Ok(())
}
