use std::path::PathBuf;

use clap::Args;

use curation_ai::config::AppConfig;
use curation_ai::error::AppError;
use curation_ai::workflows::routing::Candidate;

use crate::infra::build_orchestrator;

#[derive(Args, Debug)]
pub(crate) struct RouteBatchArgs {
    /// Path to a JSON file holding an array of analyzed candidates
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Process candidates one at a time instead of fanning out
    #[arg(long)]
    pub(crate) sequential: bool,
    /// Override the configured worker-pool size
    #[arg(long)]
    pub(crate) max_concurrency: Option<usize>,
}

/// Offline entry point for routing a pre-analyzed feed, useful for policy
/// dry-runs before a rule change ships.
pub(crate) async fn run_route_batch(args: RouteBatchArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(max_concurrency) = args.max_concurrency {
        config.routing.max_concurrency = max_concurrency;
    }

    let raw = std::fs::read_to_string(&args.input)?;
    let candidates: Vec<Candidate> = serde_json::from_str(&raw)
        .map_err(|err| AppError::InvalidInput(format!("candidate file: {err}")))?;

    let orchestrator = build_orchestrator(&config.routing);
    let (updated, batch) = orchestrator
        .process_batch(candidates, !args.sequential)
        .await;

    println!(
        "routed {} candidates in {}ms ({} ok, {} failed)",
        batch.total, batch.stats.duration_ms, batch.successful, batch.failed
    );
    for (candidate, result) in updated.iter().zip(&batch.results) {
        match (&result.transition, &result.error) {
            (Some(transition), _) => println!(
                "  {:<14} {} -> {}  [{}]",
                candidate.id,
                transition.from,
                transition.to,
                result
                    .priority
                    .as_ref()
                    .map(|priority| priority.level.label())
                    .unwrap_or("-"),
            ),
            (None, Some(error)) => println!("  {:<14} failed: {error}", candidate.id),
            (None, None) => println!("  {:<14} no transition recorded", candidate.id),
        }
    }

    let statistics = orchestrator
        .audit()
        .statistics(None, None)
        .map_err(|err| AppError::Workflow(err.into()))?;
    println!(
        "audit: {} entries, error rate {:.1}%",
        statistics.total,
        statistics.error_rate * 100.0
    );

    Ok(())
}
