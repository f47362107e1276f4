//! Execution engine - refresh and apply with UI integration

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use reconcile::{
    ApplyResult, AttributeRecord, Error, ExecuteSummary, NewState, PlannedAction, Request,
    ResourceKind, apply, retry_safe,
};
use std::sync::{Arc, Mutex};

use super::AdapterSet;
use super::differ::display_plan;
use super::planner::{Plan, PlannedChange, Target, matches_filter};
use crate::manifest::Address;
use crate::retry::{LogCallback, RetryConfig, with_retry};
use crate::state::StateFile;

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Hide the progress bar
    pub quiet: bool,
    /// Backoff for transient failures of retry-safe operations
    pub retry: RetryConfig,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            yes: false,
            quiet: false,
            retry: RetryConfig::default(),
        }
    }
}

/// What happened to one instance
#[derive(Debug, Clone)]
pub struct Outcome {
    pub address: Address,
    pub result: ApplyResult,
    /// State to record; `None` leaves the persisted entry untouched
    pub new_state: Option<NewState>,
    pub advice: Option<&'static str>,
}

impl Outcome {
    fn new(address: &Address, result: ApplyResult, new_state: Option<NewState>) -> Self {
        Self {
            address: address.clone(),
            result,
            new_state,
            advice: None,
        }
    }

    fn failed(address: &Address, error: &Error, new_state: Option<NewState>) -> Self {
        Self {
            address: address.clone(),
            result: ApplyResult::Failed {
                error: error.to_string(),
            },
            new_state,
            advice: Some(error.advice()),
        }
    }
}

// ============================================================================
// Single-instance operations
// ============================================================================

/// Run one request, retrying transient failures when the operation is safe
/// to repeat.
pub fn run_request(
    adapters: &dyn AdapterSet,
    kind: ResourceKind,
    request: Request,
    retry: &RetryConfig,
) -> reconcile::Result<NewState> {
    let no_retry = RetryConfig::no_retry();
    let config = if retry_safe(kind.policy(), request.operation()) {
        retry
    } else {
        &no_retry
    };

    with_retry(config, Some(&LogCallback), || {
        apply(kind, adapters.adapter(kind), request.clone())
    })
}

/// Reconcile one planned change. Steps for one instance run in order.
pub fn reconcile_change(
    adapters: &dyn AdapterSet,
    change: &PlannedChange,
    retry: &RetryConfig,
) -> Outcome {
    let address = &change.address;
    let kind = address.kind;
    let run = |request| run_request(adapters, kind, request, retry);

    match (change.action(), &change.prior, &change.desired) {
        (PlannedAction::NoChange, ..) => Outcome::new(address, ApplyResult::NoChange, None),
        (PlannedAction::Create, _, Some(desired)) => match run(Request::Create {
            desired: desired.clone(),
        }) {
            Ok(state) => Outcome::new(address, ApplyResult::Created, Some(state)),
            Err(e) => Outcome::failed(address, &e, None),
        },
        (PlannedAction::Update, Some(prior), Some(desired)) => match run(Request::Update {
            prior: prior.clone(),
            desired: desired.clone(),
        }) {
            Ok(state) => Outcome::new(address, ApplyResult::Updated, Some(state)),
            Err(e) => Outcome::failed(address, &e, None),
        },
        (PlannedAction::Replace, Some(prior), Some(desired)) => {
            if let Err(e) = run(Request::Delete {
                prior: prior.clone(),
            }) {
                return Outcome::failed(address, &e, None);
            }
            match run(Request::Create {
                desired: desired.clone(),
            }) {
                Ok(state) => Outcome::new(address, ApplyResult::Replaced, Some(state)),
                // The old instance is gone either way
                Err(e) => Outcome::failed(address, &e, Some(NewState::Clear)),
            }
        }
        (PlannedAction::Delete, Some(prior), _) => match run(Request::Delete {
            prior: prior.clone(),
        }) {
            Ok(state) => Outcome::new(address, ApplyResult::Deleted, Some(state)),
            Err(e) => Outcome::failed(address, &e, None),
        },
        (action, ..) => Outcome::new(
            address,
            ApplyResult::Skipped {
                reason: format!("cannot {action} without the required state"),
            },
            None,
        ),
    }
}

/// Read one tracked instance
pub fn refresh_entry(
    adapters: &dyn AdapterSet,
    address: &Address,
    prior: &AttributeRecord,
    retry: &RetryConfig,
) -> Outcome {
    let request = Request::Read {
        prior: prior.clone(),
    };
    match run_request(adapters, address.kind, request, retry) {
        Ok(NewState::Clear) => Outcome::new(address, ApplyResult::Drifted, Some(NewState::Clear)),
        Ok(state) => Outcome::new(address, ApplyResult::NoChange, Some(state)),
        Err(e) => Outcome::failed(address, &e, None),
    }
}

// ============================================================================
// Parallel execution
// ============================================================================

fn progress_bar(len: usize, label: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.set_prefix(label.to_string());
    pb
}

/// Run `work` over `items` on a pool of `jobs` threads
fn run_parallel<T, F>(
    items: &[T],
    jobs: usize,
    label: &str,
    quiet: bool,
    work: F,
) -> Result<Vec<Outcome>>
where
    T: Sync,
    F: Fn(&T) -> Outcome + Sync + Send,
{
    let pb = progress_bar(items.len(), label, quiet);
    let outcomes: Arc<Mutex<Vec<Outcome>>> = Arc::new(Mutex::new(Vec::new()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("Failed to create apply thread pool")?;

    pool.install(|| {
        items.par_iter().for_each(|item| {
            let outcome = work(item);

            let symbol = match &outcome.result {
                ApplyResult::NoChange => "○",
                ApplyResult::Failed { .. } => "✗",
                ApplyResult::Skipped { .. } => "⊘",
                ApplyResult::Drifted => "⚠",
                _ => "✓",
            };
            pb.set_message(format!("{} {}", symbol, outcome.address));
            pb.inc(1);

            push_outcome(&outcomes, outcome);
        });
    });

    pb.finish_and_clear();

    let mut collected = into_outcomes(outcomes)?;
    collected.sort_by(|a, b| a.address.cmp(&b.address));
    Ok(collected)
}

fn push_outcome(outcomes: &Arc<Mutex<Vec<Outcome>>>, outcome: Outcome) {
    match outcomes.lock() {
        Ok(mut locked) => locked.push(outcome),
        Err(poisoned) => poisoned.into_inner().push(outcome),
    }
}

fn into_outcomes(outcomes: Arc<Mutex<Vec<Outcome>>>) -> Result<Vec<Outcome>> {
    let mutex = Arc::try_unwrap(outcomes)
        .map_err(|_| anyhow::anyhow!("Failed to collect outcomes: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

/// Write outcomes into state and tally them
pub fn record_outcomes(state: &mut StateFile, outcomes: &[Outcome]) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();
    for outcome in outcomes {
        summary.add_result(&outcome.result);
        if let Some(new_state) = &outcome.new_state {
            state.apply_new_state(&outcome.address, new_state.clone());
        }
    }
    summary
}

// ============================================================================
// Entry points
// ============================================================================

/// Read every tracked instance matching `target` and record what was found.
///
/// Drifted instances are dropped from state. Failed reads leave their entry
/// untouched.
pub fn refresh(
    adapters: &dyn AdapterSet,
    state: &mut StateFile,
    target: Option<&Target>,
    opts: &ExecuteOptions,
) -> Result<Vec<Outcome>> {
    let entries: Vec<(Address, AttributeRecord)> = state
        .entries()
        .filter(|(address, _)| matches_filter(address, target))
        .map(|(address, entry)| (address, entry.attributes.clone()))
        .collect();

    if entries.is_empty() {
        return Ok(Vec::new());
    }

    log::info!("Refreshing {} resources", entries.len());
    let outcomes = run_parallel(&entries, opts.jobs, "Refreshing", opts.quiet, |(address, prior)| {
        refresh_entry(adapters, address, prior, &opts.retry)
    })?;

    record_outcomes(state, &outcomes);
    Ok(outcomes)
}

/// Show the plan, confirm, and reconcile every pending change
pub fn execute(
    adapters: &dyn AdapterSet,
    plan: &Plan,
    state: &mut StateFile,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    display_plan(plan);

    let pending = plan.pending();
    if pending.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(ExecuteSummary::default());
    }

    if !opts.yes && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(ExecuteSummary {
            skipped: pending.len(),
            ..Default::default()
        });
    }

    println!();
    println!("  {} Applying {} changes...", "→".cyan(), pending.len());

    let outcomes = run_parallel(&pending, opts.jobs, "Applying", opts.quiet, |change| {
        reconcile_change(adapters, change, &opts.retry)
    })?;

    let summary = record_outcomes(state, &outcomes);
    print_failures(&outcomes);
    print_summary(&summary);

    Ok(summary)
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

fn print_failures(outcomes: &[Outcome]) {
    for outcome in outcomes {
        if let ApplyResult::Failed { error } = &outcome.result {
            println!();
            println!("  {} {}", "✗".red(), outcome.address.to_string().bold());
            println!("    {error}");
            if let Some(advice) = outcome.advice {
                println!("    {}", advice.dimmed());
            }
        }
    }
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Apply complete!", "✓".green().bold());
    } else {
        println!("  {} Apply finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} updated", summary.updated);
    }
    if summary.replaced > 0 {
        println!("    • {} replaced", summary.replaced);
    }
    if summary.deleted > 0 {
        println!("    • {} deleted", summary.deleted);
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}
