//! Runs the per-variable analysis over all variables of a formula.
//!
//! The variables are split into contiguous ranges, one per worker thread.
//! Every worker owns a backbone oracle that was loaded and prepared on the
//! coordinating thread before any worker started; the only state the
//! workers share is a progress counter.

use std::{
    any::Any,
    iter::zip,
    ops::Range,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::Duration,
};

use crate::{
    backbone::{BackboneOracle, SolverOracle},
    classify::{Class, Classification},
    config::Config,
    error::{Error, Result},
    io::{self, graph::Labels, graph::OutputPaths},
    misc::log::targets,
    partition::{available_threads, partition, validate_threads},
    process::{process_variable, Edges},
    types::{Lit, Var},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a successful run.
#[derive(Debug)]
pub struct Analysis {
    pub var_count: usize,
    pub clause_count: usize,
    pub global_backbone: Vec<Lit>,
    /// Variables true in every model.
    pub core: Vec<Var>,
    /// Variables false in every model.
    pub dead: Vec<Var>,
    pub edges: Edges,
    pub paths: OutputPaths,
}

/// Analyzes `config.input` with the built-in oracle and writes the graphs.
pub fn analyze(config: &Config) -> Result<Analysis> {
    analyze_with(config, SolverOracle::new)
}

/// Like [`analyze`], with every oracle instance created by `factory`.
pub fn analyze_with<O, F>(config: &Config, factory: F) -> Result<Analysis>
where
    O: BackboneOracle,
    F: Fn() -> O,
{
    let problem = io::load_problem(&config.input).map_err(|source| Error::Load {
        path: config.input.clone(),
        source,
    })?;
    let mut primary = factory();
    primary.load(&config.input)?;
    let var_count = primary.max_variable();
    log::info!(
        target: targets::ENGINE,
        "Loaded {} with {var_count} variables and {} clauses",
        config.input.display(),
        problem.clauses.len()
    );

    primary.prepare(&config.strategy)?;
    let global_backbone = primary.global_backbone()?.into_literals();
    let classification = Classification::new(
        &global_backbone,
        var_count,
        &problem.names,
        config.filter_auxiliary,
    )?;
    let core = classification.vars_of(Class::Core);
    let dead = classification.vars_of(Class::Dead);
    log::info!(
        target: targets::ENGINE,
        "Global backbone: {} core, {} dead, {} auxiliary",
        core.len(),
        dead.len(),
        classification.aux_count()
    );

    let vars = classification.vars_to_process();
    let threads = validate_threads(config.threads, available_threads())?.min(vars.len());
    let ranges = partition(vars.len(), threads);

    let mut oracles = Vec::with_capacity(threads);
    if threads > 0 {
        oracles.push(primary);
    }
    while oracles.len() < threads {
        let mut oracle = factory();
        oracle.load(&config.input)?;
        oracle.prepare(&config.strategy)?;
        oracles.push(oracle);
    }
    log::debug!(target: targets::ENGINE, "Initialized {threads} oracles");

    let edges = run(oracles, ranges, &vars, &classification)?;
    log::info!(
        target: targets::ENGINE,
        "Found {} requires and {} excludes edges",
        edges.requires.len(),
        edges.excludes.len()
    );

    let paths = config.output_paths();
    let labels = Labels::new(&problem.names, &classification);
    paths.write(var_count, &labels, &edges)?;

    Ok(Analysis {
        var_count,
        clause_count: problem.clauses.len(),
        global_backbone,
        core,
        dead,
        edges,
        paths,
    })
}

/// Processes every range on its own thread and merges the edges in
/// worker order. Any failed worker fails the whole run.
fn run<O: BackboneOracle>(
    oracles: Vec<O>,
    ranges: Vec<Range<usize>>,
    vars: &[Var],
    classification: &Classification,
) -> Result<Edges> {
    let progress = AtomicUsize::new(0);

    let outcomes: Vec<Result<Edges>> = thread::scope(|scope| {
        let handles: Vec<_> = zip(oracles, ranges)
            .enumerate()
            .map(|(index, (mut oracle, range))| {
                let vars = &vars[range];
                let progress = &progress;
                scope.spawn(move || work(index, &mut oracle, vars, classification, progress))
            })
            .collect();

        let mut reported = 0;
        while !handles.iter().all(|handle| handle.is_finished()) {
            thread::sleep(POLL_INTERVAL);
            let done = progress.load(Ordering::Relaxed);
            if done != reported {
                log::info!(target: targets::ENGINE, "Processed {done}/{} variables", vars.len());
                reported = done;
            }
        }

        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| {
                handle.join().unwrap_or_else(|payload| {
                    Err(Error::Worker {
                        index,
                        message: panic_message(payload.as_ref()),
                    })
                })
            })
            .collect()
    });

    let mut edges = Edges::default();
    for mut local in outcomes.into_iter().collect::<Result<Vec<_>>>()? {
        edges.append(&mut local);
    }
    Ok(edges)
}

fn work<O: BackboneOracle>(
    index: usize,
    oracle: &mut O,
    vars: &[Var],
    classification: &Classification,
    progress: &AtomicUsize,
) -> Result<Edges> {
    log::debug!(target: targets::WORKER, "Worker {index} takes {} variables", vars.len());

    let mut edges = Edges::default();
    for &var in vars {
        process_variable(oracle, var, classification, &mut edges).map_err(|e| Error::Worker {
            index,
            message: format!("variable {var}: {e}"),
        })?;
        progress.fetch_add(1, Ordering::Relaxed);
    }

    log::debug!(target: targets::WORKER, "Worker {index} done");
    Ok(edges)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_owned()
    }
}
