//! Backbone computation on top of the incremental [`Solver`].
//!
//! The analysis talks to backbone computation only through
//! [`BackboneOracle`]. An oracle is stateful and holds no locks, so every
//! thread needs an instance of its own, loaded and prepared before the
//! thread starts.

use std::{path::Path, str::FromStr};

use thiserror::Error as ThisError;

use crate::{
    error::{Error, Result},
    io,
    misc::log::targets,
    solver::Solver,
    types::{to_var, Lit, Problem, Solution, Var},
};

/// Literals true in every model, at most one per variable, ordered by variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Backbone(Vec<Lit>);

impl Backbone {
    pub fn literals(&self) -> &[Lit] {
        &self.0
    }

    /// Lookup table from variable to its backbone literal, `0` where the
    /// variable is not in the backbone.
    pub fn dense(&self, var_count: usize) -> Vec<Lit> {
        let mut table = vec![0; var_count + 1];
        for &lit in &self.0 {
            table[to_var(lit)] = lit;
        }
        table
    }

    pub fn into_literals(self) -> Vec<Lit> {
        self.0
    }
}

impl From<Vec<Lit>> for Backbone {
    fn from(mut lits: Vec<Lit>) -> Self {
        lits.sort_by_key(|&lit| to_var(lit));
        lits.dedup();
        Backbone(lits)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Check candidates one by one, dropping every candidate a
    /// counter-model refutes and accepting root-level facts outright.
    OneByOne,
    /// Check every candidate of the first model one by one.
    WithoutRefinement,
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "one" => Ok(Strategy::OneByOne),
            "without" => Ok(Strategy::WithoutRefinement),
            _ => Err(Error::Strategy(name.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum OracleError {
    #[error("no formula loaded")]
    NotLoaded,
    #[error("no detection strategy prepared")]
    NotPrepared,
    /// No model exists (under the given assumption).
    #[error("the formula is unsatisfiable")]
    Unsatisfiable,
    #[error("literal {0} is outside the formula")]
    UnknownVariable(Lit),
}

/// Computes backbones of one formula.
///
/// An instance is loaded and prepared once, then queried any number of
/// times. Instances are not shared between threads.
pub trait BackboneOracle: Send {
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Selects the detection strategy by name.
    fn prepare(&mut self, strategy: &str) -> Result<()>;

    fn max_variable(&self) -> usize;

    fn global_backbone(&mut self) -> Result<Backbone>;

    /// Backbone of the formula with `lit` temporarily asserted.
    fn backbone_under_assumption(&mut self, lit: Lit) -> Result<Backbone>;
}

/// [`BackboneOracle`] backed by the crate's CDCL solver.
#[derive(Default)]
pub struct SolverOracle {
    solver: Option<Solver>,
    strategy: Option<Strategy>,
}

impl SolverOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_problem(problem: Problem) -> Self {
        Self {
            solver: Some(Solver::new(problem)),
            strategy: None,
        }
    }

    fn ready(&mut self) -> Result<(&mut Solver, Strategy)> {
        let solver = self.solver.as_mut().ok_or(OracleError::NotLoaded)?;
        let strategy = self.strategy.ok_or(OracleError::NotPrepared)?;
        Ok((solver, strategy))
    }
}

impl BackboneOracle for SolverOracle {
    fn load(&mut self, path: &Path) -> Result<()> {
        let problem = io::load_problem(path).map_err(|source| Error::Load {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            target: targets::ORACLE,
            "Loaded {} variables and {} clauses",
            problem.var_count,
            problem.clauses.len()
        );
        self.solver = Some(Solver::new(problem));
        Ok(())
    }

    fn prepare(&mut self, strategy: &str) -> Result<()> {
        self.strategy = Some(strategy.parse()?);
        Ok(())
    }

    fn max_variable(&self) -> usize {
        self.solver.as_ref().map_or(0, Solver::var_count)
    }

    fn global_backbone(&mut self) -> Result<Backbone> {
        let (solver, strategy) = self.ready()?;
        Ok(compute(solver, &[], strategy)?)
    }

    fn backbone_under_assumption(&mut self, lit: Lit) -> Result<Backbone> {
        let (solver, strategy) = self.ready()?;
        if lit == 0 || to_var(lit) > solver.var_count() {
            return Err(OracleError::UnknownVariable(lit).into());
        }
        Ok(compute(solver, &[lit], strategy)?)
    }
}

/// Backbone of the solver's formula under `assumptions`.
fn compute(
    solver: &mut Solver,
    assumptions: &[Lit],
    strategy: Strategy,
) -> std::result::Result<Backbone, OracleError> {
    let Solution::Sat { model } = solver.solve_with(assumptions) else {
        return Err(OracleError::Unsatisfiable);
    };

    // candidates[var] is the literal still believed to be forced, 0 once refuted
    let mut candidates: Vec<Lit> = vec![0; solver.var_count() + 1];
    for &lit in &model {
        candidates[to_var(lit)] = lit;
    }

    let mut backbone = vec![];
    let mut query = assumptions.to_vec();
    query.push(0);
    let mut checks = 0;

    for var in 1..candidates.len() {
        let lit = candidates[var];
        if lit == 0 {
            continue;
        }
        if assumptions.contains(&lit)
            || (strategy == Strategy::OneByOne && solver.fixed(lit))
        {
            backbone.push(lit);
            continue;
        }

        if let Some(last) = query.last_mut() {
            *last = -lit;
        }
        checks += 1;
        match solver.solve_with(&query) {
            Solution::Unsat => backbone.push(lit),
            Solution::Sat { model } if strategy == Strategy::OneByOne => {
                refine(&mut candidates, &model);
            }
            Solution::Sat { .. } => (),
        }
    }

    log::trace!(
        target: targets::ORACLE,
        "Backbone under {assumptions:?}: {} literals after {checks} checks",
        backbone.len()
    );

    Ok(Backbone(backbone))
}

/// Drops every candidate the counter-model `model` assigns differently.
fn refine(candidates: &mut [Lit], model: &[Lit]) {
    for &lit in model {
        let var: Var = to_var(lit);
        if candidates[var] != lit {
            candidates[var] = 0;
        }
    }
}
