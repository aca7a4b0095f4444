mod activity;
mod assignment;
mod branching;
mod map;
mod restart;

use crate::{
    solver::assignment::Reason,
    types::{to_var, Clause, Lit, Problem, Solution, Var},
};

use self::{
    activity::ClauseTracker, assignment::Assignment, branching::Evsids, map::LitMap,
    restart::Restarts,
};

/// Incremental CDCL solver.
///
/// Clauses are fixed at construction. [`Solver::solve_with`] may be called
/// any number of times with different assumptions; learnt clauses and
/// root-level facts carry over between calls.
pub struct Solver {
    var_count: usize,

    clauses: Vec<Clause>,
    min_clause_count: usize,
    max_learnt: f64,

    assignment: Assignment,

    watched: LitMap<Vec<usize>>,
    prop_head: usize,

    evsids: Evsids,
    clause_tracker: ClauseTracker,

    restarts: Restarts,

    // the clauses alone are unsatisfiable
    inconsistent: bool,
}

impl Solver {
    pub fn new(problem: Problem) -> Self {
        let Problem {
            var_count, clauses, ..
        } = problem;

        let mut solver = Solver {
            var_count,
            clauses: Vec::with_capacity(clauses.len()),
            min_clause_count: 0,
            max_learnt: clauses.len() as f64 / 3.0,
            assignment: Assignment::new(var_count),
            watched: LitMap::<Vec<usize>>::new(var_count),
            prop_head: 0,
            evsids: Evsids::new(var_count),
            clause_tracker: ClauseTracker::new(),
            restarts: Restarts::new(16),
            inconsistent: false,
        };

        for mut clause in clauses {
            clause.sort();
            clause.dedup();
            // tautologies constrain nothing
            if clause.iter().any(|&lit| clause.binary_search(&-lit).is_ok()) {
                continue;
            }
            solver.add(clause);
        }
        solver.min_clause_count = solver.clauses.len();
        solver.max_learnt = solver.max_learnt.max(100.0);

        solver.assert_units();

        solver
    }

    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// True if `lit` holds in every model, as established so far at level 0.
    pub fn fixed(&self, lit: Lit) -> bool {
        self.assignment.eval(lit) == Some(true) && self.assignment.level(lit) == Some(0)
    }

    fn assert_units(&mut self) {
        for (i, clause) in self.clauses.iter().enumerate() {
            match clause[..] {
                [] => {
                    self.inconsistent = true;
                    return;
                }
                [lit] => match self.assignment.eval(lit) {
                    None => self
                        .assignment
                        .set(lit, Reason::Propagation { i_clause: i }),
                    Some(false) => {
                        self.inconsistent = true;
                        return;
                    }
                    Some(true) => (),
                },
                _ => (),
            }
        }

        if self.propagate().is_some() {
            self.inconsistent = true;
        }
    }

    fn add(&mut self, clause: Clause) -> usize {
        let i = self.clauses.len();
        if let [lit0, lit1, ..] = clause[..] {
            self.watched[lit0].push(i);
            self.watched[lit1].push(i);
        }
        self.clauses.push(clause);
        self.clause_tracker.add();
        i
    }

    fn remove(&mut self, i_clause: usize) -> Option<Clause> {
        for &lit in self.assignment.trail() {
            if let Some(Reason::Propagation { i_clause: i }) = self.assignment.reason(lit) {
                if i == i_clause {
                    // removal blocked
                    return None;
                }
            }
        }

        for &lit in &self.clauses[i_clause] {
            self.watched[lit].retain(|&i| i != i_clause);
        }

        let i_last = self.clauses.len() - 1;
        for &lit in &self.clauses[i_last] {
            for i in &mut self.watched[lit] {
                if *i == i_last {
                    *i = i_clause;
                }
            }
        }
        self.assignment.rename_clause(i_last, i_clause);

        self.clause_tracker.swap_remove(i_clause);
        Some(self.clauses.swap_remove(i_clause))
    }

    fn prune(&mut self) {
        let pivot = self.clause_tracker.select_pivot(self.min_clause_count);

        let mut i = self.min_clause_count;
        while i < self.clauses.len() {
            if self.clause_tracker.get_activity(i) < pivot && self.remove(i).is_some() {
                continue;
            }
            i += 1;
        }
    }

    fn propagate(&mut self) -> Option<usize> {
        while let Some(lit) = self.assignment.trail().get(self.prop_head) {
            let lit = -lit;

            let mut i = 0;
            'clause: while i < self.watched[lit].len() {
                let c = self.watched[lit][i];
                let clause = &mut self.clauses[c];

                // Uses "implicit" watches, i.e., the two watched literals
                // are always stored at index 0 and 1. (Borrowed from minisat.)

                if clause[1] != lit {
                    clause.swap(0, 1);
                }
                debug_assert_eq!(clause[1], lit);

                for j in 0..clause.len() {
                    match self.assignment.eval(clause[j]) {
                        Some(true) => {
                            i += 1;
                            continue 'clause;
                        }
                        None if j != 0 => {
                            clause.swap(1, j);
                            debug_assert_ne!(clause[0], clause[1]);

                            self.watched[lit].swap_remove(i);
                            debug_assert!(!self.watched[clause[1]].contains(&c));
                            self.watched[clause[1]].push(c);

                            continue 'clause;
                        }
                        _ => (),
                    }
                }

                if self.assignment.eval(clause[0]).is_none() {
                    // unit clause
                    let unit_lit = clause[0];
                    self.assignment
                        .set(unit_lit, Reason::Propagation { i_clause: c });
                } else {
                    // conflict
                    return Some(c);
                }

                i += 1;
            }

            self.prop_head += 1;
        }

        None
    }

    // based on minisat's basic clause minimization
    fn simplify(&mut self, learnt: &mut Clause) {
        let mut i = 1;
        while i < learnt.len() {
            if let Some(Reason::Propagation { i_clause }) = self.assignment.reason(learnt[i]) {
                let remove = self.clauses[i_clause].iter().all(|&lit| {
                    learnt.contains(&lit)
                        || learnt.contains(&-lit)
                        || self.assignment.level(lit) == Some(0)
                });
                if remove {
                    learnt.swap_remove(i);
                    continue;
                }
            }
            i += 1;
        }
    }

    /// First-UIP analysis. Must not be called at level 0.
    fn analyze(&mut self, i_conflict: usize) -> (Clause, usize) {
        let mut learnt = self.clauses[i_conflict].clone();
        let last_level = self.assignment.last_level();
        debug_assert!(last_level > 0);

        self.clause_tracker.touch(i_conflict);

        let mut i_trail = self.assignment.trail().len();
        let i_assert = loop {
            for &lit in &learnt {
                self.evsids.touch(to_var(lit));
            }

            let mut iter = learnt
                .iter()
                .enumerate()
                .filter(|(_, &lit)| self.assignment.level(lit).unwrap() >= last_level);
            let (i, _) = iter.next().unwrap();
            if iter.next().is_none() {
                break i;
            }

            i_trail -= 1;
            let on_lit = self.assignment.trail()[i_trail];

            let i_reason = match self.assignment.reason(on_lit).unwrap() {
                Reason::Propagation { i_clause } => i_clause,
                Reason::Decision => unreachable!(),
            };
            let reason = &self.clauses[i_reason];
            debug_assert!(reason.contains(&on_lit));

            self.clause_tracker.touch(i_reason);

            let len_before = learnt.len();
            learnt.retain(|&lit| lit != -on_lit);
            if learnt.len() != len_before {
                // learnt contained -on_lit, finish the resolution
                learnt.extend(reason.iter().filter(|&&lit| lit != on_lit));
                // need to dedup to correctly determine #lits at a given level
                learnt.sort();
                learnt.dedup();
            }
        };

        learnt.swap(0, i_assert);

        self.simplify(&mut learnt);

        let backtrack_level = if learnt.len() == 1 {
            1
        } else {
            let (i_max, _) = learnt[1..]
                .iter()
                .enumerate()
                .max_by_key(|(_, &lit)| self.assignment.level(lit).unwrap())
                .unwrap();
            learnt.swap(1, i_max + 1);

            self.assignment.level(learnt[1]).unwrap() + 1
        };

        self.evsids.rescale();
        self.clause_tracker.rescale();

        (learnt, backtrack_level)
    }

    /// Reverts every decision, keeping level-0 facts.
    fn restart(&mut self) {
        if self.assignment.last_level() >= 1 {
            self.assignment.backtrack(1);
            self.prop_head = std::cmp::min(self.prop_head, self.assignment.trail().len());
        }
    }

    pub fn solve(&mut self) -> Solution {
        self.solve_with(&[])
    }

    /// Searches for a model in which every literal of `assumptions` holds.
    ///
    /// Assumptions are decided first, one per decision level, so a learnt
    /// clause never depends on them being permanent.
    pub fn solve_with(&mut self, assumptions: &[Lit]) -> Solution {
        if self.inconsistent {
            return Solution::Unsat;
        }
        self.restart();

        loop {
            if let Some(i_conflict) = self.propagate() {
                if self.assignment.last_level() == 0 {
                    self.inconsistent = true;
                    return Solution::Unsat;
                }
                self.restarts.conflict();

                let (learnt, level) = self.analyze(i_conflict);

                self.assignment.backtrack(level);
                self.prop_head = std::cmp::min(self.prop_head, self.assignment.trail().len());

                let lit_assert = learnt[0];
                let i_clause = self.add(learnt);
                self.assignment
                    .set(lit_assert, Reason::Propagation { i_clause });
                continue;
            }

            let learnt_count = self.clauses.len() - self.min_clause_count;
            let removable = learnt_count.saturating_sub(self.assignment.trail().len());
            if removable > self.max_learnt as usize {
                self.prune();
                self.max_learnt *= 1.001;
            }

            if self.restarts.due() {
                self.restart();
                continue;
            }

            if let Some(&lit) = assumptions.get(self.assignment.last_level()) {
                match self.assignment.eval(lit) {
                    Some(true) => self.assignment.open_level(),
                    Some(false) => return Solution::Unsat,
                    None => self.assignment.set(lit, Reason::Decision),
                }
                continue;
            }

            match self.evsids.choose(&self.assignment) {
                Some(lit) => self.assignment.set(lit, Reason::Decision),
                None => break,
            }
        }

        let mut model: Vec<Lit> = self.assignment.trail().to_vec();
        self.evsids.save_phases(&model);
        model.sort_by_key(|&lit| to_var(lit));
        Solution::Sat { model }
    }
}

/// Evaluates `clauses` under a total `model` (sorted by variable).
pub fn verify(clauses: &[Clause], model: &[Lit]) -> bool {
    let value = |var: Var| {
        model
            .binary_search_by_key(&var, |&lit| to_var(lit))
            .map(|i| model[i] > 0)
            .ok()
    };
    clauses.iter().all(|clause| {
        clause
            .iter()
            .any(|&lit| value(to_var(lit)) == Some(lit.is_positive()))
    })
}

#[cfg(test)]
mod tests {
    use crate::types::{Clause, Problem, Solution};

    use super::{verify, Solver};

    fn problem(clauses: Vec<Clause>) -> Problem {
        let var_count = clauses
            .iter()
            .flatten()
            .map(|lit| lit.unsigned_abs() as usize)
            .max()
            .unwrap_or(0);
        Problem::new(var_count, clauses)
    }

    fn check(clauses: Vec<Clause>, sat: bool) {
        let problem = problem(clauses);

        match Solver::new(problem.clone()).solve() {
            Solution::Sat { model } => {
                assert!(sat);
                assert_eq!(model.len(), problem.var_count);
                assert!(verify(&problem.clauses, &model));
            }
            Solution::Unsat => assert!(!sat),
        }
    }

    #[test]
    /// Formulas from the lecture.
    fn basic_sat() {
        let clauses = vec![vec![1, 2], vec![-1, 2], vec![-1, -2, 3], vec![-1, -2, -3]];
        check(clauses, true);

        let clauses = vec![
            vec![-1, -2, 3],
            vec![2, -1, 3],
            vec![1, -2, 3],
            vec![-3, 4, 5],
            vec![-3, 4, -5],
            vec![-3, -4, 5],
            vec![-3, -4, -5],
        ];
        check(clauses, true);
    }

    #[test]
    fn basic_unsat() {
        let clauses = vec![
            vec![1, 2],
            vec![-2, 3],
            vec![-2, -3],
            vec![-1, -2, -4],
            vec![-1, 2, -4],
            vec![-1, 2, 4],
        ];

        check(clauses, false);
    }

    #[test]
    /// Formulas with non-trivial propagation before the first decision.
    fn kickstart() {
        let clauses = vec![vec![1], vec![-1, 2], vec![-1, -2]];
        check(clauses, false);
    }

    #[test]
    fn tautologies_are_ignored() {
        check(vec![vec![1, -1], vec![-2]], true);
    }

    #[test]
    fn assumptions() {
        // 1 -> 2, 2 -> 3
        let mut solver = Solver::new(problem(vec![vec![-1, 2], vec![-2, 3]]));

        match solver.solve_with(&[1]) {
            Solution::Sat { model } => assert_eq!(model, vec![1, 2, 3]),
            Solution::Unsat => panic!("1 is satisfiable"),
        }
        assert_eq!(solver.solve_with(&[1, -3]), Solution::Unsat);
        assert_eq!(solver.solve_with(&[-3, 1]), Solution::Unsat);
        assert_eq!(solver.solve_with(&[2, -2]), Solution::Unsat);

        // failing assumptions leave the solver usable
        match solver.solve_with(&[-3]) {
            Solution::Sat { model } => assert_eq!(model, vec![-1, -2, -3]),
            Solution::Unsat => panic!("-3 is satisfiable"),
        }
    }

    #[test]
    fn repeated_assumption_opens_empty_level() {
        let mut solver = Solver::new(problem(vec![vec![-1, 2], vec![1, 2, 3]]));

        match solver.solve_with(&[1, 2]) {
            Solution::Sat { model } => {
                assert_eq!(&model[..2], &[1, 2]);
            }
            Solution::Unsat => panic!("1 and 2 are compatible"),
        }
    }

    #[test]
    fn root_facts() {
        let mut solver = Solver::new(problem(vec![vec![1], vec![-1, 2], vec![2, 3]]));
        assert!(solver.fixed(1));
        assert!(solver.fixed(2));
        assert!(!solver.fixed(3));
        assert!(!solver.fixed(-3));
        assert!(matches!(solver.solve(), Solution::Sat { .. }));
    }

    #[test]
    fn unsat_is_sticky() {
        let mut solver = Solver::new(problem(vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]]));
        assert_eq!(solver.solve(), Solution::Unsat);
        assert_eq!(solver.solve_with(&[1]), Solution::Unsat);
    }

    #[test]
    fn pigeons() {
        // 4 pigeons, 3 holes
        let var = |p: i32, h: i32| p * 3 + h + 1;
        let mut clauses = vec![];
        for p in 0..4 {
            clauses.push((0..3).map(|h| var(p, h)).collect());
        }
        for h in 0..3 {
            for p in 0..4 {
                for q in p + 1..4 {
                    clauses.push(vec![-var(p, h), -var(q, h)]);
                }
            }
        }
        check(clauses.clone(), false);

        // dropping one pigeon makes room
        check(clauses[1..].to_vec(), true);
    }
}
