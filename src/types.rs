pub type Lit = i32;

pub type Var = usize;

pub type Clause = Vec<Lit>;

pub fn to_var(lit: Lit) -> Var {
    debug_assert_ne!(lit, 0);
    lit.unsigned_abs() as Var
}

#[derive(Clone, Debug, Default)]
pub struct Problem {
    pub var_count: usize,
    pub clauses: Vec<Clause>,
    /// Name tokens attached to variables by `c <var> <name>...` comments,
    /// indexed by variable (index 0 unused).
    pub names: Vec<Option<Vec<String>>>,
}

impl Problem {
    pub fn new(var_count: usize, clauses: Vec<Clause>) -> Self {
        Self {
            var_count,
            clauses,
            names: vec![None; var_count + 1],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Solution {
    Sat { model: Vec<Lit> },
    Unsat,
}
