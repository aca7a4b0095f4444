use crate::{
    error::{Error, Result},
    types::{to_var, Lit, Var},
};

/// Name prefix of variables introduced by CNF transformations.
pub const AUX_PREFIX: &str = "aux_";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    /// True in every model.
    Core,
    /// False in every model.
    Dead,
    Free,
}

/// Dense per-variable view of the global backbone, computed once per run
/// and shared read-only by every worker.
#[derive(Clone, Debug)]
pub struct Classification {
    classes: Vec<Class>,
    aux: Vec<bool>,
}

impl Classification {
    /// Auxiliary variables are only marked when `filter_auxiliary` is set;
    /// otherwise every variable takes part in the analysis.
    pub fn new(
        backbone: &[Lit],
        var_count: usize,
        names: &[Option<Vec<String>>],
        filter_auxiliary: bool,
    ) -> Result<Self> {
        let mut classes = vec![Class::Free; var_count + 1];
        for &lit in backbone {
            let var = to_var(lit);
            let class = if lit > 0 { Class::Core } else { Class::Dead };
            match classes[var] {
                Class::Free => classes[var] = class,
                seen if seen == class => (),
                _ => return Err(Error::Contradiction(var)),
            }
        }

        let mut aux = vec![false; var_count + 1];
        if filter_auxiliary {
            for (var, tokens) in names.iter().enumerate().take(var_count + 1) {
                aux[var] = tokens
                    .as_ref()
                    .and_then(|tokens| tokens.first())
                    .is_some_and(|first| first.starts_with(AUX_PREFIX));
            }
        }

        Ok(Self { classes, aux })
    }

    pub fn var_count(&self) -> usize {
        self.classes.len() - 1
    }

    pub fn class(&self, var: Var) -> Class {
        self.classes[var]
    }

    pub fn is_aux(&self, var: Var) -> bool {
        self.aux[var]
    }

    /// Variables of `class`, ascending.
    pub fn vars_of(&self, class: Class) -> Vec<Var> {
        (1..=self.var_count())
            .filter(|&var| self.classes[var] == class)
            .collect()
    }

    pub fn aux_count(&self) -> usize {
        self.aux.iter().filter(|&&aux| aux).count()
    }

    /// Variables to run the per-variable analysis on, ascending.
    pub fn vars_to_process(&self) -> Vec<Var> {
        (1..=self.var_count()).filter(|&var| !self.aux[var]).collect()
    }
}
