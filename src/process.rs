use crate::{
    backbone::BackboneOracle,
    classify::{Class, Classification},
    error::Result,
    misc::log::targets,
    types::{Lit, Var},
};

/// Requires (directed) and excludes (undirected, smaller endpoint first)
/// edges in emission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Edges {
    pub requires: Vec<(Var, Var)>,
    pub excludes: Vec<(Var, Var)>,
}

impl Edges {
    pub fn append(&mut self, other: &mut Edges) {
        self.requires.append(&mut other.requires);
        self.excludes.append(&mut other.excludes);
    }
}

/// Extracts the edges of source variable `var` into `edges`.
///
/// Core and dead sources are skipped without querying the oracle: a core
/// source forces nothing beyond the global backbone and a dead one has no
/// model at all.
pub fn process_variable<O: BackboneOracle + ?Sized>(
    oracle: &mut O,
    var: Var,
    classification: &Classification,
    edges: &mut Edges,
) -> Result<()> {
    if classification.class(var) != Class::Free {
        log::trace!(target: targets::WORKER, "Skipping fixed variable {var}");
        return Ok(());
    }

    let backbone = oracle
        .backbone_under_assumption(var as Lit)?
        .dense(oracle.max_variable());
    let var_count = classification.var_count().min(backbone.len() - 1);

    for (i, &lit) in backbone.iter().enumerate().take(var_count + 1).skip(1) {
        if lit <= 0 || i == var || classification.is_aux(i) {
            continue;
        }
        if classification.class(i) == Class::Free {
            edges.requires.push((var, i));
        }
    }

    for (i, &lit) in backbone.iter().enumerate().take(var_count + 1).skip(var) {
        if lit >= 0 || classification.is_aux(i) {
            continue;
        }
        if classification.class(i) != Class::Dead && classification.class(var) != Class::Dead {
            edges.excludes.push((var, i));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::{
        backbone::{Backbone, BackboneOracle, OracleError},
        classify::Classification,
        error::Result,
        types::{to_var, Lit},
    };

    use super::{process_variable, Edges};

    /// Answers from a fixed table and records every query.
    struct Scripted {
        var_count: usize,
        answers: Vec<(Lit, Vec<Lit>)>,
        queries: Vec<Lit>,
    }

    impl BackboneOracle for Scripted {
        fn load(&mut self, _: &Path) -> Result<()> {
            Ok(())
        }

        fn prepare(&mut self, _: &str) -> Result<()> {
            Ok(())
        }

        fn max_variable(&self) -> usize {
            self.var_count
        }

        fn global_backbone(&mut self) -> Result<Backbone> {
            Ok(Backbone::default())
        }

        fn backbone_under_assumption(&mut self, lit: Lit) -> Result<Backbone> {
            self.queries.push(lit);
            self.answers
                .iter()
                .find(|(assumed, _)| *assumed == lit)
                .map(|(_, lits)| Backbone::from(lits.clone()))
                .ok_or_else(|| OracleError::Unsatisfiable.into())
        }
    }

    fn scripted(var_count: usize, answers: &[(Lit, &[Lit])]) -> Scripted {
        Scripted {
            var_count,
            answers: answers.iter().map(|(lit, b)| (*lit, b.to_vec())).collect(),
            queries: vec![],
        }
    }

    #[test]
    fn requires_and_excludes() {
        let mut oracle = scripted(5, &[(2, &[1, 2, -3, 4, -5])]);
        let classification = Classification::new(&[4, -5], 5, &[], false).unwrap();

        let mut edges = Edges::default();
        process_variable(&mut oracle, 2, &classification, &mut edges).unwrap();

        // 4 is core and 5 is dead, so neither yields an edge
        assert_eq!(edges.requires, vec![(2, 1)]);
        assert_eq!(edges.excludes, vec![(2, 3)]);
        assert_eq!(oracle.queries, vec![2]);
    }

    #[test]
    fn excludes_only_towards_larger_vars() {
        let mut oracle = scripted(3, &[(2, &[-1, 2, -3])]);
        let classification = Classification::new(&[], 3, &[], false).unwrap();

        let mut edges = Edges::default();
        process_variable(&mut oracle, 2, &classification, &mut edges).unwrap();
        assert!(edges.requires.is_empty());
        assert_eq!(edges.excludes, vec![(2, 3)]);
    }

    #[test]
    fn aux_targets_are_dropped() {
        let mut names = vec![None; 4];
        names[2] = Some(vec!["aux_0".to_owned()]);
        names[3] = Some(vec!["aux_1".to_owned()]);
        let mut oracle = scripted(3, &[(1, &[1, 2, -3])]);

        let classification = Classification::new(&[], 3, &names, true).unwrap();
        let mut edges = Edges::default();
        process_variable(&mut oracle, 1, &classification, &mut edges).unwrap();
        assert_eq!(edges, Edges::default());

        let classification = Classification::new(&[], 3, &names, false).unwrap();
        process_variable(&mut oracle, 1, &classification, &mut edges).unwrap();
        assert_eq!(edges.requires, vec![(1, 2)]);
        assert_eq!(edges.excludes, vec![(1, 3)]);
    }

    #[test]
    fn fixed_sources_are_not_queried() {
        let mut oracle = scripted(2, &[]);
        let classification = Classification::new(&[1, -2], 2, &[], false).unwrap();

        let mut edges = Edges::default();
        for var in 1..=2 {
            process_variable(&mut oracle, var, &classification, &mut edges).unwrap();
        }
        assert!(oracle.queries.is_empty());
        assert_eq!(edges, Edges::default());
    }

    #[test]
    fn oracle_errors_propagate() {
        let mut oracle = scripted(2, &[]);
        let classification = Classification::new(&[], 2, &[], false).unwrap();
        let mut edges = Edges::default();
        assert!(process_variable(&mut oracle, 1, &classification, &mut edges).is_err());
        assert_eq!(oracle.queries.iter().map(|&l| to_var(l)).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn append_keeps_order() {
        let mut first = Edges {
            requires: vec![(1, 2)],
            excludes: vec![(1, 3)],
        };
        let mut second = Edges {
            requires: vec![(4, 5)],
            excludes: vec![],
        };
        first.append(&mut second);
        assert_eq!(first.requires, vec![(1, 2), (4, 5)]);
        assert_eq!(first.excludes, vec![(1, 3)]);
        assert_eq!(second, Edges::default());
    }
}
