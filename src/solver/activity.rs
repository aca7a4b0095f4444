/// Activity scores of clauses, bumped whenever a clause takes part in
/// conflict analysis. Used to pick learnt clauses worth keeping.
pub struct ClauseTracker {
    k: f64,
    activity: Vec<f64>,
}

impl ClauseTracker {
    pub fn new() -> Self {
        Self {
            k: 1.0,
            activity: vec![],
        }
    }

    pub fn add(&mut self) {
        self.activity.push(0.0);
    }

    pub fn touch(&mut self, i_clause: usize) {
        self.activity[i_clause] += self.k;
    }

    pub fn rescale(&mut self) {
        self.k *= 1.001;

        const THRESHOLD: f64 = 10e100;
        if self.k > THRESHOLD {
            for val in &mut self.activity {
                *val /= THRESHOLD;
            }
            self.k /= THRESHOLD;
        }
    }

    pub fn get_activity(&self, i_clause: usize) -> f64 {
        self.activity[i_clause]
    }

    pub fn swap_remove(&mut self, i_clause: usize) {
        self.activity.swap_remove(i_clause);
    }

    /// Median activity of the clauses from `from` onwards.
    pub fn select_pivot(&self, from: usize) -> f64 {
        let mut tail: Vec<f64> = self.activity[from..].to_vec();
        if tail.is_empty() {
            return 0.0;
        }
        let mid = tail.len() / 2;
        let (_, pivot, _) = tail.select_nth_unstable_by(mid, f64::total_cmp);
        *pivot
    }
}
