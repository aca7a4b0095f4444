use crate::types::{to_var, Lit, Var};

use super::{
    assignment::Assignment,
    map::{var_map, VarMap},
};

/// Binary max-heap of variables ordered by activity.
///
/// Popped variables stay behind the live part of `order` and are brought
/// back with [`ActivityHeap::unpop_all`].
struct ActivityHeap {
    activity: VarMap<f64>,
    order: Vec<Var>,
    position: VarMap<usize>,
    live: usize,
}

impl ActivityHeap {
    fn new(var_count: usize) -> Self {
        let mut position = var_map(var_count);
        let order: Vec<Var> = (1..=var_count).collect();
        for (pos, &var) in order.iter().enumerate() {
            position[var] = pos;
        }
        Self {
            activity: var_map(var_count),
            order,
            position,
            live: var_count,
        }
    }

    fn higher(&self, a: usize, b: usize) -> bool {
        let (a, b) = (self.order[a], self.order[b]);
        self.activity[a].total_cmp(&self.activity[b]).is_gt()
    }

    fn exchange(&mut self, a: usize, b: usize) {
        self.order.swap(a, b);
        self.position[self.order[a]] = a;
        self.position[self.order[b]] = b;
    }

    fn up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.higher(pos, parent) {
                return;
            }
            self.exchange(pos, parent);
            pos = parent;
        }
    }

    fn down(&mut self, mut pos: usize) {
        loop {
            let mut top = pos;
            for child in [2 * pos + 1, 2 * pos + 2] {
                if child < self.live && self.higher(child, top) {
                    top = child;
                }
            }
            if top == pos {
                return;
            }
            self.exchange(pos, top);
            pos = top;
        }
    }

    fn bump(&mut self, var: Var, amount: f64) {
        self.activity[var] += amount;
        let pos = self.position[var];
        if pos < self.live {
            self.up(pos);
        }
    }

    /// Divides every activity by `factor`, which keeps the order intact.
    fn scale_down(&mut self, factor: f64) {
        for activity in self.activity.iter_mut() {
            *activity /= factor;
        }
    }

    fn peek(&self) -> Option<Var> {
        (self.live > 0).then(|| self.order[0])
    }

    fn pop(&mut self) {
        if self.live > 0 {
            self.live -= 1;
            self.exchange(0, self.live);
            self.down(0);
        }
    }

    fn unpop_all(&mut self) {
        while self.live < self.order.len() {
            self.live += 1;
            self.up(self.live - 1);
        }
    }
}

/// Exponential VSIDS with phase saving.
pub struct Evsids {
    k: f64,
    seen: VarMap<bool>,
    heap: ActivityHeap,
    phases: VarMap<bool>,
}

impl Evsids {
    pub fn new(var_count: usize) -> Self {
        Self {
            k: 1.0,
            seen: var_map(var_count),
            heap: ActivityHeap::new(var_count),
            phases: var_map(var_count),
        }
    }

    pub fn touch(&mut self, var: Var) {
        if !self.seen[var] {
            self.seen[var] = true;

            self.heap.bump(var, self.k);
        }
    }

    pub fn rescale(&mut self) {
        self.k *= 1.01;

        const THRESHOLD: f64 = 10e100;
        if self.k > THRESHOLD {
            self.heap.scale_down(THRESHOLD);
            self.k /= THRESHOLD;
        }

        self.seen.fill(false);
    }

    /// Remembers the polarities of `lits` for later decisions.
    pub fn save_phases(&mut self, lits: &[Lit]) {
        for &lit in lits {
            self.phases[to_var(lit)] = lit.is_positive();
        }
    }

    /// Picks the most active unassigned variable, returned as a literal
    /// with its saved phase.
    pub fn choose(&mut self, assignment: &Assignment) -> Option<Lit> {
        let mut chosen = None;
        while let Some(var) = self.heap.peek() {
            if assignment.eval(var as Lit).is_none() {
                chosen = Some(var);
                break;
            }
            self.heap.pop();
        }
        self.heap.unpop_all();

        chosen.map(|var| if self.phases[var] { var as Lit } else { -(var as Lit) })
    }
}

#[cfg(test)]
mod tests {
    use crate::solver::assignment::{Assignment, Reason};

    use super::Evsids;

    #[test]
    fn prefers_touched_vars() {
        let mut evsids = Evsids::new(3);
        let mut assignment = Assignment::new(3);

        evsids.touch(2);
        evsids.rescale();
        evsids.touch(3);
        evsids.touch(3);

        // 3 was bumped with a larger increment than 2
        assert_eq!(evsids.choose(&assignment), Some(-3));

        assignment.set(3, Reason::Decision);
        assert_eq!(evsids.choose(&assignment), Some(-2));
    }

    #[test]
    fn saved_phase_is_used() {
        let mut evsids = Evsids::new(2);
        let assignment = Assignment::new(2);

        evsids.touch(1);
        evsids.save_phases(&[1, -2]);
        assert_eq!(evsids.choose(&assignment), Some(1));
    }
}
