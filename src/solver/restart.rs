struct Luby {
    base: usize,
    uv: (isize, isize),
}

impl Luby {
    fn new(base: usize) -> Self {
        Self { base, uv: (1, 1) }
    }
}

impl Iterator for Luby {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let (u, v) = self.uv;
        // Based on Knuth's formula, see https://oeis.org/A182105.
        self.uv = if u & -u == v { (u + 1, 1) } else { (u, 2 * v) };
        Some(self.base * v as usize)
    }
}

/// Restart schedule: restart once the conflicts since the last restart
/// reach the next term of the Luby sequence.
pub struct Restarts {
    luby: Luby,
    threshold: usize,
    conflicts: usize,
}

impl Restarts {
    pub fn new(base: usize) -> Self {
        let mut luby = Luby::new(base);
        let threshold = luby.next().unwrap_or(base);
        Self {
            luby,
            threshold,
            conflicts: 0,
        }
    }

    pub fn conflict(&mut self) {
        self.conflicts += 1;
    }

    /// Returns true when a restart is due and moves on to the next threshold.
    pub fn due(&mut self) -> bool {
        if self.conflicts < self.threshold {
            return false;
        }
        self.conflicts = 0;
        self.threshold = self.luby.next().unwrap_or(self.threshold);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Luby, Restarts};

    #[test]
    fn luby() {
        let expected = vec![1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8, 1, 1, 2, 1, 1];
        let actual: Vec<usize> = Luby::new(1).take(20).collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn restarts_follow_luby() {
        let mut restarts = Restarts::new(2);
        let mut gaps = vec![];
        let mut since = 0;
        while gaps.len() < 4 {
            restarts.conflict();
            since += 1;
            if restarts.due() {
                gaps.push(since);
                since = 0;
            }
        }
        assert_eq!(gaps, vec![2, 2, 4, 2]);
    }
}
