//! `DistributionAgent`: picks a target reactor `Looper` for each newly
//! accepted connection. Uniform-random by default; the policy is kept
//! behind a narrow interface so it stays swappable.

use crate::reactor::Looper;
use rand::Rng;
use std::sync::Arc;

pub struct DistributionAgent {
    candidates: Vec<Arc<Looper>>,
}

impl DistributionAgent {
    pub fn new() -> Self {
        Self { candidates: Vec::new() }
    }

    pub fn add_candidate(&mut self, looper: Arc<Looper>) {
        self.candidates.push(looper);
    }

    /// Choose a reactor uniformly at random. Panics if no candidates
    /// have been registered — the `Server` always registers at least
    /// one reactor before constructing the `Acceptor`.
    pub fn select_candidate(&self) -> (Arc<Looper>, usize) {
        let index = rand::thread_rng().gen_range(0..self.candidates.len());
        (Arc::clone(&self.candidates[index]), index)
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}

impl Default for DistributionAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_among_registered_candidates() {
        let mut agent = DistributionAgent::new();
        for _ in 0..3 {
            agent.add_candidate(Looper::new(8).unwrap());
        }
        let (_, index) = agent.select_candidate();
        assert!(index < 3);
    }
}
