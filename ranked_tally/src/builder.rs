pub use crate::config::*;

use crate::run_election;

/// A builder for assembling an election incrementally.
///
/// ```
/// pub use ranked_tally::builder::Builder;
/// pub use ranked_tally::TallyRules;
/// # use ranked_tally::ElectionError;
///
/// let mut builder = Builder::new(&TallyRules::DEFAULT_RULES)
///     .candidates(&["Alice", "Bob", "Charlie"]);
///
/// builder.add_ballot(&["Alice", "Bob"]);
/// builder.add_weighted_ballot(&["Bob", "Charlie"], 2);
///
/// let result = builder.tally()?;
/// assert_eq!(result.winners, vec!["Bob".to_string()]);
/// # Ok::<(), ElectionError>(())
/// ```
pub struct Builder {
    rules: TallyRules,
    candidates: Vec<Candidate>,
    ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &TallyRules) -> Builder {
        Builder {
            rules: rules.clone(),
            candidates: Vec::new(),
            ballots: Vec::new(),
        }
    }

    /// Registers the candidates, in ballot-paper order.
    pub fn candidates(self, names: &[&str]) -> Builder {
        Builder {
            candidates: names.iter().map(|n| Candidate::new(n)).collect(),
            ..self
        }
    }

    /// Registers a candidate with more than a name, e.g. a withdrawn one.
    pub fn add_candidate(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    /// Adds a single ballot ranking the given candidates, most preferred
    /// first. Validation happens when the count runs.
    pub fn add_ballot(&mut self, ranking: &[&str]) {
        self.add_weighted_ballot(ranking, 1);
    }

    /// Adds `count` identical ballots with the given ranking.
    pub fn add_weighted_ballot(&mut self, ranking: &[&str], count: u64) {
        self.ballots.push(Ballot::weighted(ranking, count));
    }

    /// Runs the count over everything added so far.
    pub fn tally(&self) -> Result<ElectionResult, ElectionError> {
        run_election(&self.candidates, &self.ballots, &self.rules)
    }
}
