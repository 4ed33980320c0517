// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use crate::weight::Weight;

/// A registered candidate.
///
/// Identity is the name: two candidates with the same name in one election
/// are rejected at construction time.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    pub name: String,
    /// Short code used by some upstream formats. Not significant for the count.
    pub code: Option<String>,
    /// A withdrawn candidate: kept in the books but inactive from the first
    /// round on, so rankings that mention it simply skip over it.
    pub excluded: bool,
}

impl Candidate {
    pub fn new(name: &str) -> Candidate {
        Candidate {
            name: name.to_string(),
            code: None,
            excluded: false,
        }
    }
}

/// One ballot: a ranking of candidate names, most preferred first, together
/// with the number of identical ballots it stands for.
///
/// A ranking may stop early (not every candidate has to be ranked) but may
/// not mention a candidate twice. Ballots with an empty ranking or a zero
/// count are dropped before the count starts.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub ranking: Vec<String>,
    pub count: u64,
}

impl Ballot {
    pub fn new(ranking: &[&str]) -> Ballot {
        Ballot {
            ranking: ranking.iter().map(|s| s.to_string()).collect(),
            count: 1,
        }
    }

    pub fn weighted(ranking: &[&str], count: u64) -> Ballot {
        Ballot {
            ranking: ranking.iter().map(|s| s.to_string()).collect(),
            count,
        }
    }
}

// ********* Configuration **********

/// The counting rule to apply.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VotingMethod {
    /// Single winner. Repeatedly eliminates the weakest candidate until one
    /// holds a majority of the non-exhausted votes.
    InstantRunoff,
    /// Multiple winners filled against the Droop quota, with fractional
    /// surplus transfers.
    SingleTransferableVote,
    /// Multiple winners by running a full instant-runoff count once per
    /// seat, removing earlier winners each time.
    PreferentialBlock,
}

/// How to order candidates that are tied for elimination.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// Fixed lexicographic order on the candidate name. Fully reproducible
    /// from the inputs alone; the tied candidate sorting last is eliminated.
    ByName,
    /// Permutes the tied candidates by the SHA-256 digest of the seed, the
    /// round and the name. Deterministic given the seed, hard to anticipate
    /// without it.
    Random(u32),
}

/// The elimination algorithm to apply.
///
/// - Single eliminates one candidate per round.
///
/// - Batch eliminates in one round every bottom candidate whose cumulative
///   vote total cannot catch the next candidate above, which shortens counts
///   with long tails of fringe candidates. Only meaningful for
///   instant-runoff style counts; rejected for STV where it could interact
///   with the quota.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum EliminationAlgorithm {
    Single,
    Batch,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyRules {
    pub method: VotingMethod,
    /// Seats to fill. Must be 1 for instant-runoff.
    pub num_seats: u32,
    pub tiebreak_mode: TieBreakMode,
    pub elimination: EliminationAlgorithm,
}

impl TallyRules {
    pub const DEFAULT_RULES: TallyRules = TallyRules {
        method: VotingMethod::InstantRunoff,
        num_seats: 1,
        tiebreak_mode: TieBreakMode::ByName,
        elimination: EliminationAlgorithm::Single,
    };
}

// ******** Output data structures *********

/// Where a candidate stands in a given round.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CandidateStatus {
    Hopeful,
    Elected,
    Eliminated,
}

/// One candidate's line in a round tally.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateRound {
    pub name: String,
    /// Current weight counted toward this candidate. An elected candidate
    /// retains exactly the quota after its surplus has moved on; an
    /// eliminated candidate shows zero.
    pub votes: Weight,
    pub status: CandidateStatus,
}

/// Why votes moved out of a candidate's pile.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TransferReason {
    /// The candidate was eliminated and gave up its full pile.
    Eliminated,
    /// The candidate was elected over quota and gave up the surplus.
    Surplus,
}

/// Provenance of the votes leaving one candidate in one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TransferStats {
    pub name: String,
    pub reason: TransferReason,
    /// Receiving candidate and transferred weight, sorted by name.
    pub transfers: Vec<(String, Weight)>,
    /// Weight that had no next preference left to go to.
    pub exhausted: Weight,
}

/// Statistics for one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    /// 0-based round index over the whole count.
    pub round: u32,
    /// Which instant-runoff pass this round belongs to. Always 0 except
    /// under preferential block voting, where each seat is a new pass.
    pub pass: u32,
    /// One entry per registered candidate, in registration order.
    pub tally: Vec<CandidateRound>,
    /// Majority threshold (IRV/PBV) or quota (STV) in force this round.
    pub threshold: Weight,
    /// Cumulative weight of ballots with no active preference left.
    pub exhausted: Weight,
    pub transfers: Vec<TransferStats>,
}

impl RoundStats {
    pub fn votes_for(&self, name: &str) -> Option<Weight> {
        self.tally.iter().find(|c| c.name == name).map(|c| c.votes)
    }

    pub fn status_of(&self, name: &str) -> Option<CandidateStatus> {
        self.tally.iter().find(|c| c.name == name).map(|c| c.status)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionResult {
    /// Exactly as many names as seats requested, in order of election.
    pub winners: Vec<String>,
    /// The threshold or quota of the deciding round.
    pub threshold: Weight,
    pub rounds: Vec<RoundStats>,
}

/// Errors that prevent a count from completing.
///
/// All input-shape errors are raised before the first round runs.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ElectionError {
    /// Two registered candidates share a name.
    DuplicateCandidate { name: String },
    /// A ballot ranks a name that is not a registered candidate.
    UnknownCandidate { name: String },
    /// A ballot ranks the same candidate more than once.
    DuplicateRanking { name: String },
    /// No valid ballots were supplied.
    EmptyBallotSet,
    /// More seats requested than there are candidates to fill them.
    InsufficientCandidates { seats: u32, candidates: u32 },
    /// An instant-runoff count ran out of candidates without producing a
    /// majority winner. A legitimate outcome, reported distinctly.
    NoMajority,
    /// Internal invariant failure: the round loop exceeded its bound. This
    /// indicates a defect in the engine, not bad input.
    RoundBoundExceeded,
}

impl Error for ElectionError {}

impl Display for ElectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectionError::DuplicateCandidate { name } => {
                write!(f, "duplicate candidate name: {}", name)
            }
            ElectionError::UnknownCandidate { name } => {
                write!(f, "ballot ranks unknown candidate: {}", name)
            }
            ElectionError::DuplicateRanking { name } => {
                write!(f, "ballot ranks candidate more than once: {}", name)
            }
            ElectionError::EmptyBallotSet => write!(f, "no valid ballots supplied"),
            ElectionError::InsufficientCandidates { seats, candidates } => write!(
                f,
                "{} seats requested but only {} candidates available",
                seats, candidates
            ),
            ElectionError::NoMajority => {
                write!(f, "all candidates eliminated without reaching a majority")
            }
            ElectionError::RoundBoundExceeded => {
                write!(f, "internal error: round bound exceeded")
            }
        }
    }
}
