mod config;
mod weight;

pub mod builder;
pub mod flows;
pub mod manual;

use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;
pub use crate::flows::{ballot_flows, FlowEndpoint, FlowRecord};
pub use crate::weight::Weight;

// **** Private structures ****

type RoundId = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

impl CandidateId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

// A checked ballot. The ranking is non-empty and free of duplicates; the
// weight starts as a whole number of ballots and only shrinks under STV
// surplus transfers.
#[derive(Eq, PartialEq, Debug, Clone)]
struct BallotInternal {
    ranking: Vec<CandidateId>,
    weight: Weight,
}

impl BallotInternal {
    /// First ranked candidate that is still hopeful, or none if the ballot
    /// is exhausted. O(ranking length).
    fn effective_preference(&self, statuses: &[CandidateStatus]) -> Option<CandidateId> {
        self.ranking
            .iter()
            .copied()
            .find(|cid| statuses[cid.idx()] == CandidateStatus::Hopeful)
    }
}

struct CheckedElection {
    names: Vec<String>,
    excluded: Vec<bool>,
    ballots: Vec<BallotInternal>,
    total_valid: Weight,
}

/// The tally of a single round: a pure function of the ballots and the
/// current statuses.
struct RoundTally {
    // Indexed by candidate id. Zero for candidates out of the running.
    counts: Vec<Weight>,
    // Effective preference of each ballot, in ballot order.
    prefs: Vec<Option<CandidateId>>,
    active_total: Weight,
    // Cumulative weight of ballots with no hopeful candidate left.
    exhausted: Weight,
}

struct CountState {
    names: Vec<String>,
    excluded: Vec<bool>,
    statuses: Vec<CandidateStatus>,
    // What an already-elected candidate shows in later round tallies:
    // the quota it retains under STV, zero in later PBV passes.
    elected_display: Vec<Weight>,
    winners: Vec<CandidateId>,
    rounds: Vec<RoundStats>,
    pass: u32,
}

impl CountState {
    /// Appends the round to the history. Statuses must already reflect this
    /// round's decisions; `decided_now` lists the candidates decided in this
    /// round, which still show their tallied count rather than the
    /// post-decision one.
    fn record_round(
        &mut self,
        tally: &RoundTally,
        threshold: Weight,
        decided_now: &[CandidateId],
        transfers: Vec<TransferStats>,
    ) {
        let round = self.rounds.len() as RoundId;
        let mut entries = Vec::with_capacity(self.names.len());
        for (idx, name) in self.names.iter().enumerate() {
            let cid = CandidateId(idx as u32);
            let status = self.statuses[idx];
            let votes = if status == CandidateStatus::Hopeful || decided_now.contains(&cid) {
                tally.counts[idx]
            } else if status == CandidateStatus::Elected {
                self.elected_display[idx]
            } else {
                Weight::ZERO
            };
            entries.push(CandidateRound {
                name: name.clone(),
                votes,
                status,
            });
        }
        info!(
            "Round {}: threshold {}, exhausted {}",
            round, threshold, tally.exhausted
        );
        for e in entries.iter() {
            debug!("Round {}: {:>8} {} ({:?})", round, e.votes, e.name, e.status);
        }
        self.rounds.push(RoundStats {
            round,
            pass: self.pass,
            tally: entries,
            threshold,
            exhausted: tally.exhausted,
            transfers,
        });
    }
}

/// Runs the count with the given rules.
///
/// Arguments:
/// * `candidates` the registered candidates, in ballot-paper order
/// * `ballots` the ballots to process
/// * `rules` the rules that govern this election
///
/// All input-shape errors are reported before the first round runs. Under
/// `VotingMethod::InstantRunoff` the number of seats is always one,
/// whatever `rules.num_seats` says.
pub fn run_election(
    candidates: &[Candidate],
    ballots: &[Ballot],
    rules: &TallyRules,
) -> Result<ElectionResult, ElectionError> {
    info!(
        "run_election: {} candidates, {} ballots, method {:?}",
        candidates.len(),
        ballots.len(),
        rules.method
    );
    let checked = checks(candidates, ballots, rules)?;
    for (idx, name) in checked.names.iter().enumerate() {
        info!("Candidate {}: {}", idx, name);
    }

    let seats = effective_seats(rules);
    let mut state = CountState {
        statuses: checked
            .excluded
            .iter()
            .map(|&e| {
                if e {
                    CandidateStatus::Eliminated
                } else {
                    CandidateStatus::Hopeful
                }
            })
            .collect(),
        elected_display: vec![Weight::ZERO; checked.names.len()],
        names: checked.names.clone(),
        excluded: checked.excluded.clone(),
        winners: Vec::new(),
        rounds: Vec::new(),
        pass: 0,
    };

    match rules.method {
        VotingMethod::InstantRunoff => run_irv_pass(&mut state, &checked.ballots, rules)?,
        VotingMethod::PreferentialBlock => run_pbv(&mut state, &checked.ballots, rules, seats)?,
        VotingMethod::SingleTransferableVote => {
            run_stv(&mut state, checked.ballots, rules, seats, checked.total_valid)?
        }
    }

    debug_assert_eq!(state.winners.len(), seats as usize);
    let winners: Vec<String> = state
        .winners
        .iter()
        .map(|cid| state.names[cid.idx()].clone())
        .collect();
    info!("Winners: {:?}", winners);
    let threshold = state.rounds.last().map(|r| r.threshold).unwrap_or(Weight::ZERO);
    Ok(ElectionResult {
        winners,
        threshold,
        rounds: state.rounds,
    })
}

fn effective_seats(rules: &TallyRules) -> u32 {
    match rules.method {
        VotingMethod::InstantRunoff => 1,
        _ => rules.num_seats,
    }
}

// Candidates keep their registration order as ids.
fn checks(
    candidates: &[Candidate],
    ballots: &[Ballot],
    rules: &TallyRules,
) -> Result<CheckedElection, ElectionError> {
    let mut by_name: HashMap<&str, CandidateId> = HashMap::new();
    for (idx, c) in candidates.iter().enumerate() {
        if by_name.insert(c.name.as_str(), CandidateId(idx as u32)).is_some() {
            return Err(ElectionError::DuplicateCandidate {
                name: c.name.clone(),
            });
        }
    }

    let num_eligible = candidates.iter().filter(|c| !c.excluded).count() as u32;
    let seats = effective_seats(rules);
    if seats == 0 || seats > num_eligible {
        return Err(ElectionError::InsufficientCandidates {
            seats,
            candidates: num_eligible,
        });
    }

    let mut checked: Vec<BallotInternal> = Vec::new();
    let mut total_valid = Weight::ZERO;
    for b in ballots.iter() {
        // Empty rankings and zero counts are not ballots.
        if b.ranking.is_empty() || b.count == 0 {
            continue;
        }
        let mut ranking: Vec<CandidateId> = Vec::with_capacity(b.ranking.len());
        let mut seen: HashSet<CandidateId> = HashSet::new();
        for name in b.ranking.iter() {
            let cid = match by_name.get(name.as_str()) {
                Some(cid) => *cid,
                None => {
                    return Err(ElectionError::UnknownCandidate { name: name.clone() });
                }
            };
            if !seen.insert(cid) {
                return Err(ElectionError::DuplicateRanking { name: name.clone() });
            }
            ranking.push(cid);
        }
        let weight = Weight::from_ballots(b.count);
        total_valid += weight;
        checked.push(BallotInternal { ranking, weight });
    }
    if checked.is_empty() {
        return Err(ElectionError::EmptyBallotSet);
    }
    debug!(
        "checks: {} valid ballots, total weight {}",
        checked.len(),
        total_valid
    );

    Ok(CheckedElection {
        names: candidates.iter().map(|c| c.name.clone()).collect(),
        excluded: candidates.iter().map(|c| c.excluded).collect(),
        ballots: checked,
        total_valid,
    })
}

fn tally_round(ballots: &[BallotInternal], statuses: &[CandidateStatus]) -> RoundTally {
    let mut counts = vec![Weight::ZERO; statuses.len()];
    let mut prefs: Vec<Option<CandidateId>> = Vec::with_capacity(ballots.len());
    let mut active_total = Weight::ZERO;
    let mut exhausted = Weight::ZERO;
    for b in ballots.iter() {
        if b.weight.is_zero() {
            prefs.push(None);
            continue;
        }
        match b.effective_preference(statuses) {
            Some(cid) => {
                counts[cid.idx()] += b.weight;
                active_total += b.weight;
                prefs.push(Some(cid));
            }
            None => {
                exhausted += b.weight;
                prefs.push(None);
            }
        }
    }
    RoundTally {
        counts,
        prefs,
        active_total,
        exhausted,
    }
}

// More than half of the non-exhausted votes.
fn majority_threshold(active_total: Weight) -> Weight {
    Weight::from_ballots(active_total.whole_votes() / 2 + 1)
}

fn droop_quota(total_valid: Weight, seats: u32) -> Weight {
    Weight::from_ballots(total_valid.whole_votes() / (seats as u64 + 1) + 1)
}

fn hopeful_candidates(statuses: &[CandidateStatus]) -> Vec<CandidateId> {
    statuses
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == CandidateStatus::Hopeful)
        .map(|(idx, _)| CandidateId(idx as u32))
        .collect()
}

/// One instant-runoff pass: rounds of tally and elimination until a
/// candidate holds a majority or stands alone. Appends the winner to the
/// state and returns.
fn run_irv_pass(
    state: &mut CountState,
    ballots: &[BallotInternal],
    rules: &TallyRules,
) -> Result<(), ElectionError> {
    // Each non-terminal round eliminates at least one candidate.
    let max_rounds = state.names.len() + 1;
    for _ in 0..max_rounds {
        let tally = tally_round(ballots, &state.statuses);
        let threshold = majority_threshold(tally.active_total);
        let hopefuls = hopeful_candidates(&state.statuses);
        debug!(
            "irv round: {} hopefuls, active total {}, threshold {}",
            hopefuls.len(),
            tally.active_total,
            threshold
        );

        if hopefuls.is_empty() {
            return Err(ElectionError::NoMajority);
        }

        // A last remaining candidate wins by default, with or without a
        // majority.
        let winner = if hopefuls.len() == 1 {
            Some(hopefuls[0])
        } else {
            hopefuls
                .iter()
                .copied()
                .find(|cid| tally.counts[cid.idx()] >= threshold)
        };

        if let Some(w) = winner {
            state.statuses[w.idx()] = CandidateStatus::Elected;
            state.elected_display[w.idx()] = tally.counts[w.idx()];
            state.winners.push(w);
            info!(
                "Round {}: {} elected with {}",
                state.rounds.len(),
                state.names[w.idx()],
                tally.counts[w.idx()]
            );
            state.record_round(&tally, threshold, &[w], Vec::new());
            return Ok(());
        }

        let victims = select_eliminated(
            &tally,
            &hopefuls,
            rules,
            &state.names,
            state.rounds.len() as RoundId,
        );
        for v in victims.iter() {
            state.statuses[v.idx()] = CandidateStatus::Eliminated;
            info!(
                "Round {}: {} eliminated with {}",
                state.rounds.len(),
                state.names[v.idx()],
                tally.counts[v.idx()]
            );
        }
        let transfers =
            elimination_transfers(ballots, &tally, &victims, &state.statuses, &state.names);
        state.record_round(&tally, threshold, &victims, transfers);
    }
    Err(ElectionError::RoundBoundExceeded)
}

/// Preferential block voting: one full instant-runoff pass per seat, with
/// the winners of earlier passes out of the pool.
fn run_pbv(
    state: &mut CountState,
    ballots: &[BallotInternal],
    rules: &TallyRules,
    seats: u32,
) -> Result<(), ElectionError> {
    for pass in 0..seats {
        state.pass = pass;
        for idx in 0..state.statuses.len() {
            match state.statuses[idx] {
                // A seated winner holds no votes in later passes; its
                // ballots rejoin the pool in full.
                CandidateStatus::Elected => state.elected_display[idx] = Weight::ZERO,
                CandidateStatus::Eliminated if !state.excluded[idx] => {
                    state.statuses[idx] = CandidateStatus::Hopeful
                }
                _ => {}
            }
        }
        run_irv_pass(state, ballots, rules)?;
    }
    Ok(())
}

/// Single transferable vote: fill seats against the Droop quota, moving
/// surpluses fractionally and eliminating from the bottom when no one
/// reaches it.
fn run_stv(
    state: &mut CountState,
    mut ballots: Vec<BallotInternal>,
    rules: &TallyRules,
    seats: u32,
    total_valid: Weight,
) -> Result<(), ElectionError> {
    // The quota is set by the valid ballots at the start of the count and
    // does not shrink as ballots exhaust.
    let quota = droop_quota(total_valid, seats);
    info!("STV count: {} seats, quota {}", seats, quota);
    if rules.elimination == EliminationAlgorithm::Batch {
        warn!("batch elimination is not defined for STV, eliminating singly");
    }

    let max_rounds = state.names.len() + 1;
    for _ in 0..max_rounds {
        let tally = tally_round(&ballots, &state.statuses);
        let hopefuls = hopeful_candidates(&state.statuses);
        let open_seats = seats as usize - state.winners.len();
        debug!(
            "stv round: {} hopefuls, {} open seats, active total {}",
            hopefuls.len(),
            open_seats,
            tally.active_total
        );

        // Everyone at or above quota is elected this round. The Droop quota
        // caps how many candidates can hold it at once, so this never
        // overfills the open seats.
        let mut elected: Vec<CandidateId> = hopefuls
            .iter()
            .copied()
            .filter(|cid| tally.counts[cid.idx()] >= quota)
            .collect();
        debug_assert!(elected.len() <= open_seats);

        if !elected.is_empty() {
            // Largest pile distributes its surplus first, name as tiebreak.
            elected.sort_by(|a, b| {
                tally.counts[b.idx()]
                    .cmp(&tally.counts[a.idx()])
                    .then_with(|| state.names[a.idx()].cmp(&state.names[b.idx()]))
            });
            for e in elected.iter() {
                state.statuses[e.idx()] = CandidateStatus::Elected;
                state.winners.push(*e);
                info!(
                    "Round {}: {} elected with {} (quota {})",
                    state.rounds.len(),
                    state.names[e.idx()],
                    tally.counts[e.idx()],
                    quota
                );
            }
            let terminal = state.winners.len() == seats as usize;
            let mut transfers: Vec<TransferStats> = Vec::new();
            if terminal {
                for e in elected.iter() {
                    state.elected_display[e.idx()] = tally.counts[e.idx()];
                }
            } else {
                for e in elected.iter() {
                    let ts = distribute_surplus(
                        &mut ballots,
                        &tally,
                        *e,
                        quota,
                        &state.statuses,
                        &state.names,
                    );
                    state.elected_display[e.idx()] = quota;
                    transfers.push(ts);
                }
                transfers.sort_by(|a, b| a.name.cmp(&b.name));
            }
            state.record_round(&tally, quota, &elected, transfers);
            if terminal {
                return Ok(());
            }
            continue;
        }

        // No one reached quota. If the hopefuls exactly fill the open
        // seats, they are elected by default and the count ends.
        if hopefuls.len() <= open_seats {
            let mut remaining = hopefuls.clone();
            remaining.sort_by(|a, b| {
                tally.counts[b.idx()]
                    .cmp(&tally.counts[a.idx()])
                    .then_with(|| state.names[a.idx()].cmp(&state.names[b.idx()]))
            });
            for c in remaining.iter() {
                state.statuses[c.idx()] = CandidateStatus::Elected;
                state.elected_display[c.idx()] = tally.counts[c.idx()];
                state.winners.push(*c);
                info!(
                    "Round {}: {} elected by default with {}",
                    state.rounds.len(),
                    state.names[c.idx()],
                    tally.counts[c.idx()]
                );
            }
            state.record_round(&tally, quota, &remaining, Vec::new());
            return Ok(());
        }

        let victim = select_eliminated_single(
            &tally,
            &hopefuls,
            rules.tiebreak_mode,
            &state.names,
            state.rounds.len() as RoundId,
        );
        state.statuses[victim.idx()] = CandidateStatus::Eliminated;
        info!(
            "Round {}: {} eliminated with {}",
            state.rounds.len(),
            state.names[victim.idx()],
            tally.counts[victim.idx()]
        );
        let transfers =
            elimination_transfers(&ballots, &tally, &[victim], &state.statuses, &state.names);
        state.record_round(&tally, quota, &[victim], transfers);
    }
    Err(ElectionError::RoundBoundExceeded)
}

/// Moves the surplus of a newly elected candidate to the next hopeful
/// preference of each of its ballots, each ballot keeping the fraction
/// `surplus / count` of its weight. The candidate retains exactly the
/// quota.
fn distribute_surplus(
    ballots: &mut [BallotInternal],
    tally: &RoundTally,
    elected: CandidateId,
    quota: Weight,
    statuses: &[CandidateStatus],
    names: &[String],
) -> TransferStats {
    let count = tally.counts[elected.idx()];
    let surplus = count - quota;
    let mut by_target: HashMap<CandidateId, Weight> = HashMap::new();
    let mut exhausted = Weight::ZERO;
    for (i, b) in ballots.iter_mut().enumerate() {
        if tally.prefs[i] != Some(elected) {
            continue;
        }
        let portion = b.weight.surplus_portion(surplus, count);
        b.weight = portion;
        if portion.is_zero() {
            continue;
        }
        match b.effective_preference(statuses) {
            Some(t) => *by_target.entry(t).or_insert(Weight::ZERO) += portion,
            // The exhausted portion stays on the ballot and joins the
            // exhausted pool at the next tally.
            None => exhausted += portion,
        }
    }
    let mut transfers: Vec<(String, Weight)> = by_target
        .into_iter()
        .map(|(cid, w)| (names[cid.idx()].clone(), w))
        .collect();
    transfers.sort();
    debug!(
        "distribute_surplus: {} surplus {} -> {:?}, exhausted {}",
        names[elected.idx()],
        surplus,
        transfers,
        exhausted
    );
    TransferStats {
        name: names[elected.idx()].clone(),
        reason: TransferReason::Surplus,
        transfers,
        exhausted,
    }
}

/// Records where the full piles of the just-eliminated candidates go.
/// Statuses must already mark the victims as eliminated.
fn elimination_transfers(
    ballots: &[BallotInternal],
    tally: &RoundTally,
    victims: &[CandidateId],
    statuses: &[CandidateStatus],
    names: &[String],
) -> Vec<TransferStats> {
    let mut per_victim: HashMap<CandidateId, (HashMap<CandidateId, Weight>, Weight)> = victims
        .iter()
        .map(|&v| (v, (HashMap::new(), Weight::ZERO)))
        .collect();
    for (i, b) in ballots.iter().enumerate() {
        let from = match tally.prefs[i] {
            Some(p) if per_victim.contains_key(&p) => p,
            _ => continue,
        };
        let entry = per_victim.get_mut(&from).unwrap();
        match b.effective_preference(statuses) {
            Some(t) => *entry.0.entry(t).or_insert(Weight::ZERO) += b.weight,
            None => entry.1 += b.weight,
        }
    }

    let mut out: Vec<TransferStats> = Vec::with_capacity(victims.len());
    for v in victims.iter() {
        let (by_target, exhausted) = per_victim.remove(v).unwrap();
        let mut transfers: Vec<(String, Weight)> = by_target
            .into_iter()
            .map(|(cid, w)| (names[cid.idx()].clone(), w))
            .collect();
        transfers.sort();
        out.push(TransferStats {
            name: names[v.idx()].clone(),
            reason: TransferReason::Eliminated,
            transfers,
            exhausted,
        });
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

fn select_eliminated(
    tally: &RoundTally,
    hopefuls: &[CandidateId],
    rules: &TallyRules,
    names: &[String],
    round: RoundId,
) -> Vec<CandidateId> {
    debug_assert!(hopefuls.len() >= 2);
    if rules.elimination == EliminationAlgorithm::Batch {
        if let Some(batch) = select_eliminated_batch(tally, hopefuls) {
            debug!("select_eliminated: batch of {} candidates", batch.len());
            return batch;
        }
    }
    vec![select_eliminated_single(
        tally,
        hopefuls,
        rules.tiebreak_mode,
        names,
        round,
    )]
}

// Batch criterion: walking up the sorted tally, everything strictly below
// the last candidate whose count exceeds the cumulative total beneath it
// can never catch up, and goes in one round.
fn select_eliminated_batch(tally: &RoundTally, hopefuls: &[CandidateId]) -> Option<Vec<CandidateId>> {
    let mut sorted: Vec<(Weight, CandidateId)> = hopefuls
        .iter()
        .map(|&cid| (tally.counts[cid.idx()], cid))
        .collect();
    sorted.sort();

    let mut cum = Weight::ZERO;
    let mut last_gap_idx: Option<usize> = None;
    for (idx, (w, _)) in sorted.iter().enumerate() {
        if cum < *w {
            last_gap_idx = Some(idx);
        }
        cum += *w;
    }
    // At index 0 the cumulative count beneath is zero, so a gap there says
    // nothing.
    match last_gap_idx {
        Some(idx) if idx > 0 => Some(sorted.iter().take(idx).map(|(_, cid)| *cid).collect()),
        _ => None,
    }
}

fn select_eliminated_single(
    tally: &RoundTally,
    hopefuls: &[CandidateId],
    tiebreak: TieBreakMode,
    names: &[String],
    round: RoundId,
) -> CandidateId {
    let min_count = hopefuls
        .iter()
        .map(|cid| tally.counts[cid.idx()])
        .min()
        .unwrap();
    let mut tied: Vec<CandidateId> = hopefuls
        .iter()
        .copied()
        .filter(|cid| tally.counts[cid.idx()] == min_count)
        .collect();
    if tied.len() == 1 {
        return tied[0];
    }

    match tiebreak {
        TieBreakMode::ByName => {
            tied.sort_by(|a, b| names[a.idx()].cmp(&names[b.idx()]));
            let victim = *tied.last().unwrap();
            debug!(
                "tiebreak by name among {:?}: {} eliminated",
                tied.iter().map(|c| &names[c.idx()]).collect::<Vec<_>>(),
                names[victim.idx()]
            );
            victim
        }
        TieBreakMode::Random(seed) => {
            let mut keyed: Vec<(String, CandidateId)> = tied
                .iter()
                .map(|&cid| {
                    let digest =
                        sha256::digest(format!("{:08}{:08}{}", seed, round, names[cid.idx()]));
                    (digest, cid)
                })
                .collect();
            keyed.sort();
            let victim = keyed[0].1;
            debug!(
                "tiebreak by seeded permutation: {} eliminated",
                names[victim.idx()]
            );
            victim
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cands(names: &[&str]) -> Vec<Candidate> {
        names.iter().map(|n| Candidate::new(n)).collect()
    }

    fn irv_rules() -> TallyRules {
        TallyRules::DEFAULT_RULES
    }

    fn stv_rules(seats: u32) -> TallyRules {
        TallyRules {
            method: VotingMethod::SingleTransferableVote,
            num_seats: seats,
            ..TallyRules::DEFAULT_RULES
        }
    }

    fn pbv_rules(seats: u32) -> TallyRules {
        TallyRules {
            method: VotingMethod::PreferentialBlock,
            num_seats: seats,
            ..TallyRules::DEFAULT_RULES
        }
    }

    // The ballot profile used by several tests: Alice 4, Bob 3, Charlie 2
    // first preferences, Charlie's voters break to Bob.
    fn runoff_profile() -> Vec<Ballot> {
        vec![
            Ballot::weighted(&["Alice", "Bob", "Charlie"], 4),
            Ballot::weighted(&["Bob", "Alice", "Charlie"], 3),
            Ballot::weighted(&["Charlie", "Bob", "Alice"], 2),
        ]
    }

    fn assert_statuses_monotonic(result: &ElectionResult) {
        let names: Vec<String> = result.rounds[0].tally.iter().map(|c| c.name.clone()).collect();
        for name in names.iter() {
            let mut decided: Option<CandidateStatus> = None;
            for round in result.rounds.iter() {
                let status = round.status_of(name).unwrap();
                match decided {
                    Some(d) => assert_eq!(status, d, "{} reverted in round {}", name, round.round),
                    None if status != CandidateStatus::Hopeful => decided = Some(status),
                    None => {}
                }
            }
        }
    }

    #[test]
    fn irv_majority_runoff() {
        init_logs();
        let result = run_election(
            &cands(&["Alice", "Bob", "Charlie"]),
            &runoff_profile(),
            &irv_rules(),
        )
        .unwrap();

        assert_eq!(result.winners, vec!["Bob".to_string()]);
        assert_eq!(result.rounds.len(), 2);

        let r0 = &result.rounds[0];
        assert_eq!(r0.round, 0);
        assert_eq!(r0.threshold, Weight::from_ballots(5));
        assert_eq!(r0.votes_for("Alice"), Some(Weight::from_ballots(4)));
        assert_eq!(r0.votes_for("Bob"), Some(Weight::from_ballots(3)));
        assert_eq!(r0.votes_for("Charlie"), Some(Weight::from_ballots(2)));
        assert_eq!(r0.status_of("Charlie"), Some(CandidateStatus::Eliminated));
        assert_eq!(r0.transfers.len(), 1);
        let t = &r0.transfers[0];
        assert_eq!(t.name, "Charlie");
        assert_eq!(t.reason, TransferReason::Eliminated);
        assert_eq!(t.transfers, vec![("Bob".to_string(), Weight::from_ballots(2))]);
        assert_eq!(t.exhausted, Weight::ZERO);

        let r1 = &result.rounds[1];
        assert_eq!(r1.votes_for("Alice"), Some(Weight::from_ballots(4)));
        assert_eq!(r1.votes_for("Bob"), Some(Weight::from_ballots(5)));
        assert_eq!(r1.status_of("Bob"), Some(CandidateStatus::Elected));
        assert_eq!(r1.votes_for("Charlie"), Some(Weight::ZERO));

        assert_statuses_monotonic(&result);
    }

    #[test]
    fn irv_first_round_majority() {
        let ballots = vec![
            Ballot::weighted(&["Alice", "Bob"], 6),
            Ballot::weighted(&["Bob", "Alice"], 3),
        ];
        let result = run_election(&cands(&["Alice", "Bob"]), &ballots, &irv_rules()).unwrap();
        assert_eq!(result.winners, vec!["Alice".to_string()]);
        assert_eq!(result.rounds.len(), 1);
        assert_eq!(result.threshold, Weight::from_ballots(5));
    }

    #[test]
    fn round_zero_conserves_ballots() {
        // One ballot ranks only a withdrawn candidate and exhausts at once.
        let mut candidates = cands(&["Alice", "Bob", "Charlie"]);
        candidates[2].excluded = true;
        let ballots = vec![
            Ballot::weighted(&["Alice", "Bob"], 4),
            Ballot::weighted(&["Bob"], 3),
            Ballot::weighted(&["Charlie"], 2),
        ];
        let result = run_election(&candidates, &ballots, &irv_rules()).unwrap();
        let r0 = &result.rounds[0];
        let counted: Weight = r0.tally.iter().map(|c| c.votes).sum();
        assert_eq!(counted + r0.exhausted, Weight::from_ballots(9));
        assert_eq!(r0.exhausted, Weight::from_ballots(2));
        assert_eq!(r0.status_of("Charlie"), Some(CandidateStatus::Eliminated));
        assert_eq!(r0.votes_for("Charlie"), Some(Weight::ZERO));
        assert_eq!(result.winners, vec!["Alice".to_string()]);
    }

    #[test]
    fn irv_terminates_within_candidate_count() {
        // A chain of five candidates with no early majority.
        let ballots = vec![
            Ballot::weighted(&["Eve", "Alice"], 5),
            Ballot::weighted(&["Alice", "Bob"], 4),
            Ballot::weighted(&["Bob", "Alice"], 3),
            Ballot::weighted(&["Charlie", "Alice"], 2),
            Ballot::weighted(&["Dora", "Bob"], 1),
        ];
        let candidates = cands(&["Alice", "Bob", "Charlie", "Dora", "Eve"]);
        let result = run_election(&candidates, &ballots, &irv_rules()).unwrap();
        assert!(result.rounds.len() <= candidates.len());
        assert_eq!(result.winners.len(), 1);
        assert_statuses_monotonic(&result);
    }

    #[test]
    fn tiebreak_by_name_eliminates_last_sorted() {
        let ballots = vec![
            Ballot::weighted(&["Alice"], 3),
            Ballot::weighted(&["Bob", "Alice"], 2),
            Ballot::weighted(&["Charlie", "Bob"], 2),
        ];
        let result =
            run_election(&cands(&["Alice", "Bob", "Charlie"]), &ballots, &irv_rules()).unwrap();
        // Bob and Charlie tie at two votes; Charlie sorts last and goes.
        let r0 = &result.rounds[0];
        assert_eq!(r0.status_of("Charlie"), Some(CandidateStatus::Eliminated));
        assert_eq!(r0.status_of("Bob"), Some(CandidateStatus::Hopeful));
        assert_eq!(result.winners, vec!["Bob".to_string()]);
    }

    #[test]
    fn seeded_tiebreak_is_deterministic() {
        let rules = TallyRules {
            tiebreak_mode: TieBreakMode::Random(42),
            ..TallyRules::DEFAULT_RULES
        };
        let ballots = vec![
            Ballot::weighted(&["Alice"], 3),
            Ballot::weighted(&["Bob", "Alice"], 2),
            Ballot::weighted(&["Charlie", "Bob"], 2),
        ];
        let candidates = cands(&["Alice", "Bob", "Charlie"]);
        let first = run_election(&candidates, &ballots, &rules).unwrap();
        let second = run_election(&candidates, &ballots, &rules).unwrap();
        assert_eq!(first, second);
        // Exactly one of the tied pair went out in round 0.
        let r0 = &first.rounds[0];
        let eliminated: Vec<&str> = r0
            .tally
            .iter()
            .filter(|c| c.status == CandidateStatus::Eliminated)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(eliminated.len(), 1);
        assert!(eliminated[0] == "Bob" || eliminated[0] == "Charlie");
    }

    #[test]
    fn rerun_yields_identical_result() {
        let candidates = cands(&["Alice", "Bob", "Charlie"]);
        let first = run_election(&candidates, &runoff_profile(), &irv_rules()).unwrap();
        let second = run_election(&candidates, &runoff_profile(), &irv_rules()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn stv_elects_against_quota_with_surplus() {
        init_logs();
        // 10 ballots, 2 seats: Droop quota is floor(10 / 3) + 1 = 4.
        let ballots = vec![
            Ballot::weighted(&["Alice", "Bob"], 5),
            Ballot::weighted(&["Bob"], 3),
            Ballot::weighted(&["Charlie"], 2),
        ];
        let result = run_election(
            &cands(&["Alice", "Bob", "Charlie"]),
            &ballots,
            &stv_rules(2),
        )
        .unwrap();

        assert_eq!(result.threshold, Weight::from_ballots(4));
        assert_eq!(
            result.winners,
            vec!["Alice".to_string(), "Bob".to_string()]
        );
        assert_eq!(result.rounds.len(), 2);

        let r0 = &result.rounds[0];
        assert_eq!(r0.status_of("Alice"), Some(CandidateStatus::Elected));
        assert_eq!(r0.votes_for("Alice"), Some(Weight::from_ballots(5)));
        let t = &r0.transfers[0];
        assert_eq!(t.name, "Alice");
        assert_eq!(t.reason, TransferReason::Surplus);
        assert_eq!(t.transfers, vec![("Bob".to_string(), Weight::from_ballots(1))]);

        // After the transfer Alice retains exactly the quota.
        let r1 = &result.rounds[1];
        assert_eq!(r1.votes_for("Alice"), Some(Weight::from_ballots(4)));
        assert_eq!(r1.votes_for("Bob"), Some(Weight::from_ballots(4)));
        assert_eq!(r1.status_of("Bob"), Some(CandidateStatus::Elected));

        assert_statuses_monotonic(&result);
    }

    #[test]
    fn stv_fractional_surplus_floors_on_the_grid() {
        // Six individual ballots for Alice, surplus 2 over a pile of 6:
        // each carries exactly 1/3 of a vote onward, floored to 0.33333.
        let mut ballots: Vec<Ballot> = Vec::new();
        for _ in 0..6 {
            ballots.push(Ballot::new(&["Alice", "Bob"]));
        }
        ballots.push(Ballot::weighted(&["Bob"], 1));
        ballots.push(Ballot::weighted(&["Charlie"], 3));
        // 10 ballots, 2 seats: quota floor(10 / 3) + 1 = 4, Alice surplus 2.
        let result = run_election(
            &cands(&["Alice", "Bob", "Charlie"]),
            &ballots,
            &stv_rules(2),
        )
        .unwrap();
        let r0 = &result.rounds[0];
        let t = &r0.transfers[0];
        assert_eq!(t.name, "Alice");
        // 6 times 0.33333.
        assert_eq!(t.transfers[0].0, "Bob");
        assert_eq!(t.transfers[0].1.units(), 6 * 33_333);
        // Charlie is elected on the original pile in the same count.
        assert_eq!(
            result.winners,
            vec!["Alice".to_string(), "Charlie".to_string()]
        );
    }

    #[test]
    fn stv_default_election_fills_last_seat() {
        init_logs();
        // Quota 4. Alice is elected with a surplus that exhausts; nobody
        // else can reach quota and the last seat fills by default.
        let ballots = vec![
            Ballot::weighted(&["Alice"], 8),
            Ballot::weighted(&["Bob"], 1),
            Ballot::weighted(&["Charlie"], 1),
        ];
        let result = run_election(
            &cands(&["Alice", "Bob", "Charlie"]),
            &ballots,
            &stv_rules(2),
        )
        .unwrap();

        let r0 = &result.rounds[0];
        assert_eq!(r0.status_of("Alice"), Some(CandidateStatus::Elected));
        let t = &r0.transfers[0];
        assert!(t.transfers.is_empty());
        assert_eq!(t.exhausted, Weight::from_ballots(4));

        // Round 1: surplus landed in the exhausted pool, Bob and Charlie
        // tie at the bottom and Charlie goes.
        let r1 = &result.rounds[1];
        assert_eq!(r1.exhausted, Weight::from_ballots(4));
        assert_eq!(r1.status_of("Charlie"), Some(CandidateStatus::Eliminated));

        // Round 2: Bob alone for the last seat.
        let r2 = &result.rounds[2];
        assert_eq!(r2.status_of("Bob"), Some(CandidateStatus::Elected));
        assert_eq!(
            result.winners,
            vec!["Alice".to_string(), "Bob".to_string()]
        );
        assert_statuses_monotonic(&result);
    }

    #[test]
    fn pbv_runs_one_pass_per_seat() {
        init_logs();
        let result = run_election(
            &cands(&["Alice", "Bob", "Charlie"]),
            &runoff_profile(),
            &pbv_rules(2),
        )
        .unwrap();

        // Pass 0 is the plain runoff: Bob wins. Pass 1 reruns without Bob:
        // Alice takes seven of nine first preferences at once.
        assert_eq!(
            result.winners,
            vec!["Bob".to_string(), "Alice".to_string()]
        );
        assert_eq!(result.rounds.len(), 3);
        assert_eq!(result.rounds[0].pass, 0);
        assert_eq!(result.rounds[1].pass, 0);
        assert_eq!(result.rounds[2].pass, 1);

        let r2 = &result.rounds[2];
        assert_eq!(r2.votes_for("Alice"), Some(Weight::from_ballots(7)));
        assert_eq!(r2.votes_for("Charlie"), Some(Weight::from_ballots(2)));
        // The seated winner holds no votes in the second pass.
        assert_eq!(r2.votes_for("Bob"), Some(Weight::ZERO));
        assert_eq!(r2.status_of("Bob"), Some(CandidateStatus::Elected));
        // Charlie, eliminated in pass 0, is back in the running in pass 1.
        assert_eq!(r2.status_of("Charlie"), Some(CandidateStatus::Hopeful));

        // Conservation still holds in the second pass.
        let counted: Weight = r2.tally.iter().map(|c| c.votes).sum();
        assert_eq!(counted + r2.exhausted, Weight::from_ballots(9));
    }

    #[test]
    fn batch_elimination_clears_the_tail() {
        let rules = TallyRules {
            elimination: EliminationAlgorithm::Batch,
            ..TallyRules::DEFAULT_RULES
        };
        let ballots = vec![
            Ballot::weighted(&["Alice"], 8),
            Ballot::weighted(&["Bob"], 6),
            Ballot::weighted(&["Charlie", "Bob"], 2),
            Ballot::weighted(&["Dora", "Bob"], 1),
        ];
        let candidates = cands(&["Alice", "Bob", "Charlie", "Dora"]);
        let batched = run_election(&candidates, &ballots, &rules).unwrap();

        // Charlie and Dora cannot catch Bob even together and go in one
        // round.
        let r0 = &batched.rounds[0];
        assert_eq!(r0.status_of("Charlie"), Some(CandidateStatus::Eliminated));
        assert_eq!(r0.status_of("Dora"), Some(CandidateStatus::Eliminated));
        assert_eq!(batched.rounds.len(), 2);
        assert_eq!(batched.winners, vec!["Bob".to_string()]);

        // Same winner as single elimination, in fewer rounds.
        let single = run_election(&candidates, &ballots, &irv_rules()).unwrap();
        assert_eq!(single.winners, batched.winners);
        assert_eq!(single.rounds.len(), 3);
    }

    #[test]
    fn empty_ballot_set_is_rejected() {
        let err = run_election(&cands(&["Alice", "Bob"]), &[], &irv_rules()).unwrap_err();
        assert_eq!(err, ElectionError::EmptyBallotSet);

        // Ballots with empty rankings do not count either.
        let err = run_election(
            &cands(&["Alice", "Bob"]),
            &[Ballot { ranking: vec![], count: 3 }],
            &irv_rules(),
        )
        .unwrap_err();
        assert_eq!(err, ElectionError::EmptyBallotSet);
    }

    #[test]
    fn insufficient_candidates_is_rejected() {
        let err = run_election(
            &cands(&["Alice", "Bob"]),
            &[Ballot::new(&["Alice"])],
            &stv_rules(3),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ElectionError::InsufficientCandidates {
                seats: 3,
                candidates: 2
            }
        );

        // Excluded candidates cannot fill seats.
        let mut candidates = cands(&["Alice", "Bob", "Charlie"]);
        candidates[1].excluded = true;
        let err = run_election(&candidates, &[Ballot::new(&["Alice"])], &stv_rules(3)).unwrap_err();
        assert_eq!(
            err,
            ElectionError::InsufficientCandidates {
                seats: 3,
                candidates: 2
            }
        );
    }

    #[test]
    fn duplicate_ranking_is_rejected_before_any_round() {
        let err = run_election(
            &cands(&["Alice", "Bob"]),
            &[Ballot::new(&["Alice", "Bob", "Alice"])],
            &irv_rules(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ElectionError::DuplicateRanking {
                name: "Alice".to_string()
            }
        );
    }

    #[test]
    fn unknown_candidate_is_rejected() {
        let err = run_election(
            &cands(&["Alice", "Bob"]),
            &[Ballot::new(&["Alice", "Mallory"])],
            &irv_rules(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ElectionError::UnknownCandidate {
                name: "Mallory".to_string()
            }
        );
    }

    #[test]
    fn duplicate_candidate_is_rejected() {
        let err = run_election(
            &cands(&["Alice", "Bob", "Alice"]),
            &[Ballot::new(&["Alice"])],
            &irv_rules(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ElectionError::DuplicateCandidate {
                name: "Alice".to_string()
            }
        );
    }
}
