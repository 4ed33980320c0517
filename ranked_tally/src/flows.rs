//! Projection of a finished count into the ballot-flow table used to draw
//! a Sankey diagram of vote movement between rounds.

use std::collections::HashMap;
use std::fmt::Display;

use crate::config::{ElectionResult, RoundStats};
use crate::weight::Weight;

/// A node in the flow table: a candidate, or the pool of exhausted ballots.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum FlowEndpoint {
    Candidate(String),
    Exhausted,
}

impl Display for FlowEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowEndpoint::Candidate(name) => write!(f, "{}", name),
            FlowEndpoint::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Votes counted toward `source` in `round` and toward `target` in the
/// round after it, aggregated over identical endpoint pairs.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FlowRecord {
    pub round: u32,
    pub source: FlowEndpoint,
    pub target: FlowEndpoint,
    pub weight: Weight,
}

/// Flattens the round history into the source→target flow table.
///
/// Each pair of consecutive rounds contributes the recorded transfers, a
/// self-edge for every candidate with the votes it retained, and the
/// carried-forward exhausted pool. The edges into any round's node add up
/// to that node's tally entry. Preferential block passes restart the
/// count, so no edge crosses a pass boundary.
pub fn ballot_flows(result: &ElectionResult) -> Vec<FlowRecord> {
    let mut records: Vec<FlowRecord> = Vec::new();
    for pair in result.rounds.windows(2) {
        let (cur, next) = (&pair[0], &pair[1]);
        if cur.pass != next.pass {
            continue;
        }
        flows_between(cur, next, &mut records);
    }
    records
}

fn flows_between(cur: &RoundStats, next: &RoundStats, records: &mut Vec<FlowRecord>) {
    let mut incoming: HashMap<&str, Weight> = HashMap::new();
    for t in cur.transfers.iter() {
        for (target, w) in t.transfers.iter() {
            if w.is_zero() {
                continue;
            }
            records.push(FlowRecord {
                round: cur.round,
                source: FlowEndpoint::Candidate(t.name.clone()),
                target: FlowEndpoint::Candidate(target.clone()),
                weight: *w,
            });
            *incoming.entry(target.as_str()).or_insert(Weight::ZERO) += *w;
        }
        if !t.exhausted.is_zero() {
            records.push(FlowRecord {
                round: cur.round,
                source: FlowEndpoint::Candidate(t.name.clone()),
                target: FlowEndpoint::Exhausted,
                weight: t.exhausted,
            });
        }
    }

    // Whatever a candidate holds in the next round beyond what just arrived
    // stayed with it.
    for entry in next.tally.iter() {
        let received = incoming
            .get(entry.name.as_str())
            .copied()
            .unwrap_or(Weight::ZERO);
        let retained = entry.votes.saturating_sub(received);
        if !retained.is_zero() {
            records.push(FlowRecord {
                round: cur.round,
                source: FlowEndpoint::Candidate(entry.name.clone()),
                target: FlowEndpoint::Candidate(entry.name.clone()),
                weight: retained,
            });
        }
    }

    if !cur.exhausted.is_zero() {
        records.push(FlowRecord {
            round: cur.round,
            source: FlowEndpoint::Exhausted,
            target: FlowEndpoint::Exhausted,
            weight: cur.exhausted,
        });
    }
}
