use log::{debug, info, warn};

use ranked_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum CountError {
    #[snafu(display("Error opening input file {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing CSV input"))]
    CsvParse { source: csv::Error },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Workbook has no worksheet named {name}"))]
    MissingWorksheet { name: String },
    #[snafu(display("The input has no header row"))]
    MissingHeader {},
    #[snafu(display("Cell at line {lineno} has an unusable type: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error reading summary file"))]
    OpeningJson { source: std::io::Error },
    #[snafu(display("Error handling JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("The count failed: {source}"))]
    Tally { source: ElectionError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CountResult<T> = Result<T, CountError>;

/// A ballot as parsed by the readers: the integer rank each respondent gave
/// to each candidate, before being ordered into a ranking.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub count: Option<u64>,
    pub ranks: Vec<(String, u32)>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub input: String,
    pub method: String,
    pub seats: u32,
    pub threshold: Option<String>,
}

fn validate_rules(args: &Args) -> CountResult<TallyRules> {
    let method = match args.method.as_deref().unwrap_or("irv") {
        "irv" => VotingMethod::InstantRunoff,
        "stv" => VotingMethod::SingleTransferableVote,
        "pbv" => VotingMethod::PreferentialBlock,
        x => {
            whatever!("Unknown counting method {:?}", x)
        }
    };
    let tiebreak_mode = match args.tiebreak.as_deref().unwrap_or("name") {
        "name" => TieBreakMode::ByName,
        "random" => match args.seed {
            Some(seed) => TieBreakMode::Random(seed),
            None => {
                whatever!("The random tiebreak mode requires --seed")
            }
        },
        x => {
            whatever!("Unknown tiebreak mode {:?}", x)
        }
    };
    Ok(TallyRules {
        method,
        num_seats: args.seats.unwrap_or(1),
        tiebreak_mode,
        elimination: if args.batch_elimination {
            EliminationAlgorithm::Batch
        } else {
            EliminationAlgorithm::Single
        },
    })
}

/// Orders the parsed rank cells of each respondent into a ballot. Rows that
/// ranked nothing are dropped here; the engine checks the rest.
fn assemble_ballots(parsed: &[ParsedBallot]) -> Vec<Ballot> {
    parsed
        .iter()
        .filter_map(|pb| {
            let ranking = io_common::assemble_ranking(&pb.ranks);
            let count = pb.count.unwrap_or(1);
            if ranking.is_empty() || count == 0 {
                debug!("assemble_ballots: skipping empty ballot {:?}", pb.id);
                None
            } else {
                Some(Ballot { ranking, count })
            }
        })
        .collect()
}

fn status_label(status: CandidateStatus) -> &'static str {
    match status {
        CandidateStatus::Hopeful => "hopeful",
        CandidateStatus::Elected => "elected",
        CandidateStatus::Eliminated => "eliminated",
    }
}

fn result_stats_to_json(result: &ElectionResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round in result.rounds.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        let mut statuses: JSMap<String, JSValue> = JSMap::new();
        for entry in round.tally.iter() {
            tally.insert(entry.name.clone(), json!(entry.votes.to_string()));
            statuses.insert(entry.name.clone(), json!(status_label(entry.status)));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        for t in round.transfers.iter() {
            let mut transfers: JSMap<String, JSValue> = JSMap::new();
            for (name, w) in t.transfers.iter() {
                transfers.insert(name.clone(), json!(w.to_string()));
            }
            if !t.exhausted.is_zero() {
                transfers.insert("exhausted".to_string(), json!(t.exhausted.to_string()));
            }
            let key = match t.reason {
                TransferReason::Eliminated => "eliminated",
                TransferReason::Surplus => "elected",
            };
            let mut entry: JSMap<String, JSValue> = JSMap::new();
            entry.insert(key.to_string(), json!(t.name));
            entry.insert("transfers".to_string(), JSValue::Object(transfers));
            tally_results.push(JSValue::Object(entry));
        }

        l.push(json!({
            "round": round.round,
            "pass": round.pass,
            "threshold": round.threshold.to_string(),
            "exhausted": round.exhausted.to_string(),
            "tally": tally,
            "statuses": statuses,
            "tallyResults": tally_results,
        }));
    }
    l
}

fn flows_to_json(flows: &[FlowRecord]) -> Vec<JSValue> {
    flows
        .iter()
        .map(|r| {
            json!({
                "round": r.round,
                "source": r.source.to_string(),
                "target": r.target.to_string(),
                "weight": r.weight.to_string(),
            })
        })
        .collect()
}

fn build_summary_js(config: &OutputConfig, result: &ElectionResult) -> JSValue {
    json!({
        "config": config,
        "winners": result.winners,
        "results": result_stats_to_json(result),
        "flows": flows_to_json(&ballot_flows(result)),
    })
}

fn read_summary(path: &str) -> CountResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
    debug!("read_summary: {} bytes from {}", contents.len(), path);
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn run_count(args: &Args) -> CountResult<()> {
    let rules = validate_rules(args)?;

    let input_type = args.input_type.as_deref().unwrap_or("csv");
    info!("Reading {} input from {}", input_type, args.input);
    let (candidate_names, parsed) = match input_type {
        "csv" => io_csv::read_csv_ranking(&args.input)?,
        "xlsx" => io_xlsx::read_xlsx_ranking(&args.input, args.excel_worksheet_name.as_deref())?,
        x => {
            whatever!("Unknown input type {:?}", x)
        }
    };
    info!(
        "Found {} candidate columns and {} respondent rows",
        candidate_names.len(),
        parsed.len()
    );

    let candidates: Vec<Candidate> = candidate_names.iter().map(|n| Candidate::new(n)).collect();
    let ballots = assemble_ballots(&parsed);

    let result = run_election(&candidates, &ballots, &rules).context(TallySnafu {})?;
    for w in result.winners.iter() {
        info!("Winner: {}", w);
    }

    let config = OutputConfig {
        input: args.input.clone(),
        method: args.method.clone().unwrap_or_else(|| "irv".to_string()),
        seats: rules.num_seats,
        threshold: Some(result.threshold.to_string()),
    };
    let summary = build_summary_js(&config, &result);
    let pretty = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty),
        Some(path) => {
            fs::write(path, &pretty).context(OpeningJsonSnafu {})?;
            info!("Summary written to {}", path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = args.reference.as_deref() {
        let reference = read_summary(reference_path)?;
        let pretty_ref = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
        if pretty_ref != pretty {
            warn!("Found differences with the reference summary");
            print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: &str = "\
Timestamp,Alice,Bob,Charlie
2024-05-01 10:00:00,1,2,3
2024-05-01 10:01:00,1,2,3
2024-05-01 10:02:00,1,2,3
2024-05-01 10:03:00,1,2,3
2024-05-01 10:04:00,2,1,3
2024-05-01 10:05:00,2,1,3
2024-05-01 10:06:00,2,1,3
2024-05-01 10:07:00,3,2,1
2024-05-01 10:08:00,3,2,1
";

    #[test]
    fn csv_grid_runs_end_to_end() {
        let (names, parsed) = io_csv::read_csv_records(GRID.as_bytes(), "grid.csv").unwrap();
        assert_eq!(names, vec!["Alice", "Bob", "Charlie"]);
        assert_eq!(parsed.len(), 9);

        let candidates: Vec<Candidate> = names.iter().map(|n| Candidate::new(n)).collect();
        let ballots = assemble_ballots(&parsed);
        assert_eq!(ballots.len(), 9);
        assert_eq!(
            ballots[8].ranking,
            vec!["Charlie".to_string(), "Bob".to_string(), "Alice".to_string()]
        );

        // Charlie goes out first and his voters break to Bob.
        let result = run_election(&candidates, &ballots, &TallyRules::DEFAULT_RULES).unwrap();
        assert_eq!(result.winners, vec!["Bob".to_string()]);
        assert_eq!(result.rounds.len(), 2);
    }

    #[test]
    fn blank_and_junk_cells_are_unranked() {
        let grid = "\
Alice,Bob,Charlie
1,,2
x,1,
,,
";
        let (names, parsed) = io_csv::read_csv_records(grid.as_bytes(), "grid.csv").unwrap();
        assert_eq!(names.len(), 3);
        let ballots = assemble_ballots(&parsed);
        // The all-blank row is dropped.
        assert_eq!(ballots.len(), 2);
        assert_eq!(
            ballots[0].ranking,
            vec!["Alice".to_string(), "Charlie".to_string()]
        );
        assert_eq!(ballots[1].ranking, vec!["Bob".to_string()]);
    }

    #[test]
    fn summary_carries_rounds_and_flows() {
        let (names, parsed) = io_csv::read_csv_records(GRID.as_bytes(), "grid.csv").unwrap();
        let candidates: Vec<Candidate> = names.iter().map(|n| Candidate::new(n)).collect();
        let ballots = assemble_ballots(&parsed);
        let result = run_election(&candidates, &ballots, &TallyRules::DEFAULT_RULES).unwrap();

        let config = OutputConfig {
            input: "grid.csv".to_string(),
            method: "irv".to_string(),
            seats: 1,
            threshold: Some(result.threshold.to_string()),
        };
        let js = build_summary_js(&config, &result);

        assert_eq!(js["winners"], json!(["Bob"]));
        let rounds = js["results"].as_array().unwrap();
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0]["tally"]["Alice"], json!("4"));
        assert_eq!(rounds[0]["statuses"]["Charlie"], json!("eliminated"));
        assert_eq!(rounds[0]["tallyResults"][0]["eliminated"], json!("Charlie"));
        assert_eq!(rounds[0]["tallyResults"][0]["transfers"]["Bob"], json!("2"));

        let flows = js["flows"].as_array().unwrap();
        assert!(flows
            .iter()
            .any(|f| f["source"] == json!("Charlie") && f["target"] == json!("Bob")));
    }
}
