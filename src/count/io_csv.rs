// Primitives for reading CSV rank grids.

use std::fs::File;
use std::io::Read;

use crate::count::{io_common, CountResult, ParsedBallot};
use crate::count::{CsvLineTooShortSnafu, CsvParseSnafu, OpeningInputSnafu};

use log::debug;
use snafu::prelude::*;

/// Reads a rank grid: the header row names the candidates, every following
/// row holds one respondent's integer ranks. Returns the candidate names in
/// column order and the parsed rows.
pub fn read_csv_ranking(path: &str) -> CountResult<(Vec<String>, Vec<ParsedBallot>)> {
    let file = File::open(path).context(OpeningInputSnafu { path })?;
    read_csv_records(file, path)
}

pub fn read_csv_records<R: Read>(
    input: R,
    origin: &str,
) -> CountResult<(Vec<String>, Vec<ParsedBallot>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);
    let headers = rdr.headers().context(CsvParseSnafu {})?.clone();
    debug!("read_csv_records: header: {:?}", headers);

    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !io_common::is_metadata_column(h))
        .map(|(idx, h)| (idx, h.trim().to_string()))
        .collect();
    let candidates: Vec<String> = columns.iter().map(|(_, name)| name.clone()).collect();

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // Line numbers are 1-based and the header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvParseSnafu {})?;
        let mut ranks: Vec<(String, u32)> = Vec::new();
        for (col, name) in columns.iter() {
            let cell = line.get(*col).context(CsvLineTooShortSnafu { lineno })?;
            // Blank and non-numeric cells mean this candidate was not ranked.
            if let Ok(rank) = cell.trim().parse::<u32>() {
                ranks.push((name.clone(), rank));
            }
        }
        debug!("read_csv_records: line {}: {:?}", lineno, ranks);
        res.push(ParsedBallot {
            id: Some(format!("{}-{:08}", origin, lineno)),
            count: Some(1),
            ranks,
        });
    }
    Ok((candidates, res))
}
