// Reads the same rank grid from an Excel export of a Forms poll.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::count::{io_common, CountError, CountResult, ParsedBallot};
use crate::count::{MissingHeaderSnafu, MissingWorksheetSnafu, OpeningExcelSnafu};

use log::debug;
use snafu::prelude::*;

pub fn read_xlsx_ranking(
    path: &str,
    worksheet: Option<&str>,
) -> CountResult<(Vec<String>, Vec<ParsedBallot>)> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(MissingWorksheetSnafu { name: "<first>" })?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut rows = wrange.rows();
    let header = rows.next().context(MissingHeaderSnafu {})?;
    debug!("read_xlsx_ranking: header: {:?}", header);

    let columns: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| match cell {
            DataType::String(s) if !io_common::is_metadata_column(s) => {
                Some((idx, s.trim().to_string()))
            }
            _ => None,
        })
        .collect();
    let candidates: Vec<String> = columns.iter().map(|(_, name)| name.clone()).collect();

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let lineno = idx + 2;
        let mut ranks: Vec<(String, u32)> = Vec::new();
        for (col, name) in columns.iter() {
            let rank = match row.get(*col) {
                Some(DataType::Int(i)) if *i > 0 => Some(*i as u32),
                Some(DataType::Float(f)) if *f > 0.0 && f.fract() == 0.0 => Some(*f as u32),
                Some(DataType::String(s)) => s.trim().parse::<u32>().ok(),
                Some(DataType::Empty) | None => None,
                Some(other) => {
                    return Err(CountError::ExcelWrongCellType {
                        lineno,
                        content: format!("{:?}", other),
                    });
                }
            };
            if let Some(r) = rank {
                ranks.push((name.clone(), r));
            }
        }
        debug!("read_xlsx_ranking: line {}: {:?}", lineno, ranks);
        res.push(ParsedBallot {
            id: Some(format!("{}-{:08}", path, lineno)),
            count: Some(1),
            ranks,
        });
    }
    Ok((candidates, res))
}
