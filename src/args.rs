use clap::Parser;

/// Tabulates ranked-choice polls from spreadsheet rank grids.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The ballot data: a rank grid with one column per candidate,
    /// one row per respondent and integer ranks as cells (1 = most preferred).
    /// Timestamp and email columns from a Forms export are skipped.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default irv) The counting method: irv (instant-runoff), stv (single
    /// transferable vote) or pbv (preferential block voting).
    #[clap(short, long, value_parser)]
    pub method: Option<String>,

    /// (default 1) The number of seats to fill. Only meaningful for stv and pbv.
    #[clap(short, long, value_parser)]
    pub seats: Option<u32>,

    /// (default name) How to break elimination ties: name (fixed lexicographic
    /// order) or random (seeded permutation, requires --seed).
    #[clap(long, value_parser)]
    pub tiebreak: Option<String>,

    /// The seed for the random tiebreak mode.
    #[clap(long, value_parser)]
    pub seed: Option<u32>,

    /// If passed, eliminates in one round every bottom candidate that can no
    /// longer catch up. Not available for stv.
    #[clap(long, takes_value = false)]
    pub batch_elimination: bool,

    /// When using an Excel file, indicates the name of the worksheet to use.
    /// Defaults to the first worksheet.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the JSON summary of the
    /// election, including the ballot-flow table. Defaults to stdout.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, rankvote
    /// will check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard
    /// output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
