mod spreadsheet;

pub use spreadsheet::{
    is_spreadsheet, parse_spreadsheet, IngestError, ParseFailurePolicy, RowMap,
};
