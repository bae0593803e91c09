//! Delimited file reader.
//!
//! Reads a header row plus data rows and returns every row as a
//! [`RawRow`] keyed by the trimmed header names. Cell values are kept
//! verbatim: entity names are later matched byte-for-byte, so nothing here
//! may rewrite them.

use std::io::Read;

use idp_map_dataset_models::RawRow;

use crate::DatasetError;

/// Trimmed header names and the rows keyed by them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Header names in file order, trimmed. Blank headers are kept so
    /// positions line up with the file.
    pub headers: Vec<String>,
    /// Data rows.
    pub rows: Vec<RawRow>,
}

/// Reads the header row and every data row of a delimited file.
///
/// Short rows are accepted; cells past the end of a row are left out of its
/// [`RawRow`] rather than filled with empty strings. The header row is the
/// only complete list of columns.
///
/// # Errors
///
/// Returns [`DatasetError`] if the input is not valid delimited text or has
/// no header row.
pub fn read_raw_table<R: Read>(reader: R, delimiter: u8) -> Result<RawTable, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(DatasetError::Format {
            message: "file contains no header row".to_owned(),
        });
    }

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;

        let row: RawRow = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .filter_map(|(i, header)| record.get(i).map(|v| (header.clone(), v.to_owned())))
            .collect();
        rows.push(row);
    }

    log::debug!("Read {} rows with {} columns", rows.len(), headers.len());

    Ok(RawTable { headers, rows })
}

/// Reads every row of a delimited file from `reader`, dropping the header.
///
/// # Errors
///
/// Returns [`DatasetError`] if the input is not valid delimited text or has
/// no header row.
pub fn read_raw_rows<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawRow>, DatasetError> {
    Ok(read_raw_table(reader, delimiter)?.rows)
}
