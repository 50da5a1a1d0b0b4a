use classify_logging::{classify_debug, classify_warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Displayable table decoded from a classification response.
///
/// Rows keep whatever cell count the payload had; they are not padded or
/// truncated to the header width.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassificationResult {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ClassificationResult {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

/// Decode a delimited-text payload: first record is the header row, the rest are data rows.
///
/// Blank records (no fields, or a single empty field) are dropped. Invalid UTF-8 is
/// replaced lossily. Leading blank lines are skipped by the reader, so the first
/// non-blank line is the header.
pub fn decode_table(bytes: &[u8]) -> ClassificationResult {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match read_records(bytes) {
        Ok(mut records) => {
            if records.is_empty() {
                return ClassificationResult::default();
            }
            let headers = records.remove(0);
            let before = records.len();
            let rows: Vec<Vec<String>> = records.into_iter().filter(|row| !is_blank(row)).collect();
            classify_debug!(
                "Decoded table: {} columns, {} rows ({} blank dropped)",
                headers.len(),
                rows.len(),
                before - rows.len()
            );
            ClassificationResult { headers, rows }
        }
        // Unreachable for in-memory input with a flexible reader; kept as a guard.
        Err(err) => {
            classify_warn!("Response could not be decoded as a table: {}", err);
            ClassificationResult::default()
        }
    }
}

fn read_records(bytes: &[u8]) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        records.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }
    Ok(records)
}

fn is_blank(row: &[String]) -> bool {
    match row {
        [] => true,
        [only] => only.is_empty(),
        _ => false,
    }
}
