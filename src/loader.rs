use crate::error::Result;
use crate::normalize::normalize;
use crate::types::{RawRow, ShiftOffer};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// What happened while reading and normalizing an extract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Records the CSV layer could not read at all.
    pub skipped_rows: usize,
    /// Cells that were not valid UTF-8 and were read as missing.
    pub undecodable_cells: usize,
    pub missing_start: usize,
    /// Non-empty timestamp cells that did not parse.
    pub unparsed_timestamps: usize,
    /// Non-empty numeric cells that did not parse.
    pub unparsed_numbers: usize,
}

impl LoadReport {
    fn observe(&mut self, raw: &RawRow, offer: &ShiftOffer) {
        let present = |cell: &Option<String>| cell.as_deref().is_some_and(|s| !s.trim().is_empty());
        let lost = |cell: &Option<String>, parsed: bool| usize::from(present(cell) && !parsed);

        if offer.shift_start_at.is_none() {
            self.missing_start += 1;
        }
        self.unparsed_timestamps += lost(&raw.shift_start_at, offer.shift_start_at.is_some())
            + lost(&raw.shift_created_at, offer.shift_created_at.is_some())
            + lost(&raw.offer_viewed_at, offer.offer_viewed_at.is_some())
            + lost(&raw.claimed_at, offer.claimed_at.is_some())
            + lost(&raw.canceled_at, offer.canceled_at.is_some())
            + lost(&raw.deleted_at, offer.deleted_at.is_some());
        self.unparsed_numbers += lost(&raw.pay_rate, offer.pay_rate.is_some())
            + lost(&raw.charge_rate, offer.charge_rate.is_some())
            + lost(&raw.duration, offer.duration.is_some());
    }
}

pub fn load_path(path: impl AsRef<Path>) -> Result<(Vec<ShiftOffer>, LoadReport)> {
    let path = path.as_ref();
    let rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    info!(path = %path.display(), "loading shift offers");
    load_from_reader(rdr)
}

pub fn load_reader<R: Read>(reader: R) -> Result<(Vec<ShiftOffer>, LoadReport)> {
    load_from_reader(ReaderBuilder::new().flexible(true).from_reader(reader))
}

/// Decode each cell on its own; a cell that is not UTF-8 becomes empty so
/// the rest of the record survives.
fn decode_record(record: &ByteRecord) -> (StringRecord, usize) {
    let mut bad = 0;
    let text: StringRecord = record
        .iter()
        .map(|cell| {
            std::str::from_utf8(cell).unwrap_or_else(|_| {
                bad += 1;
                ""
            })
        })
        .collect();
    (text, bad)
}

fn load_from_reader<R: Read>(mut rdr: csv::Reader<R>) -> Result<(Vec<ShiftOffer>, LoadReport)> {
    let mut report = LoadReport::default();
    let mut offers: Vec<ShiftOffer> = Vec::new();
    let headers = StringRecord::from_byte_record_lossy(rdr.byte_headers()?.clone());

    for result in rdr.byte_records() {
        report.total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(err) => {
                warn!(record = report.total_rows, error = %err, "skipping unreadable record");
                report.skipped_rows += 1;
                continue;
            }
        };
        let (text, bad) = decode_record(&record);
        if bad > 0 {
            debug!(record = report.total_rows, cells = bad, "non UTF-8 cells read as missing");
            report.undecodable_cells += bad;
        }
        let row = match text.deserialize::<RawRow>(Some(&headers)) {
            Ok(r) => r,
            Err(err) => {
                warn!(record = report.total_rows, error = %err, "skipping undecodable record");
                report.skipped_rows += 1;
                continue;
            }
        };
        let offer = normalize(&row);
        report.observe(&row, &offer);
        offers.push(offer);
    }

    info!(
        rows = report.total_rows,
        skipped = report.skipped_rows,
        undecodable_cells = report.undecodable_cells,
        missing_start = report.missing_start,
        "loaded shift offers"
    );
    Ok((offers, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_degraded_cells() {
        let csv = "\
SHIFT_ID,WORKPLACE_ID,SHIFT_START_AT,PAY_RATE,CHARGE_RATE,DURATION,IS_NCNS
s1,W1,2024-01-05 08:00:00,10,15,2,False
s2,W1,not-a-date,ten,,2,True
";
        let (offers, report) = load_reader(csv.as_bytes()).unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(report.missing_start, 1);
        assert_eq!(report.unparsed_timestamps, 1);
        // The empty charge rate is missing, not unparsed.
        assert_eq!(report.unparsed_numbers, 1);
        assert!(offers[1].is_ncns);
        assert!(!offers[0].is_ncns);
    }

    #[test]
    fn short_records_fill_with_nulls() {
        let csv = "SHIFT_ID,WORKPLACE_ID,PAY_RATE\ns1,W1\n";
        let (offers, report) = load_reader(csv.as_bytes()).unwrap();
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(offers[0].workplace_id.as_deref(), Some("W1"));
        assert_eq!(offers[0].pay_rate, None);
    }

    #[test]
    fn invalid_utf8_cell_only_nulls_that_cell() {
        let mut csv = b"SHIFT_ID,WORKPLACE_ID,PAY_RATE\ns1,W1,10\ns2,".to_vec();
        csv.extend_from_slice(&[0xFF, 0xFE]);
        csv.extend_from_slice(b",12\n");

        let (offers, report) = load_reader(csv.as_slice()).unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(report.undecodable_cells, 1);
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[1].shift_id.as_deref(), Some("s2"));
        assert_eq!(offers[1].workplace_id, None);
        assert_eq!(offers[1].pay_rate, Some(12.0));
    }
}
