use std::{fmt, fs, path::Path};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::{
    configuration::OutputSettings,
    dal::tender_db,
    domain::tender::{TenderRecord, TENDER_FIELDS},
    error::SinkError,
};

use super::report::generate_leads_report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Csv,
    Json,
    Db,
    Report,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Destination::Csv => "csv",
            Destination::Json => "json",
            Destination::Db => "db",
            Destination::Report => "report",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationOutcome {
    pub destination: Destination,
    pub written: usize,
    pub error: Option<String>,
}

pub struct Sink<'a> {
    output: &'a OutputSettings,
    pool: Option<&'a PgPool>,
}

impl<'a> Sink<'a> {
    pub fn new(output: &'a OutputSettings, pool: Option<&'a PgPool>) -> Self {
        Sink { output, pool }
    }

    pub async fn write(
        &self,
        records: &[TenderRecord],
        destinations: &[Destination],
        today: NaiveDate,
    ) -> Vec<DestinationOutcome> {
        let mut outcomes = vec![];

        for &destination in destinations {
            let result = match destination {
                Destination::Csv => write_csv(&self.output.csv_path(), records),
                Destination::Json => write_json(&self.output.json_path(), records),
                Destination::Report => {
                    let report = generate_leads_report(records, &self.output.keywords, today);
                    write_file(destination, &self.output.report_path(), report.as_bytes())
                        .map(|_| records.len())
                }
                Destination::Db => self.write_db(records).await,
            };

            let outcome = match result {
                Ok(written) => {
                    log::info!("Wrote {} records to {}", written, destination);
                    DestinationOutcome {
                        destination,
                        written,
                        error: None,
                    }
                }
                Err(e) => {
                    log::error!("{}", e);
                    DestinationOutcome {
                        destination,
                        written: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn write_db(&self, records: &[TenderRecord]) -> Result<usize, SinkError> {
        let pool = self
            .pool
            .ok_or_else(|| SinkError::write_failure(Destination::Db, "no database configured"))?;

        tender_db::upsert_tenders(pool, records)
            .await
            .map_err(|e| SinkError::write_failure(Destination::Db, e))
    }
}

fn write_file(destination: Destination, path: &Path, contents: &[u8]) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                SinkError::write_failure(destination, format!("{}: {}", parent.display(), e))
            })?;
        }
    }

    fs::write(path, contents)
        .map_err(|e| SinkError::write_failure(destination, format!("{}: {}", path.display(), e)))
}

pub fn to_csv_bytes(records: &[TenderRecord]) -> Result<Vec<u8>, csv::Error> {
    // Header written by hand so an empty run still produces one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    writer.write_record(TENDER_FIELDS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

pub fn write_csv(path: &Path, records: &[TenderRecord]) -> Result<usize, SinkError> {
    let bytes = to_csv_bytes(records).map_err(|e| SinkError::write_failure(Destination::Csv, e))?;
    write_file(Destination::Csv, path, &bytes)?;
    Ok(records.len())
}

pub fn read_csv(path: &Path) -> Result<Vec<TenderRecord>, csv::Error> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?
        .deserialize()
        .collect()
}

pub fn write_json(path: &Path, records: &[TenderRecord]) -> Result<usize, SinkError> {
    let mut json = serde_json::to_string_pretty(records)
        .map_err(|e| SinkError::write_failure(Destination::Json, e))?;
    json.push('\n');
    write_file(Destination::Json, path, json.as_bytes())?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use std::{fs, str::FromStr};

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{read_csv, write_csv, write_json, Destination, Sink};
    use crate::{
        configuration::OutputSettings,
        domain::tender::{sample_record, TenderRecord},
    };

    fn records() -> Vec<TenderRecord> {
        let mut road = sample_record("muni-a", "Road Repair Contract");
        road.deadline = NaiveDate::from_ymd_opt(2024, 3, 1);
        road.value = Some(Decimal::from(12000));
        road.currency = Some("USD".to_string());
        road.url = Some("https://x/1".to_string());
        road.buyer = Some("City of Springfield, Roads \"Dept\"".to_string());

        let mut audit = sample_record("muni-b", "Pension fund actuarial audit");
        audit.value = Some(Decimal::from_str("1500.5").unwrap());
        audit.description = Some("Line one\nline two".to_string());
        audit.reference = Some("RFP-17".to_string());

        vec![road, audit, sample_record("muni-b", "Bridge inspection")]
    }

    fn output(dir: &std::path::Path, destinations: Vec<Destination>) -> OutputSettings {
        OutputSettings {
            directory: dir.to_path_buf(),
            file_stem: "tenders".to_string(),
            destinations,
            keywords: vec![],
        }
    }

    #[test]
    fn csv_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_csv(&path, &records()).unwrap();
        let parsed = read_csv(&path).unwrap();

        assert_eq!(parsed, records());
    }

    #[test]
    fn csv_header_is_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv(&path, &[]).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "source_id,title,reference,deadline,buyer,value,currency,location,url,description\n"
        );
    }

    #[test]
    fn exports_are_byte_identical_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");
        let json_path = dir.path().join("out.json");

        write_csv(&csv_path, &records()).unwrap();
        write_json(&json_path, &records()).unwrap();
        let first = (fs::read(&csv_path).unwrap(), fs::read(&json_path).unwrap());

        write_csv(&csv_path, &records()).unwrap();
        write_json(&json_path, &records()).unwrap();
        let second = (fs::read(&csv_path).unwrap(), fs::read(&json_path).unwrap());

        assert_eq!(first, second);
    }

    #[test]
    fn json_uses_iso_dates_and_decimal_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_json(&path, &records()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(json[0]["deadline"], "2024-03-01");
        assert_eq!(json[0]["value"], "12000");
        assert_eq!(json[0]["currency"], "USD");
        assert_eq!(json[1]["value"], "1500.5");
        assert!(json[2]["deadline"].is_null());
        assert_eq!(json.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failing_destination_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let output = output(dir.path(), vec![]);
        // A directory where the csv file should go
        fs::create_dir_all(output.csv_path()).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let outcomes = Sink::new(&output, None)
            .write(
                &records(),
                &[Destination::Csv, Destination::Db, Destination::Json, Destination::Report],
                today,
            )
            .await;

        let failed: Vec<Destination> = outcomes
            .iter()
            .filter(|o| o.error.is_some())
            .map(|o| o.destination)
            .collect();
        assert_eq!(failed, vec![Destination::Csv, Destination::Db]);
        assert_eq!(outcomes[2].written, 3);
        assert!(output.json_path().is_file());
        assert!(output.report_path().is_file());
    }
}
