use std::fs;
use std::io::Write;
use std::path::Path;

use alphabatch_model::{AlphaId, CheckValues, ResultRecord};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::table::ResultTable;
use crate::error::Result;

/// Column layout of the results file.
pub const HEADER: [&str; 9] = [
    "alpha_id",
    "creation_time",
    "formula",
    "LOW_SHARPE",
    "LOW_FITNESS",
    "LOW_TURNOVER",
    "HIGH_TURNOVER",
    "LOW_SUB_UNIVERSE_SHARPE",
    "submitted",
];

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    alpha_id: String,
    #[serde(default)]
    creation_time: String,
    #[serde(default)]
    formula: String,
    #[serde(
        rename = "LOW_SHARPE",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    low_sharpe: Option<f64>,
    #[serde(
        rename = "LOW_FITNESS",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    low_fitness: Option<f64>,
    #[serde(
        rename = "LOW_TURNOVER",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    low_turnover: Option<f64>,
    #[serde(
        rename = "HIGH_TURNOVER",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    high_turnover: Option<f64>,
    #[serde(
        rename = "LOW_SUB_UNIVERSE_SHARPE",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    low_sub_universe_sharpe: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        serialize_with = "titlecase_bool"
    )]
    submitted: bool,
}

/// Reads `True`/`true`/`1`/`yes` as true; anything else, including an empty
/// cell, as false.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.is_some_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes"
        )
    }))
}

fn titlecase_bool<S>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(if *value { "True" } else { "False" })
}

impl From<CsvRow> for ResultRecord {
    fn from(row: CsvRow) -> Self {
        ResultRecord {
            alpha_id: AlphaId::new(row.alpha_id),
            created_at: row.creation_time,
            formula: row.formula,
            check_values: CheckValues {
                low_sharpe: row.low_sharpe.unwrap_or(0.0),
                low_fitness: row.low_fitness.unwrap_or(0.0),
                low_turnover: row.low_turnover.unwrap_or(0.0),
                high_turnover: row.high_turnover.unwrap_or(0.0),
                low_sub_universe_sharpe: row
                    .low_sub_universe_sharpe
                    .unwrap_or(0.0),
            },
            submitted: row.submitted,
        }
    }
}

impl From<&ResultRecord> for CsvRow {
    fn from(record: &ResultRecord) -> Self {
        let values = record.check_values;
        CsvRow {
            alpha_id: record.alpha_id.to_string(),
            creation_time: record.created_at.clone(),
            formula: record.formula.clone(),
            low_sharpe: Some(values.low_sharpe),
            low_fitness: Some(values.low_fitness),
            low_turnover: Some(values.low_turnover),
            high_turnover: Some(values.high_turnover),
            low_sub_universe_sharpe: Some(values.low_sub_universe_sharpe),
            submitted: record.submitted,
        }
    }
}

/// Loads the table at `path`. A missing file is an empty table.
pub fn read_table(path: &Path) -> Result<ResultTable> {
    if !path.exists() {
        return Ok(ResultTable::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row?;
        if row.alpha_id.trim().is_empty() {
            continue;
        }
        records.push(ResultRecord::from(row));
    }
    Ok(ResultTable::from_records(records))
}

/// Rewrites the whole file through a sibling temporary file and a rename.
pub fn write_table(path: &Path, table: &ResultTable) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut staged = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(staged.as_file_mut());
        writer.write_record(HEADER)?;
        for record in table.records() {
            writer.serialize(CsvRow::from(record))?;
        }
        writer.flush()?;
    }
    staged.as_file_mut().flush()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_file_without_submitted_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(
            &path,
            "alpha_id,creation_time,formula,LOW_SHARPE,LOW_FITNESS,LOW_TURNOVER,HIGH_TURNOVER,LOW_SUB_UNIVERSE_SHARPE\n\
             A1,2024-01-01,rank(x),1.5,1.1,0.1,0.2,0.9\n",
        )
        .unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.len(), 1);
        let record = &table.records()[0];
        assert!(!record.submitted);
        assert_eq!(record.check_values.low_sub_universe_sharpe, 0.9);
    }

    #[test]
    fn reads_pandas_style_booleans_and_blank_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(
            &path,
            "alpha_id,creation_time,formula,LOW_SHARPE,LOW_FITNESS,LOW_TURNOVER,HIGH_TURNOVER,LOW_SUB_UNIVERSE_SHARPE,submitted\n\
             A1,t,f1,1.5,,0.1,0.2,0.9,True\n\
             A2,t,f2,1.5,1.0,0.1,0.2,0.9,\n\
             A3,t,f3,1.5,1.0,0.1,0.2,0.9,False\n",
        )
        .unwrap();

        let table = read_table(&path).unwrap();
        let flags: Vec<bool> = table.records().iter().map(|r| r.submitted).collect();
        assert_eq!(flags, vec![true, false, false]);
        assert_eq!(table.records()[0].check_values.low_fitness, 0.0);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = read_table(&dir.path().join("absent.csv")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn write_creates_parent_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("results.csv");
        let mut table = ResultTable::new();
        table.upsert(ResultRecord {
            alpha_id: AlphaId::from("A1"),
            created_at: "2024-01-01".into(),
            formula: "rank(close, 5)".into(),
            check_values: CheckValues::default(),
            submitted: true,
        });

        write_table(&path, &table).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next().unwrap(), HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("A1,2024-01-01,\"rank(close, 5)\","));
        assert!(row.ends_with(",True"));
        assert_eq!(read_table(&path).unwrap(), table);
    }
}
