//! Factor store keeping one CSV file per store id and date.

use std::fs;
use std::path::{Path, PathBuf};

use intramom_traits::{Date, FactorRow, FactorStore, FactorTable, IntramomError, Result};
use tracing::debug;

use crate::KEY_FORMAT;

/// Factor store on the local file system.
///
/// Tables live at `<root>/<store_id>/<YYYYMMDD>.csv` with the header
/// `date,id,<value columns...>`. Missing values are written as empty cells
/// and read back as NaN.
#[derive(Debug, Clone)]
pub struct CsvFactorStore {
    root: PathBuf,
}

impl CsvFactorStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `store_id` at `key`.
    pub fn table_path(&self, store_id: &str, key: Date) -> PathBuf {
        self.root
            .join(store_id)
            .join(format!("{}.csv", key.format(KEY_FORMAT)))
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_value(field: &str) -> Result<f64> {
    let field = field.trim();
    if field.is_empty() || field.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    field
        .parse()
        .map_err(|e| IntramomError::InvalidData(format!("bad factor value {field:?}: {e}")))
}

impl FactorStore for CsvFactorStore {
    fn write(&self, store_id: &str, key: Date, table: &FactorTable) -> Result<()> {
        let path = self.table_path(store_id, key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut writer = csv::Writer::from_path(&path)?;
        let mut header = vec!["date", "id"];
        header.extend(table.columns().iter().map(String::as_str));
        writer.write_record(&header)?;

        for row in table.rows() {
            let mut record = Vec::with_capacity(row.values.len() + 2);
            record.push(row.date.to_string());
            record.push(row.id.clone());
            record.extend(row.values.iter().map(|v| format_value(*v)));
            writer.write_record(&record)?;
        }
        writer.flush()?;

        debug!(path = %path.display(), rows = table.len(), "wrote factor table");
        Ok(())
    }

    fn read(&self, store_id: &str, key: Date) -> Result<Option<FactorTable>> {
        let path = self.table_path(store_id, key);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();
        if headers.get(0) != Some("date") || headers.get(1) != Some("id") {
            return Err(IntramomError::InvalidData(format!(
                "{} does not start with date,id",
                path.display()
            )));
        }

        let mut table = FactorTable::new(headers.iter().skip(2));
        for record in reader.records() {
            let record = record?;
            let date = record
                .get(0)
                .unwrap_or_default()
                .parse::<Date>()
                .map_err(|e| IntramomError::InvalidDate(format!("{}: {e}", path.display())))?;
            let id = record.get(1).unwrap_or_default().to_string();
            let values = record
                .iter()
                .skip(2)
                .map(parse_value)
                .collect::<Result<Vec<_>>>()?;
            table.push(FactorRow { date, id, values })?;
        }
        Ok(Some(table))
    }
}
