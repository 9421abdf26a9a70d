//! File-system locations read from the environment.

use std::env;
use std::path::PathBuf;

/// Where the CLI reads market data and keeps its factor database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    /// Market data root (`INTRAMOM_DATA_DIR`).
    pub(crate) data_dir: PathBuf,
    /// Factor database root (`INTRAMOM_DB_DIR`).
    pub(crate) db_dir: PathBuf,
    /// Factor weight CSV (`INTRAMOM_WEIGHT_FILE`).
    pub(crate) weight_file: PathBuf,
    /// Backtest output directory (`INTRAMOM_BACKTEST_DIR`).
    pub(crate) backtest_dir: PathBuf,
}

impl Settings {
    /// Reads settings from the process environment, loading `.env` first.
    pub(crate) fn from_env() -> Self {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir =
            lookup("INTRAMOM_DATA_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from);
        let db_dir = lookup("INTRAMOM_DB_DIR").map_or_else(|| PathBuf::from("db"), PathBuf::from);
        let weight_file = lookup("INTRAMOM_WEIGHT_FILE").map_or_else(
            || db_dir.join("intraday_momentum_weights.csv"),
            PathBuf::from,
        );
        let backtest_dir = lookup("INTRAMOM_BACKTEST_DIR").map_or_else(
            || db_dir.join("intraday_momentum_backtest"),
            PathBuf::from,
        );
        Self {
            data_dir,
            db_dir,
            weight_file,
            backtest_dir,
        }
    }

    /// Trading calendar CSV inside the data root.
    pub(crate) fn calendar_file(&self) -> PathBuf {
        self.data_dir.join("trading_days.csv")
    }

    /// Security listing CSV inside the data root.
    pub(crate) fn securities_file(&self) -> PathBuf {
        self.data_dir.join("securities.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(settings.db_dir, PathBuf::from("db"));
        assert_eq!(
            settings.weight_file,
            PathBuf::from("db").join("intraday_momentum_weights.csv")
        );
        assert_eq!(
            settings.backtest_dir,
            PathBuf::from("db").join("intraday_momentum_backtest")
        );
        assert_eq!(settings.calendar_file(), PathBuf::from("data").join("trading_days.csv"));
    }

    #[test]
    fn test_db_dir_moves_derived_paths() {
        let settings = Settings::from_lookup(|key| match key {
            "INTRAMOM_DB_DIR" => Some("/srv/factors".to_string()),
            "INTRAMOM_WEIGHT_FILE" => Some("/etc/weights.csv".to_string()),
            _ => None,
        });
        assert_eq!(settings.weight_file, PathBuf::from("/etc/weights.csv"));
        assert_eq!(
            settings.backtest_dir,
            PathBuf::from("/srv/factors/intraday_momentum_backtest")
        );
    }
}
