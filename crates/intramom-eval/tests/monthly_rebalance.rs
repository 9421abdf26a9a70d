//! Backtest over a synthetic quarter with two rebalances.

use std::sync::Arc;

use approx::assert_relative_eq;
use intramom_combine::{SYNTHETIC_COLUMN, SYNTHETIC_STORE_ID};
use intramom_data::{DayCalendar, InMemoryMarketData, MemoryFactorStore};
use intramom_eval::portfolio::read_snapshot;
use intramom_eval::{Backtest, BacktestConfig, NAV_FILE, NavSeries};
use intramom_traits::{
    DailyBar, Date, FactorRow, FactorStore, FactorTable, IntramomError, TradingStatus,
};

fn date(m: u32, d: u32) -> Date {
    Date::from_ymd_opt(2024, m, d).unwrap()
}

fn trading_days() -> Vec<Date> {
    date(1, 2)
        .iter_days()
        .take_while(|d| *d <= date(3, 29))
        .filter(|d| chrono::Datelike::weekday(d).number_from_monday() <= 5)
        .collect()
}

fn id(i: usize) -> String {
    format!("SH{:06}", 600000 + i)
}

fn bar(day: Date, vwap: f64, close: f64) -> DailyBar {
    DailyBar {
        date: day,
        open: close,
        close,
        vol: 100.0,
        amount: vwap * 100.0,
        adj_factor: 1.0,
    }
}

/// Every security trades flat at 10 except the second one, which is bought
/// at 10 on Feb 1, closes at 10.5, then 11 for the rest of February, and is
/// sold and rebought at a VWAP of 12 on Mar 1.
fn market(days: &[Date]) -> InMemoryMarketData {
    let mut market = InMemoryMarketData::new();
    for i in 0..20 {
        for day in days {
            market.insert_daily_bar(&id(i), bar(*day, 10.0, 10.0));
        }
    }
    for day in days.iter().filter(|d| **d >= date(2, 1)) {
        let price = if *day == date(2, 1) {
            bar(*day, 10.0, 10.5)
        } else if *day < date(3, 1) {
            bar(*day, 11.0, 11.0)
        } else {
            bar(*day, 12.0, 12.0)
        };
        market.insert_daily_bar(&id(1), price);
    }
    market.set_status(&id(0), date(2, 1), TradingStatus::LimitUp);
    market
}

fn synthetic_table(label: Date) -> FactorTable {
    let mut table = FactorTable::new([SYNTHETIC_COLUMN]);
    for i in (0..20).rev() {
        table
            .push(FactorRow {
                date: label,
                id: id(i),
                values: vec![i as f64 / 100.0 - 0.05],
            })
            .unwrap();
    }
    table
}

fn backtest(dir: &std::path::Path, days: &[Date]) -> Backtest {
    let store = MemoryFactorStore::new();
    store
        .write(SYNTHETIC_STORE_ID, date(1, 31), &synthetic_table(date(2, 1)))
        .unwrap();
    store
        .write(SYNTHETIC_STORE_ID, date(2, 29), &synthetic_table(date(3, 1)))
        .unwrap();
    Backtest::new(
        BacktestConfig {
            output_dir: dir.to_path_buf(),
            ..BacktestConfig::default()
        },
        Arc::new(market(days)),
        Arc::new(DayCalendar::new(days.to_vec())),
        Arc::new(store),
    )
}

#[test]
fn nav_follows_monthly_selection() {
    let days = trading_days();
    let dir = tempfile::tempdir().unwrap();
    let result = backtest(dir.path(), &days).run(date(1, 2), date(3, 29)).unwrap();

    assert_eq!(result.rebalances, 2);
    assert_eq!(result.holdings, 2);
    assert_eq!(result.nav.len(), days.len() + 1);
    assert_eq!(result.nav[0].date, date(1, 1));
    assert_eq!(result.nav[0].nav, 1.0);

    let nav_on = |d: Date| result.nav.iter().find(|p| p.date == d).unwrap().nav;
    assert_eq!(nav_on(date(1, 31)), 1.0);
    assert_relative_eq!(nav_on(date(2, 1)), 1.05, epsilon = 1e-12);
    assert_relative_eq!(nav_on(date(2, 29)), 1.1, epsilon = 1e-12);
    // Sold at a VWAP of 12 against a buy at 10, then flat.
    assert_relative_eq!(nav_on(date(3, 1)), 1.2, epsilon = 1e-12);
    assert_relative_eq!(nav_on(date(3, 29)), 1.2, epsilon = 1e-12);
    assert_relative_eq!(result.total_return, 0.2, epsilon = 1e-12);
    assert_eq!(result.max_drawdown, 0.0);
    assert!(result.nav.iter().all(|p| p.nav > 0.0));

    // Feb: the lowest name is limit-up, so 19 are eligible and one is bought.
    let feb = read_snapshot(&dir.path().join("port_data_20240201.csv")).unwrap();
    assert_eq!(feb.len(), 1);
    assert_eq!(feb[0].id, id(1));
    assert_eq!(feb[0].buy_price, 10.0);
    assert_eq!(feb[0].date, date(2, 1));

    // Mar: all 20 eligible, the two lowest are bought.
    let mar = read_snapshot(&dir.path().join("port_data_20240301.csv")).unwrap();
    let ids: Vec<&str> = mar.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![id(0).as_str(), id(1).as_str()]);
    assert_eq!(mar[1].buy_price, 12.0);

    let written = NavSeries::read_csv(dir.path().join(NAV_FILE)).unwrap();
    assert_eq!(written.len(), result.nav.len());
}

#[test]
fn resumed_run_matches_single_run() {
    let days = trading_days();
    let full_dir = tempfile::tempdir().unwrap();
    let full = backtest(full_dir.path(), &days)
        .run(date(1, 2), date(3, 29))
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    backtest(dir.path(), &days).run(date(1, 2), date(2, 15)).unwrap();
    let resumed = backtest(dir.path(), &days)
        .run(date(2, 16), date(3, 29))
        .unwrap();

    assert_eq!(resumed.rebalances, 1);
    assert_eq!(resumed.nav.len(), full.nav.len());
    for (a, b) in resumed.nav.iter().zip(&full.nav) {
        assert_eq!(a.date, b.date);
        assert_relative_eq!(a.nav, b.nav, epsilon = 1e-9);
    }
}

#[test]
fn resume_needs_nav_on_snapshot_date() {
    let days = trading_days();
    let dir = tempfile::tempdir().unwrap();
    backtest(dir.path(), &days).run(date(1, 2), date(2, 15)).unwrap();

    // Drop the rebalance day from the saved NAV path.
    let nav_path = dir.path().join(NAV_FILE);
    let saved = NavSeries::read_csv(&nav_path).unwrap();
    let points = saved.points();
    let mut gapped = NavSeries::starting_at(points[0].date, points[0].nav);
    for point in points.iter().skip(1).filter(|p| p.date != date(2, 1)) {
        gapped.push(point.date, point.nav);
    }
    gapped.write_csv(&nav_path).unwrap();

    let err = backtest(dir.path(), &days)
        .run(date(2, 16), date(3, 29))
        .unwrap_err();
    assert!(matches!(err, IntramomError::InsufficientData(_)));
}

#[test]
fn missing_factor_table_holds_cash() {
    let days = trading_days();
    let dir = tempfile::tempdir().unwrap();
    let backtest = Backtest::new(
        BacktestConfig {
            output_dir: dir.path().to_path_buf(),
            ..BacktestConfig::default()
        },
        Arc::new(market(&days)),
        Arc::new(DayCalendar::new(days.clone())),
        Arc::new(MemoryFactorStore::new()),
    );
    let result = backtest.run(date(1, 2), date(3, 29)).unwrap();
    assert_eq!(result.rebalances, 2);
    assert_eq!(result.holdings, 0);
    assert!(result.nav.iter().all(|p| p.nav == 1.0));
}

#[test]
fn empty_range_is_an_error() {
    let days = trading_days();
    let dir = tempfile::tempdir().unwrap();
    assert!(
        backtest(dir.path(), &days)
            .run(date(1, 6), date(1, 7))
            .is_err()
    );
}
