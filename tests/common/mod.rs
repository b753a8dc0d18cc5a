#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fleet_seeder::config::AppConfig;
use fleet_seeder::db::{establish_connection_with_config, DbConfig, DbPool};
use fleet_seeder::seeding::SeedPlan;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use tempfile::TempDir;

/// A file-backed SQLite database that lives as long as the harness.
pub struct TestDb {
    _dir: TempDir,
    pub url: String,
    pub pool: DbPool,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("seed.db").display());
        let pool = establish_connection_with_config(&DbConfig {
            url: url.clone(),
            max_connections: 2,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("failed to open test database");

        Self {
            _dir: dir,
            url,
            pool,
        }
    }

    /// `(name, sql)` of every schema object, for before/after comparisons.
    pub async fn schema_snapshot(&self) -> Vec<(String, String)> {
        let rows = self
            .pool
            .query_all(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT name, COALESCE(sql, '') AS sql FROM sqlite_master ORDER BY name",
            ))
            .await
            .expect("failed to read sqlite_master");

        rows.into_iter()
            .map(|row| {
                (
                    row.try_get::<String>("", "name").unwrap(),
                    row.try_get::<String>("", "sql").unwrap(),
                )
            })
            .collect()
    }

    pub async fn execute(&self, sql: &str) {
        self.pool
            .execute_unprepared(sql)
            .await
            .unwrap_or_else(|e| panic!("failed to run {sql}: {e}"));
    }
}

/// Reference time every deterministic test uses.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

/// Reference fleet volumes over a short calendar.
pub fn reference_plan(seed: u64) -> SeedPlan {
    SeedPlan {
        months: 2,
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        rng_seed: Some(seed),
        ..SeedPlan::default()
    }
}

/// Tiny volumes for tests that only need some rows.
pub fn small_plan(seed: u64) -> SeedPlan {
    SeedPlan {
        trucks: 20,
        drivers: 15,
        trailers: 25,
        companies: 2,
        terminals: 4,
        months: 1,
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        loads_per_terminal_month: (5, 8),
        rng_seed: Some(seed),
        ..SeedPlan::default()
    }
}

pub fn test_config(database_url: &str) -> AppConfig {
    let mut cfg = AppConfig::new(
        Some(database_url.to_string()),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    );
    cfg.seed.trucks = 30;
    cfg.seed.drivers = 20;
    cfg.seed.trailers = 40;
    cfg.seed.companies = 2;
    cfg.seed.terminals = 6;
    cfg.seed.months = 1;
    cfg.seed.start_month = "2024-03".to_string();
    cfg.seed.rng_seed = Some(7);
    cfg
}
