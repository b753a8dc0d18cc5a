use super::allocator::allocate;
use super::backfill::{backfill_terminals, BackfillReport};
use super::bulk_loader::{BulkLoader, OrganizationIds, TerminalRef};
use super::identity::IdentityEncoder;
use super::quota::LoadQuotaEnforcer;
use super::synthesizer::{
    month_start, EntitySynthesizer, NewDriver, NewLoad, NewTrailer, NewTruck, OrgAssignment,
};
use crate::config::SeedSettings;
use crate::db::DbPool;
use crate::entities::{driver, load, trailer, truck};
use crate::errors::ServiceError;
use crate::migrator::provision_schema;
use chrono::{DateTime, NaiveDate, Utc};
use metrics::{counter, histogram};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;
use validator::Validate;

/// Pipeline stages in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SeedStage {
    Provision,
    Reset,
    Organizations,
    Trucks,
    Drivers,
    Trailers,
    Loads,
}

/// Validated volumes and calendar for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct SeedPlan {
    pub trucks: u64,
    pub drivers: u64,
    pub trailers: u64,
    pub companies: usize,
    pub terminals: usize,
    pub divisions_per_company: usize,
    pub departments_per_division: usize,
    pub start: NaiveDate,
    pub months: u32,
    pub loads_per_terminal_month: (u32, u32),
    pub open_load_cap: u32,
    pub batch_size: usize,
    pub rng_seed: Option<u64>,
    pub deadline: Option<Duration>,
}

impl TryFrom<&SeedSettings> for SeedPlan {
    type Error = ServiceError;

    fn try_from(settings: &SeedSettings) -> Result<Self, Self::Error> {
        settings.validate()?;
        let start = settings.start_date().ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "start_month {:?} is not YYYY-MM",
                settings.start_month
            ))
        })?;
        let (min, max) = (
            settings.loads_per_terminal_month_min,
            settings.loads_per_terminal_month_max,
        );

        Ok(Self {
            trucks: settings.trucks,
            drivers: settings.drivers,
            trailers: settings.trailers,
            companies: settings.companies,
            terminals: settings.terminals,
            divisions_per_company: settings.divisions_per_company,
            departments_per_division: settings.departments_per_division,
            start,
            months: settings.months,
            loads_per_terminal_month: (min, max),
            open_load_cap: settings.open_load_cap,
            batch_size: settings.batch_size.max(1),
            rng_seed: settings.rng_seed,
            deadline: settings.deadline_secs.map(Duration::from_secs),
        })
    }
}

impl Default for SeedPlan {
    fn default() -> Self {
        // The default settings always form a valid plan.
        let settings = SeedSettings::default();
        Self {
            trucks: settings.trucks,
            drivers: settings.drivers,
            trailers: settings.trailers,
            companies: settings.companies,
            terminals: settings.terminals,
            divisions_per_company: settings.divisions_per_company,
            departments_per_division: settings.departments_per_division,
            start: settings.start_date().unwrap_or(NaiveDate::MIN),
            months: settings.months,
            loads_per_terminal_month: (
                settings.loads_per_terminal_month_min,
                settings.loads_per_terminal_month_max,
            ),
            open_load_cap: settings.open_load_cap,
            batch_size: settings.batch_size,
            rng_seed: None,
            deadline: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timespan {
    /// `YYYY-MM`
    pub start: String,
    pub end: String,
    pub months: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distributions {
    pub trucks_by_manufacturer: BTreeMap<String, u64>,
    pub truck_transmissions: BTreeMap<String, u64>,
    pub drivers_by_type: BTreeMap<String, u64>,
    pub drivers_by_status: BTreeMap<String, u64>,
    pub trailers_by_status: BTreeMap<String, u64>,
    pub loads_by_status: BTreeMap<String, u64>,
    pub open_loads_downgraded: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub companies: u64,
    pub terminals: u64,
    pub divisions: u64,
    pub departments: u64,
    pub trucks: u64,
    pub drivers: u64,
    pub trailers: u64,
    pub loads: u64,
    pub timespan: Timespan,
    pub distributions: Distributions,
}

#[derive(Clone, Debug, Serialize)]
pub struct SeedOutcome {
    pub run_id: Uuid,
    /// Seed actually used; replaying it reproduces the run
    pub rng_seed: u64,
    pub elapsed_ms: u64,
    pub summary: SeedSummary,
}

/// Runs seeding passes one at a time.
#[derive(Debug, Default)]
pub struct SeedingOrchestrator {
    guard: Mutex<()>,
}

impl SeedingOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from scratch.
    ///
    /// A second call while one is running fails immediately with `Conflict`.
    pub async fn run(
        &self,
        db: &DbPool,
        plan: &SeedPlan,
        now: DateTime<Utc>,
    ) -> Result<SeedOutcome, ServiceError> {
        let _permit = self.guard.try_lock().map_err(|_| {
            ServiceError::Conflict("a seeding run is already in progress".to_string())
        })?;

        let run_id = Uuid::new_v4();
        let rng_seed = plan.rng_seed.unwrap_or_else(rand::random);
        let started = Instant::now();
        let span = info_span!("seed_run", %run_id, rng_seed);

        let result = SeedRun::new(db, plan, now, rng_seed, started)
            .execute()
            .instrument(span)
            .await;

        let elapsed = started.elapsed();
        histogram!("fleet_seeder.run_duration_seconds", elapsed.as_secs_f64());

        match result {
            Ok(summary) => {
                info!(
                    %run_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    loads = summary.loads,
                    "Seeding run complete"
                );
                Ok(SeedOutcome {
                    run_id,
                    rng_seed,
                    elapsed_ms: elapsed.as_millis() as u64,
                    summary,
                })
            }
            Err(err) => {
                counter!("fleet_seeder.run_failures", 1);
                error!(%run_id, error = %err, "Seeding run failed");
                Err(err)
            }
        }
    }

    /// Assigns terminals to existing rows that lack one.
    pub async fn backfill(&self, db: &DbPool) -> Result<BackfillReport, ServiceError> {
        let _permit = self.guard.try_lock().map_err(|_| {
            ServiceError::Conflict("a seeding run is already in progress".to_string())
        })?;
        backfill_terminals(db).await
    }
}

/// State owned by a single run; dropped when the run ends.
struct SeedRun<'a> {
    db: &'a DbPool,
    plan: &'a SeedPlan,
    synth: EntitySynthesizer,
    rng: StdRng,
    encoder: IdentityEncoder,
    quota: LoadQuotaEnforcer,
    loader: BulkLoader<'a>,
    completed: Vec<SeedStage>,
}

impl<'a> SeedRun<'a> {
    fn new(
        db: &'a DbPool,
        plan: &'a SeedPlan,
        now: DateTime<Utc>,
        rng_seed: u64,
        started: Instant,
    ) -> Self {
        Self {
            db,
            plan,
            synth: EntitySynthesizer::new(now),
            rng: StdRng::seed_from_u64(rng_seed),
            encoder: IdentityEncoder::new(),
            quota: LoadQuotaEnforcer::new(plan.open_load_cap),
            loader: BulkLoader::new(db)
                .with_batch_size(plan.batch_size)
                .with_deadline(plan.deadline.map(|d| started + d)),
            completed: Vec::new(),
        }
    }

    async fn execute(mut self) -> Result<SeedSummary, ServiceError> {
        let plan = self.plan;

        let report = provision_schema(self.db)
            .await
            .map_err(|e| self.fail(SeedStage::Provision, e))?;
        self.complete(SeedStage::Provision);
        if !report.is_noop() {
            info!(
                tables = ?report.tables_created,
                columns = ?report.columns_added,
                "Schema changed"
            );
        }

        self.loader
            .reset()
            .await
            .map_err(|e| self.fail(SeedStage::Reset, e))?;
        self.complete(SeedStage::Reset);

        let ids = self.organizations().await?;
        let terminals = ids.terminals.clone();

        let mut distributions = Distributions::default();

        let trucks = self.trucks(&terminals, &mut distributions)?;
        let trucks = self.insert(SeedStage::Trucks, "trucks", trucks).await?;

        let drivers = self.drivers(&terminals, &mut distributions)?;
        let drivers = self.insert(SeedStage::Drivers, "drivers", drivers).await?;

        let trailers = self.trailers(&terminals, &mut distributions)?;
        let trailers = self.insert(SeedStage::Trailers, "trailers", trailers).await?;

        let loads = self.loads(&terminals, &mut distributions).await?;
        distributions.open_loads_downgraded = self.quota.downgraded();

        let end = month_start(plan.start, plan.months.saturating_sub(1)).unwrap_or(plan.start);
        Ok(SeedSummary {
            companies: ids.companies.len() as u64,
            terminals: ids.terminals.len() as u64,
            divisions: ids.divisions.len() as u64,
            departments: ids.departments.len() as u64,
            trucks,
            drivers,
            trailers,
            loads,
            timespan: Timespan {
                start: plan.start.format("%Y-%m").to_string(),
                end: end.format("%Y-%m").to_string(),
                months: plan.months,
            },
            distributions,
        })
    }

    async fn organizations(&mut self) -> Result<OrganizationIds, ServiceError> {
        let plan = self.plan;
        let draft = self
            .synth
            .organization(
                &mut self.rng,
                plan.companies,
                plan.terminals,
                plan.divisions_per_company,
                plan.departments_per_division,
            )
            .map_err(|e| self.fail(SeedStage::Organizations, e))?;

        let ids = self
            .loader
            .insert_organization(draft, self.synth.reference_time())
            .await
            .map_err(|e| self.fail(SeedStage::Organizations, e))?;
        self.complete(SeedStage::Organizations);
        Ok(ids)
    }

    fn trucks(
        &mut self,
        terminals: &[TerminalRef],
        stats: &mut Distributions,
    ) -> Result<Vec<truck::ActiveModel>, ServiceError> {
        let shares = allocate(self.plan.trucks, terminals.len())
            .map_err(|e| self.fail(SeedStage::Trucks, e))?;
        let mut rows = Vec::with_capacity(self.plan.trucks as usize);
        for (share, terminal) in shares.into_iter().zip(terminals) {
            for _ in 0..share {
                let t: NewTruck =
                    self.synth
                        .truck(&mut self.rng, &mut self.encoder, assignment(terminal));
                bump(&mut stats.trucks_by_manufacturer, &t.manufacturer);
                bump(
                    &mut stats.truck_transmissions,
                    if t.is_automatic { "automatic" } else { "manual" },
                );
                rows.push(t.into());
            }
        }
        Ok(rows)
    }

    fn drivers(
        &mut self,
        terminals: &[TerminalRef],
        stats: &mut Distributions,
    ) -> Result<Vec<driver::ActiveModel>, ServiceError> {
        let shares = allocate(self.plan.drivers, terminals.len())
            .map_err(|e| self.fail(SeedStage::Drivers, e))?;
        let mut rows = Vec::with_capacity(self.plan.drivers as usize);
        for (share, terminal) in shares.into_iter().zip(terminals) {
            for _ in 0..share {
                let d: NewDriver =
                    self.synth
                        .driver(&mut self.rng, &mut self.encoder, assignment(terminal));
                bump(&mut stats.drivers_by_type, d.driver_type.as_ref());
                bump(&mut stats.drivers_by_status, d.status.as_ref());
                rows.push(d.into());
            }
        }
        Ok(rows)
    }

    fn trailers(
        &mut self,
        terminals: &[TerminalRef],
        stats: &mut Distributions,
    ) -> Result<Vec<trailer::ActiveModel>, ServiceError> {
        let shares = allocate(self.plan.trailers, terminals.len())
            .map_err(|e| self.fail(SeedStage::Trailers, e))?;
        let mut rows = Vec::with_capacity(self.plan.trailers as usize);
        for (share, terminal) in shares.into_iter().zip(terminals) {
            for _ in 0..share {
                let t: NewTrailer =
                    self.synth
                        .trailer(&mut self.rng, &mut self.encoder, assignment(terminal));
                bump(&mut stats.trailers_by_status, t.status.as_ref());
                rows.push(t.into());
            }
        }
        Ok(rows)
    }

    /// Loads for every terminal and month, quota applied as they are drawn.
    ///
    /// Rows are generated and pushed one terminal at a time into a single
    /// transaction.
    async fn loads(
        &mut self,
        terminals: &[TerminalRef],
        stats: &mut Distributions,
    ) -> Result<u64, ServiceError> {
        let mut writer = self
            .loader
            .writer("loads")
            .await
            .map_err(|e| self.fail(SeedStage::Loads, e))?;
        for terminal in terminals {
            let rows = self.terminal_loads(terminal, stats);
            writer = writer
                .push(rows)
                .await
                .map_err(|e| self.fail(SeedStage::Loads, e))?;
        }
        let inserted = writer
            .commit()
            .await
            .map_err(|e| self.fail(SeedStage::Loads, e))?;
        self.complete(SeedStage::Loads);
        Ok(inserted)
    }

    fn terminal_loads(
        &mut self,
        terminal: &TerminalRef,
        stats: &mut Distributions,
    ) -> Vec<load::ActiveModel> {
        let (min, max) = self.plan.loads_per_terminal_month;
        let mut rows = Vec::new();
        for offset in 0..self.plan.months {
            let Some(month) = month_start(self.plan.start, offset) else {
                continue;
            };
            let count = self.rng.gen_range(min..=max);
            for _ in 0..count {
                let mut l: NewLoad =
                    self.synth
                        .load(&mut self.rng, &mut self.encoder, month, assignment(terminal));
                self.quota.enforce(&mut l);
                bump(&mut stats.loads_by_status, l.status.as_ref());
                rows.push(l.into());
            }
        }
        rows
    }

    async fn insert<A>(
        &mut self,
        stage: SeedStage,
        table: &'static str,
        rows: Vec<A>,
    ) -> Result<u64, ServiceError>
    where
        A: sea_orm::ActiveModelTrait + Send,
        <A::Entity as sea_orm::EntityTrait>::Model: sea_orm::IntoActiveModel<A>,
    {
        let inserted = self
            .loader
            .insert_batch(table, rows)
            .await
            .map_err(|e| self.fail(stage, e))?;
        self.complete(stage);
        Ok(inserted)
    }

    fn complete(&mut self, stage: SeedStage) {
        info!(stage = %stage, "Stage committed");
        self.completed.push(stage);
    }

    /// Wraps `err` with the committed stages once the store has been touched.
    fn fail(&self, stage: SeedStage, err: ServiceError) -> ServiceError {
        error!(stage = %stage, error = %err, "Stage failed");
        if self.completed.iter().any(|s| *s != SeedStage::Provision) {
            ServiceError::PartialSeedFailure {
                stage: stage.to_string(),
                completed: self.completed.iter().map(|s| s.to_string()).collect(),
                source: Box::new(err),
            }
        } else {
            err
        }
    }
}

fn assignment(terminal: &TerminalRef) -> OrgAssignment {
    OrgAssignment {
        terminal_id: terminal.id,
        company_id: terminal.company_id,
    }
}

fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_settings_form_default_plan() {
        let plan = SeedPlan::try_from(&SeedSettings::default()).unwrap();
        assert_eq!(plan, SeedPlan::default());
        assert_eq!(plan.start, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(plan.loads_per_terminal_month, (20, 50));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = SeedSettings {
            terminals: 2,
            companies: 3,
            ..Default::default()
        };
        assert_matches!(SeedPlan::try_from(&settings), Err(ServiceError::ValidationError(_)));

        let settings = SeedSettings {
            start_month: "2023/01".into(),
            ..Default::default()
        };
        assert_matches!(SeedPlan::try_from(&settings), Err(ServiceError::ValidationError(_)));

        let settings = SeedSettings {
            open_load_cap: 40,
            ..Default::default()
        };
        assert_matches!(
            SeedPlan::try_from(&settings),
            Err(ServiceError::ValidationError(msg)) if msg.contains("open_load_cap")
        );

        let settings = SeedSettings {
            months: 0,
            ..Default::default()
        };
        assert_matches!(SeedPlan::try_from(&settings), Err(ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected() {
        let orchestrator = SeedingOrchestrator::new();
        let _held = orchestrator.guard.lock().await;

        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let err = orchestrator
            .run(&db, &SeedPlan::default(), Utc::now())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[test]
    fn failures_after_reset_report_committed_stages() {
        let plan = SeedPlan::default();
        let db = sea_orm::DatabaseConnection::Disconnected;
        let mut run = SeedRun::new(&db, &plan, Utc::now(), 1, Instant::now());

        let err = run.fail(SeedStage::Reset, ServiceError::InternalError("x".into()));
        assert_matches!(err, ServiceError::InternalError(_));

        run.complete(SeedStage::Provision);
        run.complete(SeedStage::Reset);
        run.complete(SeedStage::Organizations);
        let err = run.fail(SeedStage::Trucks, ServiceError::InternalError("x".into()));
        assert_eq!(
            err.completed_stages().unwrap(),
            &["provision".to_string(), "reset".to_string(), "organizations".to_string()]
        );
    }
}
