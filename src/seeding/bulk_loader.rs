//! Reset and bulk insertion against the seeded tables.

use super::synthesizer::OrganizationDraft;
use crate::db::DbPool;
use crate::entities::SEEDED_TABLES;
use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, DbBackend, EntityTrait,
    IntoActiveModel, Statement, TransactionTrait,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

pub const DEFAULT_BATCH_SIZE: usize = 250;

/// Generated keys of the organization rows, keyed by business code.
#[derive(Debug, Default, Clone, Serialize)]
pub struct OrganizationIds {
    pub companies: BTreeMap<String, i32>,
    pub divisions: BTreeMap<String, i32>,
    pub departments: BTreeMap<String, i32>,
    /// In partition order
    pub terminals: Vec<TerminalRef>,
}

impl OrganizationIds {
    /// Rows written per organization table.
    pub fn row_counts(&self) -> [(&'static str, u64); 4] {
        [
            ("companies", self.companies.len() as u64),
            ("divisions", self.divisions.len() as u64),
            ("departments", self.departments.len() as u64),
            ("terminals", self.terminals.len() as u64),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TerminalRef {
    pub id: i32,
    pub company_id: i32,
}

pub struct BulkLoader<'a> {
    db: &'a DbPool,
    batch_size: usize,
    deadline: Option<Instant>,
}

impl<'a> BulkLoader<'a> {
    pub fn new(db: &'a DbPool) -> Self {
        Self {
            db,
            batch_size: DEFAULT_BATCH_SIZE,
            deadline: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Inserts stop with `Cancelled` once this instant has passed.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Empties every seeded table and restarts identity sequences, atomically.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<(), ServiceError> {
        let backend = self.db.get_database_backend();
        match backend {
            DbBackend::Postgres => {
                let sql = format!(
                    "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
                    SEEDED_TABLES.join(", ")
                );
                self.db
                    .execute_unprepared(&sql)
                    .await
                    .map_err(ServiceError::from_db)?;
            }
            DbBackend::Sqlite => {
                let txn = self.db.begin().await.map_err(ServiceError::from_db)?;
                for table in SEEDED_TABLES {
                    txn.execute_unprepared(&format!("DELETE FROM {table}"))
                        .await
                        .map_err(ServiceError::from_db)?;
                }
                if has_sqlite_sequence(&txn).await? {
                    let names = SEEDED_TABLES
                        .iter()
                        .map(|t| format!("'{t}'"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    txn.execute_unprepared(&format!(
                        "DELETE FROM sqlite_sequence WHERE name IN ({names})"
                    ))
                    .await
                    .map_err(ServiceError::from_db)?;
                }
                txn.commit().await.map_err(ServiceError::from_db)?;
            }
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "reset is not supported on {other:?}"
                )))
            }
        }

        info!(tables = SEEDED_TABLES.len(), "Seeded tables reset");
        Ok(())
    }

    /// Inserts companies, divisions, departments and terminals in one
    /// transaction, one row at a time, collecting the generated keys.
    #[instrument(
        skip(self, draft),
        fields(companies = draft.companies.len(), terminals = draft.terminals.len())
    )]
    pub async fn insert_organization(
        &self,
        draft: OrganizationDraft,
        now: DateTime<Utc>,
    ) -> Result<OrganizationIds, ServiceError> {
        check_deadline(self.deadline, "organizations")?;
        let txn = self.db.begin().await.map_err(ServiceError::from_db)?;
        let mut ids = OrganizationIds::default();

        for company in draft.companies {
            let code = company.code.clone();
            let model = company
                .into_active_model(now)
                .insert(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            ids.companies.insert(code, model.id);
        }

        for division in draft.divisions {
            let company_id = lookup(&ids.companies, &division.company_code, "company")?;
            let code = division.code.clone();
            let model = division
                .into_active_model(company_id, now)
                .insert(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            ids.divisions.insert(code, model.id);
        }

        for department in draft.departments {
            let division_id = lookup(&ids.divisions, &department.division_code, "division")?;
            let code = department.code.clone();
            let model = department
                .into_active_model(division_id, now)
                .insert(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            ids.departments.insert(code, model.id);
        }

        for terminal in draft.terminals {
            let company_id = lookup(&ids.companies, &terminal.company_code, "company")?;
            let department_id = match &terminal.department_code {
                Some(code) => Some(lookup(&ids.departments, code, "department")?),
                None => None,
            };
            let model = terminal
                .into_active_model(company_id, department_id, now)
                .insert(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            ids.terminals.push(TerminalRef {
                id: model.id,
                company_id,
            });
        }

        txn.commit().await.map_err(ServiceError::from_db)?;
        for (table, rows) in ids.row_counts() {
            counter!("fleet_seeder.rows_inserted", rows, "table" => table);
        }
        Ok(ids)
    }

    /// Inserts `rows` with multi-row statements of `batch_size` rows inside
    /// a single transaction. Any failure rolls back every chunk.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn insert_batch<A>(
        &self,
        table: &'static str,
        rows: Vec<A>,
    ) -> Result<u64, ServiceError>
    where
        A: ActiveModelTrait + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        if rows.is_empty() {
            debug!(table, "Nothing to insert");
            return Ok(0);
        }
        self.writer(table).await?.push(rows).await?.commit().await
    }

    /// Opens one transaction for `table` that rows can be pushed into
    /// piecewise, so callers never hold the whole table in memory.
    pub async fn writer(&self, table: &'static str) -> Result<BatchWriter, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::from_db)?;
        Ok(BatchWriter {
            txn,
            table,
            batch_size: self.batch_size,
            deadline: self.deadline,
            inserted: 0,
            started: Instant::now(),
        })
    }
}

/// Uncommitted inserts into a single table.
///
/// Dropping the writer without calling [`BatchWriter::commit`] discards
/// every pushed row.
pub struct BatchWriter {
    txn: DatabaseTransaction,
    table: &'static str,
    batch_size: usize,
    deadline: Option<Instant>,
    inserted: u64,
    started: Instant,
}

impl BatchWriter {
    /// Writes `rows` in chunks of `batch_size`. On a failed chunk or an
    /// expired deadline the transaction is rolled back and the error returned.
    pub async fn push<A>(mut self, rows: Vec<A>) -> Result<Self, ServiceError>
    where
        A: ActiveModelTrait + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        let table = self.table;
        let mut remaining = rows.into_iter().peekable();

        while remaining.peek().is_some() {
            if let Err(err) = check_deadline(self.deadline, table) {
                rollback(self.txn, table).await;
                return Err(err);
            }

            let chunk: Vec<A> = remaining.by_ref().take(self.batch_size).collect();
            let chunk_len = chunk.len() as u64;
            let result = <A::Entity as EntityTrait>::insert_many(chunk)
                .exec_without_returning(&self.txn)
                .await;
            match result {
                Ok(_) => self.inserted += chunk_len,
                Err(err) => {
                    let inserted = self.inserted;
                    error!(table, inserted, error = %err, "Chunk insert failed; rolling back");
                    rollback(self.txn, table).await;
                    return Err(ServiceError::from_db(err));
                }
            }
        }
        Ok(self)
    }

    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    /// Makes every pushed row visible and returns how many there were.
    pub async fn commit(self) -> Result<u64, ServiceError> {
        let (table, inserted) = (self.table, self.inserted);
        self.txn.commit().await.map_err(ServiceError::from_db)?;

        counter!("fleet_seeder.rows_inserted", inserted, "table" => table);
        info!(
            table,
            rows = inserted,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Batch committed"
        );
        Ok(inserted)
    }
}

fn check_deadline(deadline: Option<Instant>, stage: &str) -> Result<(), ServiceError> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(ServiceError::Cancelled(format!(
            "deadline exceeded before {stage} finished"
        ))),
        _ => Ok(()),
    }
}

async fn rollback(txn: DatabaseTransaction, table: &str) {
    if let Err(err) = txn.rollback().await {
        error!(table, error = %err, "Rollback failed");
    }
}

async fn has_sqlite_sequence(txn: &DatabaseTransaction) -> Result<bool, ServiceError> {
    let row = txn
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
        ))
        .await
        .map_err(ServiceError::from_db)?;
    Ok(row.is_some())
}

fn lookup(map: &BTreeMap<String, i32>, code: &str, kind: &str) -> Result<i32, ServiceError> {
    map.get(code).copied().ok_or_else(|| {
        ServiceError::InternalError(format!("{kind} {code} was not inserted before its children"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::trailer;
    use crate::migrator::provision_schema;
    use crate::seeding::identity::IdentityEncoder;
    use crate::seeding::synthesizer::{EntitySynthesizer, OrgAssignment};
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sea_orm::{Database, PaginatorTrait};
    use std::time::Duration;

    async fn sqlite() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("bulk.db").display());
        let db = Database::connect(url).await.unwrap();
        provision_schema(&db).await.unwrap();
        (dir, db)
    }

    fn trailers(n: usize, org: OrgAssignment) -> Vec<trailer::ActiveModel> {
        let synth = EntitySynthesizer::new(Utc::now());
        let mut rng = StdRng::seed_from_u64(9);
        let mut encoder = IdentityEncoder::new();
        (0..n)
            .map(|_| synth.trailer(&mut rng, &mut encoder, org).into())
            .collect()
    }

    async fn seed_one_terminal(loader: &BulkLoader<'_>) -> OrgAssignment {
        let synth = EntitySynthesizer::new(Utc::now());
        let mut rng = StdRng::seed_from_u64(1);
        let draft = synth.organization(&mut rng, 1, 1, 1, 1).unwrap();
        let ids = loader.insert_organization(draft, Utc::now()).await.unwrap();
        OrgAssignment {
            terminal_id: ids.terminals[0].id,
            company_id: ids.terminals[0].company_id,
        }
    }

    #[tokio::test]
    async fn chunked_insert_commits_every_row() {
        let (_dir, db) = sqlite().await;
        let loader = BulkLoader::new(&db).with_batch_size(7);
        let org = seed_one_terminal(&loader).await;

        let inserted = loader.insert_batch("trailers", trailers(50, org)).await.unwrap();
        assert_eq!(inserted, 50);
        assert_eq!(trailer::Entity::find().count(&db).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn failed_chunk_rolls_back_the_whole_type() {
        let (_dir, db) = sqlite().await;
        let loader = BulkLoader::new(&db).with_batch_size(10);
        let org = seed_one_terminal(&loader).await;

        let mut rows = trailers(30, org);
        // duplicate trailer number in the last chunk
        rows[25] = rows[0].clone();

        let err = loader.insert_batch("trailers", rows).await.unwrap_err();
        assert_matches!(
            err,
            ServiceError::ConstraintViolation(_) | ServiceError::DatabaseError(_)
        );
        assert_eq!(trailer::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn expired_deadline_cancels_before_writing() {
        let (_dir, db) = sqlite().await;
        let org = seed_one_terminal(&BulkLoader::new(&db)).await;
        let loader = BulkLoader::new(&db)
            .with_deadline(Instant::now().checked_sub(Duration::from_millis(1)));

        let err = loader.insert_batch("trailers", trailers(5, org)).await.unwrap_err();
        assert_matches!(err, ServiceError::Cancelled(_));
        assert_eq!(trailer::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reset_empties_tables_and_restarts_ids() {
        let (_dir, db) = sqlite().await;
        let loader = BulkLoader::new(&db);
        let first = seed_one_terminal(&loader).await;
        loader.insert_batch("trailers", trailers(3, first)).await.unwrap();

        loader.reset().await.unwrap();
        assert_eq!(trailer::Entity::find().count(&db).await.unwrap(), 0);

        let second = seed_one_terminal(&loader).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn writer_commits_pushes_as_one_transaction() {
        let (_dir, db) = sqlite().await;
        let loader = BulkLoader::new(&db).with_batch_size(4);
        let org = seed_one_terminal(&loader).await;
        let mut rows = trailers(12, org);
        let tail = rows.split_off(5);

        let writer = loader.writer("trailers").await.unwrap();
        let writer = writer.push(rows).await.unwrap();
        assert_eq!(writer.inserted(), 5);

        let writer = writer.push(tail).await.unwrap();
        assert_eq!(writer.commit().await.unwrap(), 12);
        assert_eq!(trailer::Entity::find().count(&db).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn failed_push_discards_earlier_pushes() {
        let (_dir, db) = sqlite().await;
        let loader = BulkLoader::new(&db);
        let org = seed_one_terminal(&loader).await;
        let rows = trailers(6, org);
        let duplicate = vec![rows[0].clone()];

        let writer = loader.writer("trailers").await.unwrap();
        let writer = writer.push(rows).await.unwrap();
        assert!(writer.push(duplicate).await.is_err());
        assert_eq!(trailer::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[test]
    fn organization_row_counts_cover_every_table() {
        let mut ids = OrganizationIds::default();
        ids.companies.insert("CO01".into(), 1);
        ids.divisions.insert("CO01-D1".into(), 1);
        ids.divisions.insert("CO01-D2".into(), 2);
        ids.terminals.push(TerminalRef { id: 1, company_id: 1 });

        assert_eq!(
            ids.row_counts(),
            [("companies", 1), ("divisions", 2), ("departments", 0), ("terminals", 1)]
        );
    }

    #[tokio::test]
    async fn empty_batch_is_a_noop() {
        let (_dir, db) = sqlite().await;
        let loader = BulkLoader::new(&db);
        let rows: Vec<trailer::ActiveModel> = Vec::new();
        assert_eq!(loader.insert_batch("trailers", rows).await.unwrap(), 0);
    }
}
