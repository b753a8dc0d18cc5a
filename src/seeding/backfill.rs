//! Gives organizational context to fleet rows that predate the seeder.

use crate::db::DbPool;
use crate::entities::{driver, load, terminal, trailer, truck};
use crate::errors::ServiceError;
use metrics::counter;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Bound on the id list of a single UPDATE.
const UPDATE_CHUNK: usize = 500;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    pub terminals: usize,
    pub trucks: u64,
    pub drivers: u64,
    pub trailers: u64,
    pub loads: u64,
}

impl BackfillReport {
    pub fn total(&self) -> u64 {
        self.trucks + self.drivers + self.trailers + self.loads
    }
}

/// Assigns every row with no terminal to a terminal, round-robin in id order,
/// along with that terminal's company. Rows are only updated.
#[instrument(skip(db))]
pub async fn backfill_terminals(db: &DbPool) -> Result<BackfillReport, ServiceError> {
    let txn = db.begin().await.map_err(ServiceError::from_db)?;

    let terminals: Vec<(i32, i32)> = terminal::Entity::find()
        .select_only()
        .column(terminal::Column::Id)
        .column(terminal::Column::CompanyId)
        .order_by_asc(terminal::Column::Id)
        .into_tuple()
        .all(&txn)
        .await
        .map_err(ServiceError::from_db)?;

    if terminals.is_empty() {
        return Err(ServiceError::ValidationError(
            "no terminals exist to backfill against".to_string(),
        ));
    }

    let report = BackfillReport {
        terminals: terminals.len(),
        trucks: backfill_table::<truck::Entity>(
            &txn,
            truck::Column::Id,
            truck::Column::TerminalId,
            truck::Column::CompanyId,
            &terminals,
        )
        .await?,
        drivers: backfill_table::<driver::Entity>(
            &txn,
            driver::Column::Id,
            driver::Column::TerminalId,
            driver::Column::CompanyId,
            &terminals,
        )
        .await?,
        trailers: backfill_table::<trailer::Entity>(
            &txn,
            trailer::Column::Id,
            trailer::Column::TerminalId,
            trailer::Column::CompanyId,
            &terminals,
        )
        .await?,
        loads: backfill_table::<load::Entity>(
            &txn,
            load::Column::Id,
            load::Column::TerminalId,
            load::Column::CompanyId,
            &terminals,
        )
        .await?,
    };

    txn.commit().await.map_err(ServiceError::from_db)?;

    counter!("fleet_seeder.rows_backfilled", report.total());
    info!(
        trucks = report.trucks,
        drivers = report.drivers,
        trailers = report.trailers,
        loads = report.loads,
        "Backfill complete"
    );
    Ok(report)
}

async fn backfill_table<E>(
    txn: &DatabaseTransaction,
    id: E::Column,
    terminal_id: E::Column,
    company_id: E::Column,
    terminals: &[(i32, i32)],
) -> Result<u64, ServiceError>
where
    E: EntityTrait,
{
    let orphans: Vec<i32> = E::find()
        .select_only()
        .column(id)
        .filter(terminal_id.is_null())
        .order_by_asc(id)
        .into_tuple()
        .all(txn)
        .await
        .map_err(ServiceError::from_db)?;

    let mut by_terminal: BTreeMap<usize, Vec<i32>> = BTreeMap::new();
    for (k, row_id) in orphans.into_iter().enumerate() {
        by_terminal.entry(k % terminals.len()).or_default().push(row_id);
    }

    let mut updated = 0;
    for (slot, ids) in by_terminal {
        let (tid, cid) = terminals[slot];
        for chunk in ids.chunks(UPDATE_CHUNK) {
            let result = E::update_many()
                .col_expr(terminal_id, Expr::value(tid))
                .col_expr(company_id, Expr::value(cid))
                .filter(id.is_in(chunk.iter().copied()))
                .exec(txn)
                .await
                .map_err(ServiceError::from_db)?;
            updated += result.rows_affected;
        }
    }
    Ok(updated)
}
