//! Idempotent schema provisioning for the seeded tables.
//!
//! Brand-new tables are created with `IF NOT EXISTS`. The `trucks`, `drivers`
//! and `loads` base tables may predate the seeder, so the organizational and
//! lifecycle columns are added one by one, only when the catalog says they are
//! missing. DDL failures that merely report an existing object are logged and
//! skipped; anything else aborts provisioning.

use crate::db::DbPool;
use crate::errors::ServiceError;
use sea_orm_migration::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Columns added to pre-existing base tables. All nullable.
const ADDITIVE_COLUMNS: &[(&str, &str, ColumnKind)] = &[
    ("trucks", "truck_number", ColumnKind::Text),
    ("trucks", "is_automatic", ColumnKind::Bool),
    ("trucks", "maintenance_due_date", ColumnKind::Date),
    ("trucks", "registration_expiry", ColumnKind::Date),
    ("trucks", "insurance_expiry", ColumnKind::Date),
    ("trucks", "terminal_id", ColumnKind::Int),
    ("trucks", "company_id", ColumnKind::Int),
    ("drivers", "license_state", ColumnKind::Text),
    ("drivers", "driver_type", ColumnKind::Text),
    ("drivers", "hire_date", ColumnKind::Date),
    ("drivers", "emergency_contact_name", ColumnKind::Text),
    ("drivers", "emergency_contact_phone", ColumnKind::Text),
    ("drivers", "terminal_id", ColumnKind::Int),
    ("drivers", "company_id", ColumnKind::Int),
    ("loads", "distance_miles", ColumnKind::Int),
    ("loads", "weight_lbs", ColumnKind::Int),
    ("loads", "terminal_id", ColumnKind::Int),
    ("loads", "company_id", ColumnKind::Int),
];

/// (index name, table, column, unique)
const INDEXES: &[(&str, &str, &str, bool)] = &[
    ("idx_trucks_truck_number", "trucks", "truck_number", true),
    ("idx_trucks_vin", "trucks", "vin", true),
    ("idx_loads_load_number", "loads", "load_number", true),
    ("idx_trucks_terminal_id", "trucks", "terminal_id", false),
    ("idx_drivers_terminal_id", "drivers", "terminal_id", false),
    ("idx_trailers_terminal_id", "trailers", "terminal_id", false),
    ("idx_loads_terminal_id", "loads", "terminal_id", false),
    ("idx_loads_pickup_at", "loads", "pickup_at", false),
];

#[derive(Clone, Copy, Debug)]
enum ColumnKind {
    Text,
    Int,
    Bool,
    Date,
}

impl ColumnKind {
    fn column_def(self, name: &str) -> ColumnDef {
        let mut def = ColumnDef::new(Alias::new(name));
        match self {
            ColumnKind::Text => def.string(),
            ColumnKind::Int => def.integer(),
            ColumnKind::Bool => def.boolean(),
            ColumnKind::Date => def.date(),
        };
        def.null().to_owned()
    }
}

/// What a provisioning pass changed.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ProvisionReport {
    pub tables_created: Vec<String>,
    pub columns_added: Vec<String>,
    /// DDL statements that failed with an "already exists" error
    pub suppressed: usize,
}

impl ProvisionReport {
    pub fn is_noop(&self) -> bool {
        self.tables_created.is_empty() && self.columns_added.is_empty()
    }
}

pub struct SchemaProvisioner<'c> {
    manager: SchemaManager<'c>,
}

impl<'c> SchemaProvisioner<'c> {
    pub fn new(db: &'c DbPool) -> Self {
        Self {
            manager: SchemaManager::new(db),
        }
    }

    /// Ensures every table, column and index the pipeline writes to exists.
    pub async fn provision(&self) -> Result<ProvisionReport, ServiceError> {
        let mut report = ProvisionReport::default();

        for (name, stmt) in table_statements() {
            let existed = self.has_table(name).await?;
            let result = self.manager.create_table(stmt).await;
            if tolerate_existing(name, result, &mut report)? && !existed {
                info!(table = name, "Created table");
                report.tables_created.push(name.to_string());
            }
        }

        for (table, column, kind) in ADDITIVE_COLUMNS {
            if self.has_column(table, column).await? {
                debug!(table, column, "Column already present");
                continue;
            }
            let stmt = Table::alter()
                .table(Alias::new(*table))
                .add_column(kind.column_def(column))
                .to_owned();
            let what = format!("{table}.{column}");
            if tolerate_existing(&what, self.manager.alter_table(stmt).await, &mut report)? {
                info!(table, column, "Added column");
                report.columns_added.push(what);
            }
        }

        for (name, table, column, unique) in INDEXES {
            let mut stmt = Index::create();
            stmt.if_not_exists()
                .name(*name)
                .table(Alias::new(*table))
                .col(Alias::new(*column));
            if *unique {
                stmt.unique();
            }
            let result = self.manager.create_index(stmt.to_owned()).await;
            tolerate_existing(name, result, &mut report)?;
        }

        info!(
            tables_created = report.tables_created.len(),
            columns_added = report.columns_added.len(),
            suppressed = report.suppressed,
            "Schema provisioning complete"
        );
        Ok(report)
    }

    /// Required objects that are still absent; empty after a successful pass.
    pub async fn missing_objects(&self) -> Result<Vec<String>, ServiceError> {
        let mut missing = Vec::new();
        for (name, _) in table_statements() {
            if !self.has_table(name).await? {
                missing.push(name.to_string());
            }
        }
        for (table, column, _) in ADDITIVE_COLUMNS {
            if !self.has_column(table, column).await? {
                missing.push(format!("{table}.{column}"));
            }
        }
        Ok(missing)
    }

    async fn has_table(&self, table: &str) -> Result<bool, ServiceError> {
        self.manager
            .has_table(table)
            .await
            .map_err(|e| ServiceError::SchemaError(format!("inspecting {table}: {e}")))
    }

    async fn has_column(&self, table: &str, column: &str) -> Result<bool, ServiceError> {
        self.manager
            .has_column(table, column)
            .await
            .map_err(|e| {
                ServiceError::SchemaError(format!("inspecting {table}.{column}: {e}"))
            })
    }
}

/// Convenience wrapper used by the orchestrator and the CLI.
pub async fn provision_schema(db: &DbPool) -> Result<ProvisionReport, ServiceError> {
    SchemaProvisioner::new(db).provision().await
}

/// `Ok(true)` when the statement ran, `Ok(false)` when it hit an existing object.
fn tolerate_existing(
    what: &str,
    result: Result<(), DbErr>,
    report: &mut ProvisionReport,
) -> Result<bool, ServiceError> {
    match result {
        Ok(()) => Ok(true),
        Err(err) if ServiceError::is_already_exists(&err) => {
            warn!(object = what, error = %err, "DDL target already exists; continuing");
            report.suppressed += 1;
            Ok(false)
        }
        Err(err) => Err(ServiceError::SchemaError(format!("{what}: {err}"))),
    }
}

fn pk(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn table_statements() -> Vec<(&'static str, TableCreateStatement)> {
    vec![
        (
            "companies",
            Table::create()
                .table(Companies::Table)
                .if_not_exists()
                .col(pk(Companies::Id))
                .col(ColumnDef::new(Companies::Name).string().not_null())
                .col(ColumnDef::new(Companies::Code).string_len(16).not_null().unique_key())
                .col(ColumnDef::new(Companies::Address).string().not_null())
                .col(ColumnDef::new(Companies::Phone).string().not_null())
                .col(ColumnDef::new(Companies::Email).string().not_null())
                .col(ColumnDef::new(Companies::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Companies::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned(),
        ),
        (
            "divisions",
            Table::create()
                .table(Divisions::Table)
                .if_not_exists()
                .col(pk(Divisions::Id))
                .col(ColumnDef::new(Divisions::Name).string().not_null())
                .col(ColumnDef::new(Divisions::Code).string_len(16).not_null())
                .col(ColumnDef::new(Divisions::CompanyId).integer().not_null())
                .col(ColumnDef::new(Divisions::CreatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_divisions_company")
                        .from(Divisions::Table, Divisions::CompanyId)
                        .to(Companies::Table, Companies::Id),
                )
                .to_owned(),
        ),
        (
            "departments",
            Table::create()
                .table(Departments::Table)
                .if_not_exists()
                .col(pk(Departments::Id))
                .col(ColumnDef::new(Departments::Name).string().not_null())
                .col(ColumnDef::new(Departments::Code).string_len(16).not_null())
                .col(ColumnDef::new(Departments::DivisionId).integer().not_null())
                .col(ColumnDef::new(Departments::CreatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_departments_division")
                        .from(Departments::Table, Departments::DivisionId)
                        .to(Divisions::Table, Divisions::Id),
                )
                .to_owned(),
        ),
        (
            "terminals",
            Table::create()
                .table(Terminals::Table)
                .if_not_exists()
                .col(pk(Terminals::Id))
                .col(ColumnDef::new(Terminals::Name).string().not_null())
                .col(ColumnDef::new(Terminals::Code).string_len(16).not_null().unique_key())
                .col(ColumnDef::new(Terminals::Address).string().not_null())
                .col(ColumnDef::new(Terminals::City).string().not_null())
                .col(ColumnDef::new(Terminals::State).string_len(2).not_null())
                .col(ColumnDef::new(Terminals::Zip).string_len(10).not_null())
                .col(ColumnDef::new(Terminals::Phone).string().not_null())
                .col(ColumnDef::new(Terminals::CompanyId).integer().not_null())
                .col(ColumnDef::new(Terminals::DepartmentId).integer().null())
                .col(ColumnDef::new(Terminals::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Terminals::UpdatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_terminals_company")
                        .from(Terminals::Table, Terminals::CompanyId)
                        .to(Companies::Table, Companies::Id),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_terminals_department")
                        .from(Terminals::Table, Terminals::DepartmentId)
                        .to(Departments::Table, Departments::Id),
                )
                .to_owned(),
        ),
        (
            "trucks",
            Table::create()
                .table(Trucks::Table)
                .if_not_exists()
                .col(pk(Trucks::Id))
                .col(ColumnDef::new(Trucks::Vin).string_len(17).not_null().unique_key())
                .col(ColumnDef::new(Trucks::Manufacturer).string().not_null())
                .col(ColumnDef::new(Trucks::Model).string().not_null())
                .col(ColumnDef::new(Trucks::ModelYear).integer().not_null())
                .col(ColumnDef::new(Trucks::Status).string_len(32).not_null())
                .col(ColumnDef::new(Trucks::Mileage).integer().not_null())
                .col(ColumnDef::new(Trucks::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned(),
        ),
        (
            "drivers",
            Table::create()
                .table(Drivers::Table)
                .if_not_exists()
                .col(pk(Drivers::Id))
                .col(ColumnDef::new(Drivers::FirstName).string().not_null())
                .col(ColumnDef::new(Drivers::LastName).string().not_null())
                .col(ColumnDef::new(Drivers::Phone).string().not_null())
                .col(ColumnDef::new(Drivers::Email).string().not_null())
                .col(ColumnDef::new(Drivers::LicenseNumber).string().not_null())
                .col(ColumnDef::new(Drivers::LicenseExpiry).date().not_null())
                .col(ColumnDef::new(Drivers::Status).string_len(32).not_null())
                .col(ColumnDef::new(Drivers::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned(),
        ),
        (
            "trailers",
            Table::create()
                .table(Trailers::Table)
                .if_not_exists()
                .col(pk(Trailers::Id))
                .col(ColumnDef::new(Trailers::TrailerNumber).string_len(16).not_null().unique_key())
                .col(ColumnDef::new(Trailers::TrailerType).string().not_null())
                .col(ColumnDef::new(Trailers::LengthFt).integer().not_null())
                .col(ColumnDef::new(Trailers::CapacityLbs).integer().not_null())
                .col(ColumnDef::new(Trailers::Year).integer().not_null())
                .col(ColumnDef::new(Trailers::Status).string_len(32).not_null())
                .col(ColumnDef::new(Trailers::LastInspectionDate).date().not_null())
                .col(ColumnDef::new(Trailers::NextInspectionDate).date().not_null())
                .col(ColumnDef::new(Trailers::TerminalId).integer().null())
                .col(ColumnDef::new(Trailers::CompanyId).integer().null())
                .col(ColumnDef::new(Trailers::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned(),
        ),
        (
            "loads",
            Table::create()
                .table(Loads::Table)
                .if_not_exists()
                .col(pk(Loads::Id))
                .col(ColumnDef::new(Loads::LoadNumber).string_len(24).not_null().unique_key())
                .col(ColumnDef::new(Loads::Shipper).string().not_null())
                .col(ColumnDef::new(Loads::Consignee).string().not_null())
                .col(ColumnDef::new(Loads::OriginCity).string().not_null())
                .col(ColumnDef::new(Loads::OriginState).string_len(2).not_null())
                .col(ColumnDef::new(Loads::DestinationCity).string().not_null())
                .col(ColumnDef::new(Loads::DestinationState).string_len(2).not_null())
                .col(ColumnDef::new(Loads::Commodity).string().not_null())
                .col(ColumnDef::new(Loads::PickupAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Loads::DeliveryAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Loads::Rate).decimal_len(12, 2).not_null())
                .col(ColumnDef::new(Loads::Status).string_len(32).not_null())
                .col(ColumnDef::new(Loads::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned(),
        ),
    ]
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    Name,
    Code,
    Address,
    Phone,
    Email,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Divisions {
    Table,
    Id,
    Name,
    Code,
    CompanyId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
    Name,
    Code,
    DivisionId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Terminals {
    Table,
    Id,
    Name,
    Code,
    Address,
    City,
    State,
    Zip,
    Phone,
    CompanyId,
    DepartmentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Trucks {
    Table,
    Id,
    Vin,
    Manufacturer,
    Model,
    ModelYear,
    Status,
    Mileage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Drivers {
    Table,
    Id,
    FirstName,
    LastName,
    Phone,
    Email,
    LicenseNumber,
    LicenseExpiry,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Trailers {
    Table,
    Id,
    TrailerNumber,
    TrailerType,
    LengthFt,
    CapacityLbs,
    Year,
    Status,
    LastInspectionDate,
    NextInspectionDate,
    TerminalId,
    CompanyId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Loads {
    Table,
    Id,
    LoadNumber,
    Shipper,
    Consignee,
    OriginCity,
    OriginState,
    DestinationCity,
    DestinationState,
    Commodity,
    PickupAt,
    DeliveryAt,
    Rate,
    Status,
    CreatedAt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerate_existing_only_swallows_duplicates() {
        let mut report = ProvisionReport::default();

        let dup = Err(DbErr::Custom("table \"trucks\" already exists".into()));
        assert!(!tolerate_existing("trucks", dup, &mut report).unwrap());
        assert_eq!(report.suppressed, 1);

        let fatal = Err(DbErr::Custom("permission denied for schema public".into()));
        assert!(matches!(
            tolerate_existing("trucks", fatal, &mut report),
            Err(ServiceError::SchemaError(_))
        ));
        assert!(tolerate_existing("trucks", Ok(()), &mut report).unwrap());
    }

    #[test]
    fn business_identifiers_are_uniquely_indexed() {
        for column in [("trucks", "vin"), ("trucks", "truck_number"), ("loads", "load_number")] {
            assert!(
                INDEXES
                    .iter()
                    .any(|(_, t, c, unique)| (*t, *c) == column && *unique),
                "{column:?}"
            );
        }
    }

    #[test]
    fn additive_columns_target_base_tables_only() {
        for (table, _, _) in ADDITIVE_COLUMNS {
            assert!(["trucks", "drivers", "loads"].contains(table));
        }
    }
}
