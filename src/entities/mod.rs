//! SeaORM entities for the seeded transportation-management tables.
//!
//! Organization tables (`companies`, `divisions`, `departments`, `terminals`)
//! and `trailers` are owned by the seeder. `trucks`, `drivers` and `loads` are
//! base tables that may already exist in the host schema; the columns the
//! seeder adds to them are therefore nullable.

pub mod company;
pub mod department;
pub mod division;
pub mod driver;
pub mod load;
pub mod terminal;
pub mod trailer;
pub mod truck;

/// Seeded tables, children before parents. Used by the reset step.
pub const SEEDED_TABLES: [&str; 8] = [
    "loads",
    "trailers",
    "drivers",
    "trucks",
    "terminals",
    "departments",
    "divisions",
    "companies",
];
