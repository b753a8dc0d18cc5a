use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trucks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub vin: String,
    pub manufacturer: String,
    pub model: String,
    pub model_year: i32,
    pub status: String,
    pub mileage: i32,
    pub created_at: DateTime<Utc>,

    // Organizational and lifecycle columns added by the provisioner
    pub truck_number: Option<String>,
    pub is_automatic: Option<bool>,
    pub maintenance_due_date: Option<NaiveDate>,
    pub registration_expiry: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
    pub terminal_id: Option<i32>,
    pub company_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
