use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub load_number: String,
    pub shipper: String,
    pub consignee: String,
    pub origin_city: String,
    pub origin_state: String,
    pub destination_city: String,
    pub destination_state: String,
    pub commodity: String,
    pub pickup_at: DateTime<Utc>,
    pub delivery_at: DateTime<Utc>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub rate: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,

    // Organizational and lifecycle columns added by the provisioner
    pub distance_miles: Option<i32>,
    pub weight_lbs: Option<i32>,
    pub terminal_id: Option<i32>,
    pub company_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
