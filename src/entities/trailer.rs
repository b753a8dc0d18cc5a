use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trailers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub trailer_number: String,
    pub trailer_type: String,
    pub length_ft: i32,
    pub capacity_lbs: i32,
    pub year: i32,
    pub status: String,
    pub last_inspection_date: NaiveDate,
    pub next_inspection_date: NaiveDate,
    pub terminal_id: Option<i32>,
    pub company_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
