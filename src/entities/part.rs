use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartStatus {
    Active,
    Inactive,
    Discontinued,
}

impl PartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Active => "active",
            PartStatus::Inactive => "inactive",
            PartStatus::Discontinued => "discontinued",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PartStatus::Active),
            "inactive" => Some(PartStatus::Inactive),
            "discontinued" => Some(PartStatus::Discontinued),
            _ => None,
        }
    }
}

/// Part master record. The ledger treats the part as immutable identity;
/// attribute changes are managed by the catalog layer.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    /// Unique within a company.
    pub part_number: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_of_measure: String,
    pub reorder_point: Option<i32>,
    pub reorder_quantity: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn status(&self) -> Option<PartStatus> {
        PartStatus::from_str(&self.status)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_record::Entity")]
    StockRecords,
}

impl Related<super::stock_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
