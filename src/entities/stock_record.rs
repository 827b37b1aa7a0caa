use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mutable stock aggregate for one (company, part, location) key.
///
/// `available` is always `on_hand - reserved`; it is persisted for query
/// speed and rewritten on every mutation. Rows are created lazily on first
/// mutation and never deleted; a zero-quantity row records that the pair
/// has been touched.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub part_id: Uuid,
    pub location_id: Uuid,
    pub on_hand: i32,
    pub reserved: i32,
    pub available: i32,
    /// Quantity-weighted moving average, 2 decimal places.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub average_cost: Decimal,
    pub bin_location: Option<String>,
    pub last_counted_at: Option<DateTime<Utc>>,
    pub last_counted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id"
    )]
    Part,
    #[sea_orm(
        belongs_to = "super::stock_location::Entity",
        from = "Column::LocationId",
        to = "super::stock_location::Column::Id"
    )]
    StockLocation,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl Related<super::stock_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockLocation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
