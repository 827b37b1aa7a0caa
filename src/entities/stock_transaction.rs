use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of stock transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Receipt,
    Issue,
    Adjustment,
    TransferOut,
    TransferIn,
    Return,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Receipt => "receipt",
            TransactionKind::Issue => "issue",
            TransactionKind::Adjustment => "adjustment",
            TransactionKind::TransferOut => "transfer_out",
            TransactionKind::TransferIn => "transfer_in",
            TransactionKind::Return => "return",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "receipt" => Some(TransactionKind::Receipt),
            "issue" => Some(TransactionKind::Issue),
            "adjustment" => Some(TransactionKind::Adjustment),
            "transfer_out" => Some(TransactionKind::TransferOut),
            "transfer_in" => Some(TransactionKind::TransferIn),
            "return" => Some(TransactionKind::Return),
            _ => None,
        }
    }

    /// Signed delta this kind applies to `on_hand`.
    ///
    /// Receipts, transfer-ins and returns add; issues and transfer-outs
    /// subtract. Adjustments carry a caller-signed quantity and pass it
    /// through unchanged.
    pub fn on_hand_delta(&self, quantity: i32) -> i32 {
        match self {
            TransactionKind::Receipt | TransactionKind::TransferIn | TransactionKind::Return => {
                quantity
            }
            TransactionKind::Issue | TransactionKind::TransferOut => -quantity,
            TransactionKind::Adjustment => quantity,
        }
    }
}

/// An immutable, append-only ledger row. Never updated or deleted; the
/// signed sum of `quantity` across a stock record's rows equals `on_hand`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub part_id: Uuid,
    pub location_id: Uuid,
    pub kind: String,
    /// Signed quantity as applied to `on_hand`.
    pub quantity: i32,
    pub previous_on_hand: i32,
    pub new_on_hand: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_cost: Decimal,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    /// Free-text business reference, e.g. a PO number.
    pub reference: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    /// Pairs the two legs of a transfer, or links a source document.
    pub related_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn kind(&self) -> Option<TransactionKind> {
        TransactionKind::from_str(&self.kind)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
