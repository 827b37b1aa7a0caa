use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        part::{self, Entity as Part},
        purchase_order::{self, Entity as PurchaseOrder, PurchaseOrderStatus},
        purchase_order_line::{self, Entity as PurchaseOrderLine},
        stock_transaction::TransactionKind,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_ledger::{AdjustOptions, StockLedgerService},
};

/// One line the operator wants to receive.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReceiveLineRequest {
    pub line_id: Uuid,
    pub quantity: i32,
}

/// What actually happened to one line. `quantity` is capped at the line's
/// remaining ordered quantity, so it may be less than requested (or zero).
#[derive(Debug, Clone, Serialize)]
pub struct ReceivedLine {
    pub line_id: Uuid,
    pub part_id: Uuid,
    pub quantity: i32,
    pub transaction_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiveOutcome {
    pub purchase_order: purchase_order::Model,
    pub lines: Vec<ReceivedLine>,
    pub fully_received: bool,
}

/// Receives purchase-order lines into stock by driving the ledger.
#[derive(Clone)]
pub struct ReceivingService {
    db: Arc<DbPool>,
    ledger: Arc<StockLedgerService>,
    event_sender: Arc<EventSender>,
}

impl ReceivingService {
    pub fn new(
        db: Arc<DbPool>,
        ledger: Arc<StockLedgerService>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            ledger,
            event_sender,
        }
    }

    /// Receives the requested lines of a purchase order into `location_id`.
    ///
    /// Each line is capped at its remaining ordered quantity and booked as a
    /// `receipt` at the line's unit cost, referencing the PO. Lines without
    /// a linked part are resolved by part number within the company and the
    /// link persisted; an unresolvable line fails the call. After all lines,
    /// the order is `closed` if every line is fully received, otherwise
    /// `ordered`.
    #[instrument(skip(self, requests))]
    pub async fn receive_purchase_order(
        &self,
        company_id: Uuid,
        purchase_order_id: Uuid,
        location_id: Uuid,
        requests: Vec<ReceiveLineRequest>,
        user_id: Uuid,
    ) -> Result<ReceiveOutcome, ServiceError> {
        if requests.is_empty() {
            return Err(ServiceError::ValidationError(
                "no lines to receive".to_string(),
            ));
        }

        let db = self.db.as_ref();

        let po = PurchaseOrder::find_by_id(purchase_order_id)
            .filter(purchase_order::Column::CompanyId.eq(company_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("purchase order {} not found", purchase_order_id))
            })?;

        if po.status() == Some(PurchaseOrderStatus::Cancelled) {
            return Err(ServiceError::ValidationError(format!(
                "purchase order {} is cancelled",
                po.po_number
            )));
        }

        let mut received = Vec::with_capacity(requests.len());

        for request in requests {
            if request.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "line {}: receive quantity must be positive",
                    request.line_id
                )));
            }

            let line = PurchaseOrderLine::find_by_id(request.line_id)
                .filter(purchase_order_line::Column::PurchaseOrderId.eq(purchase_order_id))
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "line {} not found on purchase order {}",
                        request.line_id, po.po_number
                    ))
                })?;

            let (line, part_id) = self.resolve_part(company_id, line).await?;

            let quantity = line.remaining_quantity().min(request.quantity);
            let transaction_id = if quantity > 0 {
                let transaction = self
                    .ledger
                    .adjust(
                        company_id,
                        part_id,
                        location_id,
                        quantity,
                        TransactionKind::Receipt,
                        AdjustOptions {
                            unit_cost: Some(line.unit_cost),
                            reason: Some("Purchase Order Receipt".to_string()),
                            reference: Some(po.po_number.clone()),
                            reference_type: Some("purchase_order".to_string()),
                            reference_id: Some(po.id),
                            related_id: Some(po.id),
                            user_id,
                            ..Default::default()
                        },
                    )
                    .await?;

                let mut active: purchase_order_line::ActiveModel = line.clone().into();
                active.received_quantity = Set(line.received_quantity + quantity);
                active.updated_at = Set(Utc::now());
                active.update(db).await?;

                Some(transaction.id)
            } else {
                None
            };

            received.push(ReceivedLine {
                line_id: line.id,
                part_id,
                quantity,
                transaction_id,
            });
        }

        let lines = PurchaseOrderLine::find()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(purchase_order_id))
            .all(db)
            .await?;
        let fully_received = lines.iter().all(|line| line.is_fully_received());

        let status = if fully_received {
            PurchaseOrderStatus::Closed
        } else {
            PurchaseOrderStatus::Ordered
        };
        let mut active: purchase_order::ActiveModel = po.clone().into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());
        let po = active.update(db).await?;

        info!(
            po_number = %po.po_number,
            lines = received.len(),
            fully_received,
            "Purchase order received"
        );

        self.event_sender
            .send_or_log(Event::PurchaseOrderReceived {
                company_id,
                purchase_order_id: po.id,
                po_number: po.po_number.clone(),
                fully_received,
            })
            .await;

        Ok(ReceiveOutcome {
            purchase_order: po,
            lines: received,
            fully_received,
        })
    }

    /// Returns the line with a resolved part link, looking the part up by
    /// part number within the company when the line has none.
    async fn resolve_part(
        &self,
        company_id: Uuid,
        line: purchase_order_line::Model,
    ) -> Result<(purchase_order_line::Model, Uuid), ServiceError> {
        if let Some(part_id) = line.part_id {
            return Ok((line, part_id));
        }

        let db = self.db.as_ref();
        let part = Part::find()
            .filter(part::Column::CompanyId.eq(company_id))
            .filter(part::Column::PartNumber.eq(line.part_number.clone()))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::PartNotResolvable(format!(
                    "line {}: no part matches part number {}",
                    line.id, line.part_number
                ))
            })?;

        let mut active: purchase_order_line::ActiveModel = line.into();
        active.part_id = Set(Some(part.id));
        active.updated_at = Set(Utc::now());
        let line = active.update(db).await?;

        info!(
            line_id = %line.id,
            part_id = %part.id,
            part_number = %part.part_number,
            "Resolved part link on purchase order line"
        );

        Ok((line, part.id))
    }
}
