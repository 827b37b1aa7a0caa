use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        stock_record::{self, Entity as StockRecord},
        stock_transaction::{self, Entity as StockTransaction, TransactionKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_locks::{StockKey, StockLockManager},
};

/// Caller-supplied context for a stock mutation.
#[derive(Debug, Clone, Default)]
pub struct AdjustOptions {
    pub unit_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub reference: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub related_id: Option<Uuid>,
    pub user_id: Uuid,
}

/// Result of a physical count.
#[derive(Debug, Clone)]
pub struct CountResult {
    pub stock: stock_record::Model,
    pub adjustment: i32,
}

/// Filters for ledger queries.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub part_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
}

/// The single choke point for all stock mutations.
///
/// Every operation loads or creates the stock record under the key's
/// exclusive section, validates the requested change, and writes the new
/// record plus its ledger row(s) in one database transaction. A failed
/// operation leaves both the record and the ledger exactly as they were.
#[derive(Clone)]
pub struct StockLedgerService {
    db: Arc<DbPool>,
    locks: Arc<StockLockManager>,
    event_sender: Arc<EventSender>,
}

impl StockLedgerService {
    pub fn new(db: Arc<DbPool>, locks: Arc<StockLockManager>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db,
            locks,
            event_sender,
        }
    }

    /// Applies a single stock movement and returns the ledger row it wrote.
    ///
    /// `receipt`, `issue` and `return` take a positive quantity; the kind
    /// determines the sign applied to `on_hand`. `adjustment` takes the
    /// signed net delta directly. Transfer kinds are rejected here; they
    /// are only produced by [`transfer`](Self::transfer).
    #[instrument(skip(self, opts))]
    pub async fn adjust(
        &self,
        company_id: Uuid,
        part_id: Uuid,
        location_id: Uuid,
        quantity: i32,
        kind: TransactionKind,
        opts: AdjustOptions,
    ) -> Result<stock_transaction::Model, ServiceError> {
        match kind {
            TransactionKind::TransferOut | TransactionKind::TransferIn => {
                return Err(ServiceError::InvalidTransactionType(format!(
                    "{} rows are only written by transfer",
                    kind.as_str()
                )));
            }
            TransactionKind::Adjustment => {
                if quantity == 0 {
                    return Err(ServiceError::ValidationError(
                        "adjustment quantity must be non-zero".to_string(),
                    ));
                }
            }
            _ => {
                if quantity <= 0 {
                    return Err(ServiceError::ValidationError(format!(
                        "{} quantity must be positive",
                        kind.as_str()
                    )));
                }
            }
        }

        let key = StockKey::new(company_id, part_id, location_id);
        let _guard = self.locks.acquire(key).await?;

        let movement = Movement {
            key,
            kind,
            quantity,
            unit_cost: opts.unit_cost,
            from_location_id: None,
            to_location_id: None,
            related_id: opts.related_id,
            reason: opts.reason,
            notes: opts.notes,
            reference: opts.reference,
            reference_type: opts.reference_type,
            reference_id: opts.reference_id,
            user_id: opts.user_id,
        };

        let (stock, transaction) = self
            .db
            .transaction::<_, (stock_record::Model, stock_transaction::Model), ServiceError>(
                move |txn| Box::pin(async move { apply_movement(txn, movement).await }),
            )
            .await
            .map_err(map_txn_err)?;

        info!(
            part_id = %part_id,
            location_id = %location_id,
            kind = kind.as_str(),
            quantity = transaction.quantity,
            new_on_hand = stock.on_hand,
            "Stock adjusted"
        );

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                company_id,
                part_id,
                location_id,
                kind: kind.as_str().to_string(),
                quantity: transaction.quantity,
                new_on_hand: stock.on_hand,
                transaction_id: transaction.id,
            })
            .await;

        Ok(transaction)
    }

    /// Moves quantity between two locations as one atomic unit.
    ///
    /// Writes a `transfer_out` row at the source and a `transfer_in` row at
    /// the destination, sharing a generated `related_id`; either both commit
    /// or neither does. The destination's average cost absorbs the moved
    /// units at the source's average cost unless an explicit unit cost is
    /// supplied.
    #[instrument(skip(self, opts))]
    pub async fn transfer(
        &self,
        company_id: Uuid,
        part_id: Uuid,
        from_location_id: Uuid,
        to_location_id: Uuid,
        quantity: i32,
        opts: AdjustOptions,
    ) -> Result<(stock_transaction::Model, stock_transaction::Model), ServiceError> {
        if from_location_id == to_location_id {
            return Err(ServiceError::SameLocation(format!(
                "location {}",
                from_location_id
            )));
        }
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "transfer quantity must be positive".to_string(),
            ));
        }

        let from_key = StockKey::new(company_id, part_id, from_location_id);
        let to_key = StockKey::new(company_id, part_id, to_location_id);
        let _guards = self.locks.acquire_pair(from_key, to_key).await?;

        let related_id = Uuid::new_v4();

        let (out_leg, in_leg) = self
            .db
            .transaction::<_, (stock_transaction::Model, stock_transaction::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let source = find_or_create_record(txn, from_key).await?;
                        if quantity > source.available {
                            return Err(ServiceError::InsufficientAvailable(format!(
                                "part {} at location {}: available {}, requested {}",
                                part_id, from_location_id, source.available, quantity
                            )));
                        }

                        let unit_cost = opts.unit_cost.unwrap_or(source.average_cost);

                        let out_movement = Movement {
                            key: from_key,
                            kind: TransactionKind::TransferOut,
                            quantity,
                            unit_cost: Some(unit_cost),
                            from_location_id: Some(from_location_id),
                            to_location_id: Some(to_location_id),
                            related_id: Some(related_id),
                            reason: opts.reason.clone(),
                            notes: opts.notes.clone(),
                            reference: opts.reference.clone(),
                            reference_type: opts.reference_type.clone(),
                            reference_id: opts.reference_id,
                            user_id: opts.user_id,
                        };
                        let (_, out_row) = apply_movement(txn, out_movement).await?;

                        let in_movement = Movement {
                            key: to_key,
                            kind: TransactionKind::TransferIn,
                            quantity,
                            unit_cost: Some(unit_cost),
                            from_location_id: Some(from_location_id),
                            to_location_id: Some(to_location_id),
                            related_id: Some(related_id),
                            reason: opts.reason,
                            notes: opts.notes,
                            reference: opts.reference,
                            reference_type: opts.reference_type,
                            reference_id: opts.reference_id,
                            user_id: opts.user_id,
                        };
                        let (_, in_row) = apply_movement(txn, in_movement).await?;

                        Ok((out_row, in_row))
                    })
                },
            )
            .await
            .map_err(map_txn_err)?;

        info!(
            part_id = %part_id,
            from = %from_location_id,
            to = %to_location_id,
            quantity,
            related_id = %related_id,
            "Stock transferred"
        );

        self.event_sender
            .send_or_log(Event::StockTransferred {
                company_id,
                part_id,
                from_location_id,
                to_location_id,
                quantity,
                related_id,
            })
            .await;

        Ok((out_leg, in_leg))
    }

    /// Places a soft hold on available quantity.
    ///
    /// Reservations mutate only the stock record; no ledger row is written.
    /// Replaying the ledger reconstructs `on_hand` but deliberately not
    /// `reserved`; the audit trail for holds is owned by the calling layer.
    #[instrument(skip(self, opts))]
    pub async fn reserve(
        &self,
        company_id: Uuid,
        part_id: Uuid,
        location_id: Uuid,
        quantity: i32,
        opts: AdjustOptions,
    ) -> Result<stock_record::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "reserve quantity must be positive".to_string(),
            ));
        }

        let key = StockKey::new(company_id, part_id, location_id);
        let _guard = self.locks.acquire(key).await?;

        let record = self
            .db
            .transaction::<_, stock_record::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let record = find_or_create_record(txn, key).await?;
                    if quantity > record.available {
                        return Err(ServiceError::InsufficientAvailable(format!(
                            "part {} at location {}: available {}, requested {}",
                            part_id, location_id, record.available, quantity
                        )));
                    }

                    let new_reserved = record.reserved + quantity;
                    let mut active: stock_record::ActiveModel = record.clone().into();
                    active.reserved = Set(new_reserved);
                    active.available = Set(record.on_hand - new_reserved);
                    active.updated_at = Set(Utc::now());
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(map_txn_err)?;

        info!(
            part_id = %part_id,
            location_id = %location_id,
            quantity,
            reserved = record.reserved,
            "Stock reserved"
        );

        self.event_sender
            .send_or_log(Event::StockReserved {
                company_id,
                part_id,
                location_id,
                quantity,
                reserved: record.reserved,
                reference: opts.reference,
            })
            .await;

        Ok(record)
    }

    /// Releases a soft hold, flooring `reserved` at zero.
    #[instrument(skip(self, opts))]
    pub async fn release(
        &self,
        company_id: Uuid,
        part_id: Uuid,
        location_id: Uuid,
        quantity: i32,
        opts: AdjustOptions,
    ) -> Result<stock_record::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "release quantity must be positive".to_string(),
            ));
        }

        let key = StockKey::new(company_id, part_id, location_id);
        let _guard = self.locks.acquire(key).await?;

        let record = self
            .db
            .transaction::<_, stock_record::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let record = find_or_create_record(txn, key).await?;
                    let new_reserved = (record.reserved - quantity).max(0);
                    let mut active: stock_record::ActiveModel = record.clone().into();
                    active.reserved = Set(new_reserved);
                    active.available = Set(record.on_hand - new_reserved);
                    active.updated_at = Set(Utc::now());
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(map_txn_err)?;

        info!(
            part_id = %part_id,
            location_id = %location_id,
            quantity,
            reserved = record.reserved,
            "Stock released"
        );

        self.event_sender
            .send_or_log(Event::StockReleased {
                company_id,
                part_id,
                location_id,
                quantity,
                reserved: record.reserved,
                reference: opts.reference,
            })
            .await;

        Ok(record)
    }

    /// Reconciles the record against a physical count.
    ///
    /// A non-zero difference is written as a signed `adjustment` tagged
    /// "Physical Count"; the count stamp is updated either way.
    #[instrument(skip(self, opts))]
    pub async fn count(
        &self,
        company_id: Uuid,
        part_id: Uuid,
        location_id: Uuid,
        counted_quantity: i32,
        opts: AdjustOptions,
    ) -> Result<CountResult, ServiceError> {
        if counted_quantity < 0 {
            return Err(ServiceError::ValidationError(
                "counted quantity must be zero or positive".to_string(),
            ));
        }

        let key = StockKey::new(company_id, part_id, location_id);
        let _guard = self.locks.acquire(key).await?;

        let user_id = opts.user_id;
        let (stock, adjustment) = self
            .db
            .transaction::<_, (stock_record::Model, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let record = find_or_create_record(txn, key).await?;
                    let adjustment = counted_quantity - record.on_hand;

                    let record = if adjustment != 0 {
                        let movement = Movement {
                            key,
                            kind: TransactionKind::Adjustment,
                            quantity: adjustment,
                            unit_cost: None,
                            from_location_id: None,
                            to_location_id: None,
                            related_id: opts.related_id,
                            reason: Some("Physical Count".to_string()),
                            notes: opts.notes,
                            reference: opts.reference,
                            reference_type: opts.reference_type,
                            reference_id: opts.reference_id,
                            user_id,
                        };
                        let (updated, _) = apply_movement(txn, movement).await?;
                        updated
                    } else {
                        record
                    };

                    let now = Utc::now();
                    let mut active: stock_record::ActiveModel = record.into();
                    active.last_counted_at = Set(Some(now));
                    active.last_counted_by = Set(Some(user_id));
                    active.updated_at = Set(now);
                    Ok((active.update(txn).await?, adjustment))
                })
            })
            .await
            .map_err(map_txn_err)?;

        info!(
            part_id = %part_id,
            location_id = %location_id,
            counted_quantity,
            adjustment,
            "Stock counted"
        );

        self.event_sender
            .send_or_log(Event::StockCounted {
                company_id,
                part_id,
                location_id,
                counted_quantity,
                adjustment,
                counted_at: stock.last_counted_at.unwrap_or_else(Utc::now),
            })
            .await;

        Ok(CountResult { stock, adjustment })
    }

    /// Looks up one stock record.
    #[instrument(skip(self))]
    pub async fn get_stock(
        &self,
        company_id: Uuid,
        part_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<stock_record::Model>, ServiceError> {
        let record = StockRecord::find()
            .filter(stock_record::Column::CompanyId.eq(company_id))
            .filter(stock_record::Column::PartId.eq(part_id))
            .filter(stock_record::Column::LocationId.eq(location_id))
            .one(self.db.as_ref())
            .await?;
        Ok(record)
    }

    /// Lists stock records for a company, optionally narrowed by part and/or
    /// location.
    #[instrument(skip(self))]
    pub async fn list_stock(
        &self,
        company_id: Uuid,
        part_id: Option<Uuid>,
        location_id: Option<Uuid>,
    ) -> Result<Vec<stock_record::Model>, ServiceError> {
        let mut query = StockRecord::find().filter(stock_record::Column::CompanyId.eq(company_id));
        if let Some(part_id) = part_id {
            query = query.filter(stock_record::Column::PartId.eq(part_id));
        }
        if let Some(location_id) = location_id {
            query = query.filter(stock_record::Column::LocationId.eq(location_id));
        }
        Ok(query.all(self.db.as_ref()).await?)
    }

    /// Lists ledger rows, newest first.
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        company_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        let mut query =
            StockTransaction::find().filter(stock_transaction::Column::CompanyId.eq(company_id));
        if let Some(part_id) = filter.part_id {
            query = query.filter(stock_transaction::Column::PartId.eq(part_id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(stock_transaction::Column::LocationId.eq(location_id));
        }
        if let Some(reference_type) = filter.reference_type {
            query = query.filter(stock_transaction::Column::ReferenceType.eq(reference_type));
        }
        if let Some(reference_id) = filter.reference_id {
            query = query.filter(stock_transaction::Column::ReferenceId.eq(reference_id));
        }
        query = query.order_by_desc(stock_transaction::Column::CreatedAt);
        Ok(query.all(self.db.as_ref()).await?)
    }
}

/// One resolved stock movement, ready to apply under the key's lock.
#[derive(Debug, Clone)]
struct Movement {
    key: StockKey,
    kind: TransactionKind,
    quantity: i32,
    unit_cost: Option<Decimal>,
    from_location_id: Option<Uuid>,
    to_location_id: Option<Uuid>,
    related_id: Option<Uuid>,
    reason: Option<String>,
    notes: Option<String>,
    reference: Option<String>,
    reference_type: Option<String>,
    reference_id: Option<Uuid>,
    user_id: Uuid,
}

fn map_txn_err(e: TransactionError<ServiceError>) -> ServiceError {
    match e {
        TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// Consistency guard: a committed record must satisfy `on_hand >= 0` and
/// `reserved <= on_hand`.
fn guard_resulting_on_hand(
    movement: &Movement,
    record: &stock_record::Model,
    new_on_hand: i32,
) -> Result<(), ServiceError> {
    if new_on_hand < 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "part {} at location {}: on hand {}, requested change {}",
            movement.key.part_id,
            movement.key.location_id,
            record.on_hand,
            new_on_hand - record.on_hand
        )));
    }
    if new_on_hand < record.reserved {
        return Err(ServiceError::InsufficientStock(format!(
            "part {} at location {}: {} reserved would exceed resulting on hand {}",
            movement.key.part_id, movement.key.location_id, record.reserved, new_on_hand
        )));
    }
    Ok(())
}

/// Quantity-weighted moving average, 2 decimal places.
pub(crate) fn weighted_average_cost(
    on_hand_before: i32,
    average_before: Decimal,
    quantity: i32,
    unit_cost: Decimal,
) -> Decimal {
    let total = Decimal::from(on_hand_before) * average_before + Decimal::from(quantity) * unit_cost;
    (total / Decimal::from(on_hand_before + quantity)).round_dp(2)
}

/// Loads the stock record for `key`, creating a zeroed row on first touch.
/// Rows are never deleted; a zero row records that the pair has been used.
async fn find_or_create_record(
    txn: &DatabaseTransaction,
    key: StockKey,
) -> Result<stock_record::Model, ServiceError> {
    let existing = StockRecord::find()
        .filter(stock_record::Column::CompanyId.eq(key.company_id))
        .filter(stock_record::Column::PartId.eq(key.part_id))
        .filter(stock_record::Column::LocationId.eq(key.location_id))
        .one(txn)
        .await?;

    if let Some(record) = existing {
        return Ok(record);
    }

    let now = Utc::now();
    let record = stock_record::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(key.company_id),
        part_id: Set(key.part_id),
        location_id: Set(key.location_id),
        on_hand: Set(0),
        reserved: Set(0),
        available: Set(0),
        average_cost: Set(Decimal::ZERO),
        bin_location: Set(None),
        last_counted_at: Set(None),
        last_counted_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(record.insert(txn).await?)
}

/// Applies one movement: guard, record update, ledger row. Assumes the
/// caller holds the key's exclusive section.
async fn apply_movement(
    txn: &DatabaseTransaction,
    movement: Movement,
) -> Result<(stock_record::Model, stock_transaction::Model), ServiceError> {
    let record = find_or_create_record(txn, movement.key).await?;

    let delta = movement.kind.on_hand_delta(movement.quantity);
    let new_on_hand = record.on_hand + delta;
    guard_resulting_on_hand(&movement, &record, new_on_hand)?;

    let unit_cost = movement.unit_cost.unwrap_or(record.average_cost).round_dp(2);
    let average_cost = if delta > 0 && movement.unit_cost.is_some() {
        weighted_average_cost(record.on_hand, record.average_cost, delta, unit_cost)
    } else {
        record.average_cost
    };

    let now = Utc::now();
    let mut active: stock_record::ActiveModel = record.clone().into();
    active.on_hand = Set(new_on_hand);
    active.available = Set(new_on_hand - record.reserved);
    active.average_cost = Set(average_cost);
    active.updated_at = Set(now);
    let updated = active.update(txn).await?;

    let row = stock_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(movement.key.company_id),
        part_id: Set(movement.key.part_id),
        location_id: Set(movement.key.location_id),
        kind: Set(movement.kind.as_str().to_string()),
        quantity: Set(delta),
        previous_on_hand: Set(record.on_hand),
        new_on_hand: Set(new_on_hand),
        unit_cost: Set(unit_cost),
        total_cost: Set((Decimal::from(delta) * unit_cost).round_dp(2)),
        from_location_id: Set(movement.from_location_id),
        to_location_id: Set(movement.to_location_id),
        reason: Set(movement.reason),
        notes: Set(movement.notes),
        reference: Set(movement.reference),
        reference_type: Set(movement.reference_type),
        reference_id: Set(movement.reference_id),
        related_id: Set(movement.related_id),
        created_by: Set(movement.user_id),
        created_at: Set(now),
    };
    let inserted = row.insert(txn).await?;

    Ok((updated, inserted))
}
