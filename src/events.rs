use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Events published by the stock ledger after a mutation commits.
///
/// The ledger itself is cache-agnostic; read caches, audit feeds and
/// notification fan-out all hang off this channel in the calling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockAdjusted {
        company_id: Uuid,
        part_id: Uuid,
        location_id: Uuid,
        kind: String,
        quantity: i32,
        new_on_hand: i32,
        transaction_id: Uuid,
    },
    StockTransferred {
        company_id: Uuid,
        part_id: Uuid,
        from_location_id: Uuid,
        to_location_id: Uuid,
        quantity: i32,
        related_id: Uuid,
    },
    StockReserved {
        company_id: Uuid,
        part_id: Uuid,
        location_id: Uuid,
        quantity: i32,
        reserved: i32,
        reference: Option<String>,
    },
    StockReleased {
        company_id: Uuid,
        part_id: Uuid,
        location_id: Uuid,
        quantity: i32,
        reserved: i32,
        reference: Option<String>,
    },
    StockCounted {
        company_id: Uuid,
        part_id: Uuid,
        location_id: Uuid,
        counted_quantity: i32,
        adjustment: i32,
        counted_at: DateTime<Utc>,
    },
    PurchaseOrderReceived {
        company_id: Uuid,
        purchase_order_id: Uuid,
        po_number: String,
        fully_received: bool,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Ledger mutations have already committed by the time events fire, so
    /// delivery is best-effort.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Drains the event channel, logging each event as it arrives.
/// Downstream consumers (cache invalidation, notifications) subscribe here.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        debug!(?event, "Processing event");
    }
    debug!("Event channel closed; processor exiting");
}
