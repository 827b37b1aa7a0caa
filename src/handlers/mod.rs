pub mod health;
pub mod purchase_orders;
pub mod stock;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    receiving::ReceivingService, stock_ledger::StockLedgerService, stock_locks::StockLockManager,
};
use std::sync::Arc;
use std::time::Duration;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub stock_ledger: Arc<StockLedgerService>,
    pub receiving: Arc<ReceivingService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, lock_wait: Duration) -> Self {
        let locks = Arc::new(StockLockManager::new(lock_wait));
        let stock_ledger = Arc::new(StockLedgerService::new(
            db.clone(),
            locks,
            event_sender.clone(),
        ));
        let receiving = Arc::new(ReceivingService::new(db, stock_ledger.clone(), event_sender));

        Self {
            stock_ledger,
            receiving,
        }
    }
}
