// Inventory stock & transaction ledger
pub mod stock_ledger;
pub mod stock_locks;

// Purchasing
pub mod receiving;
