#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use mainstay_api::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    entities::{
        part,
        purchase_order::{self, PurchaseOrderStatus},
        purchase_order_line, stock_location,
    },
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

/// Test harness backed by a throwaway SQLite database with migrations
/// applied. Each call gets a private database file under the system temp
/// directory.
pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    pub event_sender: EventSender,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_file = std::env::temp_dir().join(format!("mainstay_test_{}.db", Uuid::new_v4()));
        let config = DbConfig {
            url: format!("sqlite://{}?mode=rwc", db_file.display()),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            ..Default::default()
        };

        let pool = db::establish_connection_with_config(&config)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let db = Arc::new(pool);
        let (tx, rx) = mpsc::channel(256);
        let event_sender = EventSender::new(tx);
        let event_task = tokio::spawn(events::process_events(rx));

        let services = AppServices::new(
            db.clone(),
            Arc::new(event_sender.clone()),
            Duration::from_secs(5),
        );

        Self {
            db,
            services,
            event_sender,
            _event_task: event_task,
        }
    }

    /// Builds the full application router over this harness's state.
    pub fn router(&self) -> axum::Router {
        let state = AppState {
            db: self.db.clone(),
            config: AppConfig::new(
                "sqlite::memory:".to_string(),
                "127.0.0.1".to_string(),
                8080,
                "test".to_string(),
            ),
            event_sender: self.event_sender.clone(),
            services: self.services.clone(),
        };
        app_router(state)
    }
}

pub async fn create_part(
    db: &DbPool,
    company_id: Uuid,
    part_number: &str,
    name: &str,
) -> part::Model {
    let now = Utc::now();
    part::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        part_number: Set(part_number.to_string()),
        name: Set(name.to_string()),
        description: Set(None),
        unit_of_measure: Set("each".to_string()),
        reorder_point: Set(Some(5)),
        reorder_quantity: Set(Some(20)),
        status: Set(part::PartStatus::Active.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to insert part")
}

pub async fn create_location(db: &DbPool, company_id: Uuid, code: &str) -> stock_location::Model {
    let now = Utc::now();
    stock_location::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        code: Set(code.to_string()),
        name: Set(format!("Location {}", code)),
        parent_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to insert location")
}

pub async fn create_purchase_order(
    db: &DbPool,
    company_id: Uuid,
    po_number: &str,
    status: PurchaseOrderStatus,
) -> purchase_order::Model {
    let now = Utc::now();
    purchase_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        po_number: Set(po_number.to_string()),
        supplier_name: Set("Acme Industrial Supply".to_string()),
        status: Set(status.as_str().to_string()),
        ordered_at: Set(Some(now)),
        created_by: Set(Uuid::new_v4()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to insert purchase order")
}

pub async fn create_po_line(
    db: &DbPool,
    purchase_order_id: Uuid,
    part_id: Option<Uuid>,
    part_number: &str,
    ordered_quantity: i32,
    received_quantity: i32,
    unit_cost: Decimal,
) -> purchase_order_line::Model {
    let now = Utc::now();
    purchase_order_line::ActiveModel {
        id: Set(Uuid::new_v4()),
        purchase_order_id: Set(purchase_order_id),
        part_id: Set(part_id),
        part_number: Set(part_number.to_string()),
        description: Set(None),
        ordered_quantity: Set(ordered_quantity),
        received_quantity: Set(received_quantity),
        unit_cost: Set(unit_cost),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to insert purchase order line")
}
