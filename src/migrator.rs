use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_parts_table::Migration),
            Box::new(m20240301_000002_create_stock_locations_table::Migration),
            Box::new(m20240301_000003_create_stock_records_table::Migration),
            Box::new(m20240301_000004_create_stock_transactions_table::Migration),
            Box::new(m20240301_000005_create_purchase_orders_table::Migration),
            Box::new(m20240301_000006_create_purchase_order_lines_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_parts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_parts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Parts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Parts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Parts::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Parts::PartNumber).string().not_null())
                        .col(ColumnDef::new(Parts::Name).string().not_null())
                        .col(ColumnDef::new(Parts::Description).string().null())
                        .col(ColumnDef::new(Parts::UnitOfMeasure).string().not_null())
                        .col(ColumnDef::new(Parts::ReorderPoint).integer().null())
                        .col(ColumnDef::new(Parts::ReorderQuantity).integer().null())
                        .col(ColumnDef::new(Parts::Status).string().not_null())
                        .col(ColumnDef::new(Parts::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Parts::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_parts_company_part_number")
                        .table(Parts::Table)
                        .col(Parts::CompanyId)
                        .col(Parts::PartNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Parts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Parts {
        Table,
        Id,
        CompanyId,
        PartNumber,
        Name,
        Description,
        UnitOfMeasure,
        ReorderPoint,
        ReorderQuantity,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_stock_locations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_stock_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockLocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockLocations::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(StockLocations::Code).string().not_null())
                        .col(ColumnDef::new(StockLocations::Name).string().not_null())
                        .col(ColumnDef::new(StockLocations::ParentId).uuid().null())
                        .col(
                            ColumnDef::new(StockLocations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockLocations::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_locations_company_code")
                        .table(StockLocations::Table)
                        .col(StockLocations::CompanyId)
                        .col(StockLocations::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockLocations {
        Table,
        Id,
        CompanyId,
        Code,
        Name,
        ParentId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_stock_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_stock_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRecords::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(StockRecords::PartId).uuid().not_null())
                        .col(ColumnDef::new(StockRecords::LocationId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockRecords::OnHand)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockRecords::Reserved)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockRecords::Available)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockRecords::AverageCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockRecords::BinLocation).string().null())
                        .col(
                            ColumnDef::new(StockRecords::LastCountedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(ColumnDef::new(StockRecords::LastCountedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockRecords::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRecords::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_records_company_part_location")
                        .table(StockRecords::Table)
                        .col(StockRecords::CompanyId)
                        .col(StockRecords::PartId)
                        .col(StockRecords::LocationId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockRecords {
        Table,
        Id,
        CompanyId,
        PartId,
        LocationId,
        OnHand,
        Reserved,
        Available,
        AverageCost,
        BinLocation,
        LastCountedAt,
        LastCountedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000004_create_stock_transactions_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_stock_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::CompanyId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransactions::PartId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockTransactions::LocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransactions::Kind).string().not_null())
                        .col(
                            ColumnDef::new(StockTransactions::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::PreviousOnHand)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::NewOnHand)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::TotalCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::FromLocationId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(StockTransactions::ToLocationId).uuid().null())
                        .col(ColumnDef::new(StockTransactions::Reason).string().null())
                        .col(ColumnDef::new(StockTransactions::Notes).string().null())
                        .col(ColumnDef::new(StockTransactions::Reference).string().null())
                        .col(
                            ColumnDef::new(StockTransactions::ReferenceType)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(StockTransactions::ReferenceId).uuid().null())
                        .col(ColumnDef::new(StockTransactions::RelatedId).uuid().null())
                        .col(
                            ColumnDef::new(StockTransactions::CreatedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transactions_key_created_at")
                        .table(StockTransactions::Table)
                        .col(StockTransactions::CompanyId)
                        .col(StockTransactions::PartId)
                        .col(StockTransactions::LocationId)
                        .col(StockTransactions::CreatedAt)
                        .to_owned(),
                )
                .await?;

            // Reverse lookup from business documents
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transactions_reference")
                        .table(StockTransactions::Table)
                        .col(StockTransactions::ReferenceType)
                        .col(StockTransactions::ReferenceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockTransactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockTransactions {
        Table,
        Id,
        CompanyId,
        PartId,
        LocationId,
        Kind,
        Quantity,
        PreviousOnHand,
        NewOnHand,
        UnitCost,
        TotalCost,
        FromLocationId,
        ToLocationId,
        Reason,
        Notes,
        Reference,
        ReferenceType,
        ReferenceId,
        RelatedId,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240301_000005_create_purchase_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_purchase_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::PoNumber).string().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::SupplierName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                        .col(ColumnDef::new(PurchaseOrders::OrderedAt).timestamp().null())
                        .col(ColumnDef::new(PurchaseOrders::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_company_po_number")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::CompanyId)
                        .col(PurchaseOrders::PoNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        CompanyId,
        PoNumber,
        SupplierName,
        Status,
        OrderedAt,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_purchase_order_lines_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_purchase_order_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLines::PartId).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PartNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Description)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::OrderedQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::ReceivedQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_order_lines_po")
                        .table(PurchaseOrderLines::Table)
                        .col(PurchaseOrderLines::PurchaseOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrderLines::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderLines {
        Table,
        Id,
        PurchaseOrderId,
        PartId,
        PartNumber,
        Description,
        OrderedQuantity,
        ReceivedQuantity,
        UnitCost,
        CreatedAt,
        UpdatedAt,
    }
}
