use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_stock_items_table::Migration),
            Box::new(m20240101_000002_create_stock_locations_table::Migration),
            Box::new(m20240101_000003_create_stock_movements_table::Migration),
            Box::new(m20240101_000004_create_stock_balances_table::Migration),
        ]
    }
}

mod m20240101_000001_create_stock_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_stock_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockItems::ScopeId).uuid().not_null())
                        .col(ColumnDef::new(StockItems::Sku).string().not_null())
                        .col(ColumnDef::new(StockItems::Name).string().not_null())
                        .col(ColumnDef::new(StockItems::Unit).string().not_null())
                        .col(
                            ColumnDef::new(StockItems::MinQuantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockItems::SerialTracked)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StockItems::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(StockItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // SKU is unique within a scope
            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_items_scope_sku")
                        .table(StockItems::Table)
                        .col(StockItems::ScopeId)
                        .col(StockItems::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum StockItems {
        Table,
        Id,
        ScopeId,
        Sku,
        Name,
        Unit,
        MinQuantity,
        SerialTracked,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_stock_locations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_stock_locations_table"
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
                        .col(ColumnDef::new(StockLocations::ScopeId).uuid().not_null())
                        .col(ColumnDef::new(StockLocations::Kind).string().not_null())
                        .col(ColumnDef::new(StockLocations::Name).string().not_null())
                        .col(
                            ColumnDef::new(StockLocations::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(StockLocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockLocations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_locations_scope")
                        .table(StockLocations::Table)
                        .col(StockLocations::ScopeId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum StockLocations {
        Table,
        Id,
        ScopeId,
        Kind,
        Name,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_stock_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ScopeId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ItemId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::FromLocationId).uuid())
                        .col(ColumnDef::new(StockMovements::ToLocationId).uuid())
                        .col(ColumnDef::new(StockMovements::TicketId).uuid())
                        .col(
                            ColumnDef::new(StockMovements::Quantity)
                                .big_integer()
                                .not_null(),
                        )
                        // 16 is the largest precision the sqlite backend renders
                        .col(ColumnDef::new(StockMovements::UnitCost).decimal_len(16, 4))
                        .col(ColumnDef::new(StockMovements::Notes).text())
                        .col(
                            ColumnDef::new(StockMovements::PerformedBy)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::PerformedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, col) in [
                ("idx_stock_movements_scope", StockMovements::ScopeId),
                ("idx_stock_movements_type", StockMovements::MovementType),
                ("idx_stock_movements_item", StockMovements::ItemId),
                ("idx_stock_movements_from", StockMovements::FromLocationId),
                ("idx_stock_movements_to", StockMovements::ToLocationId),
                ("idx_stock_movements_ticket", StockMovements::TicketId),
                ("idx_stock_movements_performed_at", StockMovements::PerformedAt),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .name(name)
                            .table(StockMovements::Table)
                            .col(col)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    pub enum StockMovements {
        Table,
        Id,
        ScopeId,
        MovementType,
        ItemId,
        FromLocationId,
        ToLocationId,
        TicketId,
        Quantity,
        UnitCost,
        Notes,
        PerformedBy,
        PerformedAt,
        CreatedAt,
    }
}

mod m20240101_000004_create_stock_balances_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_stock_balances_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockBalances::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockBalances::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockBalances::ScopeId).uuid().not_null())
                        .col(ColumnDef::new(StockBalances::ItemId).uuid().not_null())
                        .col(ColumnDef::new(StockBalances::LocationId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockBalances::Quantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockBalances::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One row per (item, location); the coordinator's row lock keys on this
            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_balances_item_location")
                        .table(StockBalances::Table)
                        .col(StockBalances::ItemId)
                        .col(StockBalances::LocationId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_balances_scope")
                        .table(StockBalances::Table)
                        .col(StockBalances::ScopeId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockBalances::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum StockBalances {
        Table,
        Id,
        ScopeId,
        ItemId,
        LocationId,
        Quantity,
        UpdatedAt,
    }
}
