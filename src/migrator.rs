use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_brands_table::Migration),
            Box::new(m20240101_000002_create_users_table::Migration),
            Box::new(m20240101_000003_create_booths_table::Migration),
            Box::new(m20240101_000004_create_ingredients_table::Migration),
            Box::new(m20240101_000005_create_menu_tables::Migration),
            Box::new(m20240101_000006_create_sales_tables::Migration),
            Box::new(m20240101_000007_create_booth_stocks_table::Migration),
            Box::new(m20240101_000008_create_stock_movements_table::Migration),
            Box::new(m20240101_000009_create_accounting_transactions_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_brands_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_brands_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Brands::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Brands::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Brands::Name).string().not_null())
                        .col(
                            ColumnDef::new(Brands::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Brands::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Brands::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Brands::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Brands {
        Table,
        Id,
        Name,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(ColumnDef::new(Users::BrandId).uuid().null())
                        .col(ColumnDef::new(Users::BoothId).uuid().null())
                        .col(
                            ColumnDef::new(Users::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Email,
        PasswordHash,
        Name,
        Role,
        BrandId,
        BoothId,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_booths_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_booths_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Booths::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Booths::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Booths::BrandId).uuid().not_null())
                        .col(ColumnDef::new(Booths::Name).string().not_null())
                        .col(ColumnDef::new(Booths::Location).string().null())
                        .col(
                            ColumnDef::new(Booths::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Booths::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Booths::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_booths_brand_id")
                        .table(Booths::Table)
                        .col(Booths::BrandId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Booths::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Booths {
        Table,
        Id,
        BrandId,
        Name,
        Location,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_ingredients_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_ingredients_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Ingredients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Ingredients::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Ingredients::BrandId).uuid().not_null())
                        .col(ColumnDef::new(Ingredients::Name).string().not_null())
                        .col(ColumnDef::new(Ingredients::Unit).string().not_null())
                        .col(
                            ColumnDef::new(Ingredients::CostPerUnit)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Ingredients::Stock)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Ingredients::MinimumStock)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Ingredients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Ingredients::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_ingredients_brand_id")
                        .table(Ingredients::Table)
                        .col(Ingredients::BrandId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Ingredients::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Ingredients {
        Table,
        Id,
        BrandId,
        Name,
        Unit,
        CostPerUnit,
        Stock,
        MinimumStock,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_menu_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_menu_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MenuItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuItems::BrandId).uuid().not_null())
                        .col(ColumnDef::new(MenuItems::BoothId).uuid().null())
                        .col(ColumnDef::new(MenuItems::Name).string().not_null())
                        .col(
                            ColumnDef::new(MenuItems::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MenuItems::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(MenuItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MenuItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MenuItemIngredients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuItemIngredients::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MenuItemIngredients::MenuItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MenuItemIngredients::IngredientId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MenuItemIngredients::QuantityPerUnit)
                                .decimal()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_menu_item_ingredients_menu_item_id")
                        .table(MenuItemIngredients::Table)
                        .col(MenuItemIngredients::MenuItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MenuItemIngredients::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MenuItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum MenuItems {
        Table,
        Id,
        BrandId,
        BoothId,
        Name,
        Price,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum MenuItemIngredients {
        Table,
        Id,
        MenuItemId,
        IngredientId,
        QuantityPerUnit,
    }
}

mod m20240101_000006_create_sales_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Sales::BrandId).uuid().not_null())
                        .col(ColumnDef::new(Sales::BoothId).uuid().not_null())
                        .col(ColumnDef::new(Sales::CashierId).uuid().not_null())
                        .col(
                            ColumnDef::new(Sales::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Sales::PaymentMethod).string().not_null())
                        .col(ColumnDef::new(Sales::PaymentStatus).string().not_null())
                        .col(
                            ColumnDef::new(Sales::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sales::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sales_booth_id")
                        .table(Sales::Table)
                        .col(Sales::BoothId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SaleItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SaleItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::MenuItemId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::Name).string().not_null())
                        .col(ColumnDef::new(SaleItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(SaleItems::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(SaleItems::LineTotal).decimal().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sale_items_sale_id")
                        .table(SaleItems::Table)
                        .col(SaleItems::SaleId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Sales {
        Table,
        Id,
        BrandId,
        BoothId,
        CashierId,
        TotalAmount,
        PaymentMethod,
        PaymentStatus,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum SaleItems {
        Table,
        Id,
        SaleId,
        MenuItemId,
        Name,
        Quantity,
        UnitPrice,
        LineTotal,
    }
}

mod m20240101_000007_create_booth_stocks_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_booth_stocks_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BoothStocks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BoothStocks::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BoothStocks::BoothId).uuid().not_null())
                        .col(ColumnDef::new(BoothStocks::IngredientId).uuid().not_null())
                        .col(
                            ColumnDef::new(BoothStocks::Allocated)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BoothStocks::Used)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BoothStocks::Remaining)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BoothStocks::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_booth_stocks_booth_ingredient")
                        .table(BoothStocks::Table)
                        .col(BoothStocks::BoothId)
                        .col(BoothStocks::IngredientId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BoothStocks::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum BoothStocks {
        Table,
        Id,
        BoothId,
        IngredientId,
        Allocated,
        Used,
        Remaining,
        UpdatedAt,
    }
}

mod m20240101_000008_create_stock_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_stock_movements_table"
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
                        .col(ColumnDef::new(StockMovements::BrandId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::IngredientId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::BoothId).uuid().null())
                        .col(ColumnDef::new(StockMovements::SaleId).uuid().null())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Quantity).decimal().not_null())
                        .col(ColumnDef::new(StockMovements::Note).string().null())
                        .col(ColumnDef::new(StockMovements::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_sale_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::SaleId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_ingredient_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::IngredientId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockMovements {
        Table,
        Id,
        BrandId,
        IngredientId,
        BoothId,
        SaleId,
        MovementType,
        Quantity,
        Note,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000009_create_accounting_transactions_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_accounting_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AccountingTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AccountingTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AccountingTransactions::BrandId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AccountingTransactions::BoothId).uuid().null())
                        .col(
                            ColumnDef::new(AccountingTransactions::Kind)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AccountingTransactions::Category)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AccountingTransactions::Amount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AccountingTransactions::Description)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(AccountingTransactions::RelatedId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(AccountingTransactions::RelatedType)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(AccountingTransactions::CreatedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(AccountingTransactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_accounting_transactions_related")
                        .table(AccountingTransactions::Table)
                        .col(AccountingTransactions::RelatedId)
                        .col(AccountingTransactions::RelatedType)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AccountingTransactions::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum AccountingTransactions {
        Table,
        Id,
        BrandId,
        BoothId,
        Kind,
        Category,
        Amount,
        Description,
        RelatedId,
        RelatedType,
        CreatedBy,
        CreatedAt,
    }
}
