use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_products_table::Migration),
            Box::new(m20240101_000002_create_orders_table::Migration),
        ]
    }
}

mod m20240101_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Products::CostPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::PresetPrice).decimal_len(12, 2).null())
                        .col(ColumnDef::new(Products::ActualPrice).decimal_len(12, 2).null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_products_sku")
                        .table(Products::Table)
                        .col(Products::Sku)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        Sku,
        Name,
        CostPrice,
        Quantity,
        PresetPrice,
        ActualPrice,
    }
}

mod m20240101_000002_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Orders::TransactionDate).timestamp_with_time_zone().null())
                        .col(ColumnDef::new(Orders::BuyerName).string_len(255).null())
                        .col(
                            ColumnDef::new(Orders::ActualPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Orders::Profit)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::PaymentMethod).string_len(16).not_null())
                        .col(ColumnDef::new(Orders::Channel).string_len(16).not_null())
                        .col(ColumnDef::new(Orders::Status).string_len(16).not_null())
                        .col(ColumnDef::new(Orders::Remark).text().null())
                        .col(ColumnDef::new(Orders::ProductId).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_product_id")
                                .from(Orders::Table, Orders::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_order_number")
                        .table(Orders::Table)
                        .col(Orders::OrderNumber)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_product_id")
                        .table(Orders::Table)
                        .col(Orders::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        CreatedAt,
        TransactionDate,
        BuyerName,
        ActualPrice,
        Quantity,
        Profit,
        PaymentMethod,
        Channel,
        Status,
        Remark,
        ProductId,
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
    }
}
