use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_coupons_table::Migration),
            Box::new(m20240101_000003_create_orders_tables::Migration),
            Box::new(m20240101_000004_create_promotions_table::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MenuItems {
    Table,
    Id,
    Name,
    Description,
    Price,
    SavedAmount,
    ImageUrl,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TopPicks {
    Table,
    Id,
    MenuItemId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Coupons {
    Table,
    Id,
    Code,
    Description,
    ImageUrl,
    Discount,
    CouponType,
    CategoryId,
    BuyX,
    MinCartAmount,
    ValidFrom,
    ValidTo,
    Quantity,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    CustomerName,
    TableNumber,
    CouponCode,
    Subtotal,
    Discount,
    Total,
    SpecialInstructions,
    Status,
    ItemsJson,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    MenuItemId,
    Quantity,
    PriceAtOrder,
    LineTotal,
}

#[derive(DeriveIden)]
enum Promotions {
    Table,
    Id,
    Title,
    Description,
    ImageUrl,
    StartDate,
    EndDate,
    CreatedAt,
    UpdatedAt,
}

fn id_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn money_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).decimal_len(10, 2).not_null().to_owned()
}

mod m20240101_000001_create_catalog_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(&mut id_column(Categories::Id))
                        .col(
                            ColumnDef::new(Categories::Name)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MenuItems::Table)
                        .if_not_exists()
                        .col(&mut id_column(MenuItems::Id))
                        .col(ColumnDef::new(MenuItems::Name).string_len(150).not_null())
                        .col(ColumnDef::new(MenuItems::Description).text().null())
                        .col(&mut money_column(MenuItems::Price))
                        .col(ColumnDef::new(MenuItems::SavedAmount).decimal_len(10, 2).null())
                        .col(ColumnDef::new(MenuItems::ImageUrl).string().null())
                        .col(ColumnDef::new(MenuItems::CategoryId).integer().not_null())
                        .col(
                            ColumnDef::new(MenuItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MenuItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_menu_items_category_id")
                                .from(MenuItems::Table, MenuItems::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_menu_items_category_id")
                        .table(MenuItems::Table)
                        .col(MenuItems::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TopPicks::Table)
                        .if_not_exists()
                        .col(&mut id_column(TopPicks::Id))
                        .col(
                            ColumnDef::new(TopPicks::MenuItemId)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(TopPicks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_top_picks_menu_item_id")
                                .from(TopPicks::Table, TopPicks::MenuItemId)
                                .to(MenuItems::Table, MenuItems::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TopPicks::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MenuItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_coupons_table {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_coupons_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Coupons::Table)
                        .if_not_exists()
                        .col(&mut id_column(Coupons::Id))
                        .col(
                            ColumnDef::new(Coupons::Code)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Coupons::Description).text().null())
                        .col(ColumnDef::new(Coupons::ImageUrl).string().null())
                        .col(&mut money_column(Coupons::Discount))
                        .col(ColumnDef::new(Coupons::CouponType).string_len(32).not_null())
                        .col(ColumnDef::new(Coupons::CategoryId).integer().null())
                        .col(ColumnDef::new(Coupons::BuyX).integer().null())
                        .col(ColumnDef::new(Coupons::MinCartAmount).decimal_len(10, 2).null())
                        .col(
                            ColumnDef::new(Coupons::ValidFrom)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::ValidTo)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::Quantity)
                                .integer()
                                .null()
                                .check(Expr::col(Coupons::Quantity).gte(0)),
                        )
                        .col(
                            ColumnDef::new(Coupons::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Coupons::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_coupons_category_id")
                                .from(Coupons::Table, Coupons::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Coupons::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000003_create_orders_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_orders_tables"
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
                        .col(&mut id_column(Orders::Id))
                        .col(
                            ColumnDef::new(Orders::CustomerName)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::TableNumber).integer().not_null())
                        .col(ColumnDef::new(Orders::CouponCode).string_len(64).null())
                        .col(&mut money_column(Orders::Subtotal))
                        .col(&mut money_column(Orders::Discount))
                        .col(&mut money_column(Orders::Total))
                        .col(ColumnDef::new(Orders::SpecialInstructions).text().null())
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string_len(32)
                                .not_null()
                                .default("Pending"),
                        )
                        .col(ColumnDef::new(Orders::ItemsJson).json().null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_created_at")
                        .table(Orders::Table)
                        .col(Orders::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(&mut id_column(OrderItems::Id))
                        .col(ColumnDef::new(OrderItems::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrderItems::MenuItemId).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(OrderItems::Quantity).gte(1)),
                        )
                        .col(&mut money_column(OrderItems::PriceAtOrder))
                        .col(&mut money_column(OrderItems::LineTotal))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_menu_item_id")
                                .from(OrderItems::Table, OrderItems::MenuItemId)
                                .to(MenuItems::Table, MenuItems::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000004_create_promotions_table {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_promotions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Promotions::Table)
                        .if_not_exists()
                        .col(&mut id_column(Promotions::Id))
                        .col(ColumnDef::new(Promotions::Title).string_len(200).not_null())
                        .col(ColumnDef::new(Promotions::Description).text().null())
                        .col(ColumnDef::new(Promotions::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(Promotions::StartDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::EndDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Promotions::Table).to_owned())
                .await
        }
    }
}
