use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CouponType {
    /// Percentage off a category once enough of its items are in the cart
    #[sea_orm(string_value = "buy_x")]
    BuyX,
    #[sea_orm(string_value = "percentage")]
    Percentage,
    /// Flat amount off a category
    #[sea_orm(string_value = "fixed")]
    Fixed,
    #[sea_orm(string_value = "bogo")]
    Bogo,
    /// Percentage off the whole cart above a threshold
    #[sea_orm(string_value = "min_cart_amount")]
    MinCartAmount,
    /// Category percentage that only exists inside its validity window
    #[sea_orm(string_value = "date_range")]
    DateRange,
}

impl CouponType {
    /// Cart-wide coupons carry no category
    pub fn is_category_scoped(self) -> bool {
        !matches!(self, CouponType::MinCartAmount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Always stored uppercase
    #[sea_orm(unique)]
    pub code: String,

    pub description: Option<String>,
    pub image_url: Option<String>,

    /// Percent for percentage-style types, currency amount for `fixed`
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub discount: Decimal,

    pub coupon_type: CouponType,
    pub category_id: Option<i32>,
    pub buy_x: Option<i32>,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub min_cart_amount: Option<Decimal>,

    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,

    /// Remaining uses; `None` means unlimited
    pub quantity: Option<i32>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_limited(&self) -> bool {
        self.quantity.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
