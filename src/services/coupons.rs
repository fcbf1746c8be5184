use crate::{
    db::DbPool,
    entities::{
        category,
        coupon::{self, ActiveModel as CouponActiveModel, CouponType, Entity as CouponEntity},
    },
    errors::ServiceError,
    services::{money_amount, not_blank, pricing::CouponRule},
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Trims and uppercases a coupon code; blank codes are rejected
pub fn normalize_code(code: &str) -> Result<String, ServiceError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(
            "Coupon code must not be blank".into(),
        ));
    }
    Ok(trimmed.to_uppercase())
}

/// Checks whether a stored coupon can be used at `now`.
///
/// This is advisory: it takes no lock. The conditional decrement performed
/// inside the order transaction is the authoritative quantity check.
pub fn check_availability(model: &coupon::Model, now: DateTime<Utc>) -> Result<(), ServiceError> {
    if !model.is_active {
        return Err(ServiceError::CouponNotFound(model.code.clone()));
    }
    if model.valid_from.is_some_and(|from| now < from) {
        return Err(ServiceError::CouponExpired(format!(
            "{} is not valid yet",
            model.code
        )));
    }
    if model.valid_to.is_some_and(|to| now > to) {
        return Err(ServiceError::CouponExpired(format!(
            "{} has expired",
            model.code
        )));
    }
    if model.quantity.is_some_and(|q| q <= 0) {
        return Err(ServiceError::CouponExhausted(format!(
            "{} has no uses left",
            model.code
        )));
    }
    Ok(())
}

/// A coupon that passed the availability checks, with its parsed rule
#[derive(Debug, Clone)]
pub struct ResolvedCoupon {
    pub model: coupon::Model,
    pub rule: CouponRule,
}

impl ResolvedCoupon {
    pub fn code(&self) -> &str {
        &self.model.code
    }

    pub fn is_limited(&self) -> bool {
        self.model.is_limited()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 64), custom = "not_blank")]
    pub code: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Percent for percentage-style types, currency amount for `fixed`
    #[validate(custom = "money_amount")]
    #[schema(value_type = String, example = "10")]
    pub discount: Decimal,
    pub coupon_type: CouponType,
    pub category_id: Option<i32>,
    pub buy_x: Option<i32>,
    #[validate(custom = "money_amount")]
    #[schema(value_type = Option<String>)]
    pub min_cart_amount: Option<Decimal>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    /// Remaining uses; omit for unlimited
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    pub is_active: Option<bool>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCouponRequest {
    #[validate(length(min = 1, max = 64), custom = "not_blank")]
    pub code: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[validate(custom = "money_amount")]
    #[schema(value_type = Option<String>)]
    pub discount: Option<Decimal>,
    pub coupon_type: Option<CouponType>,
    pub category_id: Option<i32>,
    pub buy_x: Option<i32>,
    #[validate(custom = "money_amount")]
    #[schema(value_type = Option<String>)]
    pub min_cart_amount: Option<Decimal>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CouponResponse {
    pub id: i32,
    pub code: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[schema(value_type = String)]
    pub discount: Decimal,
    pub coupon_type: CouponType,
    pub category_id: Option<i32>,
    pub buy_x: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub min_cart_amount: Option<Decimal>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub quantity: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<coupon::Model> for CouponResponse {
    fn from(model: coupon::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            description: model.description,
            image_url: model.image_url,
            discount: model.discount,
            coupon_type: model.coupon_type,
            category_id: model.category_id,
            buy_x: model.buy_x,
            min_cart_amount: model.min_cart_amount,
            valid_from: model.valid_from,
            valid_to: model.valid_to,
            quantity: model.quantity,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Coupon lookups for the order path plus admin management
#[derive(Clone)]
pub struct CouponService {
    db_pool: Arc<DbPool>,
}

impl CouponService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Finds a usable coupon by code and parses its discount rule.
    #[instrument(skip(self))]
    pub async fn resolve(&self, code: &str, now: DateTime<Utc>) -> Result<ResolvedCoupon, ServiceError> {
        let code = normalize_code(code)?;

        let model = CouponEntity::find()
            .filter(coupon::Column::Code.eq(code.as_str()))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .ok_or_else(|| ServiceError::CouponNotFound(code.clone()))?;

        if let Err(err) = check_availability(&model, now) {
            counter!("restaurant.coupons.rejected", 1, "reason" => err.error_code());
            return Err(err);
        }

        let rule = CouponRule::try_from(&model).map_err(|err| {
            warn!(code = %model.code, error = %err, "stored coupon has an unusable rule");
            err
        })?;

        Ok(ResolvedCoupon { model, rule })
    }

    /// Coupons a customer could apply right now
    #[instrument(skip(self))]
    pub async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<CouponResponse>, ServiceError> {
        let coupons = CouponEntity::find()
            .filter(coupon::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(coupon::Column::ValidFrom.is_null())
                    .add(coupon::Column::ValidFrom.lte(now)),
            )
            .filter(
                Condition::any()
                    .add(coupon::Column::ValidTo.is_null())
                    .add(coupon::Column::ValidTo.gte(now)),
            )
            .filter(
                Condition::any()
                    .add(coupon::Column::Quantity.is_null())
                    .add(coupon::Column::Quantity.gt(0)),
            )
            .order_by_asc(coupon::Column::Code)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;

        Ok(coupons.into_iter().map(CouponResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn list_coupons(&self) -> Result<Vec<CouponResponse>, ServiceError> {
        let coupons = CouponEntity::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        Ok(coupons.into_iter().map(CouponResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_coupon(&self, id: i32) -> Result<CouponResponse, ServiceError> {
        self.find_model(id).await.map(CouponResponse::from)
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_coupon(
        &self,
        request: CreateCouponRequest,
    ) -> Result<CouponResponse, ServiceError> {
        request.validate()?;
        let code = normalize_code(&request.code)?;
        let now = Utc::now();

        let candidate = coupon::Model {
            id: 0,
            code,
            description: request.description,
            image_url: request.image_url,
            discount: request.discount,
            coupon_type: request.coupon_type,
            category_id: request.category_id,
            buy_x: request.buy_x,
            min_cart_amount: request.min_cart_amount,
            valid_from: request.valid_from,
            valid_to: request.valid_to,
            quantity: request.quantity,
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: Some(now),
        };
        self.check_definition(&candidate, None).await?;

        let active = CouponActiveModel {
            code: Set(candidate.code),
            description: Set(candidate.description),
            image_url: Set(candidate.image_url),
            discount: Set(candidate.discount),
            coupon_type: Set(candidate.coupon_type),
            category_id: Set(candidate.category_id),
            buy_x: Set(candidate.buy_x),
            min_cart_amount: Set(candidate.min_cart_amount),
            valid_from: Set(candidate.valid_from),
            valid_to: Set(candidate.valid_to),
            quantity: Set(candidate.quantity),
            is_active: Set(candidate.is_active),
            created_at: Set(candidate.created_at),
            updated_at: Set(candidate.updated_at),
            ..Default::default()
        };

        let model = active
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;

        info!(coupon_id = model.id, code = %model.code, "coupon created");
        Ok(model.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update_coupon(
        &self,
        id: i32,
        request: UpdateCouponRequest,
    ) -> Result<CouponResponse, ServiceError> {
        request.validate()?;
        let existing = self.find_model(id).await?;

        let mut merged = existing.clone();
        if let Some(code) = request.code.as_deref() {
            merged.code = normalize_code(code)?;
        }
        if request.description.is_some() {
            merged.description = request.description;
        }
        if request.image_url.is_some() {
            merged.image_url = request.image_url;
        }
        if let Some(discount) = request.discount {
            merged.discount = discount;
        }
        if let Some(coupon_type) = request.coupon_type {
            merged.coupon_type = coupon_type;
            if !coupon_type.is_category_scoped() && request.category_id.is_none() {
                merged.category_id = None;
            }
        }
        if request.category_id.is_some() {
            merged.category_id = request.category_id;
        }
        if request.buy_x.is_some() {
            merged.buy_x = request.buy_x;
        }
        if request.min_cart_amount.is_some() {
            merged.min_cart_amount = request.min_cart_amount;
        }
        if request.valid_from.is_some() {
            merged.valid_from = request.valid_from;
        }
        if request.valid_to.is_some() {
            merged.valid_to = request.valid_to;
        }
        if request.quantity.is_some() {
            merged.quantity = request.quantity;
        }
        if let Some(is_active) = request.is_active {
            merged.is_active = is_active;
        }
        self.check_definition(&merged, Some(id)).await?;

        let mut active: CouponActiveModel = existing.into();
        active.code = Set(merged.code);
        active.description = Set(merged.description);
        active.image_url = Set(merged.image_url);
        active.discount = Set(merged.discount);
        active.coupon_type = Set(merged.coupon_type);
        active.category_id = Set(merged.category_id);
        active.buy_x = Set(merged.buy_x);
        active.min_cart_amount = Set(merged.min_cart_amount);
        active.valid_from = Set(merged.valid_from);
        active.valid_to = Set(merged.valid_to);
        active.quantity = Set(merged.quantity);
        active.is_active = Set(merged.is_active);
        active.updated_at = Set(Some(Utc::now()));

        let model = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;

        info!(coupon_id = model.id, "coupon updated");
        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_coupon(&self, id: i32) -> Result<(), ServiceError> {
        let result = CouponEntity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Coupon {id} not found")));
        }
        info!(coupon_id = id, "coupon deleted");
        Ok(())
    }

    async fn find_model(&self, id: i32) -> Result<coupon::Model, ServiceError> {
        CouponEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {id} not found")))
    }

    /// Rule shape, category reference and code uniqueness
    async fn check_definition(
        &self,
        candidate: &coupon::Model,
        existing_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        CouponRule::try_from(candidate)?;

        if let Some(category_id) = candidate.category_id {
            let exists = category::Entity::find_by_id(category_id)
                .one(&*self.db_pool)
                .await
                .map_err(ServiceError::classify_db)?
                .is_some();
            if !exists {
                return Err(ServiceError::InvalidReference(format!(
                    "Category {category_id} not found"
                )));
            }
        }

        let mut duplicate = CouponEntity::find().filter(coupon::Column::Code.eq(candidate.code.as_str()));
        if let Some(id) = existing_id {
            duplicate = duplicate.filter(coupon::Column::Id.ne(id));
        }
        if duplicate
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "Coupon code {} already exists",
                candidate.code
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn coupon(now: DateTime<Utc>) -> coupon::Model {
        coupon::Model {
            id: 7,
            code: "PIZZA10".into(),
            description: None,
            image_url: None,
            discount: dec!(10),
            coupon_type: CouponType::Percentage,
            category_id: Some(1),
            buy_x: None,
            min_cart_amount: None,
            valid_from: Some(now - Duration::days(1)),
            valid_to: Some(now + Duration::days(1)),
            quantity: Some(5),
            is_active: true,
            created_at: now,
            updated_at: None,
        }
    }

    #[test]
    fn normalize_code_trims_and_uppercases() {
        assert_eq!(normalize_code("  pizza10 ").unwrap(), "PIZZA10");
        assert_matches!(normalize_code("   "), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn available_coupon_passes() {
        let now = Utc::now();
        assert!(check_availability(&coupon(now), now).is_ok());

        let mut unbounded = coupon(now);
        unbounded.valid_from = None;
        unbounded.valid_to = None;
        unbounded.quantity = None;
        assert!(check_availability(&unbounded, now).is_ok());
    }

    #[test]
    fn inactive_coupon_is_not_found() {
        let now = Utc::now();
        let mut model = coupon(now);
        model.is_active = false;
        assert_matches!(check_availability(&model, now), Err(ServiceError::CouponNotFound(_)));
    }

    #[test]
    fn window_edges_are_inclusive() {
        let now = Utc::now();
        let mut model = coupon(now);
        model.valid_from = Some(now);
        model.valid_to = Some(now);
        assert!(check_availability(&model, now).is_ok());
    }

    #[test]
    fn closed_or_unopened_window_is_expired() {
        let now = Utc::now();
        let mut model = coupon(now);
        model.valid_to = Some(now - Duration::seconds(1));
        assert_matches!(check_availability(&model, now), Err(ServiceError::CouponExpired(_)));

        let mut model = coupon(now);
        model.valid_from = Some(now + Duration::hours(1));
        assert_matches!(check_availability(&model, now), Err(ServiceError::CouponExpired(_)));
    }

    #[test]
    fn zero_quantity_is_exhausted() {
        let now = Utc::now();
        let mut model = coupon(now);
        model.quantity = Some(0);
        assert_matches!(check_availability(&model, now), Err(ServiceError::CouponExhausted(_)));
    }
}
