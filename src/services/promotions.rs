use crate::{
    db::DbPool,
    entities::promotion::{self, ActiveModel as PromotionActiveModel, Entity as PromotionEntity},
    errors::ServiceError,
    services::not_blank,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreatePromotionRequest {
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePromotionRequest {
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromotionResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_running: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PromotionResponse {
    fn at(model: promotion::Model, now: DateTime<Utc>) -> Self {
        Self {
            is_running: model.is_running(now),
            id: model.id,
            title: model.title,
            description: model.description,
            image_url: model.image_url,
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ServiceError> {
    if end <= start {
        return Err(ServiceError::ValidationError(
            "end_date must be after start_date".into(),
        ));
    }
    Ok(())
}

/// Marketing banners with a display window
#[derive(Clone)]
pub struct PromotionService {
    db_pool: Arc<DbPool>,
}

impl PromotionService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_promotions(&self) -> Result<Vec<PromotionResponse>, ServiceError> {
        let now = Utc::now();
        let rows = PromotionEntity::find()
            .order_by_desc(promotion::Column::StartDate)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        Ok(rows.into_iter().map(|m| PromotionResponse::at(m, now)).collect())
    }

    /// Promotions whose window contains `now`
    #[instrument(skip(self))]
    pub async fn list_running(&self, now: DateTime<Utc>) -> Result<Vec<PromotionResponse>, ServiceError> {
        let rows = PromotionEntity::find()
            .filter(promotion::Column::StartDate.lte(now))
            .filter(promotion::Column::EndDate.gte(now))
            .order_by_asc(promotion::Column::EndDate)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        Ok(rows.into_iter().map(|m| PromotionResponse::at(m, now)).collect())
    }

    async fn find_model(&self, id: i32) -> Result<promotion::Model, ServiceError> {
        PromotionEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Promotion {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn get_promotion(&self, id: i32) -> Result<PromotionResponse, ServiceError> {
        let model = self.find_model(id).await?;
        Ok(PromotionResponse::at(model, Utc::now()))
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_promotion(
        &self,
        request: CreatePromotionRequest,
    ) -> Result<PromotionResponse, ServiceError> {
        request.validate()?;
        check_window(request.start_date, request.end_date)?;
        let now = Utc::now();

        let model = PromotionActiveModel {
            title: Set(request.title.trim().to_string()),
            description: Set(request.description),
            image_url: Set(request.image_url),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::classify_db)?;

        info!(promotion_id = model.id, "promotion created");
        Ok(PromotionResponse::at(model, now))
    }

    #[instrument(skip(self, request))]
    pub async fn update_promotion(
        &self,
        id: i32,
        request: UpdatePromotionRequest,
    ) -> Result<PromotionResponse, ServiceError> {
        request.validate()?;
        let existing = self.find_model(id).await?;
        check_window(
            request.start_date.unwrap_or(existing.start_date),
            request.end_date.unwrap_or(existing.end_date),
        )?;

        let mut active: PromotionActiveModel = existing.into();
        if let Some(title) = request.title {
            active.title = Set(title.trim().to_string());
        }
        if request.description.is_some() {
            active.description = Set(request.description);
        }
        if request.image_url.is_some() {
            active.image_url = Set(request.image_url);
        }
        if let Some(start) = request.start_date {
            active.start_date = Set(start);
        }
        if let Some(end) = request.end_date {
            active.end_date = Set(end);
        }
        let now = Utc::now();
        active.updated_at = Set(Some(now));

        let model = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        Ok(PromotionResponse::at(model, now))
    }

    #[instrument(skip(self))]
    pub async fn delete_promotion(&self, id: i32) -> Result<(), ServiceError> {
        let result = PromotionEntity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Promotion {id} not found")));
        }
        info!(promotion_id = id, "promotion deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    #[test]
    fn window_must_move_forward() {
        let start = Utc::now();
        assert!(check_window(start, start + Duration::days(7)).is_ok());
        assert_matches!(check_window(start, start), Err(ServiceError::ValidationError(_)));
        assert_matches!(
            check_window(start, start - Duration::hours(1)),
            Err(ServiceError::ValidationError(_))
        );
    }
}
