use crate::{
    db::DbPool,
    entities::{
        category::{self, Entity as CategoryEntity},
        coupon,
        menu_item::{self, ActiveModel as MenuItemActiveModel, Entity as MenuItemEntity},
        order_item,
        top_pick::{self, Entity as TopPickEntity},
    },
    errors::ServiceError,
    services::{money_amount, not_blank, pricing::CatalogSnapshot},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub name: String,
}

/// Menu item as shown to customers and admins
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "150.00")]
    pub price: Decimal,
    #[schema(value_type = Option<String>)]
    pub saved_amount: Option<Decimal>,
    pub image_url: Option<String>,
    pub category_id: i32,
    pub category: Option<String>,
    pub is_top_pick: bool,
}

impl MenuItemResponse {
    fn build(model: menu_item::Model, category: Option<String>, is_top_pick: bool) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            saved_amount: model.saved_amount,
            image_url: model.image_url,
            category_id: model.category_id,
            category,
            is_top_pick,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateMenuItemRequest {
    #[validate(length(min = 1, max = 150), custom = "not_blank")]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "money_amount")]
    #[schema(value_type = String, example = "150.00")]
    pub price: Decimal,
    #[validate(custom = "money_amount")]
    #[schema(value_type = Option<String>)]
    pub saved_amount: Option<Decimal>,
    pub image_url: Option<String>,
    pub category_id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateMenuItemRequest {
    #[validate(length(min = 1, max = 150), custom = "not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "money_amount")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(custom = "money_amount")]
    #[schema(value_type = Option<String>)]
    pub saved_amount: Option<Decimal>,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopPickResponse {
    pub id: i32,
    pub menu_item: MenuItemResponse,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AddTopPickRequest {
    #[validate(range(min = 1))]
    pub menu_item_id: i32,
}

/// Menu items, categories and top picks
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Loads canonical prices for the given menu items together with the
    /// names of their categories and of `coupon_category`, the only names the
    /// pricing engine may mention.
    #[instrument(skip(self, menu_item_ids))]
    pub async fn snapshot_for(
        &self,
        menu_item_ids: &[i32],
        coupon_category: Option<i32>,
    ) -> Result<CatalogSnapshot, ServiceError> {
        let ids: Vec<i32> = menu_item_ids
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let items = MenuItemEntity::find()
            .filter(menu_item::Column::Id.is_in(ids))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;

        let category_ids: HashSet<i32> = items
            .iter()
            .map(|item| item.category_id)
            .chain(coupon_category)
            .collect();
        let categories = CategoryEntity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;

        let mut snapshot = CatalogSnapshot::new();
        for item in items {
            snapshot.insert_item(item.id, item.price, item.category_id);
        }
        for category in categories {
            snapshot.insert_category(category.id, category.name);
        }
        Ok(snapshot)
    }

    async fn top_pick_ids(&self) -> Result<HashSet<i32>, ServiceError> {
        Ok(TopPickEntity::find()
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .into_iter()
            .map(|pick| pick.menu_item_id)
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list_menu(&self) -> Result<Vec<MenuItemResponse>, ServiceError> {
        let rows = MenuItemEntity::find()
            .find_also_related(CategoryEntity)
            .order_by_asc(menu_item::Column::CategoryId)
            .order_by_asc(menu_item::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        let top_picks = self.top_pick_ids().await?;

        Ok(rows
            .into_iter()
            .map(|(item, category)| {
                let is_top_pick = top_picks.contains(&item.id);
                MenuItemResponse::build(item, category.map(|c| c.name), is_top_pick)
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_menu_item(&self, id: i32) -> Result<MenuItemResponse, ServiceError> {
        let (item, category) = MenuItemEntity::find_by_id(id)
            .find_also_related(CategoryEntity)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {id} not found")))?;
        let is_top_pick = self.top_pick_ids().await?.contains(&item.id);
        Ok(MenuItemResponse::build(
            item,
            category.map(|c| c.name),
            is_top_pick,
        ))
    }

    async fn require_category(&self, category_id: i32) -> Result<category::Model, ServiceError> {
        CategoryEntity::find_by_id(category_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("Category {category_id} not found"))
            })
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_menu_item(
        &self,
        request: CreateMenuItemRequest,
    ) -> Result<MenuItemResponse, ServiceError> {
        request.validate()?;
        let category = self.require_category(request.category_id).await?;
        let now = Utc::now();

        let model = MenuItemActiveModel {
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            price: Set(request.price),
            saved_amount: Set(request.saved_amount),
            image_url: Set(request.image_url),
            category_id: Set(category.id),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::classify_db)?;

        info!(menu_item_id = model.id, "menu item created");
        Ok(MenuItemResponse::build(model, Some(category.name), false))
    }

    #[instrument(skip(self, request))]
    pub async fn update_menu_item(
        &self,
        id: i32,
        request: UpdateMenuItemRequest,
    ) -> Result<MenuItemResponse, ServiceError> {
        request.validate()?;
        let existing = MenuItemEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {id} not found")))?;

        let category_id = request.category_id.unwrap_or(existing.category_id);
        let category = self.require_category(category_id).await?;

        let mut active: MenuItemActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if request.description.is_some() {
            active.description = Set(request.description);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if request.saved_amount.is_some() {
            active.saved_amount = Set(request.saved_amount);
        }
        if request.image_url.is_some() {
            active.image_url = Set(request.image_url);
        }
        active.category_id = Set(category.id);
        active.updated_at = Set(Some(Utc::now()));

        let model = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        let is_top_pick = self.top_pick_ids().await?.contains(&model.id);

        info!(menu_item_id = model.id, "menu item updated");
        Ok(MenuItemResponse::build(model, Some(category.name), is_top_pick))
    }

    /// Items that appear in order history cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_menu_item(&self, id: i32) -> Result<(), ServiceError> {
        let references = order_item::Entity::find()
            .filter(order_item::Column::MenuItemId.eq(id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Menu item {id} is referenced by {references} order lines"
            )));
        }

        TopPickEntity::delete_many()
            .filter(top_pick::Column::MenuItemId.eq(id))
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;

        let result = MenuItemEntity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Menu item {id} not found")));
        }
        info!(menu_item_id = id, "menu item deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryResponse>, ServiceError> {
        let categories = CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        Ok(categories.into_iter().map(CategoryResponse::from).collect())
    }

    async fn ensure_category_name_free(
        &self,
        name: &str,
        existing_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut query = CategoryEntity::find().filter(category::Column::Name.eq(name));
        if let Some(id) = existing_id {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "Category {name} already exists"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request.validate()?;
        let name = request.name.trim().to_string();
        self.ensure_category_name_free(&name, None).await?;

        let model = category::ActiveModel {
            name: Set(name),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::classify_db)?;

        info!(category_id = model.id, "category created");
        Ok(model.into())
    }

    #[instrument(skip(self, request))]
    pub async fn rename_category(
        &self,
        id: i32,
        request: CategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request.validate()?;
        let existing = CategoryEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {id} not found")))?;

        let name = request.name.trim().to_string();
        self.ensure_category_name_free(&name, Some(id)).await?;

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(name);
        let model = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        Ok(model.into())
    }

    /// Categories still used by menu items or coupons cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<(), ServiceError> {
        CategoryEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {id} not found")))?;

        let items = MenuItemEntity::find()
            .filter(menu_item::Column::CategoryId.eq(id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        let coupons = coupon::Entity::find()
            .filter(coupon::Column::CategoryId.eq(id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        if items > 0 || coupons > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category {id} is used by {items} menu items and {coupons} coupons"
            )));
        }

        CategoryEntity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        info!(category_id = id, "category deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_top_picks(&self) -> Result<Vec<TopPickResponse>, ServiceError> {
        let picks = TopPickEntity::find()
            .find_also_related(MenuItemEntity)
            .order_by_asc(top_pick::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        let categories: HashMap<i32, String> = CategoryEntity::find()
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(picks
            .into_iter()
            .filter_map(|(pick, item)| {
                let item = item?;
                let category = categories.get(&item.category_id).cloned();
                Some(TopPickResponse {
                    id: pick.id,
                    menu_item: MenuItemResponse::build(item, category, true),
                    created_at: pick.created_at,
                })
            })
            .collect())
    }

    #[instrument(skip(self, request), fields(menu_item_id = request.menu_item_id))]
    pub async fn add_top_pick(
        &self,
        request: AddTopPickRequest,
    ) -> Result<TopPickResponse, ServiceError> {
        request.validate()?;
        let item = MenuItemEntity::find_by_id(request.menu_item_id)
            .find_also_related(CategoryEntity)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        let Some((item, category)) = item else {
            return Err(ServiceError::InvalidReference(format!(
                "Menu item {} not found",
                request.menu_item_id
            )));
        };

        let already = TopPickEntity::find()
            .filter(top_pick::Column::MenuItemId.eq(item.id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        if already.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Menu item {} is already a top pick",
                item.id
            )));
        }

        let pick = top_pick::ActiveModel {
            menu_item_id: Set(item.id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::classify_db)?;

        info!(top_pick_id = pick.id, "top pick added");
        Ok(TopPickResponse {
            id: pick.id,
            menu_item: MenuItemResponse::build(item, category.map(|c| c.name), true),
            created_at: pick.created_at,
        })
    }

    #[instrument(skip(self))]
    pub async fn remove_top_pick(&self, id: i32) -> Result<(), ServiceError> {
        let result = TopPickEntity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Top pick {id} not found")));
        }
        Ok(())
    }
}
