use crate::{config::AppConfig, ApiResponse, PaginatedResponse};
use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Standard created response
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Resolves `page`/`limit` query values against the configured defaults
pub fn page_window(page: Option<u64>, limit: Option<u64>, config: &AppConfig) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit
        .unwrap_or(config.api_default_page_size)
        .clamp(1, config.api_max_page_size.max(1));
    (page, limit)
}

pub fn paginated<T>(items: Vec<T>, total: u64, page: u64, limit: u64) -> PaginatedResponse<T> {
    let total_pages = if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    };
    PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_clamps_to_config() {
        let config = AppConfig::new(
            "sqlite::memory:".into(),
            "test_secret_key_for_testing_purposes_only_32chars".into(),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        );
        assert_eq!(page_window(None, None, &config), (1, config.api_default_page_size));
        assert_eq!(page_window(Some(0), Some(0), &config), (1, 1));
        assert_eq!(
            page_window(Some(3), Some(10_000), &config),
            (3, config.api_max_page_size)
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = paginated(vec![1, 2], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        assert_eq!(paginated::<u8>(vec![], 0, 1, 20).total_pages, 0);
    }
}
