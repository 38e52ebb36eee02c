use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Number of posts shown on every paginated listing.
pub const POSTS_PER_PAGE: u64 = 10;

/// A rendered view: the template the handler selected and the context it
/// assembled. Rendering itself happens outside this service.
#[derive(Debug, Serialize)]
pub struct View<T> {
    pub template: &'static str,
    pub context: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> View<T> {
    pub fn render(template: &'static str, context: T) -> Self {
        Self {
            template,
            context,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for View<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Paginator state for one page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageInfo {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageInfo {
    /// Out-of-range page numbers clamp to the nearest valid page; an empty
    /// listing still has a single (empty) first page.
    pub fn new(requested: u64, count: u64, per_page: u64) -> Self {
        let num_pages = if per_page == 0 {
            1
        } else {
            count.div_ceil(per_page).max(1)
        };
        let number = requested.clamp(1, num_pages);
        Self {
            number,
            num_pages,
            count,
            per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }

    /// Zero-based index for sea-orm's `fetch_page`.
    pub fn index(&self) -> u64 {
        self.number - 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub paginator: PageInfo,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, paginator: PageInfo) -> Self {
        Self { items, paginator }
    }
}

/// `?page=` is kept as a string so garbage values fall back to page 1
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PaginationQuery {
    pub page: Option<String>,
}

impl PaginationQuery {
    pub fn requested_page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_pages_with_remainder() {
        let info = PageInfo::new(1, 21, 10);
        assert_eq!(info.num_pages, 3);
        assert!(info.has_next);
        assert!(!info.has_previous);
    }

    #[test]
    fn num_pages_exact_division() {
        assert_eq!(PageInfo::new(1, 30, 10).num_pages, 3);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let info = PageInfo::new(1, 0, 10);
        assert_eq!(info.num_pages, 1);
        assert_eq!(info.number, 1);
        assert!(!info.has_next);
    }

    #[test]
    fn page_beyond_last_clamps_to_last() {
        let info = PageInfo::new(99, 25, 10);
        assert_eq!(info.number, 3);
        assert_eq!(info.index(), 2);
        assert!(!info.has_next);
        assert!(info.has_previous);
    }

    #[test]
    fn page_zero_clamps_to_first() {
        assert_eq!(PageInfo::new(0, 25, 10).number, 1);
    }

    #[test]
    fn garbage_page_query_means_first_page() {
        let query = PaginationQuery {
            page: Some("abc".to_string()),
        };
        assert_eq!(query.requested_page(), 1);
        let query = PaginationQuery {
            page: Some(" 4 ".to_string()),
        };
        assert_eq!(query.requested_page(), 4);
        assert_eq!(PaginationQuery::default().requested_page(), 1);
    }
}
