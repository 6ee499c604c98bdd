use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::ComponentKind;

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    /// Returns `(page, per_page, offset)`.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

// Query strings are decoded with serde_urlencoded, which cannot parse numbers
// through `#[serde(flatten)]`, so every query struct carries its own paging
// fields and exposes them through `pagination()`.
macro_rules! paged {
    ($ty:ty) => {
        impl $ty {
            pub fn pagination(&self) -> Pagination {
                Pagination {
                    page: self.page,
                    per_page: self.per_page,
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentSortBy {
    CreatedAt,
    Price,
    Model,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ComponentQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Matches manufacturer name or model.
    pub q: Option<String>,
    pub kind: Option<ComponentKind>,
    pub manufacturer_id: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub socket: Option<String>,
    pub form_factor: Option<String>,
    pub memory_type: Option<String>,
    pub interface: Option<String>,
    pub sort_by: Option<ComponentSortBy>,
    pub sort_order: Option<SortOrder>,
}
paged!(ComponentQuery);

impl ComponentQuery {
    /// Spec attribute filters that were supplied, as `(attribute, needle)`.
    pub fn spec_filters(&self) -> Vec<(&'static str, &str)> {
        [
            ("socket", self.socket.as_deref()),
            ("form_factor", self.form_factor.as_deref()),
            ("memory_type", self.memory_type.as_deref()),
            ("interface", self.interface.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| (name, v)))
        .collect()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ManufacturerQuery {
    pub kind: Option<ComponentKind>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
paged!(PageQuery);

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    /// Completed (handed over) orders are hidden unless this is set.
    pub include_completed: Option<bool>,
    pub sort_order: Option<SortOrder>,
}
paged!(OrderListQuery);

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StaffOrderQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Matches track number, username or email.
    pub q: Option<String>,
}
paged!(StaffOrderQuery);

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Matches component name or quantity.
    pub q: Option<String>,
}
paged!(StockQuery);

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub threshold: Option<i32>,
}
paged!(LowStockQuery);

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CpuLookupQuery {
    pub cpu_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MotherboardLookupQuery {
    pub motherboard_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        assert_eq!(Pagination::new(0, 500).normalize(), (1, 100, 0));
        assert_eq!(Pagination::new(3, 10).normalize(), (3, 10, 20));
    }

    #[test]
    fn huge_pages_saturate_the_offset() {
        assert_eq!(
            Pagination::new(i64::MAX, 100).normalize(),
            (i64::MAX, 100, i64::MAX)
        );
    }

    #[test]
    fn spec_filters_skip_empty_values() {
        let query = ComponentQuery {
            socket: Some("AM5".into()),
            form_factor: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(query.spec_filters(), vec![("socket", "AM5")]);
    }
}
