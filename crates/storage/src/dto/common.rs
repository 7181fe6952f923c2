use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

const MAX_PAGE_SIZE: u32 = 500;

/// Decimal places kept for distances (`NUMERIC(8, 3)`).
pub const DISTANCE_DECIMALS: u32 = 3;

/// Largest distance the column holds: 99999.999 km.
pub const MAX_DISTANCE_KM: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, DISTANCE_DECIMALS);

#[derive(Debug, Clone, Copy, Deserialize, IntoParams, ToSchema)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    100
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be >= 1".to_string());
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(format!("page_size must be between 1 and {MAX_PAGE_SIZE}"));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(params: PaginationParams, total_items: i64) -> Self {
        let page_size = i64::from(params.page_size.max(1));
        let total_pages = (total_items.max(0) + page_size - 1) / page_size;

        Self {
            page: params.page,
            page_size: params.page_size,
            total_items,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: PaginationParams, total_items: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(params, total_items),
        }
    }
}

/// Rounds a distance to the stored precision and checks it is positive and
/// fits the column.
pub fn normalize_distance(distance_km: Decimal) -> Result<Decimal, String> {
    let rounded = distance_km.round_dp(DISTANCE_DECIMALS);

    if rounded <= Decimal::ZERO {
        return Err("distance_km must be greater than 0".to_string());
    }
    if rounded > MAX_DISTANCE_KM {
        return Err(format!("distance_km must be at most {MAX_DISTANCE_KM}"));
    }
    Ok(rounded)
}

/// For update fields where an absent key keeps the stored value and an
/// explicit `null` clears it. Use with `#[serde(default)]`.
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
