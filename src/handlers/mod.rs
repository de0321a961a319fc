use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

pub mod accounting;
pub mod auth;
pub mod booths;
pub mod brands;
pub mod ingredients;
pub mod menu;
pub mod sales;
pub mod stock;
pub mod users;

/// Optional brand override; only meaningful for super-admins, everyone
/// else is pinned to their own brand.
#[derive(Debug, Deserialize, IntoParams)]
pub struct BrandScope {
    pub brand_id: Option<Uuid>,
}
