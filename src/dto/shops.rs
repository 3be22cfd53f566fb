use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Postcode, Shop};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterShopRequest {
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub homepage: String,
    pub email: String,
    pub phone: String,
    pub cvr_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivateShopRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactShopRequest {
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopRegistered {
    pub shop_id: i32,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopDetail {
    #[serde(flatten)]
    pub shop: Shop,
    pub slug: String,
    /// URL-encoded `query=` parameter for a map search.
    pub map_query: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostcodeShops {
    pub postcode: Postcode,
    pub shops: Vec<Shop>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopDirectory {
    pub items: Vec<PostcodeShops>,
}

/// Company data found in the CVR registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
}
