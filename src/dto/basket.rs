use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::basket::{BasketKey, BasketLine};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToBasketRequest {
    pub product: i32,
    pub color: Option<i32>,
    pub size: Option<i32>,
}

impl AddToBasketRequest {
    pub fn key(&self) -> BasketKey {
        BasketKey::new(self.product, self.color, self.size)
    }
}

/// One basket line joined against the catalog.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BasketItemView {
    pub product_id: i32,
    pub product: String,
    pub shop: String,
    pub color_id: Option<i32>,
    pub color: Option<String>,
    pub size_id: Option<i32>,
    pub size: Option<String>,
    pub count: u32,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    /// `<product>_<color>_<size>`, used to build `count_*` and `remove_*` form fields.
    pub form_key: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BasketView {
    pub items: Vec<BasketItemView>,
    #[schema(value_type = String)]
    pub total: Decimal,
    /// Lines dropped because their product is no longer available.
    pub removed: Vec<BasketKey>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BasketLineAdded {
    pub line: BasketLine,
    pub lines: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BasketUpdated {
    pub basket: BasketView,
    /// Set when the customer asked to continue to order placement.
    pub proceed_to_checkout: bool,
}
