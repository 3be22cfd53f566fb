pub mod auth_service;
pub mod basket_service;
pub mod order_service;
pub mod shop_service;
