use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    basket::{BasketKey, BasketLine},
    dto::{
        auth::{LoginRequest, LoginResponse},
        basket::{AddToBasketRequest, BasketItemView, BasketLineAdded, BasketUpdated, BasketView},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        shops::{
            ActivateShopRequest, CompanyInfo, ContactShopRequest, PostcodeShops,
            RegisterShopRequest, ShopDetail, ShopDirectory, ShopRegistered,
        },
    },
    error::FieldErrors,
    models::{Order, OrderItem, OrderStatus, Postcode, Shop},
    response::{ApiResponse, Meta},
    routes::{auth, basket, health, orders, params, shops},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::login,
        basket::view_basket,
        basket::add_to_basket,
        basket::update_basket,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        shops::list_shops,
        shops::get_shop,
        shops::contact_shop,
        shops::register_shop,
        shops::activate_shop,
        shops::cvr_lookup
    ),
    components(
        schemas(
            BasketKey,
            BasketLine,
            BasketItemView,
            BasketView,
            BasketLineAdded,
            BasketUpdated,
            AddToBasketRequest,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderStatus,
            Order,
            OrderItem,
            OrderList,
            OrderWithItems,
            Postcode,
            Shop,
            ShopDetail,
            PostcodeShops,
            ShopDirectory,
            RegisterShopRequest,
            ShopRegistered,
            ActivateShopRequest,
            ContactShopRequest,
            CompanyInfo,
            LoginRequest,
            LoginResponse,
            FieldErrors,
            params::Pagination,
            params::SortOrder,
            params::OrderListQuery,
            Meta,
            ApiResponse<BasketView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ShopDirectory>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Basket", description = "Session basket endpoints"),
        (name = "Orders", description = "Order placement and fulfilment"),
        (name = "Shops", description = "Shop directory, registration and CVR lookup"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
