use foodbee::{
    config::{AppConfig, CvrConfig},
    db::create_orm_conn,
    dto::{
        basket::AddToBasketRequest,
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
    },
    entity::{
        postcodes::ActiveModel as PostcodeActive, product_sizes::ActiveModel as SizeActive,
        products::ActiveModel as ProductActive, shops::ActiveModel as ShopActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_SHOP},
    models::OrderStatus,
    routes::params::OrderListQuery,
    services::{basket_service, order_service},
    session::{BasketSession, SessionCookie, SessionStore},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set, Statement};
use uuid::Uuid;

// Basket -> checkout -> staff moves the order through its lifecycle.
#[tokio::test]
async fn checkout_and_fulfilment_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // Catalog: one shop selling rye bread at 10.00 in size "Stor".
    let owner_id = create_user(&state, ROLE_SHOP, "bager@example.com").await?;
    let postcode = PostcodeActive {
        id: NotSet,
        postcode: Set("8000".into()),
        city: Set("Aarhus C".into()),
        active: Set(true),
    }
    .insert(&state.orm)
    .await?;
    let shop = ShopActive {
        user_id: Set(owner_id),
        name: Set("Bageriet".into()),
        address: Set("Vestergade 1".into()),
        postcode_id: Set(Some(postcode.id)),
        homepage: Set(String::new()),
        email: Set("bager@example.com".into()),
        phone: Set("86123456".into()),
        cvr_number: Set(Some("12345678".into())),
        active: Set(true),
        created_at: Set(chrono::Utc::now().into()),
        updated_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;
    let size = SizeActive {
        id: NotSet,
        name: Set("Stor".into()),
    }
    .insert(&state.orm)
    .await?;
    let product = ProductActive {
        shop_id: Set(shop.id),
        name: Set("Rugbrød".into()),
        description: Set(None),
        price: Set(Decimal::new(1000, 2)),
        offer_price: Set(None),
        active: Set(true),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    // Customer adds the same line twice.
    let add = || AddToBasketRequest {
        product: product.id,
        color: None,
        size: Some(size.id),
    };
    let mut session = BasketSession::load(state.sessions.as_ref(), SessionCookie(None)).await?;
    basket_service::add_to_basket(state.catalog.as_ref(), &mut session, add()).await?;
    basket_service::add_to_basket(state.catalog.as_ref(), &mut session, add()).await?;
    session.persist(state.sessions.as_ref()).await?;

    let view = basket_service::view_basket(state.catalog.as_ref(), &mut session).await?;
    let shown_total = view.data.expect("basket view").total;
    assert_eq!(shown_total, Decimal::new(2000, 2));

    // A second tab holding the same basket.
    let cookie = SessionCookie(Some(session.id()));
    let mut second_tab = BasketSession::load(state.sessions.as_ref(), cookie).await?;

    let placed = order_service::place_order(&state, &mut session, checkout_details()).await?;
    let placed = placed.data.expect("order");
    assert_eq!(placed.order.status, OrderStatus::Ordered);
    assert_eq!(placed.order.total_amount, shown_total);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].count, 2);
    assert_eq!(placed.items[0].price, Decimal::new(1000, 2));
    let item_sum: Decimal = placed.items.iter().map(|item| item.subtotal).sum();
    assert_eq!(item_sum, placed.order.total_amount);
    assert!(session.basket().is_empty());

    let stored = state.sessions.load(session.id()).await?.expect("session row");
    assert!(stored.basket.is_empty());

    // Submitting the old basket again must not create a second order.
    let again = order_service::place_order(&state, &mut second_tab, checkout_details()).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(foodbee::entity::Orders::find().count(&state.orm).await?, 1);

    // A fresh empty basket cannot be ordered.
    let mut fresh = BasketSession::load(state.sessions.as_ref(), cookie).await?;
    let empty = order_service::place_order(&state, &mut fresh, checkout_details()).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    // Later price changes do not touch the snapshot.
    let mut repriced: ProductActive = product.clone().into();
    repriced.price = Set(Decimal::new(1250, 2));
    repriced.update(&state.orm).await?;

    let admin = AuthUser {
        user_id: create_user(&state, ROLE_ADMIN, "admin@example.com").await?,
        role: ROLE_ADMIN.into(),
        shop_id: None,
    };
    let staff = AuthUser {
        user_id: owner_id,
        role: ROLE_SHOP.into(),
        shop_id: Some(shop.id),
    };
    let stranger = AuthUser {
        user_id: Uuid::new_v4(),
        role: ROLE_SHOP.into(),
        shop_id: Some(shop.id + 1000),
    };

    let fetched = order_service::get_order(&state, &staff, placed.order.id).await?;
    assert_eq!(fetched.data.expect("order").items[0].price, Decimal::new(1000, 2));
    assert!(matches!(
        order_service::get_order(&state, &stranger, placed.order.id).await,
        Err(AppError::NotFound)
    ));

    let listed = order_service::list_orders(&state, &staff, OrderListQuery::default()).await?;
    assert_eq!(listed.data.expect("orders").items.len(), 1);
    let listed = order_service::list_orders(&state, &stranger, OrderListQuery::default()).await?;
    assert!(listed.data.expect("orders").items.is_empty());

    // Ordered -> Sent skips acceptance.
    let skipped = order_service::update_order_status(
        &state,
        &staff,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Sent,
        },
    )
    .await;
    assert!(matches!(skipped, Err(AppError::InvalidTransition { .. })));

    for status in [OrderStatus::Accepted, OrderStatus::Sent] {
        let updated = order_service::update_order_status(
            &state,
            &staff,
            placed.order.id,
            UpdateOrderStatusRequest { status },
        )
        .await?;
        assert_eq!(updated.data.expect("order").status, status);
    }

    let after_sent = order_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Rejected,
        },
    )
    .await;
    assert!(matches!(after_sent, Err(AppError::InvalidTransition { .. })));

    let sent_only = order_service::list_orders(
        &state,
        &admin,
        OrderListQuery {
            status: Some(OrderStatus::Sent),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(sent_only.data.expect("orders").items.len(), 1);

    // A product withdrawn after it was put in the basket fails the whole
    // checkout and leaves the basket as it was.
    let cake = ProductActive {
        shop_id: Set(shop.id),
        name: Set("Kringle".into()),
        description: Set(None),
        price: Set(Decimal::new(6500, 2)),
        offer_price: Set(None),
        active: Set(true),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;
    let mut basket = BasketSession::load(state.sessions.as_ref(), SessionCookie(None)).await?;
    basket_service::add_to_basket(state.catalog.as_ref(), &mut basket, add()).await?;
    basket_service::add_to_basket(
        state.catalog.as_ref(),
        &mut basket,
        AddToBasketRequest {
            product: cake.id,
            color: None,
            size: None,
        },
    )
    .await?;
    basket.persist(state.sessions.as_ref()).await?;

    let mut withdrawn: ProductActive = cake.clone().into();
    withdrawn.active = Set(false);
    withdrawn.update(&state.orm).await?;

    let orders_before = foodbee::entity::Orders::find().count(&state.orm).await?;
    let items_before = foodbee::entity::OrderItems::find().count(&state.orm).await?;

    let stale = order_service::place_order(&state, &mut basket, checkout_details()).await;
    assert!(matches!(
        stale,
        Err(AppError::StaleBasket { product_id }) if product_id == cake.id
    ));
    assert_eq!(foodbee::entity::Orders::find().count(&state.orm).await?, orders_before);
    assert_eq!(
        foodbee::entity::OrderItems::find().count(&state.orm).await?,
        items_before
    );
    assert_eq!(basket.basket().len(), 2);
    let kept = state.sessions.load(basket.id()).await?.expect("session row");
    assert_eq!(kept.basket.len(), 2);

    Ok(())
}

fn checkout_details() -> CheckoutRequest {
    CheckoutRequest {
        name: "Karen Hansen".into(),
        address: "Nørregade 4".into(),
        email: "karen@example.com".into(),
        mobile: "12345678".into(),
        postcode: "8000".into(),
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    sqlx::migrate!("./migrations")
        .run(orm.get_postgres_connection_pool())
        .await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, sessions, products, product_colors, product_sizes, shops, postcodes, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        site_domain: "foodbee.test".into(),
        mail_from: "noreply@foodbee.test".into(),
        nominatim_url: "http://127.0.0.1:9/search".into(),
        cvr: CvrConfig {
            url: "http://127.0.0.1:9".into(),
            user: String::new(),
            password: String::new(),
        },
    };
    AppState::new(orm, config)
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(None),
        role: Set(role.into()),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
