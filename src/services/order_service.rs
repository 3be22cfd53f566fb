use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::{Expr, LockType, Query, SelectStatement};
use uuid::Uuid;

use crate::{
    catalog::{self, load_snapshot},
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        postcodes::{Column as PostcodeCol, Entity as Postcodes},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    session::BasketSession,
    state::AppState,
};

/// Turn the session basket into an order.
///
/// The order and its items are written in one transaction. Before it commits
/// the emptied basket is saved with the version it was loaded at, so a second
/// submit of the same basket fails with a conflict instead of ordering twice.
pub async fn place_order(
    state: &AppState,
    session: &mut BasketSession,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let payload = validate_checkout(payload)?;
    if session.basket().is_empty() {
        return Err(AppError::BadRequest("Basket is empty".into()));
    }

    let txn = state.orm.begin().await?;

    let postcode = Postcodes::find()
        .filter(PostcodeCol::Postcode.eq(payload.postcode.as_str()))
        .one(&txn)
        .await?;
    let Some(postcode) = postcode else {
        let mut errors = FieldErrors::new();
        errors.add("postcode", "Unknown postcode");
        return Err(AppError::Validation(errors));
    };

    let basket = session.basket().clone();
    let snapshot = load_snapshot(
        &txn,
        &basket.product_ids(),
        &basket.color_ids(),
        &basket.size_ids(),
    )
    .await?;
    let lines = snapshot.price_lines(&basket)?;
    let total_amount = catalog::total(&lines);

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        address: Set(payload.address),
        email: Set(payload.email),
        mobile: Set(payload.mobile),
        postcode_id: Set(postcode.id),
        status: Set(OrderStatus::Ordered),
        total_amount: Set(total_amount),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let count = i32::try_from(line.count)
            .map_err(|_| AppError::BadRequest("quantity is too large".into()))?;
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.key.product),
            color_id: Set(line.key.color),
            size_id: Set(line.key.size),
            count: Set(count),
            price: Set(line.unit_price),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    session.basket_mut().clear();
    session.persist(state.sessions.as_ref()).await?;

    if let Err(err) = txn.commit().await {
        *session.basket_mut() = basket;
        if let Err(restore) = session.persist(state.sessions.as_ref()).await {
            tracing::error!(session_id = %session.id(), error = %restore, "could not restore basket");
        }
        return Err(err.into());
    }

    tracing::info!(
        order_id = %order.id,
        session_id = %session.id(),
        items = items.len(),
        total = %order.total_amount,
        "order placed"
    );

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Trim the customer details and collect every problem at once.
pub fn validate_checkout(payload: CheckoutRequest) -> AppResult<CheckoutRequest> {
    let payload = CheckoutRequest {
        name: payload.name.trim().to_string(),
        address: payload.address.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        mobile: payload.mobile.trim().to_string(),
        postcode: payload.postcode.trim().to_string(),
    };

    let mut errors = FieldErrors::new();
    errors.check_text("name", &payload.name, 100);
    errors.check_text("address", &payload.address, 100);
    errors.check_text("email", &payload.email, 254);
    errors.check_text("mobile", &payload.mobile, 20);
    if !payload.email.is_empty() && !looks_like_email(&payload.email) {
        errors.add("email", "Enter a valid email address");
    }
    if payload.postcode.len() != 4 || !payload.postcode.chars().all(|c| c.is_ascii_digit()) {
        errors.add("postcode", "Enter a four digit postcode");
    }
    errors.into_result()?;
    Ok(payload)
}

pub fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = visibility(user);
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let order = find_visible_order(&state.orm, user, id, false).await?;
    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;

    let existing = find_visible_order(&txn, user, id, true).await?;
    let from = existing.status;
    let to = payload.status;
    if !from.can_transition_to(to) {
        return Err(AppError::InvalidTransition { from, to });
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(to);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        %from,
        %to,
        terminal = to.is_terminal(),
        "order status changed"
    );

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Admins see every order, shop staff the orders containing their products.
fn visibility(user: &AuthUser) -> Condition {
    match (user.is_admin(), user.shop_id) {
        (true, _) => Condition::all(),
        (false, Some(shop_id)) => Condition::all().add(OrderCol::Id.in_subquery(shop_order_ids(shop_id))),
        (false, None) => Condition::all().add(Expr::value(false)),
    }
}

fn shop_order_ids(shop_id: i32) -> SelectStatement {
    Query::select()
        .column((OrderItems, OrderItemCol::OrderId))
        .from(OrderItems)
        .inner_join(
            Products,
            Expr::col((Products, ProdCol::Id)).equals((OrderItems, OrderItemCol::ProductId)),
        )
        .and_where(Expr::col((Products, ProdCol::ShopId)).eq(shop_id))
        .to_owned()
}

/// Orders outside the caller's reach are reported as missing.
async fn find_visible_order<C>(
    conn: &C,
    user: &AuthUser,
    id: Uuid,
    for_update: bool,
) -> AppResult<OrderModel>
where
    C: ConnectionTrait,
{
    let mut finder = Orders::find_by_id(id).filter(visibility(user));
    if for_update {
        finder = finder.lock(LockType::Update);
    }
    finder.one(conn).await?.ok_or(AppError::NotFound)
}

async fn load_items<C>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>>
where
    C: ConnectionTrait,
{
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect())
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        name: model.name,
        address: model.address,
        email: model.email,
        mobile: model.mobile,
        postcode_id: model.postcode_id,
        status: model.status,
        total_amount: model.total_amount,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        color_id: model.color_id,
        size_id: model.size_id,
        count: model.count,
        price: model.price,
        subtotal: model.price * Decimal::from(model.count),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
