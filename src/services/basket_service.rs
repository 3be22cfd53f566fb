use crate::{
    basket::form::BasketCommand,
    catalog::Catalog,
    dto::basket::{AddToBasketRequest, BasketLineAdded, BasketUpdated, BasketView},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    session::BasketSession,
};

pub async fn add_to_basket(
    catalog: &dyn Catalog,
    session: &mut BasketSession,
    payload: AddToBasketRequest,
) -> AppResult<ApiResponse<BasketLineAdded>> {
    let key = payload.key();
    let snapshot = catalog
        .snapshot(
            &[key.product],
            &key.color.into_iter().collect::<Vec<_>>(),
            &key.size.into_iter().collect::<Vec<_>>(),
        )
        .await?;

    if !snapshot.is_available(key.product) {
        return Err(AppError::BadRequest("product not found".to_string()));
    }
    if key.color.is_some_and(|id| snapshot.color(id).is_none()) {
        return Err(AppError::BadRequest("color not found".to_string()));
    }
    if key.size.is_some_and(|id| snapshot.size(id).is_none()) {
        return Err(AppError::BadRequest("size not found".to_string()));
    }

    let basket = session.basket_mut();
    basket.add(key);
    let line = basket
        .get(&key)
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("added line missing from basket")))?;
    let lines = basket.len();

    tracing::info!(
        session_id = %session.id(),
        product = key.product,
        color = ?key.color,
        size = ?key.size,
        count = line.count,
        "added to basket"
    );

    Ok(ApiResponse::success(
        "Product added to basket",
        BasketLineAdded { line, lines },
        None,
    ))
}

/// Render the basket. Lines pointing at products that are gone are pruned
/// from the session and reported in `removed`.
pub async fn view_basket(
    catalog: &dyn Catalog,
    session: &mut BasketSession,
) -> AppResult<ApiResponse<BasketView>> {
    let view = render(catalog, session).await?;
    let message = if view.removed.is_empty() {
        "OK"
    } else {
        "Some products are no longer available and were removed from the basket"
    };
    Ok(ApiResponse::success(message, view, Some(Meta::empty())))
}

pub async fn update_basket(
    catalog: &dyn Catalog,
    session: &mut BasketSession,
    command: BasketCommand,
) -> AppResult<ApiResponse<BasketUpdated>> {
    let removed = command.apply(session.basket_mut());
    let message = match &command {
        BasketCommand::Update(_) => "Basket updated",
        BasketCommand::Order(_) => "Basket ready for order",
        BasketCommand::Clear => "Basket cleared",
        BasketCommand::Remove(_) if removed => "Product removed from basket",
        BasketCommand::Remove(_) => "Basket unchanged",
    };
    tracing::info!(session_id = %session.id(), ?command, "basket changed");

    let basket = render(catalog, session).await?;
    Ok(ApiResponse::success(
        message,
        BasketUpdated {
            basket,
            proceed_to_checkout: matches!(command, BasketCommand::Order(_)),
        },
        Some(Meta::empty()),
    ))
}

async fn render(catalog: &dyn Catalog, session: &mut BasketSession) -> AppResult<BasketView> {
    let snapshot = catalog.snapshot_for(session.basket()).await?;
    let view = snapshot.render(session.basket());
    if !view.removed.is_empty() {
        tracing::warn!(
            session_id = %session.id(),
            removed = ?view.removed,
            "dropping unavailable products from basket"
        );
        session
            .basket_mut()
            .retain_lines(|line| snapshot.line_available(line));
    }
    Ok(view)
}
