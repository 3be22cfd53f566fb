//! Read-only view of products, colors and sizes as the basket sees them.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::{
    basket::{Basket, BasketKey, BasketLine},
    dto::basket::{BasketItemView, BasketView},
    entity::{
        product_colors::{Column as ColorCol, Entity as ProductColors},
        product_sizes::{Column as SizeCol, Entity as ProductSizes},
        products::{Column as ProdCol, Entity as Products},
        shops::Entity as Shops,
    },
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProduct {
    pub id: i32,
    pub name: String,
    pub shop_id: i32,
    pub shop_name: String,
    /// Offer price when one is set, otherwise the list price.
    pub price: Decimal,
    pub active: bool,
}

/// One basket line priced against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub key: BasketKey,
    pub count: u32,
    pub unit_price: Decimal,
}

impl PricedLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.count)
    }
}

pub fn total(lines: &[PricedLine]) -> Decimal {
    lines.iter().map(PricedLine::subtotal).sum()
}

/// Catalog rows needed to price a basket, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    products: HashMap<i32, CatalogProduct>,
    colors: HashMap<i32, String>,
    sizes: HashMap<i32, String>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, product: CatalogProduct) -> Self {
        self.products.insert(product.id, product);
        self
    }

    pub fn with_color(mut self, id: i32, name: impl Into<String>) -> Self {
        self.colors.insert(id, name.into());
        self
    }

    pub fn with_size(mut self, id: i32, name: impl Into<String>) -> Self {
        self.sizes.insert(id, name.into());
        self
    }

    pub fn product(&self, id: i32) -> Option<&CatalogProduct> {
        self.products.get(&id)
    }

    pub fn color(&self, id: i32) -> Option<&str> {
        self.colors.get(&id).map(String::as_str)
    }

    pub fn size(&self, id: i32) -> Option<&str> {
        self.sizes.get(&id).map(String::as_str)
    }

    /// Products that can still be ordered.
    pub fn is_available(&self, product_id: i32) -> bool {
        self.products
            .get(&product_id)
            .is_some_and(|product| product.active)
    }

    /// The line's product is orderable and its color and size still exist.
    pub fn line_available(&self, line: &BasketLine) -> bool {
        self.is_available(line.product)
            && line.color.is_none_or(|id| self.colors.contains_key(&id))
            && line.size.is_none_or(|id| self.sizes.contains_key(&id))
    }

    /// Price every line. The first unavailable line fails the whole basket.
    pub fn price_lines(&self, basket: &Basket) -> AppResult<Vec<PricedLine>> {
        basket
            .lines()
            .iter()
            .map(|line| match self.products.get(&line.product) {
                Some(product) if self.line_available(line) => Ok(PricedLine {
                    key: line.key(),
                    count: line.count,
                    unit_price: product.price,
                }),
                _ => Err(AppError::StaleBasket {
                    product_id: line.product,
                }),
            })
            .collect()
    }

    /// Display projection of `basket`. Unavailable lines are left out and
    /// listed in `removed`.
    pub fn render(&self, basket: &Basket) -> BasketView {
        let mut items = Vec::with_capacity(basket.len());
        let mut removed = Vec::new();

        for line in basket.lines() {
            let product = match self.products.get(&line.product) {
                Some(product) if self.line_available(line) => product,
                _ => {
                    removed.push(line.key());
                    continue;
                }
            };
            let subtotal = product.price * Decimal::from(line.count);
            items.push(BasketItemView {
                product_id: product.id,
                product: product.name.clone(),
                shop: product.shop_name.clone(),
                color_id: line.color,
                color: line.color.and_then(|id| self.color(id)).map(str::to_string),
                size_id: line.size,
                size: line.size.and_then(|id| self.size(id)).map(str::to_string),
                count: line.count,
                price: product.price,
                subtotal,
                form_key: line.key().form_suffix(),
            });
        }

        let total = items.iter().map(|item| item.subtotal).sum();
        BasketView {
            items,
            total,
            removed,
        }
    }

    fn restricted_to(&self, product_ids: &[i32], color_ids: &[i32], size_ids: &[i32]) -> Self {
        Self {
            products: pick(&self.products, product_ids),
            colors: pick(&self.colors, color_ids),
            sizes: pick(&self.sizes, size_ids),
        }
    }
}

fn pick<V: Clone>(map: &HashMap<i32, V>, ids: &[i32]) -> HashMap<i32, V> {
    ids.iter()
        .filter_map(|id| map.get(id).map(|value| (*id, value.clone())))
        .collect()
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Rows for the given ids. Ids that do not exist are simply absent.
    async fn snapshot(
        &self,
        product_ids: &[i32],
        color_ids: &[i32],
        size_ids: &[i32],
    ) -> AppResult<CatalogSnapshot>;

    async fn snapshot_for(&self, basket: &Basket) -> AppResult<CatalogSnapshot> {
        self.snapshot(&basket.product_ids(), &basket.color_ids(), &basket.size_ids())
            .await
    }
}

/// In-memory catalog, handy for tests and fixtures.
#[async_trait]
impl Catalog for CatalogSnapshot {
    async fn snapshot(
        &self,
        product_ids: &[i32],
        color_ids: &[i32],
        size_ids: &[i32],
    ) -> AppResult<CatalogSnapshot> {
        Ok(self.restricted_to(product_ids, color_ids, size_ids))
    }
}

#[derive(Debug, Clone)]
pub struct OrmCatalog {
    orm: DatabaseConnection,
}

impl OrmCatalog {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl Catalog for OrmCatalog {
    async fn snapshot(
        &self,
        product_ids: &[i32],
        color_ids: &[i32],
        size_ids: &[i32],
    ) -> AppResult<CatalogSnapshot> {
        load_snapshot(&self.orm, product_ids, color_ids, size_ids).await
    }
}

/// Load a snapshot on any connection, including an open transaction.
pub async fn load_snapshot<C>(
    conn: &C,
    product_ids: &[i32],
    color_ids: &[i32],
    size_ids: &[i32],
) -> AppResult<CatalogSnapshot>
where
    C: ConnectionTrait,
{
    let mut snapshot = CatalogSnapshot::new();

    if !product_ids.is_empty() {
        let rows = Products::find()
            .filter(ProdCol::Id.is_in(product_ids.iter().copied()))
            .find_also_related(Shops)
            .all(conn)
            .await?;
        for (product, shop) in rows {
            let Some(shop) = shop else {
                tracing::warn!(product_id = product.id, "product without shop");
                continue;
            };
            snapshot = snapshot.with_product(CatalogProduct {
                id: product.id,
                price: product.effective_price(),
                name: product.name,
                shop_id: shop.id,
                shop_name: shop.name,
                // Products of a shop that is not live are not orderable either.
                active: product.active && shop.active,
            });
        }
    }

    if !color_ids.is_empty() {
        for color in ProductColors::find()
            .filter(ColorCol::Id.is_in(color_ids.iter().copied()))
            .all(conn)
            .await?
        {
            snapshot = snapshot.with_color(color.id, color.name);
        }
    }

    if !size_ids.is_empty() {
        for size in ProductSizes::find()
            .filter(SizeCol::Id.is_in(size_ids.iter().copied()))
            .all(conn)
            .await?
        {
            snapshot = snapshot.with_size(size.id, size.name);
        }
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn product(id: i32, price: Decimal, active: bool) -> CatalogProduct {
        CatalogProduct {
            id,
            name: format!("Product {id}"),
            shop_id: 1,
            shop_name: "Bageriet".into(),
            price,
            active,
        }
    }

    #[test]
    fn render_totals_lines_against_current_prices() {
        let catalog = CatalogSnapshot::new()
            .with_product(product(1, dec("10.00"), true))
            .with_size(2, "Large");
        let basket: Basket = vec![crate::basket::BasketLine {
            product: 1,
            color: None,
            size: Some(2),
            count: 2,
        }]
        .into_iter()
        .collect();

        let view = catalog.render(&basket);

        assert_eq!(view.total, dec("20.00"));
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].size.as_deref(), Some("Large"));
        assert_eq!(view.items[0].color, None);
        assert_eq!(view.items[0].shop, "Bageriet");
        assert_eq!(view.items[0].form_key, "1__2");
        assert!(view.removed.is_empty());
    }

    #[test]
    fn render_drops_unavailable_products() {
        let catalog = CatalogSnapshot::new()
            .with_product(product(1, dec("4.50"), true))
            .with_product(product(2, dec("3.00"), false));
        let mut basket = Basket::new();
        basket.add(BasketKey::new(1, None, None));
        basket.add(BasketKey::new(2, None, None));
        basket.add(BasketKey::new(3, Some(1), None));

        let view = catalog.render(&basket);

        assert_eq!(view.total, dec("4.50"));
        assert_eq!(
            view.removed,
            vec![BasketKey::new(2, None, None), BasketKey::new(3, Some(1), None)]
        );
    }

    #[test]
    fn deleted_color_makes_line_unavailable() {
        let catalog = CatalogSnapshot::new()
            .with_product(product(1, dec("2.00"), true))
            .with_color(1, "Red");
        let mut basket = Basket::new();
        basket.add(BasketKey::new(1, Some(1), None));
        basket.add(BasketKey::new(1, Some(2), None));

        let view = catalog.render(&basket);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.removed, vec![BasketKey::new(1, Some(2), None)]);
        assert!(matches!(
            catalog.price_lines(&basket),
            Err(AppError::StaleBasket { product_id: 1 })
        ));
    }

    #[test]
    fn pricing_fails_on_stale_line() {
        let catalog = CatalogSnapshot::new().with_product(product(1, dec("1.00"), true));
        let mut basket = Basket::new();
        basket.add(BasketKey::new(1, None, None));
        basket.add(BasketKey::new(8, None, None));

        match catalog.price_lines(&basket) {
            Err(AppError::StaleBasket { product_id }) => assert_eq!(product_id, 8),
            other => panic!("expected stale basket, got {other:?}"),
        }
    }

    #[test]
    fn priced_total_matches_rendered_total() {
        let catalog = CatalogSnapshot::new()
            .with_product(product(1, dec("12.95"), true))
            .with_product(product(2, dec("0.50"), true))
            .with_size(1, "S");
        let mut basket = Basket::new();
        basket.add(BasketKey::new(1, None, None));
        basket.add(BasketKey::new(2, None, Some(1)));
        basket.update([(BasketKey::new(1, None, None), 3)]);

        let lines = catalog.price_lines(&basket).unwrap();

        assert_eq!(total(&lines), dec("39.35"));
        assert_eq!(total(&lines), catalog.render(&basket).total);
    }

    #[tokio::test]
    async fn in_memory_catalog_returns_requested_rows_only() {
        let catalog = CatalogSnapshot::new()
            .with_product(product(1, dec("1.00"), true))
            .with_product(product(2, dec("2.00"), true))
            .with_color(1, "Red");

        let snapshot = catalog.snapshot(&[2, 5], &[1], &[]).await.unwrap();

        assert!(snapshot.product(1).is_none());
        assert!(snapshot.product(2).is_some());
        assert_eq!(snapshot.color(1), Some("Red"));
    }
}
