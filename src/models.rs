use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of an order. Stored as a small integer (1..=4).
///
/// ```text
/// Ordered -> Accepted -> Sent
///        \-> Rejected
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(num_value = 1)]
    Ordered,
    #[sea_orm(num_value = 2)]
    Accepted,
    #[sea_orm(num_value = 3)]
    Sent,
    #[sea_orm(num_value = 4)]
    Rejected,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Ordered => "ordered",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Sent => "sent",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Sent | OrderStatus::Rejected)
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Ordered, OrderStatus::Accepted)
                | (OrderStatus::Ordered, OrderStatus::Rejected)
                | (OrderStatus::Accepted, OrderStatus::Sent)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Postcode {
    pub id: i32,
    pub postcode: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Shop {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub postcode: Option<Postcode>,
    pub homepage: String,
    pub email: String,
    pub phone: String,
    pub cvr_number: Option<String>,
    pub active: bool,
    pub order_pickup: bool,
    pub order_delivery: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub email: String,
    pub mobile: String,
    pub postcode_id: i32,
    pub status: OrderStatus,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub count: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn ordered_can_be_accepted_or_rejected() {
        assert!(Ordered.can_transition_to(Accepted));
        assert!(Ordered.can_transition_to(Rejected));
        assert!(!Ordered.can_transition_to(Sent));
        assert!(!Ordered.can_transition_to(Ordered));
    }

    #[test]
    fn accepted_only_moves_to_sent() {
        assert!(Accepted.can_transition_to(Sent));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Ordered));
    }

    #[test]
    fn sent_and_rejected_are_terminal() {
        for terminal in [Sent, Rejected] {
            assert!(terminal.is_terminal());
            for next in [Ordered, Accepted, Sent, Rejected] {
                assert!(!terminal.can_transition_to(next));
            }
        }
        assert!(!Ordered.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Accepted).unwrap(), "\"accepted\"");
        assert_eq!(Rejected.to_string(), "rejected");
    }
}
