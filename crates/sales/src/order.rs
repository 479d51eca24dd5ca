use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{CustomerId, DomainError, DomainResult, Entity, OrderId, StoreId};

use crate::{Cart, CartItem};

/// Online order status lifecycle.
///
/// `pending → paid → fulfilled`, and `pending | paid → cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown order status '{other}'"))),
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Paid, Fulfilled) | (Pending, Cancelled) | (Paid, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Cancelled)
    }
}

/// Aggregate root: OnlineOrder (created from a checked-out cart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineOrder {
    pub id: OrderId,
    pub store_id: StoreId,
    pub customer_id: CustomerId,
    pub items: Vec<CartItem>,
    pub total: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for OnlineOrder {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn store_id(&self) -> StoreId {
        self.store_id
    }
}

impl OnlineOrder {
    pub fn from_cart(cart: &Cart, now: DateTime<Utc>) -> DomainResult<Self> {
        if cart.is_empty() {
            return Err(DomainError::validation("cannot check out an empty cart"));
        }
        Ok(Self {
            id: OrderId::new(),
            store_id: cart.store_id,
            customer_id: cart.customer_id,
            items: cart.items.clone(),
            total: cart.total(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn transition_to(&mut self, next: OrderStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_state(format!(
                "order cannot move from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillpoint_core::ProductId;

    fn order() -> OnlineOrder {
        let mut cart = Cart::empty(StoreId::new(), CustomerId::new(), Utc::now());
        cart.put_item(
            CartItem {
                product_id: ProductId::new(),
                name: "Roti".into(),
                quantity: 2,
                unit_price: 8_000,
            },
            Utc::now(),
        );
        OnlineOrder::from_cart(&cart, Utc::now()).unwrap()
    }

    #[test]
    fn checkout_snapshots_cart_total() {
        let o = order();
        assert_eq!(o.total, 16_000);
        assert_eq!(o.status, OrderStatus::Pending);
    }

    #[test]
    fn empty_cart_cannot_be_checked_out() {
        let cart = Cart::empty(StoreId::new(), CustomerId::new(), Utc::now());
        assert!(matches!(
            OnlineOrder::from_cart(&cart, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn full_lifecycle_pending_to_paid_to_fulfilled() {
        let mut o = order();
        o.transition_to(OrderStatus::Paid, Utc::now()).unwrap();
        o.transition_to(OrderStatus::Fulfilled, Utc::now()).unwrap();
        assert!(o.status.is_terminal());
    }

    #[test]
    fn terminal_orders_reject_transitions() {
        let mut o = order();
        o.transition_to(OrderStatus::Cancelled, Utc::now()).unwrap();
        let err = o.transition_to(OrderStatus::Paid, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(o.status, OrderStatus::Cancelled);
    }

    #[test]
    fn pending_cannot_skip_to_fulfilled() {
        let mut o = order();
        assert!(o.transition_to(OrderStatus::Fulfilled, Utc::now()).is_err());
    }
}
