//! Storefront carts and online orders.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};

use tillpoint_core::{CustomerId, DomainError, OrderId, ProductId};
use tillpoint_sales::{Cart, CartItem, OnlineOrder, OrderStatus};

use crate::context::RequestContext;
use crate::error::ServiceResult;
use crate::repository::{CartRepository, CustomerRepository, OrderRepository, ProductRepository};

#[derive(Debug, Clone, Deserialize)]
pub struct PutCartItem {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Clone)]
pub struct StorefrontService {
    customers: Arc<dyn CustomerRepository>,
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl StorefrontService {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        products: Arc<dyn ProductRepository>,
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            customers,
            products,
            carts,
            orders,
        }
    }

    async fn ensure_customer(&self, ctx: &RequestContext, id: CustomerId) -> ServiceResult<()> {
        match self.customers.get(ctx.store_id, id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found(format!("customer {id}")).into()),
        }
    }

    /// A customer without a saved cart gets an empty one.
    pub async fn cart(&self, ctx: &RequestContext, customer_id: CustomerId) -> ServiceResult<Cart> {
        self.ensure_customer(ctx, customer_id).await?;
        Ok(self
            .carts
            .get(ctx.store_id, customer_id)
            .await?
            .unwrap_or_else(|| Cart::empty(ctx.store_id, customer_id, Utc::now())))
    }

    #[instrument(skip(self, ctx, input), fields(store_id = %ctx.store_id, customer_id = %input.customer_id))]
    pub async fn put_item(&self, ctx: &RequestContext, input: PutCartItem) -> ServiceResult<Cart> {
        let mut cart = self.cart(ctx, input.customer_id).await?;
        let product = self
            .products
            .get(ctx.store_id, input.product_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {}", input.product_id)))?;
        let item = CartItem::for_product(&product, input.quantity)?;
        cart.put_item(item, Utc::now());
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    pub async fn remove_item(
        &self,
        ctx: &RequestContext,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> ServiceResult<Cart> {
        let mut cart = self.cart(ctx, customer_id).await?;
        if !cart.remove_item(product_id, Utc::now()) {
            return Err(DomainError::not_found(format!("product {product_id} is not in the cart")).into());
        }
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    pub async fn clear(&self, ctx: &RequestContext, customer_id: CustomerId) -> ServiceResult<()> {
        self.ensure_customer(ctx, customer_id).await?;
        self.carts.delete(ctx.store_id, customer_id).await?;
        Ok(())
    }

    /// Convert the cart into a pending order and empty it.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id, customer_id = %customer_id))]
    pub async fn checkout(&self, ctx: &RequestContext, customer_id: CustomerId) -> ServiceResult<OnlineOrder> {
        let cart = self.cart(ctx, customer_id).await?;
        let order = OnlineOrder::from_cart(&cart, Utc::now())?;
        self.orders.checkout(&order).await?;
        info!(order_id = %order.id, total = order.total, "order placed");
        Ok(order)
    }

    pub async fn list_orders(&self, ctx: &RequestContext) -> ServiceResult<Vec<OnlineOrder>> {
        Ok(self.orders.list(ctx.store_id).await?)
    }

    pub async fn get_order(&self, ctx: &RequestContext, id: OrderId) -> ServiceResult<OnlineOrder> {
        self.orders
            .get(ctx.store_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("order {id}")).into())
    }

    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id, order_id = %id, next = next.as_str()))]
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: OrderId,
        next: OrderStatus,
    ) -> ServiceResult<OnlineOrder> {
        let order = self
            .orders
            .update_status(ctx.store_id, id, next, Utc::now())
            .await?;
        info!("order status updated");
        Ok(order)
    }
}
