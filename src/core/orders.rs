//! Order lifecycle - checkout, payment and fulfilment.
//!
//! Orders are written as Pending before the gateway is contacted. The
//! Pending to Paid move is a conditional update, and stock is only
//! decremented by the call that performed it.

use crate::{
    core::catalog,
    entities::{Order, OrderItem, OrderItems, OrderStatus, Role, order, user},
    errors::{Error, Result},
    services::{
        ChargeInit, ChargeMetadata, ChargeRequest, PaymentGateway, gateway::to_minor_units,
    },
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

/// Tolerance when comparing a cart price with the catalog price
const PRICE_EPSILON: f64 = 0.005;

/// One line of the client's cart
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product id
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCheckout {
    pub order: order::Model,
    pub payment: ChargeInit,
}

fn validate_item(item: &CartItem) -> Result<()> {
    if item.id <= 0 || item.name.trim().is_empty() {
        return Err(Error::invalid_input("Every cart item needs an id and a name"));
    }
    if !item.price.is_finite() || item.price <= 0.0 {
        return Err(Error::invalid_input(format!(
            "Invalid price for '{}'",
            item.name
        )));
    }
    if item.quantity <= 0 {
        return Err(Error::invalid_input(format!(
            "Invalid quantity for '{}'",
            item.name
        )));
    }
    Ok(())
}

/// Sum of unit price times quantity.
#[must_use]
pub fn order_total(items: &[OrderItem]) -> f64 {
    items
        .iter()
        .map(|item| item.unit_price * f64::from(item.quantity))
        .sum()
}

/// Creates a Pending order for the cart and starts its payment.
///
/// Each cart line must name an active product at its current price.
///
/// # Errors
/// `InvalidInput` for an empty cart, a malformed line, an unknown product or
/// a stale price. Gateway failures surface as `Upstream` and leave the
/// Pending order in place.
#[instrument(skip(db, gateway, customer, request), fields(user_id = customer.id, items = request.items.len()))]
pub async fn create_checkout(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    currency: &str,
    customer: &user::Model,
    request: CheckoutRequest,
) -> Result<OrderCheckout> {
    if request.items.is_empty() {
        return Err(Error::invalid_input("Cart is empty"));
    }

    let mut items = Vec::with_capacity(request.items.len());
    for cart_item in &request.items {
        validate_item(cart_item)?;
        let product = catalog::get_active_product_by_id(db, cart_item.id)
            .await?
            .ok_or_else(|| {
                Error::invalid_input(format!("Product '{}' is not available", cart_item.name))
            })?;
        if (product.price - cart_item.price).abs() > PRICE_EPSILON {
            return Err(Error::invalid_input(format!(
                "Price of '{}' has changed to {:.2}",
                product.name, product.price
            )));
        }
        items.push(OrderItem {
            product_id: product.id,
            name: product.name,
            quantity: cart_item.quantity,
            unit_price: product.price,
        });
    }
    let total = order_total(&items);

    let order = order::ActiveModel {
        user_id: Set(customer.id),
        customer_name: Set(customer.name.clone()),
        customer_email: Set(customer.email.clone()),
        items: Set(OrderItems(items)),
        total: Set(total),
        status: Set(OrderStatus::Pending),
        shipping_address: Set(request
            .shipping_address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())),
        payment_reference: Set(None),
        date: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(order_id = order.id, total, "Order created");

    let charge = ChargeRequest {
        email: customer.email.clone(),
        amount: to_minor_units(total),
        currency: currency.to_string(),
        metadata: ChargeMetadata {
            order_id: Some(order.id),
            user_id: Some(customer.id),
            ..Default::default()
        },
    };
    let payment = gateway
        .initialize(&charge)
        .await
        .inspect_err(|e| error!(order_id = order.id, "Payment initialization failed: {}", e))?;

    let mut active: order::ActiveModel = order.into();
    active.payment_reference = Set(Some(payment.reference.clone()));
    let order = active.update(db).await?;

    Ok(OrderCheckout { order, payment })
}

/// Moves an order from Pending to Paid and takes its items out of stock.
///
/// Returns the paid order when this call made the change, or None when the
/// order does not exist or was already past Pending.
pub async fn mark_order_paid(db: &DatabaseConnection, order_id: i64) -> Result<Option<order::Model>> {
    let txn = db.begin().await?;

    let result = Order::update_many()
        .col_expr(order::Column::Status, Expr::value(OrderStatus::Paid))
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::Status.eq(OrderStatus::Pending))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        txn.commit().await?;
        info!(order_id, "Order unknown or already paid, nothing to do");
        return Ok(None);
    }

    let order = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;
    for item in &order.items.0 {
        catalog::decrement_stock_atomic(&txn, item.product_id, item.quantity).await?;
    }

    txn.commit().await?;
    info!(order_id, "Order marked as paid");
    Ok(Some(order))
}

/// Orders placed by a user, newest first.
pub async fn list_orders_for_user(db: &DatabaseConnection, user_id: i64) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn list_all_orders(db: &DatabaseConnection) -> Result<Vec<order::Model>> {
    Order::find()
        .order_by_desc(order::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Fetches an order visible to the caller: their own, or any for admins.
pub async fn get_order_for(
    db: &DatabaseConnection,
    caller: &user::Model,
    order_id: i64,
) -> Result<order::Model> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;
    if order.user_id != caller.id && caller.role != Role::Admin {
        return Err(Error::forbidden("This order belongs to another user"));
    }
    Ok(order)
}

/// Sets an order's fulfilment status (admin).
///
/// Paid can only be reached through payment reconciliation so that stock is
/// taken exactly once.
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model> {
    if status == OrderStatus::Paid {
        return Err(Error::invalid_input(
            "Orders become Paid through payment confirmation only",
        ));
    }
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;

    let mut active: order::ActiveModel = order.into();
    active.status = Set(status);
    let updated = active.update(db).await?;
    info!(order_id, status = ?status, "Order status updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::Product;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    fn cart_line(product: &crate::entities::product::Model, quantity: i32) -> CartItem {
        CartItem {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_checkout_total_and_pending_order() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_user(&db, "Ada Client", Role::User).await?;
        let pan = create_test_product(&db, "Pan", 1000.0, 10).await?;
        let knife = create_test_product(&db, "Knife", 2500.0, 10).await?;
        let gateway = FakeGateway::default();

        let checkout = create_checkout(
            &db,
            &gateway,
            "NGN",
            &customer,
            CheckoutRequest {
                items: vec![cart_line(&pan, 2), cart_line(&knife, 1)],
                shipping_address: Some("12 Admiralty Way".to_string()),
            },
        )
        .await?;

        assert_eq!(checkout.order.total, 4500.0);
        assert_eq!(checkout.order.status, OrderStatus::Pending);
        assert_eq!(
            checkout.order.payment_reference.as_deref(),
            Some(checkout.payment.reference.as_str())
        );
        let charges = gateway.initialized();
        assert_eq!(charges[0].amount, 450_000);
        assert_eq!(charges[0].metadata.order_id, Some(checkout.order.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_rejects_bad_lines() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_user(&db, "Ada Client", Role::User).await?;
        let pan = create_test_product(&db, "Pan", 1000.0, 10).await?;
        let gateway = FakeGateway::default();

        let mut zero_quantity = cart_line(&pan, 0);
        let mut stale_price = cart_line(&pan, 1);
        stale_price.price = 900.0;
        let mut unknown = cart_line(&pan, 1);
        unknown.id = 9999;

        for item in [zero_quantity.clone(), stale_price, unknown] {
            let result = create_checkout(
                &db,
                &gateway,
                "NGN",
                &customer,
                CheckoutRequest {
                    items: vec![item],
                    shipping_address: None,
                },
            )
            .await;
            assert!(matches!(result, Err(Error::InvalidInput { .. })));
        }

        zero_quantity.quantity = 1;
        zero_quantity.name = "  ".to_string();
        assert!(validate_item(&zero_quantity).is_err());

        let empty = create_checkout(&db, &gateway, "NGN", &customer, CheckoutRequest::default()).await;
        assert!(matches!(empty, Err(Error::InvalidInput { .. })));

        assert_eq!(Order::find().count(&db).await?, 0);
        assert!(gateway.initialized().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_pending_order() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_user(&db, "Ada Client", Role::User).await?;
        let pan = create_test_product(&db, "Pan", 1000.0, 10).await?;

        let result = create_checkout(
            &db,
            &FakeGateway::failing(),
            "NGN",
            &customer,
            CheckoutRequest {
                items: vec![cart_line(&pan, 1)],
                shipping_address: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Upstream { .. })));

        let orders = list_orders_for_user(&db, customer.id).await?;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_order_paid_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_user(&db, "Ada Client", Role::User).await?;
        let pan = create_test_product(&db, "Pan", 1000.0, 1).await?;
        let order = create_test_order(&db, customer.id, &[(&pan, 3)]).await?;

        assert!(mark_order_paid(&db, order.id).await?.is_some());
        assert!(mark_order_paid(&db, order.id).await?.is_none());
        assert!(mark_order_paid(&db, 4242).await?.is_none());

        // No floor check: overselling drives stock negative
        let stored = Product::find_by_id(pan.id).one(&db).await?.unwrap();
        assert_eq!(stored.stock, -2);
        Ok(())
    }

    #[tokio::test]
    async fn test_order_visibility_and_admin_status() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_user(&db, "Ada Client", Role::User).await?;
        let stranger = create_test_user(&db, "Sam Stranger", Role::User).await?;
        let admin = create_test_user(&db, "Ann Admin", Role::Admin).await?;
        let pan = create_test_product(&db, "Pan", 1000.0, 5).await?;
        let order = create_test_order(&db, customer.id, &[(&pan, 1)]).await?;

        assert_eq!(get_order_for(&db, &customer, order.id).await?.id, order.id);
        assert_eq!(get_order_for(&db, &admin, order.id).await?.id, order.id);
        assert!(matches!(
            get_order_for(&db, &stranger, order.id).await,
            Err(Error::Forbidden { .. })
        ));

        assert!(matches!(
            update_order_status(&db, order.id, OrderStatus::Paid).await,
            Err(Error::InvalidInput { .. })
        ));
        let shipped = update_order_status(&db, order.id, OrderStatus::Shipped).await?;
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert_eq!(list_all_orders(&db).await?.len(), 1);
        Ok(())
    }
}
