//! Payment reconciliation - webhook (push) and verify (pull) paths.
//!
//! Both paths converge on [`mark_booking_paid`]: the first successful
//! reconciliation moves the booking to PAID with workflow status PENDING and
//! queues chef assignment. Later deliveries for the same booking are no-ops.

use crate::{
    core::{booking as bookings, identity, notifications, orders},
    entities::{Booking, BookingStatus, PaymentStatus, booking},
    errors::{Error, Result},
    services::{
        ChargeMetadata, ChargeOutcome, PaymentGateway,
        gateway::{from_minor_units, lenient_metadata},
    },
    tasks::{BackgroundTask, TaskQueue},
};
use hmac::{Hmac, Mac};
use sea_orm::{Set, prelude::*, sea_query::Expr};
use serde::Deserialize;
use sha2::Sha512;
use tracing::{info, instrument, warn};

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the hex HMAC-SHA512 of the raw webhook body
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

const CHARGE_SUCCESS: &str = "charge.success";

/// Hex HMAC-SHA512 of `body` keyed with `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).map_err(|e| Error::Config {
        message: format!("Invalid webhook secret: {e}"),
    })?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a webhook signature in constant time.
///
/// # Errors
/// `SignatureMismatch` if the header is missing, is not hex, or does not match.
pub fn verify_signature(secret: &str, body: &[u8], signature: Option<&str>) -> Result<()> {
    let provided = signature
        .and_then(|s| hex::decode(s.trim()).ok())
        .ok_or(Error::SignatureMismatch)?;
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).map_err(|e| Error::Config {
        message: format!("Invalid webhook secret: {e}"),
    })?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| Error::SignatureMismatch)
}

/// Gateway callback body
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub reference: String,
    /// Minor units
    #[serde(default)]
    pub amount: i64,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: ChargeMetadata,
}

/// What a reconciliation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    BookingPaid { booking_id: i64 },
    OrderPaid { order_id: i64 },
    /// Already reconciled earlier; nothing changed
    Duplicate,
    /// Not a success event, or no known booking/order; acknowledged and dropped
    Ignored,
}

/// Moves a booking to PAID unless it already is.
///
/// Returns `true` when this call made the change. The conditional update makes
/// concurrent or repeated deliveries converge without re-triggering assignment.
pub async fn mark_booking_paid<C>(
    db: &C,
    booking_id: i64,
    transaction_id: &str,
    amount_minor: Option<i64>,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let mut update = Booking::update_many()
        .col_expr(booking::Column::PaymentStatus, Expr::value(PaymentStatus::Paid))
        .col_expr(booking::Column::Status, Expr::value(BookingStatus::Pending))
        .col_expr(booking::Column::TransactionId, Expr::value(transaction_id))
        .col_expr(booking::Column::UpdatedAt, Expr::value(chrono::Utc::now()));
    if let Some(minor) = amount_minor.filter(|m| *m > 0) {
        update = update.col_expr(
            booking::Column::PaymentAmount,
            Expr::value(from_minor_units(minor)),
        );
    }

    let result = update
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::PaymentStatus.ne(PaymentStatus::Paid))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Queues chef assignment and the payment confirmation email for a newly paid booking.
async fn after_booking_paid(db: &DatabaseConnection, tasks: &TaskQueue, booking_id: i64) -> Result<()> {
    tasks.dispatch(BackgroundTask::AssignChef { booking_id });

    let booking = bookings::get_booking_by_id(db, booking_id)
        .await?
        .ok_or_else(|| Error::not_found("Booking", booking_id))?;
    match identity::find_user_by_id(db, booking.user_id).await? {
        Some(client) => tasks.dispatch(BackgroundTask::SendEmail(notifications::booking_paid(
            &client, &booking,
        ))),
        None => warn!(booking_id, "Paid booking has no client account, skipping email"),
    }
    Ok(())
}

async fn reconcile_booking(
    db: &DatabaseConnection,
    tasks: &TaskQueue,
    booking_id: i64,
    transaction_id: &str,
    amount_minor: Option<i64>,
) -> Result<Reconciliation> {
    if bookings::get_booking_by_id(db, booking_id).await?.is_none() {
        warn!(booking_id, "Payment for unknown booking");
        return Ok(Reconciliation::Ignored);
    }
    if !mark_booking_paid(db, booking_id, transaction_id, amount_minor).await? {
        info!(booking_id, "Booking already paid, ignoring duplicate");
        return Ok(Reconciliation::Duplicate);
    }

    info!(booking_id, transaction_id, "Booking marked as paid");
    after_booking_paid(db, tasks, booking_id).await?;
    Ok(Reconciliation::BookingPaid { booking_id })
}

async fn reconcile_order(
    db: &DatabaseConnection,
    tasks: &TaskQueue,
    order_id: i64,
) -> Result<Reconciliation> {
    match orders::mark_order_paid(db, order_id).await? {
        Some(order) => {
            tasks.dispatch(BackgroundTask::SendEmail(notifications::order_paid(&order)));
            Ok(Reconciliation::OrderPaid { order_id })
        }
        None => Ok(Reconciliation::Duplicate),
    }
}

/// Handles a gateway webhook delivery.
///
/// The signature is checked against the raw bytes before anything is parsed.
///
/// # Errors
/// `SignatureMismatch` for a bad signature (no state is touched), `Json` for a
/// body that is signed but not a valid event.
#[instrument(skip_all, fields(body_len = body.len()))]
pub async fn handle_webhook(
    db: &DatabaseConnection,
    tasks: &TaskQueue,
    secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<Reconciliation> {
    verify_signature(secret, body, signature)
        .inspect_err(|_| warn!("Rejected webhook with bad signature"))?;

    let event: WebhookEvent = serde_json::from_slice(body)?;
    if event.event != CHARGE_SUCCESS {
        info!(event = %event.event, "Ignoring webhook event");
        return Ok(Reconciliation::Ignored);
    }

    let data = event.data;
    if let Some(booking_id) = data.metadata.booking_id {
        return reconcile_booking(db, tasks, booking_id, &data.reference, Some(data.amount)).await;
    }
    if let Some(order_id) = data.metadata.order_id {
        return reconcile_order(db, tasks, order_id).await;
    }

    warn!(reference = %data.reference, "charge.success without bookingId or orderId");
    Ok(Reconciliation::Ignored)
}

/// Client-initiated check of a booking payment by reference.
///
/// Success is reconciled exactly like the webhook, including queueing chef
/// assignment, so both paths end in the same state. Any other outcome marks
/// the payment FAILED unless the booking is already paid.
#[instrument(skip(db, gateway, tasks))]
pub async fn verify_payment(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    tasks: &TaskQueue,
    reference: &str,
) -> Result<booking::Model> {
    let booking = bookings::find_booking_by_reference(db, reference)
        .await?
        .ok_or_else(|| Error::not_found("Booking", reference))?;

    let verification = gateway.verify(reference).await?;
    match verification.outcome {
        ChargeOutcome::Success => {
            reconcile_booking(
                db,
                tasks,
                booking.id,
                &verification.transaction_id,
                Some(verification.amount),
            )
            .await?;
        }
        ChargeOutcome::Failure if booking.payment_status != PaymentStatus::Paid => {
            let mut active: booking::ActiveModel = booking.clone().into();
            active.payment_status = Set(PaymentStatus::Failed);
            active.updated_at = Set(chrono::Utc::now());
            active.update(db).await?;
            info!(booking_id = booking.id, "Payment marked as failed");
        }
        ChargeOutcome::Failure => {
            warn!(booking_id = booking.id, "Gateway reports failure for an already paid booking");
        }
    }

    bookings::get_booking_by_id(db, booking.id)
        .await?
        .ok_or_else(|| Error::not_found("Booking", booking.id))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::{Order, OrderStatus, Product, Role};
    use crate::services::ChargeVerification;
    use crate::test_utils::*;

    const SECRET: &str = "sk_test_secret";

    fn booking_event(booking_id: i64, reference: &str, amount: i64) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "event": "charge.success",
            "data": {
                "reference": reference,
                "amount": amount,
                "metadata": {"bookingId": booking_id.to_string(), "userId": 1}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_signature_round_trip() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign_payload(SECRET, body).unwrap();
        assert_eq!(signature.len(), 128);
        assert!(verify_signature(SECRET, body, Some(&signature)).is_ok());
        assert!(matches!(
            verify_signature("other", body, Some(&signature)),
            Err(Error::SignatureMismatch)
        ));
        assert!(matches!(
            verify_signature(SECRET, body, None),
            Err(Error::SignatureMismatch)
        ));
        assert!(matches!(
            verify_signature(SECRET, body, Some("zz-not-hex")),
            Err(Error::SignatureMismatch)
        ));
    }

    #[tokio::test]
    async fn test_bad_signature_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;
        let booking = create_test_booking(&db, client.id, None).await?;
        let (tasks, mut receiver) = TaskQueue::new();

        let body = booking_event(booking.id, "ref_1", 1_500_000);
        let bad = sign_payload("wrong-secret", &body)?;
        let result = handle_webhook(&db, &tasks, SECRET, &body, Some(&bad)).await;
        assert!(matches!(result, Err(Error::SignatureMismatch)));

        let stored = Booking::find_by_id(booking.id).one(&db).await?.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert!(stored.transaction_id.is_none());
        assert!(receiver.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_webhook_marks_booking_paid_once() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;
        let booking = create_test_booking(&db, client.id, None).await?;
        let (tasks, mut receiver) = TaskQueue::new();

        let body = booking_event(booking.id, "ref_1", 1_500_000);
        let signature = sign_payload(SECRET, &body)?;

        let first = handle_webhook(&db, &tasks, SECRET, &body, Some(&signature)).await?;
        assert_eq!(first, Reconciliation::BookingPaid { booking_id: booking.id });

        let stored = Booking::find_by_id(booking.id).one(&db).await?.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(stored.status, BookingStatus::Pending);
        assert_eq!(stored.transaction_id.as_deref(), Some("ref_1"));
        assert_eq!(stored.payment_amount, Some(15000.0));

        assert_eq!(
            receiver.try_recv().unwrap(),
            BackgroundTask::AssignChef { booking_id: booking.id }
        );
        assert!(matches!(receiver.try_recv().unwrap(), BackgroundTask::SendEmail(m) if m.to == client.email));

        // Redelivery converges without queueing more work
        let second = handle_webhook(&db, &tasks, SECRET, &body, Some(&signature)).await?;
        assert_eq!(second, Reconciliation::Duplicate);
        let again = Booking::find_by_id(booking.id).one(&db).await?.unwrap();
        assert_eq!(again.payment_status, PaymentStatus::Paid);
        assert!(receiver.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_webhook_ignores_other_events_and_unknown_ids() -> Result<()> {
        let db = setup_test_db().await?;
        let (tasks, _receiver) = TaskQueue::new();

        let body = br#"{"event":"transfer.success","data":{}}"#;
        let signature = sign_payload(SECRET, body)?;
        assert_eq!(
            handle_webhook(&db, &tasks, SECRET, body, Some(&signature)).await?,
            Reconciliation::Ignored
        );

        let body = booking_event(777, "ref_x", 100);
        let signature = sign_payload(SECRET, &body)?;
        assert_eq!(
            handle_webhook(&db, &tasks, SECRET, &body, Some(&signature)).await?,
            Reconciliation::Ignored
        );

        let body = br#"{"event":"charge.success","data":{"reference":"r","amount":1,"metadata":""}}"#;
        let signature = sign_payload(SECRET, body)?;
        assert_eq!(
            handle_webhook(&db, &tasks, SECRET, body, Some(&signature)).await?,
            Reconciliation::Ignored
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_order_webhook_decrements_stock_exactly_once() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;
        let pan = create_test_product(&db, "Pan", 1000.0, 10).await?;
        let knife = create_test_product(&db, "Knife", 2500.0, 10).await?;
        let order = create_test_order(&db, client.id, &[(&pan, 2), (&knife, 1)]).await?;
        let (tasks, mut receiver) = TaskQueue::new();

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "charge.success",
            "data": {"reference": "ord_ref", "amount": 450_000, "metadata": {"orderId": order.id}}
        }))?;
        let signature = sign_payload(SECRET, &body)?;

        assert_eq!(
            handle_webhook(&db, &tasks, SECRET, &body, Some(&signature)).await?,
            Reconciliation::OrderPaid { order_id: order.id }
        );
        assert_eq!(
            handle_webhook(&db, &tasks, SECRET, &body, Some(&signature)).await?,
            Reconciliation::Duplicate
        );

        let stored = Order::find_by_id(order.id).one(&db).await?.unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(Product::find_by_id(pan.id).one(&db).await?.unwrap().stock, 8);
        assert_eq!(Product::find_by_id(knife.id).one(&db).await?.unwrap().stock, 9);

        assert!(matches!(receiver.try_recv().unwrap(), BackgroundTask::SendEmail(_)));
        assert!(receiver.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_success_matches_webhook_state() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;
        let booking = create_test_booking(&db, client.id, None).await?;
        let reference = booking.payment_reference.clone().unwrap();
        let gateway = FakeGateway::default();
        gateway.set_verification(ChargeVerification {
            outcome: ChargeOutcome::Success,
            transaction_id: "4099260516".to_string(),
            reference: reference.clone(),
            amount: 1_000_000,
            metadata: ChargeMetadata::default(),
        });
        let (tasks, mut receiver) = TaskQueue::new();

        let verified = verify_payment(&db, &gateway, &tasks, &reference).await?;
        assert_eq!(verified.payment_status, PaymentStatus::Paid);
        assert_eq!(verified.status, BookingStatus::Pending);
        assert_eq!(verified.transaction_id.as_deref(), Some("4099260516"));
        assert_eq!(
            receiver.try_recv().unwrap(),
            BackgroundTask::AssignChef { booking_id: booking.id }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_failure_marks_failed_but_never_unpays() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;
        let booking = create_test_booking(&db, client.id, None).await?;
        let reference = booking.payment_reference.clone().unwrap();
        let gateway = FakeGateway::default();
        gateway.set_verification(ChargeVerification {
            outcome: ChargeOutcome::Failure,
            transaction_id: "1".to_string(),
            reference: reference.clone(),
            amount: 0,
            metadata: ChargeMetadata::default(),
        });
        let (tasks, _receiver) = TaskQueue::new();

        let failed = verify_payment(&db, &gateway, &tasks, &reference).await?;
        assert_eq!(failed.payment_status, PaymentStatus::Failed);

        mark_booking_paid(&db, booking.id, "tx_9", None).await?;
        let still_paid = verify_payment(&db, &gateway, &tasks, &reference).await?;
        assert_eq!(still_paid.payment_status, PaymentStatus::Paid);
        assert_eq!(still_paid.transaction_id.as_deref(), Some("tx_9"));
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_unknown_reference() -> Result<()> {
        let db = setup_test_db().await?;
        let (tasks, _receiver) = TaskQueue::new();
        let result = verify_payment(&db, &FakeGateway::default(), &tasks, "nope").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
