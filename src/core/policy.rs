//! Who may move a booking to which status.
//!
//! Allowed workflow moves: PENDING to CONFIRMED or CANCELLED, CONFIRMED to
//! COMPLETED or CANCELLED. Setting the current status again is a no-op and
//! always allowed. COMPLETED and CANCELLED are terminal.

use crate::{
    entities::{BookingStatus, Role, booking},
    errors::{Error, Result},
};

/// Statuses a chef may set on their own bookings
const CHEF_TARGETS: [BookingStatus; 3] = [
    BookingStatus::Confirmed,
    BookingStatus::Completed,
    BookingStatus::Cancelled,
];

/// Whether the workflow allows moving from `from` to `to`, ignoring who asks.
#[must_use]
pub fn is_allowed_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::{Cancelled, Completed, Confirmed, Pending};

    from == to
        || matches!(
            (from, to),
            (Pending, Confirmed | Cancelled) | (Confirmed, Completed | Cancelled)
        )
}

/// Whether this actor may act on this booking at all.
fn actor_may_act(actor_role: Role, actor_id: i64, booking: &booking::Model, target: BookingStatus) -> bool {
    match actor_role {
        Role::Admin => true,
        Role::Chef => booking.chef_id == Some(actor_id) && CHEF_TARGETS.contains(&target),
        Role::User | Role::Partner => false,
    }
}

/// Single authorization check consulted before every booking status change.
#[must_use]
pub fn can_transition(
    actor_role: Role,
    actor_id: i64,
    booking: &booking::Model,
    target: BookingStatus,
) -> bool {
    actor_may_act(actor_role, actor_id, booking, target)
        && is_allowed_transition(booking.status, target)
}

/// Like [`can_transition`], but says why a change is refused.
///
/// # Errors
/// `Forbidden` when the actor may not touch the booking or set that status,
/// `InvalidInput` when the workflow does not allow the move.
pub fn authorize_transition(
    actor_role: Role,
    actor_id: i64,
    booking: &booking::Model,
    target: BookingStatus,
) -> Result<()> {
    if !actor_may_act(actor_role, actor_id, booking, target) {
        return Err(Error::forbidden(format!(
            "Not allowed to set booking {} to {target:?}",
            booking.id
        )));
    }
    if !is_allowed_transition(booking.status, target) {
        return Err(Error::invalid_input(format!(
            "Booking {} cannot move from {:?} to {target:?}",
            booking.id, booking.status
        )));
    }
    Ok(())
}

/// A booking can only be CONFIRMED with a chef attached.
///
/// # Errors
/// `InvalidInput` when `target` is CONFIRMED and `chef_id` is `None`.
pub fn ensure_chef_for(booking_id: i64, target: BookingStatus, chef_id: Option<i64>) -> Result<()> {
    if target == BookingStatus::Confirmed && chef_id.is_none() {
        return Err(Error::invalid_input(format!(
            "Booking {booking_id} needs a chef before it can be confirmed"
        )));
    }
    Ok(())
}
