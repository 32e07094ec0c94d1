//! Booking price computation.
//!
//! A service is priced either as a fixed tier (the tier price, whatever the
//! guest count) or per head (unit price times guests, guests floored at 1).

use crate::{
    entities::{ServiceKind, service},
    errors::{Error, Result},
};

/// How a service is priced for one booking
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pricing {
    Tiered { price: f64 },
    /// `min_guests` is informational; it does not raise the billed head count.
    PerHead { unit_price: f64, min_guests: i32 },
}

impl Pricing {
    /// Picks the pricing for a service. Tiered services default to their
    /// first tier when no `tier_index` is given.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the tier index is out of range or the
    /// service has no usable price.
    pub fn from_service(service: &service::Model, tier_index: Option<usize>) -> Result<Self> {
        match service.kind {
            ServiceKind::Tiered => {
                let index = tier_index.unwrap_or(0);
                let tier = service.tiers.0.get(index).ok_or_else(|| {
                    Error::invalid_input(format!(
                        "Service '{}' has no tier {index}",
                        service.name
                    ))
                })?;
                Ok(Self::Tiered { price: tier.price })
            }
            ServiceKind::PerHead => {
                let unit_price = service.unit_price.ok_or_else(|| {
                    Error::invalid_input(format!("Service '{}' has no per-head price", service.name))
                })?;
                Ok(Self::PerHead {
                    unit_price,
                    min_guests: service.min_guests.unwrap_or(1),
                })
            }
        }
    }
}

/// Amount owed in major currency units.
#[must_use]
pub fn compute_amount(pricing: &Pricing, guests: i32) -> f64 {
    match *pricing {
        Pricing::Tiered { price } => price,
        Pricing::PerHead { unit_price, .. } => unit_price * f64::from(guests.max(1)),
    }
}
