//! Transactional email bodies.
//!
//! Plain HTML built with `format!`; user-supplied text is escaped.

use crate::{
    entities::{booking, chef_application, inquiry, order, user},
    services::EmailMessage,
};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(heading: &str, body: &str) -> String {
    format!(
        "<div style=\"font-family:sans-serif;max-width:560px\"><h2>{heading}</h2>{body}\
         <p style=\"color:#888\">NeedAChef</p></div>"
    )
}

#[must_use]
pub fn booking_paid(client: &user::Model, booking: &booking::Model) -> EmailMessage {
    let body = format!(
        "<p>Hi {},</p><p>We received your payment of {:.2} for booking #{} on {} at {}.</p>\
         <p>We are matching you with a chef and will email you again once one is assigned.</p>",
        escape(&client.name),
        booking.payment_amount.unwrap_or_default(),
        booking.id,
        booking.date.format("%Y-%m-%d"),
        escape(&booking.location),
    );
    EmailMessage {
        to: client.email.clone(),
        subject: format!("Booking #{} confirmed", booking.id),
        html: layout("Payment received", &body),
    }
}

#[must_use]
pub fn chef_assigned(client: &user::Model, chef: &user::Model, booking: &booking::Model) -> EmailMessage {
    let body = format!(
        "<p>Hi {},</p><p>Chef {} will be cooking for your event on {}.</p>",
        escape(&client.name),
        escape(&chef.name),
        booking.date.format("%Y-%m-%d"),
    );
    EmailMessage {
        to: client.email.clone(),
        subject: format!("Your chef for booking #{}", booking.id),
        html: layout("Your chef is confirmed", &body),
    }
}

#[must_use]
pub fn order_paid(order: &order::Model) -> EmailMessage {
    let rows: String = order
        .items
        .0
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
                escape(&item.name),
                item.quantity,
                item.unit_price
            )
        })
        .collect();
    let body = format!(
        "<p>Hi {},</p><p>Thanks for your order #{}.</p><table>{rows}</table><p>Total: {:.2}</p>",
        escape(&order.customer_name),
        order.id,
        order.total,
    );
    EmailMessage {
        to: order.customer_email.clone(),
        subject: format!("Order #{} received", order.id),
        html: layout("Order confirmed", &body),
    }
}

#[must_use]
pub fn application_received(application: &chef_application::Model) -> EmailMessage {
    EmailMessage {
        to: application.email.clone(),
        subject: "We received your chef application".to_string(),
        html: layout(
            "Application received",
            &format!(
                "<p>Hi {},</p><p>Our team will review your application and get back to you.</p>",
                escape(&application.full_name)
            ),
        ),
    }
}

#[must_use]
pub fn application_approved(application: &chef_application::Model) -> EmailMessage {
    EmailMessage {
        to: application.email.clone(),
        subject: "Welcome aboard, Chef".to_string(),
        html: layout(
            "Application approved",
            &format!(
                "<p>Hi {},</p><p>Your application was approved. You can now receive bookings.</p>",
                escape(&application.full_name)
            ),
        ),
    }
}

#[must_use]
pub fn inquiry_received(inquiry: &inquiry::Model) -> EmailMessage {
    EmailMessage {
        to: inquiry.email.clone(),
        subject: "Thanks for your partnership inquiry".to_string(),
        html: layout(
            "Inquiry received",
            &format!(
                "<p>Hi {},</p><p>Thanks for reaching out on behalf of {}. We will be in touch shortly.</p>",
                escape(&inquiry.contact_name),
                escape(&inquiry.company_name)
            ),
        ),
    }
}

/// Staff alert for a new chef application.
#[must_use]
pub fn new_application_alert(admin_email: &str, application: &chef_application::Model) -> EmailMessage {
    EmailMessage {
        to: admin_email.to_string(),
        subject: format!("New chef application: {}", application.full_name),
        html: layout(
            "New chef application",
            &format!(
                "<p>{} ({}) applied as {}.</p><p>Experience: {}</p>",
                escape(&application.full_name),
                escape(&application.email),
                escape(&application.level),
                escape(&application.experience)
            ),
        ),
    }
}

/// Staff alert for a new partnership inquiry.
#[must_use]
pub fn new_inquiry_alert(admin_email: &str, inquiry: &inquiry::Model) -> EmailMessage {
    EmailMessage {
        to: admin_email.to_string(),
        subject: format!("New partner inquiry from {}", inquiry.company_name),
        html: layout(
            "New partner inquiry",
            &format!(
                "<p>{} at {} ({}) wrote:</p><p>{}</p>",
                escape(&inquiry.contact_name),
                escape(&inquiry.company_name),
                escape(&inquiry.email),
                escape(&inquiry.message)
            ),
        ),
    }
}

/// Password reset link. The link is valid for one hour.
#[must_use]
pub fn password_reset(user: &user::Model, reset_url: &str) -> EmailMessage {
    EmailMessage {
        to: user.email.clone(),
        subject: "Reset your NeedAChef password".to_string(),
        html: layout(
            "Password reset",
            &format!(
                "<p>Hi {},</p><p>Use the link below within the next hour to choose a new password.</p>\
                 <p><a href=\"{url}\">{url}</a></p><p>If you did not ask for this, ignore this email.</p>",
                escape(&user.name),
                url = escape(reset_url)
            ),
        ),
    }
}
