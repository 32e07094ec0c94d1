//! Shared test utilities.
//!
//! In-memory database setup, fixtures with sensible defaults, and fake
//! implementations of the external service traits.

use crate::{
    core::identity,
    entities::{
        self, BookingStatus, OrderItem, OrderItems, OrderStatus, PaymentStatus, Role, ServiceKind,
        ServiceTier, ServiceTiers, StringList,
    },
    errors::{Error, Result},
    services::{
        ChargeInit, ChargeOutcome, ChargeRequest, ChargeVerification, EmailMessage, EmailSender,
        PaymentGateway, TextGenerator,
    },
};
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a user with the given role. The email is derived from the name and
/// made unique; the password is always `password123`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    role: Role,
) -> Result<entities::user::Model> {
    let email = format!(
        "{}@example.com",
        unique(&name.to_lowercase().replace(' ', "."))
    );
    entities::user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email),
        password_hash: Set(identity::hash_password("password123")?),
        role: Set(role),
        referral_code: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a partner with a referral code.
pub async fn create_test_partner(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::user::Model> {
    let user = create_test_user(db, name, Role::User).await?;
    identity::set_user_role(db, user.id, Role::Partner).await
}

/// Creates a chef account together with its profile.
pub async fn create_test_chef(
    db: &DatabaseConnection,
    name: &str,
    specialties: &[&str],
    years_of_experience: i32,
) -> Result<entities::user::Model> {
    let chef = create_test_user(db, name, Role::Chef).await?;
    entities::chef_profile::ActiveModel {
        user_id: Set(chef.id),
        specialties: Set(StringList(
            specialties.iter().map(ToString::to_string).collect(),
        )),
        years_of_experience: Set(years_of_experience),
        portfolio_images: Set(StringList::default()),
        bio: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(chef)
}

/// Creates a per-head service with the given unit price.
pub async fn create_per_head_service(
    db: &DatabaseConnection,
    unit_price: f64,
) -> Result<entities::service::Model> {
    entities::service::ActiveModel {
        name: Set(unique("Per Head Service")),
        description: Set(None),
        kind: Set(ServiceKind::PerHead),
        tiers: Set(ServiceTiers::default()),
        unit_price: Set(Some(unit_price)),
        min_guests: Set(Some(2)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a tiered service with one tier per price.
pub async fn create_tiered_service(
    db: &DatabaseConnection,
    prices: &[f64],
) -> Result<entities::service::Model> {
    let tiers = prices
        .iter()
        .enumerate()
        .map(|(i, price)| ServiceTier {
            name: format!("Tier {}", i + 1),
            price: *price,
            coverage: String::new(),
        })
        .collect();
    entities::service::ActiveModel {
        name: Set(unique("Tiered Service")),
        description: Set(None),
        kind: Set(ServiceKind::Tiered),
        tiers: Set(ServiceTiers(tiers)),
        unit_price: Set(None),
        min_guests: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an active product.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    stock: i32,
) -> Result<entities::product::Model> {
    let now = chrono::Utc::now();
    entities::product::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        category: Set(None),
        price: Set(price),
        stock: Set(stock),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a Pending order for the given (product, quantity) lines.
pub async fn create_test_order(
    db: &DatabaseConnection,
    user_id: i64,
    lines: &[(&entities::product::Model, i32)],
) -> Result<entities::order::Model> {
    let items: Vec<OrderItem> = lines
        .iter()
        .map(|(product, quantity)| OrderItem {
            product_id: product.id,
            name: product.name.clone(),
            quantity: *quantity,
            unit_price: product.price,
        })
        .collect();
    let total = crate::core::orders::order_total(&items);
    entities::order::ActiveModel {
        user_id: Set(user_id),
        customer_name: Set("Test Customer".to_string()),
        customer_email: Set("customer@example.com".to_string()),
        items: Set(OrderItems(items)),
        total: Set(total),
        status: Set(OrderStatus::Pending),
        shipping_address: Set(None),
        payment_reference: Set(Some(unique("ord_ref"))),
        date: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Builds an unsaved booking model for pure tests.
///
/// # Defaults
/// * `user_id`: 100
/// * `payment_amount`: 10000.0, unpaid
/// * `location`: "Lekki, Lagos", 4 guests
#[must_use]
pub fn booking_model(id: i64, status: BookingStatus, chef_id: Option<i64>) -> entities::booking::Model {
    let now = chrono::Utc::now();
    entities::booking::Model {
        id,
        user_id: 100,
        chef_id,
        service_id: None,
        partner_id: None,
        referral_code: None,
        utm_source: None,
        utm_medium: None,
        utm_campaign: None,
        date: now,
        time: Some("18:00".to_string()),
        location: "Lekki, Lagos".to_string(),
        guests: 4,
        event_type: None,
        cuisine_preferences: StringList(vec!["Nigerian".to_string()]),
        dietary_restrictions: None,
        kitchen_equipment: StringList::default(),
        details: None,
        payment_amount: Some(10000.0),
        payment_status: PaymentStatus::Pending,
        payment_reference: None,
        transaction_id: None,
        status,
        created_at: now,
        updated_at: now,
    }
}

/// Inserts a PENDING, unpaid booking of 10000.0 with a unique payment reference.
pub async fn create_test_booking(
    db: &DatabaseConnection,
    user_id: i64,
    chef_id: Option<i64>,
) -> Result<entities::booking::Model> {
    let model = booking_model(0, BookingStatus::Pending, chef_id);
    entities::booking::ActiveModel {
        user_id: Set(user_id),
        chef_id: Set(model.chef_id),
        service_id: Set(None),
        partner_id: Set(None),
        referral_code: Set(None),
        utm_source: Set(None),
        utm_medium: Set(None),
        utm_campaign: Set(None),
        date: Set(model.date),
        time: Set(model.time),
        location: Set(model.location),
        guests: Set(model.guests),
        event_type: Set(Some("Birthday".to_string())),
        cuisine_preferences: Set(model.cuisine_preferences),
        dietary_restrictions: Set(None),
        kitchen_equipment: Set(model.kitchen_equipment),
        details: Set(None),
        payment_amount: Set(model.payment_amount),
        payment_status: Set(PaymentStatus::Pending),
        payment_reference: Set(Some(unique("ref"))),
        transaction_id: Set(None),
        status: Set(BookingStatus::Pending),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Like [`create_test_booking`], but with the payment already settled.
pub async fn create_paid_test_booking(
    db: &DatabaseConnection,
    user_id: i64,
    chef_id: Option<i64>,
) -> Result<entities::booking::Model> {
    let booking = create_test_booking(db, user_id, chef_id).await?;
    let mut active: entities::booking::ActiveModel = booking.into();
    active.payment_status = Set(PaymentStatus::Paid);
    active.transaction_id = Set(Some(unique("tx")));
    active.update(db).await.map_err(Into::into)
}

/// Payment gateway double that records initialized charges.
#[derive(Default)]
pub struct FakeGateway {
    fail: bool,
    initialized: Mutex<Vec<ChargeRequest>>,
    verification: Mutex<Option<ChargeVerification>>,
}

impl FakeGateway {
    /// A gateway whose every call fails as an upstream error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn initialized(&self) -> Vec<ChargeRequest> {
        self.initialized.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Sets the answer for subsequent `verify` calls.
    pub fn set_verification(&self, verification: ChargeVerification) {
        if let Ok(mut slot) = self.verification.lock() {
            *slot = Some(verification);
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize(&self, request: &ChargeRequest) -> Result<ChargeInit> {
        if self.fail {
            return Err(Error::upstream("payment gateway", "simulated outage"));
        }
        let reference = unique("ref");
        if let Ok(mut charges) = self.initialized.lock() {
            charges.push(request.clone());
        }
        Ok(ChargeInit {
            authorization_url: format!("https://checkout.example/{reference}"),
            access_code: unique("access"),
            reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<ChargeVerification> {
        if self.fail {
            return Err(Error::upstream("payment gateway", "simulated outage"));
        }
        let scripted = self.verification.lock().ok().and_then(|v| v.clone());
        Ok(scripted.unwrap_or_else(|| ChargeVerification {
            outcome: ChargeOutcome::Success,
            transaction_id: format!("tx_{reference}"),
            reference: reference.to_string(),
            amount: 0,
            metadata: crate::services::ChargeMetadata::default(),
        }))
    }
}

/// Text generator double replying with canned answers in order.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    #[must_use]
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .ok_or_else(|| Error::upstream("text generation", "no scripted reply left"))
    }
}

/// Email sender double that keeps every message.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingEmailSender {
    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, _from: &str, message: &EmailMessage) -> Result<String> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| Error::upstream("email", "recorder poisoned"))?;
        sent.push(message.clone());
        Ok(format!("test-{}", sent.len()))
    }
}
