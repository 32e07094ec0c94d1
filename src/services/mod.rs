//! Clients for the external services the backend talks to.
//!
//! Each concern sits behind a trait so core logic and tests can swap in
//! fakes (see `test_utils`).

pub mod email;
pub mod gateway;
pub mod llm;
pub mod storage;

pub use email::{EmailMessage, EmailSender, LogEmailSender, ResendClient};
pub use gateway::{
    ChargeInit, ChargeMetadata, ChargeOutcome, ChargeRequest, ChargeVerification,
    PaymentGateway, PaystackClient,
};
pub use llm::{GeminiClient, TextGenerator};
pub use storage::{BlobStore, LocalBlobStore, StoredBlob};
