//! Fire-and-forget background work.
//!
//! Request handlers never wait on chef matching or email delivery. Instead
//! core functions hand a [`BackgroundTask`] to the [`TaskQueue`], and a single
//! [`TaskWorker`] drains it. Task failures are logged and dropped.

use crate::{
    core::{assignment, notifications},
    services::{EmailMessage, EmailSender, TextGenerator},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Work that runs after the triggering request has been answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundTask {
    AssignChef { booking_id: i64 },
    SendEmail(EmailMessage),
}

/// Sending half of the background queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<BackgroundTask>,
}

impl TaskQueue {
    /// Creates a queue and the receiver a [`TaskWorker`] should drain.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BackgroundTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queues a task. Never fails the caller; a closed queue is only logged.
    pub fn dispatch(&self, task: BackgroundTask) {
        if let Err(e) = self.sender.send(task) {
            warn!(task = ?e.0, "Background queue closed, dropping task");
        }
    }
}

/// Runs queued tasks one at a time
pub struct TaskWorker {
    db: DatabaseConnection,
    generator: Arc<dyn TextGenerator>,
    mailer: Arc<dyn EmailSender>,
    sender_email: String,
    receiver: mpsc::UnboundedReceiver<BackgroundTask>,
}

impl TaskWorker {
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        generator: Arc<dyn TextGenerator>,
        mailer: Arc<dyn EmailSender>,
        sender_email: String,
        receiver: mpsc::UnboundedReceiver<BackgroundTask>,
    ) -> Self {
        Self {
            db,
            generator,
            mailer,
            sender_email,
            receiver,
        }
    }

    /// Drains the queue until every [`TaskQueue`] handle is dropped.
    pub async fn run(mut self) {
        info!("Background worker started");
        while let Some(task) = self.receiver.recv().await {
            self.handle(task).await;
        }
        info!("Background worker stopped");
    }

    /// Runs a single task, logging instead of returning failures.
    pub async fn handle(&self, task: BackgroundTask) {
        match task {
            BackgroundTask::AssignChef { booking_id } => {
                match assignment::assign_chef(&self.db, self.generator.as_ref(), booking_id).await
                {
                    Ok(assigned) => {
                        info!(booking_id, chef_id = ?assigned.booking.chef_id, "Chef assigned");
                        let message =
                            notifications::chef_assigned(&assigned.client, &assigned.chef, &assigned.booking);
                        self.send_email(&message).await;
                    }
                    Err(e) => error!(booking_id, "Chef assignment failed: {}", e),
                }
            }
            BackgroundTask::SendEmail(message) => self.send_email(&message).await,
        }
    }

    async fn send_email(&self, message: &EmailMessage) {
        match self.mailer.send(&self.sender_email, message).await {
            Ok(id) => info!(to = %message.to, delivery_id = %id, "Email sent"),
            Err(e) => error!(to = %message.to, subject = %message.subject, "Email delivery failed: {}", e),
        }
    }
}
