use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::models::{Order, OrderStatus, format_amount};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> anyhow::Result<()>;
}

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        tracing::info!(
            from = %self.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "email sent"
        );
        Ok(())
    }
}

/// Keeps sent messages in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<Email>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mailbox poisoned"))?
            .push(email);
        Ok(())
    }
}

/// Send and swallow the failure; notifications never fail the request.
pub async fn deliver(mailer: &dyn Mailer, email: Email) -> bool {
    let to = email.to.clone();
    let subject = email.subject.clone();
    match mailer.send(email).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, %to, %subject, "email delivery failed");
            false
        }
    }
}

pub fn order_placed(order: &Order) -> Email {
    let address = order.address.as_deref().unwrap_or("-");
    Email {
        to: order.email.clone(),
        subject: "Your order has been placed!".into(),
        body: format!(
            "Thank you for your order!\n\nOrder total: {}\nDelivery: {}\nPayment: {}\nDelivery address: {}\nTrack number: {}",
            format_amount(order.total_amount),
            order.delivery_option,
            order.payment_method,
            address,
            order.track_number
        ),
    }
}

pub fn order_status_changed(order: &Order, username: &str, status: OrderStatus) -> Email {
    let (subject, body) = match status {
        OrderStatus::Delivered => (
            format!("Your order {} has arrived!", order.track_number),
            format!(
                "Hello, {username}!\n\nYour order {} has been delivered and is waiting for you at the pickup point.\n\nThank you for your order!",
                order.track_number
            ),
        ),
        OrderStatus::Delivering => (
            format!("Your order {} will be delivered within 3 hours!", order.track_number),
            format!(
                "Hello, {username}!\n\nYour order {} is on its way and will be delivered within 3 hours.\n\nThank you for your order!",
                order.track_number
            ),
        ),
        other => (
            format!("Order {} status update", order.track_number),
            format!(
                "Hello, {username}!\n\nThe status of your order {} changed to: {}.\n\nThank you for your order!",
                order.track_number,
                other.label()
            ),
        ),
    };
    Email {
        to: order.email.clone(),
        subject,
        body,
    }
}

pub fn registration(username: &str, email: &str) -> Email {
    Email {
        to: email.to_string(),
        subject: "Welcome to the PC storefront".into(),
        body: format!(
            "Hello, {username}!\n\nYour account has been created. You can now assemble builds and place orders."
        ),
    }
}

pub fn password_reset(username: &str, email: &str, new_password: &str) -> Email {
    Email {
        to: email.to_string(),
        subject: "Password reset".into(),
        body: format!(
            "Hello, {username}!\n\nYour new password is: {new_password}\nPlease change it after signing in."
        ),
    }
}

pub fn topup_code(email: &str, amount: i64, code: &str) -> Email {
    Email {
        to: email.to_string(),
        subject: "Confirm balance top-up".into(),
        body: format!(
            "To confirm a balance top-up of {}, enter the following code: {code}",
            format_amount(amount)
        ),
    }
}
