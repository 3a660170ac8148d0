use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::models::booking::{Booking, BookingStatus};
use crate::db::store::Store;

/// Result type for notification operations
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur while delivering a notice
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Webhook delivery failed: {0}")]
    Webhook(#[from] reqwest::Error),
}

/// Common notification templates
pub mod templates {
    pub const BOOKING_APPROVED: &str = "booking_approved";
    pub const BOOKING_REJECTED: &str = "booking_rejected";
}

/// Decisions waiting for their notice. Beyond this, new ones are dropped.
const QUEUE_CAPACITY: usize = 256;

/// One message for one recipient.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub to: String,
    pub template: &'static str,
    pub params: Value,
}

impl Notice {
    pub fn booking_approved(to: &str, name: &str, date: &str, time: &str, doctor: Option<&str>, remarks: &str) -> Self {
        Self {
            to: to.to_string(),
            template: templates::BOOKING_APPROVED,
            params: json!({
                "name": name,
                "date": date,
                "time": time,
                "doctor": doctor,
                "remarks": remarks,
            }),
        }
    }

    pub fn booking_rejected(to: &str, name: &str, date: &str, time: &str, remarks: &str) -> Self {
        Self {
            to: to.to_string(),
            template: templates::BOOKING_REJECTED,
            params: json!({
                "name": name,
                "date": date,
                "time": time,
                "remarks": remarks,
            }),
        }
    }
}

/// Where notices end up.
#[derive(Clone)]
enum Delivery {
    Log,
    Webhook { client: reqwest::Client, url: String },
}

impl Delivery {
    fn from_config(config: &Config) -> Self {
        let Some(url) = config.notify_webhook_url.clone() else {
            return Delivery::Log;
        };
        match reqwest::Client::builder().timeout(config.notify_timeout).build() {
            Ok(client) => Delivery::Webhook { client, url },
            Err(err) => {
                error!(error = %err, "webhook client unavailable; notices go to the log");
                Delivery::Log
            }
        }
    }

    async fn deliver(&self, notice: &Notice) -> NotificationResult<()> {
        match self {
            Delivery::Log => {
                info!(to = %notice.to, template = notice.template, params = %notice.params, "📨 notification sent");
                Ok(())
            }
            Delivery::Webhook { client, url } => {
                client.post(url).json(notice).send().await?.error_for_status()?;
                info!(to = %notice.to, template = notice.template, "📨 notification delivered to webhook");
                Ok(())
            }
        }
    }
}

/// Handle for announcing booking decisions. Never blocks and never fails the caller.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Booking>,
}

impl Notifier {
    /// Spawn the worker that resolves recipients in `store` and delivers.
    pub fn start(config: &Config, store: Store) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_worker(rx, store, Delivery::from_config(config)));
        Self { tx }
    }

    /// Queue the notice for a decided booking, as it stood when decided.
    pub fn decision_made(&self, booking: Booking) {
        match self.tx.try_send(booking) {
            Ok(()) => {}
            Err(TrySendError::Full(booking)) => {
                warn!(booking_id = %booking.id, "notification queue full; notice dropped");
            }
            Err(TrySendError::Closed(booking)) => {
                warn!(booking_id = %booking.id, "notification worker stopped; notice dropped");
            }
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<Booking>, store: Store, delivery: Delivery) {
    while let Some(booking) = rx.recv().await {
        let Some(notice) = compose(&store, &booking).await else {
            continue;
        };
        // Each delivery gets its own task so one slow endpoint cannot stall the queue.
        let delivery = delivery.clone();
        tokio::spawn(async move {
            if let Err(err) = delivery.deliver(&notice).await {
                error!(to = %notice.to, template = notice.template, error = %err, "notification failed");
            }
        });
    }
}

/// Builds the notice for the requester of `booking`; `None` when there is
/// nobody to tell or nothing to say.
async fn compose(store: &Store, booking: &Booking) -> Option<Notice> {
    let requester = match store.find_user(booking.requester_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(booking_id = %booking.id, "requester missing from directory; no notification sent");
            return None;
        }
        Err(err) => {
            warn!(booking_id = %booking.id, error = %err, "requester lookup failed; no notification sent");
            return None;
        }
    };

    match booking.status {
        BookingStatus::Approved => {
            let doctor = match store.find_doctor(booking.doctor_id).await {
                Ok(doctor) => doctor.map(|d| d.name),
                Err(err) => {
                    warn!(booking_id = %booking.id, error = %err, "doctor lookup failed for notification");
                    None
                }
            };
            Some(Notice::booking_approved(
                &requester.email,
                &requester.name,
                &booking.requested_date,
                &booking.requested_time,
                doctor.as_deref(),
                &booking.admin_remarks,
            ))
        }
        BookingStatus::Rejected => Some(Notice::booking_rejected(
            &requester.email,
            &requester.name,
            &booking.requested_date,
            &booking.requested_time,
            &booking.admin_remarks,
        )),
        BookingStatus::Pending => None,
    }
}
