// libs/notification-cell/src/services/dispatcher.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_models::appointment::Appointment;

use crate::models::{DispatchReceipt, NotificationEvent};
use crate::services::templates;
use crate::services::transport::{EmailTransport, QueueTransport, ResendTransport};

const DISPATCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Selects the template for an event and pushes it through the configured
/// transport. Best-effort by contract: a failed or slow delivery is logged and
/// reported in the receipt, never surfaced as an error to the caller.
pub struct NotificationDispatcher {
    transport: Arc<dyn EmailTransport>,
}

impl NotificationDispatcher {
    pub fn from_config(config: &AppConfig) -> Self {
        let transport: Arc<dyn EmailTransport> = if config.is_email_configured() {
            Arc::new(ResendTransport::new(config))
        } else {
            Arc::new(QueueTransport::new())
        };
        Self { transport }
    }

    pub fn with_transport(transport: Arc<dyn EmailTransport>) -> Self {
        Self { transport }
    }

    pub async fn dispatch(
        &self,
        appointment: &Appointment,
        event: NotificationEvent,
    ) -> DispatchReceipt {
        let message = templates::render(appointment, event);

        match timeout(DISPATCH_TIMEOUT, self.transport.send(&message)).await {
            Ok(Ok(())) => {
                info!(
                    "Dispatched {} notification for appointment {}",
                    event, appointment.id
                );
                DispatchReceipt { delivered: true }
            }
            Ok(Err(e)) => {
                warn!(
                    "Notification {} for appointment {} not delivered: {}",
                    event, appointment.id, e
                );
                DispatchReceipt { delivered: false }
            }
            Err(_) => {
                warn!(
                    "Notification {} for appointment {} timed out",
                    event, appointment.id
                );
                DispatchReceipt { delivered: false }
            }
        }
    }
}

/// Fire-and-forget wrapper: the spawned task owns its copies, so the HTTP
/// response is never gated on delivery.
pub fn dispatch_background(
    dispatcher: Arc<NotificationDispatcher>,
    appointment: Appointment,
    event: NotificationEvent,
) {
    tokio::spawn(async move {
        dispatcher.dispatch(&appointment, event).await;
    });
}
