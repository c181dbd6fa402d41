// libs/payment-cell/src/services/reconciliation.rs
use serde::Deserialize;
use tracing::{info, warn};

use appointment_cell::services::booking::AppointmentService;
use shared_models::appointment::{Appointment, PaymentStatus};
use shared_utils::context::AppContext;
use shared_utils::ids::generate_id;

use crate::models::{CheckoutSession, InitializePaymentRequest, PaymentError, PaystackTransaction};
use crate::services::paystack::PaystackClient;

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    data: serde_json::Value,
}

/// Ties provider transactions back to appointments. All reconciliation funnels
/// into the idempotent payment application on the lifecycle controller, so a
/// webhook and an explicit verify for the same charge cannot double-apply.
pub struct PaymentService {
    paystack: PaystackClient,
    appointments: AppointmentService,
    frontend_url: String,
}

impl PaymentService {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            paystack: PaystackClient::new(&ctx.config),
            appointments: AppointmentService::new(ctx),
            frontend_url: ctx.config.frontend_url.clone(),
        }
    }

    pub fn with_parts(
        paystack: PaystackClient,
        appointments: AppointmentService,
        frontend_url: &str,
    ) -> Self {
        Self {
            paystack,
            appointments,
            frontend_url: frontend_url.to_string(),
        }
    }

    pub fn appointments(&self) -> &AppointmentService {
        &self.appointments
    }

    /// Start a checkout for an appointment and record the reference on it.
    pub async fn initialize_checkout(
        &self,
        request: InitializePaymentRequest,
    ) -> Result<(Appointment, CheckoutSession), PaymentError> {
        let appointment_id = request
            .appointment_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PaymentError::Validation(vec!["appointment_id".to_string()]))?;

        let appointment = self.appointments.get_appointment(appointment_id).await?;

        let amount = request
            .amount
            .or(appointment.amount)
            .filter(|a| *a > 0.0)
            .ok_or_else(|| PaymentError::Validation(vec!["amount".to_string()]))?;

        let reference = generate_id("PAY", 8);
        let session = if self.paystack.is_configured() {
            self.paystack
                .initialize(
                    &appointment.email,
                    // Paystack charges in kobo.
                    (amount * 100.0).round() as i64,
                    &reference,
                    &format!("{}/payment-success", self.frontend_url),
                    &appointment.id,
                )
                .await?
        } else {
            // No provider key: hand back a test-mode session so the booking
            // flow stays usable in development.
            warn!("Paystack not configured; issuing test-mode reference {}", reference);
            CheckoutSession {
                authorization_url: format!(
                    "{}/payment-success?reference={}",
                    self.frontend_url, reference
                ),
                access_code: "test_mode".to_string(),
                reference: reference.clone(),
            }
        };

        let appointment = self
            .appointments
            .update_payment_status(&appointment.id, PaymentStatus::Pending, Some(session.reference.clone()))
            .await?;

        info!(
            "Checkout {} opened for appointment {}",
            session.reference, appointment.id
        );
        Ok((appointment, session))
    }

    /// Verify a charge with the provider and reconcile the appointment.
    pub async fn verify_and_reconcile(
        &self,
        reference: &str,
    ) -> Result<(Appointment, bool), PaymentError> {
        if !self.paystack.is_configured() {
            // Test mode: no provider to ask, so a reference we handed out is
            // taken at its word and the payment applied directly.
            warn!("Paystack not configured; verifying {} in test mode", reference);
            let appointment = self.appointments.find_by_payment_reference(reference).await?;
            return Ok(self
                .appointments
                .apply_payment(&appointment.id, reference)
                .await?);
        }

        let transaction = self.paystack.verify(reference).await?;
        self.reconcile(&transaction).await
    }

    /// Provider push path. The signature is checked against the raw body
    /// before anything is parsed; events other than `charge.success` are
    /// acknowledged and ignored.
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: &str,
    ) -> Result<(), PaymentError> {
        self.paystack.verify_signature(raw_body, signature)?;

        let event: WebhookEvent = serde_json::from_slice(raw_body)
            .map_err(|e| PaymentError::Provider(format!("unparseable webhook body: {}", e)))?;

        if event.event != "charge.success" {
            info!("Ignoring webhook event {}", event.event);
            return Ok(());
        }

        let transaction: PaystackTransaction = serde_json::from_value(event.data)
            .map_err(|e| PaymentError::Provider(format!("unparseable charge data: {}", e)))?;

        match self.reconcile(&transaction).await {
            Ok((appointment, applied)) => {
                if applied {
                    info!(
                        "Webhook applied payment {} to appointment {}",
                        transaction.reference, appointment.id
                    );
                }
                Ok(())
            }
            // The provider retries on non-2xx; an appointment we cannot find
            // will not appear on retry either, so log and acknowledge.
            Err(PaymentError::Appointment(e)) => {
                warn!(
                    "Webhook for {} did not reconcile: {}",
                    transaction.reference, e
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn reconcile(
        &self,
        transaction: &PaystackTransaction,
    ) -> Result<(Appointment, bool), PaymentError> {
        let appointment_id = transaction
            .metadata
            .appointment_id
            .as_deref()
            .ok_or_else(|| {
                PaymentError::Provider(format!(
                    "transaction {} carries no appointment id",
                    transaction.reference
                ))
            })?;

        if !transaction.is_successful() {
            warn!(
                "Transaction {} for appointment {} is {}",
                transaction.reference, appointment_id, transaction.status
            );
            self.appointments
                .update_payment_status(
                    appointment_id,
                    PaymentStatus::Failed,
                    Some(transaction.reference.clone()),
                )
                .await?;
            return Err(PaymentError::NotSuccessful(transaction.reference.clone()));
        }

        let (appointment, applied) = self
            .appointments
            .apply_payment(appointment_id, &transaction.reference)
            .await?;
        Ok((appointment, applied))
    }
}
