// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use notification_cell::models::NotificationEvent;
use notification_cell::services::dispatcher::{dispatch_background, NotificationDispatcher};
use shared_database::supabase::SupabaseClient;
use shared_models::appointment::{
    normalize_email, Appointment, AppointmentStatus, PaymentStatus,
};
use shared_utils::context::AppContext;
use shared_utils::ids::generate_id;

use crate::models::{AppointmentError, CreateAppointmentRequest};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::{
    AppointmentChanges, AppointmentFilter, AppointmentStore, GuardedUpdate, MemoryStore,
    SupabaseStore,
};

/// Bounded retries when a conditional update loses a race; each retry
/// re-validates against the fresh status.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// The single authority for creating and transitioning appointments.
///
/// Owns id assignment, input validation, the status state machine, and the
/// dispatch of status notifications. Falls back to the shared in-memory cache
/// whenever the durable store is unreachable, so booking keeps working through
/// a database outage.
pub struct AppointmentService {
    store: Arc<dyn AppointmentStore>,
    fallback: MemoryStore,
    dispatcher: Arc<NotificationDispatcher>,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentService {
    pub fn new(ctx: &AppContext) -> Self {
        let cache = Arc::clone(&ctx.appointment_cache);
        let store: Arc<dyn AppointmentStore> = if ctx.config.is_database_configured() {
            Arc::new(SupabaseStore::new(Arc::new(SupabaseClient::new(&ctx.config))))
        } else {
            Arc::new(MemoryStore::new(Arc::clone(&cache)))
        };

        Self {
            store,
            fallback: MemoryStore::new(cache),
            dispatcher: Arc::new(NotificationDispatcher::from_config(&ctx.config)),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Explicit wiring, used by tests and by payment reconciliation.
    pub fn with_parts(
        store: Arc<dyn AppointmentStore>,
        fallback: MemoryStore,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            fallback,
            dispatcher,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Validate, assign an id, persist, and announce a new booking.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(AppointmentError::Validation(missing));
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: generate_id("APT", 8),
            patient_name: request.patient_name.unwrap_or_default().trim().to_string(),
            email: normalize_email(&request.email.unwrap_or_default()),
            phone: request.phone.unwrap_or_default().trim().to_string(),
            service: request.service.unwrap_or_default().trim().to_string(),
            date: request.date.unwrap_or_default().trim().to_string(),
            time: request.time.unwrap_or_default().trim().to_string(),
            message: request.message.unwrap_or_default(),
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            amount: request.amount,
            created_at: now,
            updated_at: now,
        };

        let saved = match self.store.create(appointment.clone()).await {
            Ok(saved) => saved,
            Err(AppointmentError::StoreUnavailable(msg)) => {
                warn!(
                    "Store unreachable ({}), keeping appointment {} in the fallback cache",
                    msg, appointment.id
                );
                self.fallback.create(appointment).await?
            }
            Err(e) => return Err(e),
        };

        info!("Appointment {} created for {}", saved.id, saved.email);
        dispatch_background(
            Arc::clone(&self.dispatcher),
            saved.clone(),
            NotificationEvent::Booked,
        );

        Ok(saved)
    }

    pub async fn get_appointment(&self, id: &str) -> Result<Appointment, AppointmentError> {
        match self.store.get_by_id(id).await {
            Ok(appointment) => Ok(appointment),
            Err(AppointmentError::NotFound) => self.fallback.get_by_id(id).await,
            Err(AppointmentError::StoreUnavailable(msg)) => self
                .fallback
                .get_by_id(id)
                .await
                .map_err(|_| AppointmentError::StoreUnavailable(msg)),
            Err(e) => Err(e),
        }
    }

    /// Matching appointments, most recent first. Served from the fallback
    /// cache when the durable store is unreachable.
    pub async fn list_appointments(
        &self,
        mut filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if let Some(email) = &filter.email {
            filter.email = Some(normalize_email(email));
        }

        match self.store.list(&filter).await {
            Ok(rows) => Ok(rows),
            Err(AppointmentError::StoreUnavailable(msg)) => {
                warn!("Store unreachable ({}), listing from fallback cache", msg);
                self.fallback.list(&filter).await
            }
            Err(e) => Err(e),
        }
    }

    /// Look an appointment up by the checkout reference recorded on it.
    pub async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Appointment, AppointmentError> {
        let filter = AppointmentFilter {
            payment_reference: Some(reference.to_string()),
            ..Default::default()
        };
        let rows = match self.store.list(&filter).await {
            Ok(rows) => rows,
            Err(AppointmentError::StoreUnavailable(msg)) => {
                warn!("Store unreachable ({}), searching fallback cache", msg);
                self.fallback.list(&filter).await?
            }
            Err(e) => return Err(e),
        };
        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    /// Move an appointment through the lifecycle and announce the new status.
    ///
    /// The write is a conditional update keyed on the previously observed
    /// status; losing the race re-validates against the fresh row instead of
    /// blindly overwriting it.
    pub async fn set_status(
        &self,
        id: &str,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut current = self.get_appointment(id).await?;

        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            self.lifecycle
                .validate_status_transition(current.status, new_status)?;

            let changes = AppointmentChanges {
                status: Some(new_status),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };

            match self.guarded_update(id, current.status, &changes).await? {
                GuardedUpdate::Applied(updated) => {
                    info!("Appointment {} moved to {}", id, new_status);
                    dispatch_background(
                        Arc::clone(&self.dispatcher),
                        updated.clone(),
                        NotificationEvent::for_status(new_status),
                    );
                    return Ok(updated);
                }
                GuardedUpdate::Lost(fresh) => {
                    debug!(
                        "Lost transition race on {}; retrying from {}",
                        id, fresh.status
                    );
                    current = fresh;
                }
            }
        }

        Err(AppointmentError::InvalidStatusTransition {
            from: current.status,
            to: new_status,
        })
    }

    /// Record a verified payment. Idempotent: an appointment that is already
    /// paid is returned unchanged and nothing is re-announced.
    ///
    /// Returns the record and whether this call actually applied the payment.
    pub async fn apply_payment(
        &self,
        id: &str,
        reference: &str,
    ) -> Result<(Appointment, bool), AppointmentError> {
        let mut current = self.get_appointment(id).await?;

        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            if current.payment_status == PaymentStatus::Paid {
                debug!("Appointment {} already paid, skipping", id);
                return Ok((current, false));
            }

            let changes = AppointmentChanges {
                // A successful payment confirms a pending booking; any other
                // status (e.g. cancelled in the meantime) is left alone.
                status: (current.status == AppointmentStatus::Pending)
                    .then_some(AppointmentStatus::Confirmed),
                payment_status: Some(PaymentStatus::Paid),
                payment_reference: Some(reference.to_string()),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };

            match self.guarded_update(id, current.status, &changes).await? {
                GuardedUpdate::Applied(updated) => {
                    info!("Payment {} applied to appointment {}", reference, id);
                    dispatch_background(
                        Arc::clone(&self.dispatcher),
                        updated.clone(),
                        NotificationEvent::Confirmed,
                    );
                    return Ok((updated, true));
                }
                GuardedUpdate::Lost(fresh) => current = fresh,
            }
        }

        Ok((current, false))
    }

    /// Non-lifecycle payment bookkeeping (`failed`, `refunded`). A `paid`
    /// update goes through the idempotent [`Self::apply_payment`] path.
    pub async fn update_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
        reference: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        if payment_status == PaymentStatus::Paid {
            let (appointment, _) = self
                .apply_payment(id, reference.as_deref().unwrap_or_default())
                .await?;
            return Ok(appointment);
        }

        let changes = AppointmentChanges {
            payment_status: Some(payment_status),
            payment_reference: reference,
            updated_at: Some(Utc::now()),
            ..Default::default()
        };

        match self.store.update(id, &changes).await {
            Ok(updated) => Ok(updated),
            Err(AppointmentError::NotFound) => self.fallback.update(id, &changes).await,
            Err(AppointmentError::StoreUnavailable(msg)) => self
                .fallback
                .update(id, &changes)
                .await
                .map_err(|_| AppointmentError::StoreUnavailable(msg)),
            Err(e) => Err(e),
        }
    }

    /// Remove an appointment. No notification is sent.
    pub async fn delete_appointment(&self, id: &str) -> Result<(), AppointmentError> {
        match self.store.delete(id).await {
            Ok(()) => {
                // Drop any stale fallback copy as well.
                let _ = self.fallback.delete(id).await;
                Ok(())
            }
            Err(AppointmentError::NotFound) => self.fallback.delete(id).await,
            Err(AppointmentError::StoreUnavailable(msg)) => self
                .fallback
                .delete(id)
                .await
                .map_err(|_| AppointmentError::StoreUnavailable(msg)),
            Err(e) => Err(e),
        }
    }

    /// Cascade used by account deletion.
    pub async fn delete_appointments_for_email(
        &self,
        email: &str,
    ) -> Result<usize, AppointmentError> {
        let email = normalize_email(email);
        let mut removed = self.fallback.delete_by_email(&email).await.unwrap_or(0);

        match self.store.delete_by_email(&email).await {
            Ok(count) => removed += count,
            Err(AppointmentError::StoreUnavailable(msg)) => {
                warn!("Store unreachable during cascade delete for {}: {}", email, msg);
            }
            Err(e) => return Err(e),
        }

        Ok(removed)
    }

    async fn guarded_update(
        &self,
        id: &str,
        expected: AppointmentStatus,
        changes: &AppointmentChanges,
    ) -> Result<GuardedUpdate, AppointmentError> {
        match self.store.update_guarded(id, expected, changes).await {
            Err(AppointmentError::StoreUnavailable(msg)) => {
                warn!("Store unreachable ({}), updating fallback cache", msg);
                self.fallback
                    .update_guarded(id, expected, changes)
                    .await
                    .map_err(|e| match e {
                        AppointmentError::NotFound => AppointmentError::StoreUnavailable(msg),
                        other => other,
                    })
            }
            other => other,
        }
    }
}
