// libs/notification-cell/src/services/templates.rs
use shared_models::appointment::Appointment;

use crate::models::{EmailMessage, NotificationEvent};

const CLINIC_NAME: &str = "P&A Institute";

/// Accent color per status-update template.
fn accent_color(event: NotificationEvent) -> &'static str {
    match event {
        NotificationEvent::Confirmed => "#27ae60",
        NotificationEvent::Cancelled => "#e74c3c",
        NotificationEvent::Completed => "#3498db",
        NotificationEvent::Booked => "#0d9488",
    }
}

/// Render the one template associated with `event`, parameterized by the
/// appointment's fields.
pub fn render(appointment: &Appointment, event: NotificationEvent) -> EmailMessage {
    match event {
        NotificationEvent::Booked => booked(appointment),
        NotificationEvent::Confirmed => confirmed(appointment),
        NotificationEvent::Cancelled | NotificationEvent::Completed => {
            status_update(appointment, event)
        }
    }
}

fn booked(appointment: &Appointment) -> EmailMessage {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background: linear-gradient(135deg, #0d9488, #14b8a6); padding: 30px; text-align: center;">
    <h1 style="color: white; margin: 0;">Appointment Booked!</h1>
  </div>
  <div style="padding: 30px; background: #f9f9f9;">
    <p style="font-size: 16px;">Hi <strong>{name}</strong>,</p>
    <p>Your appointment has been booked successfully!</p>
    <div style="background: white; padding: 20px; border-radius: 10px; margin: 20px 0; border-left: 4px solid #0d9488;">
      <p style="margin: 8px 0;"><strong>Service:</strong> {service}</p>
      <p style="margin: 8px 0;"><strong>Date:</strong> {date}</p>
      <p style="margin: 8px 0;"><strong>Time:</strong> {time}</p>
      <p style="margin: 8px 0;"><strong>Reference:</strong> {id}</p>
    </div>
    <p><strong>Please arrive 10 minutes early.</strong></p>
    <p style="margin-top: 30px; color: #666;">Thank you for choosing {clinic}!</p>
  </div>
</div>"#,
        name = appointment.patient_name,
        service = appointment.service,
        date = appointment.date,
        time = appointment.time,
        id = appointment.id,
        clinic = CLINIC_NAME,
    );

    EmailMessage {
        to: appointment.email.clone(),
        subject: format!("Appointment Booked - {}", CLINIC_NAME),
        html,
    }
}

fn confirmed(appointment: &Appointment) -> EmailMessage {
    let reference_line = appointment
        .payment_reference
        .as_deref()
        .map(|reference| {
            format!(
                r#"<p style="margin: 8px 0;"><strong>Payment reference:</strong> {}</p>"#,
                reference
            )
        })
        .unwrap_or_default();

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background: {color}; padding: 25px; text-align: center;">
    <h1 style="color: white; margin: 0;">Appointment Confirmed</h1>
  </div>
  <div style="padding: 30px; background: #f9f9f9;">
    <p>Hi {name},</p>
    <p>Your appointment for <strong>{service}</strong> on <strong>{date}</strong> at <strong>{time}</strong> has been <strong style="color: {color}">confirmed</strong>.</p>
    {reference_line}
    <p style="margin-top: 30px; color: #666;">Thank you for choosing {clinic}!</p>
  </div>
</div>"#,
        color = accent_color(NotificationEvent::Confirmed),
        name = appointment.patient_name,
        service = appointment.service,
        date = appointment.date,
        time = appointment.time,
        reference_line = reference_line,
        clinic = CLINIC_NAME,
    );

    EmailMessage {
        to: appointment.email.clone(),
        subject: format!("Appointment Confirmed - {}", CLINIC_NAME),
        html,
    }
}

fn status_update(appointment: &Appointment, event: NotificationEvent) -> EmailMessage {
    let status_label = event.to_string();
    let color = accent_color(event);

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background: {color}; padding: 25px; text-align: center;">
    <h1 style="color: white; margin: 0;">Appointment {title}</h1>
  </div>
  <div style="padding: 30px; background: #f9f9f9;">
    <p>Hi {name},</p>
    <p>Your appointment for <strong>{service}</strong> on <strong>{date}</strong> at <strong>{time}</strong> has been <strong style="color: {color}">{status}</strong>.</p>
    <p style="margin-top: 30px; color: #666;">Thank you for choosing {clinic}!</p>
  </div>
</div>"#,
        color = color,
        title = capitalize(&status_label),
        name = appointment.patient_name,
        service = appointment.service,
        date = appointment.date,
        time = appointment.time,
        status = status_label,
        clinic = CLINIC_NAME,
    );

    EmailMessage {
        to: appointment.email.clone(),
        subject: format!("Appointment {} - {}", capitalize(&status_label), CLINIC_NAME),
        html,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
