// libs/admin-cell/src/services/stats.rs
use shared_models::appointment::{Appointment, AppointmentStatus, PaymentStatus};

use crate::models::DashboardStats;

/// Fold a set of appointments into dashboard numbers.
///
/// `today` is a `YYYY-MM-DD` string; matching is by prefix so dates stored
/// with a time component still count.
pub fn compute_stats(
    appointments: &[Appointment],
    total_users: usize,
    today: &str,
) -> DashboardStats {
    let mut stats = DashboardStats {
        total_appointments: appointments.len(),
        total_users,
        ..Default::default()
    };

    for appointment in appointments {
        match appointment.status {
            AppointmentStatus::Pending => stats.pending += 1,
            AppointmentStatus::Confirmed => stats.confirmed += 1,
            AppointmentStatus::Completed => stats.completed += 1,
            AppointmentStatus::Cancelled => stats.cancelled += 1,
            AppointmentStatus::NoShow => stats.no_show += 1,
        }

        if appointment.payment_status == PaymentStatus::Paid {
            stats.paid += 1;
        }

        let earns = matches!(
            appointment.status,
            AppointmentStatus::Confirmed | AppointmentStatus::Completed
        );
        if earns {
            stats.total_revenue += appointment.amount.unwrap_or(0.0);
        }

        if appointment.date.starts_with(today) {
            stats.today += 1;
            if earns {
                stats.today_revenue += appointment.amount.unwrap_or(0.0);
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::sample_appointment;

    #[test]
    fn empty_input_is_all_zeroes() {
        let stats = compute_stats(&[], 0, "2025-12-01");
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn counts_revenue_and_today() {
        let mut confirmed = sample_appointment("APT_1_abc00001", "ada@x.com");
        confirmed.status = AppointmentStatus::Confirmed;
        confirmed.payment_status = PaymentStatus::Paid;
        confirmed.amount = Some(5000.0);

        let mut completed = sample_appointment("APT_2_abc00002", "obi@x.com");
        completed.status = AppointmentStatus::Completed;
        completed.amount = Some(7500.0);
        completed.date = "2025-11-30".to_string();

        let mut cancelled = sample_appointment("APT_3_abc00003", "eze@x.com");
        cancelled.status = AppointmentStatus::Cancelled;
        cancelled.amount = Some(9999.0);

        let pending = sample_appointment("APT_4_abc00004", "ngo@x.com");

        let stats = compute_stats(&[confirmed, completed, cancelled, pending], 2, "2025-12-01");

        assert_eq!(stats.total_appointments, 4);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.confirmed, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.no_show, 0);
        assert_eq!(stats.paid, 1);
        // cancelled money never counts
        assert_eq!(stats.total_revenue, 12500.0);
        assert_eq!(stats.today, 3);
        // the completed booking is dated yesterday
        assert_eq!(stats.today_revenue, 5000.0);
        assert_eq!(stats.total_users, 2);
    }

    #[test]
    fn missing_amounts_count_as_zero_revenue() {
        let mut confirmed = sample_appointment("APT_5_abc00005", "ada@x.com");
        confirmed.status = AppointmentStatus::Confirmed;
        confirmed.amount = None;

        let stats = compute_stats(&[confirmed], 0, "2025-12-01");
        assert_eq!(stats.confirmed, 1);
        assert_eq!(stats.total_revenue, 0.0);
    }
}
