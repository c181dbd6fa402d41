// libs/admin-cell/src/models.rs
use serde::Serialize;

/// One-page operational summary for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_appointments: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
    pub paid: usize,
    /// Naira booked across confirmed and completed appointments.
    pub total_revenue: f64,
    pub today: usize,
    /// The confirmed/completed slice of today's bookings, in Naira.
    pub today_revenue: f64,
    pub total_users: usize,
}
