pub mod paystack;
pub mod reconciliation;
