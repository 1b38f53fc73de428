pub mod account;
pub mod checkout;
pub mod payment_reconciler;
