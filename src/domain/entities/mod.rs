pub mod account;
pub mod entitlement;
pub mod payment_event;
pub mod payment_status;
pub mod provider_state;
