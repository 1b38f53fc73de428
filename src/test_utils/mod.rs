//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - A stub payment provider and webhook signing helpers
//! - `TestAppStateBuilder` for HTTP-level tests

mod account_mocks;
mod app_state_builder;
mod factories;
mod payment_mocks;

pub use account_mocks::*;
pub use app_state_builder::*;
pub use factories::*;
pub use payment_mocks::*;
