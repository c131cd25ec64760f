//! Infrastructure layer - Backend implementations and wiring

pub mod cache;
pub mod logging;
pub mod provider;
pub mod services;
pub mod storage;
