pub mod account_service;
pub mod aggregation;
pub mod attendance;
pub mod eligibility;
pub mod error;
pub mod lifecycle;

pub use error::{ServiceError, ServiceResult};
