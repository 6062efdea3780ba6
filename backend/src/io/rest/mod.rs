//! # REST API Interface Layer
//!
//! JSON endpoints over the domain services. Handlers only translate between
//! HTTP and service calls; domain errors become status codes in `error`.

pub mod error;
pub mod life_area_apis;
pub mod quest_apis;
pub mod reward_apis;
pub mod subtask_apis;
pub mod user_apis;
