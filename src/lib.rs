//! Language tutor gateway and session client - Library exports
//!
//! The gateway brokers between learners and an upstream completion API; the
//! client keeps one learner's conversation, profile and goals.

pub mod api;
pub mod client;
pub mod core;
pub mod infrastructure;
