pub mod assistant;
pub mod error;
pub mod fallback;
pub mod models;
pub mod proficiency;
pub mod services;
pub mod traits;
