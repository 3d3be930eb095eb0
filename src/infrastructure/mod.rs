pub mod config;
pub mod entities;
pub mod traits;
pub mod upstream;
