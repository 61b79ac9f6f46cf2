pub mod commands;
pub mod notifier;
pub mod responses;
pub mod services;
pub mod stats;
pub mod tracker;
pub mod traits;
