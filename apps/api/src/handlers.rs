pub mod health;
pub mod remaining;
pub mod remove;
pub mod webhooks;
