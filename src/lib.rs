//! Connect Local: onboarding, interest matching and group chat core.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod groups;
pub mod interests;
pub mod location;
pub mod onboarding;
pub mod session;
pub mod store;
pub mod view;
