//! Kairos onboarding: scripted profile chat and clarification search.

pub mod api;
pub mod config;
pub mod error;
pub mod onboarding;
