//! Onboarding: which screen the user must see next.

pub mod state;

pub use state::{OnboardingEvent, OnboardingFacts, OnboardingStep, Screen, resolve, transition};
