//! Onboarding state machine: decides which screen the user must see.
//!
//! Resolution is a pure function of four persisted facts. The first unmet
//! fact wins, so an unauthenticated user always lands on the login screen
//! no matter what else is stored.

use serde::{Deserialize, Serialize};

/// Screens the client can show, in onboarding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Login,
    Location,
    Interests,
    Profile,
    Main,
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Login => "login",
            Self::Location => "location",
            Self::Interests => "interests",
            Self::Profile => "profile",
            Self::Main => "main",
        };
        write!(f, "{s}")
    }
}

/// The first unmet onboarding requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    NotAuthenticated,
    NoLocation,
    NoInterests,
    NoGroups,
    Complete,
}

impl OnboardingStep {
    /// The screen that satisfies this step.
    pub fn screen(&self) -> Screen {
        match self {
            Self::NotAuthenticated => Screen::Login,
            Self::NoLocation => Screen::Location,
            Self::NoInterests => Screen::Interests,
            Self::NoGroups => Screen::Profile,
            Self::Complete => Screen::Main,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::NoLocation => "no_location",
            Self::NoInterests => "no_interests",
            Self::NoGroups => "no_groups",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Snapshot of the facts onboarding depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnboardingFacts {
    pub authenticated: bool,
    /// A real fix or the skip sentinel both count.
    pub has_location: bool,
    pub has_interests: bool,
    pub has_groups: bool,
}

/// Completed user actions that move onboarding forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingEvent {
    LoggedIn,
    LocationGranted,
    LocationSkipped,
    InterestsConfirmed,
    GroupsFound,
}

/// First unmet fact, in priority order.
pub fn resolve(facts: OnboardingFacts) -> OnboardingStep {
    if !facts.authenticated {
        OnboardingStep::NotAuthenticated
    } else if !facts.has_location {
        OnboardingStep::NoLocation
    } else if !facts.has_interests {
        OnboardingStep::NoInterests
    } else if !facts.has_groups {
        OnboardingStep::NoGroups
    } else {
        OnboardingStep::Complete
    }
}

/// Screen to show after `event`, given the facts as they stand afterwards.
///
/// Login re-resolves from scratch. Every other event names a fixed next
/// screen, capped at the first unmet fact.
pub fn transition(event: OnboardingEvent, facts: OnboardingFacts) -> Screen {
    let resolved = resolve(facts).screen();
    let target = match event {
        OnboardingEvent::LoggedIn => return resolved,
        OnboardingEvent::LocationGranted | OnboardingEvent::LocationSkipped => Screen::Interests,
        OnboardingEvent::InterestsConfirmed => Screen::Profile,
        OnboardingEvent::GroupsFound => Screen::Main,
    };
    target.min(resolved)
}
