//! Read-only projections for the UI layer.

use serde::Serialize;

use crate::interests::Interest;
use crate::session::Session;

/// Shown on the profile summary when no location is stored.
pub const LOCATION_NOT_SET: &str = "Location not set";

/// One selectable interest in the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterestChip {
    pub name: Interest,
    pub selected: bool,
    pub custom: bool,
}

/// One row in the group list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCard {
    pub id: String,
    pub name: String,
    pub location_name: String,
    pub member_count: u32,
    /// `None` hides the badge.
    pub unread_badge: Option<u32>,
    pub last_message: Option<String>,
    /// Miles from the user's current location, when it is known.
    pub distance_miles: Option<f64>,
}

/// What the profile screen shows before matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub location: String,
    pub radius: String,
    pub interests: Vec<Interest>,
}

impl Session {
    /// Interests matching `query`, each flagged with its selection state.
    pub async fn render_interests(&self, query: &str) -> Vec<InterestChip> {
        let mut chips = Vec::new();
        for name in self.interests.search(query).await {
            chips.push(InterestChip {
                selected: self.interests.is_selected(&name).await,
                custom: self.interests.is_custom(&name).await,
                name,
            });
        }
        chips
    }

    /// The user's groups as list rows. Empty means the empty-state message.
    pub async fn render_groups(&self) -> Vec<GroupCard> {
        let here = self
            .location
            .current_location()
            .await
            .filter(|loc| !loc.is_unknown());

        self.groups
            .groups()
            .await
            .into_iter()
            .map(|group| GroupCard {
                distance_miles: here
                    .as_ref()
                    .map(|loc| group.distance_from(loc.latitude, loc.longitude)),
                unread_badge: (group.unread_count > 0).then_some(group.unread_count),
                last_message: group
                    .last_message
                    .as_ref()
                    .map(|m| format!("{}: {}", m.sender, m.text)),
                location_name: group.location.name,
                member_count: group.member_count,
                name: group.name,
                id: group.id,
            })
            .collect()
    }

    pub async fn render_profile_summary(&self) -> ProfileSummary {
        let location = self
            .location
            .current_location()
            .await
            .map(|loc| loc.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| LOCATION_NOT_SET.to_string());

        ProfileSummary {
            location,
            radius: format!("{} miles", self.location.travel_radius().await),
            interests: self.interests.selected().await,
        }
    }
}
