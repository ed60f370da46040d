//! Group data models.

use serde::{Deserialize, Serialize};

use crate::location::{Location, calculate_distance};

/// Where a group meets, copied from the user's location when matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Location> for GroupLocation {
    fn from(location: &Location) -> Self {
        Self {
            name: location.name.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// Summary of the most recent message, shown in the group list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub text: String,
    pub sender: String,
    pub timestamp: i64,
}

/// A local interest group the user belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// `group_{slug}_{millis}`.
    pub id: String,
    pub name: String,
    pub interest: String,
    pub location: GroupLocation,
    /// Travel radius in miles at match time.
    pub radius: u32,
    pub member_count: u32,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub last_message: Option<MessageSummary>,
    pub joined_at: i64,
    #[serde(alias = "hasAIBot", default)]
    pub has_assistant: bool,
}

impl Group {
    /// Miles from the group's meeting point to the given coordinates.
    pub fn distance_from(&self, latitude: f64, longitude: f64) -> f64 {
        calculate_distance(
            self.location.latitude,
            self.location.longitude,
            latitude,
            longitude,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_legacy_field_names() {
        let json = r#"{
            "id": "group_hiking_1700000000000",
            "name": "Hiking - Austin, Texas",
            "interest": "Hiking",
            "location": {"name": "Austin, Texas", "latitude": 30.27, "longitude": -97.74},
            "radius": 10,
            "memberCount": 12,
            "unreadCount": 0,
            "lastMessage": null,
            "joinedAt": 1700000000000,
            "hasAIBot": true
        }"#;
        let group: Group = serde_json::from_str(json).unwrap();
        assert!(group.has_assistant);
        assert_eq!(group.member_count, 12);
        assert!(group.last_message.is_none());
    }

    #[test]
    fn serializes_camel_case() {
        let group = Group {
            id: "group_yoga_1".into(),
            name: "Yoga - Here".into(),
            interest: "Yoga".into(),
            location: GroupLocation {
                name: "Here".into(),
                latitude: 0.0,
                longitude: 0.0,
            },
            radius: 5,
            member_count: 7,
            unread_count: 2,
            last_message: None,
            joined_at: 1,
            has_assistant: true,
        };
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["memberCount"], 7);
        assert_eq!(value["unreadCount"], 2);
        assert_eq!(value["hasAssistant"], true);
    }

    #[test]
    fn distance_from_own_location_is_zero() {
        let group = Group {
            id: "g".into(),
            name: "n".into(),
            interest: "i".into(),
            location: GroupLocation {
                name: "Austin".into(),
                latitude: 30.2672,
                longitude: -97.7431,
            },
            radius: 10,
            member_count: 5,
            unread_count: 0,
            last_message: None,
            joined_at: 0,
            has_assistant: true,
        };
        assert_eq!(group.distance_from(30.2672, -97.7431), 0.0);
        assert!(group.distance_from(29.7604, -95.3698) > 140.0);
    }
}
