//! Session: the one context object owning every component.
//!
//! Built once at startup from the config and the external collaborators.
//! User intents come in as methods; each one updates the owning component
//! and then moves the onboarding screen.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

use crate::auth::{AuthProvider, AuthUser};
use crate::chat::{ChatConfig, ConversationEngine, DEFAULT_SENDER, Message, ScriptedResponder};
use crate::config::AppConfig;
use crate::error::{AuthError, LocationError};
use crate::groups::{Group, GroupMatcher};
use crate::interests::{Interest, InterestCatalog};
use crate::location::{GeolocationProvider, Location, LocationService, ReverseGeocoder};
use crate::onboarding::{self, OnboardingEvent, OnboardingFacts, Screen};
use crate::store::KeyValueStore;

/// External collaborators a session is built from.
pub struct SessionDeps {
    pub store: Arc<dyn KeyValueStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    /// Provider that asks for permission before the first fix.
    pub native_geolocation: Option<Arc<dyn GeolocationProvider>>,
    /// Used only when there is no native provider.
    pub fallback_geolocation: Option<Arc<dyn GeolocationProvider>>,
}

pub struct Session {
    auth: Arc<dyn AuthProvider>,
    pub(crate) interests: InterestCatalog,
    pub(crate) location: LocationService,
    pub(crate) groups: Arc<GroupMatcher>,
    chat: Arc<ConversationEngine>,
    screen: RwLock<Screen>,
}

impl Session {
    pub fn new(config: &AppConfig, deps: SessionDeps) -> Self {
        let SessionDeps {
            store,
            auth,
            geocoder,
            native_geolocation,
            fallback_geolocation,
        } = deps;

        let mut location = LocationService::new(
            Arc::clone(&store),
            geocoder,
            config.default_radius_miles,
            config.location_timeout,
        );
        if let Some(native) = native_geolocation {
            location = location.with_native(native);
        }
        if let Some(fallback) = fallback_geolocation {
            location = location.with_fallback(fallback);
        }

        let groups = Arc::new(GroupMatcher::new(Arc::clone(&store)));
        let chat = ConversationEngine::new(
            Arc::clone(&store),
            Arc::clone(&groups),
            ScriptedResponder::default_rules(),
            ChatConfig::from(config),
        );

        Self {
            auth,
            interests: InterestCatalog::new(store),
            location,
            groups,
            chat,
            screen: RwLock::new(Screen::Login),
        }
    }

    /// Restore every component from storage and pick the starting screen.
    pub async fn init(&self) -> Screen {
        let (interests, location, groups, messages) = tokio::join!(
            self.interests.load(),
            self.location.load(),
            self.groups.load(),
            self.chat.load(),
        );
        info!(interests, location, groups, messages, "Session state restored");

        let facts = self.facts().await;
        let screen = onboarding::resolve(facts).screen();
        *self.screen.write().await = screen;
        info!(%screen, "Session initialized");
        screen
    }

    /// The onboarding facts as they stand now.
    pub async fn facts(&self) -> OnboardingFacts {
        OnboardingFacts {
            authenticated: self.auth.is_logged_in().await,
            has_location: self.location.has_location().await,
            has_interests: self.interests.has_selection().await,
            has_groups: !self.groups.is_empty().await,
        }
    }

    pub async fn current_screen(&self) -> Screen {
        *self.screen.read().await
    }

    async fn advance(&self, event: OnboardingEvent) -> Screen {
        let screen = onboarding::transition(event, self.facts().await);
        let previous = std::mem::replace(&mut *self.screen.write().await, screen);
        if previous != screen {
            info!(?event, from = %previous, to = %screen, "Screen changed");
        }
        screen
    }

    // ── Auth ───────────────────────────────────────────────────────

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user().await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Screen, AuthError> {
        self.auth.register(email, password, display_name).await?;
        Ok(self.advance(OnboardingEvent::LoggedIn).await)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Screen, AuthError> {
        self.auth.login(email, password).await?;
        Ok(self.advance(OnboardingEvent::LoggedIn).await)
    }

    pub async fn login_with_provider(&self, provider: &str) -> Result<Screen, AuthError> {
        self.auth.login_with_provider(provider).await?;
        Ok(self.advance(OnboardingEvent::LoggedIn).await)
    }

    pub async fn logout(&self) -> Screen {
        self.auth.logout().await;
        let screen = onboarding::resolve(self.facts().await).screen();
        *self.screen.write().await = screen;
        screen
    }

    // ── Location ───────────────────────────────────────────────────

    /// Ask for a position fix. Failures leave the screen where it is.
    pub async fn enable_location(&self) -> Result<Location, LocationError> {
        match self.location.request_location().await {
            Ok(location) => {
                self.advance(OnboardingEvent::LocationGranted).await;
                Ok(location)
            }
            Err(e) => {
                warn!("Location request failed: {}", e);
                Err(e)
            }
        }
    }

    /// Continue without a location. Stores the unknown-location sentinel.
    pub async fn skip_location(&self) -> Location {
        let location = self.location.skip().await;
        self.advance(OnboardingEvent::LocationSkipped).await;
        location
    }

    pub async fn current_location(&self) -> Option<Location> {
        self.location.current_location().await
    }

    pub async fn travel_radius(&self) -> u32 {
        self.location.travel_radius().await
    }

    pub async fn set_travel_radius(&self, miles: u32) {
        self.location.set_travel_radius(miles).await;
    }

    // ── Interests ──────────────────────────────────────────────────

    pub async fn search_interests(&self, query: &str) -> Vec<Interest> {
        self.interests.search(query).await
    }

    pub async fn selected_interests(&self) -> Vec<Interest> {
        self.interests.selected().await
    }

    pub async fn toggle_interest(&self, interest: &str) -> Vec<Interest> {
        self.interests.toggle(interest).await
    }

    /// Add a free-text interest. Blank input is ignored.
    pub async fn add_custom_interest(&self, raw: &str) -> Option<Interest> {
        self.interests.add_custom(raw).await
    }

    pub async fn clear_interests(&self) {
        self.interests.clear_selections().await;
    }

    /// Move on to the profile summary. Stays on interests until one is picked.
    pub async fn confirm_interests(&self) -> Screen {
        self.advance(OnboardingEvent::InterestsConfirmed).await
    }

    // ── Groups ─────────────────────────────────────────────────────

    /// Match the selected interests into groups near the current location.
    ///
    /// A successful match replaces every existing group, so replies still
    /// pending for the old groups are cancelled.
    pub async fn find_groups(&self) -> Vec<Group> {
        let interests = self.interests.selected().await;
        let location = self.location.current_location().await;
        let radius = self.location.travel_radius().await;
        let previous: Vec<String> = self.groups.groups().await.into_iter().map(|g| g.id).collect();

        let matched = self
            .groups
            .find_and_join(&interests, location.as_ref(), radius)
            .await;
        if !matched.is_empty() {
            for id in &previous {
                self.chat.cancel_pending(id);
            }
        }
        self.advance(OnboardingEvent::GroupsFound).await;
        matched
    }

    pub async fn groups(&self) -> Vec<Group> {
        self.groups.groups().await
    }

    pub async fn group(&self, group_id: &str) -> Option<Group> {
        self.groups.get(group_id).await
    }

    /// Leave a group and drop any reply still waiting for it.
    pub async fn leave_group(&self, group_id: &str) -> bool {
        self.chat.cancel_pending(group_id);
        self.groups.leave(group_id).await
    }

    pub async fn increment_unread(&self, group_id: &str) {
        self.groups.increment_unread(group_id).await;
    }

    pub async fn clear_unread(&self, group_id: &str) {
        self.groups.clear_unread(group_id).await;
    }

    // ── Chat ───────────────────────────────────────────────────────

    pub async fn messages(&self, group_id: &str) -> Vec<Message> {
        self.chat.messages(group_id).await
    }

    /// Read a group's log and mark it read.
    pub async fn open_group(&self, group_id: &str) -> Vec<Message> {
        self.groups.clear_unread(group_id).await;
        self.chat.messages(group_id).await
    }

    /// Post as the signed-in user. Blank text is ignored.
    pub async fn send_message(&self, group_id: &str, text: &str) -> Option<Message> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let sender = self
            .auth
            .current_user()
            .await
            .and_then(|u| u.display_name().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_SENDER.to_string());
        Some(self.chat.send(group_id, &sender, text).await)
    }

    /// Accept a message delivered from elsewhere and count it as unread.
    pub async fn receive_message(&self, message: Message) {
        let group_id = message.group_id.clone();
        self.chat.receive(message).await;
        self.groups.increment_unread(&group_id).await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.chat.subscribe()
    }

    /// Abort every pending assistant reply.
    pub fn shutdown(&self) {
        let aborted = self.chat.cancel_all();
        info!(aborted, "Session shut down");
    }
}
