//! Scripted assistant replies.
//!
//! Rules are evaluated in order against the lowercased message and the first
//! match wins. Messages that match nothing get a random generic reply.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

/// A keyword rule: any keyword occurring as a substring selects `reply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRule {
    /// Short label for logs.
    pub name: String,
    /// Lowercase substrings, any of which triggers the rule.
    pub keywords: Vec<String>,
    pub reply: String,
}

impl ReplyRule {
    pub fn new(name: &str, keywords: &[&str], reply: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            reply: reply.to_string(),
        }
    }

    /// Whether any keyword occurs in the already-lowercased text.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Ordered rule list plus a pool of generic fallbacks.
#[derive(Debug, Clone)]
pub struct ScriptedResponder {
    rules: Vec<ReplyRule>,
    fallbacks: Vec<String>,
}

impl ScriptedResponder {
    pub fn new(rules: Vec<ReplyRule>, fallbacks: Vec<String>) -> Self {
        Self { rules, fallbacks }
    }

    /// The assistant's built-in script.
    pub fn default_rules() -> Self {
        let rules = vec![
            ReplyRule::new(
                "meetup",
                &["meetup", "meet"],
                "Great idea! How about meeting this weekend? I can suggest some local spots if you'd like. What day works best for everyone?",
            ),
            ReplyRule::new(
                "location",
                &["where", "location"],
                "I can suggest a few local spots:\n\n1. Central Park Cafe - Great for casual meetups\n2. Community Center - Free and spacious\n3. Local Library - Quiet and comfortable\n\nWhich sounds good to everyone?",
            ),
            ReplyRule::new(
                "time",
                &["when", "time"],
                "How about this Saturday at 2 PM? Let me know if that works for you, and I'll help coordinate!",
            ),
            ReplyRule::new(
                "rsvp",
                &["rsvp", "yes", "count me in"],
                "Awesome! I've noted your RSVP. We now have enough people for a great meetup!",
            ),
            ReplyRule::new(
                "help",
                &["help"],
                "I can help you:\n\n• Suggest meetup locations\n• Coordinate times\n• Track RSVPs\n• Find local activities\n\nJust let me know what you need!",
            ),
            ReplyRule::new(
                "greeting",
                &["hello", "hi"],
                "Hello! Ready to plan something fun? Let me know if you want to organize a meetup!",
            ),
        ];

        let fallbacks = vec![
            "That sounds interesting! Would you like to organize a meetup around that?".to_string(),
            "I'm here to help coordinate activities. Let me know if you want to plan something!"
                .to_string(),
            "Great to see the conversation going! Feel free to ask me for meetup suggestions anytime."
                .to_string(),
        ];

        Self::new(rules, fallbacks)
    }

    pub fn rules(&self) -> &[ReplyRule] {
        &self.rules
    }

    pub fn fallbacks(&self) -> &[String] {
        &self.fallbacks
    }

    /// First rule matching `text`, if any.
    pub fn matching_rule(&self, text: &str) -> Option<&ReplyRule> {
        let lowered = text.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    /// Pick the reply for `text`.
    pub fn reply<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> String {
        if let Some(rule) = self.matching_rule(text) {
            debug!(rule = %rule.name, "Reply rule matched");
            return rule.reply.clone();
        }
        self.fallbacks.choose(rng).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn reply(text: &str) -> String {
        let mut rng = StdRng::seed_from_u64(7);
        ScriptedResponder::default_rules().reply(text, &mut rng)
    }

    fn rule_name(text: &str) -> Option<String> {
        ScriptedResponder::default_rules()
            .matching_rule(text)
            .map(|r| r.name.clone())
    }

    #[test]
    fn meet_never_falls_through() {
        assert_eq!(rule_name("Let's MEET up").as_deref(), Some("meetup"));
        assert!(reply("anyone want to meet?").starts_with("Great idea!"));
    }

    #[test]
    fn first_match_wins() {
        // Contains "where", "time" and "hello"; "where" is earlier in the list.
        assert_eq!(
            rule_name("hello, where and what time?").as_deref(),
            Some("location")
        );
        // "meet" outranks "yes".
        assert_eq!(rule_name("yes let's meet").as_deref(), Some("meetup"));
        // "when" outranks "help".
        assert_eq!(rule_name("help, when is it").as_deref(), Some("time"));
    }

    #[test]
    fn each_rule_is_reachable() {
        assert_eq!(rule_name("what's the location").as_deref(), Some("location"));
        assert_eq!(rule_name("When?").as_deref(), Some("time"));
        assert_eq!(rule_name("count me in").as_deref(), Some("rsvp"));
        assert_eq!(rule_name("RSVP").as_deref(), Some("rsvp"));
        assert_eq!(rule_name("HELP").as_deref(), Some("help"));
        assert_eq!(rule_name("Hello there").as_deref(), Some("greeting"));
    }

    #[test]
    fn substring_semantics_are_kept() {
        // "hi" inside "this" still counts as a greeting.
        assert_eq!(rule_name("this is cool").as_deref(), Some("greeting"));
    }

    #[test]
    fn unmatched_text_gets_a_generic_reply() {
        let responder = ScriptedResponder::default_rules();
        assert!(responder.matching_rule("pizza?").is_none());
        let text = reply("pizza?");
        assert!(responder.fallbacks().contains(&text));
    }

    #[test]
    fn generic_reply_is_deterministic_given_seed() {
        let responder = ScriptedResponder::default_rules();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            assert_eq!(
                responder.reply("pizza?", &mut a),
                responder.reply("pizza?", &mut b)
            );
        }
    }

    #[test]
    fn custom_rules() {
        let responder = ScriptedResponder::new(
            vec![ReplyRule::new("bbq", &["BBQ"], "Bring the grill!")],
            vec!["ok".to_string()],
        );
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(responder.reply("bbq saturday?", &mut rng), "Bring the grill!");
        assert_eq!(responder.reply("nope", &mut rng), "ok");
    }
}
