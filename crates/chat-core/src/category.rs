//! Keyword categorization of user messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Topic of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hours,
    Menu,
    Location,
    Catering,
    Dietary,
    Seasonal,
    GiftCards,
    Ordering,
    Inappropriate,
    General,
}

/// Keywords per topic, checked in order. First hit wins.
const TOPICS: &[(Category, &[&str])] = &[
    (Category::Hours, &["hour", "open", "close", "time"]),
    (Category::Menu, &["menu", "flavor", "ice cream", "dessert"]),
    (Category::Location, &["location", "address", "where", "direction"]),
    (Category::Catering, &["cater", "event", "party", "wedding"]),
    (Category::Dietary, &["allergen", "vegan", "gluten", "dairy"]),
    (Category::Seasonal, &["seasonal", "special", "limited"]),
    (Category::GiftCards, &["gift", "card"]),
    (Category::Ordering, &["order", "delivery", "pickup"]),
];

/// Out-of-policy terms, checked after the topics.
const INAPPROPRIATE_TERMS: &[&str] = &["hate", "violence", "illegal", "drug", "weapon"];

/// Phrases that suggest the assistant could not answer.
const UNANSWERED_MARKERS: &[&str] = &["I don't know", "I'm not sure", "contact the store"];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hours => "hours",
            Category::Menu => "menu",
            Category::Location => "location",
            Category::Catering => "catering",
            Category::Dietary => "dietary",
            Category::Seasonal => "seasonal",
            Category::GiftCards => "giftcards",
            Category::Ordering => "ordering",
            Category::Inappropriate => "inappropriate",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the widget presents a follow-up action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Link,
    Form,
}

/// A follow-up button shown under a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub label: String,
    pub url: String,
}

/// Shop URLs behind the follow-up actions. Unset URLs produce no action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLinks {
    pub catering: Option<String>,
    pub catering_form: Option<String>,
    pub order: Option<String>,
    pub directions: Option<String>,
    pub menu: Option<String>,
}

/// Follow-up actions for a reply in `category`.
pub fn actions_for(category: Category, links: &ActionLinks) -> Vec<Action> {
    let candidates = match category {
        Category::Catering => vec![
            (ActionKind::Link, "View Catering Options", &links.catering),
            (ActionKind::Form, "Request Catering Quote", &links.catering_form),
        ],
        Category::Ordering => vec![(ActionKind::Link, "Order Online", &links.order)],
        Category::Location => vec![(ActionKind::Link, "Get Directions", &links.directions)],
        Category::Menu => vec![(ActionKind::Link, "View Full Menu", &links.menu)],
        _ => Vec::new(),
    };

    candidates
        .into_iter()
        .filter_map(|(kind, label, url)| {
            url.as_ref().map(|url| Action {
                kind,
                label: label.to_string(),
                url: url.clone(),
            })
        })
        .collect()
}

/// Categorize a user message by case-insensitive substring match.
pub fn categorize(message: &str) -> Category {
    let lower = message.to_lowercase();

    for (category, keywords) in TOPICS {
        if keywords.iter().any(|keyword| lower.contains(keyword)) {
            return *category;
        }
    }

    if INAPPROPRIATE_TERMS.iter().any(|term| lower.contains(term)) {
        return Category::Inappropriate;
    }

    Category::General
}

/// Whether a reply reads like the assistant did not know the answer.
pub fn looks_unanswered(response: &str) -> bool {
    UNANSWERED_MARKERS
        .iter()
        .any(|marker| response.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics() {
        assert_eq!(categorize("What are your HOURS?"), Category::Hours);
        assert_eq!(categorize("Which flavors do you have"), Category::Menu);
        assert_eq!(categorize("Where are you?"), Category::Location);
        assert_eq!(categorize("Can you cater my wedding"), Category::Catering);
        assert_eq!(categorize("anything vegan"), Category::Dietary);
        assert_eq!(categorize("any specials"), Category::Seasonal);
        assert_eq!(categorize("do you sell gift cards"), Category::GiftCards);
        assert_eq!(categorize("can I get delivery"), Category::Ordering);
    }

    #[test]
    fn test_first_match_wins() {
        // "open" (hours) is checked before "menu"
        assert_eq!(categorize("is the menu open"), Category::Hours);
        // Topic keywords take precedence over policy terms
        assert_eq!(categorize("I hate this flavor"), Category::Menu);
    }

    #[test]
    fn test_inappropriate() {
        assert_eq!(categorize("where can I buy a weapon"), Category::Location);
        assert_eq!(categorize("tell me about drugs"), Category::Inappropriate);
        assert_eq!(categorize("VIOLENCE"), Category::Inappropriate);
    }

    #[test]
    fn test_general() {
        assert_eq!(categorize("hello there"), Category::General);
        assert_eq!(categorize(""), Category::General);
    }

    #[test]
    fn test_looks_unanswered() {
        assert!(looks_unanswered("Sorry, I don't know that one."));
        assert!(looks_unanswered("I'm not sure! Please contact the store."));
        assert!(!looks_unanswered("We open at noon."));
        // Case-sensitive, like the phrasing the assistant is told to use
        assert!(!looks_unanswered("i don't know"));
    }

    fn links() -> ActionLinks {
        ActionLinks {
            catering: Some("https://shop.test/catering".to_string()),
            catering_form: Some("https://shop.test/catering-form".to_string()),
            order: Some("https://shop.test/order".to_string()),
            directions: Some("https://maps.test/shop".to_string()),
            menu: Some("https://shop.test/menu".to_string()),
        }
    }

    #[test]
    fn test_actions_per_category() {
        let links = links();
        let labels = |category| {
            actions_for(category, &links)
                .into_iter()
                .map(|action| action.label)
                .collect::<Vec<_>>()
        };

        assert_eq!(
            labels(Category::Catering),
            ["View Catering Options", "Request Catering Quote"]
        );
        assert_eq!(labels(Category::Ordering), ["Order Online"]);
        assert_eq!(labels(Category::Location), ["Get Directions"]);
        assert_eq!(labels(Category::Menu), ["View Full Menu"]);
        assert!(labels(Category::Hours).is_empty());
        assert!(labels(Category::Inappropriate).is_empty());
        assert!(labels(Category::General).is_empty());
    }

    #[test]
    fn test_catering_actions_carry_kind_and_url() {
        let actions = actions_for(Category::Catering, &links());

        assert_eq!(actions[0].kind, ActionKind::Link);
        assert_eq!(actions[0].url, "https://shop.test/catering");
        assert_eq!(actions[1].kind, ActionKind::Form);
        assert_eq!(actions[1].url, "https://shop.test/catering-form");
    }

    #[test]
    fn test_unset_links_produce_no_actions() {
        let links = ActionLinks {
            catering_form: Some("https://shop.test/catering-form".to_string()),
            ..ActionLinks::default()
        };

        let actions = actions_for(Category::Catering, &links);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Form);
        assert!(actions_for(Category::Menu, &links).is_empty());
    }

    #[test]
    fn test_action_wire_shape() {
        let action = Action {
            kind: ActionKind::Form,
            label: "Request Catering Quote".to_string(),
            url: "https://shop.test/catering-form".to_string(),
        };

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "form");
        assert_eq!(value["label"], "Request Catering Quote");
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(Category::GiftCards.as_str(), "giftcards");
        assert_eq!(Category::Inappropriate.to_string(), "inappropriate");
    }
}
