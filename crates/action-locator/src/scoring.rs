//! Candidate scoring and ranking

use std::cmp::Ordering;

use selfheal_core_types::{LocatorDescriptor, LocatorStrategy};

/// Base weight per strategy. Role and label locators survive DOM
/// restructuring better than text or raw selectors.
pub fn strategy_weight(strategy: LocatorStrategy) -> f64 {
    match strategy {
        LocatorStrategy::Role => 100.0,
        LocatorStrategy::Label => 95.0,
        LocatorStrategy::Placeholder => 90.0,
        LocatorStrategy::Text => 70.0,
        LocatorStrategy::Css => 40.0,
        LocatorStrategy::Xpath => 20.0,
        _ => 10.0,
    }
}

pub fn landmark_bonus(landmark: Option<&str>) -> f64 {
    match landmark {
        Some("main") => 30.0,
        Some("search") => 25.0,
        Some("navigation") => 15.0,
        Some("banner") => 5.0,
        Some("contentinfo") => -20.0,
        _ => 0.0,
    }
}

fn widget_bonus(role: &str) -> f64 {
    match role {
        "button" => 30.0,
        "combobox" | "textbox" => 25.0,
        "checkbox" | "radio" => 20.0,
        "link" => 15.0,
        _ => 0.0,
    }
}

/// Widget bonus keyed by the descriptor value; role locators whose value is
/// the accessible name fall back to their role.
pub fn role_bonus(descriptor: &LocatorDescriptor) -> f64 {
    let by_value = widget_bonus(&descriptor.value);
    if by_value != 0.0 {
        return by_value;
    }
    descriptor
        .role
        .map(|role| widget_bonus(role.as_str()))
        .unwrap_or(0.0)
}

/// Scores the descriptor and stores the result in its `rank`.
pub fn score_locator(descriptor: &mut LocatorDescriptor) -> f64 {
    let raw = strategy_weight(descriptor.strategy)
        + landmark_bonus(descriptor.landmark.as_deref())
        + role_bonus(descriptor);
    let rank = (raw * 100.0).round() / 100.0;
    descriptor.rank = rank;
    rank
}

/// Scored copy sorted by descending rank. Ties keep input order.
pub fn rank_locators(locators: &[LocatorDescriptor]) -> Vec<LocatorDescriptor> {
    let mut ranked: Vec<LocatorDescriptor> = locators
        .iter()
        .cloned()
        .map(|mut locator| {
            score_locator(&mut locator);
            locator
        })
        .collect();
    ranked.sort_by(|a, b| b.rank.partial_cmp(&a.rank).unwrap_or(Ordering::Equal));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfheal_core_types::AriaRole;

    #[test]
    fn landmark_role_outranks_bare_selector() {
        let mut role = LocatorDescriptor::role(AriaRole::Button, "Log in")
            .with_landmark(Some("main".to_string()));
        let mut css = LocatorDescriptor::css("#login");
        assert_eq!(score_locator(&mut role), 160.0);
        assert_eq!(score_locator(&mut css), 40.0);
        assert_eq!(role.rank, 160.0);
    }

    #[test]
    fn bonus_keyed_by_value() {
        let mut scoped = LocatorDescriptor::scoped_role("navigation", AriaRole::Link, None);
        assert_eq!(score_locator(&mut scoped), 10.0 + 15.0 + 15.0);

        let mut footer_text = LocatorDescriptor::text("button")
            .with_landmark(Some("contentinfo".to_string()));
        assert_eq!(score_locator(&mut footer_text), 70.0 - 20.0 + 30.0);
    }

    #[test]
    fn ranking_is_stable_and_descending() {
        let locators = vec![
            LocatorDescriptor::css("#a"),
            LocatorDescriptor::text("Save").with_landmark(Some("contentinfo".to_string())),
            LocatorDescriptor::label("Email"),
            LocatorDescriptor::css("#b"),
        ];
        let ranked = rank_locators(&locators);
        let values: Vec<_> = ranked.iter().map(|l| (l.value.as_str(), l.rank)).collect();
        assert_eq!(
            values,
            vec![("Email", 95.0), ("Save", 50.0), ("#a", 40.0), ("#b", 40.0)]
        );
        assert_eq!(locators[0].rank, 0.0);
    }
}
