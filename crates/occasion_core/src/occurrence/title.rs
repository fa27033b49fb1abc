//! Title rendering for occurrences.
//!
//! # Responsibility
//! - Pick the label template for a category/age-display pair.
//! - Mark jubilee ages and interpolate `{name}`, `{label}`, `{age}`.
//!
//! # Invariants
//! - Substitution is single-pass: placeholder text inside a contact name is
//!   never expanded.
//! - A custom date without a usable label renders with the `other` template.

use crate::config::{LabelTemplates, SyncConfig};
use crate::model::record::EventCategory;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(name|label|age)\}").expect("valid placeholder regex"));

/// Renders occurrence titles from configured templates.
#[derive(Debug, Clone)]
pub struct TitleGenerator<'cfg> {
    templates: &'cfg LabelTemplates,
    jubilee_ages: &'cfg BTreeSet<i32>,
    jubilee_marker: &'cfg str,
    unknown_name: &'cfg str,
}

impl<'cfg> TitleGenerator<'cfg> {
    pub fn new(config: &'cfg SyncConfig) -> Self {
        Self {
            templates: &config.templates,
            jubilee_ages: &config.jubilee_ages,
            jubilee_marker: config.jubilee_marker.as_str(),
            unknown_name: config.unknown_name.as_str(),
        }
    }

    /// Renders one title.
    pub fn render(
        &self,
        category: EventCategory,
        custom_label: Option<&str>,
        display_name: Option<&str>,
        age: i32,
        include_age: bool,
    ) -> String {
        let label = custom_label.map(str::trim).filter(|value| !value.is_empty());
        let effective = match (category, label) {
            (EventCategory::Custom, None) => EventCategory::Other,
            (category, _) => category,
        };
        let template = self.templates.template(effective, include_age);

        let base_name = display_name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(self.unknown_name);
        let name = if include_age && self.is_jubilee(age) {
            format!("{}{}", self.jubilee_marker, base_name)
        } else {
            base_name.to_string()
        };

        PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
                "name" => name.clone(),
                "label" => label.unwrap_or_default().to_string(),
                _ => age.to_string(),
            })
            .into_owned()
    }

    pub fn is_jubilee(&self, age: i32) -> bool {
        self.jubilee_ages.contains(&age)
    }
}

#[cfg(test)]
mod tests {
    use super::TitleGenerator;
    use crate::config::SyncConfig;
    use crate::model::record::EventCategory;

    #[test]
    fn jubilee_age_prepends_marker() {
        let config = SyncConfig::default();
        let titles = TitleGenerator::new(&config);
        let jubilee = titles.render(EventCategory::Birthday, None, Some("Ada"), 50, true);
        assert_eq!(jubilee, "\u{2605} Ada's birthday (50)");
        let plain = titles.render(EventCategory::Birthday, None, Some("Ada"), 49, true);
        assert_eq!(plain, "Ada's birthday (49)");
    }

    #[test]
    fn jubilee_marker_requires_age_display() {
        let config = SyncConfig::default();
        let titles = TitleGenerator::new(&config);
        let title = titles.render(EventCategory::Birthday, None, Some("Ada"), 50, false);
        assert_eq!(title, "Ada's birthday");
    }

    #[test]
    fn custom_without_label_falls_back_to_other() {
        let config = SyncConfig::default();
        let titles = TitleGenerator::new(&config);
        let with_label =
            titles.render(EventCategory::Custom, Some("Name day"), Some("Ada"), 3, true);
        assert_eq!(with_label, "Ada: Name day (3)");
        let blank = titles.render(EventCategory::Custom, Some("  "), Some("Ada"), 3, false);
        assert_eq!(blank, "Ada's event");
    }

    #[test]
    fn missing_name_uses_configured_fallback() {
        let config = SyncConfig::default();
        let titles = TitleGenerator::new(&config);
        let title = titles.render(EventCategory::Anniversary, None, None, 0, false);
        assert_eq!(title, "Unknown's anniversary");
    }

    #[test]
    fn placeholders_inside_names_are_not_expanded() {
        let config = SyncConfig::default();
        let titles = TitleGenerator::new(&config);
        let title = titles.render(EventCategory::Birthday, None, Some("{age}"), 7, true);
        assert_eq!(title, "{age}'s birthday (7)");
    }

    #[test]
    fn custom_templates_control_substitution_order() {
        let mut config = SyncConfig::default();
        config.templates.birthday_with_age = "{age}. Geburtstag von {name}".to_string();
        let titles = TitleGenerator::new(&config);
        let title = titles.render(EventCategory::Birthday, None, Some("Ada"), 36, true);
        assert_eq!(title, "36. Geburtstag von Ada");
    }
}
