use serde::Deserialize;

/// What a matching rule does with a content element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// The element is a byline; its text replaces the chapter author.
    Author,
    /// The element is cross-link boilerplate and is dropped.
    Skip,
}

/// A substring rule over an element's rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextRule {
    pub pattern: String,
    pub action: RuleAction,
    #[serde(default)]
    pub ignore_case: bool,
}

impl TextRule {
    pub fn new(pattern: &str, action: RuleAction, ignore_case: bool) -> Self {
        Self {
            pattern: pattern.to_string(),
            action,
            ignore_case,
        }
    }

    /// Byte offset of the pattern in `text`, if present.
    pub fn find(&self, text: &str) -> Option<usize> {
        if self.ignore_case {
            // ASCII folding keeps byte offsets aligned with `text`.
            text.to_ascii_lowercase()
                .find(&self.pattern.to_ascii_lowercase())
        } else {
            text.find(&self.pattern)
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Turns a byline such as `Stories written by Kelly Digges.` into
    /// `By Kelly Digges`.
    pub fn byline(&self, text: &str) -> String {
        let rest = match self.find(text) {
            Some(start) => &text[start + self.pattern.len()..],
            None => text,
        };
        let name = rest
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation())
            .trim_end();
        format!("By {}", name)
    }
}

pub fn default_rules() -> Vec<TextRule> {
    vec![
        TextRule::new("Stories written by", RuleAction::Author, false),
        TextRule::new("previous story:", RuleAction::Skip, true),
        TextRule::new("previous episode:", RuleAction::Skip, true),
        TextRule::new("planeswalker profile", RuleAction::Skip, true),
    ]
}

/// Ordered rule list; the first matching rule decides.
#[derive(Debug, Clone)]
pub struct Rules(Vec<TextRule>);

impl Rules {
    pub fn new(rules: Vec<TextRule>) -> Self {
        Self(rules)
    }

    pub fn classify(&self, text: &str) -> Option<&TextRule> {
        self.0.iter().find(|rule| rule.matches(text))
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_links_are_skipped_regardless_of_case() {
        let rules = Rules::default();
        for text in [
            "Previous Story: Foo",
            "PREVIOUS EPISODE: The Gathering Storm",
            "Planeswalker Profile: Chandra Nalaar",
        ] {
            let rule = rules.classify(text).expect(text);
            assert_eq!(rule.action, RuleAction::Skip, "{text}");
        }
    }

    #[test]
    fn ordinary_prose_is_not_classified() {
        let rules = Rules::default();
        assert!(rules.classify("The story continues, as stories do.").is_none());
        assert!(rules.classify("She had no previous story to tell.").is_none());
    }

    #[test]
    fn author_marker_is_case_sensitive_by_default() {
        let rules = Rules::default();
        assert_eq!(
            rules.classify("Stories written by Kelly Digges.").map(|r| r.action),
            Some(RuleAction::Author)
        );
        assert!(rules.classify("stories written by nobody").is_none());
    }

    #[test]
    fn byline_strips_marker_and_trailing_punctuation() {
        let rule = TextRule::new("Stories written by", RuleAction::Author, false);
        assert_eq!(rule.byline("Stories written by Kelly Digges."), "By Kelly Digges");
        assert_eq!(
            rule.byline("  Stories written by Ari Levitch and Kelly Digges!  "),
            "By Ari Levitch and Kelly Digges"
        );
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = Rules::new(vec![
            TextRule::new("profile", RuleAction::Author, true),
            TextRule::new("planeswalker profile", RuleAction::Skip, true),
        ]);
        let rule = rules.classify("Planeswalker Profile").unwrap();
        assert_eq!(rule.action, RuleAction::Author);
    }
}
