use serde::{Deserialize, Serialize};
use std::fmt;

/// Short label for one expected message kind (e.g. `P1`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A category together with the substrings that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub patterns: Vec<String>,
}

impl CategoryRule {
    pub fn new<I, S>(label: &str, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category: Category::new(label),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Maps free text to at most one category.
///
/// Rules are checked in configuration order and the first rule with any
/// matching pattern wins. Matching is a case-insensitive, unanchored
/// substring test: `"P1 "` also matches inside `"xP1 y"`.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<(Category, Vec<String>)>,
}

impl Classifier {
    pub fn new(rules: &[CategoryRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                let lowered = rule.patterns.iter().map(|p| p.to_lowercase()).collect();
                (rule.category.clone(), lowered)
            })
            .collect();
        Self { rules }
    }

    pub fn classify(&self, text: Option<&str>) -> Option<Category> {
        let text = text.filter(|t| !t.is_empty())?;
        let lowered = text.to_lowercase();

        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| lowered.contains(p.as_str())))
            .map(|(category, _)| category.clone())
    }

    /// The full category set, in configuration order.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.rules.iter().map(|(category, _)| category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Classifier {
        Classifier::new(&[
            CategoryRule::new("P1", ["P1 "]),
            CategoryRule::new("P2", ["P2 "]),
            CategoryRule::new("P3", ["P3 "]),
            CategoryRule::new("P4", ["P4 "]),
        ])
    }

    #[test]
    fn absent_or_empty_text_has_no_category() {
        let classifier = reference();
        assert_eq!(classifier.classify(None), None);
        assert_eq!(classifier.classify(Some("")), None);
    }

    #[test]
    fn matches_case_insensitively() {
        let classifier = reference();
        assert_eq!(
            classifier.classify(Some("p2 reading 41.2")),
            Some(Category::new("P2"))
        );
        assert_eq!(
            classifier.classify(Some("Status P4 ok")),
            Some(Category::new("P4"))
        );
    }

    #[test]
    fn unmatched_and_short_text_has_no_category() {
        let classifier = reference();
        assert_eq!(classifier.classify(Some("P1")), None);
        assert_eq!(classifier.classify(Some("x")), None);
        assert_eq!(classifier.classify(Some("nothing relevant here")), None);
        assert_eq!(classifier.classify(Some("Zählerstand ✅ 日本語")), None);
    }

    #[test]
    fn unicode_text_around_pattern_still_matches() {
        let classifier = reference();
        assert_eq!(
            classifier.classify(Some("✅ P3 Ölstand 日本")),
            Some(Category::new("P3"))
        );
    }

    #[test]
    fn earlier_rule_wins_when_several_match() {
        let classifier = reference();
        assert_eq!(
            classifier.classify(Some("P3 and P1 both present")),
            Some(Category::new("P1"))
        );

        let overlapping = Classifier::new(&[
            CategoryRule::new("short", ["ab"]),
            CategoryRule::new("long", ["abc"]),
        ]);
        assert_eq!(
            overlapping.classify(Some("xxabcxx")),
            Some(Category::new("short"))
        );
    }

    #[test]
    fn substring_match_is_unanchored() {
        let classifier = reference();
        assert_eq!(
            classifier.classify(Some("GROUPP1 done")),
            Some(Category::new("P1"))
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = reference();
        let text = Some("hello P2 world");
        let first = classifier.classify(text);
        for _ in 0..10 {
            assert_eq!(classifier.classify(text), first);
        }
    }

    #[test]
    fn categories_follow_configuration_order() {
        let classifier = Classifier::new(&[
            CategoryRule::new("B", ["b"]),
            CategoryRule::new("A", ["a"]),
        ]);
        let labels: Vec<&str> = classifier.categories().map(Category::label).collect();
        assert_eq!(labels, vec!["B", "A"]);
    }
}
