//! Prefix matching over a unit's topic links, for context suggestions.

use regex::Regex;

use curricle_shared::UnitTopic;

/// Compile a case-insensitive prefix matcher. The prefix is matched
/// literally, so `C++` means those three characters.
pub fn prefix_pattern(prefix: &str) -> Option<Regex> {
    let escaped = regex::escape(prefix.trim());
    Regex::new(&format!("(?i)^{escaped}")).ok()
}

/// The links whose topic name starts with `prefix`, in input order.
/// A blank prefix matches every link.
pub fn match_topics<'a>(links: &'a [UnitTopic], prefix: &str) -> Vec<&'a UnitTopic> {
    match prefix_pattern(prefix) {
        Some(pattern) => links
            .iter()
            .filter(|link| pattern.is_match(&link.topic.name))
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curricle_shared::{Topic, TopicId};

    fn link(id: i64, name: &str) -> UnitTopic {
        UnitTopic {
            id,
            alias: None,
            is_taught: false,
            is_assessed: false,
            is_applied: false,
            topic: Topic {
                id: TopicId(id),
                name: name.to_string(),
                categories: Vec::new(),
            },
            contexts: Vec::new(),
        }
    }

    #[test]
    fn matches_prefix_case_insensitively() {
        let links = vec![
            link(1, "Graph theory"),
            link(2, "Recursion"),
            link(3, "graph colouring"),
        ];

        let matched = match_topics(&links, "graph");
        let names: Vec<_> = matched.iter().map(|l| l.topic.name.as_str()).collect();
        assert_eq!(names, ["Graph theory", "graph colouring"]);
    }

    #[test]
    fn prefix_is_literal_not_a_pattern() {
        let links = vec![link(1, "C++"), link(2, "C"), link(3, "C (programming language)")];

        let matched = match_topics(&links, "C++");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].topic.name, "C++");
    }

    #[test]
    fn blank_prefix_matches_everything() {
        let links = vec![link(1, "Graph theory"), link(2, "Recursion")];
        assert_eq!(match_topics(&links, "  ").len(), 2);
    }

    #[test]
    fn no_match_yields_empty() {
        let links = vec![link(1, "Graph theory")];
        assert!(match_topics(&links, "calculus").is_empty());
    }
}
