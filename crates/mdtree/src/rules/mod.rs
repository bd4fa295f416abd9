//! Rule system for DOM to tree conversion.

mod defaults;
mod rule;

pub use defaults::default_rules;
pub use rule::{AttrsFn, ContentMode, Filter, Rule, Target};

use indexmap::IndexMap;

use crate::node::DomNode;

/// Collection of parse rules
pub struct Rules {
    /// Custom rules added by the user (checked first)
    custom_rules: IndexMap<String, Rule>,
    /// Elements dropped together with their content
    ignore_rules: Vec<Filter>,
    /// Built-in Markdown rules
    default_rules: Vec<Rule>,
}

impl Rules {
    pub fn new() -> Self {
        Self {
            custom_rules: IndexMap::new(),
            ignore_rules: Vec::new(),
            default_rules: default_rules(),
        }
    }

    /// Add or replace a custom rule
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.insert(key.to_string(), rule);
    }

    pub fn ignore(&mut self, filter: Filter) {
        self.ignore_rules.push(filter);
    }

    /// Find the rule for an element: custom rules first, then defaults
    pub fn for_element(&self, element: &DomNode) -> Option<&Rule> {
        self.custom_rules
            .values()
            .chain(&self.default_rules)
            .find(|rule| rule.filter.matches(element))
    }

    /// Whether an element is dropped with everything inside it
    pub fn should_ignore(&self, element: &DomNode) -> bool {
        self.ignore_rules.iter().any(|f| f.matches(element))
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_rules_win() {
        let mut rules = Rules::new();
        let p = DomNode::element("p");
        assert_eq!(
            rules.for_element(&p).map(|r| &r.target),
            Some(&Target::Node("paragraph".to_string()))
        );

        rules.add("note", Rule::node(Filter::tag("p"), "note"));
        assert_eq!(
            rules.for_element(&p).map(|r| &r.target),
            Some(&Target::Node("note".to_string()))
        );
    }

    #[test]
    fn test_ignore() {
        let mut rules = Rules::new();
        let details = DomNode::element("details");
        assert!(!rules.should_ignore(&details));
        rules.ignore(Filter::tag("details"));
        assert!(rules.should_ignore(&details));
    }

    #[test]
    fn test_unmapped_element() {
        assert!(Rules::new().for_element(&DomNode::element("marquee")).is_none());
    }
}
