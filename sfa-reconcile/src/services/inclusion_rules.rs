//! Per-field inclusion rules
//!
//! Decides whether a record is expected to have a recording for a field.
//!
//! **Rule lookup:**
//! 1. A rule keyed by the field itself
//! 2. Otherwise the rule of the first group (by name) listing the field
//! 3. Otherwise no rule: the field is included
//!
//! With `include_empty_fields` off, a field without a rule is only included
//! when the record has a non-empty value for it.

use crate::models::Record;
use crate::services::expectation_engine::InclusionPolicy;
use sfa_common::config::TomlConfig;
use sfa_common::rules::{Condition, Logic, Operator, Rule};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: BTreeMap<String, Rule>,
    groups: BTreeMap<String, Vec<String>>,
    group_rules: BTreeMap<String, Rule>,
    include_empty_fields: bool,
}

impl RuleSet {
    pub fn new() -> Self {
        Self {
            rules: BTreeMap::new(),
            groups: BTreeMap::new(),
            group_rules: BTreeMap::new(),
            include_empty_fields: true,
        }
    }

    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            rules: config.rules.clone(),
            groups: config.groups.clone(),
            group_rules: config.group_rules.clone(),
            include_empty_fields: config.include_empty_fields,
        }
    }

    pub fn with_rule(mut self, field: impl Into<String>, rule: Rule) -> Self {
        self.rules.insert(field.into(), rule);
        self
    }

    pub fn with_group<I, S>(mut self, group: impl Into<String>, fields: I, rule: Rule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = group.into();
        self.groups
            .insert(group.clone(), fields.into_iter().map(Into::into).collect());
        self.group_rules.insert(group, rule);
        self
    }

    pub fn include_empty_fields(mut self, include: bool) -> Self {
        self.include_empty_fields = include;
        self
    }

    /// Effective rule for a field: field rule first, then group rule
    pub fn rule_for(&self, field: &str) -> Option<&Rule> {
        if let Some(rule) = self.rules.get(field) {
            return Some(rule);
        }

        self.groups
            .iter()
            .filter(|(_, members)| members.iter().any(|m| m == field))
            .find_map(|(group, _)| self.group_rules.get(group))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl InclusionPolicy for RuleSet {
    fn includes(&self, record: &Record, field: &str) -> bool {
        match self.rule_for(field) {
            Some(rule) => evaluate_rule(rule, record),
            None => self.include_empty_fields || !record.value(field).trim().is_empty(),
        }
    }
}

/// Evaluate a rule against a record; an empty condition list is true
pub fn evaluate_rule(rule: &Rule, record: &Record) -> bool {
    if rule.conditions.is_empty() {
        return true;
    }

    match rule.logic {
        Logic::And => rule.conditions.iter().all(|c| evaluate_condition(c, record)),
        Logic::Or => rule.conditions.iter().any(|c| evaluate_condition(c, record)),
    }
}

/// Evaluate one condition; a missing field reads as empty
pub fn evaluate_condition(condition: &Condition, record: &Record) -> bool {
    let actual = record.value(&condition.field).trim();
    let expected = condition.value.as_deref().unwrap_or("").trim();

    match condition.operator {
        Operator::Equals => actual == expected,
        Operator::NotEquals => actual != expected,
        Operator::Contains => actual.to_lowercase().contains(&expected.to_lowercase()),
        Operator::NotEmpty => !actual.is_empty(),
        Operator::Empty => actual.is_empty(),
        Operator::InList => condition.values.iter().any(|v| v.trim() == actual),
        Operator::NotInList => !condition.values.iter().any(|v| v.trim() == actual),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record::from_pairs([
            ("Reference", "0021"),
            ("Gloss", "Big Dog"),
            ("Category", " noun "),
            ("Plural", ""),
        ])
    }

    #[test]
    fn test_operators() {
        let r = record();
        let check = |c: Condition| evaluate_condition(&c, &r);

        assert!(check(Condition::new("Category", Operator::Equals).with_value("noun")));
        assert!(!check(Condition::new("Category", Operator::Equals).with_value("Noun")));
        assert!(check(Condition::new("Category", Operator::NotEquals).with_value("verb")));
        assert!(check(Condition::new("Gloss", Operator::Contains).with_value("dog")));
        assert!(check(Condition::new("Gloss", Operator::NotEmpty)));
        assert!(check(Condition::new("Plural", Operator::Empty)));
        assert!(check(Condition::new("Missing", Operator::Empty)));
        assert!(check(
            Condition::new("Category", Operator::InList).with_values(["verb", "noun"])
        ));
        assert!(check(
            Condition::new("Category", Operator::NotInList).with_values(["verb", "adj"])
        ));
    }

    #[test]
    fn test_empty_rule_is_true_under_both_logics() {
        let r = record();
        assert!(evaluate_rule(&Rule::all(vec![]), &r));
        assert!(evaluate_rule(&Rule::any(vec![]), &r));
    }

    #[test]
    fn test_and_or_logic() {
        let r = record();
        let yes = Condition::new("Gloss", Operator::NotEmpty);
        let no = Condition::new("Plural", Operator::NotEmpty);

        assert!(!evaluate_rule(&Rule::all(vec![yes.clone(), no.clone()]), &r));
        assert!(evaluate_rule(&Rule::any(vec![yes, no]), &r));
    }

    #[test]
    fn test_field_rule_beats_group_rule() {
        let never = Rule::all(vec![Condition::new("Gloss", Operator::Empty)]);
        let always = Rule::all(vec![]);
        let rules = RuleSet::new()
            .with_group("nouns", ["Plural", "Diminutive"], never)
            .with_rule("Plural", always);

        let r = record();
        assert!(rules.includes(&r, "Plural"));
        assert!(!rules.includes(&r, "Diminutive"));
        assert!(rules.includes(&r, "Phonetic"));
    }

    #[test]
    fn test_no_rule_with_empty_fields_excluded() {
        let rules = RuleSet::new().include_empty_fields(false);
        let r = record();
        assert!(rules.includes(&r, "Gloss"));
        assert!(!rules.includes(&r, "Plural"));
        assert!(!rules.includes(&r, "Missing"));
    }
}
