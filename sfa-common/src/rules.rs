//! Conditional expectation rule definitions
//!
//! A rule decides whether a record is expected to carry a recording for a
//! field. Rules are plain data here; evaluation lives with the expectation
//! engine.

use serde::{Deserialize, Serialize};

/// How the conditions of a rule combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Logic {
    #[default]
    And,
    Or,
}

/// Comparison applied to a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    /// Case-insensitive substring
    Contains,
    NotEmpty,
    Empty,
    InList,
    NotInList,
}

/// Atomic condition over one record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    /// Comparison value for `equals`, `not_equals` and `contains`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Candidate values for `in_list` and `not_in_list`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator) -> Self {
        Self {
            field: field.into(),
            operator,
            value: None,
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }
}

/// Conjunction or disjunction of conditions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self {
            logic: Logic::And,
            conditions,
        }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Self {
            logic: Logic::Or,
            conditions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_from_toml() {
        let rule: Rule = toml::from_str(
            r#"
            logic = "or"
            conditions = [
                { field = "Category", operator = "in_list", values = ["noun", "verb"] },
                { field = "Tone", operator = "not_empty" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(rule.logic, Logic::Or);
        assert_eq!(rule.conditions.len(), 2);
        assert_eq!(rule.conditions[0].operator, Operator::InList);
        assert_eq!(rule.conditions[0].values, vec!["noun", "verb"]);
        assert!(rule.conditions[1].value.is_none());
    }

    #[test]
    fn test_logic_defaults_to_and() {
        let rule: Rule = toml::from_str("conditions = []").unwrap();
        assert_eq!(rule.logic, Logic::And);
    }
}
