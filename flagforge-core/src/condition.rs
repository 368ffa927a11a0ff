//! Condition evaluation
//!
//! A condition is the leaf test of a segment rule: one trait key, one
//! operator, one operand. Anything that cannot be evaluated cleanly (a
//! missing trait, an operand that does not parse into the trait's type,
//! an invalid regex) fails closed: the condition does not match, it never
//! errors.

use crate::bucketing;
use crate::value::{TraitValue, Traits};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Comparison operator for a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanInclusive,
    LessThan,
    LessThanInclusive,
    Contains,
    NotContains,
    Regex,
    PercentageSplit,
}

/// Everything a condition needs to evaluate against one identity
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The identity's identifier, used for percentage splits
    pub identifier: &'a str,

    /// The identity's traits
    pub traits: &'a Traits,

    /// Seed for percentage splits, normally the owning segment's id, so
    /// each segment buckets the population independently
    pub bucket_seed: u64,
}

impl<'a> EvalContext<'a> {
    pub fn new(identifier: &'a str, traits: &'a Traits, bucket_seed: u64) -> Self {
        Self {
            identifier,
            traits,
            bucket_seed,
        }
    }
}

/// A leaf test against one identity trait
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Trait key to look up on the identity
    pub trait_key: String,

    /// Operator
    pub operator: Operator,

    /// Operand value, parsed into the trait's type at evaluation time
    pub operand: String,
}

impl Condition {
    pub fn new(
        trait_key: impl Into<String>,
        operator: Operator,
        operand: impl Into<String>,
    ) -> Self {
        Self {
            trait_key: trait_key.into(),
            operator,
            operand: operand.into(),
        }
    }

    /// Evaluate this condition for one identity
    pub fn matches(&self, ctx: &EvalContext<'_>) -> bool {
        match self.operator {
            // Percentage splits bucket on the identifier, not a trait.
            Operator::PercentageSplit => match self.operand.parse::<f64>() {
                Ok(threshold) => {
                    let seed = ctx.bucket_seed.to_string();
                    bucketing::percentage_for(&[&seed, ctx.identifier]) < threshold
                }
                Err(_) => false,
            },
            _ => {
                let Some(value) = ctx.traits.get(&self.trait_key) else {
                    return false;
                };
                self.matches_value(value)
            }
        }
    }

    fn matches_value(&self, value: &TraitValue) -> bool {
        match self.operator {
            Operator::Equal => self.ordering_with(value) == Some(Ordering::Equal),
            Operator::NotEqual => matches!(
                self.ordering_with(value),
                Some(Ordering::Less) | Some(Ordering::Greater)
            ),
            Operator::GreaterThan => self.ordering_with(value) == Some(Ordering::Greater),
            Operator::GreaterThanInclusive => matches!(
                self.ordering_with(value),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            Operator::LessThan => self.ordering_with(value) == Some(Ordering::Less),
            Operator::LessThanInclusive => matches!(
                self.ordering_with(value),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            Operator::Contains => value.to_string().contains(&self.operand),
            Operator::NotContains => !value.to_string().contains(&self.operand),
            Operator::Regex => regex::Regex::new(&self.operand)
                .map(|re| re.is_match(&value.to_string()))
                .unwrap_or(false),
            Operator::PercentageSplit => false,
        }
    }

    /// Compare the trait value with the operand cast into the trait's type
    ///
    /// Returns `None` when the operand does not parse, which makes every
    /// ordering operator fail closed.
    fn ordering_with(&self, value: &TraitValue) -> Option<Ordering> {
        match value {
            TraitValue::Int(v) => self.operand.parse::<i64>().ok().map(|op| v.cmp(&op)),
            TraitValue::Float(v) => self
                .operand
                .parse::<f64>()
                .ok()
                .and_then(|op| v.partial_cmp(&op)),
            TraitValue::Bool(v) => self.operand.parse::<bool>().ok().map(|op| v.cmp(&op)),
            TraitValue::String(v) => Some(v.as_str().cmp(self.operand.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(traits: &'a Traits) -> EvalContext<'a> {
        EvalContext::new("user-1", traits, 1)
    }

    #[test]
    fn test_equal_on_strings() {
        let traits: Traits = [("plan", "pro")].into_iter().collect();
        assert!(Condition::new("plan", Operator::Equal, "pro").matches(&ctx(&traits)));
        assert!(!Condition::new("plan", Operator::Equal, "free").matches(&ctx(&traits)));
    }

    #[test]
    fn test_missing_trait_fails_closed() {
        let traits = Traits::new();
        assert!(!Condition::new("plan", Operator::Equal, "pro").matches(&ctx(&traits)));
        assert!(!Condition::new("age", Operator::GreaterThan, "21").matches(&ctx(&traits)));
    }

    #[test]
    fn test_numeric_comparison_uses_trait_type() {
        let traits: Traits = [("age", 30i64)].into_iter().collect();
        assert!(Condition::new("age", Operator::GreaterThan, "21").matches(&ctx(&traits)));
        assert!(Condition::new("age", Operator::LessThanInclusive, "30").matches(&ctx(&traits)));
        assert!(!Condition::new("age", Operator::LessThan, "30").matches(&ctx(&traits)));
    }

    #[test]
    fn test_non_numeric_operand_fails_closed() {
        let traits: Traits = [("age", 30i64)].into_iter().collect();
        assert!(!Condition::new("age", Operator::GreaterThan, "not-a-number").matches(&ctx(&traits)));
        assert!(!Condition::new("age", Operator::Equal, "thirty").matches(&ctx(&traits)));
    }

    #[test]
    fn test_float_traits_compare_against_parsed_operand() {
        let traits: Traits = [("score", 0.75f64)].into_iter().collect();
        assert!(Condition::new("score", Operator::GreaterThanInclusive, "0.75").matches(&ctx(&traits)));
        assert!(!Condition::new("score", Operator::GreaterThan, "0.75").matches(&ctx(&traits)));
    }

    #[test]
    fn test_contains() {
        let traits: Traits = [("email", "dev@example.com")].into_iter().collect();
        assert!(Condition::new("email", Operator::Contains, "@example.").matches(&ctx(&traits)));
        assert!(Condition::new("email", Operator::NotContains, "@corp.").matches(&ctx(&traits)));
    }

    #[test]
    fn test_regex() {
        let traits: Traits = [("email", "dev@example.com")].into_iter().collect();
        assert!(Condition::new("email", Operator::Regex, r".+@example\.com$").matches(&ctx(&traits)));
        // Invalid pattern fails closed rather than erroring.
        assert!(!Condition::new("email", Operator::Regex, "(unclosed").matches(&ctx(&traits)));
    }

    #[test]
    fn test_percentage_split_is_deterministic() {
        let traits = Traits::new();
        let condition = Condition::new("", Operator::PercentageSplit, "50");
        let first = condition.matches(&ctx(&traits));
        for _ in 0..50 {
            assert_eq!(condition.matches(&ctx(&traits)), first);
        }
    }

    #[test]
    fn test_percentage_split_boundaries() {
        let traits = Traits::new();
        assert!(!Condition::new("", Operator::PercentageSplit, "0").matches(&ctx(&traits)));
        assert!(Condition::new("", Operator::PercentageSplit, "100").matches(&ctx(&traits)));
        // A non-numeric threshold fails closed.
        assert!(!Condition::new("", Operator::PercentageSplit, "half").matches(&ctx(&traits)));
    }
}
