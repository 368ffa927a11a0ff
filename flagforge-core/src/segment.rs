//! Segment rule evaluation
//!
//! A segment is a named, reusable identity-matching rule set. Rules form
//! a tree of Boolean combinators over conditions; the tree is stored as a
//! flat arena of rules addressed by index, with each rule's child list
//! owned exclusively by that rule. Evaluation walks the arena with a
//! visited set so an accidentally cyclic or dangling child reference is
//! reported as a structural error instead of recursing forever.

use crate::condition::{Condition, EvalContext};
use crate::error::SegmentEvaluationError;
use crate::value::Traits;
use serde::{Deserialize, Serialize};

/// Index of a rule inside its segment's arena
pub type RuleId = usize;

/// Boolean combinator of a rule node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleCombinator {
    /// Every child condition and child rule must match (vacuously true)
    All,

    /// At least one child condition or child rule must match (vacuously false)
    Any,

    /// No child condition or child rule may match (vacuously true)
    None,
}

/// One node of a segment's rule tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRule {
    pub combinator: RuleCombinator,

    /// Leaf conditions owned by this rule
    pub conditions: Vec<Condition>,

    /// Indices of nested rules owned by this rule
    #[serde(default)]
    children: Vec<RuleId>,
}

impl SegmentRule {
    pub fn new(combinator: RuleCombinator) -> Self {
        Self {
            combinator,
            conditions: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn children(&self) -> &[RuleId] {
        &self.children
    }
}

/// A named set of rule trees matched against identity traits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: u64,
    pub name: String,

    /// Arena of every rule in the segment, root or nested
    rules: Vec<SegmentRule>,

    /// Indices of the top-level rules, implicitly AND-ed together
    root_rules: Vec<RuleId>,
}

impl Segment {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rules: Vec::new(),
            root_rules: Vec::new(),
        }
    }

    /// Add a top-level rule, returning its id
    pub fn add_rule(&mut self, rule: SegmentRule) -> RuleId {
        let id = self.rules.len();
        self.rules.push(rule);
        self.root_rules.push(id);
        id
    }

    /// Add a rule nested under `parent`, returning the new rule's id
    ///
    /// The child is appended to the arena, so trees built through this
    /// API cannot contain cycles; the evaluation guard covers trees that
    /// arrive through deserialization instead.
    pub fn add_child_rule(
        &mut self,
        parent: RuleId,
        rule: SegmentRule,
    ) -> Result<RuleId, SegmentEvaluationError> {
        if parent >= self.rules.len() {
            return Err(SegmentEvaluationError::UnknownRule(parent));
        }
        let id = self.rules.len();
        self.rules.push(rule);
        self.rules[parent].children.push(id);
        Ok(id)
    }

    pub fn rule(&self, id: RuleId) -> Option<&SegmentRule> {
        self.rules.get(id)
    }

    pub fn root_rules(&self) -> &[RuleId] {
        &self.root_rules
    }

    /// Decide whether an identity belongs to this segment
    ///
    /// The segment matches iff it has at least one top-level rule and all
    /// top-level rules match. Pure function of the rule tree and the
    /// identity's traits.
    pub fn matches(
        &self,
        identifier: &str,
        traits: &Traits,
    ) -> Result<bool, SegmentEvaluationError> {
        if self.root_rules.is_empty() {
            return Ok(false);
        }

        let ctx = EvalContext::new(identifier, traits, self.id);
        let mut visited = vec![false; self.rules.len()];
        for &rule_id in &self.root_rules {
            if !self.rule_matches(rule_id, &ctx, &mut visited)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn rule_matches(
        &self,
        id: RuleId,
        ctx: &EvalContext<'_>,
        visited: &mut [bool],
    ) -> Result<bool, SegmentEvaluationError> {
        let rule = self
            .rules
            .get(id)
            .ok_or(SegmentEvaluationError::UnknownRule(id))?;
        if visited[id] {
            return Err(SegmentEvaluationError::CycleDetected(id));
        }
        visited[id] = true;

        let result = match rule.combinator {
            RuleCombinator::All => {
                let mut all = true;
                for condition in &rule.conditions {
                    all &= condition.matches(ctx);
                }
                for &child in &rule.children {
                    all &= self.rule_matches(child, ctx, visited)?;
                }
                all
            }
            RuleCombinator::Any | RuleCombinator::None => {
                let mut any = false;
                for condition in &rule.conditions {
                    any |= condition.matches(ctx);
                }
                for &child in &rule.children {
                    any |= self.rule_matches(child, ctx, visited)?;
                }
                match rule.combinator {
                    RuleCombinator::Any => any,
                    _ => !any,
                }
            }
        };

        // Distinct sibling subtrees may legitimately share nothing, but a
        // rule reached twice on any path is a cycle; clearing the mark on
        // the way out keeps the check path-scoped.
        visited[id] = false;
        Ok(result)
    }
}
