//! Assignment of one category per event, and the overall pass/fail decision
//!
//! Categories are assigned by an ordered list of rules. Every event starts
//! uncategorized, then each rule, in declaration order, overwrites the running
//! category of the events that it matches. The final category of an event is
//! thus the code of the *last* rule that matched it, no matter which codes the
//! earlier rules carried.

use crate::error::{Result, SelectionError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Category of events which no rule matched
pub const UNCATEGORIZED: i64 = 0;

/// Comparison of a per-event quantity against a constant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}
//
impl Comparison {
    /// Truth that `lhs <op> rhs` holds
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

/// Elementary requirement on one named per-event quantity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Requirement {
    /// Name of the quantity (object count or 0/1 flag)
    pub of: String,
    /// How it is compared
    pub cmp: Comparison,
    /// What it is compared to
    pub value: i64,
}
//
impl Requirement {
    /// Quantity must equal a value
    pub fn eq(of: &str, value: i64) -> Self {
        Self {
            of: of.to_owned(),
            cmp: Comparison::Eq,
            value,
        }
    }

    /// Quantity must be at least a value
    pub fn at_least(of: &str, value: i64) -> Self {
        Self {
            of: of.to_owned(),
            cmp: Comparison::Ge,
            value,
        }
    }

    /// Flag must be set (or unset)
    pub fn flag(of: &str, is: bool) -> Self {
        Self::eq(of, i64::from(is))
    }
}

/// Composite predicate (AND of requirements) paired with a category code
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRule {
    /// Name under which the rule's mask is reported
    pub name: String,
    /// Category assigned to matching events
    pub code: i64,
    /// Requirements which must all hold
    pub require: Vec<Requirement>,
}
//
impl CategoryRule {
    /// Build a rule
    pub fn new(name: &str, code: i64, require: Vec<Requirement>) -> Self {
        Self {
            name: name.to_owned(),
            code,
            require,
        }
    }
}

/// Per-event integer quantities which category rules can refer to
#[derive(Clone, Debug, Default)]
pub struct Quantities {
    num_events: usize,
    values: BTreeMap<String, Vec<i64>>,
}
//
impl Quantities {
    /// Prepare storage for quantities of a number of events
    pub fn new(num_events: usize) -> Self {
        Self {
            num_events,
            values: BTreeMap::new(),
        }
    }

    /// Record an object count
    pub fn insert_count(&mut self, name: &str, counts: &[usize]) {
        assert_eq!(counts.len(), self.num_events);
        let values = counts.iter().map(|&c| c as i64).collect();
        self.values.insert(name.to_owned(), values);
    }

    /// Record a per-event flag (as 0 or 1)
    pub fn insert_flag(&mut self, name: &str, flags: &[bool]) {
        assert_eq!(flags.len(), self.num_events);
        let values = flags.iter().map(|&f| i64::from(f)).collect();
        self.values.insert(name.to_owned(), values);
    }

    /// Look up a quantity
    pub fn get(&self, name: &str) -> Option<&[i64]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Number of events
    pub fn num_events(&self) -> usize {
        self.num_events
    }
}

/// Per-event boolean decision, retrievable by name for cut-flow accounting
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedMask {
    pub name: String,
    pub mask: Vec<bool>,
}

/// Result of running the category cascade
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Categorization {
    /// Final category code of each event
    pub category: Vec<i64>,
    /// Mask of each rule, in declaration order
    pub rule_masks: Vec<NamedMask>,
}

/// Ordered list of category rules
#[derive(Clone, Debug)]
pub struct Cascade {
    rules: Vec<CategoryRule>,
}
//
impl Cascade {
    /// Set up a cascade, checking that its rules are well-formed
    ///
    /// `key` is the configuration path of the rule list, used in errors.
    ///
    pub fn new(rules: Vec<CategoryRule>, key: &str) -> Result<Self> {
        Self::validate(&rules, key)?;
        Ok(Self { rules })
    }

    /// Check that a rule list is well-formed
    pub fn validate(rules: &[CategoryRule], key: &str) -> Result<()> {
        if rules.is_empty() {
            return Err(SelectionError::config(key, "at least one rule is needed"));
        }
        let mut names = BTreeSet::new();
        for rule in rules {
            let rule_key = format!("{key}.{}", rule.name);
            if !names.insert(rule.name.as_str()) {
                return Err(SelectionError::config(rule_key, "duplicate rule name"));
            }
            if rule.code == UNCATEGORIZED {
                return Err(SelectionError::config(
                    rule_key,
                    format!("code {UNCATEGORIZED} is reserved for uncategorized events"),
                ));
            }
            if rule.require.is_empty() {
                return Err(SelectionError::config(
                    rule_key,
                    "a rule needs at least one requirement",
                ));
            }
        }
        Ok(())
    }

    /// Rules, in declaration order
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Check that every quantity which the rules refer to is available
    ///
    /// This runs before any per-event computation, so that a misconfigured
    /// cascade fails as a whole instead of producing partial results.
    ///
    pub fn check_inputs(&self, available: &[&str], key: &str) -> Result<()> {
        for rule in &self.rules {
            for req in &rule.require {
                if !available.contains(&req.of.as_str()) {
                    return Err(SelectionError::config(
                        format!("{key}.{}", rule.name),
                        format!(
                            "unknown quantity `{}` (available: {})",
                            req.of,
                            available.join(", ")
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Assign a category to every event
    pub fn evaluate(&self, quantities: &Quantities) -> Result<Categorization> {
        let num_events = quantities.num_events();
        let mut category = vec![UNCATEGORIZED; num_events];
        let mut rule_masks = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let mut mask = vec![true; num_events];
            for req in &rule.require {
                let values = quantities.get(&req.of).ok_or_else(|| {
                    SelectionError::config(&rule.name, format!("unknown quantity `{}`", req.of))
                })?;
                for (keep, &value) in mask.iter_mut().zip(values) {
                    *keep &= req.cmp.holds(value, req.value);
                }
            }
            // Later rules override earlier ones
            for (code, &matched) in category.iter_mut().zip(&mask) {
                if matched {
                    *code = rule.code;
                }
            }
            rule_masks.push(NamedMask {
                name: rule.name.clone(),
                mask,
            });
        }
        Ok(Categorization {
            category,
            rule_masks,
        })
    }
}

/// Overall pass/fail decision, as the AND of named gating predicates
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gating {
    pass: Vec<bool>,
    gates: Vec<NamedMask>,
}
//
impl Gating {
    /// Start with every event passing
    pub fn new(num_events: usize) -> Self {
        Self {
            pass: vec![true; num_events],
            gates: Vec::new(),
        }
    }

    /// Add a gating predicate
    pub fn require(&mut self, name: &str, mask: Vec<bool>) {
        assert_eq!(mask.len(), self.pass.len());
        for (pass, &keep) in self.pass.iter_mut().zip(&mask) {
            *pass &= keep;
        }
        self.gates.push(NamedMask {
            name: name.to_owned(),
            mask,
        });
    }

    /// Final decision
    pub fn pass(&self) -> &[bool] {
        &self.pass
    }

    /// Individual gates, in the order they were added
    pub fn gates(&self) -> &[NamedMask] {
        &self.gates
    }

    /// Look up one gate by name
    pub fn gate(&self, name: &str) -> Option<&[bool]> {
        self.gates
            .iter()
            .find(|gate| gate.name == name)
            .map(|gate| gate.mask.as_slice())
    }

    /// Decompose into final decision and individual gates
    pub fn into_parts(self) -> (Vec<bool>, Vec<NamedMask>) {
        (self.pass, self.gates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(events: &[[bool; 3]]) -> Quantities {
        let mut q = Quantities::new(events.len());
        for p in 0..3 {
            let column: Vec<bool> = events.iter().map(|e| e[p]).collect();
            q.insert_flag(&format!("P{}", p + 1), &column);
        }
        q
    }

    fn three_rules() -> Cascade {
        let rules = (1..=3)
            .map(|i| {
                let name = format!("P{i}");
                CategoryRule::new(&name, i, vec![Requirement::flag(&name, true)])
            })
            .collect();
        Cascade::new(rules, "categories").unwrap()
    }

    #[test]
    fn last_matching_rule_wins() {
        let cascade = three_rules();
        let q = flags(&[
            [true, false, true],
            [true, true, false],
            [true, false, false],
            [false, false, false],
            [true, true, true],
        ]);
        let result = cascade.evaluate(&q).unwrap();
        assert_eq!(result.category, vec![3, 2, 1, UNCATEGORIZED, 3]);
        assert_eq!(result.rule_masks[1].name, "P2");
        assert_eq!(result.rule_masks[1].mask, vec![false, true, false, false, true]);
    }

    #[test]
    fn declaration_order_not_code_order() {
        // Codes descending, as in the category cascades of the channels
        let rules = vec![
            CategoryRule::new("boosted", 3, vec![Requirement::at_least("n", 1)]),
            CategoryRule::new("resolved", 2, vec![Requirement::at_least("n", 2)]),
            CategoryRule::new("tight", 1, vec![Requirement::at_least("n", 3)]),
        ];
        let cascade = Cascade::new(rules, "categories").unwrap();
        let mut q = Quantities::new(4);
        q.insert_count("n", &[0, 1, 2, 5]);
        let result = cascade.evaluate(&q).unwrap();
        assert_eq!(result.category, vec![0, 3, 2, 1]);
    }

    #[test]
    fn empty_table() {
        let cascade = three_rules();
        let result = cascade.evaluate(&flags(&[])).unwrap();
        assert!(result.category.is_empty());
        assert_eq!(result.rule_masks.len(), 3);
    }

    #[test]
    fn malformed_rules_are_rejected() {
        assert!(Cascade::new(Vec::new(), "c").is_err());
        let zero = vec![CategoryRule::new("a", 0, vec![Requirement::eq("n", 1)])];
        assert!(Cascade::new(zero, "c").is_err());
        let dup = vec![
            CategoryRule::new("a", 1, vec![Requirement::eq("n", 1)]),
            CategoryRule::new("a", 2, vec![Requirement::eq("n", 1)]),
        ];
        let err = Cascade::new(dup, "c").unwrap_err();
        assert!(matches!(err, SelectionError::Configuration { ref key, .. } if key == "c.a"));
    }

    #[test]
    fn unknown_quantities_fail_fast() {
        let cascade = three_rules();
        let err = cascade.check_inputs(&["P1", "P2"], "categories").unwrap_err();
        assert!(matches!(
            err,
            SelectionError::Configuration { ref key, .. } if key == "categories.P3"
        ));
        assert!(cascade.check_inputs(&["P1", "P2", "P3"], "categories").is_ok());
    }

    #[test]
    fn gating_is_a_conjunction() {
        let mut gating = Gating::new(3);
        gating.require("a", vec![true, true, false]);
        gating.require("b", vec![true, false, true]);
        assert_eq!(gating.pass(), &[true, false, false]);
        assert_eq!(gating.gate("b"), Some(&[true, false, true][..]));
        assert_eq!(gating.gate("c"), None);
    }

    #[test]
    fn rules_deserialize() {
        let rule: CategoryRule = toml::from_str(
            r#"
            name = "p2"
            code = 2
            require = [
                { of = "n_leptons", cmp = "eq", value = 1 },
                { of = "n_jets", cmp = "ge", value = 2 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(
            rule,
            CategoryRule::new(
                "p2",
                2,
                vec![Requirement::eq("n_leptons", 1), Requirement::at_least("n_jets", 2)]
            )
        );
    }
}
