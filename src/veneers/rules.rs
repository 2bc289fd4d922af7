//! Veneer rule configuration.
//!
//! The configuration file loader is an external collaborator; these types
//! define the recognized rule schema and its mapping onto [`Rule`]s. Every
//! rule carries `languages` (empty = all) and exactly one operation key.

use serde::Deserialize;

use crate::builder::AssignmentMethod;
use crate::ir::Type;

use super::{BuilderAction, BuilderSelector, OptionAction, OptionSelector, Rule, RuleKind};

/// A parsed veneer configuration. Builder rules apply before option rules,
/// each group in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct VeneerConfig {
    #[serde(default)]
    pub builders: Vec<BuilderRuleConfig>,
    #[serde(default)]
    pub options: Vec<OptionRuleConfig>,
}

impl VeneerConfig {
    /// Flattens the configuration into the ordered rule list consumed by
    /// [`Rewriter`][super::Rewriter].
    pub fn into_rules(self) -> Vec<Rule> {
        let builders = self
            .builders
            .into_iter()
            .filter_map(BuilderRuleConfig::into_rule);
        let options = self
            .options
            .into_iter()
            .filter_map(OptionRuleConfig::into_rule);
        builders.chain(options).collect()
    }

    /// Concatenates another configuration after this one, e.g. when several
    /// files were loaded.
    pub fn merge(mut self, other: VeneerConfig) -> Self {
        self.builders.extend(other.builders);
        self.options.extend(other.options);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BuilderRuleConfig {
    #[serde(default)]
    pub languages: Vec<String>,
    pub selector: BuilderSelector,
    #[serde(flatten)]
    pub operation: BuilderOperation,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderOperation {
    Rename(String),
    SetPackage(String),
    Omit(bool),
    MergeInto { package: String, name: String },
    PromoteOptionsToConstructor(Vec<String>),
    Properties(Vec<String>),
}

impl BuilderRuleConfig {
    /// `None` for operations disabled with an explicit `false`.
    fn into_rule(self) -> Option<Rule> {
        let (name, action) = match self.operation {
            BuilderOperation::Rename(new_name) => {
                (format!("Rename[{new_name}]"), BuilderAction::Rename(new_name))
            }
            BuilderOperation::SetPackage(package) => (
                format!("SetPackage[{package}]"),
                BuilderAction::SetPackage(package),
            ),
            BuilderOperation::Omit(false) => return None,
            BuilderOperation::Omit(true) => ("Omit".to_owned(), BuilderAction::Omit),
            BuilderOperation::MergeInto { package, name } => (
                format!("MergeInto[{package}.{name}]"),
                BuilderAction::MergeInto { package, name },
            ),
            BuilderOperation::PromoteOptionsToConstructor(options) => (
                "PromoteOptionsToConstructor".to_owned(),
                BuilderAction::PromoteOptionsToConstructor { options },
            ),
            BuilderOperation::Properties(options) => (
                "Properties".to_owned(),
                BuilderAction::Properties { options },
            ),
        };

        Some(Rule {
            name,
            languages: self.languages,
            kind: RuleKind::Builder {
                selector: self.selector,
                action,
            },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct OptionRuleConfig {
    #[serde(default)]
    pub languages: Vec<String>,
    pub selector: OptionSelector,
    #[serde(flatten)]
    pub operation: OptionOperation,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionOperation {
    Rename(String),
    Omit(bool),
    PromoteToConstructor(bool),
    Dedupe(bool),
    Duplicate {
        name: String,
        #[serde(default)]
        args_override: Vec<Type>,
    },
    MergeInto {
        option_name: String,
        path_prefix: String,
    },
    AssignmentMethod(AssignmentMethod),
    AddComment(Vec<String>),
    RewritePath {
        from: String,
        to: String,
    },
}

impl OptionRuleConfig {
    /// `None` for operations disabled with an explicit `false`.
    fn into_rule(self) -> Option<Rule> {
        let (name, action) = match self.operation {
            OptionOperation::Rename(new_name) => {
                (format!("Rename[{new_name}]"), OptionAction::Rename(new_name))
            }
            OptionOperation::Omit(false)
            | OptionOperation::PromoteToConstructor(false)
            | OptionOperation::Dedupe(false) => return None,
            OptionOperation::Omit(true) => ("Omit".to_owned(), OptionAction::Omit),
            OptionOperation::PromoteToConstructor(true) => (
                "PromoteToConstructor".to_owned(),
                OptionAction::PromoteToConstructorArg,
            ),
            OptionOperation::Dedupe(true) => ("Dedupe".to_owned(), OptionAction::Dedupe),
            OptionOperation::Duplicate {
                name,
                args_override,
            } => (
                format!("Duplicate[{name}]"),
                OptionAction::Duplicate {
                    name,
                    args_override,
                },
            ),
            OptionOperation::MergeInto {
                option_name,
                path_prefix,
            } => (
                format!("MergeInto[{option_name}]"),
                OptionAction::MergeInto {
                    option_name,
                    path_prefix,
                },
            ),
            OptionOperation::AssignmentMethod(method) => {
                let label = match method {
                    AssignmentMethod::Direct => "direct",
                    AssignmentMethod::Append => "append",
                };
                (
                    format!("AssignmentMethod[{label}]"),
                    OptionAction::SetAssignmentMethod(method),
                )
            }
            OptionOperation::AddComment(lines) => {
                ("AddComment".to_owned(), OptionAction::AddComments(lines))
            }
            OptionOperation::RewritePath { from, to } => (
                format!("RewritePath[{from} → {to}]"),
                OptionAction::RewritePath { from, to },
            ),
        };

        Some(Rule {
            name,
            languages: self.languages,
            kind: RuleKind::Option {
                selector: self.selector,
                action,
            },
        })
    }
}
