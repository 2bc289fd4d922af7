//! Declarative rewriting of the builder IR.
//!
//! Rules are language-scoped and run in declaration order; later rules see
//! earlier rules' output. A rule matching nothing is a soft miss: veneer
//! sets are commonly shared across languages, so it warns instead of
//! failing.

mod builders;
mod options;
mod rules;
mod selectors;

pub use builders::BuilderAction;
pub use options::OptionAction;
pub use rules::*;
pub use selectors::{BuilderSelector, OptionSelector};

use crate::builder::Builders;
use crate::error::Result;

/// One declarative rewrite.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    /// The name recorded in veneer trails of everything the rule modifies.
    pub name: String,
    /// Target languages; empty means every language.
    pub languages: Vec<String>,
    pub kind: RuleKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RuleKind {
    Builder {
        selector: BuilderSelector,
        action: BuilderAction,
    },
    Option {
        selector: OptionSelector,
        action: OptionAction,
    },
}

impl Rule {
    fn applies_to(&self, language: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|wanted| wanted == language)
    }
}

/// Applies an ordered rule list to the builders of one target language.
#[derive(Default)]
pub struct Rewriter {
    rules: Vec<Rule>,
}

impl Rewriter {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn apply_to<'a>(
        &self,
        mut builders: Builders<'a>,
        language: &str,
    ) -> Result<Builders<'a>> {
        for rule in self.rules.iter().filter(|rule| rule.applies_to(language)) {
            let matched = match &rule.kind {
                RuleKind::Builder { selector, action } => {
                    builders::apply(&rule.name, selector, action, &mut builders)?
                }
                RuleKind::Option { selector, action } => {
                    // Path resolution during the rewrite observes the
                    // pre-rule state.
                    let snapshot = builders.clone();
                    let mut total = 0;
                    for builder in builders.iter_mut() {
                        total += options::apply(&rule.name, selector, action, builder, &snapshot)?;
                    }
                    total
                }
            };
            if matched == 0 {
                log::warn!("veneer rule '{}' matched nothing", rule.name);
            }
        }
        Ok(builders)
    }
}
