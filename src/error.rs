//! Errors produced while compiling schemas and rewriting builders.
//!
//! Everything bubbles synchronously to the pipeline driver. The `Pass` and
//! `Package` variants are contextual wrappers, prepended as errors travel up
//! so the final message reads `[pass <name>] [package <pkg>] <cause>`.

use crate::ir::{Kind, RefType};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Names the compiler pass that produced the wrapped error.
    #[error("[pass {pass}] {source}")]
    Pass {
        pass: &'static str,
        source: Box<Error>,
    },

    /// Names the package that was being processed when the wrapped error
    /// occurred.
    #[error("[package {package}] {source}")]
    Package {
        package: String,
        source: Box<Error>,
    },

    #[error("reference `{0}` could not be resolved")]
    UnresolvedReference(RefType),

    #[error("could not make path '{path}': reference `{reference}` could not be resolved")]
    UnresolvedPathReference { path: String, reference: RefType },

    #[error("could not make path '{path}': type at path '{traversed}' is not a struct or a ref")]
    PathThroughNonStruct { path: String, traversed: String },

    #[error("could not make path '{path}': field '{field}' not found under path '{traversed}'")]
    PathFieldNotFound {
        path: String,
        field: String,
        traversed: String,
    },

    #[error("can not make path from empty input")]
    EmptyPathInput,

    #[error("cannot merge options into '{path}': target is not a struct or a ref to a struct")]
    EnvelopeTargetNotAStruct { path: String },

    #[error("cannot merge option '{option}': assignment at '{path}' is outside the '{prefix}' envelope")]
    EnvelopeValueOutsidePrefix {
        option: String,
        path: String,
        prefix: String,
    },

    #[error("cannot flatten intersection in `{object}`: branch of kind `{kind}` is not mergeable")]
    UnmergeableIntersectionBranch { object: RefType, kind: Kind },

    #[error("rule '{rule}' matched no {entity}")]
    RuleMatchedNothing {
        rule: String,
        entity: &'static str,
    },

    #[error("rule '{rule}' matched {count} builders, expected exactly one")]
    AmbiguousRuleMatch { rule: String, count: usize },

    #[error("empty disjunction in `{object}`")]
    EmptyDisjunction { object: RefType },

    #[error("duplicate object `{object}`")]
    DuplicateObject { object: RefType },

    #[error("intersection cycle through `{object}`")]
    IntersectionCycle { object: RefType },
}

impl Error {
    /// Wraps this error with the name of the pass that produced it.
    pub fn in_pass(self, pass: &'static str) -> Self {
        Self::Pass {
            pass,
            source: Box::new(self),
        }
    }

    /// Wraps this error with the package that was being processed.
    pub fn in_package(self, package: impl Into<String>) -> Self {
        Self::Package {
            package: package.into(),
            source: Box::new(self),
        }
    }
}
