//! Predicates that pick the builders and options a rule applies to.

use serde::{Deserialize, Serialize};
use unicase::UniCase;

use crate::builder::{Builder, BuilderOption};

/// Selects builders by the identity of the object they were derived from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderSelector {
    ByObject { package: String, name: String },
    EveryBuilder,
}

impl BuilderSelector {
    pub fn matches(&self, builder: &Builder<'_>) -> bool {
        match self {
            Self::ByObject { package, name } => {
                builder.object.self_ref.referred_pkg == *package && builder.object.name == *name
            }
            Self::EveryBuilder => true,
        }
    }
}

/// Selects options within the builder derived from `package.object`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionSelector {
    /// Exact match on the option name.
    ByName {
        package: String,
        object: String,
        options: Vec<String>,
    },
    /// Case-insensitive match on the option name.
    ByNameCaseInsensitive {
        package: String,
        object: String,
        options: Vec<String>,
    },
}

impl OptionSelector {
    pub fn matches(&self, builder: &Builder<'_>, option: &BuilderOption) -> bool {
        match self {
            Self::ByName {
                package,
                object,
                options,
            } => {
                object_matches(builder, package, object)
                    && options.iter().any(|name| *name == option.name)
            }
            Self::ByNameCaseInsensitive {
                package,
                object,
                options,
            } => {
                object_matches(builder, package, object)
                    && options
                        .iter()
                        .any(|name| UniCase::new(name.as_str()) == UniCase::new(option.name.as_str()))
            }
        }
    }
}

fn object_matches(builder: &Builder<'_>, package: &str, object: &str) -> bool {
    builder.object.self_ref.referred_pkg == package && builder.object.name == object
}
