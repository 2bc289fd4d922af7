//! Builder-level veneer actions.

use crate::builder::Builders;
use crate::error::{Error, Result};

use super::selectors::BuilderSelector;

/// A rewrite applied to the builders selected by a rule.
#[derive(Clone, Debug, PartialEq)]
pub enum BuilderAction {
    Rename(String),
    SetPackage(String),
    Omit,
    /// Moves the selected builders' options into the builder derived from
    /// `package.name`, then removes them.
    MergeInto { package: String, name: String },
    /// Marks the named options as constructor arguments.
    PromoteOptionsToConstructor { options: Vec<String> },
    /// Removes the named options and exposes their fields directly as
    /// properties.
    Properties { options: Vec<String> },
}

/// Applies `action` to every builder picked by `selector`, returning how
/// many matched.
pub(super) fn apply<'a>(
    rule_name: &str,
    selector: &BuilderSelector,
    action: &BuilderAction,
    builders: &mut Builders<'a>,
) -> Result<usize> {
    let selected: Vec<usize> = builders
        .iter()
        .enumerate()
        .filter(|(_, builder)| selector.matches(builder))
        .map(|(index, _)| index)
        .collect();
    if selected.is_empty() {
        return Ok(0);
    }
    let count = selected.len();

    match action {
        BuilderAction::Rename(name) => {
            // Renaming several builders to the same name is always a
            // configuration mistake.
            if selected.len() > 1 {
                return Err(Error::AmbiguousRuleMatch {
                    rule: rule_name.to_owned(),
                    count: selected.len(),
                });
            }
            let builder = &mut builders[selected[0]];
            builder.name = name.clone();
            builder.add_to_veneer_trail(rule_name);
        }

        BuilderAction::SetPackage(package) => {
            for &index in &selected {
                let builder = &mut builders[index];
                builder.package = package.clone();
                builder.add_to_veneer_trail(rule_name);
            }
        }

        BuilderAction::Omit => {
            for &index in selected.iter().rev() {
                builders.remove(index);
            }
        }

        BuilderAction::MergeInto { package, name } => {
            let destination = builders
                .iter()
                .position(|builder| {
                    builder.object.self_ref.referred_pkg == *package
                        && builder.object.name == *name
                })
                .ok_or_else(|| Error::RuleMatchedNothing {
                    rule: rule_name.to_owned(),
                    entity: "destination builder",
                })?;

            let sources: Vec<usize> = selected
                .iter()
                .copied()
                .filter(|&index| index != destination)
                .collect();
            let mut moved = Vec::new();
            for &index in &sources {
                moved.extend(builders[index].options.iter().cloned());
            }
            for &index in sources.iter().rev() {
                builders.remove(index);
            }

            // Removals above may have shifted the destination.
            let shift = sources.iter().filter(|&&index| index < destination).count();
            let destination = &mut builders[destination - shift];
            for option in moved {
                if !destination
                    .options
                    .iter()
                    .any(|existing| existing.name == option.name)
                {
                    destination.options.push(option);
                }
            }
            destination.add_to_veneer_trail(rule_name);
        }

        BuilderAction::PromoteOptionsToConstructor { options } => {
            for &index in &selected {
                let builder = &mut builders[index];
                let mut changed = false;
                for option in &mut builder.options {
                    if options.contains(&option.name) {
                        option.is_constructor_arg = true;
                        changed = true;
                    }
                }
                if changed {
                    builder.add_to_veneer_trail(rule_name);
                }
            }
        }

        BuilderAction::Properties { options } => {
            for &index in &selected {
                let builder = &mut builders[index];
                let mut changed = false;
                let mut position = 0;
                while position < builder.options.len() {
                    if options.contains(&builder.options[position].name) {
                        let option = builder.options.remove(position);
                        if let Some(field) = option.as_struct_field() {
                            builder.properties.push(field);
                        }
                        changed = true;
                    } else {
                        position += 1;
                    }
                }
                if changed {
                    builder.add_to_veneer_trail(rule_name);
                }
            }
        }
    }

    Ok(count)
}
