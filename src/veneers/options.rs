//! Option-level veneer actions.

use std::collections::HashMap;

use crate::builder::{
    Assignment, AssignmentEnvelope, AssignmentMethod, AssignmentValue, Builder, BuilderOption,
    Builders, EnvelopeFieldValue,
};
use crate::error::{Error, Result};
use crate::ir::{Kind, Type};

use super::selectors::OptionSelector;

/// A rewrite applied to the options selected by a rule.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionAction {
    Rename(String),
    Omit,
    /// Promotes the option from fluent to mandatory constructor argument.
    PromoteToConstructorArg,
    /// Keeps the first of the selected options for each name, drops the
    /// rest.
    Dedupe,
    /// Adds a copy of each selected option under a new name, optionally
    /// overriding argument types pairwise.
    Duplicate {
        name: String,
        args_override: Vec<Type>,
    },
    /// Replaces the selected options with a single option whose one
    /// assignment writes an envelope under `path_prefix`.
    MergeInto {
        option_name: String,
        path_prefix: String,
    },
    SetAssignmentMethod(AssignmentMethod),
    AddComments(Vec<String>),
    /// Substitutes the `from` prefix with `to` in assignment paths. `from`
    /// is compared by identifiers so it may name fields that no longer
    /// exist; `to` must resolve against the builder.
    RewritePath { from: String, to: String },
}

/// Applies `action` to the options of `builder` picked by `selector`, and
/// returns how many options were selected. `snapshot` is the pre-rule state
/// of all builders, used to resolve paths.
pub(super) fn apply(
    rule_name: &str,
    selector: &OptionSelector,
    action: &OptionAction,
    builder: &mut Builder<'_>,
    snapshot: &Builders<'_>,
) -> Result<usize> {
    let selected: Vec<usize> = builder
        .options
        .iter()
        .enumerate()
        .filter(|(_, option)| selector.matches(builder, option))
        .map(|(index, _)| index)
        .collect();
    if selected.is_empty() {
        return Ok(0);
    }
    let count = selected.len();

    match action {
        OptionAction::Rename(name) => {
            for &index in &selected {
                let option = &mut builder.options[index];
                option.name = name.clone();
                option.add_to_veneer_trail(rule_name);
            }
        }

        OptionAction::Omit => {
            for &index in selected.iter().rev() {
                builder.options.remove(index);
            }
        }

        OptionAction::PromoteToConstructorArg => {
            for &index in &selected {
                let option = &mut builder.options[index];
                option.is_constructor_arg = true;
                option.add_to_veneer_trail(rule_name);
            }
        }

        OptionAction::Dedupe => {
            let mut first_by_name: HashMap<String, usize> = HashMap::new();
            let mut dropped = Vec::new();
            for &index in &selected {
                let name = builder.options[index].name.clone();
                match first_by_name.get(&name) {
                    Some(_) => dropped.push(index),
                    None => {
                        first_by_name.insert(name, index);
                    }
                }
            }
            for &index in dropped.iter().rev() {
                let name = builder.options[index].name.clone();
                builder.options.remove(index);
                if let Some(&kept) = first_by_name.get(&name) {
                    builder.options[kept].add_to_veneer_trail(rule_name);
                }
            }
        }

        OptionAction::Duplicate {
            name,
            args_override,
        } => {
            for &index in selected.iter().rev() {
                let mut copy = builder.options[index].clone();
                copy.name = name.clone();
                for (argument, ty) in copy.args.iter_mut().zip(args_override) {
                    argument.ty = ty.clone();
                }
                let overridden: Vec<_> = copy
                    .args
                    .iter()
                    .map(|argument| (argument.name.clone(), argument.ty.clone()))
                    .collect();
                for assignment in &mut copy.assignments {
                    if let AssignmentValue::Argument(argument) = &mut assignment.value
                        && let Some((_, ty)) = overridden
                            .iter()
                            .find(|(arg_name, _)| *arg_name == argument.name)
                    {
                        argument.ty = ty.clone();
                    }
                }
                copy.add_to_veneer_trail(rule_name);
                builder.options.insert(index + 1, copy);
            }
        }

        OptionAction::MergeInto {
            option_name,
            path_prefix,
        } => {
            let merged = merge_into_envelope(
                rule_name,
                option_name,
                path_prefix,
                &selected,
                builder,
                snapshot,
            )?;
            let first = selected[0];
            for &index in selected.iter().rev() {
                builder.options.remove(index);
            }
            builder.options.insert(first, merged);
        }

        OptionAction::SetAssignmentMethod(method) => {
            for &index in &selected {
                let option = &mut builder.options[index];
                for assignment in &mut option.assignments {
                    assignment.method = *method;
                }
                option.add_to_veneer_trail(rule_name);
            }
        }

        OptionAction::AddComments(comments) => {
            for &index in &selected {
                let option = &mut builder.options[index];
                option.comments.extend(comments.iter().cloned());
                option.add_to_veneer_trail(rule_name);
            }
        }

        OptionAction::RewritePath { from, to } => {
            let to_path = builder.make_path(snapshot, to)?;
            let from_parts: Vec<&str> = from.split('.').collect();
            for &index in &selected {
                let option = &mut builder.options[index];
                let mut changed = false;
                for assignment in &mut option.assignments {
                    if let Some(suffix) = assignment
                        .path
                        .strip_identifier_prefix(from_parts.iter().copied())
                    {
                        assignment.path = to_path.append(&suffix);
                        changed = true;
                    }
                }
                if changed {
                    option.add_to_veneer_trail(rule_name);
                }
            }
        }
    }

    Ok(count)
}

/// Builds the replacement option for [`OptionAction::MergeInto`]: one
/// argument per merged option, and a single direct assignment writing an
/// envelope of `(sub-path, value)` pairs under the common ancestor path.
fn merge_into_envelope(
    rule_name: &str,
    option_name: &str,
    path_prefix: &str,
    selected: &[usize],
    builder: &Builder<'_>,
    snapshot: &Builders<'_>,
) -> Result<BuilderOption> {
    let prefix_path = builder.make_path(snapshot, path_prefix)?;
    let Some(target) = prefix_path.last() else {
        return Err(Error::EmptyPathInput);
    };

    let target_is_struct = match target.ty.kind() {
        Kind::Struct => true,
        Kind::Ref => target
            .ty
            .as_ref_type()
            .and_then(|reference| {
                snapshot.locate_by_object(&reference.referred_pkg, &reference.referred_type)
            })
            .is_some_and(|referred| referred.object.ty.is(Kind::Struct)),
        _ => false,
    };
    if !target_is_struct {
        return Err(Error::EnvelopeTargetNotAStruct {
            path: path_prefix.to_owned(),
        });
    }

    let mut args = Vec::with_capacity(selected.len());
    let mut values = Vec::with_capacity(selected.len());
    for &index in selected {
        let option = &builder.options[index];
        args.extend(option.args.iter().cloned());

        let Some(assignment) = option.assignments.first() else {
            continue;
        };
        let sub_path = assignment.path.strip_prefix(&prefix_path).ok_or_else(|| {
            Error::EnvelopeValueOutsidePrefix {
                option: option.name.clone(),
                path: assignment.path.to_string(),
                prefix: path_prefix.to_owned(),
            }
        })?;
        values.push(EnvelopeFieldValue {
            path: sub_path,
            value: assignment.value.clone(),
        });
    }

    let envelope = AssignmentEnvelope {
        ty: target.ty.clone(),
        values,
    };
    let mut option = BuilderOption {
        name: option_name.to_owned(),
        comments: Vec::new(),
        veneer_trail: Vec::new(),
        args,
        assignments: vec![Assignment {
            path: prefix_path,
            value: AssignmentValue::Envelope(envelope),
            method: AssignmentMethod::Direct,
            constraints: Vec::new(),
        }],
        default: None,
        is_constructor_arg: false,
    };
    option.add_to_veneer_trail(rule_name);
    Ok(option)
}
