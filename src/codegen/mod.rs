//! The emitter-facing interface and the per-language pipeline driver.
//!
//! Jennies (language emitters) are external collaborators: each consumes a
//! [`Context`] and produces a virtual filesystem of output files. The driver
//! here runs the full pipeline for every requested language: common passes,
//! target-specific passes, builder synthesis, veneer rewriting, then the
//! language's jennies.

use std::path::{Path as FsPath, PathBuf};

use miette::{Context as _, IntoDiagnostic};

use crate::builder::{BuilderGenerator, Builders};
use crate::compiler::{PassList, common_passes};
use crate::ir::Schemas;
use crate::veneers::Rewriter;

/// Toggles shared by all jennies.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Emit audit trails (passes and veneers) as comments in the output.
    pub debug: bool,
    /// Generate type declarations.
    pub types: bool,
    /// Generate builders.
    pub builders: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            types: true,
            builders: true,
        }
    }
}

/// Everything an emitter needs: the compiled schemas and the veneered
/// builders derived from them.
#[derive(Debug)]
pub struct Context<'a> {
    pub schemas: &'a Schemas,
    pub builders: Builders<'a>,
}

/// One generated file, relative to the output root.
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl File {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// A virtual filesystem of generated files.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileSet(Vec<File>);

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: File) {
        self.0.push(file);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &File> {
        self.0.iter()
    }

    /// Merges another set into this one. Two jennies writing the same path
    /// is always a bug, so collisions fail.
    pub fn merge(&mut self, other: FileSet) -> miette::Result<()> {
        for file in other.0 {
            if self.0.iter().any(|existing| existing.path == file.path) {
                miette::bail!("output file `{}` was generated twice", file.path.display());
            }
            self.0.push(file);
        }
        Ok(())
    }

    /// Returns the same files with every path prefixed by `dir`.
    pub fn prefixed(self, dir: &FsPath) -> FileSet {
        Self(
            self.0
                .into_iter()
                .map(|file| File {
                    path: dir.join(&file.path),
                    contents: file.contents,
                })
                .collect(),
        )
    }

    /// Writes every file under `root`, creating directories as needed.
    pub fn write_to_disk(&self, root: &FsPath) -> miette::Result<()> {
        for file in &self.0 {
            let path = root.join(&file.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .into_diagnostic()
                    .with_context(|| format!("Failed to create directory `{}`", parent.display()))?;
            }
            std::fs::write(&path, &file.contents)
                .into_diagnostic()
                .with_context(|| format!("Failed to write `{}`", path.display()))?;
        }
        Ok(())
    }
}

impl IntoIterator for FileSet {
    type Item = File;
    type IntoIter = std::vec::IntoIter<File>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// An emitter producing output files for one language.
pub trait Jenny {
    fn name(&self) -> &'static str;

    fn generate(&self, context: &Context<'_>) -> miette::Result<FileSet>;
}

/// A target language: its extra compiler passes and its jennies.
pub trait Language {
    fn name(&self) -> &'static str;

    /// Passes concatenated after the common ones.
    fn passes(&self) -> PassList;

    fn jennies(&self, config: &Config) -> Vec<Box<dyn Jenny>>;
}

/// The outcome of running the pipeline across languages.
#[derive(Debug)]
pub struct GenerateReport {
    pub files: FileSet,
    pub failures: Vec<GenerateFailure>,
}

#[derive(Debug)]
pub struct GenerateFailure {
    pub language: String,
    pub error: miette::Report,
}

/// Runs the full pipeline for each language and merges the outputs.
///
/// Each language compiles an independent deep copy of `schemas`, so a
/// failing language reports its error and the other languages keep running.
/// `output_dir` may contain `%l`, which is substituted with the language
/// name.
pub fn generate(
    languages: &[Box<dyn Language>],
    schemas: &Schemas,
    rewriter: &Rewriter,
    config: &Config,
    output_dir: &str,
) -> GenerateReport {
    let mut files = FileSet::new();
    let mut failures = Vec::new();

    for language in languages {
        let generated = generate_language(language.as_ref(), schemas, rewriter, config, output_dir)
            .and_then(|generated| {
                files.merge(generated)?;
                Ok(())
            });
        if let Err(error) = generated {
            log::error!("generation failed for `{}`: {error}", language.name());
            failures.push(GenerateFailure {
                language: language.name().to_owned(),
                error,
            });
        }
    }

    GenerateReport { files, failures }
}

fn generate_language(
    language: &dyn Language,
    schemas: &Schemas,
    rewriter: &Rewriter,
    config: &Config,
    output_dir: &str,
) -> miette::Result<FileSet> {
    // No state is shared between languages: veneers restructure builder
    // graphs freely, so every language works on its own copy of the IR.
    let schemas = common_passes()
        .concat(language.passes())
        .process(schemas.clone())
        .into_diagnostic()?;

    let builders = BuilderGenerator::new(&schemas).generate();
    let builders = rewriter
        .apply_to(builders, language.name())
        .into_diagnostic()?;

    let context = Context {
        schemas: &schemas,
        builders,
    };
    let output_dir = output_dir.replace("%l", language.name());

    let mut files = FileSet::new();
    for jenny in language.jennies(config) {
        let generated = jenny
            .generate(&context)
            .with_context(|| format!("jenny `{}` failed", jenny.name()))?;
        files.merge(generated)?;
    }
    Ok(files.prefixed(FsPath::new(&output_dir)))
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::ir::{Object, Schema, StructField, Type};

    use super::*;

    struct ListBuilders;

    impl Jenny for ListBuilders {
        fn name(&self) -> &'static str {
            "list_builders"
        }

        fn generate(&self, context: &Context<'_>) -> miette::Result<FileSet> {
            let listing = context
                .builders
                .iter()
                .map(|builder| builder.name.as_str())
                .join("\n");
            let mut files = FileSet::new();
            files.add(File::new("builders.txt", listing.into_bytes()));
            Ok(files)
        }
    }

    struct StubLanguage(&'static str);

    impl Language for StubLanguage {
        fn name(&self) -> &'static str {
            self.0
        }

        fn passes(&self) -> PassList {
            PassList::default()
        }

        fn jennies(&self, _config: &Config) -> Vec<Box<dyn Jenny>> {
            vec![Box::new(ListBuilders)]
        }
    }

    fn sample_schemas() -> Schemas {
        Schemas::new(vec![Schema::new("pkg").with_object(Object::new(
            "pkg",
            "User",
            Type::struct_(vec![StructField::new("id", Type::string()).required()]),
        ))])
    }

    #[test]
    fn test_generate_substitutes_language_into_output_dir() {
        let languages: Vec<Box<dyn Language>> =
            vec![Box::new(StubLanguage("go")), Box::new(StubLanguage("ts"))];

        let report = generate(
            &languages,
            &sample_schemas(),
            &Rewriter::default(),
            &Config::default(),
            "generated/%l",
        );

        assert!(report.failures.is_empty());
        let paths: Vec<_> = report
            .files
            .iter()
            .map(|file| file.path.display().to_string())
            .sorted()
            .collect();
        assert_eq!(paths, ["generated/go/builders.txt", "generated/ts/builders.txt"]);
    }

    #[test]
    fn test_failing_language_does_not_stop_the_others() {
        struct BrokenJenny;

        impl Jenny for BrokenJenny {
            fn name(&self) -> &'static str {
                "broken"
            }

            fn generate(&self, _context: &Context<'_>) -> miette::Result<FileSet> {
                miette::bail!("boom")
            }
        }

        struct BrokenLanguage;

        impl Language for BrokenLanguage {
            fn name(&self) -> &'static str {
                "broken"
            }

            fn passes(&self) -> PassList {
                PassList::default()
            }

            fn jennies(&self, _config: &Config) -> Vec<Box<dyn Jenny>> {
                vec![Box::new(BrokenJenny)]
            }
        }

        let languages: Vec<Box<dyn Language>> =
            vec![Box::new(BrokenLanguage), Box::new(StubLanguage("go"))];

        let report = generate(
            &languages,
            &sample_schemas(),
            &Rewriter::default(),
            &Config::default(),
            "out/%l",
        );

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].language, "broken");
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn test_merge_rejects_colliding_paths() {
        let mut files = FileSet::new();
        files.add(File::new("a.txt", b"one".to_vec()));

        let mut other = FileSet::new();
        other.add(File::new("a.txt", b"two".to_vec()));

        assert!(files.merge(other).is_err());
    }
}
