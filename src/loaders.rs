//! Loader strategies and their resolution.
//!
//! Each table's data lives in `<data_dir>/<table>/`, in one of three layouts:
//!
//! | Kind | Layout | Records |
//! |------|--------|---------|
//! | [`LoaderKind::MarkdownFrontmatterDirectory`] | only `.md` / `.markdown` files | one per file, body bound to `content` |
//! | [`LoaderKind::YamlFile`] | an `_all.yml` file (other files ignored) | one per sequence item |
//! | [`LoaderKind::YamlDirectory`] | only `.yml` / `.yaml` files | one per file |
//!
//! [`loader_for`] tries the kinds in that order and returns the first whose
//! validation passes. An empty directory satisfies both directory layouts, so
//! it resolves to the Markdown kind and loads zero records.
//!
//! Directory entries are visited in lexicographic file-name order.

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::coerce::{bind_content, build_record};
use crate::error::{LoadError, LoadResult};
use crate::models::{EntityFactory, Record};
use crate::parse::{parse_frontmatter_file, parse_yaml_mapping, parse_yaml_sequence, RawMapping};
use crate::schema::TableDescriptor;

/// File name of the aggregate source.
pub const AGGREGATE_FILE: &str = "_all.yml";

/// Field that receives the Markdown body.
pub const CONTENT_FIELD: &str = "content";

const MARKDOWN_PATTERNS: &[&str] = &["*.md", "*.markdown"];
const YAML_PATTERNS: &[&str] = &["*.yml", "*.yaml"];

/// A directory layout did not match a loader kind.
///
/// Only [`loader_for`] sees this; callers get `None` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoMatch;

/// The closed set of directory layouts, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    MarkdownFrontmatterDirectory,
    YamlFile,
    YamlDirectory,
}

impl LoaderKind {
    /// All kinds, highest priority first.
    pub const PRIORITY: [LoaderKind; 3] = [
        LoaderKind::MarkdownFrontmatterDirectory,
        LoaderKind::YamlFile,
        LoaderKind::YamlDirectory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderKind::MarkdownFrontmatterDirectory => "markdown-directory",
            LoaderKind::YamlFile => "yaml-file",
            LoaderKind::YamlDirectory => "yaml-directory",
        }
    }

    /// Check the table's directory against this layout.
    ///
    /// Returns the path records will be read from: the aggregate file for
    /// [`LoaderKind::YamlFile`], the table directory otherwise.
    fn validate(&self, table_dir: &Path) -> Result<PathBuf, NoMatch> {
        match self {
            LoaderKind::MarkdownFrontmatterDirectory => {
                validate_extensions(table_dir, MARKDOWN_PATTERNS)?;
                Ok(table_dir.to_path_buf())
            }
            LoaderKind::YamlFile => {
                let path = table_dir.join(AGGREGATE_FILE);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(NoMatch)
                }
            }
            LoaderKind::YamlDirectory => {
                validate_extensions(table_dir, YAML_PATTERNS)?;
                Ok(table_dir.to_path_buf())
            }
        }
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated loader for one table.
#[derive(Debug, Clone)]
pub struct Loader<'a> {
    kind: LoaderKind,
    table: &'a TableDescriptor,
    path: PathBuf,
}

impl<'a> Loader<'a> {
    /// Construct a loader of `kind`, validating the table's directory.
    pub fn new(
        kind: LoaderKind,
        data_dir: &Path,
        table: &'a TableDescriptor,
    ) -> Result<Self, NoMatch> {
        let path = kind.validate(&data_dir.join(&table.name))?;
        Ok(Self { kind, table, path })
    }

    pub fn kind(&self) -> LoaderKind {
        self.kind
    }

    /// Lazily produce this table's records.
    ///
    /// Nothing is read until the first item is pulled. The sequence stops
    /// after the first error. Calling `extract` again starts over from the
    /// filesystem.
    pub fn extract(&self, factory: &'a dyn EntityFactory) -> Records<'a> {
        Records {
            kind: self.kind,
            table: self.table,
            factory,
            path: self.path.clone(),
            pending: None,
            done: false,
        }
    }
}

/// Pick the loader for `table`, trying each kind in priority order.
///
/// Returns `None` when no layout matches, including when the table's
/// directory does not exist.
pub fn loader_for<'a>(data_dir: &Path, table: &'a TableDescriptor) -> Option<Loader<'a>> {
    LoaderKind::PRIORITY
        .iter()
        .find_map(|kind| Loader::new(*kind, data_dir, table).ok())
}

/// Iterator over the records of one table.
pub struct Records<'a> {
    kind: LoaderKind,
    table: &'a TableDescriptor,
    factory: &'a dyn EntityFactory,
    path: PathBuf,
    pending: Option<Pending>,
    done: bool,
}

enum Pending {
    Files(std::vec::IntoIter<PathBuf>),
    Mappings(std::vec::IntoIter<RawMapping>),
}

impl Records<'_> {
    fn open(&self) -> LoadResult<Pending> {
        match self.kind {
            LoaderKind::YamlFile => Ok(Pending::Mappings(
                parse_yaml_sequence(&self.path)?.into_iter(),
            )),
            LoaderKind::MarkdownFrontmatterDirectory | LoaderKind::YamlDirectory => {
                Ok(Pending::Files(list_files(&self.path)?.into_iter()))
            }
        }
    }

    fn read_file(&self, path: &Path) -> LoadResult<Record> {
        let raw = match self.kind {
            LoaderKind::MarkdownFrontmatterDirectory => {
                let (mut raw, body) = parse_frontmatter_file(path)?;
                bind_content(&mut raw, CONTENT_FIELD, body);
                raw
            }
            LoaderKind::YamlFile | LoaderKind::YamlDirectory => parse_yaml_mapping(path)?,
        };
        build_record(self.table, self.factory, &raw, path)
    }

    fn pull(&mut self) -> Option<LoadResult<Record>> {
        if self.pending.is_none() {
            match self.open() {
                Ok(pending) => self.pending = Some(pending),
                Err(e) => return Some(Err(e)),
            }
        }

        match self.pending.as_mut()? {
            Pending::Mappings(items) => {
                let raw = items.next()?;
                Some(build_record(self.table, self.factory, &raw, &self.path))
            }
            Pending::Files(files) => {
                let file = files.next()?;
                Some(self.read_file(&file))
            }
        }
    }
}

impl Iterator for Records<'_> {
    type Item = LoadResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.pull();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Every entry name in `dir` must match one of `patterns` (case-insensitive).
fn validate_extensions(dir: &Path, patterns: &[&str]) -> Result<(), NoMatch> {
    if !dir.is_dir() {
        return Err(NoMatch);
    }
    let allowed = build_globset(patterns).map_err(|_| NoMatch)?;

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|_| NoMatch)?;
        if !allowed.is_match(entry.file_name()) {
            return Err(NoMatch);
        }
    }
    Ok(())
}

/// Regular files directly under `dir`, sorted by file name.
fn list_files(dir: &Path) -> LoadResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| LoadError::UnreadableFile {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, Model};
    use crate::schema::FieldDescriptor;
    use std::fs;
    use tempfile::TempDir;

    fn posts() -> TableDescriptor {
        TableDescriptor::new(
            "posts",
            vec![
                FieldDescriptor::new("slug").primary_key(),
                FieldDescriptor::new("title"),
                FieldDescriptor::new("content"),
            ],
        )
    }

    fn data_dir(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let table_dir = tmp.path().join("posts");
        fs::create_dir_all(&table_dir).unwrap();
        for (name, contents) in files {
            fs::write(table_dir.join(name), contents).unwrap();
        }
        tmp
    }

    fn resolve(files: &[(&str, &str)]) -> Option<LoaderKind> {
        let tmp = data_dir(files);
        let table = posts();
        let kind = loader_for(tmp.path(), &table).map(|l| l.kind());
        kind
    }

    fn text(value: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(value.to_string()))
    }

    #[test]
    fn markdown_directory_resolves_first() {
        assert_eq!(
            resolve(&[("a.md", ""), ("b.MARKDOWN", ""), ("c.Md", "")]),
            Some(LoaderKind::MarkdownFrontmatterDirectory)
        );
    }

    #[test]
    fn aggregate_file_wins_over_stray_files() {
        assert_eq!(
            resolve(&[("_all.yml", "[]"), ("notes.txt", ""), ("other.yml", "")]),
            Some(LoaderKind::YamlFile)
        );
        assert_eq!(
            resolve(&[("_all.yml", "[]"), ("post.md", "")]),
            Some(LoaderKind::YamlFile)
        );
    }

    #[test]
    fn yaml_directory_accepts_both_extensions() {
        assert_eq!(
            resolve(&[("a.yml", ""), ("b.yaml", ""), ("c.YML", "")]),
            Some(LoaderKind::YamlDirectory)
        );
    }

    #[test]
    fn mixed_extensions_resolve_to_nothing() {
        assert_eq!(resolve(&[("a.yml", ""), ("b.md", "")]), None);
        assert_eq!(resolve(&[("a.yml", ""), ("README", "")]), None);
    }

    #[test]
    fn empty_directory_resolves_to_markdown() {
        assert_eq!(resolve(&[]), Some(LoaderKind::MarkdownFrontmatterDirectory));
    }

    #[test]
    fn missing_directory_resolves_to_nothing() {
        let tmp = TempDir::new().unwrap();
        let table = posts();
        assert!(loader_for(tmp.path(), &table).is_none());
    }

    #[test]
    fn aggregate_yields_items_in_file_order() {
        let tmp = data_dir(&[(
            "_all.yml",
            "- slug: zeta\n  title: Z\n- slug: alpha\n  title: A\n",
        )]);
        let table = posts();
        let model = Model::new("posts");
        let loader = loader_for(tmp.path(), &table).unwrap();

        let records: Vec<Record> = loader.extract(&model).collect::<Result<_, _>>().unwrap();
        let slugs: Vec<_> = records.iter().map(|r| r.get("slug").cloned()).collect();
        assert_eq!(slugs, vec![text("zeta"), text("alpha")]);
    }

    #[test]
    fn yaml_directory_yields_files_sorted_by_name() {
        let tmp = data_dir(&[("b.yml", "slug: b\n"), ("a.yaml", "slug: a\n"), ("c.yml", "slug: c\n")]);
        let table = posts();
        let model = Model::new("posts");
        let loader = loader_for(tmp.path(), &table).unwrap();

        let slugs: Vec<_> = loader
            .extract(&model)
            .map(|r| r.unwrap().get("slug").cloned())
            .collect();
        assert_eq!(slugs, vec![text("a"), text("b"), text("c")]);
    }

    #[test]
    fn markdown_body_overrides_frontmatter_content() {
        let tmp = data_dir(&[(
            "first.md",
            "---\nslug: first\ntitle: First\ncontent: ignored\n---\nHello\n",
        )]);
        let table = posts();
        let model = Model::new("posts");
        let loader = loader_for(tmp.path(), &table).unwrap();

        let records: Vec<Record> = loader.extract(&model).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("slug").cloned(), text("first"));
        assert_eq!(records[0].get("title").cloned(), text("First"));
        assert_eq!(records[0].get("content").cloned(), text("Hello"));
    }

    #[test]
    fn extraction_stops_after_first_error() {
        let tmp = data_dir(&[("a.yml", "slug: a\n"), ("b.yml", "[1, 2]"), ("c.yml", "slug: c\n")]);
        let table = posts();
        let model = Model::new("posts");
        let loader = loader_for(tmp.path(), &table).unwrap();

        let mut records = loader.extract(&model);
        assert!(records.next().unwrap().is_ok());
        assert!(matches!(
            records.next(),
            Some(Err(LoadError::InvalidFormat { .. }))
        ));
        assert!(records.next().is_none());
    }

    #[test]
    fn extract_rereads_the_filesystem() {
        let tmp = data_dir(&[("a.yml", "slug: a\n")]);
        let table = posts();
        let model = Model::new("posts");
        let loader = loader_for(tmp.path(), &table).unwrap();

        assert_eq!(loader.extract(&model).count(), 1);
        fs::write(tmp.path().join("posts").join("b.yml"), "slug: b\n").unwrap();
        assert_eq!(loader.extract(&model).count(), 2);
    }

    #[test]
    fn subdirectories_fail_validation_but_are_skipped_when_named_like_files() {
        let tmp = data_dir(&[("a.yml", "slug: a\n")]);
        fs::create_dir(tmp.path().join("posts").join("drafts")).unwrap();
        let table = posts();
        assert!(loader_for(tmp.path(), &table).is_none());

        fs::remove_dir(tmp.path().join("posts").join("drafts")).unwrap();
        fs::create_dir(tmp.path().join("posts").join("archive.yml")).unwrap();
        let loader = loader_for(tmp.path(), &table).unwrap();
        assert_eq!(loader.kind(), LoaderKind::YamlDirectory);
        assert_eq!(loader.extract(&Model::new("posts")).count(), 1);
    }
}
