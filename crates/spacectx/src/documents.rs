//! collection of parsed terraform documents ([Body] and path to source file)
//!
//! [Documents] tracks
//! - the source path
//! - the root blocks
//! - the root attributes
//! in the order they were inserted. Generation depends on that order being stable.
use hcl_edit::structure::{Attribute, Block, Body, Structure};
use std::path::{Path, PathBuf};

#[derive(Default, Debug)]
pub struct Documents {
    sources: Vec<Source>,
    root_attributes: Vec<(usize, Attribute)>,
    root_blocks: Vec<(usize, Block)>,
}

impl Documents {
    /// Inserts a parsed document
    pub fn insert(&mut self, document: Body, path: impl Into<Option<PathBuf>>) {
        let source_index = self.sources.len();
        self.sources.push(path.into());

        for structure in document {
            match structure {
                Structure::Block(block) => self.root_blocks.push((source_index, block)),
                Structure::Attribute(attribute) => {
                    self.root_attributes.push((source_index, attribute))
                }
            }
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = SourceAttribute> {
        self.root_attributes
            .iter()
            .enumerate()
            .map(|(index, (source_index, attribute))| {
                (index, &self.sources[*source_index], attribute)
            })
    }

    pub fn blocks(&self) -> impl Iterator<Item = SourceBlock> {
        self.root_blocks
            .iter()
            .enumerate()
            .map(|(index, (source_index, block))| (index, &self.sources[*source_index], block))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Checks for `terraform { required_providers { <provider> = ... } }` in any document
    pub fn has_provider_requirement(&self, provider: &str) -> bool {
        self.blocks()
            .filter(|(_, _, block)| block.ident.value().as_str() == "terraform")
            .flat_map(|(_, _, block)| block.body.blocks())
            .filter(|block| block.ident.value().as_str() == "required_providers")
            .flat_map(|block| block.body.attributes())
            .any(|attribute| attribute.key.value().as_str() == provider)
    }
}

impl Documents {
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(file_path).map_err(|source| LoadError::Io {
            path: file_path.to_owned(),
            source,
        })?;
        let body =
            hcl_edit::parser::parse_body(&file_contents).map_err(|source| LoadError::Parse {
                path: file_path.to_owned(),
                source,
            })?;

        self.insert(body, Some(file_path.to_owned()));
        Ok(())
    }

    /// Loads a single `.tf` file or all `.tf` files directly inside a directory
    ///
    /// Files that fail to parse do not stop the remaining files from loading. All failures are logged and the first
    /// one is returned once every file was attempted.
    pub fn load_path(&mut self, path: &Path) -> Result<(), LoadError> {
        let metadata = std::fs::symlink_metadata(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;

        if !metadata.is_dir() {
            return self.load_terraform_file(path, &metadata);
        }

        if is_hidden(path) {
            tracing::debug!(path=%path.display(), "skipping hidden directory");
            return Ok(());
        }

        let read_dir = std::fs::read_dir(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;

        let mut entries = vec![];
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| LoadError::Io {
                path: path.to_owned(),
                source,
            })?;
            entries.push(dir_entry.path());
        }
        entries.sort();

        let mut first_error = None;
        for entry in entries {
            let metadata = std::fs::symlink_metadata(&entry).map_err(|source| LoadError::Io {
                path: entry.clone(),
                source,
            })?;

            if metadata.is_dir() {
                tracing::debug!(path=%entry.display(), "skipping directory");
                continue;
            }

            match self.load_terraform_file(&entry, &metadata) {
                Ok(()) => {}
                Err(err @ LoadError::Parse { .. }) => {
                    tracing::error!(error=%err, "failed to parse file");
                    first_error.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn load_terraform_file(
        &mut self,
        path: &Path,
        metadata: &std::fs::Metadata,
    ) -> Result<(), LoadError> {
        if !metadata.is_file() {
            tracing::debug!(path=%path.display(), "skipping: not a regular file");
            return Ok(());
        }

        if path.extension().map_or(true, |extension| extension != "tf") {
            tracing::debug!(path=%path.display(), "skipping: not a .tf file");
            return Ok(());
        }

        self.load_file(path)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: hcl_edit::parser::Error,
    },
}

impl From<Body> for Documents {
    fn from(value: Body) -> Self {
        let mut documents = Documents::default();
        documents.insert(value, None);
        documents
    }
}

/// Utility macro to create [Documents]
///
/// Create from a single document
/// ```
/// # use spacectx::documents;
/// documents!(r#"output "name" { value = 42 }"#);
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use spacectx::documents;
/// documents! {
///   "outputs.tf" => r#"output "one" { value = 1 }"#,
///   "versions.tf" => "terraform {}"
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use spacectx::documents;
/// documents!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! documents {
    // single document without source
    { $expr:expr } => {
        $crate::documents::Documents::from(hcl_edit::parser::parse_body($expr).expect("body must parse"))
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::documents::Documents::default();
        $(
            docs.insert(hcl_edit::parser::parse_body($expr).expect("body must parse"), Some($source.into()));
        )+

        docs
    }};
}

pub type Source = Option<PathBuf>;
pub type SourceAttribute<'a> = (usize, &'a Source, &'a Attribute);
pub type SourceBlock<'a> = (usize, &'a Source, &'a Block);
