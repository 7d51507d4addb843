//! context files on disk
//!
//! A context with name `<name>` is materialized by spacelift as up to two files:
//! - `ctx-<name>.json` containing all public outputs
//! - `ctx-<name>-secrets.json` containing all sensitive outputs (mounted write-only)
//!
//! Either file may be missing, for example when a context has no sensitive outputs or was not applied yet.
use std::path::Path;

/// Values of a single context, merged from all of its files
pub type ContextValues = indexmap::IndexMap<String, hcl::Value>;

/// Which partition of a context an output belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Public,
    Secret,
}

impl Sensitivity {
    /// All partitions in the order they are written and read
    ///
    /// Secret comes last so that its keys win when merging.
    pub const ALL: [Sensitivity; 2] = [Sensitivity::Public, Sensitivity::Secret];

    pub fn from_flag(sensitive: bool) -> Self {
        if sensitive {
            Sensitivity::Secret
        } else {
            Sensitivity::Public
        }
    }

    pub fn is_secret(self) -> bool {
        self == Sensitivity::Secret
    }

    /// Name of the context file, relative to the folder spacelift mounts it to
    pub fn file_name(self, context_name: &str) -> String {
        match self {
            Sensitivity::Public => format!("ctx-{context_name}.json"),
            Sensitivity::Secret => format!("ctx-{context_name}-secrets.json"),
        }
    }

    /// Name of the local holding the encoded file content (and of the mounted file resource)
    pub fn content_local(self) -> &'static str {
        match self {
            Sensitivity::Public => "out_sctx_content",
            Sensitivity::Secret => "out_sctx_content_secrets",
        }
    }
}

/// Loads and merges all files of context `name` found in `folder`
///
/// Files that are missing or unreadable are skipped.
pub fn load_context(folder: &Path, name: &str) -> ContextValues {
    let mut values = ContextValues::new();

    for sensitivity in Sensitivity::ALL {
        let path = folder.join(sensitivity.file_name(name));

        match read_context_file(&path) {
            Ok(file_values) => {
                tracing::debug!(path=%path.display(), keys=file_values.len(), "loaded context file");
                values.extend(file_values);
            }
            Err(reason) => {
                tracing::debug!(path=%path.display(), %reason, "context file not loaded, skipping");
            }
        }
    }

    values
}

fn read_context_file(path: &Path) -> anyhow::Result<ContextValues> {
    let contents = std::fs::read_to_string(path)?;
    let hcl::Value::Object(object) = serde_json::from_str::<hcl::Value>(&contents)? else {
        anyhow::bail!("not a json object");
    };

    Ok(object.into_iter().collect())
}

/// Values of all contexts in use, keyed by context name
#[derive(Debug, Default)]
pub struct ContextEnvironment {
    contexts: indexmap::IndexMap<String, ContextValues>,
}

impl ContextEnvironment {
    /// Loads each named context from `folder`
    pub fn load<'a>(folder: &Path, names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut environment = Self::default();
        for name in names {
            environment.insert(name, load_context(folder, name));
        }
        environment
    }

    pub fn insert(&mut self, name: impl Into<String>, values: ContextValues) {
        self.contexts.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&ContextValues> {
        self.contexts.get(name)
    }

    /// Evaluation context exposing all contexts as variable `context`
    pub fn eval_context(&self) -> hcl::eval::Context<'static> {
        let contexts: hcl::value::Map<String, hcl::Value> = self
            .contexts
            .iter()
            .map(|(name, values)| {
                let object: hcl::value::Map<String, hcl::Value> = values
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                (name.clone(), hcl::Value::Object(object))
            })
            .collect();

        let mut context = hcl::eval::Context::new();
        context.declare_var(crate::CONTEXT_NAMESPACE, hcl::Value::Object(contexts));
        context
    }
}
