//! Collection of `output` blocks
use crate::documents::{Documents, Source};
use crate::expression::OpaqueExpression;
use std::path::PathBuf;

/// A single `output "<name>" { ... }` block
#[derive(derive_new::new, Debug, Clone)]
pub struct OutputDefinition {
    pub name: hcl::Identifier,
    pub sensitive: bool,
    pub expression: OpaqueExpression,
}

impl OutputDefinition {
    /// Name of the local holding the raw output value
    pub fn local_name(&self) -> hcl::Identifier {
        hcl::Identifier::unchecked(format!("out_{}", self.name))
    }
}

/// Finds all output blocks in document and block order
pub fn collect_outputs(documents: &Documents) -> Result<Vec<OutputDefinition>, CollectError> {
    let mut outputs = vec![];

    for (index, source, block) in documents.blocks() {
        if block.ident.value().as_str() != "output" {
            continue;
        }

        let Some(label) = block.labels.first() else {
            return Err(CollectError::MalformedOutput {
                block: index,
                source_path: source_path(source),
                reason: "missing name label",
            });
        };

        let name = hcl::Identifier::new(label.as_str()).map_err(|_| {
            CollectError::MalformedOutput {
                block: index,
                source_path: source_path(source),
                reason: "name is not a valid identifier",
            }
        })?;

        let mut sensitive = false;
        let mut value = None;
        for attribute in block.body.attributes() {
            match attribute.key.value().as_str() {
                "sensitive" => {
                    sensitive = OpaqueExpression::new(attribute.value.clone()).is_literal_true()
                }
                "value" => value = Some(OpaqueExpression::new(attribute.value.clone())),
                _ => {}
            }
        }

        let Some(expression) = value else {
            return Err(CollectError::MissingValueAttribute {
                name: name.to_string(),
                source_path: source_path(source),
            });
        };

        tracing::debug!(%name, sensitive, "found output");
        outputs.push(OutputDefinition::new(name, sensitive, expression));
    }

    Ok(outputs)
}

fn source_path(source: &Source) -> PathBuf {
    source.clone().unwrap_or_else(|| PathBuf::from("<unknown>"))
}

#[derive(thiserror::Error, Debug)]
pub enum CollectError {
    #[error("malformed output block #{block} in {}: {reason}", source_path.display())]
    MalformedOutput {
        block: usize,
        source_path: PathBuf,
        reason: &'static str,
    },
    #[error("output {name:?} in {} has no value attribute", source_path.display())]
    MissingValueAttribute { name: String, source_path: PathBuf },
}
