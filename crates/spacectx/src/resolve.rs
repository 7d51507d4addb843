//! Evaluation of variables files against loaded contexts
use crate::context::ContextEnvironment;
use crate::documents::Documents;
use crate::references::{scan_context_references, ScanError};
use hcl::eval::Evaluate;
use std::path::Path;

/// Evaluates every root attribute of `documents`
///
/// Returns a body with the same attributes in the same order, each holding its literal value. The first attribute
/// that fails to evaluate aborts the whole run.
pub fn resolve(
    documents: &Documents,
    environment: &ContextEnvironment,
) -> Result<hcl::Body, ResolveError> {
    if let Some((index, _source, block)) = documents.blocks().next() {
        return Err(ResolveError::UnexpectedBlock {
            block: index,
            ident: block.ident.value().as_str().to_owned(),
        });
    }

    let context = environment.eval_context();
    let mut body = hcl::Body::builder();

    for (_index, _source, attribute) in documents.attributes() {
        let key = attribute.key.value().as_str();
        let expression: hcl::Expression = attribute.value.clone().into();

        let value = expression
            .evaluate(&context)
            .map_err(|source| ResolveError::Evaluation {
                attribute: key.to_owned(),
                source: source.into(),
            })?;

        tracing::debug!(attribute = key, "resolved");
        body = body.add_attribute((hcl::Identifier::unchecked(key), value));
    }

    Ok(body.build())
}

/// Resolves a variables file with contexts read from `context_folder`
///
/// Scans for context references, loads the referenced contexts, evaluates all attributes and formats the result.
pub fn process(documents: &Documents, context_folder: &Path) -> Result<String, ProcessError> {
    let names = scan_context_references(documents)?;
    tracing::debug!(?names, folder=%context_folder.display(), "loading contexts");

    let environment = ContextEnvironment::load(context_folder, names.iter().map(String::as_str));
    let body = resolve(documents, &environment)?;

    Ok(hcl::format::to_string(&body)?)
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("variables files may only contain attributes, found block #{block} ({ident})")]
    UnexpectedBlock { block: usize, ident: String },
    #[error("failed to evaluate attribute {attribute:?}")]
    Evaluation {
        attribute: String,
        #[source]
        source: hcl::eval::Errors,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to format resolved document")]
    Format(#[from] hcl::Error),
}
