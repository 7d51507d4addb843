//! Discovery of the contexts a variables file refers to
use crate::documents::Documents;
use crate::visit::VisitTraversals;
use crate::CONTEXT_NAMESPACE;
use hcl::{Expression, Traversal, TraversalOperator};

/// Names of all contexts referenced as `context.<name>...`, in order of first use
///
/// Only references into `context` can be resolved. Any other variable fails the scan rather than being left
/// unresolved.
pub fn scan_context_references(documents: &Documents) -> Result<Vec<String>, ScanError> {
    let mut traversals = vec![];
    for (_index, _source, attribute) in documents.attributes() {
        let expression: Expression = attribute.value.clone().into();
        expression.visit_traversals(&mut |traversal: &Traversal| {
            traversals.push((attribute.key.value().as_str().to_owned(), traversal.clone()))
        });
    }

    let mut names: Vec<String> = vec![];
    for (attribute, traversal) in traversals {
        let name = context_name(&attribute, &traversal)?;
        tracing::trace!(%attribute, %name, "context reference");

        if !names.contains(&name) {
            names.push(name);
        }
    }

    Ok(names)
}

fn context_name(attribute: &str, traversal: &Traversal) -> Result<String, ScanError> {
    let Expression::Variable(root) = &traversal.expr else {
        unreachable!("visitor only reports traversals rooted at a variable");
    };

    if root.as_str() != CONTEXT_NAMESPACE {
        return Err(ScanError::UnsupportedVariableReference {
            attribute: attribute.to_owned(),
            root: root.as_str().to_owned(),
        });
    }

    match traversal.operators.first() {
        Some(TraversalOperator::GetAttr(name)) => Ok(name.as_str().to_owned()),
        Some(TraversalOperator::Index(Expression::String(name))) => Ok(name.clone()),
        _ => Err(ScanError::MalformedContextReference {
            attribute: attribute.to_owned(),
        }),
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ScanError {
    #[error("attribute {attribute:?} refers to variable {root:?}, only \"context\" is supported")]
    UnsupportedVariableReference { attribute: String, root: String },
    #[error("attribute {attribute:?} must refer to a context as `context.<name>`")]
    MalformedContextReference { attribute: String },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::documents;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_seen_order_deduplicated() {
        let documents = documents! {r#"
        a = context.foo.x
        b = context.bar.y
        c = [context.foo.z, context.baz.w]
        "#};

        assert_eq!(
            scan_context_references(&documents).unwrap(),
            vec!["foo", "bar", "baz"]
        );
    }

    #[test]
    fn literals_need_no_context() {
        let documents = documents! {r#"
        a = 1
        b = "two"
        c = { d = true }
        "#};

        assert!(scan_context_references(&documents).unwrap().is_empty());
    }

    #[test]
    fn nested_references() {
        let documents = documents! {r#"
        a = "prefix-${context.foo.x}"
        b = { c = context.bar.y }
        d = context["baz"].z
        "#};

        assert_eq!(
            scan_context_references(&documents).unwrap(),
            vec!["foo", "bar", "baz"]
        );
    }

    #[test]
    fn loop_variables_are_not_references() {
        let documents = documents! {r#"
        a = "%{ for s in context.foo.list }${s},%{ endfor }"
        b = [for k, v in context.bar.map : "${k}=${v}"]
        "#};

        assert_eq!(
            scan_context_references(&documents).unwrap(),
            vec!["foo", "bar"]
        );
    }

    #[test]
    fn other_root_is_unsupported() {
        let documents = documents! {r#"
        a = context.foo.x
        b = var.region
        "#};

        assert_eq!(
            scan_context_references(&documents).unwrap_err(),
            ScanError::UnsupportedVariableReference {
                attribute: "b".into(),
                root: "var".into()
            }
        );
    }

    #[test]
    fn bare_context_is_malformed() {
        let documents = documents! {"a = context"};

        assert_eq!(
            scan_context_references(&documents).unwrap_err(),
            ScanError::MalformedContextReference {
                attribute: "a".into()
            }
        );
    }
}
