//! Synthesis of the spacelift context document
use crate::context::Sensitivity;
use crate::outputs::OutputDefinition;
use hcl::{Block, Body, Expression, Identifier, ObjectKey, Traversal, Variable};

const CONTEXT_RESOURCE_TYPE: &str = "spacelift_context";
const CONTEXT_RESOURCE_NAME: &str = "outputs";
const MOUNTED_FILE_RESOURCE_TYPE: &str = "spacelift_mounted_file";
const CONTEXT_DESCRIPTION: &str = "Auto generated context by spacectx";

/// Serialized documents produced by [ContextGenerator::generate]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    /// Context resource, mounted files and locals
    pub context: String,
    /// Provider requirement, only present when the source documents lack one
    pub provider_requirements: Option<String>,
}

#[derive(derive_new::new, Debug)]
pub struct ContextGenerator {
    context_name: String,
    provider_version: String,
}

impl ContextGenerator {
    /// Renders the context document for `outputs`
    ///
    /// The result only depends on the arguments, repeated calls produce identical bytes.
    pub fn generate(
        &self,
        outputs: &[OutputDefinition],
        provider_requirement_exists: bool,
    ) -> Result<GeneratedFiles, GenerateError> {
        if outputs.is_empty() {
            return Err(GenerateError::NoOutputs);
        }

        let context = hcl::format::to_string(&self.context_body(outputs))?;

        let provider_requirements = if provider_requirement_exists {
            tracing::debug!("provider requirement exists, not generating one");
            None
        } else {
            Some(hcl::format::to_string(&self.provider_requirements_body())?)
        };

        Ok(GeneratedFiles {
            context,
            provider_requirements,
        })
    }

    pub fn context_body(&self, outputs: &[OutputDefinition]) -> Body {
        let context_resource = Block::builder("resource")
            .add_label(CONTEXT_RESOURCE_TYPE)
            .add_label(CONTEXT_RESOURCE_NAME)
            .add_attribute(("name", self.context_name.as_str()))
            .add_attribute(("description", CONTEXT_DESCRIPTION))
            .build();

        // a repeated output name replaces the earlier value in place
        let mut raw_values = indexmap::IndexMap::new();
        for output in outputs {
            let previous = raw_values.insert(output.local_name(), output);
            if previous.is_some_and(|previous| previous.sensitive != output.sensitive) {
                tracing::warn!(
                    name = %output.name,
                    sensitive = output.sensitive,
                    "output redefined with different sensitivity, both content files will carry the last value"
                );
            }
        }

        let mut locals = Block::builder("locals");
        for (name, OutputDefinition { expression, .. }) in raw_values {
            locals = locals.add_attribute((name, expression));
        }

        let mut mounted_files = vec![];
        for sensitivity in Sensitivity::ALL {
            let members: Vec<_> = outputs
                .iter()
                .filter(|output| Sensitivity::from_flag(output.sensitive) == sensitivity)
                .collect();

            if members.is_empty() {
                continue;
            }

            tracing::debug!(?sensitivity, count = members.len(), "adding partition");

            let content = Identifier::unchecked(sensitivity.content_local());
            let raw = Identifier::unchecked(format!("{content}_raw"));

            let object: hcl::Object<ObjectKey, Expression> = members
                .iter()
                .map(|output| {
                    (
                        ObjectKey::from(output.name.clone()),
                        local(output.local_name()),
                    )
                })
                .collect();

            locals = locals
                .add_attribute((raw.clone(), Expression::Object(object)))
                .add_attribute((content.clone(), encoded(raw)));

            mounted_files.push(self.mounted_file(sensitivity, content));
        }

        Body::builder()
            .add_block(context_resource)
            .add_block(locals.build())
            .add_blocks(mounted_files)
            .build()
    }

    fn mounted_file(&self, sensitivity: Sensitivity, content: Identifier) -> Block {
        let context_id = Traversal::builder(Variable::unchecked(CONTEXT_RESOURCE_TYPE))
            .attr(CONTEXT_RESOURCE_NAME)
            .attr("id")
            .build();

        Block::builder("resource")
            .add_label(MOUNTED_FILE_RESOURCE_TYPE)
            .add_label(content.as_str())
            .add_attribute(("context_id", context_id))
            .add_attribute(("relative_path", sensitivity.file_name(&self.context_name)))
            .add_attribute(("write_only", sensitivity.is_secret()))
            .add_attribute(("content", local(content)))
            .build()
    }

    /// `terraform { required_providers { spacelift = { ... } } }`
    pub fn provider_requirements_body(&self) -> Body {
        let requirement: hcl::Object<ObjectKey, Expression> = [
            ("source", crate::PROVIDER_SOURCE.to_owned()),
            ("version", format!("~> {}", self.provider_version)),
        ]
        .into_iter()
        .map(|(key, value)| {
            (
                ObjectKey::from(Identifier::unchecked(key)),
                Expression::from(value),
            )
        })
        .collect();

        let required_providers = Block::builder("required_providers")
            .add_attribute((crate::PROVIDER_NAME, Expression::Object(requirement)))
            .build();

        Body::builder()
            .add_block(
                Block::builder("terraform")
                    .add_block(required_providers)
                    .build(),
            )
            .build()
    }
}

/// `local.<name>`
fn local(name: Identifier) -> Expression {
    Traversal::builder(Variable::unchecked("local"))
        .attr(name)
        .build()
        .into()
}

/// `base64encode(jsonencode(local.<name>))`
fn encoded(name: Identifier) -> Expression {
    let json = hcl::expr::FuncCall::builder("jsonencode")
        .arg(local(name))
        .build();

    hcl::expr::FuncCall::builder("base64encode")
        .arg(json)
        .build()
        .into()
}

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error("no outputs to generate a context from")]
    NoOutputs,
    #[error("failed to format generated document")]
    Format(#[from] hcl::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::documents;
    use crate::outputs::collect_outputs;
    use pretty_assertions::assert_eq;

    fn generator() -> ContextGenerator {
        ContextGenerator::new("network".into(), "1.0".into())
    }

    fn outputs(source: &str) -> Vec<OutputDefinition> {
        collect_outputs(&documents!(source)).unwrap()
    }

    fn generated_body(source: &str) -> Body {
        let files = generator().generate(&outputs(source), true).unwrap();
        hcl::parse(&files.context).expect("generated document must parse")
    }

    fn expression(source: &str) -> Expression {
        let body = hcl::parse(&format!("x = {source}")).unwrap();
        body.into_attributes().next().unwrap().expr
    }

    fn block_headers(body: &Body) -> Vec<String> {
        body.blocks()
            .map(|block| {
                let labels: Vec<_> = block.labels.iter().map(|l| l.as_str()).collect();
                format!("{} {}", block.identifier, labels.join(" "))
                    .trim()
                    .to_owned()
            })
            .collect()
    }

    fn find_block<'a>(body: &'a Body, ident: &str, labels: &[&str]) -> &'a Block {
        body.blocks()
            .find(|block| {
                block.identifier.as_str() == ident
                    && block.labels.iter().map(|l| l.as_str()).eq(labels.iter().copied())
            })
            .unwrap_or_else(|| panic!("block {ident} {labels:?} not found"))
    }

    fn attributes(block: &Block) -> Vec<(String, Expression)> {
        block
            .body
            .attributes()
            .map(|attribute| (attribute.key.to_string(), attribute.expr.clone()))
            .collect()
    }

    const MIXED: &str = r#"
    output "vpc_id" { value = aws_vpc.main.id }
    output "password" {
      value     = random_password.db.result
      sensitive = true
    }
    output "region" { value = "eu-west-1" }
    "#;

    #[test]
    fn block_layout() {
        let body = generated_body(MIXED);

        assert_eq!(
            block_headers(&body),
            vec![
                "resource spacelift_context outputs",
                "locals",
                "resource spacelift_mounted_file out_sctx_content",
                "resource spacelift_mounted_file out_sctx_content_secrets",
            ]
        );
    }

    #[test]
    fn context_resource() {
        let body = generated_body(MIXED);
        let block = find_block(&body, "resource", &["spacelift_context", "outputs"]);

        assert_eq!(
            attributes(block),
            vec![
                ("name".into(), expression(r#""network""#)),
                (
                    "description".into(),
                    expression(r#""Auto generated context by spacectx""#)
                ),
            ]
        );
    }

    #[test]
    fn locals_copy_raw_values_and_partition() {
        let body = generated_body(MIXED);
        let block = find_block(&body, "locals", &[]);

        assert_eq!(
            attributes(block),
            vec![
                ("out_vpc_id".into(), expression("aws_vpc.main.id")),
                ("out_password".into(), expression("random_password.db.result")),
                ("out_region".into(), expression(r#""eu-west-1""#)),
                (
                    "out_sctx_content_raw".into(),
                    expression("{\n vpc_id = local.out_vpc_id\n region = local.out_region\n}")
                ),
                (
                    "out_sctx_content".into(),
                    expression("base64encode(jsonencode(local.out_sctx_content_raw))")
                ),
                (
                    "out_sctx_content_secrets_raw".into(),
                    expression("{\n password = local.out_password\n}")
                ),
                (
                    "out_sctx_content_secrets".into(),
                    expression("base64encode(jsonencode(local.out_sctx_content_secrets_raw))")
                ),
            ]
        );
    }

    #[test]
    fn mounted_files() {
        let body = generated_body(MIXED);

        let public = find_block(
            &body,
            "resource",
            &["spacelift_mounted_file", "out_sctx_content"],
        );
        assert_eq!(
            attributes(public),
            vec![
                ("context_id".into(), expression("spacelift_context.outputs.id")),
                ("relative_path".into(), expression(r#""ctx-network.json""#)),
                ("write_only".into(), expression("false")),
                ("content".into(), expression("local.out_sctx_content")),
            ]
        );

        let secret = find_block(
            &body,
            "resource",
            &["spacelift_mounted_file", "out_sctx_content_secrets"],
        );
        assert_eq!(
            attributes(secret),
            vec![
                ("context_id".into(), expression("spacelift_context.outputs.id")),
                (
                    "relative_path".into(),
                    expression(r#""ctx-network-secrets.json""#)
                ),
                ("write_only".into(), expression("true")),
                ("content".into(), expression("local.out_sctx_content_secrets")),
            ]
        );
    }

    #[test]
    fn only_public_partition() {
        let body = generated_body(r#"output "a" { value = 1 }"#);

        assert_eq!(
            block_headers(&body),
            vec![
                "resource spacelift_context outputs",
                "locals",
                "resource spacelift_mounted_file out_sctx_content",
            ]
        );
    }

    #[test]
    fn only_secret_partition() {
        let body = generated_body(
            r#"
            output "a" {
              value     = 1
              sensitive = true
            }"#,
        );

        assert_eq!(
            block_headers(&body),
            vec![
                "resource spacelift_context outputs",
                "locals",
                "resource spacelift_mounted_file out_sctx_content_secrets",
            ]
        );
    }

    #[test]
    fn duplicate_names_overwrite() {
        let body = generated_body(
            r#"
            output "a" { value = 1 }
            output "b" { value = 2 }
            output "a" { value = 3 }
            "#,
        );
        let block = find_block(&body, "locals", &[]);

        assert_eq!(
            attributes(block),
            vec![
                ("out_a".into(), expression("3")),
                ("out_b".into(), expression("2")),
                (
                    "out_sctx_content_raw".into(),
                    expression("{\n a = local.out_a\n b = local.out_b\n}")
                ),
                (
                    "out_sctx_content".into(),
                    expression("base64encode(jsonencode(local.out_sctx_content_raw))")
                ),
            ]
        );
    }

    #[test]
    fn duplicate_names_across_partitions_share_the_last_value() {
        let body = generated_body(
            r#"
            output "a" { value = 1 }
            output "a" {
              value     = 2
              sensitive = true
            }
            "#,
        );
        let block = find_block(&body, "locals", &[]);

        assert_eq!(
            attributes(block),
            vec![
                ("out_a".into(), expression("2")),
                (
                    "out_sctx_content_raw".into(),
                    expression("{\n a = local.out_a\n}")
                ),
                (
                    "out_sctx_content".into(),
                    expression("base64encode(jsonencode(local.out_sctx_content_raw))")
                ),
                (
                    "out_sctx_content_secrets_raw".into(),
                    expression("{\n a = local.out_a\n}")
                ),
                (
                    "out_sctx_content_secrets".into(),
                    expression("base64encode(jsonencode(local.out_sctx_content_secrets_raw))")
                ),
            ]
        );
    }

    #[test]
    fn deterministic() {
        let outputs = outputs(MIXED);

        let first = generator().generate(&outputs, false).unwrap();
        let second = generator().generate(&outputs, false).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn empty_outputs_error() {
        let err = generator().generate(&[], false).unwrap_err();
        assert!(matches!(err, GenerateError::NoOutputs));
    }

    #[test]
    fn provider_requirements() {
        let files = generator().generate(&outputs(MIXED), false).unwrap();
        let body = hcl::parse(files.provider_requirements.as_deref().unwrap()).unwrap();

        let terraform = find_block(&body, "terraform", &[]);
        let required_providers = find_block(&terraform.body, "required_providers", &[]);

        assert_eq!(
            attributes(required_providers),
            vec![(
                "spacelift".into(),
                expression("{\n source = \"spacelift-io/spacelift\"\n version = \"~> 1.0\"\n}")
            )]
        );
    }

    #[test]
    fn provider_requirements_skipped_when_present() {
        let files = generator().generate(&outputs(MIXED), true).unwrap();
        assert_eq!(files.provider_requirements, None);
    }
}
