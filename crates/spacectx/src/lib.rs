//! # spacectx - spacelift contexts from terraform outputs
//!
//! `spacectx` has two independent halves:
//!
//! - **generate**: collect every `output` block of a terraform module and synthesize a document that publishes
//!   those outputs as a spacelift context
//! - **process**: resolve `context.<name>.<key>` references in a `.tfvars` file against the context files that
//!   spacelift mounted on disk
//!
//! ## Introduction for developers
//!
//! ### Loading files
//!
//! Terraform files are parsed with [hcl_edit] which keeps the lossless syntax tree. [documents::Documents] stores the
//! root blocks and root attributes of every loaded file and remembers where they came from so errors can point at
//! the source file.
//!
//! ### Generating
//!
//! [outputs::collect_outputs] finds all output blocks. The `value` expression of an output is kept as an
//! [expression::OpaqueExpression]: it is copied into the generated document as-is and never evaluated, because at
//! generation time the module has not been applied yet.
//!
//! Given these outputs of a context named `network`...
//!
//! ```hcl
//! output "vpc_id" {
//!   value = aws_vpc.main.id
//! }
//!
//! output "db_password" {
//!   value     = random_password.db.result
//!   sensitive = true
//! }
//! ```
//!
//! ...[generate::ContextGenerator] produces (formatting aside)
//!
//! ```hcl
//! resource "spacelift_context" "outputs" {
//!   name        = "network"
//!   description = "Auto generated context by spacectx"
//! }
//!
//! locals {
//!   out_vpc_id      = aws_vpc.main.id
//!   out_db_password = random_password.db.result
//!
//!   out_sctx_content_raw         = { vpc_id = local.out_vpc_id }
//!   out_sctx_content             = base64encode(jsonencode(local.out_sctx_content_raw))
//!   out_sctx_content_secrets_raw = { db_password = local.out_db_password }
//!   out_sctx_content_secrets     = base64encode(jsonencode(local.out_sctx_content_secrets_raw))
//! }
//!
//! resource "spacelift_mounted_file" "out_sctx_content" {
//!   context_id    = spacelift_context.outputs.id
//!   relative_path = "ctx-network.json"
//!   write_only    = false
//!   content       = local.out_sctx_content
//! }
//!
//! resource "spacelift_mounted_file" "out_sctx_content_secrets" {
//!   context_id    = spacelift_context.outputs.id
//!   relative_path = "ctx-network-secrets.json"
//!   write_only    = true
//!   content       = local.out_sctx_content_secrets
//! }
//! ```
//!
//! ### Processing
//!
//! Once a stack has the context attached, spacelift mounts `ctx-network.json` (and `ctx-network-secrets.json`). A
//! tfvars file may then refer to those values:
//!
//! ```hcl
//! vpc_id = context.network.vpc_id
//! ```
//!
//! [references::scan_context_references] finds all context names in use, [context::ContextEnvironment] loads their
//! files and [resolve::resolve] evaluates each attribute with [hcl::eval]. The only variable known to the evaluation
//! context is `context`, anything else is rejected up front.
pub mod context;
pub mod documents;
pub mod expression;
pub mod generate;
pub mod outputs;
pub mod references;
pub mod resolve;
mod visit;

/// Root identifier of all references that can be resolved by `process`
pub const CONTEXT_NAMESPACE: &str = "context";

/// File `generate` writes to unless told otherwise
pub const DEFAULT_OUTPUT_FILE: &str = "spacelift_context.tf";

/// File holding the provider requirement when the module does not declare one
///
/// Terraform merges `*_override.tf` files into existing blocks so this never collides with a user authored
/// `required_providers` block.
pub const PROVIDER_OVERRIDE_FILE: &str = "spacelift_override.tf";

/// Version constraint used for the spacelift provider (as `~> <version>`)
pub const DEFAULT_PROVIDER_VERSION: &str = "1.0";

/// Name of the provider in `required_providers`
pub const PROVIDER_NAME: &str = "spacelift";

/// Registry source of the provider
pub const PROVIDER_SOURCE: &str = "spacelift-io/spacelift";
