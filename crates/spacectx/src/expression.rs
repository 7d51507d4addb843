//! expressions that are copied, never evaluated
use hcl_edit::expr::Expression;

/// An expression taken verbatim from a source document
///
/// Generated documents must keep depending on the values the source module computes at apply time, so these are
/// only ever re-serialized exactly as they were written.
#[derive(Debug, Clone)]
pub struct OpaqueExpression(Expression);

impl OpaqueExpression {
    pub fn new(expression: Expression) -> Self {
        Self(expression)
    }

    /// The expression's source text without surrounding whitespace
    pub fn source(&self) -> String {
        self.0.to_string().trim().to_owned()
    }

    /// Whether this is exactly the literal `true`
    ///
    /// Anything else (`"true"`, `(true)`, a variable that happens to evaluate to true, ...) is not.
    pub fn is_literal_true(&self) -> bool {
        matches!(&self.0, Expression::Bool(value) if *value.value())
    }
}

impl From<&OpaqueExpression> for hcl::Expression {
    fn from(value: &OpaqueExpression) -> Self {
        hcl::expr::RawExpression::new(value.source()).into()
    }
}
