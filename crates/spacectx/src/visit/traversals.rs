use super::Visit;
use hcl::{
    template::{Directive, Element},
    Expression, Identifier, Operation, Template, Traversal, TraversalOperator,
};

/// Recursively visit all variable references as [hcl::Traversal]s
///
/// A bare variable is reported as a traversal without operators. Variables nested inside a traversal (for example
/// in an index expression) are reported separately.
pub trait VisitTraversals {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>);
}

impl VisitTraversals for Expression {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>) {
        match self {
            Expression::Variable(variable) => {
                let traversal = Traversal::new(
                    Expression::Variable(variable.clone()),
                    Vec::<TraversalOperator>::new(),
                );
                visitor.visit(&traversal);
            }
            Expression::Traversal(traversal) => {
                if matches!(traversal.expr, Expression::Variable(_)) {
                    visitor.visit(traversal);
                } else {
                    traversal.expr.visit_traversals(visitor);
                }

                for operator in &traversal.operators {
                    if let TraversalOperator::Index(index) = operator {
                        index.visit_traversals(visitor);
                    }
                }
            }
            Expression::Array(array) => {
                for expr in array {
                    expr.visit_traversals(visitor);
                }
            }
            Expression::Object(object) => {
                for (key, value) in object.iter() {
                    if let hcl::ObjectKey::Expression(key) = key {
                        key.visit_traversals(visitor);
                    }
                    value.visit_traversals(visitor);
                }
            }
            Expression::TemplateExpr(template_expr) => {
                match Template::from_expr(template_expr) {
                    Ok(template) => template.visit_traversals(visitor),
                    Err(err) => tracing::debug!(%err, "template not scanned for references"),
                }
            }
            Expression::FuncCall(func_call) => {
                for arg in &func_call.args {
                    arg.visit_traversals(visitor);
                }
            }
            Expression::Parenthesis(expr) => {
                expr.visit_traversals(visitor);
            }
            Expression::Conditional(cond) => {
                cond.cond_expr.visit_traversals(visitor);
                cond.true_expr.visit_traversals(visitor);
                cond.false_expr.visit_traversals(visitor);
            }
            Expression::Operation(operation) => match &**operation {
                Operation::Binary(binop) => {
                    binop.lhs_expr.visit_traversals(visitor);
                    binop.rhs_expr.visit_traversals(visitor);
                }
                Operation::Unary(unop) => {
                    unop.expr.visit_traversals(visitor);
                }
            },
            Expression::ForExpr(forexpr) => {
                forexpr.collection_expr.visit_traversals(visitor);

                let bound = [Some(&forexpr.value_var), forexpr.key_var.as_ref()];
                visit_scoped(&bound, visitor, |scoped| {
                    forexpr
                        .key_expr
                        .iter()
                        .for_each(|e| e.visit_traversals(scoped));
                    forexpr.value_expr.visit_traversals(scoped);
                    forexpr
                        .cond_expr
                        .iter()
                        .for_each(|e| e.visit_traversals(scoped));
                });
            }
            _ => {}
        }
    }
}

/// Runs `visit` with a visitor that drops traversals rooted at one of the `bound` iterator variables
fn visit_scoped(
    bound: &[Option<&Identifier>],
    visitor: &mut dyn Visit<Traversal>,
    visit: impl FnOnce(&mut dyn Visit<Traversal>),
) {
    let mut scoped = |traversal: &Traversal| {
        let is_bound = matches!(
            &traversal.expr,
            Expression::Variable(var) if bound.iter().flatten().any(|b| b.as_str() == var.as_str())
        );
        if !is_bound {
            visitor.visit(traversal);
        }
    };
    visit(&mut scoped);
}

impl VisitTraversals for Template {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>) {
        for element in self.elements() {
            match element {
                Element::Interpolation(interpolation) => {
                    interpolation.expr.visit_traversals(visitor);
                }
                Element::Directive(directive) => match directive {
                    Directive::If(ifdir) => {
                        ifdir.cond_expr.visit_traversals(visitor);
                        ifdir.true_template.visit_traversals(visitor);
                        ifdir
                            .false_template
                            .iter()
                            .for_each(|t| t.visit_traversals(visitor));
                    }
                    Directive::For(fordir) => {
                        fordir.collection_expr.visit_traversals(visitor);

                        let bound = [Some(&fordir.value_var), fordir.key_var.as_ref()];
                        visit_scoped(&bound, visitor, |scoped| {
                            fordir.template.visit_traversals(scoped);
                        });
                    }
                },
                Element::Literal(_) => {}
            }
        }
    }
}
