use syn::{visit::Visit, Expr};

/// File-level cyclomatic complexity: 1 plus every decision point found in a
/// single traversal (conditionals, loops, match arms, lazy boolean operators,
/// and `?` propagation points).
pub fn file_complexity(ast: &syn::File) -> u32 {
    let mut visitor = CyclomaticVisitor { complexity: 1 };
    visitor.visit_file(ast);
    visitor.complexity
}

struct CyclomaticVisitor {
    complexity: u32,
}

fn expr_decision_points(expr: &Expr) -> u32 {
    match expr {
        Expr::If(_) | Expr::While(_) | Expr::ForLoop(_) | Expr::Loop(_) | Expr::Try(_) => 1,
        Expr::Match(expr_match) => expr_match.arms.len() as u32,
        Expr::Binary(binary) if is_logical_operator(&binary.op) => 1,
        _ => 0,
    }
}

impl<'ast> Visit<'ast> for CyclomaticVisitor {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        self.complexity += expr_decision_points(expr);
        syn::visit::visit_expr(self, expr);
    }
}

fn is_logical_operator(op: &syn::BinOp) -> bool {
    matches!(op, syn::BinOp::And(_) | syn::BinOp::Or(_))
}
