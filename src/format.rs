//! Renders a parsed program back to source text. The output is
//! canonical rather than faithful to the input's layout: compound
//! expressions are parenthesized and bodies are re-indented, but
//! re-parsing the result yields an equivalent AST.

use crate::ast::{Expr, ExprKind, Iterable, MemberKey, Stmt, UnaryOp};

pub fn program_to_source(program: &[Stmt]) -> String {
    let mut out = String::new();
    for stmt in program {
        write_stmt(&mut out, stmt, 0);
    }
    out
}

pub fn expr_to_source(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, level: usize) {
    indent(out, level);
    match stmt {
        Stmt::Var { name, init } => {
            if init.kind == ExprKind::Empty {
                out.push_str("var ");
                out.push_str(name);
            } else {
                out.push_str("var ");
                out.push_str(name);
                out.push_str(" := ");
                write_expr(out, init);
            }
        }
        Stmt::Assign { target, value } => {
            write_expr(out, target);
            out.push_str(" := ");
            write_expr(out, value);
        }
        Stmt::Expr(expr) => write_expr(out, expr),
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => {
            out.push_str("if ");
            write_expr(out, cond);
            out.push_str(" then\n");
            for s in then_body {
                write_stmt(out, s, level + 1);
            }
            if !else_body.is_empty() {
                indent(out, level);
                out.push_str("else\n");
                for s in else_body {
                    write_stmt(out, s, level + 1);
                }
            }
            indent(out, level);
            out.push_str("end");
        }
        Stmt::While { cond, body } => {
            out.push_str("while ");
            write_expr(out, cond);
            out.push_str(" loop\n");
            for s in body {
                write_stmt(out, s, level + 1);
            }
            indent(out, level);
            out.push_str("end");
        }
        Stmt::For {
            var,
            iterable,
            body,
        } => {
            out.push_str("for ");
            out.push_str(var);
            out.push_str(" in ");
            match iterable {
                Iterable::Range(lo, hi) => {
                    write_expr(out, lo);
                    out.push_str("..");
                    write_expr(out, hi);
                }
                Iterable::Expr(expr) => write_expr(out, expr),
            }
            out.push_str(" loop\n");
            for s in body {
                write_stmt(out, s, level + 1);
            }
            indent(out, level);
            out.push_str("end");
        }
    }
    out.push_str(";\n");
}

/// Single-line rendering, used for statements inside function literals.
fn stmt_to_inline(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Var { name, init } => {
            if init.kind == ExprKind::Empty {
                format!("var {};", name)
            } else {
                format!("var {} := {};", name, expr_to_source(init))
            }
        }
        Stmt::Assign { target, value } => {
            format!("{} := {};", expr_to_source(target), expr_to_source(value))
        }
        Stmt::Expr(expr) => format!("{};", expr_to_source(expr)),
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => {
            let mut s = format!("if {} then ", expr_to_source(cond));
            for stmt in then_body {
                s.push_str(&stmt_to_inline(stmt));
                s.push(' ');
            }
            if !else_body.is_empty() {
                s.push_str("else ");
                for stmt in else_body {
                    s.push_str(&stmt_to_inline(stmt));
                    s.push(' ');
                }
            }
            s.push_str("end;");
            s
        }
        Stmt::While { cond, body } => {
            let mut s = format!("while {} loop ", expr_to_source(cond));
            for stmt in body {
                s.push_str(&stmt_to_inline(stmt));
                s.push(' ');
            }
            s.push_str("end;");
            s
        }
        Stmt::For {
            var,
            iterable,
            body,
        } => {
            let head = match iterable {
                Iterable::Range(lo, hi) => {
                    format!("{}..{}", expr_to_source(lo), expr_to_source(hi))
                }
                Iterable::Expr(expr) => expr_to_source(expr),
            };
            let mut s = format!("for {} in {} loop ", var, head);
            for stmt in body {
                s.push_str(&stmt_to_inline(stmt));
                s.push(' ');
            }
            s.push_str("end;");
            s
        }
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match &expr.kind {
        // Only valid as an omitted initializer; `write_stmt` never asks
        // for it.
        ExprKind::Empty => {}
        ExprKind::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        ExprKind::Int(n) => out.push_str(&n.to_string()),
        ExprKind::Real(r) => out.push_str(&format_real_literal(*r)),
        ExprKind::Str(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        ExprKind::Ident(name) => out.push_str(name),
        ExprKind::Array(elements) => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, element);
            }
            out.push(']');
        }
        ExprKind::Tuple(entries) => {
            out.push('{');
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if !entry.name.is_empty() {
                    out.push_str(&entry.name);
                    out.push_str(" := ");
                }
                write_expr(out, &entry.value);
            }
            out.push('}');
        }
        ExprKind::Func { params, body } => {
            out.push_str("(func(");
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(param);
            }
            out.push_str(") is ");
            for stmt in body.iter() {
                out.push_str(&stmt_to_inline(stmt));
                out.push(' ');
            }
            out.push_str("end)");
        }
        ExprKind::Index { target, index } => {
            write_expr(out, target);
            out.push('[');
            write_expr(out, index);
            out.push(']');
        }
        ExprKind::Member { target, key } => {
            write_expr(out, target);
            out.push('.');
            match key {
                MemberKey::Name(name) => out.push_str(name),
                MemberKey::Index(i) => out.push_str(&i.to_string()),
            }
        }
        ExprKind::Call { callee, args } => {
            write_expr(out, callee);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg);
            }
            out.push(')');
        }
        ExprKind::Unary { op, operand } => {
            out.push('(');
            out.push_str(match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
                UnaryOp::Not => "not ",
            });
            write_expr(out, operand);
            out.push(')');
        }
        ExprKind::Binary { op, lhs, rhs } => {
            out.push('(');
            write_expr(out, lhs);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr(out, rhs);
            out.push(')');
        }
        ExprKind::Is { operand, indicator } => {
            out.push('(');
            write_expr(out, operand);
            out.push_str(" is ");
            out.push_str(indicator.as_str());
            out.push(')');
        }
    }
}

/// Real literals are `digits "." digits`; fall back to a fixed-point
/// expansion when the shortest rendering uses an exponent.
fn format_real_literal(r: f64) -> String {
    let plain = format!("{:?}", r);
    if plain.contains('.') && plain.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return plain;
    }
    for precision in 1..=30 {
        let candidate = format!("{:.*}", precision, r);
        if candidate.parse::<f64>() == Ok(r) {
            return candidate;
        }
    }
    format!("{:.1}", r)
}
