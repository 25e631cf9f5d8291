use std::str::FromStr;

use crate::ast::{ASTNode, Expression, Function, Prototype};

/// How a parsed unit is rendered for the user.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Format {
    /// Canonical source form, readable by the parser again.
    Source,
    /// Descriptive tree dump.
    Outline,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Format::Source),
            "outline" => Ok(Format::Outline),
            other => Err(format!("unknown format {}", other)),
        }
    }
}

pub fn render(node: &ASTNode, format: Format) -> String {
    match format {
        Format::Source => node.to_string(),
        Format::Outline => match node {
            ASTNode::Extern(prototype) => outline_prototype(prototype),
            ASTNode::Function(function) => outline_function(function),
        },
    }
}

fn outline_expr(expr: &Expression) -> String {
    match expr {
        Expression::Number(value) => format!("{:.6}", value),
        Expression::Variable(name) => name.clone(),
        Expression::Binary(op, lhs, rhs) => {
            format!("({} {} {})", outline_expr(lhs), op, outline_expr(rhs))
        }
        Expression::Call(callee, args) => {
            let mut out = format!("(call: {}", callee);
            for arg in args {
                out.push(' ');
                out.push_str(&outline_expr(arg));
            }
            out.push(')');
            out
        }
    }
}

fn outline_prototype(prototype: &Prototype) -> String {
    let mut out = format!("prototype: {}", prototype.name);
    for arg in &prototype.args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}

fn outline_function(function: &Function) -> String {
    format!(
        "function def {}\n{}",
        outline_prototype(&function.prototype),
        outline_expr(&function.body)
    )
}
