use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub struct Prototype {
    pub name: String,
    pub args: Vec<String>,
}

impl Prototype {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Number(f64),
    Variable(String),
    Binary(char, Box<Expression>, Box<Expression>),
    Call(String, Vec<Expression>),
}

impl Expression {
    pub fn binary(op: char, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary(op, Box::new(lhs), Box::new(rhs))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Function {
    pub prototype: Prototype,
    pub body: Expression,
}

impl Function {
    /// Wraps a top-level expression in a nameless, parameterless function.
    pub fn anonymous(body: Expression) -> Self {
        Self {
            prototype: Prototype::new("", Vec::new()),
            body,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.prototype.name.is_empty()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ASTNode {
    Extern(Prototype),
    Function(Function),
}

// Display writes the canonical source form, which the parser reads back into
// an equal tree.

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(value) => write!(f, "{}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Binary(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op, rhs),
            Expression::Call(callee, args) => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(" "))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            write!(f, "{}", self.body)
        } else {
            write!(f, "def {} {}", self.prototype, self.body)
        }
    }
}

impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNode::Extern(prototype) => write!(f, "extern {}", prototype),
            ASTNode::Function(function) => write!(f, "{}", function),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> Expression {
        Expression::Variable(name.to_string())
    }

    #[test]
    fn display_fully_parenthesises() {
        let expr = Expression::binary(
            '+',
            Expression::Number(1.0),
            Expression::binary('*', Expression::Number(2.5), var("x")),
        );
        assert_eq!(expr.to_string(), "(1 + (2.5 * x))");
    }

    #[test]
    fn display_call() {
        let expr = Expression::Call(
            "foo".to_string(),
            vec![Expression::Number(1.0), Expression::binary('-', var("a"), var("b"))],
        );
        assert_eq!(expr.to_string(), "foo(1, (a - b))");
        assert_eq!(Expression::Call("bar".to_string(), vec![]).to_string(), "bar()");
    }

    #[test]
    fn display_units() {
        let proto = Prototype::new("sin", vec!["x".to_string()]);
        assert_eq!(ASTNode::Extern(proto).to_string(), "extern sin(x)");

        let def = Function {
            prototype: Prototype::new("add", vec!["a".to_string(), "b".to_string()]),
            body: Expression::binary('+', var("a"), var("b")),
        };
        assert_eq!(ASTNode::Function(def).to_string(), "def add(a b) (a + b)");

        let top = Function::anonymous(Expression::Number(4.0));
        assert!(top.is_anonymous());
        assert_eq!(ASTNode::Function(top).to_string(), "4");
    }
}
