use kaleidoscope::{
    ast::{ASTNode, Expression, Function, Prototype},
    lexer::{LineLexer, Token},
    parse_str,
    printer::{render, Format},
    ParseError, Parser,
};
use pretty_assertions::assert_eq;

const PROGRAM: &str = "
# trig helpers
extern sin(x);
extern cos(x);

def square(x) x * x;
def norm(a b)
    square(sin(a)) + square(cos(b));

norm(1.5, 2) < 1;
";

#[test]
fn parses_a_whole_program() {
    let nodes = parse_str(PROGRAM).unwrap();
    let rendered: Vec<String> = nodes.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "extern sin(x)",
            "extern cos(x)",
            "def square(x) (x * x)",
            "def norm(a b) (square(sin(a)) + square(cos(b)))",
            "(norm(1.5, 2) < 1)",
        ]
    );
}

#[test]
fn canonical_output_reparses_to_equal_units() {
    let nodes = parse_str(PROGRAM).unwrap();
    let source: Vec<String> = nodes.iter().map(ToString::to_string).collect();
    assert_eq!(parse_str(&source.join(";\n")).unwrap(), nodes);
}

#[test]
fn line_lexer_matches_string_input() {
    let from_lines: Vec<_> = Parser::new(LineLexer::new(PROGRAM.as_bytes())).collect();
    let expected: Vec<Result<ASTNode, ParseError>> =
        parse_str(PROGRAM).unwrap().into_iter().map(Ok).collect();
    assert_eq!(from_lines, expected);
}

#[test]
fn bad_unit_does_not_hide_later_units() {
    let input = "def broken(a b\nextern ok(x)\n1 + + 2; def fine() 3";
    let results: Vec<_> = Parser::new(LineLexer::new(input.as_bytes())).collect();
    assert_eq!(
        results,
        vec![
            Err(ParseError::ExpectedPrototypeClose(Token::Extern)),
            Ok(ASTNode::Extern(Prototype::new("ok", vec!["x".to_string()]))),
            Err(ParseError::ExpectedExpression(Token::Char('+'))),
            Ok(ASTNode::Function(Function {
                prototype: Prototype::new("fine", vec![]),
                body: Expression::Number(3.0),
            })),
        ]
    );
}

#[test]
fn outline_matches_tree_dump() {
    let nodes = parse_str("def foo(a b) a+b").unwrap();
    assert_eq!(
        render(&nodes[0], Format::Outline),
        "function def prototype: foo a b\n(a + b)"
    );
}

#[test]
fn large_literals_round_trip_or_fail_cleanly() {
    let finite = parse_str(&"9".repeat(300)).unwrap();
    assert_eq!(parse_str(&finite[0].to_string()).unwrap(), finite);

    let err = parse_str(&"9".repeat(400)).unwrap_err();
    assert!(err.to_string().contains("out of range"));
}
