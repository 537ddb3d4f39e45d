use super::tokenizer::{Number, TokenType};
use super::{ParseTree, Parser, SyntaxError, Tokenizer};

fn parse_string(input: &str) -> Result<ParseTree, SyntaxError> {
    Parser::new(Tokenizer::new(input)).parse()
}

fn parse_tree_matches(input: &str, tree_repr: &str) {
    match parse_string(input) {
        Ok(tree) => {
            let result_repr = format!("{tree:?}");
            assert!(
                result_repr.contains(tree_repr),
                "\nFailed to parse \"{}\":\nexpected \"{}\" somewhere in \"{}\"\n",
                input,
                tree_repr,
                result_repr
            )
        }
        Err(error) => panic!("\nFailed to parse \"{input}\": {error}\n"),
    }
}

fn assert_syntax_error(input: &str, msg: &str) {
    match parse_string(input) {
        Ok(tree) => panic!("\nExpected \"{input}\" to fail, got {tree:?}\n"),
        Err(error) => {
            let error_repr = format!("{error}");
            assert!(
                error_repr.contains(msg),
                "\nWrong error for \"{}\":\nexpected \"{}\" somewhere in \"{}\"\n",
                input,
                msg,
                error_repr
            )
        }
    }
}

fn token_types(input: &str) -> Vec<TokenType> {
    let mut lexer = Tokenizer::new(input);
    let mut result = Vec::new();
    loop {
        let token = lexer.next();
        result.push(token.typ);
        if token.typ == TokenType::Eof {
            return result;
        }
    }
}

#[test]
fn single_character_tokens() {
    use TokenType::*;
    assert_eq!(
        token_types("+ - * / ^ ( ) [ ] = ,\n"),
        vec![
            Plus, Minus, Times, Divide, Pow, LParen, RParen, LBracket, RBracket, Equal, Comma,
            Newline, Eof
        ]
    );
}

#[test]
fn keywords_and_identifiers() {
    use TokenType::*;
    assert_eq!(
        token_types("integer real array record input refx ref end"),
        vec![Integer, Real, Array, Record, Input, Id, Ref, End, Eof]
    );
}

#[test]
fn number_literals() {
    let mut lexer = Tokenizer::new("42 2.5 0.125");
    assert_eq!(lexer.next().value, Some(Number::Int(42)));
    assert_eq!(lexer.next().value, Some(Number::Real(2.5)));
    assert_eq!(lexer.next().value, Some(Number::Real(0.125)));
}

#[test]
fn bounds_separator_versus_decimal_point() {
    use TokenType::*;
    assert_eq!(token_types("1..3"), vec![IntLit, Bsep, IntLit, Eof]);
    assert_eq!(token_types("1.5"), vec![FloatLit, Eof]);
    assert_eq!(token_types("a.b"), vec![Id, Dot, Id, Eof]);
}

#[test]
fn dangling_decimal_point_is_invalid() {
    assert_eq!(
        token_types("1."),
        vec![TokenType::Invalid, TokenType::Eof]
    );
}

#[test]
fn comments_keep_their_newline() {
    use TokenType::*;
    assert_eq!(
        token_types("x # trailing\ny"),
        vec![Id, Newline, Id, Eof]
    );
    assert_eq!(token_types("# only a comment"), vec![Eof]);
}

#[test]
fn token_positions() {
    let mut lexer = Tokenizer::new("ab + c\n  d");
    assert_eq!((lexer.next().loc.line, lexer.token().loc.column), (1, 1));
    assert_eq!((lexer.next().loc.line, lexer.token().loc.column), (1, 4));
    assert_eq!((lexer.next().loc.line, lexer.token().loc.column), (1, 6));
    lexer.next();
    assert_eq!((lexer.next().loc.line, lexer.token().loc.column), (2, 3));
}

#[test]
fn subtraction_is_left_associative() {
    parse_tree_matches("1 - 2 - 3\n", "Sub(Sub(Lit(1), Lit(2)), Lit(3))");
}

#[test]
fn division_is_left_associative() {
    parse_tree_matches("8 / 4 / 2\n", "Div(Div(Lit(8), Lit(4)), Lit(2))");
}

#[test]
fn power_is_right_associative() {
    parse_tree_matches("2 ^ 3 ^ 2\n", "Pow(Lit(2), Pow(Lit(3), Lit(2)))");
}

#[test]
fn precedence_levels() {
    parse_tree_matches("1 + 2 * 3\n", "Add(Lit(1), Mul(Lit(2), Lit(3)))");
    parse_tree_matches("x ^ 2 * 3\n", "Mul(Pow(Var(\"x\"), Lit(2)), Lit(3))");
    parse_tree_matches("(1 + 2) * 3\n", "Mul(Add(Lit(1), Lit(2)), Lit(3))");
}

#[test]
fn unary_minus() {
    parse_tree_matches("-x + 1\n", "Add(Neg(Var(\"x\")), Lit(1))");
    parse_tree_matches("2 * -3\n", "Mul(Lit(2), Neg(Lit(3)))");
}

#[test]
fn statement_tail_after_reference() {
    parse_tree_matches("x = y + 1\n", "Assign(Var(\"x\"), Add(Var(\"y\"), Lit(1)))");
    parse_tree_matches("x + 1 - 2\n", "Sub(Add(Var(\"x\"), Lit(1)), Lit(2))");
    parse_tree_matches("x ^ 2 + 1\n", "Add(Pow(Var(\"x\"), Lit(2)), Lit(1))");
}

#[test]
fn declarations() {
    parse_tree_matches("integer x\n", "Decl(Var(\"x\"))");
    parse_tree_matches("real y", "Decl(Var(\"y\"))");
}

#[test]
fn array_declaration() {
    parse_tree_matches(
        "array of integer with bounds [1..3, 5] m\n",
        "ArrayDecl(Bounds(Bound(Lit(1), Lit(3)), Bound(Lit(5))), Var(\"m\"))",
    );
}

#[test]
fn array_reference() {
    parse_tree_matches(
        "m[i, j + 1] = 0\n",
        "Assign(ArrayVar(\"m\", Var(\"i\"), Add(Var(\"j\"), Lit(1))), Lit(0))",
    );
}

#[test]
fn record_definition_and_instance() {
    parse_tree_matches(
        "record point\ninteger x\ninteger y\nend\n",
        "RecDef(Var(\"point\"), FieldList(Decl(Var(\"x\")), Decl(Var(\"y\"))))",
    );
    parse_tree_matches("record point p\n", "RecDecl(Var(\"point\"), Var(\"p\"))");
}

#[test]
fn record_access_chains() {
    parse_tree_matches("p.x = 1\n", "Assign(RecAccess(Var(\"p\"), Var(\"x\")), Lit(1))");
    parse_tree_matches(
        "a.b.c\n",
        "RecAccess(Var(\"a\"), RecAccess(Var(\"b\"), Var(\"c\")))",
    );
}

#[test]
fn if_and_while() {
    parse_tree_matches("if x\nx = 0\nend\n", "If(Var(\"x\"), Block(Assign(");
    parse_tree_matches("while n\nn = n - 1\nend\n", "While(Var(\"n\"), Block(Assign(");
}

#[test]
fn function_definition() {
    parse_tree_matches(
        "function double(integer n) integer\nn * 2\nend\n",
        "FunDef(Var(\"double\"), ParamList(Decl(Var(\"n\"))), Type(integer), Block(Mul(Var(\"n\"), Lit(2))))",
    );
    parse_tree_matches(
        "function bump(ref x) integer\nx = x + 1\nend\n",
        "ParamList(RefParam(Var(\"x\")))",
    );
    parse_tree_matches("function zero() integer\n0\nend\n", "ParamList, Type(integer)");
}

#[test]
fn function_calls() {
    parse_tree_matches(
        "double(21)\n",
        "FunCall(Var(\"double\"), ArgList(Lit(21)))",
    );
    parse_tree_matches(
        "f(1, x + 2) * 3\n",
        "Mul(FunCall(Var(\"f\"), ArgList(Lit(1), Add(Var(\"x\"), Lit(2)))), Lit(3))",
    );
}

#[test]
fn unbalanced_parenthesis() {
    assert_syntax_error("(1 + 2\n", "expected RParen");
}

#[test]
fn unterminated_block() {
    assert_syntax_error("while x\nx = x - 1\n", "expected End");
}

#[test]
fn stray_character() {
    assert_syntax_error("1 + $\n", "unexpected token Invalid('$')");
}

#[test]
fn missing_bound() {
    assert_syntax_error("array of integer with bounds [x] m\n", "expected IntLit");
}
