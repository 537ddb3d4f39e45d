use std::io::Cursor;

use crate::parser::{Parser, Tokenizer};

use super::{Interpreter, RuntimeError};

fn run_program(source: &str, input: &str) -> Result<Vec<String>, RuntimeError> {
    let tree = Parser::new(Tokenizer::new(source))
        .parse()
        .unwrap_or_else(|error| panic!("\nFailed to parse \"{source}\": {error}\n"));
    let mut output = Vec::new();
    Interpreter::new(Cursor::new(input.as_bytes()), &mut output).run(&tree)?;
    let text = String::from_utf8(output).unwrap();
    Ok(text.lines().map(str::to_string).collect())
}

fn output_lines(source: &str) -> Vec<String> {
    run_program(source, "").unwrap_or_else(|error| panic!("\n\"{source}\" failed: {error}\n"))
}

fn assert_runtime_error(source: &str, msg: &str) {
    match run_program(source, "") {
        Ok(lines) => panic!("\nExpected \"{source}\" to fail, got {lines:?}\n"),
        Err(error) => {
            let error_repr = format!("{error}");
            assert!(
                error_repr.contains(msg),
                "\nWrong error for \"{}\":\nexpected \"{}\" somewhere in \"{}\"\n",
                source,
                msg,
                error_repr
            )
        }
    }
}

#[test]
fn arithmetic() {
    assert_eq!(output_lines("1 - 2 - 3\n"), vec!["-4"]);
    assert_eq!(output_lines("2 ^ 3 ^ 2\n"), vec!["512"]);
    assert_eq!(output_lines("1 + 2 * 3\n"), vec!["7"]);
    assert_eq!(output_lines("-(2 + 3)\n"), vec!["-5"]);
}

#[test]
fn division_is_always_real() {
    assert_eq!(output_lines("7 / 2\n"), vec!["3.5"]);
    assert_eq!(output_lines("6 / 3\n"), vec!["2.0"]);
    assert_eq!(output_lines("1 / 0\n"), vec!["inf"]);
}

#[test]
fn mixed_arithmetic_widens() {
    assert_eq!(output_lines("1 + 0.5\n"), vec!["1.5"]);
    assert_eq!(output_lines("2.0 * 3\n"), vec!["6.0"]);
    assert_eq!(output_lines("2 ^ -1\n"), vec!["0.5"]);
}

#[test]
fn declaration_and_assignment() {
    assert_eq!(output_lines("integer x\nx = 5\nx\n"), vec!["5"]);
    assert_eq!(output_lines("integer x\nx\n"), vec!["0"]);
}

#[test]
fn assignment_coerces_to_declared_kind() {
    assert_eq!(output_lines("integer x\nx = 3.7\nx\n"), vec!["3"]);
    assert_eq!(output_lines("real y\ny = 2\ny\n"), vec!["2.0"]);
}

#[test]
fn redeclaration_in_same_scope() {
    assert_runtime_error("integer x\nreal x\n", "already declared");
}

#[test]
fn undefined_names() {
    assert_runtime_error("y + 1\n", "'y' is not defined");
    assert_runtime_error("y = 1\n", "assignment to undeclared name 'y'");
}

#[test]
fn array_cells() {
    let source = "array of integer with bounds [1..3, 5] m\nm[2, 4] = 7\nm[2, 4]\nm[1, 1]\n";
    assert_eq!(output_lines(source), vec!["7", "0"]);
}

#[test]
fn lone_bound_starts_at_one() {
    assert_eq!(
        output_lines("array of real with bounds [3] v\nv[1] + v[3]\n"),
        vec!["0.0"]
    );
}

#[test]
fn array_cells_coerce() {
    assert_eq!(
        output_lines("array of integer with bounds [2] v\nv[1] = 2.9\nv[1]\n"),
        vec!["2"]
    );
}

#[test]
fn index_out_of_bounds() {
    assert_runtime_error(
        "array of integer with bounds [1..3] v\nv[4]\n",
        "index out of bounds for 'v'",
    );
    assert_runtime_error(
        "array of integer with bounds [2..3] v\nv[1] = 0\n",
        "index out of bounds for 'v'",
    );
}

#[test]
fn invalid_bounds() {
    assert_runtime_error(
        "array of integer with bounds [3..1] v\n",
        "upper bound below lower bound",
    );
}

#[test]
fn record_instances_are_independent() {
    let source = "record point\ninteger x\ninteger y\nend\n\
                  record point p\nrecord point q\np.x = 5\np.x\nq.x\n";
    assert_eq!(output_lines(source), vec!["5", "0"]);
}

#[test]
fn nested_records() {
    let source = "record point\ninteger x\nend\n\
                  record line\nrecord point a\nrecord point b\nend\n\
                  record line l\nl.a.x = 3\nl.a.x + l.b.x\n";
    assert_eq!(output_lines(source), vec!["3"]);
}

#[test]
fn arrays_of_records() {
    let source = "record point\ninteger x\nend\n\
                  array of record point with bounds [2] ps\n\
                  ps[1].x\n";
    assert_eq!(output_lines(source), vec!["0"]);
}

#[test]
fn record_types_resolve_from_nested_scopes() {
    let source = "record point\ninteger x\nend\n\
                  function origin_x() integer\nrecord point p\np.x\nend\n\
                  origin_x()\n";
    assert_eq!(output_lines(source), vec!["0"]);
}

#[test]
fn undefined_record_type() {
    assert_runtime_error("record point p\n", "record type 'point' is not defined");
}

#[test]
fn access_through_non_record() {
    assert_runtime_error("integer x\nx.y\n", "'x' is not a record");
}

#[test]
fn conditionals_and_loops() {
    assert_eq!(output_lines("integer x\nif 1\nx = 3\nend\nx\n"), vec!["3"]);
    assert_eq!(output_lines("integer x\nif 0\nx = 3\nend\nx\n"), vec!["0"]);
    let source = "integer n\ninteger total\nn = 4\nwhile n\ntotal = total + n\nn = n - 1\nend\ntotal\n";
    assert_eq!(output_lines(source), vec!["10"]);
}

#[test]
fn function_call_returns_body_value() {
    let source = "function double(integer n) integer\nn * 2\nend\ndouble(21)\n";
    assert_eq!(output_lines(source), vec!["42"]);
}

#[test]
fn block_expressions_do_not_print() {
    let source = "function f(integer n) integer\nn + 1\nn + 2\nend\nf(0)\n";
    assert_eq!(output_lines(source), vec!["2"]);
}

#[test]
fn result_coerces_to_return_kind() {
    let source = "function idiv(integer a, integer b) integer\na / b\nend\nidiv(5, 2)\n";
    assert_eq!(output_lines(source), vec!["2"]);
}

#[test]
fn value_parameters_leave_the_caller_alone() {
    let source = "integer x\nx = 1\n\
                  function set(integer x) integer\nx = 2\nx\nend\n\
                  set(x)\nx\n";
    assert_eq!(output_lines(source), vec!["2", "1"]);
}

#[test]
fn ref_parameters_write_through() {
    let source = "integer x\n\
                  function bump(ref x) integer\nx = x + 2\nx\nend\n\
                  x\nbump(x)\nx\n";
    assert_eq!(output_lines(source), vec!["0", "2", "2"]);
}

#[test]
fn ref_argument_must_be_a_variable() {
    let source = "function bump(ref x) integer\nx\nend\nbump(1 + 2)\n";
    assert_runtime_error(source, "ref parameter 'x' needs a plain variable");
}

#[test]
fn functions_see_enclosing_scope() {
    let source = "integer base\nbase = 10\n\
                  function shift(integer n) integer\nbase + n\nend\n\
                  shift(5)\n";
    assert_eq!(output_lines(source), vec!["15"]);
}

#[test]
fn wrong_argument_count() {
    let source = "function double(integer n) integer\nn * 2\nend\ndouble(1, 2)\n";
    assert_runtime_error(source, "'double' takes 1 argument(s), got 2");
}

#[test]
fn calling_a_non_function() {
    assert_runtime_error("integer x\nx(1)\n", "'x' is not a function");
    assert_runtime_error("f(1)\n", "'f' is not a function");
}

#[test]
fn input_statement() {
    let lines = run_program("integer x\ninput x\nx + 1\n", "41\n").unwrap();
    assert_eq!(lines, vec!["x=42"]);
}

#[test]
fn input_coerces_to_target() {
    let lines = run_program("integer x\ninput x\nx\n", "2.9\n").unwrap();
    assert_eq!(lines, vec!["x=2"]);
}

#[test]
fn malformed_input() {
    match run_program("integer x\ninput x\n", "abc\n") {
        Err(RuntimeError::InvalidInput { name, .. }) => assert_eq!(name, "x"),
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn fresh_environment_per_run() {
    let tree = Parser::new(Tokenizer::new("integer x\nx\n")).parse().unwrap();
    let mut output = Vec::new();
    let mut interpreter = Interpreter::new(Cursor::new(&b""[..]), &mut output);
    interpreter.run(&tree).unwrap();
    interpreter.run(&tree).unwrap();
    assert_eq!(String::from_utf8(output).unwrap(), "0\n0\n");
}
