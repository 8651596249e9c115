mod common;

use betty::{InterpreterError, Value};
use common::{list, num, run_main, run_main_err, try_run_with_input};
use pretty_assertions::assert_eq;

// =============================================================================
// IO
// =============================================================================

#[test]
fn test_print_and_println() {
    let (_, output) = try_run_with_input(
        "func main() { print(\"a\", 1, 'c'); println(); println(\"x = \", 2.5); }",
        "",
    )
    .unwrap();
    assert_eq!(output, "a1c\nx = 2.5\n");
}

#[test]
fn test_input_reads_lines() {
    let source = "
        func main() {
            name = input(\"name? \");
            age = tonum(input());
            rest = input();
            return [name, age + 1, rest];
        }
    ";
    let (value, output) = try_run_with_input(source, "Ada\r\n36\n").unwrap();
    assert_eq!(output, "name? ");
    assert_eq!(value, list(vec![Value::string("Ada"), num(37.0), Value::string("")]));
}

#[test]
fn test_print_returns_none() {
    let (value, _) = try_run_with_input("func main() { return print(); }", "").unwrap();
    assert_eq!(value, Value::None);
}

// =============================================================================
// CONVERSION
// =============================================================================

#[test]
fn test_conversions() {
    assert_eq!(run_main("return tostr(12) + tostr(true);"), Value::string("12true"));
    assert_eq!(run_main("return tonum(\"2.5\") * 2;"), num(5.0));
    assert_eq!(run_main("return tonum('A');"), num(65.0));
    assert_eq!(run_main("return tobool(\"False\");"), Value::Boolean(false));
    assert_eq!(run_main("return tobool(0);"), Value::Boolean(false));
    assert_eq!(run_main("return tochar(66);"), Value::Char('B'));
    assert_eq!(run_main("return tochar(true);"), Value::Char('T'));
    assert_eq!(run_main("return tolist(\"ab\");"), list(vec![Value::Char('a'), Value::Char('b')]));
}

#[test]
fn test_tostr_of_extreme_numbers() {
    assert_eq!(run_main("return tostr(pow(10, 20));"), Value::string("1E+20"));
    assert_eq!(run_main("return tostr(1 / 100000);"), Value::string("1E-05"));
    assert_eq!(run_main("return tostr(1 / 0);"), Value::string("Infinity"));
    assert_eq!(run_main("return tostr(pow(2, 40));"), Value::string("1099511627776"));
}

#[test]
fn test_conversion_failures() {
    assert!(run_main_err("return tonum(\"twelve\");").to_string().contains("twelve"));
    assert!(matches!(run_main_err("return tolist(5);"), InterpreterError::TypeMismatch { .. }));
    assert!(run_main_err("return tochar(\"ab\");").to_string().contains("'ab'"));
}

// =============================================================================
// STRING AND CHAR
// =============================================================================

#[test]
fn test_concat() {
    assert_eq!(run_main("return concat(\"a\", 1, [2]);"), Value::string("a1[2]"));
    assert_eq!(run_main("return concat();"), Value::string(""));
}

#[test]
fn test_char_predicates() {
    let source = "
        digits = 0; spaces = 0;
        foreach (c in \"a1 b2\\t\") {
            if (isdigit(c)) digits++;
            if (isspace(c)) spaces++;
        }
        return [digits, spaces];
    ";
    assert_eq!(run_main(source), list(vec![num(2.0), num(2.0)]));
}

// =============================================================================
// LISTS
// =============================================================================

#[test]
fn test_append_remove_removeat() {
    let source = "
        l = [1, 2, 3, 2];
        append(l, 4);
        remove(l, 2);
        removeat(l, 0);
        return l;
    ";
    assert_eq!(run_main(source).to_string(), "[3, 2, 4]");
}

#[test]
fn test_append_returns_copy() {
    let source = "
        l = [1];
        copy = append(l, 2);
        append(l, 3);
        return [len(l), len(copy)];
    ";
    assert_eq!(run_main(source), list(vec![num(3.0), num(2.0)]));
}

#[test]
fn test_range_and_len() {
    assert_eq!(run_main("return len(range(2, 6));"), num(4.0));
    assert_eq!(run_main("return len(\"hello\");"), num(5.0));
}

#[test]
fn test_list_intrinsic_type_errors() {
    assert!(matches!(run_main_err("append(1, 2);"), InterpreterError::TypeMismatch { .. }));
    assert!(matches!(run_main_err("removeat([1], 3);"), InterpreterError::IndexOutOfRange { .. }));
    assert!(matches!(run_main_err("len(true);"), InterpreterError::TypeMismatch { .. }));
}

// =============================================================================
// MATH
// =============================================================================

#[test]
fn test_math() {
    assert_eq!(run_main("return floor(2.7) + ceil(2.2);"), num(5.0));
    assert_eq!(run_main("return abs(-3) + sqrt(16);"), num(7.0));
    assert_eq!(run_main("return pow(2, 8);"), num(256.0));
    assert_eq!(run_main("return sin(0) + cos(0) + tan(0);"), num(1.0));
}

#[test]
fn test_math_requires_numbers() {
    assert!(matches!(run_main_err("return sqrt(\"4\");"), InterpreterError::TypeMismatch { .. }));
}

// =============================================================================
// ARITY
// =============================================================================

#[test]
fn test_arity_checked_before_arguments_run() {
    let source = "
        func main() {
            calls = 0;
            touch = func() { calls++; return 1; };
            len(touch(), touch());
        }
    ";
    let err = common::run_err(source);
    assert_eq!(err.to_string(), "Function 'len' expects 1 argument(s) but got 2.");
}

#[test]
fn test_input_arity_range() {
    let err = run_main_err("input(\"a\", \"b\");");
    assert!(matches!(err, InterpreterError::ArityMismatch { .. }));
}
