mod common;

use betty::{InterpreterError, Value};
use common::{list, num, run_main, run_main_err, run_with_output};
use pretty_assertions::assert_eq;

#[test]
fn test_if_elif_else() {
    let source = "
        x = 15;
        if (x < 10) { return \"low\"; }
        elif (x < 20) { return \"mid\"; }
        else { return \"high\"; }
    ";
    assert_eq!(run_main(source), Value::string("mid"));
}

#[test]
fn test_if_single_statement_bodies() {
    assert_eq!(run_main("x = 1; if (x == 1) x = 2; else x = 3; return x;"), num(2.0));
}

#[test]
fn test_if_expression() {
    let source = "
        n = 0;
        kind = if n < 0 then \"negative\" elif n == 0 then \"zero\" else \"positive\";
        return kind;
    ";
    assert_eq!(run_main(source), Value::string("zero"));
}

#[test]
fn test_condition_must_be_boolean() {
    assert!(matches!(run_main_err("if (1) { return 1; }"), InterpreterError::TypeMismatch { .. }));
    assert!(matches!(run_main_err("while (\"yes\") { }"), InterpreterError::TypeMismatch { .. }));
}

#[test]
fn test_while_loop() {
    assert_eq!(run_main("i = 0; while (i < 5) { i++; } return i;"), num(5.0));
}

#[test]
fn test_do_while_runs_at_least_once() {
    assert_eq!(run_main("i = 10; do { i++; } while (i < 5); return i;"), num(11.0));
}

#[test]
fn test_for_loop_sum() {
    let source = "
        total = 0;
        for (i = 1; i <= 10; i++) { total += i; }
        return total;
    ";
    assert_eq!(run_main(source), num(55.0));
}

#[test]
fn test_for_loop_with_empty_clauses() {
    let source = "
        i = 0;
        for (;;) {
            i++;
            if (i == 3) break;
        }
        return i;
    ";
    assert_eq!(run_main(source), num(3.0));
}

#[test]
fn test_continue_runs_increment() {
    let source = "
        evens = [];
        for (i = 0; i < 6; i++) {
            if (i % 2 == 1) continue;
            evens += i;
        }
        return evens;
    ";
    assert_eq!(run_main(source), list(vec![num(0.0), num(2.0), num(4.0)]));
}

#[test]
fn test_break_only_exits_innermost_loop() {
    let source = "
        count = 0;
        for (i = 0; i < 3; i++) {
            for (j = 0; j < 10; j++) {
                if (j == 2) break;
                count++;
            }
        }
        return count;
    ";
    assert_eq!(run_main(source), num(6.0));
}

#[test]
fn test_return_from_nested_loops() {
    let source = "
        func find(target) {
            for (i = 0; i < 10; i++) {
                while (true) {
                    if (i == target) return i * 100;
                    break;
                }
            }
            return -1;
        }
        func main() { return find(4); }
    ";
    assert_eq!(common::run(source), num(400.0));
}

#[test]
fn test_foreach_over_list_and_string() {
    let source = "
        total = 0;
        foreach (n in [1, 2, 3]) { total += n; }
        chars = \"\";
        foreach (c in \"abc\") { chars = c + chars; }
        return [total, chars];
    ";
    assert_eq!(run_main(source), list(vec![num(6.0), Value::string("cba")]));
}

#[test]
fn test_foreach_iterates_snapshot() {
    let source = "
        items = [1, 2];
        seen = 0;
        foreach (x in items) { append(items, x); seen++; }
        return [seen, len(items)];
    ";
    assert_eq!(run_main(source), list(vec![num(2.0), num(4.0)]));
}

#[test]
fn test_foreach_requires_sequence() {
    assert!(matches!(run_main_err("foreach (x in 5) { }"), InterpreterError::TypeMismatch { .. }));
}

#[test]
fn test_block_scope_is_discarded() {
    let source = "
        { inner = 1; }
        return inner;
    ";
    assert!(matches!(run_main_err(source), InterpreterError::UndefinedVariable { .. }));
}

#[test]
fn test_assignment_updates_outer_binding() {
    assert_eq!(run_main("x = 1; { x = 2; } return x;"), num(2.0));
}

#[test]
fn test_break_and_continue_outside_loops() {
    assert!(matches!(
        run_main_err("break;"),
        InterpreterError::InvalidControlFlow { keyword: "break", .. }
    ));
    assert!(matches!(
        run_main_err("continue;"),
        InterpreterError::InvalidControlFlow { keyword: "continue", .. }
    ));
}

#[test]
fn test_loop_state_does_not_leak_into_calls() {
    let source = "
        func stop() { break; }
        func main() {
            while (true) { stop(); }
        }
    ";
    assert!(matches!(common::run_err(source), InterpreterError::InvalidControlFlow { .. }));
}

#[test]
fn test_output_order() {
    let source = "
        func main() {
            for (i = 0; i < 3; i++) { print(i, \" \"); }
            println();
            println(\"done\");
        }
    ";
    assert_eq!(run_with_output(source), "0 1 2 \ndone\n");
}
