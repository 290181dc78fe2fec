//! Tests for commands and control structures, run from source text.
use super::*;
use crate::data::objects::Object;
use crate::data::{Runtime, Tag};
use crate::reader::parse_body;
use crate::render::to_string;
use crate::Config;

fn exec(rt: &Runtime, source: &str) -> Result<(), Error> {
    let program = parse_body(rt, source)?;
    run(&program)
}

/// The stack, bottom first, as rendered.
fn stack(rt: &Runtime) -> Vec<String> {
    (0..rt.depth())
        .rev()
        .map(|level| to_string(&rt.peek(level).unwrap(), true).unwrap())
        .collect()
}

fn top(rt: &Runtime) -> Object {
    rt.peek(0).unwrap().get().unwrap()
}

#[test]
fn add_two_integers() {
    let rt = Runtime::default();
    exec(&rt, "2 3").unwrap();
    let plus = crate::reader::parse(&rt, "+").unwrap();
    crate::dispatch::evaluate(&plus).unwrap();
    assert_eq!(rt.depth(), 1);
    match top(&rt) {
        Object::Integer(5) => (),
        v => panic!("unexpected result: {v:?}"),
    };
}

#[test]
fn stack_commands() {
    for (source, expected) in [
        ("1 2 3 ROT", vec!["2", "3", "1"]),
        ("1 2 OVER", vec!["1", "2", "1"]),
        ("1 2 SWAP DROP", vec!["2"]),
        ("1 2 3 4 3 PICK", vec!["1", "2", "3", "4", "2"]),
        ("1 2 3 2 DROPN", vec!["1"]),
        ("1 2 DUP2", vec!["1", "2", "1", "2"]),
        ("1 2 3 DROP2", vec!["1"]),
        ("1 DUP DEPTH", vec!["1", "1", "2"]),
        ("1 2 CLEAR", vec![]),
    ] {
        let rt = Runtime::default();
        exec(&rt, source).unwrap();
        assert_eq!(stack(&rt), expected, "{source}");
    }
}

#[test]
fn too_few_arguments_leave_stack() {
    let rt = Runtime::default();
    match exec(&rt, "1 +") {
        Err(Error::TooFewArguments { needed: 2, depth: 1 }) => (),
        v => panic!("unexpected result: {v:?}"),
    }
    assert_eq!(stack(&rt), vec!["1"]);

    let rt = Runtime::default();
    match exec(&rt, "1 2 5 PICK") {
        Err(Error::TooFewArguments { needed: 6, depth: 3 }) => (),
        v => panic!("unexpected result: {v:?}"),
    }
    assert_eq!(stack(&rt), vec!["1", "2", "5"]);
}

#[test]
fn arithmetic() {
    for (source, expected) in [
        ("7 2 /", "3.5"),
        ("6 3 /", "2"),
        ("2 3 -", "-1"),
        ("2 1.5 *", "3."),
        ("5 NEG ABS", "5"),
    ] {
        let rt = Runtime::default();
        exec(&rt, source).unwrap();
        assert_eq!(stack(&rt), vec![expected], "{source}");
    }
}

#[test]
fn integer_overflow_becomes_decimal() {
    let rt = Runtime::default();
    exec(&rt, "18446744073709551615 1 +").unwrap();
    match top(&rt) {
        Object::Decimal(d) => assert_eq!(d, 2f64.powi(64)),
        v => panic!("unexpected result: {v:?}"),
    };
}

#[test]
fn divide_by_zero() {
    let rt = Runtime::default();
    match exec(&rt, "1 0 /") {
        Err(Error::DivideByZero) => (),
        v => panic!("unexpected result: {v:?}"),
    }
    assert_eq!(stack(&rt), vec!["1", "0"]);
}

#[test]
fn comparisons_and_logic() {
    for (source, expected) in [
        ("1 2 <", "1"),
        ("1 2 >=", "0"),
        ("1 1. ==", "1"),
        ("\"a\" \"b\" ==", "0"),
        ("\"a\" \"b\" <", "1"),
        ("{ 1 } { 1 } ==", "1"),
        ("1 0 AND", "0"),
        ("1 0 OR", "1"),
        ("0 NOT", "1"),
        ("2 3 !=", "1"),
    ] {
        let rt = Runtime::default();
        exec(&rt, source).unwrap();
        assert_eq!(stack(&rt), vec![expected], "{source}");
    }
}

#[test]
fn wrong_argument_type() {
    let rt = Runtime::default();
    match exec(&rt, "\"a\" 1 +") {
        Err(Error::BadArgumentType(_)) => (),
        v => panic!("unexpected result: {v:?}"),
    }
    assert_eq!(rt.depth(), 2);
}

#[test]
fn store_recall_purge() {
    let rt = Runtime::default();
    exec(&rt, "42 'x' STO x 'x' RCL").unwrap();
    assert_eq!(stack(&rt), vec!["42", "42"]);

    exec(&rt, "CLEAR 'x' PURGE x").unwrap();
    match top(&rt) {
        Object::Symbol(s) => assert_eq!(s, "x"),
        v => panic!("unexpected result: {v:?}"),
    }
    match exec(&rt, "'x' RCL") {
        Err(Error::Undefined(name)) => assert_eq!(name, "x"),
        v => panic!("unexpected result: {v:?}"),
    };
}

#[test]
fn stored_program_runs_by_name() {
    let rt = Runtime::default();
    exec(&rt, "« 1 + » 'inc' STO 5 inc inc").unwrap();
    assert_eq!(stack(&rt), vec!["7"]);
}

#[test]
fn recalled_value_survives_purge() {
    let rt = Runtime::default();
    exec(&rt, "{ 1 2 } 'l' STO l 'l' PURGE").unwrap();
    assert_eq!(stack(&rt), vec!["{ 1 2 }"]);
    assert!(rt.globals().is_empty());
}

#[test]
fn eval_executes() {
    let rt = Runtime::default();
    exec(&rt, "« 2 3 * » EVAL 'y' EVAL").unwrap();
    assert_eq!(stack(&rt), vec!["6", "y"]);
}

#[test]
fn conditionals() {
    for (source, expected) in [
        ("1 IF DUP THEN 10 ELSE 20 END", vec!["1", "10"]),
        ("0 IF DUP THEN 10 ELSE 20 END", vec!["0", "20"]),
        ("IF 0 THEN 10 END", vec![]),
        ("IF 1 2 < THEN \"yes\" END", vec!["\"yes\""]),
    ] {
        let rt = Runtime::default();
        exec(&rt, source).unwrap();
        assert_eq!(stack(&rt), expected, "{source}");
    }
}

#[test]
fn condition_must_leave_one_value() {
    let rt = Runtime::default();
    match exec(&rt, "IF 1 2 THEN 3 END") {
        Err(Error::BadStackDepth {
            expected: 1,
            got: 2,
        }) => (),
        v => panic!("unexpected result: {v:?}"),
    };
}

#[test]
fn loops() {
    for (source, expected) in [
        ("0 1 5 START 1 + NEXT", "5"),
        ("0 10 1 START 1 + -3 STEP", "4"),
        ("0 5 1 START 1 + NEXT", "1"),
        ("0 DO 1 + UNTIL DUP 3 >= END", "3"),
        ("10 WHILE DUP 0 > REPEAT 3 - END", "-2"),
    ] {
        let rt = Runtime::default();
        exec(&rt, source).unwrap();
        assert_eq!(stack(&rt), vec![expected], "{source}");
    }
}

#[test]
fn interrupt_stops_loops() {
    let rt = Runtime::default();
    rt.interrupt().raise();
    match exec(&rt, "DO 0 UNTIL 0 END") {
        Err(Error::Interrupted) => (),
        v => panic!("unexpected result: {v:?}"),
    }
    rt.interrupt().clear();
    exec(&rt, "DO 1 UNTIL 1 END").unwrap();
}

#[test]
fn runaway_recursion_is_an_error() {
    let rt = Runtime::default();
    match exec(&rt, "« r » 'r' STO r") {
        Err(Error::RecursionLimit) => (),
        v => panic!("unexpected result: {v:?}"),
    };
}

#[test]
fn list_commands() {
    for (source, expected) in [
        ("1 2 3 3 →LIST", vec!["{ 1 2 3 }"]),
        ("0 ->LIST", vec!["{ }"]),
        ("{ 1 \"a\" } LIST→", vec!["1", "\"a\"", "2"]),
        ("{ 1 2 3 } SIZE", vec!["3"]),
        ("\"héllo\" SIZE", vec!["5"]),
        ("« 1 2 + » ->STR", vec!["\"«\n  1 2 +\n»\""]),
    ] {
        let rt = Runtime::default();
        exec(&rt, source).unwrap();
        assert_eq!(stack(&rt), expected, "{source}");
        assert_eq!(rt.stats().scratch, 0, "{source}");
    }
}

#[test]
fn list_from_non_list() {
    let rt = Runtime::default();
    match exec(&rt, "1 LIST→") {
        Err(Error::BadArgumentType(_)) => (),
        v => panic!("unexpected result: {v:?}"),
    }
    assert_eq!(stack(&rt), vec!["1"]);
}

#[test]
fn mem_reports_free_space() {
    let rt = Runtime::default();
    exec(&rt, "MEM").unwrap();
    match top(&rt) {
        Object::Integer(free) => assert!(free > 0 && (free as usize) < rt.capacity()),
        v => panic!("unexpected result: {v:?}"),
    };
}

#[test]
fn loops_collect_garbage() {
    let rt = Runtime::new(&Config {
        memory: 256,
        ..Config::default()
    });
    exec(&rt, "7 1 1000 START 1 2 + DROP NEXT").unwrap();
    assert!(rt.stats().collections > 0);
    assert_eq!(stack(&rt), vec!["7"]);
    assert_eq!(rt.peek(0).unwrap().tag(), Tag::Integer);
}

#[test]
fn out_of_memory_is_reported() {
    let rt = Runtime::new(&Config {
        memory: 64,
        ..Config::default()
    });
    match exec(&rt, "1 1 100 START DUP NEXT") {
        Err(Error::OutOfMemory { .. }) => (),
        v => panic!("unexpected result: {v:?}"),
    };
}

#[test]
fn huge_counts_are_too_few_arguments() {
    for command in ["PICK", "DROPN", "→LIST"] {
        let rt = Runtime::default();
        let source = format!("1 18446744073709551615 {command}");
        match exec(&rt, &source) {
            Err(Error::TooFewArguments { depth: 2, .. }) => (),
            v => panic!("unexpected result for {command}: {v:?}"),
        };
        assert_eq!(stack(&rt), vec!["1", "18446744073709551615"], "{command}");
    }
}

#[test]
fn decimal_overflow_is_an_error() {
    let rt = Runtime::default();
    match exec(&rt, "1.e300 1.e300 *") {
        Err(Error::Overflow) => (),
        v => panic!("unexpected result: {v:?}"),
    };
    assert_eq!(stack(&rt), vec!["1.e300", "1.e300"]);

    let rt = Runtime::default();
    match exec(&rt, "1.e300 NEG 1.e-300 /") {
        Err(Error::Overflow) => (),
        v => panic!("unexpected result: {v:?}"),
    };
}

#[test]
fn eval_consumes_its_argument() {
    let rt = Runtime::default();
    exec(&rt, "1 2 « DROP » EVAL").unwrap();
    assert_eq!(stack(&rt), vec!["1"]);

    let rt = Runtime::default();
    match exec(&rt, "1 0 « / » EVAL") {
        Err(Error::DivideByZero) => (),
        v => panic!("unexpected result: {v:?}"),
    };
    assert_eq!(stack(&rt), vec!["1", "0"]);
}

fn small(memory: usize) -> Runtime {
    Runtime::new(&Config {
        memory,
        ..Config::default()
    })
}

#[test]
fn store_without_room_changes_nothing() {
    use crate::data::objects::{Integer, Text};

    let rt = small(64);
    rt.store("x", &rt.make(&Integer::from(1)).unwrap()).unwrap();
    rt.push(&rt.make(&Text::text(&"a".repeat(40))).unwrap()).unwrap();
    rt.push(&rt.make(&Text::symbol("x")).unwrap()).unwrap();

    match store::sto(&rt) {
        Err(Error::OutOfMemory { .. }) => (),
        v => panic!("unexpected result: {v:?}"),
    };
    assert_eq!(rt.globals(), vec!["x".to_owned()]);
    match rt.lookup("x").unwrap().get().unwrap() {
        Object::Integer(1) => (),
        v => panic!("unexpected binding: {v:?}"),
    };
    assert_eq!(rt.depth(), 2);
    match (rt.peek(1).unwrap().get().unwrap(), top(&rt)) {
        (Object::Text(value), Object::Symbol(name)) => {
            assert_eq!(value.len(), 40);
            assert_eq!(name, "x");
        }
        v => panic!("unexpected stack: {v:?}"),
    };
}

#[test]
fn purge_without_room_changes_nothing() {
    use crate::data::objects::Text;

    let rt = small(56);
    rt.store("x", &rt.make(&Text::text(&"a".repeat(20))).unwrap()).unwrap();
    // A recalled value refers into the binding, so purging must copy it.
    rt.push(&rt.lookup("x").unwrap()).unwrap();
    rt.push(&rt.make(&Text::symbol("x")).unwrap()).unwrap();

    match store::purge(&rt) {
        Err(Error::OutOfMemory { .. }) => (),
        v => panic!("unexpected result: {v:?}"),
    };
    assert_eq!(rt.globals(), vec!["x".to_owned()]);
    assert_eq!(rt.depth(), 2);
    match rt.peek(1).unwrap().get().unwrap() {
        Object::Text(value) => assert_eq!(value, "a".repeat(20)),
        v => panic!("unexpected stack: {v:?}"),
    };
}

#[test]
fn list_commands_without_room_change_nothing() {
    use crate::data::objects::Integer;

    let rt = small(48);
    for i in 1..=5 {
        rt.push(&rt.make(&Integer::from(i)).unwrap()).unwrap();
    }
    rt.push(&rt.make(&Integer::from(5)).unwrap()).unwrap();
    match lists::to_list(&rt) {
        Err(Error::OutOfMemory { .. }) => (),
        v => panic!("unexpected result: {v:?}"),
    };
    assert_eq!(rt.depth(), 6);
    assert_eq!(rt.stats().scratch, 0);
    for (level, expected) in [(0, 5), (1, 5), (5, 1)] {
        match rt.peek(level).unwrap().get().unwrap() {
            Object::Integer(i) => assert_eq!(i, expected, "level {level}"),
            v => panic!("unexpected stack: {v:?}"),
        };
    }

    let rt = small(32);
    rt.push(&crate::reader::parse(&rt, "{ 1 2 3 4 }").unwrap()).unwrap();
    match lists::from_list(&rt) {
        Err(Error::OutOfMemory { .. }) => (),
        v => panic!("unexpected result: {v:?}"),
    };
    assert_eq!(rt.depth(), 1);
    assert_eq!(rt.peek(0).unwrap().tag(), Tag::List);
}
