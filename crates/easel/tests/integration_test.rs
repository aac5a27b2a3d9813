//! Source-to-exit-status tests through the whole stack: reader,
//! lowering, VM, canvas bindings.

use easel::Runtime;

fn eval(source: &str) -> i64 {
    Runtime::new()
        .eval_source("test", source)
        .expect("evaluation failed")
}

#[test]
fn arithmetic_and_literals() {
    assert_eq!(eval("42"), 42);
    assert_eq!(eval("(+ 1 2)"), 3);
    assert_eq!(eval("(* (+ 2 3) 7)"), 35);
    assert_eq!(eval("(% 17 5)"), 2);
    assert_eq!(eval("(/ 84 2)"), 42);
    assert_eq!(eval("(- 5)"), -5);
    assert_eq!(eval("0x2a"), 42);
    assert_eq!(eval("052"), 42);
    assert_eq!(eval("0b101010"), 42);
}

#[test]
fn float_results_are_not_an_exit_status() {
    // A float last value leaves the exit status unspecified (0).
    assert_eq!(eval("(+ 1.5 2.5)"), 0);
    assert_eq!(eval("\"just a string\""), 0);
}

#[test]
fn module_variables() {
    assert_eq!(eval("(let x 6) (let y 7) (* x y)"), 42);
    // let yields its value.
    assert_eq!(eval("(let z (+ 40 2))"), 42);
    // Rebinding takes the new value.
    assert_eq!(eval("(let x 1) (let x 2) x"), 2);
}

#[test]
fn functions_and_recursion_free_composition() {
    assert_eq!(eval("(def square (x) (* x x)) (square 7)"), 49);
    assert_eq!(
        eval("(def add (a b) (+ a b)) (def twice (x) (add x x)) (twice 21)"),
        42
    );
    // Multi-statement body: earlier statements evaluate, last returns.
    assert_eq!(eval("(def f (x) (let seen x) (+ seen 1)) (f 41)"), 42);
}

#[test]
fn comparisons_and_logic() {
    // Comparison results are booleans; use them as exit via arithmetic
    // on a host-free path is impossible, so compare through logic ops
    // driving an integer pick.
    assert_eq!(eval("(let t (< 1 2)) (&& t (> 3 2))"), 0); // boolean exit → 0
    assert_eq!(eval("(def pick (c a b) (+ (* c a) (* (- 1 c) b)))\n(pick (% 7 2) 42 9)"), 42);
}

#[test]
fn variadic_function_receives_argument_array() {
    assert_eq!(
        eval("(def count (xs ...) (array_len xs)) (count 9 9 9 9)"),
        4
    );
    assert_eq!(eval("(def first (xs ...) (array_get xs 0)) (first 8 9 10)"), 8);
}

#[test]
fn array_builtins() {
    assert_eq!(
        eval("(let a (array)) (array_push a 5) (array_push a 9) (+ (array_get a 0) (array_len a))"),
        7
    );
}

#[test]
fn map_builtins() {
    assert_eq!(
        eval("(let m (object)) (object_set m \"answer\" 42) (object_get m \"answer\")"),
        42
    );
    let runtime = Runtime::new();
    assert!(runtime
        .eval_source("missing", "(let m (object)) (object_get m \"nope\")")
        .is_err());
}

#[test]
fn canvas_round_trip_via_script() {
    let runtime = Runtime::new();
    let status = runtime
        .eval_source(
            "scene",
            "(let c (canvas_circle 0 0 5))\n\
             (canvas_segment 20 0 20 10)\n\
             (canvas_distance c 2)",
        )
        .unwrap();
    // Circle rim at x=5, segment at x=20.
    assert_eq!(status, 15);
    let viewport = runtime.viewport();
    assert_eq!(viewport.borrow().layer.len(), 2);
}

#[test]
fn canvas_state_persists_across_evaluations() {
    let runtime = Runtime::new();
    runtime.eval_source("a", "(canvas_circle 0 0 5)").unwrap();
    runtime.eval_source("b", "(canvas_circle 30 0 5)").unwrap();
    assert_eq!(runtime.viewport().borrow().layer.len(), 2);
    // A later script can measure objects created earlier.
    assert_eq!(
        runtime.eval_source("c", "(canvas_distance 1 2)").unwrap(),
        20
    );
}

#[test]
fn polygon_script_with_point_array() {
    let runtime = Runtime::new();
    let status = runtime
        .eval_source(
            "poly",
            "(let pts (array))\n\
             (array_push pts 0) (array_push pts 0)\n\
             (array_push pts 10) (array_push pts 0)\n\
             (array_push pts 10) (array_push pts 10)\n\
             (array_push pts 0) (array_push pts 10)\n\
             (let p (canvas_polygon pts))\n\
             (canvas_inside p 5 5)",
        )
        .unwrap();
    assert_eq!(status, 0); // boolean exit
    let viewport = runtime.viewport();
    let vp = viewport.borrow();
    let poly = vp.layer.get(1).unwrap();
    assert!(poly.hit(easel::Point::new(5, 5), 0));
    assert!(!poly.hit(easel::Point::new(15, 5), 0));
}

#[test]
fn errors_propagate_as_panics() {
    let runtime = Runtime::new();
    assert!(runtime.eval_source("bad", "(+ 1 \"x\")").is_err());
    assert!(runtime.eval_source("bad2", "(undefined_fn 1)").is_err());
    assert!(runtime.eval_source("bad3", "(/ 1 0)").is_err());
    assert!(runtime.eval_source("bad4", "(% 1.5 2)").is_err());
    assert!(runtime.eval_source("bad5", "(<< 1 2)").is_err());
    assert!(runtime.eval_source("bad6", "(let x 9223372036854775808)").is_err());
}
