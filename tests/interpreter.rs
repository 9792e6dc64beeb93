#[cfg(test)]
mod interpreter_tests {
    use std::io::{self, Cursor};
    use std::rc::Rc;

    use axscript::error::AxError;
    use axscript::interpreter::{ErrorPolicy, Interpreter, MAX_CALL_DEPTH};
    use axscript::value::Value;
    use axscript::{run, RunReport};

    fn run_with(source: &str, input: &str, policy: ErrorPolicy) -> (String, RunReport) {
        let mut interpreter =
            Interpreter::with_io(Vec::new(), Cursor::new(input.to_string())).with_policy(policy);

        let report = run(source, &mut interpreter);
        let output = String::from_utf8(interpreter.output().clone()).unwrap();

        (output, report)
    }

    /// Output of a program expected to run cleanly.
    fn output_of(source: &str) -> String {
        let (output, report) = run_with(source, "", ErrorPolicy::Halt);
        assert!(report.is_clean(), "unexpected errors: {:?}", report);

        output
    }

    /// Output and runtime error of a program expected to fail at runtime.
    fn failure_of(source: &str) -> (String, AxError) {
        let (output, report) = run_with(source, "", ErrorPolicy::Halt);
        assert!(report.lex_errors.is_empty() && report.parse_errors.is_empty());

        match report.runtime_error {
            Some(e) => (output, e),
            None => panic!("expected a runtime error, output was {:?}", output),
        }
    }

    // ── loops ──────────────────────────────────────────────────────────

    #[test]
    fn test_loop_inclusive_bounds() {
        assert_eq!(output_of("var x = 10; loop i = 1 to 3 { print i; }"), "123");
        assert_eq!(output_of("loop i = 5 to 1 print i;"), "");
        assert_eq!(output_of("loop i = 2 to 2 print i;"), "2");
    }

    #[test]
    fn test_loop_fractional_end() {
        assert_eq!(output_of("loop i = 1 to 3.5 print i;"), "123");
        assert_eq!(output_of("loop i = 0.5 to 2 print i + \" \";"), "0.5 1.5 ");
    }

    #[test]
    fn test_loop_descending_and_step() {
        assert_eq!(
            output_of("loop i = 10 down to 1 step 3 print i + \" \";"),
            "10 7 4 1 "
        );
        // The sign of the step is ignored; direction comes from `down`.
        assert_eq!(output_of("loop i = 1 to 5 step -2 print i;"), "135");
        assert_eq!(output_of("loop i = 3 down to 1 step -1 print i;"), "321");
    }

    #[test]
    fn test_loop_bounds_evaluated_once() {
        let source = "var n = 3; loop i = 1 to n { n = 10; print i; }";
        assert_eq!(output_of(source), "123");
    }

    #[test]
    fn test_loop_zero_step() {
        let (_, e) = failure_of("loop i = 1 to 3 step 0 print i;");
        assert!(matches!(e, AxError::ZeroStep { line: 1 }));
    }

    #[test]
    fn test_break_and_continue() {
        let source = r#"
            loop i = 1 to 5 {
                compeq(i, 2) continue;
                compeq(i, 4) break;
                print i;
            }
        "#;
        assert_eq!(output_of(source), "13");
    }

    #[test]
    fn test_nested_loops_break_inner_only() {
        let source = r#"
            loop i = 1 to 2 {
                loop j = 1 to 3 {
                    compg(j, 1) break;
                    print i + "" + j + " ";
                }
            }
        "#;
        assert_eq!(output_of(source), "11 21 ");
    }

    #[test]
    fn test_loop_variable_is_scoped_to_loop() {
        let (_, e) = failure_of("loop i = 1 to 2 {} print i;");
        assert!(matches!(e, AxError::UndefinedVariable { ref name, .. } if name == "i"));
    }

    #[test]
    fn test_assigning_loop_variable_affects_iteration() {
        assert_eq!(output_of("loop i = 1 to 10 { print i; i = i + 4; }"), "16");
    }

    // ── comparison statements ──────────────────────────────────────────

    #[test]
    fn test_comparison_runs_exactly_one_branch() {
        assert_eq!(output_of(r#"compg(5,3) print "big"; else print "small";"#), "big");
        assert_eq!(output_of(r#"compg(1,3) print "big"; else print "small";"#), "small");
        assert_eq!(output_of(r#"compeq(1, 1) print "a"; else print "b";"#), "a");
        assert_eq!(output_of(r#"compneq(1, 1) print "a"; else print "b";"#), "b");
        assert_eq!(output_of(r#"compge(3, 3) print "a";"#), "a");
        assert_eq!(output_of(r#"comple(4, 3) print "a";"#), "");
        assert_eq!(output_of(r#"compl("a", "b") print "lt";"#), "lt");
    }

    #[test]
    fn test_elseif_chain() {
        let source = r#"
            var x = 5;
            compl(x, 3) print "low";
            elseif (x < 6) print "mid";
            elseif (true) print "never";
            else print "high";
        "#;
        assert_eq!(output_of(source), "mid");
    }

    #[test]
    fn test_comparison_type_mismatch() {
        let (_, e) = failure_of(r#"compg(1, "a") print 1;"#);
        assert!(matches!(e, AxError::Type { .. }));
    }

    #[test]
    fn test_literal_operand_errors_carry_statement_line() {
        let (_, e) = failure_of("\ncompg(\"a\", 1) print 1;");
        assert!(matches!(e, AxError::Type { line: 2, .. }), "{}", e);

        let (_, e) = failure_of("\n\nloop i = \"x\" to 3 print i;");
        assert!(matches!(e, AxError::Type { line: 3, .. }), "{}", e);

        let (_, e) = failure_of("loop i = 1 to 3 step true print i;");
        assert!(matches!(e, AxError::Type { line: 1, .. }), "{}", e);
    }

    #[test]
    fn test_folded_and_or() {
        assert_eq!(output_of(r#"compg(5, 3) and compl(1, 2) print "both";"#), "both");
        assert_eq!(
            output_of(r#"compg(5, 3) and compl(3, 2) print "both"; else print "no";"#),
            "no"
        );
        assert_eq!(output_of(r#"compg(1, 3) or (true) print "either";"#), "either");
    }

    #[test]
    fn test_logic_statements_short_circuit() {
        // The right operand is never evaluated, so the undefined name is harmless.
        assert_eq!(output_of("and(false, nope) print 1; else print 2;"), "2");
        assert_eq!(output_of("or(true, nope) print 1; else print 2;"), "1");
        assert_eq!(output_of("or(0, \"\") print 1; else print 2;"), "2");
        assert_eq!(output_of("not(0) print \"z\";"), "z");
        assert_eq!(output_of("not([1]) print 1; else print 2;"), "2");
    }

    #[test]
    fn test_multi_condition_statements() {
        let source = r#"
            var a = 5;
            and { compg(a, 1), compl(a, 10), not(false) } print "all";
            and { compg(a, 1), compl(a, 2) } print "x"; else print "notall";
            or { compl(a, 1), (a == 5) } print "any";
            or { compl(a, 1), (false) } print "y"; elseif (a) print "none";
        "#;
        assert_eq!(output_of(source), "allnotallanynone");
    }

    // ── values, operators ──────────────────────────────────────────────

    #[test]
    fn test_arithmetic_and_concatenation() {
        assert_eq!(output_of("print 1 + 2 * 3 - 4 / 2;"), "5");
        assert_eq!(output_of("print 7 % 3;"), "1");
        assert_eq!(output_of("print -7 % 3;"), "-1");
        assert_eq!(output_of("print 1.5 + 1;"), "2.5");
        assert_eq!(output_of("print \"n=\" + 3;"), "n=3");
        assert_eq!(output_of("print true + \"!\";"), "true!");
        assert_eq!(output_of("print [1] + [2, 3];"), "[1, 2, 3]");
        assert_eq!(output_of("var a = 5; print a-1;"), "4");
        assert_eq!(output_of("print -(2 + 3);"), "-5");
    }

    #[test]
    fn test_equality_semantics() {
        assert_eq!(output_of("print [1, 2] == [1, 2];"), "true");
        assert_eq!(output_of("print 1 == \"1\";"), "false");
        assert_eq!(output_of("print \"a\" != \"b\";"), "true");
        assert_eq!(output_of("print !0;"), "true");
        assert_eq!(output_of("print \"b\" > \"a\";"), "true");
        assert_eq!(output_of("print 3 <= 2;"), "false");
    }

    #[test]
    fn test_division_and_modulo_by_zero() {
        let (output, e) = failure_of("print 1; print 4 % 0; print 2;");
        assert_eq!(output, "1");
        assert!(matches!(e, AxError::ModuloByZero { line: 1 }));

        let (_, e) = failure_of("print 1 / 0;");
        assert!(matches!(e, AxError::DivisionByZero { .. }));
        assert_eq!(e.to_string(), "[line 1] Runtime error: Division by zero.");
    }

    #[test]
    fn test_type_errors() {
        let (_, e) = failure_of("print \"a\" - 1;");
        assert!(matches!(e, AxError::Type { .. }));

        let (_, e) = failure_of("print -\"a\";");
        assert!(matches!(e, AxError::Type { .. }));

        let (_, e) = failure_of("print true < false;");
        assert!(matches!(e, AxError::Type { .. }));
    }

    #[test]
    fn test_print_expands_escapes_without_newline() {
        assert_eq!(output_of(r#"print "a\tb\n"; print "c";"#), "a\tb\nc");
        assert_eq!(output_of(r#"print "back\\slash";"#), "back\\\\slash");
    }

    #[test]
    fn test_var_defaults_and_shadowing() {
        assert_eq!(output_of("var x; print x;"), "0");
        assert_eq!(output_of("var x = 1; { var x = 2; print x; } print x;"), "21");
        assert_eq!(output_of("var x = 1; { x = 2; } print x;"), "2");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, e) = failure_of("print y;");
        assert_eq!(e.to_string(), "[line 1] Runtime error: Undefined variable 'y'.");

        let (_, e) = failure_of("\n\ny = 3;");
        assert!(matches!(e, AxError::UndefinedVariable { line: 3, .. }));
    }

    // ── arrays ─────────────────────────────────────────────────────────

    #[test]
    fn test_array_aliasing_and_concatenation_copy() {
        let source = r#"
            var a = [1, 2];
            var b = a;
            b[0] = 9;
            print a[0];
            var c = a + [3];
            c[0] = 5;
            print a[0];
            print c;
        "#;
        assert_eq!(output_of(source), "99[5, 2, 3]");
    }

    #[test]
    fn test_self_referencing_arrays() {
        assert_eq!(output_of("var a = [0]; a[0] = a; print a;"), "[[...]]");
        assert_eq!(
            output_of("var a = [1]; push(a, a); print \"a=\" + a;"),
            "a=[1, [...]]"
        );
        assert_eq!(
            output_of("var a = [0]; a[0] = a; var b = [0]; b[0] = b; print a == b;"),
            "true"
        );
        assert_eq!(
            output_of("var a = [0]; a[0] = a; var b = [0, 1]; b[0] = b; print a == b;"),
            "false"
        );
    }

    #[test]
    fn test_fixed_size_arrays() {
        assert_eq!(output_of("var a[3] = {1}; print a;"), "[1, 0, 0]");
        assert_eq!(output_of("var b[2] = {1, 2, 3}; print b;"), "[1, 2]");
        assert_eq!(output_of("var z[2]; print z;"), "[0, 0]");
        assert_eq!(output_of("var a; a[3] = {4, 5}; print a;"), "[4, 5, 0]");
    }

    #[test]
    fn test_indexing() {
        assert_eq!(output_of("var a = [10, 20, 30]; print a[1.9];"), "20");
        assert_eq!(output_of("var a = [[1, 2], [3]]; print a[0][1]; print a;"), "2[[1, 2], [3]]");

        let (_, e) = failure_of("var a = [1]; print a[1];");
        assert!(matches!(e, AxError::IndexOutOfBounds { len: 1, .. }));

        let (_, e) = failure_of("var a = [1]; a[-1] = 2;");
        assert!(matches!(e, AxError::IndexOutOfBounds { .. }));

        let (_, e) = failure_of("var s = \"abc\"; print s[0];");
        assert!(matches!(e, AxError::Type { .. }));

        let (_, e) = failure_of("var n = 3; n[0] = 1;");
        assert!(matches!(e, AxError::InvalidAssignmentTarget { .. }));
    }

    #[test]
    fn test_native_functions() {
        let source = r#"
            var a = [];
            push(a, 1);
            push(a, 2);
            print len(a);
            print pop(a);
            print a;
            print len("héllo");
        "#;
        assert_eq!(output_of(source), "22[1]5");

        let (_, e) = failure_of("pop([]);");
        assert!(matches!(e, AxError::Native { ref name, .. } if name == "pop"));

        let (_, e) = failure_of("len(1, 2);");
        assert!(matches!(e, AxError::ArityMismatch { expected: 1, got: 2, .. }));

        assert_eq!(output_of("compg(clock(), 0) print \"t\";"), "t");
        assert_eq!(output_of("print len;"), "<native fn len>");
    }

    // ── functions ──────────────────────────────────────────────────────

    #[test]
    fn test_function_call_and_return() {
        assert_eq!(output_of("fun add(a, b) { return a + b; } print add(2, 3);"), "5");
        assert_eq!(output_of("fun f() {} print f();"), "0");
        assert_eq!(output_of("fun f() { return; } print f();"), "0");
        assert_eq!(output_of("fun f() {} print f;"), "<fn f>");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
                compl(n, 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        "#;
        assert_eq!(output_of(source), "610");
    }

    #[test]
    fn test_return_from_inside_loop() {
        let source = r#"
            fun first() {
                loop i = 1 to 10 {
                    compeq(i, 3) return i;
                }
                return 0;
            }
            print first();
        "#;
        assert_eq!(output_of(source), "3");
    }

    #[test]
    fn test_closure_sees_later_assignment() {
        let source = "var x = 1; fun f() { return x; } x = 2; print f();";
        assert_eq!(output_of(source), "2");
    }

    #[test]
    fn test_closure_keeps_declaring_scope_alive() {
        let source = r#"
            fun make() {
                var n = 0;
                fun inc() { n = n + 1; return n; }
                return inc;
            }
            var c = make();
            c();
            print c();
            var d = make();
            print d();
        "#;
        assert_eq!(output_of(source), "21");
    }

    #[test]
    fn test_closure_resolves_through_declaring_not_calling_scope() {
        let source = r#"
            var x = "global";
            fun show() { print x; }
            fun caller() { var x = "local"; show(); }
            caller();
        "#;
        assert_eq!(output_of(source), "global");
    }

    #[test]
    fn test_function_scopes_are_reclaimed() {
        let mut interpreter = Interpreter::with_io(Vec::new(), io::empty());
        let source = r#"
            var a = [1];
            fun f() {
                var local = a;
                fun g() { return local; }
                return 0;
            }
            f(); f(); f();
        "#;

        assert!(run(source, &mut interpreter).is_clean());

        match interpreter.global("a") {
            // The global binding plus the clone held here.
            Some(Value::Array(items)) => assert_eq!(Rc::strong_count(&items), 2),
            other => panic!("expected an array, got {:?}", other),
        }
        assert_eq!(interpreter.live_scopes(), 1);
    }

    #[test]
    fn test_escaped_closure_scope_lives_until_unreachable() {
        let mut interpreter = Interpreter::with_io(Vec::new(), io::empty());
        let source = r#"
            fun make() {
                var n = 0;
                fun inc() { n = n + 1; return n; }
                return inc;
            }
            var c = make();
            c();
        "#;

        assert!(run(source, &mut interpreter).is_clean());
        assert_eq!(interpreter.live_scopes(), 2);

        assert!(run("print c(); c = 0;", &mut interpreter).is_clean());
        assert_eq!(interpreter.output(), b"2");
        assert_eq!(interpreter.live_scopes(), 1);
    }

    #[test]
    fn test_call_errors() {
        let (_, e) = failure_of("fun f(a) {} f();");
        assert!(matches!(e, AxError::ArityMismatch { expected: 1, got: 0, .. }));

        let (_, e) = failure_of("var x = 3; x();");
        assert!(matches!(e, AxError::NotCallable { .. }));
    }

    #[test]
    fn test_call_depth_limit() {
        // Unoptimised builds use large frames; give the recursion room.
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| failure_of("fun r(n) { return r(n + 1); } r(0);").1)
            .unwrap();

        let e = handle.join().unwrap();
        assert!(matches!(e, AxError::CallDepthExceeded { limit, .. } if limit == MAX_CALL_DEPTH));
    }

    #[test]
    fn test_control_flow_outside_its_construct() {
        let (_, e) = failure_of("break;");
        assert!(matches!(e, AxError::LoopControlOutsideLoop { keyword: "break", .. }));

        let (_, e) = failure_of("continue;");
        assert!(matches!(e, AxError::LoopControlOutsideLoop { keyword: "continue", .. }));

        let (_, e) = failure_of("return 1;");
        assert!(matches!(e, AxError::ReturnOutsideFunction { .. }));

        // A loop around the call site does not make `break` legal in the callee.
        let (_, e) = failure_of("fun f() { break; } loop i = 1 to 2 f();");
        assert!(matches!(e, AxError::LoopControlOutsideLoop { .. }));
    }

    // ── input ──────────────────────────────────────────────────────────

    #[test]
    fn test_input_classification() {
        let source = r#"
            input a; input b; input c; input d; input e;
            print a + 1; print " ";
            print b; print " ";
            print c; print " ";
            print len(c); print " ";
            print d; print "|";
            print e; print "|";
        "#;
        let (output, report) = run_with(
            source,
            "42\ntrue\n[1, x, false]\nhello world\n",
            ErrorPolicy::Halt,
        );

        assert!(report.is_clean(), "{:?}", report);
        assert_eq!(output, "43 true [1, x, false] 3 hello world||");
    }

    #[test]
    fn test_input_assigns_existing_binding() {
        let source = "var x = 0; { input x; } print x * 2;";
        let (output, report) = run_with(source, "21\r\n", ErrorPolicy::Halt);

        assert!(report.is_clean());
        assert_eq!(output, "42");
    }

    // ── error policies and pipeline ────────────────────────────────────

    #[test]
    fn test_halt_is_default_policy() {
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Halt);
    }

    #[test]
    fn test_skip_statement_policy_continues() {
        let (output, report) = run_with(
            "print 1; print 4 % 0; print 2;",
            "",
            ErrorPolicy::SkipStatement,
        );

        assert_eq!(output, "12");
        assert!(matches!(report.runtime_error, Some(AxError::ModuloByZero { .. })));
        assert_eq!(report.exit_code(), 70);
    }

    #[test]
    fn test_skip_statement_collects_every_error() {
        let source = "{ var y = 1; print 1 / 0; }\nprint y;\nprint 3;";
        let (output, report) = run_with(source, "", ErrorPolicy::SkipStatement);

        assert_eq!(output, "3");
        match report.runtime_error {
            Some(AxError::Many(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(matches!(errors[0], AxError::DivisionByZero { line: 1 }));
                assert!(matches!(errors[1], AxError::UndefinedVariable { line: 2, .. }));
            }
            other => panic!("expected two collected errors, got {:?}", other),
        }
    }

    #[test]
    fn test_statements_run_despite_parse_errors() {
        let (output, report) = run_with("print 1;\nvar = ;\nprint 2;", "", ErrorPolicy::Halt);

        assert_eq!(output, "12");
        assert_eq!(report.parse_errors.len(), 1);
        assert!(report.runtime_error.is_none());
        assert_eq!(report.exit_code(), 65);
    }

    #[test]
    fn test_state_persists_across_runs() {
        let mut interpreter = Interpreter::with_io(Vec::new(), io::empty());

        assert!(run("var total = 1;", &mut interpreter).is_clean());
        assert!(run("fun bump() { total = total + 1; }", &mut interpreter).is_clean());
        assert!(run("bump(); bump();", &mut interpreter).is_clean());

        assert!(matches!(interpreter.global("total"), Some(Value::Number(n)) if n == 3.0));
    }

    #[test]
    fn test_interpret_direct() {
        let (tokens, _) = axscript::tokenize("var a = 1; print a;");
        let (statements, _) = axscript::parse(&tokens);

        let mut interpreter = Interpreter::with_io(Vec::new(), io::empty());
        interpreter.interpret(&statements).unwrap();

        assert_eq!(interpreter.output(), b"1");
    }
}
