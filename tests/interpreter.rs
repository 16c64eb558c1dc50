#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox::driver::{Lox, Status};

    struct Outcome {
        status: Status,
        stdout: String,
        diagnostics: Vec<String>,
    }

    fn run_with(source: &str, interactive: bool) -> Outcome {
        let mut lox: Lox<Vec<u8>> = Lox::with_output(Vec::new(), interactive);
        let status = lox.run(source);

        Outcome {
            status,
            stdout: String::from_utf8_lossy(lox.output()).into_owned(),
            diagnostics: lox.reporter().diagnostics().to_vec(),
        }
    }

    fn run(source: &str) -> Outcome {
        run_with(source, false)
    }

    /// Runs a program that must succeed and returns its output.
    fn output(source: &str) -> String {
        let outcome = run(source);

        assert_eq!(
            outcome.status,
            Status::Ok,
            "diagnostics: {:?}",
            outcome.diagnostics
        );

        outcome.stdout
    }

    fn runtime_error(source: &str) -> (String, String) {
        let outcome = run(source);

        assert_eq!(outcome.status, Status::RuntimeError);
        assert_eq!(outcome.diagnostics.len(), 1);

        (outcome.stdout, outcome.diagnostics[0].clone())
    }

    // ── expressions ─────────────────────────────────────────────────────

    #[test]
    fn test_arithmetic_and_precedence() {
        assert_eq!(
            output("print 1 + 2 * 3; print (1 + 2) * 3; print 2 ^ 10; print 7 / 2; print -3 - -1;"),
            "7\n9\n1024\n3.5\n-2\n"
        );
    }

    #[test]
    fn test_string_concatenation_and_equality() {
        assert_eq!(
            output(
                r#"print "foo" + "bar"; print "a" == "a"; print 1 == "1"; print nil == nil; print 2 != 3;"#
            ),
            "foobar\ntrue\nfalse\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_truthiness() {
        let source = r#"
            print !nil;
            print !0;
            print !-1;
            print !0.5;
            print !"";
            print !"x";
            print !clock;
        "#;

        assert_eq!(output(source), "true\ntrue\ntrue\nfalse\ntrue\nfalse\nfalse\n");
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        let source = r#"
            var called = false;
            fun touch() { called = true; return true; }
            print nil or "right";
            print "left" or touch();
            print nil and touch();
            print called;
        "#;

        assert_eq!(output(source), "right\nleft\nnil\nfalse\n");
    }

    #[test]
    fn test_ternary_evaluates_only_the_chosen_branch() {
        let source = r#"
            var hits = 0;
            fun hit(v) { hits = hits + 1; return v; }
            print true ? hit("yes") : hit("no");
            print 0 ? hit("yes") : hit("no");
            print hits;
        "#;

        assert_eq!(output(source), "yes\nno\n2\n");
    }

    #[test]
    fn test_untaken_ternary_branch_never_raises() {
        assert_eq!(output("print (1 > 0) ? 10 : (1 / 0);"), "10\n");
    }

    #[test]
    fn test_comma_operator_yields_right_value() {
        let source = r#"
            var a = 0;
            fun bump() { a = a + 1; }
            print (bump(), bump(), "done");
            print a;
        "#;

        assert_eq!(output(source), "done\n2\n");
    }

    #[test]
    fn test_bare_print_prints_empty_line() {
        assert_eq!(output("print; print 1;"), "\n1\n");
    }

    // ── variables and scope ─────────────────────────────────────────────

    #[test]
    fn test_block_shadowing() {
        let source = r#"
            var a = "global";
            {
                var a = "outer";
                {
                    var a = "inner";
                    print a;
                }
                print a;
            }
            print a;
        "#;

        assert_eq!(output(source), "inner\nouter\nglobal\n");
    }

    #[test]
    fn test_closure_binding_is_static() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(output(source), "global\nglobal\n");
    }

    #[test]
    fn test_control_flow() {
        let source = r#"
            var total = 0;
            for (var i = 0; i < 5; i = i + 1) {
                if (i == 2) total = total + 100; else total = total + i;
            }
            print total;

            var n = 3;
            while (n > 0) n = n - 1;
            print n;
        "#;

        assert_eq!(output(source), "108\n0\n");
    }

    // ── functions ───────────────────────────────────────────────────────

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
            print fib(15);
        "#;

        assert_eq!(output(source), "610\n");
    }

    #[test]
    fn test_closures_keep_independent_state() {
        let source = r#"
            fun makeCounter() {
                var count = 0;
                fun increment() { count = count + 1; return count; }
                return increment;
            }

            var first = makeCounter();
            var second = makeCounter();
            print first();
            print first();
            print second();
            print first();
        "#;

        assert_eq!(output(source), "1\n2\n1\n3\n");
    }

    #[test]
    fn test_return_unwinds_nested_loops() {
        let source = r#"
            fun find() {
                for (var i = 0; i < 10; i = i + 1) {
                    while (true) {
                        if (i == 3) return i;
                        i = i + 1;
                    }
                }
                return -1;
            }
            print find();
        "#;

        assert_eq!(output(source), "3\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_callable_display() {
        assert_eq!(
            output("fun f() {} class C {} print f; print clock; print C; print C();"),
            "<fn f>\n<native fn>\nC\n<C instance>\n"
        );
    }

    #[test]
    fn test_clock_returns_a_number() {
        assert_eq!(output("print clock() > 0;"), "true\n");
    }

    // ── classes ─────────────────────────────────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let source = r#"
            class Point {
                init(x, y) { this.x = x; this.y = y; }
                sum() { return this.x + this.y; }
            }

            var p = Point(1, 2);
            p.x = 10;
            print p.sum();
        "#;

        assert_eq!(output(source), "12\n");
    }

    #[test]
    fn test_initializer_always_returns_instance() {
        let source = r#"
            class Foo {
                init() { this.ready = true; return; }
            }

            var foo = Foo();
            print foo.init();
            print foo.ready;
        "#;

        assert_eq!(output(source), "<Foo instance>\ntrue\n");
    }

    #[test]
    fn test_bound_methods_remember_their_instance() {
        let source = r#"
            class Named {
                init(name) { this.name = name; }
                say() { return this.name; }
            }

            var a = Named("a");
            var b = Named("b");
            var said = a.say;
            b.say = said;
            print b.say();
        "#;

        assert_eq!(output(source), "a\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            print a.m();
            a.m = "field";
            print a.m;
        "#;

        assert_eq!(output(source), "method\nfield\n");
    }

    #[test]
    fn test_inheritance_and_super_dispatch() {
        let source = r#"
            class A {
                method() { return "A"; }
                describe() { return "I am " + this.method(); }
            }

            class B < A {
                method() { return "B"; }
                parent() { return super.method(); }
            }

            class C < B {}

            var c = C();
            print c.method();
            print c.parent();
            print c.describe();
        "#;

        assert_eq!(output(source), "B\nA\nI am B\n");
    }

    #[test]
    fn test_inherited_initializer_sets_arity() {
        let source = r#"
            class A { init(v) { this.v = v; } }
            class B < A {}
            print B(7).v;
        "#;

        assert_eq!(output(source), "7\n");
    }

    // ── runtime errors ──────────────────────────────────────────────────

    #[test]
    fn test_division_by_zero() {
        let (stdout, error) = runtime_error("print 1;\nprint 1 / 0;\nprint 2;");

        assert_eq!(stdout, "1\n");
        assert_eq!(error, "Division by zero.\n[line 2]");
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(
            runtime_error("-\"a\";").1,
            "Operand must be a number.\n[line 1]"
        );
        assert_eq!(
            runtime_error("1 < \"a\";").1,
            "Operands must be numbers.\n[line 1]"
        );
        assert_eq!(
            runtime_error("1 + \"a\";").1,
            "Operands must be two numbers or two strings.\n[line 1]"
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            runtime_error("print nope;").1,
            "Undefined variable 'nope'.\n[line 1]"
        );
        assert_eq!(
            runtime_error("nope = 1;").1,
            "Undefined variable 'nope'.\n[line 1]"
        );
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(
            runtime_error("fun f(a) {} f(1, 2);").1,
            "Expected 1 arguments but got 2.\n[line 1]"
        );
        assert_eq!(
            runtime_error("\"text\"();").1,
            "Can only call functions and classes.\n[line 1]"
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_error("var x = 1; print x.y;").1,
            "Only instances have properties.\n[line 1]"
        );
        assert_eq!(
            runtime_error("var x = 1; x.y = 2;").1,
            "Only instances have fields.\n[line 1]"
        );
        assert_eq!(
            runtime_error("class A {} print A().missing;").1,
            "Undefined property 'missing'.\n[line 1]"
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert_eq!(
            runtime_error("var NotAClass = 1; class B < NotAClass {}").1,
            "Superclass must be a class.\n[line 1]"
        );
    }

    #[test]
    fn test_error_inside_function_restores_scope() {
        let mut lox: Lox<Vec<u8>> = Lox::with_output(Vec::new(), false);

        let status = lox.run("var a = \"global\"; fun f() { var a = \"local\"; return 1 / 0; } f();");
        assert_eq!(status, Status::RuntimeError);

        assert_eq!(lox.run("print a;"), Status::Ok);
        assert_eq!(String::from_utf8_lossy(lox.output()), "global\n");
    }

    // ── driver behaviour ────────────────────────────────────────────────

    #[test]
    fn test_compile_errors_stop_before_execution() {
        let outcome = run("print 1;\nprint (;\nvar = 2;");

        assert_eq!(outcome.status, Status::CompileError);
        assert_eq!(outcome.stdout, "");
        assert_eq!(
            outcome.diagnostics,
            vec![
                "[line 2] Error at ';': Expected expression.",
                "[line 3] Error at '=': Expected variable name.",
            ]
        );
    }

    #[test]
    fn test_resolve_errors_stop_before_execution() {
        let outcome = run("print 1; return 2;");

        assert_eq!(outcome.status, Status::CompileError);
        assert_eq!(outcome.stdout, "");
    }

    #[test]
    fn test_scan_errors_are_compile_errors() {
        let outcome = run("print 1; @");

        assert_eq!(outcome.status, Status::CompileError);
        assert_eq!(
            outcome.diagnostics,
            vec!["[line 1] Error: Unexpected character: @"]
        );
    }

    #[test]
    fn test_interactive_mode_echoes_expression_statements() {
        let outcome = run_with("1 + 2; var a = 3; a; nil; print \"p\";", true);

        assert_eq!(outcome.status, Status::Ok);
        assert_eq!(outcome.stdout, "3\n3\nnil\np\n");
    }

    #[test]
    fn test_session_keeps_globals_and_resets_errors() {
        let mut lox: Lox<Vec<u8>> = Lox::with_output(Vec::new(), true);

        assert_eq!(lox.run("var count = 1;"), Status::Ok);
        assert_eq!(lox.run("count = ;"), Status::CompileError);
        assert_eq!(lox.run("fun bump() { count = count + 1; return count; }"), Status::Ok);
        assert_eq!(lox.run("bump();"), Status::Ok);
        assert!(lox.reporter().diagnostics().is_empty());

        assert_eq!(String::from_utf8_lossy(lox.output()), "2\n");
    }
}
