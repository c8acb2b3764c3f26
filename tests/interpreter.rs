mod common;

#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox::lox::Lox;

    use crate::common::{on_interpreter_stack, run, run_deep, run_ok, SharedBuffer};

    fn runtime_error(source: &str) -> String {
        let outcome = run(source);

        assert!(outcome.had_runtime_error, "expected a runtime error");
        assert!(!outcome.had_error);

        outcome.stderr
    }

    // ─────────────────────────── values & operators ───────────────────────────

    #[test]
    fn test_number_printing_strips_trailing_zero() {
        assert_eq!(run_ok("print 6; print 6.5; print 1 / 4; print -0.5;"), "6\n6.5\n0.25\n-0.5\n");
    }

    #[test]
    fn test_huge_and_tiny_numbers_print_in_exponent_form() {
        let output = run_ok(
            "print 10000000000 * 10000000000 * 100;
             print 1 / 10000000;
             print 100000000000000000000;",
        );

        assert_eq!(output, "1e+22\n1e-7\n100000000000000000000\n");
    }

    #[test]
    fn test_literals_print_naturally() {
        assert_eq!(
            run_ok("print nil; print true; print false; print \"text\";"),
            "nil\ntrue\nfalse\ntext\n"
        );
    }

    #[test]
    fn test_truthiness() {
        let output = run_ok(
            "print !nil; print !false; print !0; print !\"\"; print !!0; print !!nil;",
        );

        assert_eq!(output, "true\ntrue\nfalse\nfalse\ntrue\nfalse\n");
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        let output = run_ok(
            "print 1 + 2 * 3 - 4 / 2;
             print (1 + 2) * 3;
             print 3 > 2; print 3 >= 3; print 2 < 1; print 2 <= 1;
             print 1 / 0;",
        );

        assert_eq!(output, "5\n9\ntrue\ntrue\nfalse\nfalse\nInfinity\n");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run_ok("print \"1\" + \"1\";"), "11\n");
    }

    #[test]
    fn test_mixed_plus_is_a_runtime_error() {
        assert_eq!(
            runtime_error("1 + \"1\";"),
            "Operands must be two numbers or two strings.\n[line 1]\n"
        );
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(
            runtime_error("print -\"x\";"),
            "Operand must be a number.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("\n\nprint 1 < \"2\";"),
            "Operands must be numbers.\n[line 3]\n"
        );
    }

    #[test]
    fn test_equality_without_coercion() {
        let output = run_ok(
            "print nil == nil; print nil == false; print 1 == \"1\";
             print \"a\" == \"a\"; print 2 != 2; print clock == clock;",
        );

        assert_eq!(output, "true\nfalse\nfalse\ntrue\nfalse\ntrue\n");
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        let output = run_ok(
            "print nil or \"default\";
             print 0 or \"unused\";
             print nil and undefinedName;
             print true and 2;
             var touched = false;
             fun touch() { touched = true; return true; }
             false and touch();
             print touched;",
        );

        assert_eq!(output, "default\n0\nnil\n2\nfalse\n");
    }

    // ─────────────────────────── variables & scope ────────────────────────────

    #[test]
    fn test_scope_shadowing() {
        assert_eq!(run_ok("var a = 1; { var a = 2; print a; } print a;"), "2\n1\n");
    }

    #[test]
    fn test_assignment_reaches_enclosing_scope() {
        let output = run_ok(
            "var a = 1;
             { { a = a + 1; } }
             var b;
             print a; print b;
             print a = 10;",
        );

        assert_eq!(output, "2\nnil\n10\n");
    }

    #[test]
    fn test_undefined_variable_is_raised_at_use() {
        let outcome = run("print \"first\";\nprint missing;\nprint \"never\";");

        assert_eq!(outcome.stdout, "first\n");
        assert_eq!(outcome.stderr, "Undefined variable 'missing'.\n[line 2]\n");
        assert!(outcome.had_runtime_error);
    }

    #[test]
    fn test_assigning_undefined_global_fails() {
        assert_eq!(
            runtime_error("ghost = 1;"),
            "Undefined variable 'ghost'.\n[line 1]\n"
        );
    }

    #[test]
    fn test_environment_restored_after_runtime_error_in_block() {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let mut lox = Lox::with_writers(Box::new(out.clone()), Box::new(err.clone()));

        lox.run("var a = \"global\"; { var a = \"inner\"; nil + 1; }");
        assert!(lox.had_runtime_error);

        lox.reset_errors();
        lox.run("print a;");

        assert_eq!(out.contents(), "global\n");
        assert!(!lox.had_runtime_error);
    }

    // ───────────────────────────── control flow ───────────────────────────────

    #[test]
    fn test_if_else_and_while() {
        let output = run_ok(
            "if (1 > 2) print \"no\"; else print \"yes\";
             if (nil) print \"skipped\";
             var i = 0;
             while (i < 3) { print i; i = i + 1; }",
        );

        assert_eq!(output, "yes\n0\n1\n2\n");
    }

    #[test]
    fn test_for_loop() {
        let output = run_ok(
            "var sum = 0;
             for (var i = 1; i <= 4; i = i + 1) sum = sum + i;
             print sum;",
        );

        assert_eq!(output, "10\n");
    }

    #[test]
    fn test_for_loop_closures_share_loop_variable() {
        let output = run_ok(
            "var first;
             for (var i = 0; i < 2; i = i + 1) {
               fun show() { print i; }
               if (first == nil) first = show;
             }
             first();",
        );

        assert_eq!(output, "2\n");
    }

    // ──────────────────────────────── functions ───────────────────────────────

    #[test]
    fn test_fibonacci() {
        let output = run_ok(
            "fun fib(n){ if (n<2) return n; return fib(n-1)+fib(n-2); } print fib(10);",
        );

        assert_eq!(output, "55\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run_ok("fun f() {} print f(); fun g() { return; } print g();"), "nil\nnil\n");
    }

    #[test]
    fn test_return_unwinds_through_loops_and_blocks() {
        let output = run_ok(
            "fun find() {
               var i = 0;
               while (true) {
                 { if (i == 3) return i; }
                 i = i + 1;
               }
             }
             print find();",
        );

        assert_eq!(output, "3\n");
    }

    #[test]
    fn test_closures_capture_environment_by_reference() {
        let output = run_ok(
            "fun makeCounter() {
               var count = 0;
               fun counter() { count = count + 1; return count; }
               return counter;
             }
             var a = makeCounter();
             var b = makeCounter();
             print a(); print a(); print b(); print a();",
        );

        assert_eq!(output, "1\n2\n1\n3\n");
    }

    #[test]
    fn test_callable_stringification() {
        let output = run_ok(
            "fun hello() {} class Box {} print hello; print Box; print Box(); print clock;",
        );

        assert_eq!(output, "<fn hello>\n<class Box>\nBox instance\n<native fn>\n");
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_eq!(run_ok("print clock() > 1000000000;"), "true\n");
    }

    #[test]
    fn test_arity_mismatch_never_runs_the_body() {
        let outcome = run(
            "fun f(a, b) { print \"ran\"; }
             f(1);",
        );

        assert_eq!(outcome.stdout, "");
        assert_eq!(outcome.stderr, "Expected 2 arguments but got 1.\n[line 2]\n");
    }

    #[test]
    fn test_deep_recursion_within_limit() {
        let outcome = run_deep(
            "fun depth(n) { if (n == 0) return 0; return 1 + depth(n - 1); }
             print depth(700);
             print depth(2000);",
        );

        assert_eq!(outcome.stderr, "");
        assert_eq!(outcome.stdout, "700\n2000\n");
    }

    #[test]
    fn test_runaway_recursion_is_a_runtime_error() {
        let outcome = run_deep("fun f(n){ return f(n+1); }\nf(0);\nprint \"after\";");

        assert!(outcome.had_runtime_error);
        assert_eq!(outcome.stdout, "");
        assert_eq!(outcome.stderr, "Stack overflow.\n[line 1]\n");
    }

    #[test]
    fn test_session_recovers_after_stack_overflow() {
        let (stdout, stderr) = on_interpreter_stack(|| {
            let out = SharedBuffer::default();
            let err = SharedBuffer::default();
            let mut lox = Lox::with_writers(Box::new(out.clone()), Box::new(err.clone()));

            lox.run("fun down(n) { if (n == 0) return \"bottom\"; return down(n - 1); }");
            lox.run("down(-1);");
            assert!(lox.had_runtime_error);

            lox.reset_errors();
            lox.run("print down(2000);");
            assert!(!lox.had_runtime_error);

            (out.contents(), err.contents())
        });

        assert_eq!(stdout, "bottom\n");
        assert_eq!(stderr, "Stack overflow.\n[line 1]\n");
    }

    #[test]
    fn test_calling_a_non_callable() {
        assert_eq!(
            runtime_error("\"not a function\"();"),
            "Can only call function and classes.\n[line 1]\n"
        );
    }

    // ───────────────────────────────── classes ────────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let output = run_ok(
            "class Point {
               init(x, y) { this.x = x; this.y = y; }
               sum() { return this.x + this.y; }
             }
             var p = Point(1, 2);
             print p.sum();
             p.x = 10;
             print p.sum();
             p.label = \"made later\";
             print p.label;",
        );

        assert_eq!(output, "3\n12\nmade later\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let output = run_ok(
            "class A { m() { return \"method\"; } }
             var a = A();
             a.m = \"field\";
             print a.m;",
        );

        assert_eq!(output, "field\n");
    }

    #[test]
    fn test_bound_method_remembers_instance() {
        let output = run_ok(
            "class Person {
               init(name) { this.name = name; }
               greet() { print \"hi \" + this.name; }
             }
             var greet = Person(\"ada\").greet;
             greet();",
        );

        assert_eq!(output, "hi ada\n");
    }

    #[test]
    fn test_initializer_returns_instance() {
        let output = run_ok(
            "class A {
               init() { this.n = 1; return; }
             }
             var a = A();
             print a.init() == a;
             print a.n;",
        );

        assert_eq!(output, "true\n1\n");
    }

    #[test]
    fn test_class_arity_follows_initializer() {
        assert_eq!(
            runtime_error("class A { init(a) {} } A();"),
            "Expected 1 arguments but got 0.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("class B {} B(1);"),
            "Expected 0 arguments but got 1.\n[line 1]\n"
        );
    }

    #[test]
    fn test_method_can_name_its_own_class() {
        let output = run_ok(
            "class Node {
               make() { return Node(); }
             }
             print Node().make();",
        );

        assert_eq!(output, "Node instance\n");
    }

    #[test]
    fn test_inherited_method() {
        assert_eq!(
            run_ok("class A { greet(){ print \"hi\"; } } class B < A {} var b = B(); b.greet();"),
            "hi\n"
        );
    }

    #[test]
    fn test_super_calls_parent_with_subclass_this() {
        let output = run_ok(
            "class A {
               name() { return \"A\"; }
               describe() { return \"A.describe on \" + this.name(); }
             }
             class B < A {
               name() { return \"B\"; }
               describe() { return super.describe() + \" via B\"; }
             }
             print B().describe();",
        );

        assert_eq!(output, "A.describe on B via B\n");
    }

    #[test]
    fn test_super_skips_the_instance_class() {
        let output = run_ok(
            "class A { method() { print \"A method\"; } }
             class B < A {
               method() { print \"B method\"; }
               test() { super.method(); }
             }
             class C < B {}
             C().test();",
        );

        assert_eq!(output, "A method\n");
    }

    #[test]
    fn test_inherited_initializer() {
        let output = run_ok(
            "class A { init(v) { this.v = v; } }
             class B < A {
               init(v) { super.init(v * 2); }
             }
             print B(21).v;",
        );

        assert_eq!(output, "42\n");
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_error("var n = 1; print n.field;"),
            "Only instances have properties.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("var n = 1; n.field = 2;"),
            "Only instances have fields.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("class A {} print A().missing;"),
            "Undefined property 'missing'.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("class A {} class B < A { m() { return super.missing; } } B().m();"),
            "Undefined property 'missing'.\n[line 1]\n"
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert_eq!(
            runtime_error("var NotAClass = \"nope\";\nclass B < NotAClass {}"),
            "Superclass must be a class.\n[line 2]\n"
        );
    }

    // ─────────────────────────────── driver ───────────────────────────────────

    #[test]
    fn test_prompt_lines_share_globals_and_echo_expressions() {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let mut lox = Lox::with_writers(Box::new(out.clone()), Box::new(err.clone()));

        lox.run_line("var a = 20;");
        lox.run_line("fun twice(x) { return x * 2; }");
        lox.run_line("twice(a) + 2");

        assert_eq!(err.contents(), "[line 1] Error at end: Expect ';' after expression.\n");
        assert!(lox.had_error);

        lox.reset_errors();
        lox.run_line("twice(a) + 2;");
        lox.run_line("print a;");

        assert!(!lox.had_error);
        assert_eq!(out.contents(), "42\n20\n");
    }

    #[test]
    fn test_closures_from_earlier_prompt_lines_keep_their_bindings() {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let mut lox = Lox::with_writers(Box::new(out.clone()), Box::new(err.clone()));

        lox.run_line("fun make() { var x = \"kept\"; fun get() { return x; } return get; }");
        lox.run_line("var get = make();");
        lox.run_line("var x = \"global\";");
        lox.run_line("print get();");

        assert_eq!(err.contents(), "");
        assert_eq!(out.contents(), "kept\n");
    }

    #[test]
    fn test_lexical_and_parse_errors_are_all_reported() {
        let outcome = run("var a = @;\nprint 1");

        assert!(outcome.had_error);
        assert_eq!(outcome.stdout, "");
        assert_eq!(
            outcome.stderr,
            "[line 1] Error: Unexpected character.\n\
             [line 1] Error at ';': Expect expression.\n\
             [line 2] Error at end: Expect ';' after value.\n"
        );
    }
}
