mod common;

#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast_printer::Ast;
    use rox::error::LoxError;
    use rox::expr::Expr;
    use rox::parser::Parser;
    use rox::scanner::scan_tokens;
    use rox::stmt::Stmt;

    use crate::common::on_interpreter_stack;

    fn print_expression(source: &str) -> String {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty());

        let expr = Parser::new(&tokens)
            .parse_expression()
            .expect("expression parses");

        Ast.print(&expr)
    }

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty());

        Parser::new(&tokens).parse()
    }

    fn parse_errors(source: &str) -> Vec<String> {
        parse(source)
            .expect_err("source should not parse")
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn test_precedence_ladder() {
        assert_eq!(print_expression("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(
            print_expression("-123 * (45.67)"),
            "(* (- 123.0) (group 45.67))"
        );
        assert_eq!(
            print_expression("a == b < c or d and !e"),
            "(or (== a (< b c)) (and d (! e)))"
        );
    }

    #[test]
    fn test_binary_is_left_associative() {
        assert_eq!(print_expression("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
        assert_eq!(print_expression("8 / 4 / 2"), "(/ (/ 8.0 4.0) 2.0)");
    }

    #[test]
    fn test_unary_and_assignment_are_right_associative() {
        assert_eq!(print_expression("!!true"), "(! (! true))");
        assert_eq!(print_expression("a = b = 1"), "(= a (= b 1.0))");
    }

    #[test]
    fn test_calls_and_properties() {
        assert_eq!(
            print_expression("a.b(1, \"two\").c"),
            "(. (call (. a b) 1.0 two) c)"
        );
        assert_eq!(print_expression("a.b.c = nil"), "(= (. a b).c nil)");
        assert_eq!(print_expression("super.cook"), "(super cook)");
        assert_eq!(print_expression("this"), "this");
    }

    #[test]
    fn test_for_is_desugared_into_while() {
        let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();

        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block, got {:?}", statements[0]);
        };

        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected while, got {:?}", outer[1]);
        };

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected body block, got {:?}", body);
        };

        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_empty_for_clauses_loop_forever_on_true() {
        let statements = parse("for (;;) {}").unwrap();

        assert!(matches!(
            &statements[0],
            Stmt::While {
                condition: Expr::Literal(_),
                ..
            }
        ));
    }

    #[test]
    fn test_class_declaration_with_superclass() {
        let statements = parse("class B < A { init(x) { this.x = x; } go() {} }").unwrap();

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &statements[0]
        else {
            panic!("expected class");
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].params.len(), 1);
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            parse_errors("a + b = c;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_error_locations() {
        assert_eq!(
            parse_errors("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
        assert_eq!(
            parse_errors("var 1 = 2;"),
            vec!["[line 1] Error at '1': Expect variable name."]
        );
    }

    #[test]
    fn test_recovery_reports_one_error_per_statement() {
        let errors = parse_errors("var = 1;\nprint 2;\nprint (3;\nvar ok = 4;\nfun (");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect ')' after expression.",
                "[line 5] Error at '(': Expect function name.",
            ]
        );
    }

    #[test]
    fn test_too_many_arguments_is_reported() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        assert_eq!(
            parse_errors(&source),
            vec!["[line 1] Error at '255': Can't have more than 255 arguments."]
        );
    }

    #[test]
    fn test_deep_parentheses_report_too_much_nesting() {
        let depth = 20_000;
        let source = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));

        let errors = on_interpreter_stack(move || parse_errors(&source));

        assert_eq!(errors, vec!["[line 1] Error at '(': Too much nesting."]);
    }

    #[test]
    fn test_deep_blocks_report_too_much_nesting() {
        let source = format!("{}{}", "{".repeat(5_000), "}".repeat(5_000));

        let errors = on_interpreter_stack(move || parse_errors(&source));

        assert_eq!(errors[0], "[line 1] Error at '{': Too much nesting.");
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));

        let printed = on_interpreter_stack(move || print_expression(&source));

        assert!(printed.starts_with("(group (group "));
    }

    #[test]
    fn test_parse_expression_rejects_trailing_tokens() {
        let (tokens, _) = scan_tokens("1 2");
        let errors = Parser::new(&tokens).parse_expression().unwrap_err();

        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at '2': Expect end of expression."
        );
    }
}
