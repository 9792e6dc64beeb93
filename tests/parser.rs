#[cfg(test)]
mod parser_tests {
    use axscript::ast_printer::AstPrinter;
    use axscript::error::AxError;
    use axscript::expr::{BinaryOp, CompareOp, Expr};
    use axscript::stmt::Stmt;
    use axscript::{parse, tokenize};

    fn parse_source(source: &str) -> (Vec<Stmt>, Vec<AxError>) {
        let (tokens, lex_errors) = tokenize(source);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

        parse(&tokens)
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse_source(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);

        statements
    }

    fn printed(source: &str) -> String {
        AstPrinter::print_program(&parse_ok(source))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(printed("1 + 2 * 3;"), "(; (+ 1 (* 2 3)))");
        assert_eq!(printed("(1 + 2) * 3;"), "(; (* (group (+ 1 2)) 3))");
        assert_eq!(printed("a == b < c;"), "(; (== a (< b c)))");
        assert_eq!(printed("-x % 2;"), "(; (% (- x) 2))");
        assert_eq!(printed("!!true;"), "(; (! (! true)))");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 3;"), "(; (= a (= b 3)))");
    }

    #[test]
    fn test_index_call_and_arrays() {
        assert_eq!(printed("f(1, 2)[0];"), "(; (index (call f 1 2) 0))");
        assert_eq!(printed("a[i] = [1, \"x\"];"), "(; (= (index a i) [1 \"x\"]))");
    }

    #[test]
    fn test_var_forms() {
        assert_eq!(printed("var x;"), "(var x)");
        assert_eq!(printed("var x = 1;"), "(var x 1)");
        assert_eq!(printed("var a[3];"), "(var a (array 3 []))");
        assert_eq!(printed("var a[3] = {1, 2};"), "(var a (array 3 [1 2]))");
        assert_eq!(printed("a[2] = {7};"), "(; (= a (array 2 [7])))");
    }

    #[test]
    fn test_loop_forms() {
        assert_eq!(printed("loop i = 1 to 3 print i;"), "(loop i 1 to 3 (print i))");
        assert_eq!(
            printed("loop i = 10 down to 0 step 2 { break; }"),
            "(loop i 10 down 0 step 2 (block (break)))"
        );
    }

    #[test]
    fn test_comparison_statement_with_branches() {
        let statements = parse_ok(
            r#"compg(5, 3) print "big"; elseif (x) print "mid"; else print "small";"#,
        );

        match &statements[..] {
            [Stmt::Compare {
                op: CompareOp::Gt,
                left: Expr::Number(l),
                right: Expr::Number(r),
                branches,
                line: 1,
            }] => {
                assert_eq!((*l, *r), (5.0, 3.0));
                assert_eq!(branches.else_ifs.len(), 1);
                assert!(branches.else_branch.is_some());
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_comparison_folds_trailing_and_or() {
        let statements = parse_ok("compeq(a, 1) and compl(b, 2) print 1;");
        assert!(matches!(
            &statements[0],
            Stmt::And {
                left: Expr::Compare { op: CompareOp::Eq, .. },
                right: Expr::Compare { op: CompareOp::Lt, .. },
                ..
            }
        ));

        let statements = parse_ok("compeq(a, 1) or not(b) print 1;");
        assert!(matches!(&statements[0], Stmt::Or { right: Expr::Unary { .. }, .. }));
    }

    #[test]
    fn test_bare_logic_and_multi_condition_forms() {
        assert!(matches!(
            &parse_ok("and(a, b) print 1;")[0],
            Stmt::And { .. }
        ));
        assert!(matches!(
            &parse_ok("or(a, b) print 1; else print 2;")[0],
            Stmt::Or { .. }
        ));

        match &parse_ok("and { compg(a, 1), not(b), (c) } print 1;")[0] {
            Stmt::AllOf { conditions, .. } => assert_eq!(conditions.len(), 3),
            other => panic!("unexpected parse: {:?}", other),
        }
        match &parse_ok("or { compg(a, 1), (c) } print 1;")[0] {
            Stmt::AnyOf { conditions, .. } => assert_eq!(conditions.len(), 2),
            other => panic!("unexpected parse: {:?}", other),
        }

        assert!(matches!(&parse_ok("not(x) print 1;")[0], Stmt::Not { .. }));
    }

    #[test]
    fn test_function_declaration() {
        match &parse_ok("fun add(a, b) { return a + b; }")[0] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name, "add");
                assert_eq!(decl.params, vec!["a".to_string(), "b".to_string()]);
                assert!(matches!(
                    &decl.body[..],
                    [Stmt::Return {
                        value: Some(Expr::Binary { op: BinaryOp::Add, .. }),
                        ..
                    }]
                ));
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (_, errors) = parse_source("1 + 2 = 3;");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Invalid assignment target.");
    }

    #[test]
    fn test_recovery_keeps_sibling_statements() {
        let source = "print 1;\nvar = 2;\nprint 3;\n";
        let (statements, errors) = parse_source(source);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line(), Some(2));
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_recovery_inside_block() {
        let source = "{\n print 1;\n print ;\n print 3;\n}\nprint 4;";
        let (statements, errors) = parse_source(source);

        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert_eq!(errors[0].line(), Some(3));

        assert_eq!(statements.len(), 2);
        match &statements[0] {
            Stmt::Block(inner) => assert_eq!(inner.len(), 2),
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_missing_semicolon_reports_line() {
        let (_, errors) = parse_source("print 1\nprint 2;");

        assert!(matches!(&errors[0], AxError::Parse { line: 2, message } if message == "Expected ';' after value."));
    }

    #[test]
    fn test_bad_array_size() {
        let (_, errors) = parse_source("var a[1.5];");
        assert_eq!(errors.len(), 1);

        let (_, errors) = parse_source("var a[n];");
        assert_eq!(errors.len(), 1);

        let (_, errors) = parse_source("var a[100000000000000000000];");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Array size cannot exceed 1048576."
        );

        let (_, errors) = parse_source("a[100000000000000000000] = {1};");
        assert_eq!(errors.len(), 1);

        assert!(parse_source("var a[1048576];").1.is_empty());
    }

    #[test]
    fn test_empty_program() {
        let (statements, errors) = parse_source("  // nothing here\n");

        assert!(statements.is_empty());
        assert!(errors.is_empty());
    }
}
