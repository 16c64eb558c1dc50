#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, Stmt};
    use rox::error::Reporter;
    use rox::parser::Parser;
    use rox::resolver::{Locals, Resolver};
    use rox::scanner::scan_tokens;

    fn resolve(source: &str) -> (Vec<Stmt>, Locals, Reporter) {
        let mut reporter = Reporter::new();
        let tokens = scan_tokens(source, &mut reporter);
        let statements = Parser::new(&tokens, &mut reporter).parse();
        assert!(!reporter.had_error(), "{:?}", reporter.diagnostics());

        let mut resolver = Resolver::new(&mut reporter);
        resolver.resolve(&statements);
        let locals = resolver.finish();

        (statements, locals, reporter)
    }

    fn errors(source: &str) -> Vec<String> {
        let (_, _, reporter) = resolve(source);
        reporter.diagnostics().to_vec()
    }

    #[test]
    fn test_clean_program_has_no_errors() {
        let source = "
            var a = 1;
            fun f(x) { var y = x; return y + a; }
            class A { init() { this.v = 1; } get() { return this.v; } }
            class B < A { get() { return super.get(); } }
        ";

        assert_eq!(errors(source), Vec::<String>::new());
    }

    #[test]
    fn test_globals_are_left_unrecorded() {
        let (_, locals, _) = resolve("var a = 1; print a;");
        assert!(locals.is_empty());
    }

    #[test]
    fn test_block_local_depth() {
        let (statements, locals, _) = resolve("{ var a = 1; { print a; } }");

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected a block");
        };
        let Stmt::Block(inner) = &outer[1] else {
            panic!("expected a nested block");
        };
        let Stmt::Print(Some(Expr::Variable { id, .. })) = &inner[0] else {
            panic!("expected print of a variable");
        };

        assert_eq!(locals.get(id), Some(&1));
    }

    #[test]
    fn test_parameters_sit_one_scope_above_the_body() {
        let (statements, locals, _) = resolve("fun f(x) { return x; }");

        let Stmt::Function(declaration) = &statements[0] else {
            panic!("expected a function");
        };
        let Stmt::Return {
            value: Some(Expr::Variable { id, .. }),
            ..
        } = &declaration.body[0]
        else {
            panic!("expected return of a variable");
        };

        assert_eq!(locals.get(id), Some(&1));
    }

    #[test]
    fn test_own_initializer_read() {
        assert_eq!(
            errors("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_eq!(
            errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );

        // allowed at global scope
        assert_eq!(errors("var a = 1; var a = 2;"), Vec::<String>::new());
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(
            errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_value_returned_from_initializer() {
        assert_eq!(
            errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );

        assert_eq!(errors("class A { init() { return; } }"), Vec::<String>::new());
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_super_misuse() {
        assert_eq!(
            errors("print super.x;"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );

        assert_eq!(
            errors("class A { f() { return super.f(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_all_errors_are_collected() {
        let diagnostics = errors("return 1;\nprint this;\n{ var b = b; }");

        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics[2].starts_with("[line 3]"));
    }
}
