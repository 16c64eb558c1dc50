#[cfg(test)]
mod printer_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::Expr;
    use rox::ast_printer::AstPrinter;
    use rox::error::Reporter;
    use rox::parser::Parser;
    use rox::scanner::scan_tokens;

    fn parse_expression(source: &str) -> Expr {
        let mut reporter = Reporter::new();
        let tokens = scan_tokens(source, &mut reporter);
        let expr = Parser::new(&tokens, &mut reporter).parse_expression();

        assert!(!reporter.had_error(), "{:?}", reporter.diagnostics());

        match expr {
            Some(expr) => expr,
            None => panic!("no expression parsed from {:?}", source),
        }
    }

    fn print(source: &str) -> String {
        AstPrinter::print(&parse_expression(source))
    }

    /// Printing, re-parsing and printing again is a fixed point.
    fn assert_round_trip(source: &str) {
        let once = print(source);
        let twice = print(&once);

        assert_eq!(twice, once, "source: {}", source);
    }

    #[test]
    fn test_print_literals() {
        assert_eq!(print("12"), "12");
        assert_eq!(print("1.5"), "1.5");
        assert_eq!(print("\"hi\""), "\"hi\"");
        assert_eq!(print("true"), "true");
        assert_eq!(print("nil"), "nil");
    }

    #[test]
    fn test_print_keeps_explicit_grouping_only() {
        assert_eq!(print("(1 + 2) * 3"), "(1 + 2) * 3");
        assert_eq!(print("1 + 2*3"), "1 + 2 * 3");
        assert_eq!(print("-(-x)"), "-(-x)");
        assert_eq!(print("!!ok"), "!!ok");
    }

    #[test]
    fn test_print_ternary_and_comma() {
        assert_eq!(print("a?b:c"), "a ? b : c");
        assert_eq!(print("a , b , c"), "a, b, c");
        assert_eq!(print("f((a, b), c)"), "f((a, b), c)");
    }

    #[test]
    fn test_print_calls_properties_and_assignment() {
        assert_eq!(print("obj.field.method(1)(2)"), "obj.field.method(1)(2)");
        assert_eq!(print("a.b = c = 3"), "a.b = c = 3");
        assert_eq!(print("x or y and z"), "x or y and z");
    }

    #[test]
    fn test_round_trip() {
        for source in [
            "1 + 2 * 3 - 4 / 5",
            "(1 + 2) * (3 - 4)",
            "2 ^ 3 ^ 4",
            "a = b ? c : d ? e : f",
            "-a - -b",
            "f(g(1, 2), (3, 4), h())",
            "x.y.z = (1, 2)",
            "a == b != c <= d",
            "p or q and !r",
            "\"text\" + 10.25",
        ] {
            assert_round_trip(source);
        }
    }
}
