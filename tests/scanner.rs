#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::error::{LoxError, Reporter};
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn dump(source: &str) -> Vec<String> {
        Scanner::new(source)
            .filter_map(Result::ok)
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators() {
        assert_token_sequence(
            "! != = == < <= > >= ^ ? : / -",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::CARET, "^"),
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::SLASH, "/"),
                (TokenType::MINUS, "-"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class fun var_ orchid or this",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "var_"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::THIS, "this"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_literal_dump() {
        assert_eq!(
            dump("\"hi there\" 42 3.25 nil"),
            vec![
                "STRING \"hi there\" hi there",
                "NUMBER 42 42.0",
                "NUMBER 3.25 3.25",
                "NIL nil null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_scanner_05_comments_and_lines() {
        let tokens: Vec<Token> = Scanner::new("// nothing here\nprint // trailing\n\n1;")
            .filter_map(Result::ok)
            .collect();

        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();

        assert_eq!(lines, vec![2, 4, 4, 4]);
        assert_eq!(tokens[0].token_type, TokenType::PRINT);
    }

    #[test]
    fn test_scanner_06_trailing_dot_is_not_fraction() {
        assert_token_sequence(
            "12.",
            &[
                (TokenType::NUMBER(0.0), "12"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source).collect();

        // COMMA, DOT, error, LEFT_PAREN, error, EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(token.token_type, expected_type);
                    assert_eq!(token.lexeme, expected_lexeme);
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_unexpected_multibyte_character() {
        let results: Vec<_> = Scanner::new("é;").collect();

        assert!(results[0].is_err());
        assert_token_sequence("é;", &[(TokenType::SEMICOLON, ";"), (TokenType::EOF, "")]);
    }

    #[test]
    fn test_unterminated_string_reports_and_ends() {
        let mut reporter = Reporter::new();
        let tokens = scan_tokens("print \"abc\n", &mut reporter);

        assert!(reporter.had_error());
        assert_eq!(
            reporter.diagnostics(),
            &["[line 2] Error: Unterminated string.".to_string()]
        );
        assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
    }

    #[test]
    fn test_scan_tokens_keeps_going_after_errors() {
        let mut reporter = Reporter::new();
        let tokens = scan_tokens("@ 1 @ 2", &mut reporter);

        assert_eq!(reporter.diagnostics().len(), 2);
        assert_eq!(tokens.len(), 3);
        assert!(!reporter.had_runtime_error());
    }
}
