use chumsky::{prelude::*, text};

use crate::token::Token;

/// Identifiers are a letter followed by at most 31 letters or digits.
pub const MAX_IDENT_LEN: usize = 32;

pub fn lexer<'a>()
-> impl Parser<'a, &'a str, Vec<(Token, SimpleSpan)>, extra::Err<Rich<'a, char>>> {
    // Integer and real literals share a digit-led prefix; the fractional
    // part must not consume the `..` of a range.
    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .try_map(|s: &str, span| {
            if s.contains('.') {
                s.parse::<f64>()
                    .map(Token::Real)
                    .map_err(|_| Rich::custom(span, format!("real literal `{}` is out of range", s)))
            } else {
                s.parse::<i64>()
                    .map(Token::Int)
                    .map_err(|_| {
                        Rich::custom(span, format!("integer literal `{}` is out of range", s))
                    })
            }
        });

    // No escape sequences: everything up to the closing quote is content,
    // newlines included.
    let string = just('"')
        .ignore_then(none_of('"').repeated().collect::<String>())
        .then_ignore(just('"'))
        .map(Token::Str);

    let word = any()
        .filter(|c: &char| c.is_ascii_alphabetic())
        .then(any().filter(|c: &char| c.is_ascii_alphanumeric()).repeated())
        .to_slice()
        .try_map(|s: &str, span| {
            Ok(match s {
                "var" => Token::Var,
                "if" => Token::If,
                "then" => Token::Then,
                "else" => Token::Else,
                "while" => Token::While,
                "for" => Token::For,
                "loop" => Token::Loop,
                "in" => Token::In,
                "func" => Token::Func,
                "is" => Token::Is,
                "end" => Token::End,
                "true" => Token::True,
                "false" => Token::False,
                "not" => Token::Not,
                "and" => Token::And,
                "or" => Token::Or,
                "xor" => Token::Xor,
                _ => {
                    if s.len() > MAX_IDENT_LEN {
                        return Err(Rich::custom(
                            span,
                            format!("identifier `{}` is longer than {} characters", s, MAX_IDENT_LEN),
                        ));
                    }
                    Token::Ident(s.to_string())
                }
            })
        });

    // Longest match first: `..` before `.`, `:=` before `=` never collides
    // but `/=` must beat `/`, and `<=`/`>=` must beat `<`/`>`.
    let multi_char_operators = choice((
        just("..").to(Token::DotDot),
        just("=>").to(Token::Arrow),
        just(":=").to(Token::Assign),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
        just("/=").to(Token::Ne),
    ));

    let single_char_operators = choice((
        just('.').to(Token::Dot),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('=').to(Token::Eq),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just(',').to(Token::Comma),
        just(';').to(Token::Semicolon),
    ));

    let operators = multi_char_operators.or(single_char_operators);

    let line_comment = just("//")
        .ignore_then(any().and_is(just('\n').not()).repeated())
        .ignored();

    let padding = choice((
        line_comment,
        any().filter(|c: &char| c.is_whitespace()).ignored(),
    ))
    .repeated();

    let token = choice((number, string, word, operators))
        .map_with(|tok, e| (tok, e.span()))
        .padded_by(padding.clone());

    padding
        .ignore_then(token.repeated().collect())
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chumsky::Parser;

    fn lex(source: &str) -> Vec<Token> {
        lexer()
            .parse(source)
            .into_result()
            .expect("lexer failed")
            .into_iter()
            .map(|(tok, _)| tok)
            .collect()
    }

    fn lex_err(source: &str) -> bool {
        lexer().parse(source).into_result().is_err()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(lex("var"), vec![Token::Var]);
        assert_eq!(lex("func"), vec![Token::Func]);
        assert_eq!(lex("true"), vec![Token::True]);
        assert_eq!(lex("false"), vec![Token::False]);
        assert_eq!(
            lex("if then else end"),
            vec![Token::If, Token::Then, Token::Else, Token::End]
        );
        assert_eq!(
            lex("while for loop in"),
            vec![Token::While, Token::For, Token::Loop, Token::In]
        );
        assert_eq!(
            lex("not and or xor is"),
            vec![Token::Not, Token::And, Token::Or, Token::Xor, Token::Is]
        );
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(lex("foo"), vec![Token::Ident("foo".to_string())]);
        assert_eq!(lex("bar123"), vec![Token::Ident("bar123".to_string())]);
        assert_eq!(lex("camelCase"), vec![Token::Ident("camelCase".to_string())]);
        // Keywords are case-sensitive, so this is a plain identifier.
        assert_eq!(lex("Var"), vec![Token::Ident("Var".to_string())]);
    }

    #[test]
    fn test_identifier_cannot_start_with_digit() {
        // `1abc` splits into an integer and an identifier.
        assert_eq!(
            lex("1abc"),
            vec![Token::Int(1), Token::Ident("abc".to_string())]
        );
    }

    #[test]
    fn test_identifier_rejects_underscore() {
        assert!(lex_err("_foo"));
    }

    #[test]
    fn test_identifier_length_limit() {
        let ok = "a".repeat(MAX_IDENT_LEN);
        assert_eq!(lex(&ok), vec![Token::Ident(ok.clone())]);
        let too_long = "a".repeat(MAX_IDENT_LEN + 1);
        assert!(lex_err(&too_long));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(lex("42"), vec![Token::Int(42)]);
        assert_eq!(lex("0"), vec![Token::Int(0)]);
        assert_eq!(lex("007"), vec![Token::Int(7)]);
        assert_eq!(lex("3.14"), vec![Token::Real(3.14)]);
        assert_eq!(lex("0.5"), vec![Token::Real(0.5)]);
        assert_eq!(lex("123.456"), vec![Token::Real(123.456)]);
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(lex_err("99999999999999999999"));
    }

    #[test]
    fn test_range_is_not_a_real() {
        assert_eq!(
            lex("1..5"),
            vec![Token::Int(1), Token::DotDot, Token::Int(5)]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(lex(r#""hello""#), vec![Token::Str("hello".to_string())]);
        assert_eq!(lex(r#""""#), vec![Token::Str("".to_string())]);
        // No escape sequences: the backslash is ordinary content.
        assert_eq!(lex(r#""a\nb""#), vec![Token::Str("a\\nb".to_string())]);
    }

    #[test]
    fn test_string_spans_lines() {
        assert_eq!(lex("\"a\nb\""), vec![Token::Str("a\nb".to_string())]);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(lex_err("\"abc"));
    }

    #[test]
    fn test_operators() {
        assert_eq!(lex("+"), vec![Token::Plus]);
        assert_eq!(lex("-"), vec![Token::Minus]);
        assert_eq!(lex("*"), vec![Token::Star]);
        assert_eq!(lex("/"), vec![Token::Slash]);
        assert_eq!(lex("<"), vec![Token::Lt]);
        assert_eq!(lex(">"), vec![Token::Gt]);
        assert_eq!(lex("<="), vec![Token::Le]);
        assert_eq!(lex(">="), vec![Token::Ge]);
        assert_eq!(lex("="), vec![Token::Eq]);
        assert_eq!(lex("/="), vec![Token::Ne]);
    }

    #[test]
    fn test_maximal_munch() {
        assert_eq!(lex(":="), vec![Token::Assign]);
        assert_eq!(lex("= ="), vec![Token::Eq, Token::Eq]);
        assert_eq!(lex(".."), vec![Token::DotDot]);
        assert_eq!(lex("."), vec![Token::Dot]);
        assert_eq!(lex("..."), vec![Token::DotDot, Token::Dot]);
        assert_eq!(lex("=>"), vec![Token::Arrow]);
        assert_eq!(lex("/ ="), vec![Token::Slash, Token::Eq]);
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            lex("()[]{},;"),
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBracket,
                Token::RBracket,
                Token::LBrace,
                Token::RBrace,
                Token::Comma,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(
            lex("var x // trailing comment\n:= 1;"),
            vec![
                Token::Var,
                Token::Ident("x".to_string()),
                Token::Assign,
                Token::Int(1),
                Token::Semicolon,
            ]
        );
        assert_eq!(lex("// only a comment"), vec![]);
    }

    #[test]
    fn test_comment_does_not_eat_division() {
        assert_eq!(
            lex("a / b"),
            vec![
                Token::Ident("a".to_string()),
                Token::Slash,
                Token::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_whitespace_handling() {
        assert_eq!(
            lex("  var\n\tx  "),
            vec![Token::Var, Token::Ident("x".to_string())]
        );
    }

    #[test]
    fn test_declaration_statement() {
        assert_eq!(
            lex("var x := 5;"),
            vec![
                Token::Var,
                Token::Ident("x".to_string()),
                Token::Assign,
                Token::Int(5),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_member_access_vs_range() {
        assert_eq!(
            lex("t.1"),
            vec![Token::Ident("t".to_string()), Token::Dot, Token::Int(1)]
        );
        assert_eq!(
            lex("for i in 1..5"),
            vec![
                Token::For,
                Token::Ident("i".to_string()),
                Token::In,
                Token::Int(1),
                Token::DotDot,
                Token::Int(5),
            ]
        );
    }

    #[test]
    fn test_function_literal_tokens() {
        assert_eq!(
            lex("func(n) is n; end"),
            vec![
                Token::Func,
                Token::LParen,
                Token::Ident("n".to_string()),
                Token::RParen,
                Token::Is,
                Token::Ident("n".to_string()),
                Token::Semicolon,
                Token::End,
            ]
        );
        assert_eq!(
            lex("func() => x"),
            vec![
                Token::Func,
                Token::LParen,
                Token::RParen,
                Token::Arrow,
                Token::Ident("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans_cover_source() {
        let tokens = lexer().parse("var xy := 12;").into_result().unwrap();
        let spans: Vec<(usize, usize)> = tokens
            .iter()
            .map(|(_, span)| (span.start, span.end))
            .collect();
        assert_eq!(spans, vec![(0, 3), (4, 6), (7, 9), (10, 12), (12, 13)]);
    }
}
