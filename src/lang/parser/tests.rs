use super::*;
use crate::lang::literal::Number;
use crate::lang::tokens::Operator;
use crate::lang::tree::CmpOp;

fn cmp(field: &str, op: CmpOp, value: Literal) -> PredicateNode {
    PredicateNode::comparison(field, op, value)
}

fn eq(field: &str, value: &str) -> PredicateNode {
    cmp(field, CmpOp::Eq, Literal::String(value.to_string()))
}

fn int(num: i64) -> Literal {
    Literal::Number(Number::Int(num))
}

fn and(left: PredicateNode, right: PredicateNode) -> PredicateNode {
    PredicateNode::logical(LogicOp::And, left, right)
}

fn or(left: PredicateNode, right: PredicateNode) -> PredicateNode {
    PredicateNode::logical(LogicOp::Or, left, right)
}

fn whitelist(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn syntax_error(query: &str) -> SyntaxError {
    match parse(query, None) {
        Err(ParseError::Syntax(err)) => err,
        other => panic!("expected syntax error for `{}`, got {:?}", query, other),
    }
}

mod comparisons {
    use super::*;

    #[test]
    fn single() {
        let tree = parse("priority>=5", None).unwrap();
        assert_eq!(tree, cmp("priority", CmpOp::Gte, int(5)));
    }

    #[test]
    fn every_operator() {
        let cases = [
            ("a:1", CmpOp::Eq),
            ("a:=1", CmpOp::Eq),
            ("a~=1", CmpOp::IContains),
            ("a!=1", CmpOp::Neq),
            ("a>1", CmpOp::Gt),
            ("a<1", CmpOp::Lt),
            ("a>=1", CmpOp::Gte),
            ("a<=1", CmpOp::Lte),
        ];

        for (query, op) in cases.iter() {
            assert_eq!(parse(query, None).unwrap(), cmp("a", *op, int(1)), "{}", query);
        }
    }

    #[test]
    fn eq_alias_is_indistinguishable() {
        assert_eq!(
            parse("status:=active", None).unwrap(),
            parse("status:active", None).unwrap(),
        );
    }

    #[test]
    fn literal_types() {
        let cases = [
            ("is_active:true", Literal::Boolean(true)),
            ("is_active:false", Literal::Boolean(false)),
            ("deleted_at:null", Literal::Null),
            ("priority:5", int(5)),
            ("temperature:-5", int(-5)),
            ("priority:0", int(0)),
            ("price:99.99", Literal::Number(Number::Float(99.99))),
            ("name:\"John Doe\"", Literal::String("John Doe".to_string())),
            ("name:\"\"", Literal::String("".to_string())),
            ("status:active", Literal::String("active".to_string())),
        ];

        for (query, value) in cases.iter() {
            match parse(query, None).unwrap() {
                PredicateNode::Comparison(c) => assert_eq!(c.value(), value, "{}", query),
                other => panic!("unexpected tree {:?}", other),
            }
        }
    }

    #[test]
    fn quoted_values_are_not_coerced() {
        let tree = parse("code:\"5\" OR flag:\"true\"", None).unwrap();
        assert_eq!(tree, or(eq("code", "5"), eq("flag", "true")));
    }

    #[test]
    fn contains_with_quotes() {
        let tree = parse("name~=\"John\"", None).unwrap();
        assert_eq!(tree, cmp("name", CmpOp::IContains, Literal::String("John".to_string())));
    }

    #[test]
    fn field_names() {
        assert_eq!(parse("user_name:john", None).unwrap(), eq("user_name", "john"));
        assert_eq!(parse("field123:value", None).unwrap(), eq("field123", "value"));
    }

    #[test]
    fn field_names_are_case_sensitive() {
        assert_ne!(parse("Status:a", None).unwrap(), parse("status:a", None).unwrap());
    }
}

mod logic {
    use super::*;

    #[test]
    fn and_binds_tighter() {
        let tree = parse("status:active OR status:pending AND priority>=5", None).unwrap();
        assert_eq!(tree, or(
            eq("status", "active"),
            and(eq("status", "pending"), cmp("priority", CmpOp::Gte, int(5))),
        ));

        let tree = parse("status:active AND priority:5 OR priority:10", None).unwrap();
        assert_eq!(tree, or(
            and(eq("status", "active"), cmp("priority", CmpOp::Eq, int(5))),
            cmp("priority", CmpOp::Eq, int(10)),
        ));
    }

    #[test]
    fn grouping_overrides_precedence() {
        let tree = parse("(status:active OR status:pending) AND priority>=5", None).unwrap();
        assert_eq!(tree, and(
            or(eq("status", "active"), eq("status", "pending")),
            cmp("priority", CmpOp::Gte, int(5)),
        ));
    }

    #[test]
    fn left_associative_chains() {
        let tree = parse("a:1 AND b:2 AND c:3", None).unwrap();
        assert_eq!(tree, and(
            and(cmp("a", CmpOp::Eq, int(1)), cmp("b", CmpOp::Eq, int(2))),
            cmp("c", CmpOp::Eq, int(3)),
        ));

        let tree = parse("a:1 OR b:2 OR c:3", None).unwrap();
        assert_eq!(tree, or(
            or(cmp("a", CmpOp::Eq, int(1)), cmp("b", CmpOp::Eq, int(2))),
            cmp("c", CmpOp::Eq, int(3)),
        ));
    }

    #[test]
    fn nested_groups() {
        let tree = parse("((status:active OR status:pending) AND priority>5) OR name~=\"test\"", None).unwrap();
        assert_eq!(tree, or(
            and(
                or(eq("status", "active"), eq("status", "pending")),
                cmp("priority", CmpOp::Gt, int(5)),
            ),
            cmp("name", CmpOp::IContains, Literal::String("test".to_string())),
        ));
    }

    #[test]
    fn redundant_parens() {
        assert_eq!(parse("((a:x))", None).unwrap(), eq("a", "x"));
    }

    #[test]
    fn keywords_case_insensitive() {
        assert_eq!(
            parse("status:active and priority>1", None).unwrap(),
            parse("status:active AND priority>1", None).unwrap(),
        );
        assert_eq!(
            parse("a:1 or b:2", None).unwrap(),
            parse("a:1 OR b:2", None).unwrap(),
        );
    }

    #[test]
    fn complex_query() {
        let tree = parse("is_active:true AND price<100.00 AND priority!=1", None).unwrap();
        assert_eq!(tree, and(
            and(
                cmp("is_active", CmpOp::Eq, Literal::Boolean(true)),
                cmp("price", CmpOp::Lt, Literal::Number(Number::Float(100.0))),
            ),
            cmp("priority", CmpOp::Neq, int(1)),
        ));
    }

    #[test]
    fn idempotent() {
        let query = "(status:active OR status:pending) AND priority>=5 AND name~=\"John Doe\"";
        assert_eq!(parse(query, None).unwrap(), parse(query, None).unwrap());
    }
}

mod errors {
    use super::*;

    #[test]
    fn empty_input() {
        for query in ["", "   ", "\n\t"].iter() {
            let err = syntax_error(query);
            assert_eq!(err.expected, vec![Expected::Expression]);
            assert_eq!(*err.found.get_kind(), TKind::End);
            assert_eq!(err.position, query.len());
        }
    }

    #[test]
    fn dangling_and() {
        let err = syntax_error("status:active AND");
        assert_eq!(err.expected, vec![Expected::Expression]);
        assert_eq!(*err.found.get_kind(), TKind::End);
        assert_eq!(err.position, 17);
    }

    #[test]
    fn leading_or() {
        let err = syntax_error("OR a:1");
        assert_eq!(err.expected, vec![Expected::Expression]);
        assert_eq!(*err.found.get_kind(), TKind::Keyword(LogicOp::Or));
    }

    #[test]
    fn unmatched_open_paren() {
        let err = syntax_error("(status:active");
        assert_eq!(err.expected, vec![Expected::Keyword, Expected::RParen]);
        assert_eq!(*err.found.get_kind(), TKind::End);
    }

    #[test]
    fn trailing_close_paren() {
        let err = syntax_error("status:active)");
        assert_eq!(err.expected, vec![Expected::Keyword, Expected::End]);
        assert_eq!(*err.found.get_kind(), TKind::RParen);
        assert_eq!(err.position, 13);
    }

    #[test]
    fn missing_keyword() {
        let err = syntax_error("a:1 b:2");
        assert_eq!(err.expected, vec![Expected::Keyword, Expected::End]);
        assert_eq!(err.found.get_text(), "b");
    }

    #[test]
    fn missing_operator() {
        let err = syntax_error("status active");
        assert_eq!(err.expected, vec![Expected::Operator]);
        assert_eq!(err.position, 7);
    }

    #[test]
    fn missing_value() {
        let err = syntax_error("(priority>=)");
        assert_eq!(err.expected, vec![Expected::Literal]);
        assert_eq!(*err.found.get_kind(), TKind::RParen);

        let err = syntax_error("priority>=");
        assert_eq!(err.expected, vec![Expected::Literal]);
        assert_eq!(*err.found.get_kind(), TKind::End);
    }

    #[test]
    fn literal_in_field_position() {
        let err = syntax_error("true:1");
        assert_eq!(err.expected, vec![Expected::Expression]);

        let err = syntax_error("\"name\":1");
        assert_eq!(*err.found.get_kind(), TKind::Literal { quoted: true });
    }

    #[test]
    fn empty_group() {
        let err = syntax_error("()");
        assert_eq!(err.expected, vec![Expected::Expression]);
        assert_eq!(*err.found.get_kind(), TKind::RParen);
    }

    #[test]
    fn lex_errors_surface() {
        let err = parse("status&active", None).unwrap_err();
        assert!(matches!(err, ParseError::Lex(LexError { position: 6, .. })));

        let err = parse("name:\"open", None).unwrap_err();
        assert!(matches!(err, ParseError::Lex(LexError { position: 5, .. })));
    }

    #[test]
    fn expected_names() {
        let names: Vec<String> = [
            Expected::Expression,
            Expected::Operator,
            Expected::Literal,
            Expected::Keyword,
            Expected::RParen,
            Expected::End,
        ]
        .iter()
        .map(|e| e.to_string())
        .collect();

        assert_eq!(names, vec!["expression", "comparison operator", "value", "AND/OR", "`)`", "end of input"]);
        assert_eq!(syntax_error("a:1 AND \"b\"").expected, vec![Expected::Expression]);
        assert_eq!(syntax_error("a b:1").expected, vec![Expected::Operator]);
    }

    #[test]
    fn messages() {
        let err = parse("status:active AND", None).unwrap_err();
        assert_eq!(err.to_string(), "expected expression but found end of input at position 17");

        let err = parse("(a:1", None).unwrap_err();
        assert_eq!(err.to_string(), "expected AND/OR or `)` but found end of input at position 4");

        let err = parse("a:1 b:2", None).unwrap_err();
        assert_eq!(err.to_string(), "expected AND/OR or end of input but found field `b` at position 4");

        let err = QueryParser::new().with_max_height(1).parse("a:1 OR b:2").unwrap_err();
        assert_eq!(err.to_string(), "predicate tree higher than 1 levels at position 4");
    }

    #[test]
    fn error_positions() {
        assert_eq!(parse("a:1 AND", None).unwrap_err().position(), Some(7));
        assert_eq!(parse("a&1", None).unwrap_err().position(), Some(1));

        let allowed = whitelist(&["b"]);
        assert_eq!(parse("a:1", Some(&allowed)).unwrap_err().position(), None);
    }
}

mod allowed_fields {
    use super::*;

    #[test]
    fn allowed_field() {
        let allowed = whitelist(&["status", "priority"]);
        assert_eq!(parse("status:active", Some(&allowed)).unwrap(), eq("status", "active"));
    }

    #[test]
    fn disallowed_field() {
        let allowed = whitelist(&["status"]);
        assert_eq!(
            parse("secret:1", Some(&allowed)),
            Err(ParseError::FieldNotAllowed { field: "secret".to_string() }),
        );
    }

    #[test]
    fn one_disallowed_among_many() {
        let allowed = whitelist(&["status", "priority"]);
        assert_eq!(
            parse("status:active AND (priority>1 OR secret_field:value)", Some(&allowed)),
            Err(ParseError::FieldNotAllowed { field: "secret_field".to_string() }),
        );
    }

    #[test]
    fn first_violation_reported() {
        let allowed = whitelist(&["status"]);
        assert_eq!(
            parse("alpha:1 OR beta:2", Some(&allowed)),
            Err(ParseError::FieldNotAllowed { field: "alpha".to_string() }),
        );
    }

    #[test]
    fn unrestricted() {
        assert_eq!(parse("any_field:value", None).unwrap(), eq("any_field", "value"));
    }

    #[test]
    fn empty_whitelist_rejects() {
        let allowed = whitelist(&[]);
        assert!(matches!(
            parse("status:active", Some(&allowed)),
            Err(ParseError::FieldNotAllowed { .. }),
        ));
    }

    #[test]
    fn syntax_checked_before_whitelist() {
        let allowed = whitelist(&["status"]);
        assert!(matches!(parse("secret:", Some(&allowed)), Err(ParseError::Syntax(_))));
    }
}

mod query_parser {
    use super::*;

    #[test]
    fn defaults() {
        let parser = QueryParser::new();
        assert_eq!(parser.allowed_fields(), None);
        assert_eq!(parser.max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(parser.max_height(), DEFAULT_MAX_HEIGHT);
        assert_eq!(parser.parse("a:1").unwrap(), cmp("a", CmpOp::Eq, int(1)));
    }

    #[test]
    fn configured_whitelist() {
        let parser = QueryParser::new().with_allowed_fields(vec!["status", "priority"]);
        assert!(parser.parse("status:active AND priority>=5").is_ok());
        assert_eq!(
            parser.parse("secret:1"),
            Err(ParseError::FieldNotAllowed { field: "secret".to_string() }),
        );
    }

    #[test]
    fn empty_whitelist_is_not_unrestricted() {
        let parser = QueryParser::new().with_allowed_fields(Vec::<String>::new());
        assert_eq!(parser.allowed_fields().map(|a| a.len()), Some(0));
        assert!(parser.parse("status:active").is_err());
    }

    #[test]
    fn depth_limit() {
        let parser = QueryParser::new().with_max_depth(2);
        assert!(parser.parse("((a:1))").is_ok());
        assert_eq!(
            parser.parse("(((a:1)))"),
            Err(ParseError::MaxDepthExceeded { position: 2, limit: 2 }),
        );
    }

    #[test]
    fn depth_counts_nesting_not_groups() {
        let parser = QueryParser::new().with_max_depth(1);
        assert!(parser.parse("(a:1) AND (b:2) OR (c:3)").is_ok());
    }

    #[test]
    fn zero_depth_forbids_groups() {
        let parser = QueryParser::new().with_max_depth(0);
        assert!(parser.parse("a:1 AND b:2").is_ok());
        assert!(matches!(
            parser.parse("(a:1)"),
            Err(ParseError::MaxDepthExceeded { position: 0, limit: 0 }),
        ));
    }

    #[test]
    fn pathological_nesting() {
        let query = format!("{}a:1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(
            parse(&query, None),
            Err(ParseError::MaxDepthExceeded { limit: DEFAULT_MAX_DEPTH, .. }),
        ));
    }

    #[test]
    fn height_limit() {
        let parser = QueryParser::new().with_max_height(3);
        assert_eq!(parser.parse("a:1 AND b:2 AND c:3").unwrap().depth(), 3);
        assert_eq!(
            parser.parse("a:1 AND b:2 AND c:3 AND d:4"),
            Err(ParseError::MaxHeightExceeded { position: 20, limit: 3 }),
        );
    }

    #[test]
    fn height_counts_through_groups() {
        let parser = QueryParser::new().with_max_height(2);
        assert!(parser.parse("a:1 AND b:2").is_ok());
        assert_eq!(
            parser.parse("(a:1 AND b:2) OR c:3"),
            Err(ParseError::MaxHeightExceeded { position: 14, limit: 2 }),
        );
    }

    #[test]
    fn single_comparison_ignores_height() {
        let parser = QueryParser::new().with_max_height(0);
        assert!(parser.parse("((a:1))").is_ok());
        assert!(matches!(
            parser.parse("a:1 OR b:2"),
            Err(ParseError::MaxHeightExceeded { position: 4, limit: 0 }),
        ));
    }

    #[test]
    fn longest_accepted_chain() {
        let query = vec!["a:1"; DEFAULT_MAX_HEIGHT].join(" AND ");
        let tree = parse(&query, None).unwrap();
        assert_eq!(tree.depth(), DEFAULT_MAX_HEIGHT);
        assert_eq!(tree.to_string(), query);
        drop(tree);
    }

    #[test]
    fn pathological_chain() {
        for keyword in ["AND", "OR"] {
            let separator = format!(" {} ", keyword);
            let query = vec!["a:1"; 100_000].join(&separator);

            // Keyword number `DEFAULT_MAX_HEIGHT` would add one level too many.
            let position = (DEFAULT_MAX_HEIGHT - 1) * ("a:1".len() + separator.len()) + "a:1".len() + 1;
            assert_eq!(
                parse(&query, None),
                Err(ParseError::MaxHeightExceeded { position, limit: DEFAULT_MAX_HEIGHT }),
            );
        }
    }

    #[test]
    fn shared_between_threads() {
        let parser = QueryParser::new().with_allowed_fields(vec!["status", "priority"]);
        let queries = [
            "status:active",
            "status:active OR status:pending AND priority>=5",
            "(status:active OR status:pending) AND priority>=5",
            "priority<10",
        ];

        let expected: Vec<PredicateNode> = queries.iter().map(|q| parser.parse(q).unwrap()).collect();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for (query, tree) in queries.iter().zip(expected.iter()) {
                        assert_eq!(parser.parse(query).as_ref(), Ok(tree));
                    }
                });
            }
        });
    }

    #[test]
    fn operator_lexemes_round_trip() {
        for (lexeme, op) in Operator::LEXEMES.iter() {
            assert_eq!(op.lexeme(), *lexeme);
        }
    }
}
