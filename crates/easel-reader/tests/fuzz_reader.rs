//! The reader must reject bad input with errors, never panics.

use proptest::prelude::*;

use easel_reader::{read_module, tokenize, Token};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn tokenize_never_panics(input in ".{0,200}") {
        let _ = tokenize(&input);
    }

    #[test]
    fn read_never_panics(input in r#"[ \n()a-z0-9+*/"\\.<>=&|~^%_-]{0,200}"#) {
        let _ = read_module("fuzz", &input);
    }

    #[test]
    fn nonnegative_decimal_literals_lex_exactly(n in 0i64..=i64::MAX) {
        let tokens = tokenize(&n.to_string()).unwrap();
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(&tokens[0].token, &Token::Int(n));
    }

    #[test]
    fn hex_literals_roundtrip(n in 0i64..=i64::MAX) {
        let tokens = tokenize(&format!("0x{n:x}")).unwrap();
        prop_assert_eq!(&tokens[0].token, &Token::Int(n));
    }

    #[test]
    fn string_escapes_roundtrip(s in r#"[a-z \n\t"\\]{0,40}"#) {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\t', "\\t");
        let tokens = tokenize(&format!("\"{escaped}\"")).unwrap();
        prop_assert_eq!(&tokens[0].token, &Token::Str(s));
    }

    #[test]
    fn balanced_forms_always_read(depth in 1usize..12) {
        let mut src = String::new();
        for _ in 0..depth {
            src.push_str("(f ");
        }
        src.push('1');
        for _ in 0..depth {
            src.push(')');
        }
        let module = read_module("deep", &src).unwrap();
        prop_assert_eq!(module.exprs.len(), 1);
    }
}
