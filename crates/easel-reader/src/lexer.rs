use easel_core::{BinaryOp, EaselError, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Let,
    Def,
    Ellipsis,
    Operator(BinaryOp),
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, EaselError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    let mut line = 1;
    let mut col = 1;

    while i < chars.len() {
        let ch = chars[i];
        let span = Span::point(line, col);

        match ch {
            ' ' | '\t' | '\r' => {
                col += 1;
                i += 1;
            }
            '\n' => {
                line += 1;
                col = 1;
                i += 1;
            }

            // Comments
            ';' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }

            '(' => {
                col += 1;
                i += 1;
                tokens.push(SpannedToken {
                    token: Token::LParen,
                    span,
                });
            }
            ')' => {
                col += 1;
                i += 1;
                tokens.push(SpannedToken {
                    token: Token::RParen,
                    span,
                });
            }

            // Strings
            '"' => {
                let mut s = String::new();
                i += 1;
                col += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' {
                        i += 1;
                        col += 1;
                        if i >= chars.len() {
                            return Err(EaselError::lex("unterminated string", span));
                        }
                        let esc = match chars[i] {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '0' => '\0',
                            '\\' => '\\',
                            '"' => '"',
                            other => {
                                return Err(EaselError::lex(
                                    format!("unknown string escape '\\{other}'"),
                                    Span::point(line, col),
                                ));
                            }
                        };
                        s.push(esc);
                    } else {
                        if chars[i] == '\n' {
                            line += 1;
                            col = 0;
                        }
                        s.push(chars[i]);
                    }
                    i += 1;
                    col += 1;
                }
                if i >= chars.len() {
                    return Err(EaselError::lex("unterminated string", span));
                }
                i += 1; // closing quote
                col += 1;
                tokens.push(SpannedToken {
                    token: Token::Str(s),
                    span,
                });
            }

            // Numbers (always nonnegative; minus is an operator)
            '0'..='9' => {
                let token = read_number(&chars, &mut i, &mut col, span)?;
                tokens.push(SpannedToken { token, span });
            }

            '.' if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') => {
                i += 3;
                col += 3;
                tokens.push(SpannedToken {
                    token: Token::Ellipsis,
                    span,
                });
            }

            _ if is_ident_start(ch) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                    col += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let token = match word.as_str() {
                    "let" => Token::Let,
                    "def" => Token::Def,
                    _ => Token::Ident(word),
                };
                tokens.push(SpannedToken { token, span });
            }

            // Operators, longest match first.
            _ => {
                let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
                let (sym, width) = match two.as_str() {
                    "<<" | ">>" | "<=" | ">=" | "==" | "!=" | "&&" | "||" => (two.as_str(), 2),
                    _ => {
                        let one = &two[..ch.len_utf8()];
                        match one {
                            "+" | "-" | "*" | "/" | "%" | "<" | ">" | "^" | "|" | "~" | "&" => {
                                (one, 1)
                            }
                            _ => {
                                return Err(EaselError::lex(
                                    format!("unexpected character '{ch}'"),
                                    span,
                                ));
                            }
                        }
                    }
                };
                let op = BinaryOp::from_symbol(sym)
                    .expect("operator table covers every accepted symbol");
                i += width;
                col += width;
                tokens.push(SpannedToken {
                    token: Token::Operator(op),
                    span,
                });
            }
        }
    }

    Ok(tokens)
}

/// Integer (decimal, `0x` hex, `0b` binary, leading-zero octal) or float
/// literal. Integer overflow is reported at lex time.
fn read_number(
    chars: &[char],
    i: &mut usize,
    col: &mut usize,
    span: Span,
) -> Result<Token, EaselError> {
    // Radix prefixes.
    if chars[*i] == '0' && *i + 1 < chars.len() && matches!(chars[*i + 1], 'x' | 'X' | 'b' | 'B') {
        let radix = if matches!(chars[*i + 1], 'x' | 'X') { 16 } else { 2 };
        *i += 2;
        *col += 2;
        let start = *i;
        while *i < chars.len() && chars[*i].is_ascii_hexdigit() {
            *i += 1;
            *col += 1;
        }
        let digits: String = chars[start..*i].iter().collect();
        if digits.is_empty() {
            return Err(EaselError::lex("number literal has no digits", span));
        }
        return i64::from_str_radix(&digits, radix)
            .map(Token::Int)
            .map_err(|_| EaselError::lex(format!("integer literal '{digits}' overflows"), span));
    }

    let start = *i;
    while *i < chars.len() && chars[*i].is_ascii_digit() {
        *i += 1;
        *col += 1;
    }

    // Fractional part or exponent makes it a float.
    let mut is_float = false;
    if *i + 1 < chars.len() && chars[*i] == '.' && chars[*i + 1].is_ascii_digit() {
        is_float = true;
        *i += 1;
        *col += 1;
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            *i += 1;
            *col += 1;
        }
    }
    if *i < chars.len() && matches!(chars[*i], 'e' | 'E') {
        let mut j = *i + 1;
        if j < chars.len() && matches!(chars[j], '+' | '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            is_float = true;
            *col += j - *i;
            *i = j;
            while *i < chars.len() && chars[*i].is_ascii_digit() {
                *i += 1;
                *col += 1;
            }
        }
    }

    let text: String = chars[start..*i].iter().collect();
    if is_float {
        return text
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|_| EaselError::lex(format!("malformed float literal '{text}'"), span));
    }

    // Leading zero and more digits: octal.
    if text.len() > 1 && text.starts_with('0') {
        let digits = &text[1..];
        if digits.chars().any(|c| !('0'..='7').contains(&c)) {
            return Err(EaselError::lex(
                format!("invalid octal literal '{text}'"),
                span,
            ));
        }
        return i64::from_str_radix(digits, 8)
            .map(Token::Int)
            .map_err(|_| EaselError::lex(format!("integer literal '{text}' overflows"), span));
    }

    text.parse::<i64>()
        .map(Token::Int)
        .map_err(|_| EaselError::lex(format!("integer literal '{text}' overflows"), span))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn integer_radices() {
        assert_eq!(toks("42"), vec![Token::Int(42)]);
        assert_eq!(toks("0x2a"), vec![Token::Int(42)]);
        assert_eq!(toks("0X2A"), vec![Token::Int(42)]);
        assert_eq!(toks("0b101010"), vec![Token::Int(42)]);
        assert_eq!(toks("052"), vec![Token::Int(42)]);
        assert_eq!(toks("0"), vec![Token::Int(0)]);
    }

    #[test]
    fn integer_overflow_is_a_lex_error() {
        assert!(tokenize("9223372036854775808").is_err());
        assert!(tokenize("0xffffffffffffffff").is_err());
        // Max value still fits.
        assert_eq!(toks("9223372036854775807"), vec![Token::Int(i64::MAX)]);
    }

    #[test]
    fn bad_octal_digit() {
        assert!(tokenize("089").is_err());
    }

    #[test]
    fn float_literals() {
        assert_eq!(toks("1.5"), vec![Token::Float(1.5)]);
        assert_eq!(toks("2e3"), vec![Token::Float(2000.0)]);
        assert_eq!(toks("1.25e-2"), vec![Token::Float(0.0125)]);
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(
            toks(r#""hi\n\t\"there\"""#),
            vec![Token::Str("hi\n\t\"there\"".into())]
        );
        assert!(tokenize("\"open").is_err());
        assert!(tokenize(r#""bad \q""#).is_err());
    }

    #[test]
    fn operators_longest_match() {
        use easel_core::BinaryOp as B;
        assert_eq!(
            toks("<< >> <= >= == != && || < > + - * / % ^ | ~ &"),
            vec![
                Token::Operator(B::Shl),
                Token::Operator(B::Shr),
                Token::Operator(B::Le),
                Token::Operator(B::Ge),
                Token::Operator(B::Eq),
                Token::Operator(B::Ne),
                Token::Operator(B::And),
                Token::Operator(B::Or),
                Token::Operator(B::Lt),
                Token::Operator(B::Gt),
                Token::Operator(B::Add),
                Token::Operator(B::Sub),
                Token::Operator(B::Mul),
                Token::Operator(B::Div),
                Token::Operator(B::Mod),
                Token::Operator(B::BitXor),
                Token::Operator(B::BitOr),
                Token::Operator(B::BitNot),
                Token::Operator(B::BitAnd),
            ]
        );
    }

    #[test]
    fn keywords_idents_and_comments() {
        assert_eq!(
            toks("(let answer 42) ; trailing\ndef done ..."),
            vec![
                Token::LParen,
                Token::Let,
                Token::Ident("answer".into()),
                Token::Int(42),
                Token::RParen,
                Token::Def,
                Token::Ident("done".into()),
                Token::Ellipsis,
            ]
        );
    }

    #[test]
    fn spans_track_lines() {
        let tokens = tokenize("(\n  foo)").unwrap();
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.col, 3);
    }
}
