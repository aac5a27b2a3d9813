//! Token stream → AST.
//!
//! Parenthesised prefix forms: `(let name value)`, `(def name (params)
//! body...)`, `(op lhs rhs)` for the binary operators (a lone operand
//! after `-` reads as unary minus), and `(callee args...)` for
//! applications. Atoms stand alone.

use easel_core::{EaselError, Expr, ModuleAst, Span};

use crate::lexer::{tokenize, SpannedToken, Token};

pub fn read_module(name: &str, source: &str) -> Result<ModuleAst, EaselError> {
    let tokens = tokenize(source)?;
    let mut reader = Reader { tokens, pos: 0 };
    let mut module = ModuleAst::new(name);
    while !reader.at_end() {
        module.exprs.push(reader.form()?);
    }
    Ok(module)
}

struct Reader {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Reader {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn last_span(&self) -> Span {
        self.tokens
            .last()
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn next(&mut self) -> Result<SpannedToken, EaselError> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| EaselError::parse("unexpected end of input", self.last_span()))?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect_rparen(&mut self, opened: Span) -> Result<(), EaselError> {
        match self.next() {
            Ok(SpannedToken {
                token: Token::RParen,
                ..
            }) => Ok(()),
            Ok(t) => Err(EaselError::parse(
                format!("expected ')' for form opened at {opened}"),
                t.span,
            )),
            Err(_) => Err(EaselError::parse("missing ')'", opened)),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, EaselError> {
        let tok = self.next()?;
        match tok.token {
            Token::Ident(name) => Ok(name),
            other => Err(EaselError::parse(
                format!("expected {what}, got {other:?}"),
                tok.span,
            )),
        }
    }

    fn form(&mut self) -> Result<Expr, EaselError> {
        let tok = self.next()?;
        match tok.token {
            Token::Int(v) => Ok(Expr::Int(v)),
            Token::Float(v) => Ok(Expr::Float(v)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Ident(name) => Ok(Expr::Ident(name)),
            Token::LParen => self.compound(tok.span),
            other => Err(EaselError::parse(
                format!("unexpected token {other:?}"),
                tok.span,
            )),
        }
    }

    fn compound(&mut self, opened: Span) -> Result<Expr, EaselError> {
        let head = self.next()?;
        match head.token {
            Token::Let => {
                let name = self.ident("a variable name after 'let'")?;
                let value = self.form()?;
                self.expect_rparen(opened)?;
                Ok(Expr::Let {
                    name,
                    value: Box::new(value),
                })
            }

            Token::Def => {
                let name = self.ident("a function name after 'def'")?;
                let params_open = self.next()?;
                if params_open.token != Token::LParen {
                    return Err(EaselError::parse(
                        "expected a parameter list after the function name",
                        params_open.span,
                    ));
                }
                let mut params = Vec::new();
                let mut variadic = false;
                loop {
                    let tok = self.next()?;
                    match tok.token {
                        Token::RParen => break,
                        Token::Ident(p) => {
                            if variadic {
                                return Err(EaselError::parse(
                                    "no parameters may follow '...'",
                                    tok.span,
                                ));
                            }
                            params.push(p);
                        }
                        Token::Ellipsis => {
                            if variadic {
                                return Err(EaselError::parse("duplicate '...'", tok.span));
                            }
                            variadic = true;
                        }
                        other => {
                            return Err(EaselError::parse(
                                format!("unexpected token {other:?} in parameter list"),
                                tok.span,
                            ));
                        }
                    }
                }
                let mut body = Vec::new();
                while self.peek() != Some(&Token::RParen) {
                    if self.at_end() {
                        return Err(EaselError::parse("missing ')'", opened));
                    }
                    body.push(self.form()?);
                }
                self.expect_rparen(opened)?;
                Ok(Expr::Def {
                    name,
                    params,
                    variadic,
                    body,
                })
            }

            Token::Operator(op) => {
                let lhs = self.form()?;
                // A single operand after '-' is unary negation.
                if op == easel_core::BinaryOp::Sub && self.peek() == Some(&Token::RParen) {
                    self.expect_rparen(opened)?;
                    return Ok(Expr::Neg(Box::new(lhs)));
                }
                let rhs = self.form()?;
                self.expect_rparen(opened)?;
                Ok(Expr::binary(op, lhs, rhs))
            }

            Token::Ident(callee) => {
                let mut args = Vec::new();
                while self.peek() != Some(&Token::RParen) {
                    if self.at_end() {
                        return Err(EaselError::parse("missing ')'", opened));
                    }
                    args.push(self.form()?);
                }
                self.expect_rparen(opened)?;
                Ok(Expr::Call { callee, args })
            }

            other => Err(EaselError::parse(
                format!("a form cannot start with {other:?}"),
                head.span,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::BinaryOp;

    fn read(src: &str) -> ModuleAst {
        read_module("test", src).unwrap()
    }

    #[test]
    fn atoms_and_binary_forms() {
        let m = read("42 (+ 1 2) \"hi\"");
        assert_eq!(m.exprs.len(), 3);
        assert_eq!(m.exprs[0], Expr::Int(42));
        assert_eq!(
            m.exprs[1],
            Expr::binary(BinaryOp::Add, Expr::Int(1), Expr::Int(2))
        );
        assert_eq!(m.exprs[2], Expr::Str("hi".into()));
    }

    #[test]
    fn let_and_reference() {
        let m = read("(let x (* 3 4)) x");
        assert_eq!(
            m.exprs[0],
            Expr::Let {
                name: "x".into(),
                value: Box::new(Expr::binary(BinaryOp::Mul, Expr::Int(3), Expr::Int(4))),
            }
        );
        assert_eq!(m.exprs[1], Expr::Ident("x".into()));
    }

    #[test]
    fn def_with_body() {
        let m = read("(def square (x) (* x x))");
        assert_eq!(
            m.exprs[0],
            Expr::Def {
                name: "square".into(),
                params: vec!["x".into()],
                variadic: false,
                body: vec![Expr::binary(
                    BinaryOp::Mul,
                    Expr::Ident("x".into()),
                    Expr::Ident("x".into())
                )],
            }
        );
    }

    #[test]
    fn variadic_def() {
        let m = read("(def f (xs ...) xs)");
        match &m.exprs[0] {
            Expr::Def {
                params, variadic, ..
            } => {
                assert_eq!(params, &vec!["xs".to_string()]);
                assert!(variadic);
            }
            other => panic!("expected def, got {other:?}"),
        }
    }

    #[test]
    fn unary_and_binary_minus() {
        let m = read("(- 5) (- 7 2)");
        assert_eq!(m.exprs[0], Expr::Neg(Box::new(Expr::Int(5))));
        assert_eq!(
            m.exprs[1],
            Expr::binary(BinaryOp::Sub, Expr::Int(7), Expr::Int(2))
        );
    }

    #[test]
    fn nested_calls() {
        let m = read("(draw (circle 0 0 5) \"red\")");
        assert_eq!(
            m.exprs[0],
            Expr::Call {
                callee: "draw".into(),
                args: vec![
                    Expr::Call {
                        callee: "circle".into(),
                        args: vec![Expr::Int(0), Expr::Int(0), Expr::Int(5)],
                    },
                    Expr::Str("red".into()),
                ],
            }
        );
    }

    #[test]
    fn parse_errors() {
        assert!(read_module("t", "(let 5 5)").is_err());
        assert!(read_module("t", "(+ 1 2").is_err());
        assert!(read_module("t", ")").is_err());
        assert!(read_module("t", "(def f (a ... b) a)").is_err());
        assert!(read_module("t", "(5 6)").is_err());
    }
}
