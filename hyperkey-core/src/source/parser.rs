use crate::errors::SourceError;

use super::lexer::{Lexer, Token, TokenKind};

/// The restricted object-literal language the extractor understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Object(Vec<(String, Spanned)>),
    Array(Vec<Spanned>),
    Str(String),
    Number(String),
    Bool(bool),
    Null,
    Ident(String),
    Call { callee: String, args: Vec<Spanned> },
}

/// A parsed expression together with where it started.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub expr: Expr,
    pub line: usize,
    pub column: usize,
}

impl Spanned {
    pub fn error(&self, message: impl Into<String>) -> SourceError {
        SourceError::new(message, self.line, self.column)
    }
}

/// Recursive-descent parser pulling tokens on demand, so it stops right after the expression
/// it was asked for and never looks at the rest of the file.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            peeked: None,
        }
    }

    fn peek(&mut self) -> Result<&TokenKind, SourceError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(&self.peeked.insert(token).kind)
    }

    fn advance(&mut self) -> Result<Token, SourceError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn error_at(token: &Token, message: impl Into<String>) -> SourceError {
        SourceError::new(message, token.line, token.column)
    }

    pub fn expect(&mut self, kind: &TokenKind) -> Result<Token, SourceError> {
        let token = self.advance()?;
        if &token.kind == kind {
            Ok(token)
        } else {
            Err(Self::error_at(
                &token,
                format!("expected {}, found {}", kind.describe(), token.kind.describe()),
            ))
        }
    }

    pub fn parse_expr(&mut self) -> Result<Spanned, SourceError> {
        let token = self.advance()?;
        let (line, column) = (token.line, token.column);
        let expr = match token.kind {
            TokenKind::LBrace => self.object()?,
            TokenKind::LBracket => Expr::Array(self.list(&TokenKind::RBracket)?),
            TokenKind::Str(value) | TokenKind::Template(value) => Expr::Str(value),
            TokenKind::Number(value) => Expr::Number(value),
            TokenKind::Ident(name) => self.ident(name)?,
            other => {
                return Err(SourceError::new(
                    format!("unexpected {}", other.describe()),
                    line,
                    column,
                ));
            }
        };
        Ok(Spanned { expr, line, column })
    }

    fn ident(&mut self, name: String) -> Result<Expr, SourceError> {
        if *self.peek()? == TokenKind::LParen {
            self.advance()?;
            let args = self.list(&TokenKind::RParen)?;
            return Ok(Expr::Call { callee: name, args });
        }
        if matches!(self.peek()?, TokenKind::Template(_)) {
            // Tagged template: name`text`
            let token = self.advance()?;
            if let TokenKind::Template(text) = token.kind {
                let arg = Spanned {
                    expr: Expr::Str(text),
                    line: token.line,
                    column: token.column,
                };
                return Ok(Expr::Call {
                    callee: name,
                    args: vec![arg],
                });
            }
        }
        Ok(match name.as_str() {
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            "null" | "undefined" => Expr::Null,
            _ => Expr::Ident(name),
        })
    }

    fn list(&mut self, close: &TokenKind) -> Result<Vec<Spanned>, SourceError> {
        let mut items = Vec::new();
        loop {
            if self.peek()? == close {
                self.advance()?;
                return Ok(items);
            }
            items.push(self.parse_expr()?);
            let token = self.advance()?;
            match &token.kind {
                TokenKind::Comma => {}
                kind if kind == close => return Ok(items),
                other => {
                    return Err(Self::error_at(
                        &token,
                        format!("expected `,` or {}, found {}", close.describe(), other.describe()),
                    ));
                }
            }
        }
    }

    fn object(&mut self) -> Result<Expr, SourceError> {
        let mut entries: Vec<(String, Spanned)> = Vec::new();
        loop {
            let token = self.advance()?;
            let key = match &token.kind {
                TokenKind::RBrace => return Ok(Expr::Object(entries)),
                TokenKind::Ident(key) | TokenKind::Str(key) | TokenKind::Number(key) => key.clone(),
                other => {
                    return Err(Self::error_at(
                        &token,
                        format!("expected a property name, found {}", other.describe()),
                    ));
                }
            };
            let value = if *self.peek()? == TokenKind::Colon {
                self.advance()?;
                self.parse_expr()?
            } else {
                // Shorthand property `{ rules }`.
                Spanned {
                    expr: Expr::Ident(key.clone()),
                    line: token.line,
                    column: token.column,
                }
            };
            if entries.iter().any(|(existing, _)| existing == &key) {
                return Err(Self::error_at(&token, format!("duplicate key `{key}`")));
            }
            entries.push((key, value));

            let separator = self.advance()?;
            match &separator.kind {
                TokenKind::Comma => {}
                TokenKind::RBrace => return Ok(Expr::Object(entries)),
                other => {
                    return Err(Self::error_at(
                        &separator,
                        format!("expected `,` or `}}`, found {}", other.describe()),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Expr, SourceError> {
        Parser::new(Lexer::new(input, 1, 1)).parse_expr().map(|s| s.expr)
    }

    fn strip(spanned: &Spanned) -> String {
        format!("{:?}", spanned.expr)
    }

    #[test]
    fn parses_nested_objects_and_calls() {
        let Expr::Object(entries) =
            parse("{ o: { g: app('Google Chrome'), }, s: shell`say hi`, n: [1, true, null] }")
                .unwrap()
        else {
            panic!("expected an object");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["o", "s", "n"]);

        let Expr::Object(inner) = &entries[0].1.expr else {
            panic!("expected a nested object");
        };
        let Expr::Call { callee, args } = &inner[0].1.expr else {
            panic!("expected a call");
        };
        assert_eq!(callee, "app");
        assert_eq!(args[0].expr, Expr::Str("Google Chrome".to_owned()));

        let Expr::Call { callee, args } = &entries[1].1.expr else {
            panic!("expected a tagged template");
        };
        assert_eq!(callee, "shell");
        assert_eq!(args[0].expr, Expr::Str("say hi".to_owned()));
        assert_eq!((args[0].line, args[0].column), (1, 44));

        let Expr::Array(items) = &entries[2].1.expr else {
            panic!("expected an array");
        };
        let items: Vec<_> = items.iter().map(strip).collect();
        assert_eq!(items, ["Number(\"1\")", "Bool(true)", "Null"]);
    }

    #[test]
    fn stops_after_the_expression() {
        let mut parser = Parser::new(Lexer::new("{ a: 1 }) ; fs.writeFileSync(`x`)", 1, 1));
        assert!(matches!(parser.parse_expr().unwrap().expr, Expr::Object(_)));
        assert!(parser.expect(&TokenKind::RParen).is_ok());
    }

    #[test]
    fn rejects_unbalanced_braces() {
        let err = parse("{ o: { g: app('Arc') }").unwrap_err();
        assert!(err.message.contains("end of input"), "{err}");
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = parse("{ a: app('x'), a: app('y') }").unwrap_err();
        assert!(err.message.contains("duplicate key `a`"));
    }
}
