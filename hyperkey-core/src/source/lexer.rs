use crate::errors::SourceError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    /// A backtick literal. Interpolation is not supported.
    Template(String),
    Number(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Colon,
    Spread,
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier `{name}`"),
            Self::Str(_) => "string".to_owned(),
            Self::Template(_) => "template literal".to_owned(),
            Self::Number(n) => format!("number `{n}`"),
            Self::LBrace => "`{`".to_owned(),
            Self::RBrace => "`}`".to_owned(),
            Self::LBracket => "`[`".to_owned(),
            Self::RBracket => "`]`".to_owned(),
            Self::LParen => "`(`".to_owned(),
            Self::RParen => "`)`".to_owned(),
            Self::Comma => "`,`".to_owned(),
            Self::Colon => "`:`".to_owned(),
            Self::Spread => "`...`".to_owned(),
            Self::Eof => "end of input".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Splits object-literal source into tokens.
///
/// `line`/`column` are 1-based and relative to the original file, so the lexer can start in the
/// middle of it and still report useful positions.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, line: usize, column: usize) -> Self {
        Self {
            chars: input.chars().peekable(),
            line,
            column,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, SourceError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SourceError {
        SourceError::new(message, self.line, self.column)
    }

    fn skip_trivia(&mut self) -> Result<(), SourceError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.next() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            let mut star = false;
                            loop {
                                match self.bump() {
                                    Some('/') if star => break,
                                    Some(c) => star = c == '*',
                                    None => return Err(self.error("unterminated block comment")),
                                }
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, SourceError> {
        self.skip_trivia()?;
        let (line, column) = (self.line, self.column);
        let token = |kind| Token { kind, line, column };

        let Some(&c) = self.chars.peek() else {
            return Ok(token(TokenKind::Eof));
        };
        let kind = match c {
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ',' => self.single(TokenKind::Comma),
            ':' => self.single(TokenKind::Colon),
            '.' => {
                for _ in 0..3 {
                    if self.bump() != Some('.') {
                        return Err(SourceError::new("expected `...`", line, column));
                    }
                }
                TokenKind::Spread
            }
            '\'' | '"' => TokenKind::Str(self.string(c)?),
            '`' => TokenKind::Template(self.string('`')?),
            c if c.is_ascii_digit() || c == '-' => TokenKind::Number(self.number()),
            c if c.is_alphabetic() || c == '_' || c == '$' => TokenKind::Ident(self.ident()),
            other => {
                return Err(SourceError::new(
                    format!("unexpected character `{other}`"),
                    line,
                    column,
                ));
            }
        };
        Ok(token(kind))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    fn number(&mut self) -> String {
        let mut number = String::new();
        if let Some(&'-') = self.chars.peek() {
            number.push('-');
            self.bump();
        }
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' || c == '_' {
                number.push(c);
                self.bump();
            } else {
                break;
            }
        }
        number
    }

    fn string(&mut self, quote: char) -> Result<String, SourceError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(SourceError::new("unterminated string", line, column)),
                Some(c) if c == quote => return Ok(value),
                Some('\n') if quote != '`' => {
                    return Err(SourceError::new("unterminated string", line, column));
                }
                Some('$') if quote == '`' && self.chars.peek() == Some(&'{') => {
                    return Err(self.error("template interpolation is not supported"));
                }
                Some('\\') => value.push(self.escape()?),
                Some(c) => value.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, SourceError> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some('u') => {
                let mut hex = String::new();
                if self.chars.peek() == Some(&'{') {
                    self.bump();
                    while let Some(c) = self.bump() {
                        if c == '}' {
                            break;
                        }
                        hex.push(c);
                    }
                } else {
                    for _ in 0..4 {
                        if let Some(c) = self.bump() {
                            hex.push(c);
                        }
                    }
                }
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error(format!("invalid unicode escape `\\u{hex}`")))
            }
            Some(c) => Ok(c),
            None => Err(self.error("unterminated escape")),
        }
    }
}
