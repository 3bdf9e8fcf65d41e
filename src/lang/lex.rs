use super::{token::*, Column, Error};
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// Token stream with its interned payload.
///
/// Every token for which [`Token::has_payload`] is true owns exactly one entry of
/// `lengths`, and that many bytes of `bytes`, in the order the tokens appear.
/// A `Num` payload is always a single byte holding the value.
#[derive(Debug, Default, PartialEq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub bytes: Vec<u8>,
    pub lengths: Vec<usize>,
}

impl Lexed {
    fn push(&mut self, token: Token) {
        debug_assert!(!token.has_payload());
        self.tokens.push(token);
    }

    fn push_payload(&mut self, token: Token, payload: &[u8]) {
        debug_assert!(token.has_payload());
        self.tokens.push(token);
        self.bytes.extend_from_slice(payload);
        self.lengths.push(payload.len());
    }
}

pub fn lex(s: &str) -> Result<Lexed> {
    RegisterLexer::new(s).lex()
}

fn is_whitespace(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\r' || c == 0x0b || c == 0x0c
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_ident_char(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

struct RegisterLexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    line_start: usize,
    lexed: Lexed,
}

impl<'a> RegisterLexer<'a> {
    fn new(s: &'a str) -> RegisterLexer<'a> {
        RegisterLexer {
            src: s.as_bytes(),
            pos: 0,
            line: 1,
            line_start: 0,
            lexed: Lexed::default(),
        }
    }

    fn lex(mut self) -> Result<Lexed> {
        loop {
            self.statement()?;
            match self.peek() {
                Some(b'\n') => {
                    self.pos += 1;
                    self.lexed.push(Token::Eol);
                    self.line += 1;
                    self.line_start = self.pos;
                }
                None => break,
                Some(_) => return Err(self.fail(self.pos, "UNEXPECTED CHARACTER")),
            }
        }
        log::trace!(
            "lexed {} tokens, {} payload bytes",
            self.lexed.tokens.len(),
            self.lexed.bytes.len()
        );
        Ok(self.lexed)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn column(&self, start: usize) -> Column {
        (start - self.line_start)..(self.pos.max(start + 1) - self.line_start)
    }

    fn fail(&self, start: usize, msg: &str) -> Error {
        error!(InvalidToken, Some(self.line), ..&self.column(start); msg)
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(b'\n'))
    }

    fn at_comment(&self) -> bool {
        match self.peek() {
            Some(b'#') => true,
            Some(b'/') => self.peek_at(1) == Some(b'/'),
            Some(b'-') => self.peek_at(1) == Some(b'-'),
            _ => false,
        }
    }

    /// True when the current byte may legally end an identifier.
    fn at_ident_end(&self) -> bool {
        match self.peek() {
            None | Some(b'\n') | Some(b'[') | Some(b'"') => true,
            Some(c) if is_whitespace(c) => true,
            _ => self.at_comment(),
        }
    }

    fn at_separator(&self) -> bool {
        match self.peek() {
            None | Some(b'\n') => true,
            Some(c) if is_whitespace(c) => true,
            _ => self.at_comment(),
        }
    }

    fn skip_line(&mut self) {
        while !self.at_line_end() {
            self.pos += 1;
        }
    }

    fn whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !is_whitespace(c) {
                break;
            }
            self.pos += 1;
        }
    }

    fn statement(&mut self) -> Result<()> {
        self.whitespace();
        if self.at_line_end() || self.at_comment() {
            self.skip_line();
            return Ok(());
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.fail(start, "EXPECTED STATEMENT"));
        }
        let word = String::from_utf8_lossy(&self.src[start..self.pos]);
        let word = match Word::from_string(&word) {
            Some(word) => word,
            None => return Err(self.fail(start, "UNKNOWN STATEMENT")),
        };
        match word {
            Word::Rem => {
                self.skip_line();
                return Ok(());
            }
            Word::Proc | Word::Call => {
                self.lexed.push(Token::Word(word));
                self.proc_name()?;
            }
            _ => self.lexed.push(Token::Word(word)),
        }
        self.arguments()
    }

    fn proc_name(&mut self) -> Result<()> {
        self.whitespace();
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            _ => return Err(self.fail(start, "EXPECTED PROCEDURE NAME")),
        }
        let name = self.ident_bytes();
        if !self.at_ident_end() {
            return Err(self.fail(start, "INVALID PROCEDURE NAME"));
        }
        self.lexed.push_payload(Token::ProcName, &name);
        Ok(())
    }

    fn arguments(&mut self) -> Result<()> {
        loop {
            self.whitespace();
            if self.at_line_end() {
                return Ok(());
            }
            if self.at_comment() {
                self.skip_line();
                return Ok(());
            }
            let start = self.pos;
            match self.peek() {
                Some(b'[') => {
                    self.pos += 1;
                    self.lexed.push(Token::OpenBracket);
                }
                Some(b']') => {
                    self.pos += 1;
                    if !self.at_separator() {
                        return Err(self.fail(start, "INVALID LIST DECLARATION"));
                    }
                    self.lexed.push(Token::CloseBracket);
                }
                Some(b'\'') => self.character()?,
                Some(b'"') => self.string()?,
                Some(c) if is_ident_start(c) => self.alphabetic()?,
                Some(c) if c.is_ascii_digit() => self.number()?,
                Some(b'-') if self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) => {
                    self.number()?
                }
                _ => return Err(self.fail(start, "UNEXPECTED CHARACTER")),
            }
        }
    }

    fn ident_bytes(&mut self) -> Vec<u8> {
        let mut s = vec![];
        while let Some(c) = self.peek() {
            if !is_ident_char(c) {
                break;
            }
            s.push(c.to_ascii_uppercase());
            self.pos += 1;
        }
        s
    }

    fn alphabetic(&mut self) -> Result<()> {
        let start = self.pos;
        let name = self.ident_bytes();
        if !self.at_ident_end() {
            return Err(self.fail(start, "INVALID VARIABLE NAME"));
        }
        self.lexed.push_payload(Token::Label, &name);
        Ok(())
    }

    fn number(&mut self) -> Result<()> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        let mut value: u32 = 0;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            value = (value * 10 + u32::from(c - b'0')) % 256;
            self.pos += 1;
        }
        if negative {
            value = (256 - value) % 256;
        }
        if self.peek() != Some(b']') && !self.at_separator() {
            return Err(self.fail(start, "INVALID NUMBER LITERAL"));
        }
        self.lexed.push_payload(Token::Num, &[value as u8]);
        Ok(())
    }

    fn escape(&mut self, start: usize) -> Result<u8> {
        let ch = match self.peek() {
            Some(b'\\') => b'\\',
            Some(b'\'') => b'\'',
            Some(b'"') => b'"',
            Some(b'n') => b'\n',
            Some(b'r') => b'\r',
            Some(b't') => b'\t',
            _ => return Err(self.fail(start, "INVALID ESCAPE SEQUENCE")),
        };
        self.pos += 1;
        Ok(ch)
    }

    fn character(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        let ch = match self.peek() {
            Some(b'\\') => {
                self.pos += 1;
                self.escape(start)?
            }
            Some(b'\n') | None => return Err(self.fail(start, "INVALID CHAR LITERAL")),
            Some(c) => {
                self.pos += 1;
                c
            }
        };
        if self.peek() != Some(b'\'') {
            return Err(self.fail(start, "INVALID CHAR LITERAL"));
        }
        self.pos += 1;
        self.lexed.push_payload(Token::Num, &[ch]);
        Ok(())
    }

    fn string(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        let mut s = vec![];
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    s.push(self.escape(start)?);
                }
                Some(b'\n') | None => return Err(self.fail(start, "UNTERMINATED STRING")),
                Some(c) => {
                    self.pos += 1;
                    s.push(c);
                }
            }
        }
        self.lexed.push_payload(Token::Str, &s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_case() {
        let lexed = lex("SeT a 1").unwrap();
        assert_eq!(
            lexed.tokens,
            vec![Token::Word(Word::Set), Token::Label, Token::Num]
        );
        assert_eq!(lexed.bytes, vec![b'A', 1]);
        assert_eq!(lexed.lengths, vec![1, 1]);
    }

    #[test]
    fn test_comment_lines() {
        let lexed = lex("// one\n-- two\n# three\nrem four\n   \nmsg x -- trailing").unwrap();
        assert_eq!(
            lexed.tokens,
            vec![
                Token::Eol,
                Token::Eol,
                Token::Eol,
                Token::Eol,
                Token::Eol,
                Token::Word(Word::Msg),
                Token::Label,
            ]
        );
    }

    #[test]
    fn test_negative_wraps() {
        let lexed = lex("set a -1\nset b 257\nset c -256").unwrap();
        assert_eq!(lexed.bytes, vec![b'A', 255, b'B', 1, b'C', 0]);
    }

    #[test]
    fn test_unknown_statement() {
        let e = lex("var a\nfrob a").unwrap_err();
        assert_eq!(e.line_number(), Some(2));
        assert_eq!(e.column(), 0..4);
    }
}
