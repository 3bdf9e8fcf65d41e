use super::{ast::*, token::*, Error, Lexed};
use crate::error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Group a token stream into flat statements, one per source line.
pub fn parse(lexed: &Lexed) -> Result<Vec<Statement>> {
    let mut parse = Parser {
        token_stream: lexed.tokens.iter(),
        peeked: None,
        bytes: &lexed.bytes,
        lengths: lexed.lengths.iter(),
        line: 1,
    };
    let mut r: Vec<Statement> = vec![];
    loop {
        match parse.next() {
            None => break,
            Some(Token::Eol) => parse.line += 1,
            Some(Token::Word(word)) => {
                let line = parse.line;
                match parse.statement(*word) {
                    Ok(s) => r.push(s),
                    Err(e) => return Err(e.in_line_number(Some(line))),
                }
            }
            Some(t) => {
                return Err(error!(SyntaxError, Some(parse.line); format!("UNEXPECTED {}", t)))
            }
        }
    }
    log::trace!("parsed {} statements", r.len());
    Ok(r)
}

struct Parser<'a> {
    token_stream: std::slice::Iter<'a, Token>,
    peeked: Option<&'a Token>,
    bytes: &'a [u8],
    lengths: std::slice::Iter<'a, usize>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<&'a Token> {
        if self.peeked.is_some() {
            return self.peeked.take();
        }
        self.token_stream.next()
    }

    fn peek(&mut self) -> Option<&'a Token> {
        if self.peeked.is_none() {
            self.peeked = self.token_stream.next();
        }
        self.peeked
    }

    /// Take the payload belonging to the token just consumed.
    fn payload(&mut self) -> Result<&'a [u8]> {
        let len = match self.lengths.next() {
            Some(len) => *len,
            None => return Err(error!(InternalError; "PAYLOAD TABLE EXHAUSTED")),
        };
        if len > self.bytes.len() {
            return Err(error!(InternalError; "PAYLOAD TABLE EXHAUSTED"));
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn name(&mut self) -> Result<Rc<str>> {
        let payload = self.payload()?;
        Ok(Rc::from(String::from_utf8_lossy(payload).as_ref()))
    }

    fn number(&mut self) -> Result<u8> {
        match self.payload()? {
            [n] => Ok(*n),
            _ => Err(error!(InternalError; "MALFORMED NUMBER PAYLOAD")),
        }
    }

    fn statement(&mut self, word: Word) -> Result<Statement> {
        let op = match Op::for_word(word) {
            Some(op) => op,
            None => return Err(error!(InternalError; "COMMENT REACHED PARSER")),
        };
        let mut args: Vec<Argument> = vec![];
        loop {
            match self.peek() {
                None | Some(Token::Eol) => break,
                _ => {}
            }
            args.push(self.argument()?);
        }
        Ok(Statement::new(op, args, self.line))
    }

    fn argument(&mut self) -> Result<Argument> {
        match self.next() {
            Some(Token::Num) => Ok(Argument::Number(self.number()?)),
            Some(Token::Str) => Ok(Argument::Str(Rc::from(self.payload()?))),
            Some(Token::ProcName) => Ok(Argument::Procedure(self.name()?)),
            Some(Token::Label) => {
                let name = self.name()?;
                if self.peek() != Some(&Token::OpenBracket) {
                    return Ok(Argument::Variable(name));
                }
                self.next();
                let size = match self.next() {
                    Some(Token::Num) => self.number()?,
                    _ => return Err(error!(SyntaxError; "EXPECTED LIST SIZE")),
                };
                match self.next() {
                    Some(Token::CloseBracket) => Ok(Argument::List(name, size)),
                    _ => Err(error!(SyntaxError; "EXPECTED ]")),
                }
            }
            Some(t) => Err(error!(SyntaxError; format!("UNEXPECTED {}", t))),
            None => Err(error!(SyntaxError; "EXPECTED ARGUMENT")),
        }
    }
}
