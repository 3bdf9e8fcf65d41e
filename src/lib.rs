//! # regtape
//!
//! A compiler from a small register language to the eight-instruction
//! tape machine (`+ - < > . , [ ]`, 8-bit wrapping cells).
//!
//! ```
//! let program = regtape::compile("var a\nread a\ninc a 1\nmsg a").unwrap();
//! assert_eq!(program, ",+.");
//! ```
//!
//! The source language has one statement per line:
//! ```text
//! var A B L[4]         declare scalars and a list
//! set A 10             A = 10
//! add A B C            C = A + B (also sub, mul)
//! divmod A B Q R       Q = A / B, R = A % B (also div, mod)
//! cmp A B C            C = 255, 0 or 1 as A is below, equal or above B
//! a2b D1 D2 D3 B       B = number spelled by three ASCII digits
//! b2a B D1 D2 D3       three ASCII digits of B
//! lset L I V           L[I] = V
//! lget L I V           V = L[I]
//! ifeq A B / ifneq A B / wneq A B ... end
//! proc NAME X Y ... end and call NAME A B
//! read A               one input byte
//! msg "text" A 10      output
//! ```
//! Comments start with `//`, `--`, `#` or a leading `rem`.

pub mod lang;
pub mod mach;

use lang::ast::Ast;
use lang::Error;
use mach::{Listing, Memory};

/// Every stage of one compilation.
#[derive(Debug)]
pub struct Compiler {
    ast: Ast,
    memory: Memory,
    program: String,
}

impl Compiler {
    pub fn new(source: &str) -> Result<Compiler, Error> {
        let lexed = lang::lex(source)?;
        let mut ast = lang::build(lang::parse(&lexed)?)?;
        mach::expand(&mut ast)?;
        let memory = mach::optimize(&mut ast)?;
        let program = mach::generate(&ast, &memory)?;
        Ok(Compiler {
            ast,
            memory,
            program,
        })
    }

    /// Optimized statement chain.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn listing(&self) -> Listing<'_> {
        Listing::new(&self.ast, &self.memory)
    }

    pub fn into_program(self) -> String {
        self.program
    }
}

/// Compile source text to a tape program.
pub fn compile(source: &str) -> Result<String, Error> {
    Ok(Compiler::new(source)?.into_program())
}
