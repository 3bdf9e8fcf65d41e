use super::memory::{Kind, Memory};
use crate::lang::ast::{Ast, Op};
use std::fmt;

/// ## Optimized program listing
///
/// Register map followed by the surviving statements, one per line,
/// indented by block depth and prefixed with their source line.

pub struct Listing<'a> {
    ast: &'a Ast,
    memory: &'a Memory,
}

impl<'a> Listing<'a> {
    pub fn new(ast: &'a Ast, memory: &'a Memory) -> Listing<'a> {
        Listing { ast, memory }
    }
}

impl<'a> fmt::Display for Listing<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for register in self.memory.registers() {
            match register.kind {
                Kind::Scalar => writeln!(f, "; {} @{}", register.name, register.base)?,
                Kind::List(size) => {
                    writeln!(f, "; {}[{}] @{}", register.name, size, register.base)?
                }
            }
        }
        let mut depth = 0usize;
        for id in self.ast.iter() {
            let stmt = self.ast.stmt(id);
            if stmt.op == Op::End {
                depth = depth.saturating_sub(1);
            }
            write!(f, "{:>5} {:indent$}{}", stmt.line, "", stmt.op, indent = depth * 2)?;
            for arg in &stmt.args {
                write!(f, " {}", arg)?;
            }
            writeln!(f)?;
            if stmt.op.is_block() {
                depth += 1;
            }
        }
        Ok(())
    }
}
