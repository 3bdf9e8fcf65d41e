/*!
## Rust Machine Module

This Rust module turns a linked [`Ast`](crate::lang::ast::Ast) into a tape
machine program: procedures are expanded in place, registers get addresses
while constants are propagated, and the surviving statements are lowered
to the eight tape instructions.

*/

pub use crate::lang::ast::Address;

mod codegen;
mod emit;
mod expand;
mod listing;
mod memory;
mod optimize;
mod stack;

pub use codegen::generate;
pub use codegen::WORK_CELLS;
pub use emit::Emitter;
pub use emit::Sign;
pub use expand::expand;
pub use listing::Listing;
pub use memory::Kind;
pub use memory::Memory;
pub use memory::Register;
pub use memory::SCALAR_FOOTPRINT;
pub use optimize::optimize;
pub use stack::Stack;

#[cfg(test)]
mod tests;
