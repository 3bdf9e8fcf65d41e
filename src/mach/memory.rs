use super::Address;
use crate::error;
use crate::lang::{ast::Argument, Error};
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Cells taken by a scalar: the value and three scratch cells.
pub const SCALAR_FOOTPRINT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar,
    List(u8),
}

#[derive(Debug, Clone)]
pub struct Register {
    pub name: Rc<str>,
    pub kind: Kind,
    pub base: Address,
    pub known: bool,
    /// One value per cell, meaningful only while `known`.
    pub values: Vec<u8>,
    pub reads: bool,
    pub pending_removal: bool,
}

impl Register {
    pub fn is_scalar(&self) -> bool {
        self.kind == Kind::Scalar
    }

    /// Number of value cells.
    pub fn cells(&self) -> usize {
        match self.kind {
            Kind::Scalar => 1,
            Kind::List(size) => size as usize,
        }
    }

    pub fn footprint(&self) -> usize {
        match self.kind {
            Kind::Scalar => SCALAR_FOOTPRINT,
            Kind::List(size) => size as usize,
        }
    }

    pub fn span(&self) -> Range<Address> {
        self.base..self.base + self.footprint()
    }

    /// Statically known value of a scalar.
    pub fn value(&self) -> Option<u8> {
        if self.known && self.is_scalar() {
            self.values.first().copied()
        } else {
            None
        }
    }
}

/// Known-value state of every register at one program point.
pub type Snapshot = Vec<Option<Vec<u8>>>;

/// ## Register memory
///
/// Addresses are handed out in declaration order and never reused.

#[derive(Debug, Default, Clone)]
pub struct Memory {
    registers: Vec<Register>,
    names: HashMap<Rc<str>, usize>,
    next: Address,
}

impl Memory {
    pub fn new() -> Memory {
        Memory::default()
    }

    /// Allocate a register for a `Variable` or `List` argument.
    pub fn declare(&mut self, arg: &Argument, known: bool) -> Result<usize> {
        let (name, kind) = match arg {
            Argument::Variable(name) => (name, Kind::Scalar),
            Argument::List(name, size) => {
                if *size == 0 {
                    return Err(error!(TypeMismatch; format!("LIST {} HAS NO CELLS", name)));
                }
                (name, Kind::List(*size))
            }
            _ => return Err(error!(TypeMismatch; "EXPECTED VARIABLE OR LIST")),
        };
        if self.names.contains_key(name) {
            return Err(error!(DuplicateName; format!("VARIABLE {}", name)));
        }
        let cells = match kind {
            Kind::Scalar => 1,
            Kind::List(size) => size as usize,
        };
        let register = Register {
            name: name.clone(),
            kind,
            base: self.next,
            known,
            values: vec![0; cells],
            reads: false,
            pending_removal: false,
        };
        log::debug!("allocated {} at {}", name, self.next);
        self.next += register.footprint();
        self.names.insert(name.clone(), self.registers.len());
        self.registers.push(register);
        Ok(self.registers.len() - 1)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn get(&self, index: usize) -> &Register {
        &self.registers[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Register {
        &mut self.registers[index]
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// First address past every register.
    pub fn next_free(&self) -> Address {
        self.next
    }

    /// Index of the register whose span covers `addr`, scratch cells included.
    pub fn register_at(&self, addr: Address) -> Option<usize> {
        self.registers
            .iter()
            .position(|r| r.span().contains(&addr))
    }

    /// First scratch cell when `addr` is the value cell of a scalar.
    pub fn scratch(&self, addr: Address) -> Option<Address> {
        let index = self.register_at(addr)?;
        let register = &self.registers[index];
        if register.is_scalar() && register.base == addr {
            Some(addr + 1)
        } else {
            None
        }
    }

    /// Record a store. A register that ever took input never becomes known again.
    pub fn assign(&mut self, index: usize, value: Option<u8>) {
        let register = &mut self.registers[index];
        match value {
            Some(value) if !register.reads => {
                register.known = true;
                register.values[0] = value;
            }
            _ => register.known = false,
        }
    }

    pub fn forget(&mut self, index: usize) {
        self.registers[index].known = false;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.registers
            .iter()
            .map(|r| if r.known { Some(r.values.clone()) } else { None })
            .collect()
    }

    /// Merge the state of another path into the current one.
    ///
    /// Registers declared after the snapshot was taken were untouched on the
    /// other path, so they still held zero there.
    pub fn join(&mut self, snapshot: &Snapshot) {
        for (index, register) in self.registers.iter_mut().enumerate() {
            if !register.known {
                continue;
            }
            let same = match snapshot.get(index) {
                Some(Some(values)) => *values == register.values,
                Some(None) => false,
                None => register.values.iter().all(|v| *v == 0),
            };
            if !same {
                log::trace!("{} unknown after join", register.name);
                register.known = false;
            }
        }
    }
}
