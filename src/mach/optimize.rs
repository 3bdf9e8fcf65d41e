use super::memory::{Memory, Snapshot};
use super::{Address, Stack};
use crate::error;
use crate::lang::ast::{Argument, Ast, Op, Statement, StmtId, MAX_BLOCK_DEPTH};
use crate::lang::Error;
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

/// Constant propagation and dead-store elimination over the main chain.
///
/// Every `var` is consumed here and turned into a [`Memory`] register; every
/// surviving statement has its names replaced by addresses or literals.
pub fn optimize(ast: &mut Ast) -> Result<Memory> {
    let mut optimizer = Optimizer {
        ast,
        memory: Memory::new(),
        frames: Stack::new("BLOCKS NESTED TOO DEEPLY", MAX_BLOCK_DEPTH),
        folded: 0,
    };
    optimizer.propagate()?;
    optimizer.eliminate_dead_stores();
    log::debug!(
        "optimized to {} statements, {} folded, {} registers",
        optimizer.ast.len(),
        optimizer.folded,
        optimizer.memory.len()
    );
    Ok(optimizer.memory)
}

#[derive(Debug, Clone, Copy)]
enum Operand {
    Lit(u8),
    Reg {
        index: usize,
        addr: Address,
        value: Option<u8>,
    },
}

impl Operand {
    fn value(&self) -> Option<u8> {
        match *self {
            Operand::Lit(n) => Some(n),
            Operand::Reg { value, .. } => value,
        }
    }

    fn register(&self) -> Option<usize> {
        match *self {
            Operand::Lit(_) => None,
            Operand::Reg { index, .. } => Some(index),
        }
    }

    fn argument(&self) -> Argument {
        match *self {
            Operand::Lit(n) | Operand::Reg { value: Some(n), .. } => Argument::Number(n),
            Operand::Reg { addr, .. } => Argument::Address(addr),
        }
    }
}

#[derive(Debug)]
struct Frame {
    looping: bool,
    entry: Snapshot,
}

/// Arguments a statement stores into.
fn written(stmt: &Statement) -> &[Argument] {
    let range = match stmt.op {
        Op::Set
        | Op::Inc
        | Op::Dec
        | Op::Read
        | Op::LSet
        | Op::Double
        | Op::Square
        | Op::Duplicate => 0..1,
        Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Mod | Op::Cmp | Op::LGet => 2..3,
        Op::DivMod => 2..4,
        Op::A2b => 3..4,
        Op::B2a => 1..4,
        _ => 0..0,
    };
    stmt.args.get(range).unwrap_or(&[])
}

fn arity(args: &[Argument], len: usize) -> Result<()> {
    if args.len() != len {
        return Err(error!(WrongArgumentCount; format!("EXPECTED {} ARGUMENTS", len)));
    }
    Ok(())
}

fn ascii_to_byte(a: u8, b: u8, c: u8) -> u8 {
    a.wrapping_sub(b'0')
        .wrapping_mul(100)
        .wrapping_add(b.wrapping_sub(b'0').wrapping_mul(10))
        .wrapping_add(c.wrapping_sub(b'0'))
}

struct Optimizer<'a> {
    ast: &'a mut Ast,
    memory: Memory,
    frames: Stack<Frame>,
    folded: usize,
}

impl<'a> Optimizer<'a> {
    fn propagate(&mut self) -> Result<()> {
        let mut cursor = self.ast.head();
        while let Some(id) = cursor {
            let line = Some(self.ast.stmt(id).line);
            cursor = self
                .statement(id)
                .map_err(|e| e.in_line_number(line))?;
        }
        if !self.frames.is_empty() {
            return Err(error!(InternalError; "UNCLOSED BLOCK"));
        }
        Ok(())
    }

    fn statement(&mut self, id: StmtId) -> Result<Option<StmtId>> {
        let op = self.ast.stmt(id).op;
        let args = self.ast.stmt(id).args.clone();
        match op {
            Op::Var => {
                if args.is_empty() {
                    return Err(error!(WrongArgumentCount; "VAR NEEDS A NAME"));
                }
                let known = !self.in_loop();
                for arg in &args {
                    self.memory.declare(arg, known)?;
                }
                self.remove(id)
            }
            Op::Set => self.set(id, &args),
            Op::Inc | Op::Dec => self.inc_dec(id, op, &args),
            Op::Add | Op::Sub | Op::Mul => self.arithmetic(id, op, &args),
            Op::Div | Op::Mod | Op::DivMod => self.divide(id, op, &args),
            Op::Cmp => self.compare(id, &args),
            Op::A2b => self.a2b(id, &args),
            Op::B2a => self.b2a(id, &args),
            Op::LSet => self.lset(id, &args),
            Op::LGet => self.lget(id, &args),
            Op::Read => {
                arity(&args, 1)?;
                let d = self.dest(&args[0])?;
                let register = self.memory.get_mut(d);
                register.reads = true;
                register.known = false;
                let base = register.base;
                self.rewrite(id, Op::Read, vec![Argument::Address(base)])
            }
            Op::Msg => {
                if args.is_empty() {
                    return Err(error!(WrongArgumentCount; "MSG NEEDS AN ARGUMENT"));
                }
                let mut resolved = Vec::with_capacity(args.len());
                for arg in &args {
                    resolved.push(match arg {
                        Argument::Str(_) | Argument::Number(_) => arg.clone(),
                        _ => self.source(arg)?.argument(),
                    });
                }
                self.rewrite(id, Op::Msg, resolved)
            }
            Op::IfEq | Op::IfNeq => {
                arity(&args, 2)?;
                let a = self.source(&args[0])?;
                let b = self.source(&args[1])?;
                self.frames.push(Frame {
                    looping: false,
                    entry: self.memory.snapshot(),
                })?;
                self.rewrite(id, op, vec![a.argument(), b.argument()])
            }
            Op::WNeq => {
                arity(&args, 2)?;
                self.invalidate_loop(id)?;
                let a = self.source(&args[0])?;
                let b = self.source(&args[1])?;
                self.frames.push(Frame {
                    looping: true,
                    entry: self.memory.snapshot(),
                })?;
                self.rewrite(id, op, vec![a.argument(), b.argument()])
            }
            Op::End => {
                let frame = self.frames.pop()?;
                self.memory.join(&frame.entry);
                Ok(self.ast.stmt(id).next)
            }
            Op::Call | Op::Proc | Op::Double | Op::Square | Op::Duplicate => {
                Err(error!(InternalError; format!("UNEXPECTED {}", op)))
            }
        }
    }

    fn in_loop(&self) -> bool {
        self.frames.iter().any(|f| f.looping)
    }

    /// Forget every register stored into anywhere in a loop body.
    fn invalidate_loop(&mut self, id: StmtId) -> Result<()> {
        let end = match self.ast.stmt(id).jump {
            Some(end) => end,
            None => return Err(error!(InternalError; "LOOP WITHOUT END")),
        };
        let first = self.ast.stmt(id).next;
        let mut names = vec![];
        for body in self.ast.chain(first) {
            if body == end {
                break;
            }
            for arg in written(self.ast.stmt(body)) {
                if let Argument::Variable(name) = arg {
                    names.push(name.clone());
                }
            }
        }
        for name in names {
            if let Some(index) = self.memory.find(&name) {
                self.memory.forget(index);
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<usize> {
        match self.memory.find(name) {
            Some(index) => Ok(index),
            None => Err(error!(UndefinedName; name.to_string())),
        }
    }

    fn scalar(&self, name: &str) -> Result<usize> {
        let index = self.lookup(name)?;
        if !self.memory.get(index).is_scalar() {
            return Err(error!(TypeMismatch; format!("{} IS A LIST", name)));
        }
        Ok(index)
    }

    fn dest(&self, arg: &Argument) -> Result<usize> {
        match arg {
            Argument::Variable(name) => self.scalar(name),
            _ => Err(error!(TypeMismatch; format!("CANNOT STORE INTO {}", arg))),
        }
    }

    fn list(&self, arg: &Argument) -> Result<usize> {
        match arg {
            Argument::Variable(name) => {
                let index = self.lookup(name)?;
                if self.memory.get(index).is_scalar() {
                    return Err(error!(TypeMismatch; format!("{} IS NOT A LIST", name)));
                }
                Ok(index)
            }
            _ => Err(error!(TypeMismatch; format!("EXPECTED LIST, FOUND {}", arg))),
        }
    }

    fn source(&self, arg: &Argument) -> Result<Operand> {
        match arg {
            Argument::Number(n) => Ok(Operand::Lit(*n)),
            Argument::Variable(name) => {
                let index = self.scalar(name)?;
                let register = self.memory.get(index);
                Ok(Operand::Reg {
                    index,
                    addr: register.base,
                    value: register.value(),
                })
            }
            _ => Err(error!(TypeMismatch; format!("UNEXPECTED ARGUMENT {}", arg))),
        }
    }

    fn address(&self, index: usize) -> Argument {
        Argument::Address(self.memory.get(index).base)
    }

    fn rewrite(&mut self, id: StmtId, op: Op, args: Vec<Argument>) -> Result<Option<StmtId>> {
        let stmt = self.ast.stmt_mut(id);
        stmt.op = op;
        stmt.args = args;
        Ok(stmt.next)
    }

    fn remove(&mut self, id: StmtId) -> Result<Option<StmtId>> {
        let next = self.ast.stmt(id).next;
        self.ast.unlink(id);
        Ok(next)
    }

    /// Replace a statement with stores of known values, skipping values
    /// a register already holds.
    fn fold(&mut self, id: StmtId, stores: &[(usize, u8)]) -> Result<Option<StmtId>> {
        self.folded += 1;
        let line = self.ast.stmt(id).line;
        let mut sets = vec![];
        for &(index, value) in stores {
            if self.memory.get(index).value() == Some(value) {
                continue;
            }
            self.memory.assign(index, Some(value));
            let args = vec![self.address(index), Argument::Number(value)];
            sets.push(Statement::new(Op::Set, args, line));
        }
        let mut sets = sets.into_iter();
        let first = match sets.next() {
            Some(first) => first,
            None => return self.remove(id),
        };
        log::trace!("line {}: folded {}", line, self.ast.stmt(id).op);
        self.rewrite(id, first.op, first.args)?;
        let mut last = id;
        for set in sets {
            last = self.ast.insert_after(last, set);
        }
        Ok(self.ast.stmt(last).next)
    }

    /// Result is unknown until run time.
    fn unknown(&mut self, id: StmtId, op: Op, dests: &[usize], args: Vec<Argument>) -> Result<Option<StmtId>> {
        for &d in dests {
            self.memory.assign(d, None);
        }
        self.rewrite(id, op, args)
    }

    fn set(&mut self, id: StmtId, args: &[Argument]) -> Result<Option<StmtId>> {
        arity(args, 2)?;
        let d = self.dest(&args[0])?;
        let s = self.source(&args[1])?;
        if s.register() == Some(d) {
            return self.remove(id);
        }
        match s.value() {
            Some(v) => self.fold(id, &[(d, v)]),
            None => {
                let args = vec![self.address(d), s.argument()];
                self.unknown(id, Op::Set, &[d], args)
            }
        }
    }

    fn inc_dec(&mut self, id: StmtId, op: Op, args: &[Argument]) -> Result<Option<StmtId>> {
        arity(args, 2)?;
        let d = self.dest(&args[0])?;
        let s = self.source(&args[1])?;
        if s.register() == Some(d) {
            return match (op, s.value()) {
                (Op::Dec, _) => self.fold(id, &[(d, 0)]),
                (_, Some(v)) => self.fold(id, &[(d, v.wrapping_mul(2))]),
                (_, None) => {
                    let args = vec![self.address(d)];
                    self.unknown(id, Op::Double, &[d], args)
                }
            };
        }
        self.step(id, op, d, s)
    }

    /// `inc`/`dec` of `d` by an operand other than `d`.
    fn step(&mut self, id: StmtId, op: Op, d: usize, s: Operand) -> Result<Option<StmtId>> {
        match (self.memory.get(d).value(), s.value()) {
            (_, Some(0)) => self.remove(id),
            (Some(current), Some(v)) => {
                let value = if op == Op::Inc {
                    current.wrapping_add(v)
                } else {
                    current.wrapping_sub(v)
                };
                self.fold(id, &[(d, value)])
            }
            _ => {
                let args = vec![self.address(d), s.argument()];
                self.unknown(id, op, &[d], args)
            }
        }
    }

    fn arithmetic(&mut self, id: StmtId, op: Op, args: &[Argument]) -> Result<Option<StmtId>> {
        arity(args, 3)?;
        let a = self.source(&args[0])?;
        let b = self.source(&args[1])?;
        let d = self.dest(&args[2])?;
        if let (Some(x), Some(y)) = (a.value(), b.value()) {
            let value = match op {
                Op::Add => x.wrapping_add(y),
                Op::Sub => x.wrapping_sub(y),
                _ => x.wrapping_mul(y),
            };
            return self.fold(id, &[(d, value)]);
        }
        let same = a.register().is_some() && a.register() == b.register();
        if same && op == Op::Sub {
            return self.fold(id, &[(d, 0)]);
        }
        if same && a.register() == Some(d) {
            let op = if op == Op::Add { Op::Double } else { Op::Square };
            let args = vec![self.address(d)];
            return self.unknown(id, op, &[d], args);
        }
        if op == Op::Mul && (a.value() == Some(0) || b.value() == Some(0)) {
            return self.fold(id, &[(d, 0)]);
        }
        let other = if a.register() == Some(d) {
            Some(b)
        } else if b.register() == Some(d) && op != Op::Sub {
            Some(a)
        } else {
            None
        };
        if let Some(other) = other {
            return match op {
                Op::Add => self.step(id, Op::Inc, d, other),
                Op::Sub => self.step(id, Op::Dec, d, other),
                _ => self.duplicate(id, d, other),
            };
        }
        let args = vec![a.argument(), b.argument(), self.address(d)];
        self.unknown(id, op, &[d], args)
    }

    /// `d` multiplied in place by an operand other than `d`.
    fn duplicate(&mut self, id: StmtId, d: usize, other: Operand) -> Result<Option<StmtId>> {
        match other.value() {
            Some(0) => self.fold(id, &[(d, 0)]),
            Some(1) => self.remove(id),
            _ => {
                let args = vec![self.address(d), other.argument()];
                self.unknown(id, Op::Duplicate, &[d], args)
            }
        }
    }

    fn divide(&mut self, id: StmtId, op: Op, args: &[Argument]) -> Result<Option<StmtId>> {
        arity(args, if op == Op::DivMod { 4 } else { 3 })?;
        let n = self.source(&args[0])?;
        let divisor = self.source(&args[1])?;
        let quotient = match op {
            Op::Mod => None,
            _ => Some(self.dest(&args[2])?),
        };
        let remainder = match op {
            Op::DivMod => Some(self.dest(&args[3])?),
            Op::Mod => Some(self.dest(&args[2])?),
            _ => None,
        };
        if quotient.is_some() && quotient == remainder {
            return Err(error!(TypeMismatch; "QUOTIENT AND REMAINDER MUST DIFFER"));
        }
        if divisor.value() == Some(0) {
            return Err(error!(DivisionByZero));
        }
        if let (Some(x), Some(y)) = (n.value(), divisor.value()) {
            let mut stores = vec![];
            if let Some(q) = quotient {
                stores.push((q, x / y));
            }
            if let Some(r) = remainder {
                stores.push((r, x % y));
            }
            return self.fold(id, &stores);
        }
        let dests: Vec<usize> = quotient.iter().chain(remainder.iter()).copied().collect();
        let mut new_args = vec![n.argument(), divisor.argument()];
        new_args.extend(dests.iter().map(|&d| self.address(d)));
        self.unknown(id, op, &dests, new_args)
    }

    fn compare(&mut self, id: StmtId, args: &[Argument]) -> Result<Option<StmtId>> {
        arity(args, 3)?;
        let a = self.source(&args[0])?;
        let b = self.source(&args[1])?;
        let d = self.dest(&args[2])?;
        if a.register().is_some() && a.register() == b.register() {
            return self.fold(id, &[(d, 0)]);
        }
        if let (Some(x), Some(y)) = (a.value(), b.value()) {
            let value = match x.cmp(&y) {
                Ordering::Less => 255,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            };
            return self.fold(id, &[(d, value)]);
        }
        let args = vec![a.argument(), b.argument(), self.address(d)];
        self.unknown(id, Op::Cmp, &[d], args)
    }

    fn a2b(&mut self, id: StmtId, args: &[Argument]) -> Result<Option<StmtId>> {
        arity(args, 4)?;
        let a = self.source(&args[0])?;
        let b = self.source(&args[1])?;
        let c = self.source(&args[2])?;
        let d = self.dest(&args[3])?;
        if let (Some(x), Some(y), Some(z)) = (a.value(), b.value(), c.value()) {
            return self.fold(id, &[(d, ascii_to_byte(x, y, z))]);
        }
        let args = vec![a.argument(), b.argument(), c.argument(), self.address(d)];
        self.unknown(id, Op::A2b, &[d], args)
    }

    fn b2a(&mut self, id: StmtId, args: &[Argument]) -> Result<Option<StmtId>> {
        arity(args, 4)?;
        let a = self.source(&args[0])?;
        let dests = [
            self.dest(&args[1])?,
            self.dest(&args[2])?,
            self.dest(&args[3])?,
        ];
        if let Some(v) = a.value() {
            let digits = [v / 100, v / 10 % 10, v % 10];
            let stores: Vec<(usize, u8)> = dests
                .iter()
                .zip(digits.iter())
                .map(|(&d, &digit)| (d, b'0' + digit))
                .collect();
            return self.fold(id, &stores);
        }
        let mut new_args = vec![a.argument()];
        new_args.extend(dests.iter().map(|&d| self.address(d)));
        self.unknown(id, Op::B2a, &dests, new_args)
    }

    fn element(&self, list: usize, index: u8) -> Result<Address> {
        let register = self.memory.get(list);
        if index as usize >= register.cells() {
            return Err(error!(IndexOutOfRange; format!("{}[{}]", register.name, index)));
        }
        Ok(register.base + index as usize)
    }

    fn lset(&mut self, id: StmtId, args: &[Argument]) -> Result<Option<StmtId>> {
        arity(args, 3)?;
        let l = self.list(&args[0])?;
        let i = self.source(&args[1])?;
        let v = self.source(&args[2])?;
        let index = match i.value() {
            Some(index) => index,
            None => {
                self.memory.forget(l);
                let args = vec![self.address(l), i.argument(), v.argument()];
                return self.rewrite(id, Op::LSet, args);
            }
        };
        let addr = self.element(l, index)?;
        let register = self.memory.get_mut(l);
        match v.value() {
            Some(value) if register.known => {
                if register.values[index as usize] == value {
                    return self.remove(id);
                }
                register.values[index as usize] = value;
            }
            _ => register.known = false,
        }
        self.rewrite(id, Op::Set, vec![Argument::Address(addr), v.argument()])
    }

    fn lget(&mut self, id: StmtId, args: &[Argument]) -> Result<Option<StmtId>> {
        arity(args, 3)?;
        let l = self.list(&args[0])?;
        let i = self.source(&args[1])?;
        let d = self.dest(&args[2])?;
        let index = match i.value() {
            Some(index) => index,
            None => {
                let args = vec![self.address(l), i.argument(), self.address(d)];
                return self.unknown(id, Op::LGet, &[d], args);
            }
        };
        let addr = self.element(l, index)?;
        let register = self.memory.get(l);
        if register.known {
            let value = register.values[index as usize];
            return self.fold(id, &[(d, value)]);
        }
        let args = vec![self.address(d), Argument::Address(addr)];
        self.unknown(id, Op::Set, &[d], args)
    }

    fn eliminate_dead_stores(&mut self) {
        for index in 0..self.memory.len() {
            self.memory.get_mut(index).pending_removal = true;
        }
        let ids: Vec<StmtId> = self.ast.iter().collect();
        for &id in &ids {
            let stmt = self.ast.stmt(id);
            let reads = if stmt.op == Op::Set {
                &stmt.args[1..]
            } else {
                &stmt.args[..]
            };
            let used: Vec<usize> = reads
                .iter()
                .filter_map(Argument::address)
                .filter_map(|addr| self.memory.register_at(addr))
                .collect();
            for index in used {
                self.memory.get_mut(index).pending_removal = false;
            }
        }
        let mut removed = 0;
        for &id in &ids {
            let stmt = self.ast.stmt(id);
            if stmt.op != Op::Set {
                continue;
            }
            let dead = stmt.args[0]
                .address()
                .and_then(|addr| self.memory.register_at(addr))
                .map_or(false, |index| self.memory.get(index).pending_removal);
            if dead {
                self.ast.unlink(id);
                removed += 1;
            }
        }
        let ids: Vec<StmtId> = self.ast.iter().collect();
        for id in ids {
            if self.ast.stmt(id).op == Op::Set && self.overwritten(id) {
                self.ast.unlink(id);
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("removed {} dead stores", removed);
        }
    }

    fn touches(&self, args: &[Argument], cell: Address, owner: Option<usize>) -> bool {
        args.iter().filter_map(Argument::address).any(|addr| {
            addr == cell || (owner.is_some() && self.memory.register_at(addr) == owner)
        })
    }

    /// A `set` whose cell is stored again before anything can read it.
    fn overwritten(&self, id: StmtId) -> bool {
        let cell = match self.ast.stmt(id).args[0].address() {
            Some(cell) => cell,
            None => return false,
        };
        let owner = self.memory.register_at(cell);
        let mut cursor = self.ast.stmt(id).next;
        while let Some(next) = cursor {
            let stmt = self.ast.stmt(next);
            if stmt.op.is_control() {
                return false;
            }
            let stores_cell = stmt.args.first().and_then(Argument::address) == Some(cell);
            match stmt.op {
                Op::Set if stores_cell && !self.touches(&stmt.args[1..], cell, owner) => {
                    return true
                }
                Op::Read if stores_cell => return true,
                _ => {}
            }
            if self.touches(&stmt.args, cell, owner) {
                return false;
            }
            cursor = stmt.next;
        }
        false
    }
}
