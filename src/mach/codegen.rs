use super::emit::{Emitter, Sign};
use super::memory::Memory;
use super::{Address, Stack};
use crate::error;
use crate::lang::ast::{Argument, Ast, Op, Statement, MAX_BLOCK_DEPTH};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// Cells of the work area placed after the last register.
pub const WORK_CELLS: usize = 11;

/// Lower the optimized main chain to tape instructions.
///
/// The work area `W0..W10` starts at [`Memory::next_free`], followed by one
/// control cell per block nesting level. Every lowering leaves the work area,
/// the control cells and all scratch cells zeroed.
pub fn generate(ast: &Ast, memory: &Memory) -> Result<String> {
    let mut generator = Generator {
        ast,
        memory,
        emit: Emitter::new(),
        work: memory.next_free(),
        blocks: Stack::new("BLOCKS NESTED TOO DEEPLY", MAX_BLOCK_DEPTH),
    };
    for id in ast.iter() {
        let stmt = ast.stmt(id);
        generator
            .statement(stmt)
            .map_err(|e| e.in_line_number(Some(stmt.line)))?;
    }
    if !generator.blocks.is_empty() {
        return Err(error!(InternalError; "UNCLOSED BLOCK"));
    }
    let program = generator.emit.finish();
    log::debug!("generated {} instructions", program.len());
    Ok(program)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Val {
    Lit(u8),
    Cell(Address),
}

fn val(args: &[Argument], index: usize) -> Result<Val> {
    match args.get(index) {
        Some(Argument::Number(n)) => Ok(Val::Lit(*n)),
        Some(Argument::Address(addr)) => Ok(Val::Cell(*addr)),
        Some(arg) => Err(error!(InternalError; format!("UNRESOLVED ARGUMENT {}", arg))),
        None => Err(error!(InternalError; "MISSING ARGUMENT")),
    }
}

fn cell(args: &[Argument], index: usize) -> Result<Address> {
    match val(args, index)? {
        Val::Cell(addr) => Ok(addr),
        Val::Lit(_) => Err(error!(InternalError; "EXPECTED ADDRESS")),
    }
}

struct Generator<'a> {
    ast: &'a Ast,
    memory: &'a Memory,
    emit: Emitter,
    work: Address,
    blocks: Stack<Address>,
}

impl<'a> Generator<'a> {
    fn w(&self, index: usize) -> Address {
        debug_assert!(index < WORK_CELLS);
        self.work + index
    }

    /// Zeroed cell for restoring a copy of `addr`.
    fn temp(&self, addr: Address) -> Address {
        self.memory.scratch(addr).unwrap_or_else(|| self.w(7))
    }

    fn scratch3(&self, addr: Address) -> [Address; 3] {
        match self.memory.scratch(addr) {
            Some(s) => [s, s + 1, s + 2],
            None => [self.w(8), self.w(9), self.w(10)],
        }
    }

    fn copy_via(&mut self, src: Address, dsts: &[(Address, u8)], tmp: Address) {
        let mut with_tmp = dsts.to_vec();
        with_tmp.push((tmp, 1));
        self.emit.distribute_scaled(src, &with_tmp);
        self.emit.distribute(tmp, &[(src, Sign::Plus)]);
    }

    /// Add `value * delta` to each destination, leaving a source cell intact.
    fn load(&mut self, value: Val, dsts: &[(Address, u8)]) {
        match value {
            Val::Lit(n) => {
                for &(dst, delta) in dsts {
                    self.emit.add(dst, n.wrapping_mul(delta));
                }
            }
            Val::Cell(src) => {
                let tmp = self.temp(src);
                self.copy_via(src, dsts, tmp);
            }
        }
    }

    fn move_to(&mut self, src: Address, dst: Address) {
        self.emit.clear(dst);
        self.emit.distribute(src, &[(dst, Sign::Plus)]);
    }

    /// Open a loop at `counter` that takes one unit off it per pass.
    ///
    /// With a 0/1 flag as the counter the body runs at most once.
    fn open_countdown(&mut self, counter: Address) {
        self.emit.open(counter);
        self.emit.add(counter, 255);
    }

    /// Set the zeroed `flag` to 1 when `a == b` matches `equal`.
    fn condition(&mut self, a: Val, b: Val, flag: Address, equal: bool) {
        if let (Val::Lit(x), Val::Lit(y)) = (a, b) {
            if (x == y) == equal {
                self.emit.add(flag, 1);
            }
            return;
        }
        let diff = self.w(0);
        self.load(a, &[(diff, 1)]);
        self.load(b, &[(diff, 255)]);
        if equal {
            self.emit.add(flag, 1);
        }
        self.emit.open(diff);
        self.emit.clear(diff);
        self.emit.add(flag, if equal { 255 } else { 1 });
        self.emit.close(diff);
    }

    /// Set W5 to 1 when `addr` holds `value`.
    fn test_equal(&mut self, addr: Address, value: u8) {
        let (test, flag, tmp) = (self.w(4), self.w(5), self.w(6));
        self.copy_via(addr, &[(test, 1)], tmp);
        self.emit.add(test, value.wrapping_neg());
        self.emit.add(flag, 1);
        self.emit.open(test);
        self.emit.clear(test);
        self.emit.add(flag, 255);
        self.emit.close(test);
    }

    fn statement(&mut self, stmt: &Statement) -> Result<()> {
        let args = &stmt.args[..];
        match stmt.op {
            Op::Set => {
                let d = cell(args, 0)?;
                match val(args, 1)? {
                    Val::Lit(n) => self.emit.set(d, n),
                    Val::Cell(s) => {
                        self.emit.clear(d);
                        self.load(Val::Cell(s), &[(d, 1)]);
                    }
                }
            }
            Op::Inc | Op::Dec => {
                let d = cell(args, 0)?;
                let delta = if stmt.op == Op::Inc { 1 } else { 255 };
                match val(args, 1)? {
                    Val::Cell(s) if s == d => {
                        if stmt.op == Op::Inc {
                            self.double(d);
                        } else {
                            self.emit.clear(d);
                        }
                    }
                    value => self.load(value, &[(d, delta)]),
                }
            }
            Op::Add | Op::Sub => {
                let (a, b, d) = (val(args, 0)?, val(args, 1)?, cell(args, 2)?);
                let delta = if stmt.op == Op::Add { 1 } else { 255 };
                if a == Val::Cell(d) || b == Val::Cell(d) {
                    let acc = self.w(1);
                    self.load(a, &[(acc, 1)]);
                    self.load(b, &[(acc, delta)]);
                    self.move_to(acc, d);
                } else {
                    self.emit.clear(d);
                    self.load(a, &[(d, 1)]);
                    self.load(b, &[(d, delta)]);
                }
            }
            Op::Mul => {
                let (a, b, d) = (val(args, 0)?, val(args, 1)?, cell(args, 2)?);
                self.multiply(a, b, d);
            }
            Op::Double => self.double(cell(args, 0)?),
            Op::Square => self.square(cell(args, 0)?),
            Op::Duplicate => {
                let (x, y) = (cell(args, 0)?, val(args, 1)?);
                self.duplicate(x, y);
            }
            Op::Div | Op::Mod | Op::DivMod => {
                let (n, divisor) = (val(args, 0)?, val(args, 1)?);
                let (q, r) = match stmt.op {
                    Op::Div => (Some(cell(args, 2)?), None),
                    Op::Mod => (None, Some(cell(args, 2)?)),
                    _ => (Some(cell(args, 2)?), Some(cell(args, 3)?)),
                };
                let (w0, w2, w3) = (self.w(0), self.w(2), self.w(3));
                self.load(n, &[(w0, 1)]);
                self.divide(divisor);
                match q {
                    Some(q) => self.move_to(w2, q),
                    None => self.emit.clear(w2),
                }
                match r {
                    Some(r) => self.move_to(w3, r),
                    None => self.emit.clear(w3),
                }
            }
            Op::Cmp => {
                let (a, b, d) = (val(args, 0)?, val(args, 1)?, cell(args, 2)?);
                self.compare(a, b, d);
            }
            Op::A2b => {
                let acc = self.w(0);
                self.load(val(args, 0)?, &[(acc, 100)]);
                self.load(val(args, 1)?, &[(acc, 10)]);
                self.load(val(args, 2)?, &[(acc, 1)]);
                self.emit.add(acc, 48);
                self.move_to(acc, cell(args, 3)?);
            }
            Op::B2a => {
                let dests = [cell(args, 1)?, cell(args, 2)?, cell(args, 3)?];
                self.b2a(val(args, 0)?, dests);
            }
            Op::LSet => {
                let (base, index, value) = (cell(args, 0)?, val(args, 1)?, val(args, 2)?);
                let size = self.list_size(base)?;
                let (idx, flag) = (self.w(8), self.w(5));
                self.load(index, &[(idx, 1)]);
                for j in 0..size {
                    self.test_equal(idx, j);
                    self.open_countdown(flag);
                    self.emit.clear(base + j as usize);
                    self.load(value, &[(base + j as usize, 1)]);
                    self.emit.close(flag);
                }
                self.emit.clear(idx);
            }
            Op::LGet => {
                let (base, index, d) = (cell(args, 0)?, val(args, 1)?, cell(args, 2)?);
                let size = self.list_size(base)?;
                let (idx, acc, flag) = (self.w(8), self.w(9), self.w(5));
                self.load(index, &[(idx, 1)]);
                for j in 0..size {
                    self.test_equal(idx, j);
                    self.open_countdown(flag);
                    self.load(Val::Cell(base + j as usize), &[(acc, 1)]);
                    self.emit.close(flag);
                }
                self.emit.clear(idx);
                self.move_to(acc, d);
            }
            Op::Read => self.emit.input(cell(args, 0)?),
            Op::Msg => self.message(args)?,
            Op::IfEq | Op::IfNeq | Op::WNeq => {
                let flag = self.work + WORK_CELLS + self.blocks.len();
                let (a, b) = (val(args, 0)?, val(args, 1)?);
                self.condition(a, b, flag, stmt.op == Op::IfEq);
                self.open_countdown(flag);
                self.blocks.push(flag)?;
            }
            Op::End => {
                let flag = self.blocks.pop()?;
                if let Some(opener) = stmt.jump {
                    let opener = &self.ast.stmt(opener).args;
                    let (a, b) = (val(opener, 0)?, val(opener, 1)?);
                    self.condition(a, b, flag, false);
                }
                self.emit.close(flag);
            }
            Op::Var | Op::Proc | Op::Call => {
                return Err(error!(InternalError; format!("UNEXPECTED {}", stmt.op)));
            }
        }
        Ok(())
    }

    fn list_size(&self, base: Address) -> Result<u8> {
        let register = self.memory.register_at(base).map(|i| self.memory.get(i));
        match register {
            Some(register) if !register.is_scalar() && register.base == base => {
                Ok(register.cells() as u8)
            }
            _ => Err(error!(InternalError; "EXPECTED LIST ADDRESS")),
        }
    }

    fn double(&mut self, x: Address) {
        let t = self.scratch3(x)[0];
        self.emit.distribute_scaled(x, &[(t, 2)]);
        self.emit.distribute(t, &[(x, Sign::Plus)]);
    }

    fn square(&mut self, x: Address) {
        let [s1, s2, s3] = self.scratch3(x);
        self.emit.distribute(x, &[(s1, Sign::Plus), (s2, Sign::Plus)]);
        self.open_countdown(s2);
        self.emit.distribute(s1, &[(x, Sign::Plus), (s3, Sign::Plus)]);
        self.emit.distribute(s3, &[(s1, Sign::Plus)]);
        self.emit.close(s2);
        self.emit.clear(s1);
    }

    fn duplicate(&mut self, x: Address, y: Val) {
        let t = self.scratch3(x)[0];
        self.emit.distribute(x, &[(t, Sign::Plus)]);
        self.open_countdown(t);
        self.load(y, &[(x, 1)]);
        self.emit.close(t);
    }

    fn multiply(&mut self, a: Val, b: Val, d: Address) {
        let aliased = a == Val::Cell(d) || b == Val::Cell(d);
        let acc = if aliased { self.w(1) } else { d };
        if !aliased {
            self.emit.clear(d);
        }
        match (a, b) {
            (Val::Lit(n), other) | (other, Val::Lit(n)) => self.load(other, &[(acc, n)]),
            (Val::Cell(_), Val::Cell(_)) => {
                let counter = self.w(0);
                self.load(a, &[(counter, 1)]);
                self.open_countdown(counter);
                self.load(b, &[(acc, 1)]);
                self.emit.close(counter);
            }
        }
        if aliased {
            self.move_to(acc, d);
        }
    }

    /// Divide W0 by `divisor` into quotient W2 and remainder W3, consuming W0.
    ///
    /// A zero divisor never matches the remainder counter, giving quotient 0
    /// and remainder equal to the dividend.
    fn divide(&mut self, divisor: Val) {
        let (n, d, q, r) = (self.w(0), self.w(1), self.w(2), self.w(3));
        let (diff, flag, tmp) = (self.w(4), self.w(5), self.w(6));
        self.load(divisor, &[(d, 1)]);
        self.open_countdown(n);
        self.emit.add(r, 1);
        self.copy_via(d, &[(diff, 1)], tmp);
        self.copy_via(r, &[(diff, 255)], tmp);
        self.emit.add(flag, 1);
        self.emit.open(diff);
        self.emit.clear(diff);
        self.emit.add(flag, 255);
        self.emit.close(diff);
        self.open_countdown(flag);
        self.emit.clear(r);
        self.emit.add(q, 1);
        self.emit.close(flag);
        self.emit.close(n);
        self.emit.clear(d);
    }

    /// D = 1 when a > b, 255 when a < b, 0 when equal.
    fn compare(&mut self, a: Val, b: Val, d: Address) {
        let (x, y, gt) = (self.w(0), self.w(1), self.w(3));
        let (test, flag, tmp) = (self.w(4), self.w(5), self.w(6));
        self.load(a, &[(x, 1)]);
        self.load(b, &[(y, 1)]);
        self.open_countdown(x);
        self.emit.add(flag, 1);
        self.copy_via(y, &[(test, 1)], tmp);
        self.emit.open(test);
        self.emit.clear(test);
        self.emit.add(y, 255);
        self.emit.add(flag, 255);
        self.emit.close(test);
        self.open_countdown(flag);
        self.emit.clear(gt);
        self.emit.add(gt, 1);
        self.emit.close(flag);
        self.emit.close(x);
        self.emit.clear(d);
        self.emit.distribute(gt, &[(d, Sign::Plus)]);
        self.emit.open(y);
        self.emit.clear(y);
        self.emit.add(d, 255);
        self.emit.close(y);
    }

    fn b2a(&mut self, a: Val, dests: [Address; 3]) {
        let (w0, w2, w3) = (self.w(0), self.w(2), self.w(3));
        let digits = [self.w(8), self.w(9), self.w(10)];
        self.load(a, &[(w0, 1)]);
        self.divide(Val::Lit(10));
        self.emit.distribute(w3, &[(digits[2], Sign::Plus)]);
        self.emit.distribute(w2, &[(w0, Sign::Plus)]);
        self.divide(Val::Lit(10));
        self.emit.distribute(w3, &[(digits[1], Sign::Plus)]);
        self.emit.distribute(w2, &[(digits[0], Sign::Plus)]);
        for (&digit, &dest) in digits.iter().zip(dests.iter()) {
            self.emit.set(dest, b'0');
            self.emit.distribute(digit, &[(dest, Sign::Plus)]);
        }
    }

    fn message(&mut self, args: &[Argument]) -> Result<()> {
        let w0 = self.w(0);
        let mut current = 0u8;
        for arg in args {
            match arg {
                Argument::Str(bytes) => {
                    for &byte in bytes.iter() {
                        self.emit.add(w0, byte.wrapping_sub(current));
                        self.emit.output(w0);
                        current = byte;
                    }
                }
                Argument::Number(n) => {
                    self.emit.add(w0, n.wrapping_sub(current));
                    self.emit.output(w0);
                    current = *n;
                }
                Argument::Address(addr) => self.emit.output(*addr),
                _ => return Err(error!(InternalError; format!("UNRESOLVED ARGUMENT {}", arg))),
            }
        }
        if current != 0 {
            self.emit.clear(w0);
        }
        Ok(())
    }
}
