use super::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn delta(self) -> u8 {
        match self {
            Sign::Plus => 1,
            Sign::Minus => 255,
        }
    }
}

/// ## Tape instruction writer
///
/// Tracks the cursor so that moves are emitted as one run of `>` or `<`.

#[derive(Debug, Default)]
pub struct Emitter {
    out: String,
    cursor: Address,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter::default()
    }

    pub fn cursor(&self) -> Address {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn finish(self) -> String {
        self.out
    }

    pub fn goto(&mut self, addr: Address) {
        if addr > self.cursor {
            self.repeat('>', addr - self.cursor);
        } else {
            self.repeat('<', self.cursor - addr);
        }
        self.cursor = addr;
    }

    fn repeat(&mut self, c: char, n: usize) {
        self.out.extend(std::iter::repeat(c).take(n));
    }

    /// True when the cell under the cursor is provably zero: nothing has been
    /// emitted yet, or a loop just closed on it.
    pub fn at_zero(&self) -> bool {
        self.out.is_empty() || self.out.ends_with(']') || self.out.ends_with("].")
    }

    /// Add `delta` modulo 256 using the shorter of `+` and `-`.
    pub fn add(&mut self, addr: Address, delta: u8) {
        if delta == 0 {
            return;
        }
        self.goto(addr);
        if delta <= 128 {
            self.repeat('+', delta as usize);
        } else {
            self.repeat('-', 256 - delta as usize);
        }
    }

    pub fn clear(&mut self, addr: Address) {
        self.goto(addr);
        if !self.at_zero() {
            self.out.push_str("[-]");
        }
    }

    pub fn set(&mut self, addr: Address, value: u8) {
        self.clear(addr);
        self.add(addr, value);
    }

    pub fn open(&mut self, addr: Address) {
        self.goto(addr);
        self.out.push('[');
    }

    pub fn close(&mut self, addr: Address) {
        self.goto(addr);
        self.out.push(']');
    }

    pub fn input(&mut self, addr: Address) {
        self.goto(addr);
        self.out.push(',');
    }

    pub fn output(&mut self, addr: Address) {
        self.goto(addr);
        self.out.push('.');
    }

    /// Drain `src` into each destination with the given sign.
    pub fn distribute(&mut self, src: Address, dsts: &[(Address, Sign)]) {
        let scaled: Vec<(Address, u8)> = dsts.iter().map(|&(a, s)| (a, s.delta())).collect();
        self.distribute_scaled(src, &scaled);
    }

    /// Drain `src`, adding `delta` to each destination per unit.
    pub fn distribute_scaled(&mut self, src: Address, dsts: &[(Address, u8)]) {
        debug_assert!(dsts.iter().all(|&(a, _)| a != src));
        self.goto(src);
        if self.at_zero() {
            return;
        }
        self.out.push_str("[-");
        for &(dst, delta) in dsts {
            self.add(dst, delta);
        }
        self.close(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goto() {
        let mut e = Emitter::new();
        e.goto(3);
        e.goto(1);
        assert_eq!(e.finish(), ">>><<");
    }

    #[test]
    fn test_add_wraps_short_way() {
        let mut e = Emitter::new();
        e.add(0, 3);
        e.add(0, 254);
        assert_eq!(e.finish(), "+++--");
    }

    #[test]
    fn test_clear_after_loop_elided() {
        let mut e = Emitter::new();
        e.add(0, 2);
        e.distribute(0, &[(1, Sign::Plus), (2, Sign::Minus)]);
        e.clear(0);
        e.output(0);
        e.clear(0);
        assert_eq!(e.finish(), "++[->+>-<<].");
    }

    #[test]
    fn test_clear_after_move_emitted() {
        let mut e = Emitter::new();
        e.add(0, 1);
        e.distribute(0, &[(1, Sign::Plus)]);
        e.clear(1);
        assert_eq!(e.finish(), "+[->+<]>[-]");
    }

    #[test]
    fn test_tape_starts_zeroed() {
        let mut e = Emitter::new();
        e.clear(0);
        e.distribute(0, &[(1, Sign::Plus)]);
        e.set(0, 2);
        assert_eq!(e.finish(), "++");
    }

    #[test]
    fn test_distribute_scaled() {
        let mut e = Emitter::new();
        e.distribute_scaled(1, &[(0, 3)]);
        assert_eq!(e.finish(), ">[-<+++>]");
    }
}
