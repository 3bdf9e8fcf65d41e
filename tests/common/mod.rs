#![allow(dead_code)]

use regtape::lang::{Error, ErrorCode};

/// Tape machine session: wrapping 8-bit cells, a tape that grows to the right
/// and a fixed input buffer. Reading past the input stores 0.
pub struct Tape {
    program: Vec<u8>,
    jumps: Vec<usize>,
    cells: Vec<u8>,
    pointer: usize,
    input: Vec<u8>,
    consumed: usize,
    output: Vec<u8>,
}

impl Tape {
    pub fn new(program: &str, input: &[u8]) -> Tape {
        let program = program.as_bytes().to_vec();
        let mut jumps = vec![0; program.len()];
        let mut open = vec![];
        for (pc, op) in program.iter().enumerate() {
            match op {
                b'[' => open.push(pc),
                b']' => {
                    let start = open.pop().expect("unbalanced ]");
                    jumps[start] = pc;
                    jumps[pc] = start;
                }
                _ => {}
            }
        }
        assert!(open.is_empty(), "unbalanced [");
        Tape {
            program,
            jumps,
            cells: vec![0; 64],
            pointer: 0,
            input: input.to_vec(),
            consumed: 0,
            output: vec![],
        }
    }

    pub fn run(&mut self, limit: usize) -> &[u8] {
        let mut pc = 0;
        let mut steps = 0;
        while pc < self.program.len() {
            steps += 1;
            assert!(steps <= limit, "{} steps exceeded", limit);
            match self.program[pc] {
                b'+' => self.cells[self.pointer] = self.cells[self.pointer].wrapping_add(1),
                b'-' => self.cells[self.pointer] = self.cells[self.pointer].wrapping_sub(1),
                b'>' => {
                    self.pointer += 1;
                    if self.pointer == self.cells.len() {
                        self.cells.push(0);
                    }
                }
                b'<' => {
                    assert!(self.pointer > 0, "moved left of cell 0");
                    self.pointer -= 1;
                }
                b'.' => self.output.push(self.cells[self.pointer]),
                b',' => {
                    self.cells[self.pointer] = self.input.get(self.consumed).copied().unwrap_or(0);
                    self.consumed += 1;
                }
                b'[' if self.cells[self.pointer] == 0 => pc = self.jumps[pc],
                b']' if self.cells[self.pointer] != 0 => pc = self.jumps[pc],
                _ => {}
            }
            pc += 1;
        }
        &self.output
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

pub fn exec(source: &str, input: &[u8]) -> Vec<u8> {
    exec_tape(source, input).0
}

/// Output and the final tape.
pub fn exec_tape(source: &str, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let program = regtape::compile(source).unwrap();
    let mut tape = Tape::new(&program, input);
    let output = tape.run(10_000_000).to_vec();
    (output, tape.cells().to_vec())
}

pub fn compile_error(source: &str) -> Error {
    regtape::compile(source).unwrap_err()
}

pub fn code(source: &str) -> ErrorCode {
    compile_error(source).code()
}
