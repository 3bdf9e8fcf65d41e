use crate::lang::ErrorCode;
use crate::Compiler;

mod codegen_test;

/// Surviving statements as listed, without line numbers or the register map.
fn listed(source: &str) -> Vec<String> {
    let compiler = Compiler::new(source).unwrap();
    compiler
        .listing()
        .to_string()
        .lines()
        .filter(|line| !line.starts_with(';'))
        .map(|line| line.split_whitespace().skip(1).collect::<Vec<_>>().join(" "))
        .collect()
}

fn program(source: &str) -> String {
    crate::compile(source).unwrap()
}

fn error(source: &str) -> ErrorCode {
    Compiler::new(source).unwrap_err().code()
}

fn balanced(program: &str) -> bool {
    let mut depth = 0i64;
    for c in program.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}
