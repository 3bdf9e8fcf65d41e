//! # regtape
//!
//! Compile a register language source file to a tape machine program.
//!

mod term;

fn main() {
    env_logger::init();
    term::main()
}
