mod common;
use common::*;

#[test]
fn test_folded_constants() {
    assert_eq!(exec("var a b c\nset a 10\nset b 20\nadd a b c\nmsg c", b""), [30]);
    assert_eq!(exec("var a\nset a 5\nset a 7\nmsg a", b""), [7]);
    assert_eq!(exec("var a\nset a 'A'\nmsg a", b""), [65]);
    assert_eq!(exec("var a\nset a 250\ninc a 10\nmsg a", b""), [4]);
}

#[test]
fn test_runtime_arithmetic() {
    let src = "var a b c\nread a\nread b\n\
               add a b c\nmsg c\n\
               sub a b c\nmsg c\n\
               mul a b c\nmsg c\n\
               div a b c\nmsg c\n\
               mod a b c\nmsg c";
    assert_eq!(exec(src, &[7, 3]), [10, 4, 21, 2, 1]);
    assert_eq!(exec(src, &[3, 7]), [10, 252, 21, 0, 3]);
    assert_eq!(exec(src, &[200, 100]), [44, 100, 32, 2, 0]);
}

#[test]
fn test_literal_operands() {
    let src = "var a c\nread a\n\
               add a 5 c\nmsg c\n\
               sub 5 a c\nmsg c\n\
               mul 3 a c\nmsg c\n\
               div a 4 c\nmsg c\n\
               mod 100 a c\nmsg c";
    assert_eq!(exec(src, &[9]), [14, 252, 27, 2, 1]);
}

#[test]
fn test_in_place_updates() {
    let src = "var x y\nread x\nread y\n\
               add x y x\nmsg x\n\
               add y x x\nmsg x\n\
               sub x y x\nmsg x\n\
               sub y x x\nmsg x";
    assert_eq!(exec(src, &[5, 3]), [8, 11, 8, 251]);
}

#[test]
fn test_double_square_duplicate() {
    let src = "var x y\nread x\nread y\n\
               add x x x\nmsg x\n\
               mul x x x\nmsg x\n\
               mul x y x\nmsg x\n\
               inc x x\nmsg x\n\
               dec x x\nmsg x";
    assert_eq!(exec(src, &[3, 2]), [6, 36, 72, 144, 0]);
}

#[test]
fn test_divmod() {
    let src = "var a b q r\nread a\nread b\ndivmod a b q r\nmsg q r";
    assert_eq!(exec(src, &[79, 13]), [6, 1]);
    assert_eq!(exec(src, &[255, 1]), [255, 0]);
    assert_eq!(exec(src, &[4, 9]), [0, 4]);
    assert_eq!(exec("var q r\ndivmod 79 13 q r\nmsg q r", b""), [6, 1]);
}

#[test]
fn test_runtime_zero_divisor() {
    let src = "var a b q r\nread a\nread b\ndivmod a b q r\nmsg q r";
    assert_eq!(exec(src, &[9, 0]), [0, 9]);
}

#[test]
fn test_divisor_aliases_destination() {
    let src = "var a b\nread a\nread b\ndiv a b b\nmsg b\nmod a b a\nmsg a";
    assert_eq!(exec(src, &[17, 5]), [3, 2]);
}

#[test]
fn test_compare() {
    let src = "var a b c\nread a\nread b\ncmp a b c\nmsg c";
    assert_eq!(exec(src, &[2, 5]), [255]);
    assert_eq!(exec(src, &[5, 2]), [1]);
    assert_eq!(exec(src, &[4, 4]), [0]);
    assert_eq!(exec(src, &[0, 0]), [0]);
    assert_eq!(exec(src, &[0, 255]), [255]);
    assert_eq!(exec(src, &[255, 0]), [1]);
}

#[test]
fn test_decimal_conversion() {
    let src = "var a b c d\nread a\nread b\nread c\na2b a b c d\nmsg d";
    assert_eq!(exec(src, b"123"), [123]);
    assert_eq!(exec(src, b"007"), [7]);
    let src = "var a b c d\nread a\nb2a a b c d\nmsg b c d";
    assert_eq!(exec(src, &[207]), b"207");
    assert_eq!(exec(src, &[5]), b"005");
    assert_eq!(exec(src, &[255]), b"255");
}

#[test]
fn test_wrapping_input() {
    assert_eq!(exec("var a\nread a\ndec a 1\nmsg a", &[0]), [255]);
    assert_eq!(exec("var a\nread a\ninc a 1\nmsg a", &[255]), [0]);
}

#[test]
fn test_work_area_left_clear() {
    let src = "var a b q r\nread a\nread b\ndivmod a b q r\ncmp a b a\nmul q r b\nmsg q r";
    let (output, cells) = exec_tape(src, &[100, 7]);
    assert_eq!(output, [14, 2]);
    for (addr, value) in cells.iter().enumerate() {
        if ![0, 4, 8, 12].contains(&addr) {
            assert_eq!(*value, 0, "cell {}", addr);
        }
    }
    assert_eq!(cells[0], 1);
    assert_eq!(cells[4], 28);
}
