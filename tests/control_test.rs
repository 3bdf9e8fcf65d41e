mod common;
use common::*;

#[test]
fn test_echo() {
    assert_eq!(exec("var a\nread a\nmsg a", b"x"), b"x");
    assert_eq!(exec("msg \"Hi\" 10", b""), b"Hi\n");
    assert_eq!(exec("var a\nread a\nmsg \"<\" a \">\"", b"q"), b"<q>");
}

#[test]
fn test_if_branches() {
    let src = "var a\nread a\n\
               ifeq a 5\nmsg \"five\"\nend\n\
               ifneq a 5\nmsg \"other\"\nend";
    assert_eq!(exec(src, &[5]), b"five");
    assert_eq!(exec(src, &[4]), b"other");
}

#[test]
fn test_if_on_constants() {
    assert_eq!(exec("ifeq 1 1\nmsg \"y\"\nend\nifeq 1 2\nmsg \"n\"\nend", b""), b"y");
    let src = "var a\nset a 3\nifneq a 3\nmsg \"n\"\nend\nmsg a";
    assert_eq!(exec(src, b""), [3]);
}

#[test]
fn test_count_down() {
    let src = "var n\nread n\nwneq n 0\nmsg n\ndec n 1\nend";
    assert_eq!(exec(src, &[4]), [4, 3, 2, 1]);
    assert_eq!(exec(src, &[0]), b"");
}

#[test]
fn test_count_up_from_constant() {
    let src = "var i c\nwneq i 5\nset c i\ninc c '0'\nmsg c\ninc i 1\nend\nmsg i";
    assert_eq!(exec(src, b""), b"01234\x05");
}

#[test]
fn test_nested_blocks() {
    let src = "var i r c\n\
               wneq i 6\n\
               mod i 2 r\n\
               ifeq r 0\n\
               set c i\n\
               inc c 48\n\
               msg c\n\
               end\n\
               inc i 1\n\
               end";
    assert_eq!(exec(src, b""), b"024");
}

#[test]
fn test_loop_reads_input() {
    let src = "var c\nread c\nwneq c '.'\nmsg c\nread c\nend\nmsg 10";
    assert_eq!(exec(src, b"abc.def"), b"abc\n");
}

#[test]
fn test_value_after_if_is_joined() {
    let src = "var a b\nread b\nifeq b 1\nset a 9\nend\ninc a 1\nmsg a";
    assert_eq!(exec(src, &[1]), [10]);
    assert_eq!(exec(src, &[0]), [1]);
}

#[test]
fn test_nested_loops() {
    let src = "var i j n\n\
               wneq i 3\n\
               set j 0\n\
               wneq j 4\n\
               inc n 1\n\
               inc j 1\n\
               end\n\
               inc i 1\n\
               end\n\
               msg n";
    assert_eq!(exec(src, b""), [12]);
}
