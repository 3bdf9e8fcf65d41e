mod common;
use common::*;

#[test]
fn test_constant_index() {
    let src = "var l[3] x\nread x\nlset l 1 x\nlget l 1 x\ninc x 1\nmsg x";
    assert_eq!(exec(src, &[41]), [42]);
    assert_eq!(exec("var l[2] x\nlset l 1 9\nlget l 1 x\nmsg x", b""), [9]);
}

#[test]
fn test_runtime_index() {
    let src = "var l[4] i v\nread i\nread v\nlset l i v\nlget l i v\ninc v 1\nmsg v";
    assert_eq!(exec(src, &[2, 42]), [43]);
    assert_eq!(exec(src, &[3, 7]), [8]);
}

#[test]
fn test_only_indexed_element_changes() {
    let src = "var l[3] i x\nread i\nlset l i 9\n\
               set i 0\nwneq i 3\nlget l i x\nmsg x\ninc i 1\nend";
    assert_eq!(exec(src, &[1]), [0, 9, 0]);
    assert_eq!(exec(src, &[2]), [0, 0, 9]);
}

#[test]
fn test_out_of_range_runtime_index() {
    let src = "var l[2] i x\nread i\nlset l i 5\nlget l i x\nmsg x";
    assert_eq!(exec(src, &[7]), [0]);
    assert_eq!(exec(src, &[1]), [5]);
}

#[test]
fn test_list_misuse() {
    use regtape::lang::ErrorCode;
    assert_eq!(code("var l[2]\nmsg l"), ErrorCode::TypeMismatch);
    assert_eq!(code("var l[2] x\nlget l 2 x"), ErrorCode::IndexOutOfRange);
    assert_eq!(code("var l[2] x\nlget x 0 l"), ErrorCode::TypeMismatch);
}

#[test]
fn test_fill_and_sum() {
    let src = "var l[5] i s v\n\
               wneq i 5\n\
               read v\n\
               lset l i v\n\
               inc i 1\n\
               end\n\
               set i 0\n\
               wneq i 5\n\
               lget l i v\n\
               add s v s\n\
               inc i 1\n\
               end\n\
               msg s";
    assert_eq!(exec(src, &[1, 2, 3, 4, 5]), [15]);
}
