mod common;
use common::*;
use regtape::lang::{ErrorCode, Stage};

#[test]
fn test_stages() {
    assert_eq!(compile_error("set a 1x").stage(), Stage::Lex);
    assert_eq!(compile_error("var a\nend").stage(), Stage::Parse);
    assert_eq!(compile_error("var a\nset b a").stage(), Stage::Semantic);
}

#[test]
fn test_messages() {
    let e = compile_error("var a b\nset b 0\ndiv a b a");
    assert_eq!(e.to_string(), "DIVISION BY ZERO IN LINE 3");
    let e = compile_error("var a\nset a 1\nset b 2");
    assert_eq!(e.to_string(), "UNDEFINED NAME IN LINE 3; B");
    let e = compile_error("var a\nwneq a 1");
    assert_eq!(e.code(), ErrorCode::MissingEnd);
    assert_eq!(e.line_number(), Some(2));
}

#[test]
fn test_scope_errors() {
    assert_eq!(code("var a\nvar A"), ErrorCode::DuplicateName);
    assert_eq!(code("msg a\nvar a"), ErrorCode::UndefinedName);
    assert_eq!(code("var a\nset a 1 2"), ErrorCode::WrongArgumentCount);
    assert_eq!(code("var a\nmsg"), ErrorCode::WrongArgumentCount);
    assert_eq!(code("var a\ncmp a 1 2"), ErrorCode::TypeMismatch);
    assert_eq!(code("var a b c\nread a\nb2a a b 1 c"), ErrorCode::TypeMismatch);
}

#[test]
fn test_no_output_on_error() {
    assert!(regtape::compile("msg \"hello\"\nvar a\nmod 1 0 a").is_err());
}

#[test]
fn test_resource_limits() {
    let mut src = String::from("var a\n");
    src.push_str(&"wneq a 0\n".repeat(1000));
    src.push_str(&"end\n".repeat(1000));
    assert_eq!(code(&src), ErrorCode::NestingTooDeep);

    let mut src = String::from("proc q0 x\ninc x 1\nend\n");
    for n in 1..30 {
        src.push_str(&format!("proc q{} x\ncall q{} x\ncall q{} x\nend\n", n, n - 1, n - 1));
    }
    src.push_str("var a\ncall q29 a");
    assert_eq!(code(&src), ErrorCode::ProgramTooLarge);
}
