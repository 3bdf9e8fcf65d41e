use super::*;

#[test]
fn test_message_reuses_work_cell() {
    let expected = format!("{}.+.[-]", "+".repeat(65));
    assert_eq!(program("msg \"AB\""), expected);
}

#[test]
fn test_read_then_write() {
    assert_eq!(program("var a\nread a\nmsg a"), ",.");
    assert_eq!(program("var a\nread a\ninc a 1\nmsg a"), ",+.");
}

#[test]
fn test_dead_store_program() {
    assert_eq!(program("var a\nset a 5\nset a 7\nmsg a"), ">>>>+++++++.[-]");
}

#[test]
fn test_short_way_round() {
    assert_eq!(program("var a\nread a\ndec a 1\nmsg a"), ",-.");
    assert_eq!(program("var a\nread a\ninc a 250\nmsg a"), ",------.");
}

#[test]
fn test_brackets_balanced() {
    let sources = [
        "var a b c\nread a\nread b\nmul a b c\nmsg c",
        "var a b q r\nread a\nread b\ndivmod a b q r\nmsg q r",
        "var a b c\nread a\nread b\ncmp a b c\nmsg c",
        "var a b c d\nread a\nb2a a b c d\nmsg b c d",
        "var a b c d\nread a\nread b\nread c\na2b a b c d\nmsg d",
        "var l[4] i v\nread i\nread v\nlset l i v\nlget l i v\nmsg v",
        "var i\nread i\nwneq i 0\nifeq i 3\nmsg \"three\"\nend\ndec i 1\nend",
        "var x\nread x\nmul x x x\nadd x x x\nmsg x",
    ];
    for src in sources.iter() {
        assert!(balanced(&program(src)), "{}", src);
    }
}

#[test]
fn test_only_tape_instructions() {
    let p = program("var a b\nread a\nread b\ndiv a b a\nmsg a \"!\"");
    assert!(p.chars().all(|c| "+-<>.,[]".contains(c)));
}

#[test]
fn test_deterministic() {
    let src = "proc sq x\nmul x x x\nend\nvar a\nread a\ncall sq a\nmsg a";
    assert_eq!(program(src), program(src));
}

#[test]
fn test_unused_declarations_emit_nothing() {
    assert_eq!(program("var a b c\nmsg 0"), ">>>>>>>>>>>>.");
}

#[test]
fn test_first_statement_sees_zeroed_tape() {
    let p = program("var a\nwneq a 3\ninc a 1\nend\nmsg a");
    assert!(!p.starts_with('['), "{}", p);
    assert!(balanced(&p));
}
