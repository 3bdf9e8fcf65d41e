use std::collections::HashMap;

thread_local!(
    static STRING_TO_WORD: HashMap<&'static str, Word> =
        Word::ALL.iter().map(|w| (w.as_str(), *w)).collect();
);

/// Lexical categories. Payload bytes for `ProcName`, `Label`, `Str` and `Num`
/// live in the side tables of [`Lexed`](super::Lexed), in emission order.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token {
    Eol,
    Word(Word),
    ProcName,
    Label,
    Str,
    Num,
    OpenBracket,
    CloseBracket,
}

impl Token {
    pub fn has_payload(&self) -> bool {
        matches!(self, Token::ProcName | Token::Label | Token::Str | Token::Num)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Eol => write!(f, "EOL"),
            Word(w) => write!(f, "{}", w),
            ProcName => write!(f, "PROC_NAME"),
            Label => write!(f, "LABEL"),
            Str => write!(f, "STR"),
            Num => write!(f, "NUM"),
            OpenBracket => write!(f, "["),
            CloseBracket => write!(f, "]"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Word {
    Var,
    Set,
    Inc,
    Dec,
    Add,
    Sub,
    Mul,
    DivMod,
    Div,
    Mod,
    Cmp,
    A2b,
    B2a,
    LSet,
    LGet,
    IfEq,
    IfNeq,
    WNeq,
    Proc,
    End,
    Call,
    Read,
    Msg,
    Rem,
}

impl Word {
    pub const ALL: [Word; 24] = [
        Word::Var,
        Word::Set,
        Word::Inc,
        Word::Dec,
        Word::Add,
        Word::Sub,
        Word::Mul,
        Word::DivMod,
        Word::Div,
        Word::Mod,
        Word::Cmp,
        Word::A2b,
        Word::B2a,
        Word::LSet,
        Word::LGet,
        Word::IfEq,
        Word::IfNeq,
        Word::WNeq,
        Word::Proc,
        Word::End,
        Word::Call,
        Word::Read,
        Word::Msg,
        Word::Rem,
    ];

    /// Case-insensitive keyword lookup.
    pub fn from_string(s: &str) -> Option<Word> {
        let s = s.to_ascii_lowercase();
        STRING_TO_WORD.with(|stw| stw.get(s.as_str()).copied())
    }

    pub fn as_str(&self) -> &'static str {
        use Word::*;
        match self {
            Var => "var",
            Set => "set",
            Inc => "inc",
            Dec => "dec",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            DivMod => "divmod",
            Div => "div",
            Mod => "mod",
            Cmp => "cmp",
            A2b => "a2b",
            B2a => "b2a",
            LSet => "lset",
            LGet => "lget",
            IfEq => "ifeq",
            IfNeq => "ifneq",
            WNeq => "wneq",
            Proc => "proc",
            End => "end",
            Call => "call",
            Read => "read",
            Msg => "msg",
            Rem => "rem",
        }
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_ascii_uppercase())
    }
}
