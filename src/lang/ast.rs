use super::{token::Word, Error};
use crate::error;
use std::rc::Rc;

/// Deepest allowed nesting of `ifeq`/`ifneq`/`wneq` blocks.
pub const MAX_BLOCK_DEPTH: usize = 255;

type Result<T> = std::result::Result<T, Error>;

pub type Address = usize;
pub type StmtId = usize;

/// One operand of a statement, tagged by its role.
#[derive(Debug, PartialEq, Clone)]
pub enum Argument {
    Number(u8),
    Str(Rc<[u8]>),
    Variable(Rc<str>),
    List(Rc<str>, u8),
    Procedure(Rc<str>),
    /// Memory slot bound by the optimizer.
    Address(Address),
}

impl Argument {
    pub fn name(&self) -> Option<&Rc<str>> {
        match self {
            Argument::Variable(name) | Argument::List(name, _) | Argument::Procedure(name) => {
                Some(name)
            }
            _ => None,
        }
    }

    pub fn address(&self) -> Option<Address> {
        match self {
            Argument::Address(addr) => Some(*addr),
            _ => None,
        }
    }
}

impl std::fmt::Display for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Argument::*;
        match self {
            Number(n) => write!(f, "{}", n),
            Str(s) => write!(f, "{:?}", String::from_utf8_lossy(s)),
            Variable(name) | Procedure(name) => write!(f, "{}", name),
            List(name, size) => write!(f, "{}[{}]", name, size),
            Address(addr) => write!(f, "@{}", addr),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Op {
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
    Double,
    Square,
    Duplicate,
}

impl Op {
    pub fn for_word(word: Word) -> Option<Op> {
        Some(match word {
            Word::Var => Op::Var,
            Word::Set => Op::Set,
            Word::Inc => Op::Inc,
            Word::Dec => Op::Dec,
            Word::Add => Op::Add,
            Word::Sub => Op::Sub,
            Word::Mul => Op::Mul,
            Word::DivMod => Op::DivMod,
            Word::Div => Op::Div,
            Word::Mod => Op::Mod,
            Word::Cmp => Op::Cmp,
            Word::A2b => Op::A2b,
            Word::B2a => Op::B2a,
            Word::LSet => Op::LSet,
            Word::LGet => Op::LGet,
            Word::IfEq => Op::IfEq,
            Word::IfNeq => Op::IfNeq,
            Word::WNeq => Op::WNeq,
            Word::Proc => Op::Proc,
            Word::End => Op::End,
            Word::Call => Op::Call,
            Word::Read => Op::Read,
            Word::Msg => Op::Msg,
            Word::Rem => return None,
        })
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Op::IfEq | Op::IfNeq | Op::WNeq)
    }

    pub fn is_control(&self) -> bool {
        self.is_block() || *self == Op::End
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Op::*;
        let s = match self {
            Var => "VAR",
            Set => "SET",
            Inc => "INC",
            Dec => "DEC",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            DivMod => "DIVMOD",
            Div => "DIV",
            Mod => "MOD",
            Cmp => "CMP",
            A2b => "A2B",
            B2a => "B2A",
            LSet => "LSET",
            LGet => "LGET",
            IfEq => "IFEQ",
            IfNeq => "IFNEQ",
            WNeq => "WNEQ",
            Proc => "PROC",
            End => "END",
            Call => "CALL",
            Read => "READ",
            Msg => "MSG",
            Double => "DOUBLE",
            Square => "SQUARE",
            Duplicate => "DUPLICATE",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Statement {
    pub op: Op,
    pub args: Vec<Argument>,
    pub line: usize,
    pub prev: Option<StmtId>,
    pub next: Option<StmtId>,
    pub jump: Option<StmtId>,
}

impl Statement {
    pub fn new(op: Op, args: Vec<Argument>, line: usize) -> Statement {
        Statement {
            op,
            args,
            line,
            prev: None,
            next: None,
            jump: None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Procedure {
    pub name: Rc<str>,
    pub params: Vec<Rc<str>>,
    pub entry: Option<StmtId>,
    pub line: usize,
}

/// Statement arena plus the main chain head and the procedure table.
///
/// `prev`, `next` and `jump` are indices into `stmts`. Nodes are never
/// removed from the arena, only unlinked, so an index stays valid for
/// the life of the `Ast`.
#[derive(Debug, Default, Clone)]
pub struct Ast {
    stmts: Vec<Statement>,
    head: Option<StmtId>,
    procs: Vec<Procedure>,
}

impl Ast {
    pub fn head(&self) -> Option<StmtId> {
        self.head
    }

    pub fn stmt(&self, id: StmtId) -> &Statement {
        &self.stmts[id]
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Statement {
        &mut self.stmts[id]
    }

    pub fn procedures(&self) -> &[Procedure] {
        &self.procs
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procs.iter().find(|p| &*p.name == name)
    }

    /// Statement ids of a chain, following `next` from `first`.
    pub fn chain(&self, first: Option<StmtId>) -> Chain<'_> {
        Chain {
            ast: self,
            cursor: first,
        }
    }

    /// Statement ids of the main chain.
    pub fn iter(&self) -> Chain<'_> {
        self.chain(self.head)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Append a detached statement to the arena.
    pub fn push(&mut self, stmt: Statement) -> StmtId {
        self.stmts.push(stmt);
        self.stmts.len() - 1
    }

    /// Link a detached statement into the chain right after `at`.
    pub fn insert_after(&mut self, at: StmtId, stmt: Statement) -> StmtId {
        let id = self.push(stmt);
        let next = self.stmts[at].next;
        self.stmts[id].prev = Some(at);
        self.stmts[id].next = next;
        self.stmts[at].next = Some(id);
        if let Some(next) = next {
            self.stmts[next].prev = Some(id);
        }
        id
    }

    /// Splice the linked run `first..=last` into the place of `at`, which is unlinked.
    pub fn replace_with_run(&mut self, at: StmtId, run: Option<(StmtId, StmtId)>) {
        let prev = self.stmts[at].prev;
        let next = self.stmts[at].next;
        let (left, right) = match run {
            Some((first, last)) => {
                self.stmts[first].prev = prev;
                self.stmts[last].next = next;
                (Some(first), Some(last))
            }
            None => (next, prev),
        };
        match prev {
            Some(prev) => self.stmts[prev].next = left,
            None => self.head = left,
        }
        if let Some(next) = next {
            self.stmts[next].prev = right;
        }
        self.stmts[at].prev = None;
        self.stmts[at].next = None;
    }

    /// Remove a statement from the chain, retargeting the head if needed.
    pub fn unlink(&mut self, id: StmtId) {
        debug_assert!(self.stmts.iter().all(|s| s.jump != Some(id)));
        self.replace_with_run(id, None);
        self.stmts[id].jump = None;
    }

    fn link(&mut self, seq: &[StmtId]) {
        for pair in seq.windows(2) {
            self.stmts[pair[0]].next = Some(pair[1]);
            self.stmts[pair[1]].prev = Some(pair[0]);
        }
    }
}

pub struct Chain<'a> {
    ast: &'a Ast,
    cursor: Option<StmtId>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = StmtId;

    fn next(&mut self) -> Option<StmtId> {
        let id = self.cursor?;
        self.cursor = self.ast.stmts[id].next;
        Some(id)
    }
}

/// Link a flat statement list into an [`Ast`].
pub fn build(stmts: Vec<Statement>) -> Result<Ast> {
    let mut ast = Ast {
        stmts,
        head: None,
        procs: vec![],
    };
    let mut main: Vec<StmtId> = vec![];
    let mut index = 0;
    while index < ast.stmts.len() {
        let stmt = &ast.stmts[index];
        index = match stmt.op {
            Op::Proc => procedure(&mut ast, index)?,
            Op::End => return Err(error!(UnexpectedEnd, Some(stmt.line))),
            Op::IfEq | Op::IfNeq | Op::WNeq => block(&mut ast, index, &mut main, false, 1)?,
            _ => {
                main.push(index);
                index + 1
            }
        };
    }
    ast.link(&main);
    ast.head = main.first().copied();
    if ast.head.is_none() {
        return Err(error!(EmptyProgram; "NO STATEMENTS OUTSIDE PROCEDURES"));
    }
    log::debug!(
        "built {} main statements and {} procedures",
        main.len(),
        ast.procs.len()
    );
    Ok(ast)
}

/// Collect a conditional or loop block into `seq`, returning the index past its `end`.
fn block(
    ast: &mut Ast,
    open: StmtId,
    seq: &mut Vec<StmtId>,
    in_proc: bool,
    depth: usize,
) -> Result<usize> {
    let stmt = &ast.stmts[open];
    let line = Some(stmt.line);
    if depth > MAX_BLOCK_DEPTH {
        return Err(error!(NestingTooDeep, line; "BLOCKS NESTED TOO DEEPLY"));
    }
    if stmt.args.len() != 2 {
        return Err(error!(SyntaxError, line; "CONDITION NEEDS TWO ARGUMENTS"));
    }
    for arg in &stmt.args {
        match arg {
            Argument::Variable(_) | Argument::Number(_) => {}
            _ => return Err(error!(SyntaxError, line; "CONDITION TAKES VARIABLES OR NUMBERS")),
        }
    }
    seq.push(open);
    let mut index = open + 1;
    while index < ast.stmts.len() {
        let stmt = &ast.stmts[index];
        match stmt.op {
            Op::End => {
                if !stmt.args.is_empty() {
                    return Err(error!(SyntaxError, Some(stmt.line); "END TAKES NO ARGUMENTS"));
                }
                seq.push(index);
                ast.stmts[open].jump = Some(index);
                if ast.stmts[open].op == Op::WNeq {
                    ast.stmts[index].jump = Some(open);
                }
                return Ok(index + 1);
            }
            Op::Proc => {
                return Err(error!(SyntaxError, Some(stmt.line); "PROC INSIDE BLOCK"));
            }
            Op::Var if in_proc => {
                return Err(error!(SyntaxError, Some(stmt.line); "VAR INSIDE PROC"));
            }
            Op::IfEq | Op::IfNeq | Op::WNeq => {
                index = block(ast, index, seq, in_proc, depth + 1)?
            }
            _ => {
                seq.push(index);
                index += 1;
            }
        }
    }
    Err(error!(MissingEnd, line))
}

/// Splice a procedure out into the procedure table, returning the index past its `end`.
fn procedure(ast: &mut Ast, open: StmtId) -> Result<usize> {
    let stmt = &ast.stmts[open];
    let line = Some(stmt.line);
    let name = match stmt.args.first() {
        Some(Argument::Procedure(name)) => name.clone(),
        _ => return Err(error!(SyntaxError, line; "EXPECTED PROCEDURE NAME")),
    };
    if ast.procedure(&name).is_some() {
        return Err(error!(DuplicateName, line; format!("PROCEDURE {}", name)));
    }
    let mut params: Vec<Rc<str>> = vec![];
    for arg in &stmt.args[1..] {
        match arg {
            Argument::Variable(param) => {
                if params.contains(param) {
                    return Err(error!(DuplicateName, line; format!("PARAMETER {}", param)));
                }
                params.push(param.clone());
            }
            _ => return Err(error!(TypeMismatch, line; "PARAMETERS MUST BE VARIABLES")),
        }
    }
    let mut body: Vec<StmtId> = vec![];
    let mut index = open + 1;
    while index < ast.stmts.len() {
        let stmt = &ast.stmts[index];
        match stmt.op {
            Op::End => {
                if !stmt.args.is_empty() {
                    return Err(error!(SyntaxError, Some(stmt.line); "END TAKES NO ARGUMENTS"));
                }
                ast.link(&body);
                ast.procs.push(Procedure {
                    name,
                    params,
                    entry: body.first().copied(),
                    line: ast.stmts[open].line,
                });
                return Ok(index + 1);
            }
            Op::Proc => return Err(error!(SyntaxError, Some(stmt.line); "PROC INSIDE PROC")),
            Op::Var => return Err(error!(SyntaxError, Some(stmt.line); "VAR INSIDE PROC")),
            Op::IfEq | Op::IfNeq | Op::WNeq => index = block(ast, index, &mut body, true, 1)?,
            _ => {
                body.push(index);
                index += 1;
            }
        }
    }
    Err(error!(MissingEnd, line; format!("PROCEDURE {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{lex, parse, ErrorCode};

    fn build_str(s: &str) -> Result<Ast> {
        build(parse(&lex(s)?)?)
    }

    fn ops(ast: &Ast) -> Vec<Op> {
        ast.iter().map(|id| ast.stmt(id).op).collect()
    }

    #[test]
    fn test_straight_line() {
        let ast = build_str("var a\nset a 1\nmsg a").unwrap();
        assert_eq!(ops(&ast), vec![Op::Var, Op::Set, Op::Msg]);
        let ids: Vec<StmtId> = ast.iter().collect();
        assert_eq!(ast.stmt(ids[1]).prev, Some(ids[0]));
        assert_eq!(ast.stmt(ids[2]).next, None);
    }

    #[test]
    fn test_wneq_links_back() {
        let ast = build_str("var a\nwneq a 3\ninc a 1\nend\nmsg a").unwrap();
        let ids: Vec<StmtId> = ast.iter().collect();
        assert_eq!(ast.stmt(ids[1]).op, Op::WNeq);
        assert_eq!(ast.stmt(ids[1]).jump, Some(ids[3]));
        assert_eq!(ast.stmt(ids[3]).jump, Some(ids[1]));
    }

    #[test]
    fn test_ifeq_links_forward_only() {
        let ast = build_str("var a\nifeq a 0\nmsg a\nend").unwrap();
        let ids: Vec<StmtId> = ast.iter().collect();
        assert_eq!(ast.stmt(ids[1]).jump, Some(ids[3]));
        assert_eq!(ast.stmt(ids[3]).jump, None);
    }

    #[test]
    fn test_procedure_spliced_out() {
        let ast = build_str("proc p x\ninc x 1\nend\nvar a\ncall p a").unwrap();
        assert_eq!(ops(&ast), vec![Op::Var, Op::Call]);
        let proc = ast.procedure("P").unwrap();
        assert_eq!(proc.params, vec![Rc::from("X")]);
        let body: Vec<Op> = ast.chain(proc.entry).map(|id| ast.stmt(id).op).collect();
        assert_eq!(body, vec![Op::Inc]);
    }

    #[test]
    fn test_procedure_between_statements() {
        let ast = build_str("var a\nproc p\nend\nmsg a").unwrap();
        assert_eq!(ops(&ast), vec![Op::Var, Op::Msg]);
        assert_eq!(ast.procedure("P").unwrap().entry, None);
    }

    #[test]
    fn test_errors() {
        let code = |s: &str| build_str(s).unwrap_err().code();
        assert_eq!(code("var a\nend"), ErrorCode::UnexpectedEnd);
        assert_eq!(code("var a\nifeq a 1\nmsg a"), ErrorCode::MissingEnd);
        assert_eq!(code("proc p\nmsg \"x\""), ErrorCode::MissingEnd);
        assert_eq!(code("proc p\nend"), ErrorCode::EmptyProgram);
        assert_eq!(code("proc p a a\nend\nmsg 1"), ErrorCode::DuplicateName);
        assert_eq!(code("proc p\nvar a\nend\nmsg 1"), ErrorCode::SyntaxError);
        assert_eq!(code("var a\nifeq a 1\nproc p\nend\nend"), ErrorCode::SyntaxError);
        assert_eq!(code("var a\nifeq a\nend"), ErrorCode::SyntaxError);
        assert_eq!(code("var a\nifeq a \"s\"\nend"), ErrorCode::SyntaxError);
    }

    fn nested(depth: usize) -> String {
        let mut s = String::from("var a\n");
        s.push_str(&"ifeq a 0\n".repeat(depth));
        s.push_str(&"end\n".repeat(depth));
        s
    }

    #[test]
    fn test_nesting_limit() {
        assert!(build_str(&nested(MAX_BLOCK_DEPTH)).is_ok());
        let e = build_str(&nested(300)).unwrap_err();
        assert_eq!(e.code(), ErrorCode::NestingTooDeep);
        assert_eq!(e.line_number(), Some(MAX_BLOCK_DEPTH + 2));
        let e = build_str(&nested(200_000)).unwrap_err();
        assert_eq!(e.code(), ErrorCode::NestingTooDeep);
    }
}
