use super::Stack;
use crate::error;
use crate::lang::ast::{Argument, Ast, Op, Procedure, StmtId};
use crate::lang::Error;
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

const MAX_EXPANSION_DEPTH: usize = 64;

/// Statements that inlining may copy in one program.
pub const MAX_EXPANDED_STATEMENTS: usize = 1 << 18;

/// Replace every `call` in the main chain with a copy of the callee's body.
///
/// Parameters are bound by reference: inside the copy each parameter name is
/// renamed to the caller's argument. Any other name refers to a global.
pub fn expand(ast: &mut Ast) -> Result<()> {
    let mut expander = Expander {
        stack: Stack::new("PROCEDURES NESTED TOO DEEPLY", MAX_EXPANSION_DEPTH),
        calls: 0,
        copied: 0,
    };
    let ids: Vec<StmtId> = ast.iter().collect();
    for id in ids {
        if ast.stmt(id).op == Op::Call {
            expander.call(ast, id)?;
        }
    }
    if expander.calls > 0 {
        log::debug!(
            "expanded {} procedure calls into {} statements",
            expander.calls,
            expander.copied
        );
    }
    Ok(())
}

struct Expander {
    stack: Stack<Rc<str>>,
    calls: usize,
    copied: usize,
}

impl Expander {
    fn call(&mut self, ast: &mut Ast, id: StmtId) -> Result<()> {
        let line = Some(ast.stmt(id).line);
        let args = ast.stmt(id).args.clone();
        let name = match args.first() {
            Some(Argument::Procedure(name)) => name.clone(),
            _ => return Err(error!(SyntaxError, line; "EXPECTED PROCEDURE NAME")),
        };
        if self.stack.contains(&name) {
            return Err(error!(RecursiveCall, line; format!("PROCEDURE {}", name)));
        }
        let proc = match ast.procedure(&name) {
            Some(proc) => proc.clone(),
            None => return Err(error!(UndefinedName, line; format!("PROCEDURE {}", name))),
        };
        let mut actuals: Vec<Rc<str>> = vec![];
        for arg in &args[1..] {
            match arg {
                Argument::Variable(actual) => actuals.push(actual.clone()),
                _ => return Err(error!(TypeMismatch, line; "CALL ARGUMENTS MUST BE VARIABLES")),
            }
        }
        if actuals.len() != proc.params.len() {
            return Err(error!(WrongArgumentCount, line; format!(
                "PROCEDURE {} TAKES {}",
                name,
                proc.params.len()
            )));
        }
        self.copied += ast.chain(proc.entry).count();
        if self.copied > MAX_EXPANDED_STATEMENTS {
            return Err(error!(ProgramTooLarge, line; format!(
                "MORE THAN {} STATEMENTS AFTER EXPANDING {}",
                MAX_EXPANDED_STATEMENTS, name
            )));
        }
        let run = copy_body(ast, &proc, &actuals);
        ast.replace_with_run(id, run);
        self.calls += 1;
        if let Some((first, last)) = run {
            let mut ids: Vec<StmtId> = vec![];
            for id in ast.chain(Some(first)) {
                ids.push(id);
                if id == last {
                    break;
                }
            }
            self.stack.push(name)?;
            for id in ids {
                if ast.stmt(id).op == Op::Call {
                    self.call(ast, id)?;
                }
            }
            self.stack.pop()?;
        }
        Ok(())
    }
}

/// Copy a procedure body into fresh linked statements, returning the first and last.
fn copy_body(ast: &mut Ast, proc: &Procedure, actuals: &[Rc<str>]) -> Option<(StmtId, StmtId)> {
    let rename: HashMap<Rc<str>, Rc<str>> = proc
        .params
        .iter()
        .cloned()
        .zip(actuals.iter().cloned())
        .collect();
    let body: Vec<StmtId> = ast.chain(proc.entry).collect();
    let mut copies: HashMap<StmtId, StmtId> = HashMap::new();
    let mut prev: Option<StmtId> = None;
    for &old in &body {
        let mut stmt = ast.stmt(old).clone();
        for arg in stmt.args.iter_mut() {
            if let Argument::Variable(name) = arg {
                if let Some(actual) = rename.get(&**name) {
                    *name = actual.clone();
                }
            }
        }
        stmt.prev = prev;
        stmt.next = None;
        let new = ast.push(stmt);
        if let Some(prev) = prev {
            ast.stmt_mut(prev).next = Some(new);
        }
        copies.insert(old, new);
        prev = Some(new);
    }
    for new in copies.values().copied().collect::<Vec<_>>() {
        let jump = ast.stmt(new).jump.and_then(|old| copies.get(&old).copied());
        ast.stmt_mut(new).jump = jump;
    }
    let first = body.first().and_then(|id| copies.get(id).copied())?;
    Some((first, prev?))
}
