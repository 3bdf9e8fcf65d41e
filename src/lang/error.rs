use super::{Column, LineNumber};

pub struct Error {
    code: ErrorCode,
    line_number: LineNumber,
    column: Column,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_column($col)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_column($col)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            line_number: None,
            column: 0..0,
            message: String::new(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn stage(&self) -> Stage {
        self.code.stage()
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn column(&self) -> Column {
        self.column.clone()
    }

    /// Attach a line unless one was already attached closer to the fault.
    pub fn in_line_number(self, line: LineNumber) -> Error {
        if self.line_number.is_some() {
            return self;
        }
        Error {
            line_number: line,
            ..self
        }
    }

    pub fn in_column(self, column: &Column) -> Error {
        debug_assert_eq!(self.column, 0..0);
        Error {
            column: column.clone(),
            ..self
        }
    }

    pub fn message<S: Into<String>>(self, message: S) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            message: message.into(),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Parse,
    Semantic,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidToken = 1,
    SyntaxError = 2,
    MissingEnd = 3,
    UnexpectedEnd = 4,
    EmptyProgram = 5,
    UndefinedName = 10,
    DuplicateName = 11,
    TypeMismatch = 12,
    WrongArgumentCount = 13,
    DivisionByZero = 14,
    IndexOutOfRange = 15,
    RecursiveCall = 16,
    NestingTooDeep = 17,
    ProgramTooLarge = 18,
    InternalError = 51,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Stage::Lex => "LEX",
            Stage::Parse => "PARSE",
            Stage::Semantic => "SEMANTIC",
            Stage::Internal => "INTERNAL",
        };
        write!(f, "{}", s)
    }
}

impl ErrorCode {
    pub fn stage(self) -> Stage {
        use ErrorCode::*;
        match self {
            InvalidToken => Stage::Lex,
            SyntaxError | MissingEnd | UnexpectedEnd | EmptyProgram => Stage::Parse,
            UndefinedName | DuplicateName | TypeMismatch | WrongArgumentCount
            | DivisionByZero | IndexOutOfRange | RecursiveCall | NestingTooDeep
            | ProgramTooLarge => {
                Stage::Semantic
            }
            InternalError => Stage::Internal,
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ErrorCode::*;
        let code_str = match self.code {
            InvalidToken => "INVALID TOKEN",
            SyntaxError => "SYNTAX ERROR",
            MissingEnd => "BLOCK WITHOUT END",
            UnexpectedEnd => "END WITHOUT BLOCK",
            EmptyProgram => "EMPTY PROGRAM",
            UndefinedName => "UNDEFINED NAME",
            DuplicateName => "DUPLICATE NAME",
            TypeMismatch => "TYPE MISMATCH",
            WrongArgumentCount => "WRONG NUMBER OF ARGUMENTS",
            DivisionByZero => "DIVISION BY ZERO",
            IndexOutOfRange => "INDEX OUT OF RANGE",
            RecursiveCall => "RECURSIVE CALL",
            NestingTooDeep => "NESTING TOO DEEP",
            ProgramTooLarge => "PROGRAM TOO LARGE",
            InternalError => "INTERNAL ERROR",
        };
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" LINE {}", line_number));
        }
        if (0..0) != self.column {
            suffix.push_str(&format!(" ({}..{})", self.column.start, self.column.end));
        }
        if suffix.is_empty() {
            write!(f, "{}", code_str)?;
        } else {
            write!(f, "{} IN{}", code_str, suffix)?;
        }
        if !self.message.is_empty() {
            write!(f, "; {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use crate::error;

    #[test]
    fn test_display() {
        let e = error!(SyntaxError, Some(3), ..&(4..7); "EXPECTED ARGUMENT");
        assert_eq!(e.to_string(), "SYNTAX ERROR IN LINE 3 (4..7); EXPECTED ARGUMENT");
        let e = error!(EmptyProgram);
        assert_eq!(e.to_string(), "EMPTY PROGRAM");
    }

    #[test]
    fn test_first_line_wins() {
        let e = error!(DivisionByZero, Some(2)).in_line_number(Some(9));
        assert_eq!(e.line_number(), Some(2));
        assert_eq!(e.stage(), super::Stage::Semantic);
    }

    #[test]
    fn test_stage_names() {
        let e = error!(InvalidToken, Some(1), ..&(0..2));
        assert_eq!(format!("{}: {}", e.stage(), e), "LEX: INVALID TOKEN IN LINE 1 (0..2)");
        let e = error!(ProgramTooLarge);
        assert_eq!(e.stage().to_string(), "SEMANTIC");
    }
}
