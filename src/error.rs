use thiserror::Error;

/// Scots error messages - gie the user a guid tellin' aff!
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SiccarError {
    #[error("Och! Ah dinnae ken whit '{lexeme}' is at line {line}, column {column}")]
    UnkentToken {
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("Haud yer wheesht! Unexpected '{found}' at line {line} - ah wis expectin' {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Yer code's a richt guddle! Parser gave up at line {line}: {message}")]
    ParseError { message: String, line: usize },

    #[error("Awa' an bile yer heid! '{name}' hasnae been defined yet at line {line}")]
    UndefinedVariable { name: String, line: usize },

    #[error("Ye numpty! Tryin' tae divide by zero at line {line}")]
    DivisionByZero { line: usize },

    #[error("That's pure mince! Type error at line {line}: {message}")]
    TypeError { message: String, line: usize },

    #[error("Whit's aw this aboot? '{name}' isnae a function at line {line}")]
    NotCallable { name: String, line: usize },

    #[error("Yer bum's oot the windae! Function '{name}' expects {expected} arguments but ye gave it {got} at line {line}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("Wheesht! Break statement ootside a loop at line {line} - ye can only brak fae inside a whiles or fer loop!")]
    BreakOutsideLoop { line: usize },

    #[error("Haud on there! Continue statement ootside a loop at line {line} - ye can only haud inside a whiles or fer loop!")]
    ContinueOutsideLoop { line: usize },

    #[error("Ye've fair scunnered it! Return statement ootside a function at line {line}")]
    ReturnOutsideFunction { line: usize },

    #[error(
        "Stack's fair puggled! Too many nested calls at line {line} - yer recursion's gone radge!"
    )]
    StackOverflow { line: usize },

    #[error("Haud on! Cannae iterate over a {type_name} at line {line} - need a range")]
    NotIterable { type_name: String, line: usize },

    #[error("Yer keek hasnae covered aw the cases at line {line}!")]
    NonExhaustiveMatch { line: usize },

    #[error("Och away! The ilk '{ilk}' haes nae variant cried '{variant}' at line {line}")]
    UnkentVariant {
        ilk: String,
        variant: String,
        line: usize,
    },

    #[error("Whit are ye playin' at? A {type_name} haes nae members tae keek at, at line {line}")]
    NotAnIlk { type_name: String, line: usize },

    #[error("Haud yer horses! The ilk '{ilk}' awready haes a variant cried '{variant}' at line {line}")]
    DuplicateVariant {
        ilk: String,
        variant: String,
        line: usize,
    },

    #[error("Haud yer horses! '{name}' is awready defined at line {line}")]
    AlreadyDefined { name: String, line: usize },

    #[error("Wheesht! Yer number's too muckle at line {line} - it's overflowed!")]
    IntegerOverflow { line: usize },

    #[error("Dinnae be daft! Cannae read the file '{path}': {reason}")]
    FileError { path: String, reason: String },

    #[error("Yer coverage session file '{path}' is a guddle: {message}")]
    SessionFile { path: String, message: String },

    #[error("Thae reporter args are mince: {message}")]
    ArgsFile { message: String },

    #[error("Yer class pattern '{pattern}' is nae a regex ava: {message}")]
    BadClassPattern { pattern: String, message: String },

    #[error("The coverage marker in '{path}' at line {line} is aw wrang: {message}")]
    MarkerError {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Jings! Something went awfy wrang: {0}")]
    InternalError(String),
}

impl SiccarError {
    pub fn line(&self) -> Option<usize> {
        match self {
            SiccarError::UnkentToken { line, .. } => Some(*line),
            SiccarError::UnexpectedToken { line, .. } => Some(*line),
            SiccarError::ParseError { line, .. } => Some(*line),
            SiccarError::UndefinedVariable { line, .. } => Some(*line),
            SiccarError::DivisionByZero { line } => Some(*line),
            SiccarError::TypeError { line, .. } => Some(*line),
            SiccarError::NotCallable { line, .. } => Some(*line),
            SiccarError::WrongArity { line, .. } => Some(*line),
            SiccarError::BreakOutsideLoop { line } => Some(*line),
            SiccarError::ContinueOutsideLoop { line } => Some(*line),
            SiccarError::ReturnOutsideFunction { line } => Some(*line),
            SiccarError::StackOverflow { line } => Some(*line),
            SiccarError::NotIterable { line, .. } => Some(*line),
            SiccarError::NonExhaustiveMatch { line } => Some(*line),
            SiccarError::UnkentVariant { line, .. } => Some(*line),
            SiccarError::NotAnIlk { line, .. } => Some(*line),
            SiccarError::DuplicateVariant { line, .. } => Some(*line),
            SiccarError::AlreadyDefined { line, .. } => Some(*line),
            SiccarError::IntegerOverflow { line } => Some(*line),
            SiccarError::MarkerError { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type SiccarResult<T> = Result<T, SiccarError>;

/// Get a helpful suggestion fer common errors
pub fn get_error_suggestion(error: &SiccarError) -> Option<&'static str> {
    match error {
        SiccarError::UndefinedVariable { name, .. } => {
            // Check for common misspellings of keywords
            let name_lower = name.to_lowercase();
            match name_lower.as_str() {
                "true" | "false" => Some("💡 Did ye mean 'aye' or 'nae'? In braw we use Scots words fer booleans!"),
                "if" | "else" => Some("💡 Did ye mean 'gin' (if) or 'ither' (else)? We speak Scots here!"),
                "while" => Some("💡 Did ye mean 'whiles'? That's how we say 'while' in Scots!"),
                "for" => Some("💡 Did ye mean 'fer'? That's the Scots way tae loop!"),
                "let" | "var" | "const" => Some("💡 Did ye mean 'ken'? Use 'ken x = 42' tae declare variables!"),
                "print" | "println" | "console" | "echo" => Some("💡 Did ye mean 'blether'? That's how we print in braw!"),
                "return" => Some("💡 Did ye mean 'gie'? Use 'gie value' tae return fae a function!"),
                "function" | "func" | "fn" | "def" => Some("💡 Did ye mean 'dae'? Use 'dae name() { }' tae define functions!"),
                "null" | "none" | "undefined" => Some("💡 Did ye mean 'naething'? That's oor word fer null!"),
                "break" => Some("💡 Did ye mean 'brak'? That's how we break oot o' loops!"),
                "continue" => Some("💡 Did ye mean 'haud'? That's how we continue tae the next iteration!"),
                "switch" | "case" | "match" => Some("💡 Did ye mean 'keek' and 'whan'? Use 'keek value { whan 1 -> ... }'!"),
                "enum" => Some("💡 Did ye mean 'ilk'? Use 'ilk Season { Spring, Simmer }' tae define enums!"),
                "and" | "&&" => Some("💡 Did ye mean 'an'? Use 'x an y' fer logical AND!"),
                "not" => Some("💡 Did ye mean 'nae'? Use 'nae x' fer logical NOT!"),
                "or" | "||" => Some("💡 Use 'or' fer logical OR: 'x or y'"),
                "range" => Some("💡 Use 'start..end' fer ranges! E.g., 'fer i in 0..10 { }'"),
                _ => None,
            }
        }
        SiccarError::UnexpectedToken {
            found, expected, ..
        } => {
            if found == "}" && expected.contains("expression") {
                Some("💡 Ye might be missin' an expression before the closing brace!")
            } else if found == "=" && expected.contains("expression") {
                Some("💡 Did ye mean '==' fer comparison? Single '=' is fer assignment!")
            } else if found == ")" {
                Some("💡 Check yer brackets - ye might hae an extra ')' or be missin' something!")
            } else {
                None
            }
        }
        SiccarError::DivisionByZero { .. } => {
            Some("💡 Check yer divisor - ye cannae divide by zero! Maybe add a 'gin x != 0' check?")
        }
        SiccarError::StackOverflow { .. } => {
            Some("💡 Yer recursion needs a base case! Make sure ye're returnin' somewhere.")
        }
        SiccarError::BreakOutsideLoop { .. } => {
            Some("💡 'brak' only works inside 'whiles' or 'fer' loops!")
        }
        SiccarError::ContinueOutsideLoop { .. } => {
            Some("💡 'haud' only works inside 'whiles' or 'fer' loops!")
        }
        SiccarError::ReturnOutsideFunction { .. } => {
            Some("💡 'gie' only works inside functions! Define a function wi' 'dae name() { }'")
        }
        SiccarError::NonExhaustiveMatch { .. } => {
            Some("💡 Add a 'whan _ ->' arm tae catch whitever's left ower!")
        }
        _ => None,
    }
}

/// A wee helper tae format errors bonnie-like
pub fn format_error_context(source: &str, line: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    if line == 0 || line > lines.len() {
        return String::new();
    }

    let mut result = String::new();
    let line_idx = line - 1;

    // Show a wee bit o' context
    if line_idx > 0 {
        result.push_str(&format!("  {} | {}\n", line - 1, lines[line_idx - 1]));
    }
    result.push_str(&format!("> {} | {}\n", line, lines[line_idx]));
    if line_idx + 1 < lines.len() {
        result.push_str(&format!("  {} | {}\n", line + 1, lines[line_idx + 1]));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_have_line_numbers() {
        let err = SiccarError::UndefinedVariable {
            name: "x".to_string(),
            line: 7,
        };
        assert!(format!("{}", err).contains("line 7"));
        assert_eq!(err.line(), Some(7));

        let err = SiccarError::DivisionByZero { line: 3 };
        assert!(format!("{}", err).contains("line 3"));
        assert_eq!(err.line(), Some(3));

        let err = SiccarError::NonExhaustiveMatch { line: 12 };
        assert!(format!("{}", err).contains("line 12"));
        assert_eq!(err.line(), Some(12));
    }

    #[test]
    fn test_file_errors_have_no_line() {
        let err = SiccarError::FileError {
            path: "missing.braw".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.line(), None);

        let err = SiccarError::SessionFile {
            path: "cov.ic".to_string(),
            message: "bad magic".to_string(),
        };
        assert_eq!(err.line(), None);
        assert!(format!("{}", err).contains("cov.ic"));
    }

    #[test]
    fn test_variant_errors() {
        let err = SiccarError::UnkentVariant {
            ilk: "Season".to_string(),
            variant: "Dug".to_string(),
            line: 4,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Season"));
        assert!(msg.contains("Dug"));
        assert_eq!(err.line(), Some(4));

        let err = SiccarError::DuplicateVariant {
            ilk: "Season".to_string(),
            variant: "Winter".to_string(),
            line: 1,
        };
        assert!(format!("{}", err).contains("awready"));
    }

    #[test]
    fn test_marker_error_names_the_file() {
        let err = SiccarError::MarkerError {
            path: "tests/fixtures/cases/when_enum.braw".to_string(),
            line: 9,
            message: "unkent status 'fully'".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("when_enum.braw"));
        assert!(msg.contains("line 9"));
        assert_eq!(err.line(), Some(9));
    }

    #[test]
    fn test_error_suggestions() {
        let err = SiccarError::UndefinedVariable {
            name: "true".to_string(),
            line: 1,
        };
        let suggestion = get_error_suggestion(&err);
        assert!(suggestion.is_some());
        assert!(suggestion.unwrap().contains("aye"));

        let err = SiccarError::UndefinedVariable {
            name: "enum".to_string(),
            line: 1,
        };
        let suggestion = get_error_suggestion(&err);
        assert!(suggestion.is_some());
        assert!(suggestion.unwrap().contains("ilk"));

        let err = SiccarError::UndefinedVariable {
            name: "match".to_string(),
            line: 1,
        };
        let suggestion = get_error_suggestion(&err);
        assert!(suggestion.is_some());
        assert!(suggestion.unwrap().contains("keek"));

        let err = SiccarError::UndefinedVariable {
            name: "some_normal_var".to_string(),
            line: 1,
        };
        assert!(get_error_suggestion(&err).is_none());
    }

    #[test]
    fn test_suggestion_for_unexpected_equals() {
        let err = SiccarError::UnexpectedToken {
            expected: "expression".to_string(),
            found: "=".to_string(),
            line: 2,
        };
        let suggestion = get_error_suggestion(&err).unwrap();
        assert!(suggestion.contains("=="));
    }

    #[test]
    fn test_format_error_context() {
        let source = "ken a = 1\nken b = 2\nken c = 3";
        let ctx = format_error_context(source, 2);
        assert!(ctx.contains("> 2 | ken b = 2"));
        assert!(ctx.contains("  1 | ken a = 1"));
        assert!(ctx.contains("  3 | ken c = 3"));
    }

    #[test]
    fn test_format_error_context_first_line() {
        let source = "ken a = 1\nken b = 2";
        let ctx = format_error_context(source, 1);
        assert!(ctx.starts_with("> 1 | ken a = 1"));
    }

    #[test]
    fn test_format_error_context_out_of_range() {
        let source = "ken a = 1";
        assert_eq!(format_error_context(source, 0), "");
        assert_eq!(format_error_context(source, 99), "");
    }
}
