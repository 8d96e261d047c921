use logos::Logos;
use std::fmt;

/// Aw the different kinds o' tokens in braw
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip whitespace but nae newlines
pub enum TokenKind {
    // === Scots Keywords ===
    /// ken - variable declaration (I know/understand)
    #[token("ken")]
    Ken,

    /// gin - if statement (if/when)
    #[token("gin")]
    Gin,

    /// ither - else
    #[token("ither")]
    Ither,

    /// whiles - while loop
    #[token("whiles")]
    Whiles,

    /// fer - for loop
    #[token("fer")]
    Fer,

    /// gie - return (give back)
    #[token("gie")]
    Gie,

    /// blether - print (chat/talk)
    #[token("blether")]
    Blether,

    /// an - and (logical)
    #[token("an")]
    An,

    /// or - or (logical)
    #[token("or")]
    Or,

    /// nae - not / false
    #[token("nae")]
    Nae,

    /// aye - true
    #[token("aye")]
    Aye,

    /// naething - null/none/nil
    #[token("naething")]
    #[token("nil")]
    #[token("nowt")]
    Naething,

    /// dae - function definition (do)
    #[token("dae")]
    Dae,

    /// ilk - enum definition (of that ilk = of that kind)
    #[token("ilk")]
    Ilk,

    /// brak - break
    #[token("brak")]
    Brak,

    /// haud - continue (hold on)
    #[token("haud")]
    Haud,

    /// in - in (for loops)
    #[token("in")]
    In,

    /// match/switch statement
    #[token("keek")]
    Keek,

    /// case in match
    #[token("whan")]
    Whan,

    // === Literals ===
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // String with double quotes
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].to_string())
    })]
    String(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // === Operators ===
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("=")]
    Equals,

    #[token("==")]
    EqualsEquals,

    #[token("!=")]
    BangEquals,

    #[token("<")]
    Less,

    #[token("<=")]
    LessEquals,

    #[token(">")]
    Greater,

    #[token(">=")]
    GreaterEquals,

    #[token("!")]
    Bang,

    #[token("..")]
    DotDot,

    #[token(".")]
    Dot,

    #[token("_", priority = 3)]
    Underscore, // Wildcard pattern in keek arms

    // === Delimiters ===
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("->")]
    Arrow,

    // Newlines are significant in braw (like Python)
    #[token("\n")]
    Newline,

    // Comments - skip them
    #[regex(r"#[^\n]*", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Comment,

    // End of file
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ken => write!(f, "ken"),
            TokenKind::Gin => write!(f, "gin"),
            TokenKind::Ither => write!(f, "ither"),
            TokenKind::Whiles => write!(f, "whiles"),
            TokenKind::Fer => write!(f, "fer"),
            TokenKind::Gie => write!(f, "gie"),
            TokenKind::Blether => write!(f, "blether"),
            TokenKind::An => write!(f, "an"),
            TokenKind::Or => write!(f, "or"),
            TokenKind::Nae => write!(f, "nae"),
            TokenKind::Aye => write!(f, "aye"),
            TokenKind::Naething => write!(f, "naething"),
            TokenKind::Dae => write!(f, "dae"),
            TokenKind::Ilk => write!(f, "ilk"),
            TokenKind::Brak => write!(f, "brak"),
            TokenKind::Haud => write!(f, "haud"),
            TokenKind::In => write!(f, "in"),
            TokenKind::Keek => write!(f, "keek"),
            TokenKind::Whan => write!(f, "whan"),
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Float(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Equals => write!(f, "="),
            TokenKind::EqualsEquals => write!(f, "=="),
            TokenKind::BangEquals => write!(f, "!="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEquals => write!(f, "<="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEquals => write!(f, ">="),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::DotDot => write!(f, ".."),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Underscore => write!(f, "_"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Arrow => write!(f, "->"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Comment => write!(f, "comment"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

/// A token wi' its position in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    pub fn eof(line: usize) -> Self {
        Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            line,
            column: 0,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.kind, self.line)
    }
}
