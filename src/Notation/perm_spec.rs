use crate::Notation::GrammarError;
use crate::Notation::lexer::{Lexeme, Scanner};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One atom tag of the long permutation notation, e.g. `C#3@6`:
/// element symbol, 1-based atom number within the metabolite and the
/// position id naming the physical atom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermSpecTag {
    pub element: String,
    pub atom_nr: u32,
    pub pos_id: String,
}

impl PermSpecTag {
    /// the key under which the atom is matched between the two sides of
    /// a reaction
    pub fn match_key(&self) -> String {
        format!("{}#{}", self.element, self.atom_nr)
    }
}

/// Syntax class of an atom configuration string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermSyntax {
    /// empty configuration (pool without labeled atoms)
    Empty,
    /// one character per atom, e.g. `abc`
    Short,
    /// whitespace-separated `element#atomnr@posid` tags
    Long,
}

/// Parses a single long-syntax tag `element#atomnr@posid`.
pub fn parse_perm_spec_tag(s: &str) -> Result<PermSpecTag, GrammarError> {
    let mut sc = Scanner::new(s);
    let element = match sc.next_lexeme() {
        Lexeme::Id(id) => id.to_string(),
        _ => return Err(GrammarError::ParseError(s.to_string())),
    };
    if !sc.accept(Lexeme::Hash) {
        return Err(GrammarError::ParseError(s.to_string()));
    }
    let atom_nr = match sc.next_lexeme() {
        Lexeme::Integer(v) => v as u32,
        _ => return Err(GrammarError::ParseError(s.to_string())),
    };
    if !sc.accept(Lexeme::At) {
        return Err(GrammarError::ParseError(s.to_string()));
    }
    let pos_id = sc.rest();
    if pos_id.is_empty() {
        return Err(GrammarError::ParseError(s.to_string()));
    }
    Ok(PermSpecTag {
        element,
        atom_nr,
        pos_id: pos_id.to_string(),
    })
}

/// Identifies the syntax class of a configuration string. A string
/// containing `#` (or whitespace) must consist entirely of well-formed
/// long tags; a short configuration is a single token free of `#`, `@`
/// and whitespace.
pub fn identify_perm_spec(s: &str) -> Result<PermSyntax, GrammarError> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(PermSyntax::Empty);
    }
    if t.contains('#') || t.contains(char::is_whitespace) {
        for tok in t.split_whitespace() {
            parse_perm_spec_tag(tok)?;
        }
        return Ok(PermSyntax::Long);
    }
    if t.contains('@') {
        return Err(GrammarError::ParseError(s.to_string()));
    }
    Ok(PermSyntax::Short)
}

/// Number of atoms a configuration string stands for: one per character
/// in short syntax, one per tag in long syntax.
pub fn perm_spec_length(s: &str) -> Result<usize, GrammarError> {
    match identify_perm_spec(s)? {
        PermSyntax::Empty => Ok(0),
        PermSyntax::Short => Ok(s.trim().chars().count()),
        PermSyntax::Long => Ok(s.split_whitespace().count()),
    }
}

/// Checks that every configuration of one reaction side uses the same
/// syntax class. Empty configurations do not vote; a side with nothing
/// but empty configurations is reported as `Empty`.
pub fn check_perm_spec<S: AsRef<str>>(specs: &[S]) -> Result<PermSyntax, GrammarError> {
    let mut vote_short = 0usize;
    let mut vote_long = 0usize;
    let mut vote_any = 0usize;
    for spec in specs {
        match identify_perm_spec(spec.as_ref())? {
            PermSyntax::Empty => vote_any += 1,
            PermSyntax::Short => vote_short += 1,
            PermSyntax::Long => vote_long += 1,
        }
    }
    if vote_short > 0 && vote_long > 0 {
        let all: Vec<&str> = specs.iter().map(|s| s.as_ref()).collect();
        return Err(GrammarError::ParseError(format!(
            "mixed short and long atom notation: {}",
            all.join(", ")
        )));
    }
    if vote_short > 0 {
        Ok(PermSyntax::Short)
    } else if vote_long > 0 {
        Ok(PermSyntax::Long)
    } else if vote_any > 0 {
        Ok(PermSyntax::Empty)
    } else {
        Err(GrammarError::ParseError(String::new()))
    }
}

/// Identifier grammar `[A-Za-z_][A-Za-z0-9_]*` used for pool and
/// reaction names.
pub fn is_varname(s: &str) -> bool {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    re.is_match(s)
}
