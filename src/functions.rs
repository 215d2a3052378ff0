//! Best-effort extraction of function declarations from source text.
//!
//! Detection is line-based and regex-driven per language family; it is good
//! enough to feed per-function explanation prompts, not to parse code.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// A function found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSnippet {
    /// Declared name.
    pub name: String,
    /// 1-based line of the declaration.
    pub line: usize,
    /// Source from the declaration up to the next declaration or end of file.
    pub code: String,
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).unwrap_or_else(|e| panic!("invalid declaration pattern {source:?}: {e}"))
}

static RUST: LazyLock<Regex> = LazyLock::new(|| {
    pattern(concat!(
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?",
        r#"(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_]\w*)"#,
    ))
});

static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(concat!(
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)",
        r"|^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*",
        r"(?:async\s+)?(?:function\b|(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=>)",
    ))
});

static PYTHON: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\("));

static GO: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)\s*[\[(]"));

static KOTLIN: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^\s*(?:\w+\s+)*fun\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?([A-Za-z_]\w*)\s*\(")
});

static C_FAMILY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^\s*(?:[\w:<>\[\],*&]+\s+)+[*&]*([A-Za-z_]\w*)\s*\([^;]*$")
});

/// Control-flow keywords the C-family pattern would otherwise accept.
const NOT_FUNCTIONS: &[&str] =
    &["if", "for", "while", "switch", "return", "else", "catch", "sizeof", "new", "throw"];

fn declaration_pattern(path: &str) -> Option<&'static Regex> {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
    let regex: &Regex = match extension.as_str() {
        "rs" => &RUST,
        "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" => &SCRIPT,
        "py" => &PYTHON,
        "go" => &GO,
        "kt" | "kts" => &KOTLIN,
        "java" | "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "cs" | "swift" | "scala" => &C_FAMILY,
        _ => return None,
    };
    Some(regex)
}

/// Finds function declarations in `source`, choosing patterns by the
/// extension of `path`. Unknown languages yield nothing.
#[must_use]
pub fn extract_functions(path: &str, source: &str) -> Vec<FunctionSnippet> {
    let Some(regex) = declaration_pattern(path) else {
        return Vec::new();
    };
    let lines: Vec<&str> = source.lines().collect();

    let starts: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let captures = regex.captures(line)?;
            let name = captures.iter().skip(1).flatten().next()?.as_str();
            (!NOT_FUNCTIONS.contains(&name)).then(|| (index, name.to_string()))
        })
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, (start, name))| {
            let end = starts.get(i + 1).map_or(lines.len(), |(next, _)| *next);
            let code = lines[*start..end].join("\n").trim_end().to_string();
            FunctionSnippet { name: name.clone(), line: start + 1, code }
        })
        .collect()
}
