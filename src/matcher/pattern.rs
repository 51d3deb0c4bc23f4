use std::sync::OnceLock;

use regex::Regex;

use super::Occurrence;

/// A line that starts with `import`/`export` where a single- or double-quoted
/// string beginning with `.` follows either `from` or the keyword itself
/// (side-effect `import "./x"`), before any `;`.
const STATEMENT_PATTERN: &str = r#"(?m)^[ \t]*(?:import|export)\b(?:[^\n;]*?\bfrom[ \t]*|[ \t]*)(?:"(\.[^"\n]*)"|'(\.[^'\n]*)')"#;

static STATEMENT_PATTERN_CACHE: OnceLock<Regex> = OnceLock::new();

fn statement_pattern() -> &'static Regex {
    STATEMENT_PATTERN_CACHE
        .get_or_init(|| Regex::new(STATEMENT_PATTERN).expect("invalid statement pattern"))
}

/// Line-oriented scan. Cheaper than [`super::syntax::scan`] but blind to
/// statements split across lines and to string/comment context.
pub fn scan(source: &str) -> Vec<Occurrence<'_>> {
    statement_pattern()
        .captures_iter(source)
        .filter_map(|caps| {
            let statement = caps.get(0)?;
            let path = caps.get(1).or_else(|| caps.get(2))?;
            Some(Occurrence {
                statement: statement.as_str(),
                specifier: path.as_str(),
                span: path.range(),
            })
        })
        .collect()
}
