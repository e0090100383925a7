//! Formula syntax checks.
//!
//! Formulas are stored as opaque text. This module only checks their shape:
//! the leading `=`, balanced parentheses and quotes, and the names used in
//! function-call position. Nothing here evaluates a formula.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Functions refused outright because they reach outside the workbook.
const UNSAFE_FUNCTIONS: &[&str] = &["INDIRECT", "HYPERLINK", "WEBSERVICE", "DGET", "RTD"];

/// Functions we recognize without a warning. The full catalog lives with the
/// renderer; anything else that looks like a name is accepted with a warning.
const KNOWN_FUNCTIONS: &[&str] = &[
    "ABS", "AND", "AVERAGE", "AVERAGEIF", "AVERAGEIFS", "CEILING", "CHOOSE", "CONCAT",
    "CONCATENATE", "COUNT", "COUNTA", "COUNTBLANK", "COUNTIF", "COUNTIFS", "DATE", "DATEDIF",
    "DAY", "EDATE", "EOMONTH", "EXP", "FILTER", "FIND", "FLOOR", "HLOOKUP", "HOUR", "IF",
    "IFERROR", "IFNA", "IFS", "INDEX", "INT", "ISBLANK", "ISERROR", "ISNUMBER", "ISTEXT", "LEFT",
    "LEN", "LN", "LOG", "LOG10", "LOOKUP", "LOWER", "MATCH", "MAX", "MAXIFS", "MEDIAN", "MID",
    "MIN", "MINIFS", "MINUTE", "MOD", "MONTH", "NETWORKDAYS", "NOT", "NOW", "OR", "PI", "PMT",
    "POWER", "PRODUCT", "PROPER", "RAND", "RANDBETWEEN", "RANK", "REPLACE", "RIGHT", "ROUND",
    "ROUNDDOWN", "ROUNDUP", "SEARCH", "SECOND", "SORT", "SQRT", "STDEV", "SUBSTITUTE",
    "SUBTOTAL", "SUM", "SUMIF", "SUMIFS", "SUMPRODUCT", "SWITCH", "TEXT", "TEXTJOIN", "TODAY",
    "TRIM", "UNIQUE", "UPPER", "VALUE", "VAR", "VLOOKUP", "WEEKDAY", "WORKDAY", "XLOOKUP",
    "XOR", "YEAR",
];

/// Outcome of a syntax check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl FormulaCheck {
    fn invalid(reason: impl Into<String>) -> FormulaCheck {
        FormulaCheck {
            valid: false,
            reason: Some(reason.into()),
            warnings: Vec::new(),
        }
    }
}

/// Check formula text without evaluating it.
pub fn validate_formula(text: &str) -> FormulaCheck {
    let Some(body) = text.trim().strip_prefix('=') else {
        return FormulaCheck::invalid("formula must start with '='");
    };
    if body.trim().is_empty() {
        return FormulaCheck::invalid("formula is empty after '='");
    }

    let masked = match mask_literals(body) {
        Ok(masked) => masked,
        Err(reason) => return FormulaCheck::invalid(reason),
    };

    let mut depth = 0usize;
    for (idx, ch) in masked.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return FormulaCheck::invalid(format!(
                        "unexpected ')' at position {}",
                        idx + 2
                    ));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    if depth > 0 {
        return FormulaCheck::invalid(format!("{depth} unclosed parenthesis"));
    }

    let mut unknown: Vec<String> = Vec::new();
    for name in function_names(&masked) {
        let upper = name.to_ascii_uppercase();
        if UNSAFE_FUNCTIONS.contains(&upper.as_str()) {
            return FormulaCheck::invalid(format!("unsafe function: {upper}"));
        }
        let bare = upper.strip_prefix("_XLFN.").unwrap_or(&upper);
        if !KNOWN_FUNCTIONS.contains(&bare) && !unknown.contains(&upper) {
            unknown.push(upper);
        }
    }
    let warnings = unknown
        .into_iter()
        .map(|name| format!("unknown function {name}, assuming user-defined"))
        .collect();

    FormulaCheck {
        valid: true,
        reason: None,
        warnings,
    }
}

/// Replace the inside of string literals and quoted sheet names with spaces
/// so later scans only see formula structure. Fails on an unterminated quote.
fn mask_literals(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    let mut open: Option<char> = None;

    while let Some(ch) = chars.next() {
        match open {
            Some(quote) if ch == quote => {
                // A doubled quote is an escaped quote inside the literal.
                if chars.peek() == Some(&quote) {
                    chars.next();
                    out.push_str("  ");
                } else {
                    open = None;
                    out.push(ch);
                }
            }
            Some(_) => out.push(' '),
            None if ch == '"' || ch == '\'' => {
                open = Some(ch);
                out.push(ch);
            }
            None => out.push(ch),
        }
    }

    match open {
        Some('"') => Err("unterminated string literal".to_string()),
        Some(_) => Err("unterminated quoted sheet name".to_string()),
        None => Ok(out),
    }
}

fn function_names(masked: &str) -> Vec<&str> {
    static CALL_RE: OnceLock<Regex> = OnceLock::new();
    let re = CALL_RE.get_or_init(|| {
        Regex::new(r"([A-Za-z_][A-Za-z0-9_.]*)\s*\(").expect("function call regex must compile")
    });
    re.captures_iter(masked)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}
