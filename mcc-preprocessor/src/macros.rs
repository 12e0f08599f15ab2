//! Macro storage and replacement.
//!
//! Object macros are replaced by whole-word regex substitution; function
//! macros are located by name and their arguments scanned with paren and
//! string awareness. Replacement passes repeat until the line stops
//! changing, so macros may refer to other macros.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use crate::{FunctionMacro, PreprocessError, Preprocessor};

/// Replacement passes allowed per line before giving up on convergence.
const MAX_EXPANSION_PASSES: usize = 64;

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b__DATE__\b").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b__TIME__\b").unwrap());
static FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b__FILE__\b").unwrap());
static LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b__LINE__\b").unwrap());

impl Preprocessor {
    pub(crate) fn define_object(&mut self, name: &str, value: &str) {
        if self.defines.contains_key(name) {
            warn!("{} redefinition", name);
        }
        self.defines.insert(name.to_string(), value.to_string());
    }

    pub(crate) fn define_function_macro(
        &mut self,
        name: &str,
        params: &str,
        body: &str,
    ) -> Result<(), PreprocessError> {
        let params: Vec<String> = params
            .split(',')
            .map(|param| param.trim().to_string())
            .filter(|param| !param.is_empty())
            .collect();

        let mut seen = HashSet::new();
        for param in &params {
            if !seen.insert(param.as_str()) {
                return Err(PreprocessError::MacroParameter {
                    file: self.file_string(),
                    line: self.current_line,
                    name: param.clone(),
                });
            }
        }

        if self.function_defines.contains_key(name) {
            warn!("{} function redefinition", name);
        }
        self.function_defines.insert(
            name.to_string(),
            FunctionMacro {
                params,
                body: body.to_string(),
            },
        );
        Ok(())
    }

    /// Replace `__DATE__`, `__TIME__`, `__FILE__` and `__LINE__`. These run
    /// before user macros, on emitted lines only.
    pub(crate) fn replace_predefined_macros(&self, line: &str) -> String {
        if !line.contains("__") {
            return line.to_string();
        }
        let date = format!("\"{}\"", self.date);
        let time = format!("\"{}\"", self.time);
        let file = format!("\"{}\"", self.file_string());
        let line_number = self.current_line.to_string();

        let result = DATE_RE.replace_all(line, NoExpand(&date));
        let result = TIME_RE.replace_all(&result, NoExpand(&time));
        let result = FILE_RE.replace_all(&result, NoExpand(&file));
        let result = LINE_RE.replace_all(&result, NoExpand(&line_number));
        result.into_owned()
    }

    /// Expand user macros until the line reaches a fixpoint.
    pub(crate) fn replace_macros(&self, line: &str) -> Result<String, PreprocessError> {
        let mut result = line.to_string();
        for _ in 0..MAX_EXPANSION_PASSES {
            let mut changed = false;

            for (name, value) in &self.defines {
                let re = Regex::new(&format!(r"\b{}\b", regex::escape(name)))?;
                if re.is_match(&result) {
                    let replaced = re.replace_all(&result, NoExpand(value)).into_owned();
                    if replaced != result {
                        result = replaced;
                        changed = true;
                    }
                }
            }

            for (name, function_macro) in &self.function_defines {
                let expanded = self.expand_function_macro(&result, name, function_macro)?;
                if expanded != result {
                    result = expanded;
                    changed = true;
                }
            }

            if !changed {
                return Ok(result);
            }
        }
        Err(PreprocessError::Expansion {
            file: self.file_string(),
            line: self.current_line,
        })
    }

    /// Expand every invocation of one function-like macro within `text`.
    /// Invocations with the wrong number of arguments, or with no closing
    /// parenthesis on the line, are left as written.
    fn expand_function_macro(
        &self,
        text: &str,
        name: &str,
        function_macro: &FunctionMacro,
    ) -> Result<String, PreprocessError> {
        let call = Regex::new(&format!(r"\b{}\s*\(", regex::escape(name)))?;
        let mut result = String::new();
        let mut last_end = 0;

        for mat in call.find_iter(text) {
            // A match inside an already consumed argument list belongs to
            // a later replacement pass.
            if mat.start() < last_end {
                continue;
            }
            let args_start = mat.end();
            match parse_macro_arguments(&text[args_start..]) {
                Some((args, consumed)) if args.len() == function_macro.params.len() => {
                    result.push_str(&text[last_end..mat.start()]);
                    let mut body = function_macro.body.clone();
                    for (param, arg) in function_macro.params.iter().zip(&args) {
                        let re = Regex::new(&format!(r"\b{}\b", regex::escape(param)))?;
                        body = re.replace_all(&body, NoExpand(arg)).into_owned();
                    }
                    result.push_str(&body);
                    last_end = args_start + consumed;
                }
                _ => {
                    result.push_str(&text[last_end..mat.end()]);
                    last_end = mat.end();
                }
            }
        }

        result.push_str(&text[last_end..]);
        Ok(result)
    }
}

/// Scan a macro argument list starting just past the opening parenthesis.
/// Returns the arguments and the number of characters consumed including
/// the closing parenthesis, or `None` when the list never closes.
fn parse_macro_arguments(text: &str) -> Option<(Vec<String>, usize)> {
    let mut args = Vec::new();
    let mut current_arg = String::new();
    let mut paren_depth = 0usize;
    let mut in_string = false;
    let mut in_char = false;
    let mut escape = false;

    for (i, ch) in text.char_indices() {
        if escape {
            current_arg.push(ch);
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string || in_char => {
                current_arg.push(ch);
                escape = true;
            }
            '"' if !in_char => {
                current_arg.push(ch);
                in_string = !in_string;
            }
            '\'' if !in_string => {
                current_arg.push(ch);
                in_char = !in_char;
            }
            '(' if !in_string && !in_char => {
                paren_depth += 1;
                current_arg.push(ch);
            }
            ')' if !in_string && !in_char => {
                if paren_depth == 0 {
                    if !current_arg.trim().is_empty() {
                        args.push(current_arg.trim().to_string());
                    }
                    return Some((args, i + 1));
                }
                paren_depth -= 1;
                current_arg.push(ch);
            }
            ',' if !in_string && !in_char && paren_depth == 0 => {
                args.push(current_arg.trim().to_string());
                current_arg.clear();
            }
            _ => {
                current_arg.push(ch);
            }
        }
    }

    None
}

/// `__DATE__`/`__TIME__` values in `Mmm dd yyyy` / `hh:mm:ss` form, from
/// the system clock (UTC).
pub(crate) fn formatted_date_time() -> (String, String) {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    let rem = secs % 86_400;
    let date = format!("{} {:02} {}", MONTHS[(month - 1) as usize], day, year);
    let time = format!("{:02}:{:02}:{:02}", rem / 3_600, (rem % 3_600) / 60, rem % 60);
    (date, time)
}

/// Days since 1970-01-01 to (year, month, day) in the proleptic Gregorian
/// calendar.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if month <= 2 { year + 1 } else { year }, month, day)
}

pub(crate) fn dump_defines(
    defines: &HashMap<String, String>,
    function_defines: &HashMap<String, FunctionMacro>,
) -> String {
    if defines.is_empty() && function_defines.is_empty() {
        return "No defines to dump\n".to_string();
    }
    let mut out = String::new();
    let mut names: Vec<&String> = defines.keys().collect();
    names.sort();
    for name in names {
        out.push_str(&format!("#define {} {}\n", name, defines[name]));
    }
    let mut names: Vec<&String> = function_defines.keys().collect();
    names.sort();
    for name in names {
        let function_macro = &function_defines[name];
        out.push_str(&format!(
            "#define {}({}) {}\n",
            name,
            function_macro.params.join(", "),
            function_macro.body
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_macro_arguments_simple() {
        let (args, consumed) = parse_macro_arguments("a, b) rest").unwrap();
        assert_eq!(args, vec!["a", "b"]);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_parse_macro_arguments_nested_parens() {
        let (args, _) = parse_macro_arguments("f(1, 2), g(3))").unwrap();
        assert_eq!(args, vec!["f(1, 2)", "g(3)"]);
    }

    #[test]
    fn test_parse_macro_arguments_string_commas() {
        let (args, _) = parse_macro_arguments("\"a,b\", c)").unwrap();
        assert_eq!(args, vec!["\"a,b\"", "c"]);
    }

    #[test]
    fn test_parse_macro_arguments_empty() {
        let (args, consumed) = parse_macro_arguments(")").unwrap();
        assert!(args.is_empty());
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_parse_macro_arguments_unterminated() {
        assert!(parse_macro_arguments("a, b").is_none());
    }

    #[test]
    fn test_civil_from_days() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
        // Leap day
        assert_eq!(civil_from_days(19_782), (2024, 2, 29));
        assert_eq!(civil_from_days(20_690), (2026, 8, 25));
    }
}
