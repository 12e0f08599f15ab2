//! C preprocessor for the mcc front end.
//!
//! Line oriented: backslash continuations are spliced and comments removed,
//! then each line is either interpreted as a directive or emitted with
//! macros expanded. Conditional regions that are inactive emit nothing.
//!
//! Supported directives: `#define` (object and function-like), `#undef`,
//! `#ifdef`, `#ifndef`, `#if`, `#elif`, `#else`, `#endif`, `#include` and
//! `#error`. `#if` conditions are combinations of `defined` tests; they are
//! reduced to a `T`/`F` expression and handed to [`boolean::evaluate`].

pub mod boolean;
mod macros;
pub mod tests;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Default ceiling for nested includes (the usual compiler limit region).
const MAX_INCLUDE_DEPTH: usize = 200;

/// Where `#include <...>` files are looked up when no `-I` directory has
/// them.
const SYSTEM_INCLUDE_ROOT: &str = "/usr/include";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessError {
    #[error("preprocessor: {file}:{line}: max include depth reached: {depth}")]
    IncludeDepth {
        file: String,
        line: usize,
        depth: usize,
    },

    #[error("preprocessor: {file}:{line}: include file not found: {include}")]
    IncludeNotFound {
        file: String,
        line: usize,
        include: String,
    },

    #[error("preprocessor: {file}:{line}: error directive hit: {message}")]
    Directive {
        file: String,
        line: usize,
        message: String,
    },

    #[error("preprocessor: {file}:{line}: cannot evaluate condition '{expression}': {source}")]
    Condition {
        file: String,
        line: usize,
        expression: String,
        source: boolean::EvalError,
    },

    #[error("preprocessor: {file}:{line}: {message}")]
    Conditional {
        file: String,
        line: usize,
        message: String,
    },

    #[error("preprocessor: {file}:{line}: duplicate macro parameter '{name}'")]
    MacroParameter {
        file: String,
        line: usize,
        name: String,
    },

    #[error("preprocessor: {file}:{line}: macro expansion did not converge")]
    Expansion { file: String, line: usize },

    #[error("preprocessor: {file}:{line}: cannot read include: {message}")]
    Io {
        file: String,
        line: usize,
        message: String,
    },

    #[error("internal regex error: {0}")]
    Regex(String),
}

impl From<regex::Error> for PreprocessError {
    fn from(err: regex::Error) -> Self {
        PreprocessError::Regex(err.to_string())
    }
}

/// A `#define NAME(params) body` macro.
#[derive(Debug, Clone)]
pub struct FunctionMacro {
    pub params: Vec<String>,
    pub body: String,
}

/// State of one `#if`/`#ifdef`/`#ifndef` region.
#[derive(Debug, Clone)]
struct ConditionalFrame {
    /// The branch we are currently in emits lines.
    active: bool,
    /// Some branch of this region already matched; later `#elif`/`#else`
    /// branches stay inactive.
    taken: bool,
    has_else: bool,
    /// Whether the enclosing regions were emitting when this one opened.
    parent_active: bool,
}

static SPLICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\n").unwrap());
static DEFINE_FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*#[ \t]*define[ \t]+([A-Za-z_][A-Za-z_0-9]*)\(([^)]*)\)[ \t]*(.*)$").unwrap()
});
static DEFINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*define[ \t]+([A-Za-z_][A-Za-z_0-9]*)[ \t]*(.*)$").unwrap());
static ERROR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*error(?:[ \t]+(.*))?$").unwrap());
static UNDEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*undef[ \t]+([A-Za-z_][A-Za-z_0-9]*)[ \t]*$").unwrap());
static IFDEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*ifdef[ \t]+([A-Za-z_][A-Za-z_0-9]*)[ \t]*$").unwrap());
static IFNDEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*ifndef[ \t]+([A-Za-z_][A-Za-z_0-9]*)[ \t]*$").unwrap());
static IF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*if[ \t]+(.*)$").unwrap());
static ELIF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*elif[ \t]+(.*)$").unwrap());
static ELSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*else[ \t]*$").unwrap());
static ENDIF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*endif[ \t]*$").unwrap());
static INCLUDE_ANGLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*#[ \t]*include[ \t]+<([A-Za-z0-9_/.\-]+)>[ \t]*$").unwrap());
static INCLUDE_QUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[ \t]*#[ \t]*include[ \t]+"([A-Za-z0-9_/.\-]+)"[ \t]*$"#).unwrap());

/// Main preprocessor struct
pub struct Preprocessor {
    /// Object-like macros
    defines: HashMap<String, String>,
    /// Function-like macros
    function_defines: HashMap<String, FunctionMacro>,
    /// Include search paths
    include_dirs: Vec<PathBuf>,
    /// Root for `#include <...>` lookups
    system_root: PathBuf,
    /// Ceiling for nested includes
    max_include_depth: usize,
    /// Suppresses the implicit `NDEBUG` definition
    debug: bool,
    /// Current include depth
    include_depth: usize,
    /// File currently being processed
    current_path: PathBuf,
    /// 1-based line within the current file
    current_line: usize,
    /// `__DATE__` replacement, fixed at construction
    date: String,
    /// `__TIME__` replacement, fixed at construction
    time: String,
}

impl Preprocessor {
    /// Create a new preprocessor
    pub fn new() -> Self {
        let (date, time) = macros::formatted_date_time();
        Self {
            defines: HashMap::new(),
            function_defines: HashMap::new(),
            include_dirs: vec![],
            system_root: PathBuf::from(SYSTEM_INCLUDE_ROOT),
            max_include_depth: MAX_INCLUDE_DEPTH,
            debug: false,
            include_depth: 0,
            current_path: PathBuf::new(),
            current_line: 0,
            date,
            time,
        }
    }

    /// Add an include directory
    pub fn add_include_dir(&mut self, dir: PathBuf) {
        self.include_dirs.push(dir);
    }

    /// Define an object macro; a missing value defaults to `1` as `-D NAME`
    /// does.
    pub fn define(&mut self, name: String, value: Option<String>) {
        let value = value.unwrap_or_else(|| "1".to_string());
        self.define_object(&name, &value);
    }

    /// Undefine a macro
    pub fn undefine(&mut self, name: &str) {
        self.defines.remove(name);
        self.function_defines.remove(name);
    }

    /// When set, the implicit `NDEBUG` definition is suppressed.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn set_max_include_depth(&mut self, depth: usize) {
        self.max_include_depth = depth;
    }

    pub fn set_system_root(&mut self, root: PathBuf) {
        self.system_root = root;
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defines.contains_key(name) || self.function_defines.contains_key(name)
    }

    /// Process a source file. Every emitted line is followed by a newline.
    pub fn process(&mut self, input: &str, source_file: PathBuf) -> Result<String, PreprocessError> {
        self.initialize_defines();
        self.include_depth = 0;
        let mut output = String::new();
        self.process_impl(input, &source_file, &mut output)?;
        Ok(output)
    }

    /// Definitions in effect after processing, as `#define`-style lines.
    pub fn dump_defines(&self) -> String {
        macros::dump_defines(&self.defines, &self.function_defines)
    }

    fn initialize_defines(&mut self) {
        for (name, value) in [("NULL", "0"), ("__STDC__", "1")] {
            self.defines
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
        if !self.debug {
            self.defines.entry("NDEBUG".to_string()).or_default();
        }
    }

    /// Process one file's text into `out`, restoring the path/line context
    /// of the including file afterwards.
    fn process_impl(
        &mut self,
        input: &str,
        path: &Path,
        out: &mut String,
    ) -> Result<(), PreprocessError> {
        let saved_path = std::mem::replace(&mut self.current_path, path.to_path_buf());
        let saved_line = self.current_line;
        let result = self.process_lines(input, out);
        self.current_path = saved_path;
        self.current_line = saved_line;
        result
    }

    fn process_lines(&mut self, input: &str, out: &mut String) -> Result<(), PreprocessError> {
        let spliced = SPLICE_RE.replace_all(input, "");
        let text = self.remove_comments(&spliced);

        let mut stack: Vec<ConditionalFrame> = Vec::new();
        for (index, line) in text.lines().enumerate() {
            self.current_line = index + 1;
            let emitting = stack.iter().all(|frame| frame.active);
            if line.trim_start().starts_with('#') {
                self.handle_directive(line, emitting, &mut stack, out)?;
            } else if emitting {
                let line = self.replace_predefined_macros(line);
                let line = self.replace_macros(&line)?;
                out.push_str(&line);
                out.push('\n');
            }
        }

        if !stack.is_empty() {
            return Err(self.conditional_error("unterminated conditional directive"));
        }
        Ok(())
    }

    fn handle_directive(
        &mut self,
        line: &str,
        emitting: bool,
        stack: &mut Vec<ConditionalFrame>,
        out: &mut String,
    ) -> Result<(), PreprocessError> {
        // Conditionals are tracked even inside inactive regions, so that
        // nested #if/#endif pairs stay balanced.
        if let Some(caps) = IFDEF_RE.captures(line) {
            let condition = emitting && self.is_defined(&caps[1]);
            push_frame(stack, emitting, condition);
            return Ok(());
        }
        if let Some(caps) = IFNDEF_RE.captures(line) {
            let condition = emitting && !self.is_defined(&caps[1]);
            push_frame(stack, emitting, condition);
            return Ok(());
        }
        if let Some(caps) = IF_RE.captures(line) {
            let condition = if emitting {
                self.evaluate_condition(&caps[1])?
            } else {
                false
            };
            push_frame(stack, emitting, condition);
            return Ok(());
        }
        if let Some(caps) = ELIF_RE.captures(line) {
            let needs_test = match stack.last() {
                None => return Err(self.conditional_error("#elif without matching #if")),
                Some(top) if top.has_else => {
                    return Err(self.conditional_error("#elif after #else"))
                }
                Some(top) => top.parent_active && !top.taken,
            };
            let condition = needs_test && self.evaluate_condition(&caps[1])?;
            if let Some(top) = stack.last_mut() {
                top.active = condition;
                top.taken |= condition;
            }
            return Ok(());
        }
        if ELSE_RE.is_match(line) {
            let Some(top) = stack.last_mut() else {
                return Err(self.conditional_error("#else without matching #if"));
            };
            if top.has_else {
                return Err(self.conditional_error("duplicate #else"));
            }
            top.active = top.parent_active && !top.taken;
            top.taken = true;
            top.has_else = true;
            return Ok(());
        }
        if ENDIF_RE.is_match(line) {
            if stack.pop().is_none() {
                return Err(self.conditional_error("#endif without matching #if"));
            }
            return Ok(());
        }

        if !emitting {
            return Ok(());
        }

        if let Some(caps) = DEFINE_FUNCTION_RE.captures(line) {
            return self.define_function_macro(&caps[1], &caps[2], &caps[3]);
        }
        if let Some(caps) = DEFINE_RE.captures(line) {
            self.define_object(&caps[1], &caps[2]);
            return Ok(());
        }
        if let Some(caps) = ERROR_RE.captures(line) {
            let message = caps.get(1).map_or("", |m| m.as_str()).to_string();
            return Err(PreprocessError::Directive {
                file: self.file_string(),
                line: self.current_line,
                message,
            });
        }
        if let Some(caps) = UNDEF_RE.captures(line) {
            self.undefine(&caps[1]);
            return Ok(());
        }
        if let Some(caps) = INCLUDE_ANGLE_RE.captures(line) {
            let name = caps[1].to_string();
            return self.handle_include(&name, true, out);
        }
        if let Some(caps) = INCLUDE_QUOTE_RE.captures(line) {
            let name = caps[1].to_string();
            return self.handle_include(&name, false, out);
        }

        warn!(
            "{}:{}: ignoring unrecognized directive: {}",
            self.file_string(),
            self.current_line,
            line.trim()
        );
        Ok(())
    }

    fn handle_include(
        &mut self,
        name: &str,
        angled: bool,
        out: &mut String,
    ) -> Result<(), PreprocessError> {
        if self.include_depth + 1 > self.max_include_depth {
            return Err(PreprocessError::IncludeDepth {
                file: self.file_string(),
                line: self.current_line,
                depth: self.max_include_depth,
            });
        }
        let path = self
            .resolve_include(name, angled)
            .ok_or_else(|| PreprocessError::IncludeNotFound {
                file: self.file_string(),
                line: self.current_line,
                include: name.to_string(),
            })?;
        debug!("resolved include '{}' to {}", name, path.display());
        let text = fs::read_to_string(&path).map_err(|err| PreprocessError::Io {
            file: self.file_string(),
            line: self.current_line,
            message: err.to_string(),
        })?;

        self.include_depth += 1;
        let result = self.process_impl(&text, &path, out);
        self.include_depth -= 1;
        result
    }

    fn resolve_include(&self, name: &str, angled: bool) -> Option<PathBuf> {
        if angled {
            let system = self.system_root.join(name);
            if system.is_file() {
                return Some(system);
            }
        } else {
            let candidate = PathBuf::from(name);
            if candidate.is_absolute() {
                return candidate.is_file().then_some(candidate);
            }
            if let Some(parent) = self.current_path.parent() {
                let relative = parent.join(name);
                if relative.is_file() {
                    return Some(relative);
                }
            }
        }
        for dir in &self.include_dirs {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    fn evaluate_condition(&self, raw: &str) -> Result<bool, PreprocessError> {
        let simplified = self.simplify_expression(raw)?;
        boolean::evaluate(&simplified).map_err(|source| PreprocessError::Condition {
            file: self.file_string(),
            line: self.current_line,
            expression: raw.trim().to_string(),
            source,
        })
    }

    /// Reduce a `#if` condition to the boolean evaluator's alphabet:
    /// `defined` tests of known names become `T`, of unknown names `F`,
    /// whitespace disappears, `&&`/`||` become `&`/`|`.
    fn simplify_expression(&self, expression: &str) -> Result<String, PreprocessError> {
        const PREFIX: &str = r"defined[ \t]*[( ][ \t]*";
        const SUFFIX: &str = r"[ \t]*(?:\)| |$)";
        let mut ret = expression.to_string();
        for key in self.defines.keys().chain(self.function_defines.keys()) {
            let re = Regex::new(&format!("{}{}{}", PREFIX, regex::escape(key), SUFFIX))?;
            ret = re.replace_all(&ret, "T").into_owned();
        }
        let unknown = Regex::new(&format!("{}{}{}", PREFIX, "(?:.+?)", SUFFIX))?;
        ret = unknown.replace_all(&ret, "F").into_owned();
        ret = ret.replace([' ', '\t'], "");
        ret = ret.replace("||", "|");
        ret = ret.replace("&&", "&");
        Ok(ret)
    }

    fn conditional_error(&self, message: &str) -> PreprocessError {
        PreprocessError::Conditional {
            file: self.file_string(),
            line: self.current_line,
            message: message.to_string(),
        }
    }

    pub(crate) fn file_string(&self) -> String {
        self.current_path.display().to_string()
    }

    /// Remove comments from text
    fn remove_comments(&self, text: &str) -> String {
        let mut result = String::new();
        let mut chars = text.chars().peekable();
        let mut in_string = false;
        let mut in_char = false;
        let mut escape_next = false;

        while let Some(ch) = chars.next() {
            if escape_next {
                result.push(ch);
                escape_next = false;
                continue;
            }

            if (in_string || in_char) && ch == '\\' {
                result.push(ch);
                escape_next = true;
                continue;
            }

            if ch == '"' && !in_char {
                in_string = !in_string;
                result.push(ch);
                continue;
            }

            if ch == '\'' && !in_string {
                in_char = !in_char;
                result.push(ch);
                continue;
            }

            if !in_string && !in_char && ch == '/' {
                if let Some(&next_ch) = chars.peek() {
                    if next_ch == '/' {
                        // Line comment, keep the newline
                        chars.next();
                        for c in chars.by_ref() {
                            if c == '\n' {
                                result.push('\n');
                                break;
                            }
                        }
                        continue;
                    } else if next_ch == '*' {
                        // Block comment becomes a space, interior newlines
                        // are preserved to keep line numbers stable
                        chars.next();
                        let mut prev = '\0';
                        for c in chars.by_ref() {
                            if prev == '*' && c == '/' {
                                result.push(' ');
                                break;
                            }
                            if c == '\n' {
                                result.push('\n');
                            }
                            prev = c;
                        }
                        continue;
                    }
                }
                result.push(ch);
                continue;
            }

            result.push(ch);
        }

        result
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn push_frame(stack: &mut Vec<ConditionalFrame>, emitting: bool, condition: bool) {
    stack.push(ConditionalFrame {
        active: emitting && condition,
        taken: !emitting || condition,
        has_else: false,
        parent_active: emitting,
    });
}
