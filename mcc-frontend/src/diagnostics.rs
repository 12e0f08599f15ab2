//! Error-context rendering for failed parses.
//!
//! A syntax error carries only a token index, so this reconstructs
//! readable source from the token lexemes and marks the offender. The
//! layout is deliberately crude: one space between tokens, a line
//! break after `;` and `{`, a dedented line break before `}`. That is
//! enough to make the marked token findable without dragging the
//! original file along.

use crate::lexer::{Token, TokenKind};

/// Render the token stream with the token at `at` wrapped in a
/// `--> lexeme <--` marker. An `at` past the end marks nothing.
pub fn render(tokens: &[Token], at: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut indent = 0usize;

    for (index, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Eof && index != at {
            break;
        }
        let piece = if index == at {
            format!("--> {} <--", token.lexeme)
        } else {
            token.lexeme.clone()
        };

        if token.kind == TokenKind::Punctuator && token.lexeme == "}" {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            indent = indent.saturating_sub(1);
        }

        if line.is_empty() {
            line = "  ".repeat(indent);
        } else {
            line.push(' ');
        }
        line.push_str(&piece);

        if token.kind == TokenKind::Punctuator && (token.lexeme == ";" || token.lexeme == "{") {
            if token.lexeme == "{" {
                indent += 1;
            }
            lines.push(std::mem::take(&mut line));
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn tokens_of(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().expect("lexing failed")
    }

    #[test]
    fn test_render_marks_the_failing_token() {
        let tokens = tokens_of("int main( { }");
        let rendered = render(&tokens, 3);
        assert_eq!(rendered, "int main ( --> { <--\n}");
    }

    #[test]
    fn test_render_reflows_braces_and_semicolons() {
        let tokens = tokens_of("int main() { return 0; }");
        let rendered = render(&tokens, 5);
        assert_eq!(rendered, "int main ( ) {\n  --> return <-- 0 ;\n}");
    }

    #[test]
    fn test_render_indents_nested_blocks() {
        let tokens = tokens_of("void f() { if (x) { y; } }");
        let rendered = render(&tokens, tokens.len());
        assert_eq!(
            rendered,
            "void f ( ) {\n  if ( x ) {\n    y ;\n  }\n}"
        );
    }

    #[test]
    fn test_render_marks_end_of_input() {
        let tokens = tokens_of("return x");
        let eof = tokens.len() - 1;
        let rendered = render(&tokens, eof);
        assert_eq!(rendered, "return x -->  <--");
    }
}
