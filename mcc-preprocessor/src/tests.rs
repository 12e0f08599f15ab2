#[cfg(test)]
mod tests {
    use super::super::*;
    use indoc::indoc;
    use std::path::PathBuf;

    fn preprocess(input: &str) -> Result<String, PreprocessError> {
        let mut preprocessor = Preprocessor::new();
        preprocessor.process(input, PathBuf::from("test.c"))
    }

    fn preprocess_with_defines(
        input: &str,
        defines: Vec<(&str, &str)>,
    ) -> Result<String, PreprocessError> {
        let mut preprocessor = Preprocessor::new();
        for (name, value) in defines {
            preprocessor.define(name.to_string(), Some(value.to_string()));
        }
        preprocessor.process(input, PathBuf::from("test.c"))
    }

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mcc-pp-{}-{}", label, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_basic_passthrough() {
        let input = "int main() { return 0; }";
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int main() { return 0; }\n");
    }

    #[test]
    fn test_simple_define() {
        let input = indoc! {"
            #define MAX 100
            int array[MAX];
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int array[100];\n");
    }

    #[test]
    fn test_define_is_whole_word() {
        let input = indoc! {"
            #define MAX 100
            int MAXIMUM = MAX;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int MAXIMUM = 100;\n");
    }

    #[test]
    fn test_chained_defines() {
        let input = indoc! {"
            #define A B
            #define B 3
            int x = A;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int x = 3;\n");
    }

    #[test]
    fn test_self_referential_define_reaches_fixpoint() {
        let input = indoc! {"
            #define X X
            int X;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int X;\n");
    }

    #[test]
    fn test_mutually_recursive_defines_fail() {
        let input = indoc! {"
            #define A B
            #define B A
            int x = A;
        "};
        let err = preprocess(input).unwrap_err();
        assert!(matches!(err, PreprocessError::Expansion { line: 3, .. }));
    }

    #[test]
    fn test_function_like_macro() {
        let input = indoc! {"
            #define MIN(a, b) ((a) < (b) ? (a) : (b))
            int x = MIN(5, 10);
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int x = ((5) < (10) ? (5) : (10));\n");
    }

    #[test]
    fn test_function_macro_nested_call_argument() {
        let input = indoc! {"
            #define MIN(a, b) ((a) < (b) ? (a) : (b))
            int x = MIN(MIN(1, 2), 3);
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(
            output,
            "int x = ((((1) < (2) ? (1) : (2))) < (3) ? (((1) < (2) ? (1) : (2))) : (3));\n"
        );
    }

    #[test]
    fn test_function_macro_zero_parameters() {
        let input = indoc! {"
            #define VERSION() 7
            int v = VERSION();
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int v = 7;\n");
    }

    #[test]
    fn test_function_macro_wrong_arity_left_alone() {
        let input = indoc! {"
            #define PAIR(a, b) { a, b }
            int x = PAIR(1);
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int x = PAIR(1);\n");
    }

    #[test]
    fn test_function_macro_duplicate_parameter() {
        let input = "#define BAD(a, a) a\n";
        let err = preprocess(input).unwrap_err();
        match err {
            PreprocessError::MacroParameter { name, line, .. } => {
                assert_eq!(name, "a");
                assert_eq!(line, 1);
            }
            other => panic!("Expected MacroParameter error, got {:?}", other),
        }
    }

    #[test]
    fn test_undef() {
        let input = indoc! {"
            #define MAX 100
            #undef MAX
            int x = MAX;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int x = MAX;\n");
    }

    #[test]
    fn test_ifdef_defined() {
        let input = indoc! {"
            #define FEATURE 1
            #ifdef FEATURE
            int enabled;
            #endif
            int after;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int enabled;\nint after;\n");
    }

    #[test]
    fn test_ifdef_undefined() {
        let input = indoc! {"
            #ifdef FEATURE
            int enabled;
            #endif
            int after;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int after;\n");
    }

    #[test]
    fn test_ifndef() {
        let input = indoc! {"
            #ifndef FEATURE
            int missing;
            #endif
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int missing;\n");
    }

    #[test]
    fn test_if_defined_expressions() {
        let input = indoc! {"
            #define A 1
            #if defined(A) && !defined(B)
            int yes;
            #endif
            #if defined(B) || defined(A)
            int also;
            #endif
            #if defined(B)
            int no;
            #endif
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int yes;\nint also;\n");
    }

    #[test]
    fn test_if_defined_without_parens() {
        let input = indoc! {"
            #define A 1
            #if defined A
            int yes;
            #endif
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int yes;\n");
    }

    #[test]
    fn test_if_malformed_condition() {
        let input = indoc! {"
            #if 1
            int x;
            #endif
        "};
        let err = preprocess(input).unwrap_err();
        assert!(matches!(err, PreprocessError::Condition { line: 1, .. }));
    }

    #[test]
    fn test_else_branch() {
        let input = indoc! {"
            #ifdef FEATURE
            int enabled;
            #else
            int disabled;
            #endif
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int disabled;\n");
    }

    #[test]
    fn test_elif_branch() {
        let input = indoc! {"
            #define B 1
            #if defined(A)
            int a;
            #elif defined(B)
            int b;
            #else
            int c;
            #endif
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int b;\n");
    }

    #[test]
    fn test_elif_skipped_after_taken_branch() {
        let input = indoc! {"
            #define A 1
            #define B 1
            #if defined(A)
            int a;
            #elif defined(B)
            int b;
            #endif
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int a;\n");
    }

    #[test]
    fn test_nested_conditionals() {
        let input = indoc! {"
            #define OUTER 1
            #ifdef OUTER
            int outer;
            #ifdef INNER
            int inner;
            #endif
            int outer_again;
            #endif
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int outer;\nint outer_again;\n");
    }

    #[test]
    fn test_inactive_region_ignores_directives() {
        let input = indoc! {"
            #ifdef MISSING
            #define HIDDEN 1
            #error never reached
            #endif
            #ifdef HIDDEN
            int hidden;
            #endif
            int after;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int after;\n");
    }

    #[test]
    fn test_error_directive() {
        let input = indoc! {"
            int before;
            #error unsupported platform
        "};
        let err = preprocess(input).unwrap_err();
        match err {
            PreprocessError::Directive { message, line, .. } => {
                assert_eq!(message, "unsupported platform");
                assert_eq!(line, 2);
            }
            other => panic!("Expected Directive error, got {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_endif() {
        let err = preprocess("#endif\n").unwrap_err();
        assert!(matches!(err, PreprocessError::Conditional { .. }));
    }

    #[test]
    fn test_unterminated_conditional() {
        let input = indoc! {"
            #ifdef FEATURE
            int x;
        "};
        let err = preprocess(input).unwrap_err();
        assert!(matches!(err, PreprocessError::Conditional { .. }));
    }

    #[test]
    fn test_else_after_else() {
        let input = indoc! {"
            #ifdef A
            #else
            #else
            #endif
        "};
        let err = preprocess(input).unwrap_err();
        assert!(matches!(err, PreprocessError::Conditional { line: 3, .. }));
    }

    #[test]
    fn test_unknown_directive_dropped() {
        let input = indoc! {"
            #pragma once
            int kept;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int kept;\n");
    }

    #[test]
    fn test_line_comment_removed() {
        let input = indoc! {"
            int x; // trailing comment
            // whole line
            int y;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int x; \n\nint y;\n");
    }

    #[test]
    fn test_block_comment_removed() {
        let input = "int /* comment */ x;\n";
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int   x;\n");
    }

    #[test]
    fn test_comment_inside_string_kept() {
        let input = "char* s = \"not // a comment\";\n";
        let output = preprocess(input).unwrap();
        assert_eq!(output, "char* s = \"not // a comment\";\n");
    }

    #[test]
    fn test_line_splicing() {
        let input = "#define LONG 1 + \\\n2\nint x = LONG;\n";
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int x = 1 + 2;\n");
    }

    #[test]
    fn test_initial_defines() {
        let input = indoc! {"
            void* p = NULL;
            int std = __STDC__;
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "void* p = 0;\nint std = 1;\n");
    }

    #[test]
    fn test_ndebug_default_and_debug_mode() {
        let input = indoc! {"
            #ifdef NDEBUG
            int release;
            #else
            int debug;
            #endif
        "};
        let output = preprocess(input).unwrap();
        assert_eq!(output, "int release;\n");

        let mut preprocessor = Preprocessor::new();
        preprocessor.set_debug(true);
        let output = preprocessor.process(input, PathBuf::from("test.c")).unwrap();
        assert_eq!(output, "int debug;\n");
    }

    #[test]
    fn test_cli_define_defaults_to_one() {
        let mut preprocessor = Preprocessor::new();
        preprocessor.define("FEATURE".to_string(), None);
        let input = indoc! {"
            #ifdef FEATURE
            int x = FEATURE;
            #endif
        "};
        let output = preprocessor.process(input, PathBuf::from("test.c")).unwrap();
        assert_eq!(output, "int x = 1;\n");
    }

    #[test]
    fn test_line_macro() {
        let input = "\n\nint line = __LINE__;\n";
        let output = preprocess(input).unwrap();
        assert_eq!(output, "\n\nint line = 3;\n");
    }

    #[test]
    fn test_file_macro() {
        let output = preprocess("char* f = __FILE__;\n").unwrap();
        assert_eq!(output, "char* f = \"test.c\";\n");
    }

    #[test]
    fn test_date_and_time_shape() {
        let output = preprocess("__DATE__ __TIME__\n").unwrap();
        let mut parts = output.trim_end().splitn(2, ' ');
        let date = parts.next().unwrap();
        // "Mmm dd yyyy" plus quotes; "hh:mm:ss" plus quotes
        let rest = parts.next().unwrap();
        let (date_tail, time) = rest.split_at(rest.len() - 10);
        let date = format!("{} {}", date, date_tail.trim_end());
        assert_eq!(date.len(), 13, "unexpected __DATE__ shape: {}", date);
        assert!(date.starts_with('"') && date.ends_with('"'));
        assert_eq!(time.len(), 10, "unexpected __TIME__ shape: {}", time);
        assert_eq!(time.as_bytes()[3], b':');
        assert_eq!(time.as_bytes()[6], b':');
    }

    #[test]
    fn test_include_quote() {
        let dir = scratch_dir("include");
        std::fs::write(dir.join("defs.h"), "#define ANSWER 42\nint from_header;\n").unwrap();
        let input = indoc! {r#"
            #include "defs.h"
            int x = ANSWER;
        "#};
        let mut preprocessor = Preprocessor::new();
        let output = preprocessor.process(input, dir.join("main.c")).unwrap();
        assert_eq!(output, "int from_header;\nint x = 42;\n");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_include_search_path() {
        let dir = scratch_dir("search");
        std::fs::write(dir.join("lib.h"), "int from_lib;\n").unwrap();
        let mut preprocessor = Preprocessor::new();
        preprocessor.add_include_dir(dir.clone());
        let output = preprocessor
            .process("#include \"lib.h\"\n", PathBuf::from("elsewhere/main.c"))
            .unwrap();
        assert_eq!(output, "int from_lib;\n");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_include_not_found() {
        let err = preprocess("#include \"missing.h\"\n").unwrap_err();
        match err {
            PreprocessError::IncludeNotFound { include, .. } => {
                assert_eq!(include, "missing.h");
            }
            other => panic!("Expected IncludeNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_include_depth_limit() {
        let dir = scratch_dir("depth");
        std::fs::write(dir.join("loop.h"), "#include \"loop.h\"\n").unwrap();
        let mut preprocessor = Preprocessor::new();
        preprocessor.set_max_include_depth(5);
        let err = preprocessor
            .process("#include \"loop.h\"\n", dir.join("main.c"))
            .unwrap_err();
        assert!(matches!(err, PreprocessError::IncludeDepth { depth: 5, .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_include_restores_file_context() {
        let dir = scratch_dir("context");
        std::fs::write(dir.join("other.h"), "int from_other;\n").unwrap();
        let input = indoc! {r#"
            #include "other.h"
            char* f = __FILE__;
        "#};
        let mut preprocessor = Preprocessor::new();
        let output = preprocessor.process(input, dir.join("main.c")).unwrap();
        let expected_file = dir.join("main.c").display().to_string();
        assert_eq!(
            output,
            format!("int from_other;\nchar* f = \"{}\";\n", expected_file)
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_preprocess_with_defines_helper() {
        let output =
            preprocess_with_defines("int x = LIMIT;\n", vec![("LIMIT", "64")]).unwrap();
        assert_eq!(output, "int x = 64;\n");
    }

    #[test]
    fn test_dump_defines() {
        let mut preprocessor = Preprocessor::new();
        let input = indoc! {"
            #define MAX 100
            #define MIN(a, b) ((a) < (b) ? (a) : (b))
        "};
        preprocessor.process(input, PathBuf::from("test.c")).unwrap();
        let dump = preprocessor.dump_defines();
        assert!(dump.contains("#define MAX 100\n"));
        assert!(dump.contains("#define MIN(a, b) ((a) < (b) ? (a) : (b))\n"));
        assert!(dump.contains("#define NULL 0\n"));
    }
}
