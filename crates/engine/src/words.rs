// Word resolver: flatten parsed words into the strings the rules inspect.

use bash_scanner_shell_parser::Word;

/// Flatten a word to text. Quotes are dropped, expansions keep their
/// sigils (`$NAME`, `${...}`, `$(cmd)`) so they stay recognisable.
pub fn word_value(word: &Word) -> String {
    word.to_str()
}

/// True if the string contains a glob metacharacter.
pub fn contains_glob(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// True if the word holds a parameter, command substitution or arithmetic
/// expansion, including inside double quotes.
pub fn contains_var(word: &Word) -> bool {
    word.has_expansion()
}

/// Arguments whose value is neither empty nor flag-like.
pub(crate) fn filter_flags(args: &[Word]) -> Vec<&Word> {
    args.iter()
        .filter(|w| {
            let value = word_value(w);
            !value.is_empty() && !value.starts_with('-')
        })
        .collect()
}

pub(crate) fn has_flag(args: &[Word], is_flag: impl Fn(&str) -> bool) -> bool {
    args.iter().any(|w| is_flag(&word_value(w)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bash_scanner_shell_parser::{Command, parse};

    fn words(input: &str) -> Vec<Word> {
        match parse(input).unwrap() {
            Command::Simple(sc) => sc.words,
            other => panic!("expected simple command, got {other:?}"),
        }
    }

    #[test]
    fn values_drop_quotes_and_keep_sigils() {
        let words = words(r#"echo 'a b' "x$HOME" ${USER} ${X:-d} $(pwd) `id` $((1+2)) {a,b} *.rs"#);
        let values: Vec<String> = words.iter().map(word_value).collect();
        assert_eq!(
            values,
            vec!["echo", "a b", "x$HOME", "$USER", "${X:-d}", "$(pwd)", "`id`", "$((1+2))", "{a,b}", "*.rs"]
        );
    }

    #[test]
    fn variable_detection() {
        let words = words(r#"cmd plain 'sq$X' "$X" "a$(b)" `c` $((1)) ${Y}"#);
        let vars: Vec<bool> = words.iter().map(contains_var).collect();
        assert_eq!(vars, vec![false, false, false, true, true, true, true, true]);
    }

    #[test]
    fn glob_detection() {
        assert!(contains_glob("*.txt"));
        assert!(contains_glob("file?.log"));
        assert!(contains_glob("[ab].c"));
        assert!(!contains_glob("plain/path.txt"));
    }

    #[test]
    fn flag_filtering() {
        let args = words(r#"rm -rf "" dir --force file"#);
        let kept: Vec<String> = filter_flags(&args[1..]).into_iter().map(word_value).collect();
        assert_eq!(kept, vec!["dir", "file"]);
        assert!(has_flag(&args[1..], |a| a == "--force"));
        assert!(!has_flag(&args[1..], |a| a == "-a" || a == "--append"));
    }
}
