use super::*;

fn simple(cmd: &Command) -> &SimpleCommand {
    match cmd {
        Command::Simple(sc) => sc,
        other => panic!("Expected simple command, got {other:?}"),
    }
}

fn words(sc: &SimpleCommand) -> Vec<String> {
    sc.words.iter().map(Word::to_str).collect()
}

fn parse_ok(input: &str) -> Command {
    match parse(input) {
        Ok(cmd) => cmd,
        Err(e) => panic!("failed to parse {input:?}: {e}"),
    }
}

fn parse_err(input: &str) -> ParseError {
    match parse(input) {
        Ok(cmd) => panic!("expected {input:?} to fail, got {cmd:?}"),
        Err(e) => e,
    }
}

#[test]
fn test_parse_simple_command() {
    let cmd = parse_ok("echo hello world");
    let sc = simple(&cmd);
    assert_eq!(sc.command_name().as_deref(), Some("echo"));
    assert_eq!(sc.args().len(), 2);
    assert_eq!(sc.line, 1);
}

#[test]
fn test_empty_input() {
    for input in ["", "   \t  ", "\n\n"] {
        let cmd = parse_ok(input);
        let sc = simple(&cmd);
        assert!(sc.words.is_empty() && sc.assignments.is_empty(), "{input:?}");
        assert!(sc.redirections.is_empty(), "{input:?}");
    }
}

#[test]
fn test_comment_only_at_word_start() {
    let cmd = parse_ok("ls # list files");
    assert_eq!(words(simple(&cmd)), vec!["ls"]);

    let cmd = parse_ok("curl https://example.com/#frag");
    assert_eq!(words(simple(&cmd)), vec!["curl", "https://example.com/#frag"]);
}

// --- Pipelines and lists ---

#[test]
fn test_pipeline() {
    let cmd = parse_ok("cat f | grep x | wc -l");
    match &cmd {
        Command::Pipeline(cmds) => {
            assert_eq!(cmds.len(), 3);
            assert_eq!(simple(&cmds[1]).command_name().as_deref(), Some("grep"));
        }
        _ => panic!("Expected pipeline"),
    }
}

#[test]
fn test_and_or_chained() {
    let cmd = parse_ok("make build && make test || echo failed");
    match &cmd {
        Command::Or(left, right) => {
            assert!(matches!(left.as_ref(), Command::And(_, _)));
            assert_eq!(words(simple(right)), vec!["echo", "failed"]);
        }
        _ => panic!("Expected or"),
    }
}

#[test]
fn test_sequence_lines() {
    let cmd = parse_ok("touch a.txt\nchmod 644 a.txt\nrm -f a.txt");
    match &cmd {
        Command::Sequence(cmds) => {
            let lines: Vec<usize> = cmds.iter().map(|c| simple(c).line).collect();
            assert_eq!(lines, vec![1, 2, 3]);
        }
        _ => panic!("Expected sequence"),
    }
}

#[test]
fn test_sequence_trailing_semi() {
    let cmd = parse_ok("echo a; echo b;");
    match &cmd {
        Command::Sequence(cmds) => assert_eq!(cmds.len(), 2),
        _ => panic!("Expected sequence"),
    }
}

#[test]
fn test_background() {
    let cmd = parse_ok("sleep 10 & echo started");
    match &cmd {
        Command::Sequence(cmds) => {
            assert!(matches!(cmds[0], Command::Background(_)));
            assert_eq!(words(simple(&cmds[1])), vec!["echo", "started"]);
        }
        _ => panic!("Expected sequence"),
    }
}

#[test]
fn test_negated_pipeline() {
    let cmd = parse_ok("! grep -q foo bar.txt");
    assert_eq!(simple(&cmd).command_name().as_deref(), Some("grep"));
}

#[test]
fn test_line_continuation() {
    let cmd = parse_ok("rm -rf \\\n  build");
    let sc = simple(&cmd);
    assert_eq!(words(sc), vec!["rm", "-rf", "build"]);
    assert_eq!(sc.line, 1);
}

// --- Compound commands ---

#[test]
fn test_subshell_with_redirect() {
    let cmd = parse_ok("(cd src && make) > build.log");
    match &cmd {
        Command::Redirected { command, redirections } => {
            assert!(matches!(command.as_ref(), Command::Subshell(_)));
            assert_eq!(redirections[0].kind, RedirectionKind::Output);
        }
        _ => panic!("Expected redirected subshell"),
    }
}

#[test]
fn test_brace_group() {
    let cmd = parse_ok("{ echo a; echo b; }");
    match &cmd {
        Command::BraceGroup(body) => assert!(matches!(body.as_ref(), Command::Sequence(_))),
        _ => panic!("Expected brace group"),
    }
}

#[test]
fn test_if_elif_else_multiline() {
    let cmd = parse_ok("if [ -f x ]\nthen\n  echo yes\nelif [ -d x ]; then\n  echo dir\nelse\n  echo no\nfi");
    match &cmd {
        Command::If { condition, then_branch, elif_branches, else_branch } => {
            assert_eq!(simple(condition).command_name().as_deref(), Some("["));
            assert_eq!(simple(then_branch).line, 3);
            assert_eq!(elif_branches.len(), 1);
            assert!(else_branch.is_some());
        }
        _ => panic!("Expected if"),
    }
}

#[test]
fn test_for_loop() {
    let cmd = parse_ok("for f in *.txt; do rm \"$f\"; done");
    match &cmd {
        Command::For { var, words: list, body, .. } => {
            assert_eq!(var, "f");
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].to_str(), "*.txt");
            assert_eq!(words(simple(body)), vec!["rm", "$f"]);
        }
        _ => panic!("Expected for"),
    }
}

#[test]
fn test_while_with_input_redirect() {
    let cmd = parse_ok("while read line; do echo \"$line\"; done < input.txt");
    match &cmd {
        Command::Redirected { command, redirections } => {
            assert!(matches!(command.as_ref(), Command::While { .. }));
            assert_eq!(redirections[0].kind, RedirectionKind::Input);
        }
        _ => panic!("Expected redirected while"),
    }
}

#[test]
fn test_until_loop() {
    let cmd = parse_ok("until curl -s localhost; do sleep 1; done");
    assert!(matches!(cmd, Command::Until { .. }));
}

#[test]
fn test_case_arms() {
    let cmd = parse_ok("case $x in\n  a|b) echo ab ;;\n  *) rm -rf /tmp/x ;;\nesac");
    match &cmd {
        Command::Case { word, arms, .. } => {
            assert_eq!(word.to_str(), "$x");
            assert_eq!(arms.len(), 2);
            assert_eq!(arms[0].patterns.len(), 2);
            let body = arms[1].body.as_ref().map(simple);
            assert_eq!(body.map(words), Some(vec!["rm".into(), "-rf".into(), "/tmp/x".into()]));
        }
        _ => panic!("Expected case"),
    }
}

#[test]
fn test_case_last_arm_without_terminator() {
    let cmd = parse_ok("case $1 in start) run ;; stop) halt\nesac");
    match &cmd {
        Command::Case { arms, .. } => assert_eq!(arms.len(), 2),
        _ => panic!("Expected case"),
    }
}

#[test]
fn test_function_definitions() {
    let cmd = parse_ok("cleanup() { rm -rf build; }");
    match &cmd {
        Command::FunctionDef { name, body } => {
            assert_eq!(name, "cleanup");
            assert!(matches!(body.as_ref(), Command::BraceGroup(_)));
        }
        _ => panic!("Expected function"),
    }

    let cmd = parse_ok("function deploy { scp a host:b; }");
    assert!(matches!(cmd, Command::FunctionDef { ref name, .. } if name == "deploy"));
}

#[test]
fn test_keywords_as_arguments() {
    let cmd = parse_ok("echo done if fi then");
    assert_eq!(words(simple(&cmd)), vec!["echo", "done", "if", "fi", "then"]);

    let cmd = parse_ok("echo {} }");
    assert_eq!(words(simple(&cmd)), vec!["echo", "{}", "}"]);
}

#[test]
fn test_arithmetic_for_loop() {
    let cmd = parse_ok("for ((i=0; i<3; i++)); do echo $i; done");
    match &cmd {
        Command::ArithFor { header, body } => {
            assert_eq!(header, "i=0; i<3; i++");
            assert_eq!(words(simple(body)), vec!["echo", "$i"]);
        }
        _ => panic!("Expected arithmetic for"),
    }

    let cmd = parse_ok("for (( n = (2 * 3); n > 0; n-- ))\ndo\n  rm \"f$n\"\ndone");
    assert!(matches!(cmd, Command::ArithFor { ref header, .. } if header == " n = (2 * 3); n > 0; n-- "));
}

#[test]
fn test_select_loop() {
    let cmd = parse_ok("select x in a b; do echo $x; break; done");
    match &cmd {
        Command::Select { var, words: list, body, line } => {
            assert_eq!(var, "x");
            assert_eq!(*line, 1);
            assert_eq!(list.iter().map(Word::to_str).collect::<Vec<_>>(), vec!["a", "b"]);
            assert!(matches!(body.as_ref(), Command::Sequence(_)));
        }
        _ => panic!("Expected select"),
    }

    let cmd = parse_ok("echo select");
    assert_eq!(words(simple(&cmd)), vec!["echo", "select"]);
}

#[test]
fn test_coproc() {
    let cmd = parse_ok("coproc foo { cat; }");
    match &cmd {
        Command::Coproc { name, body } => {
            assert_eq!(name.as_deref(), Some("foo"));
            assert!(matches!(body.as_ref(), Command::BraceGroup(_)));
        }
        _ => panic!("Expected coproc"),
    }

    let cmd = parse_ok("coproc tail -f log.txt");
    match &cmd {
        Command::Coproc { name: None, body } => {
            assert_eq!(words(simple(body)), vec!["tail", "-f", "log.txt"]);
        }
        _ => panic!("Expected unnamed coproc"),
    }

    let cmd = parse_ok("coproc while read l; do echo $l; done");
    assert!(matches!(cmd, Command::Coproc { name: None, ref body } if matches!(**body, Command::While { .. })));
}

#[test]
fn test_nesting_limit() {
    let deep = format!("{}ls{}", "(".repeat(5000), ")".repeat(5000));
    let err = parse_err(&deep);
    assert!(err.message.contains("nested more than"), "{}", err.message);

    let deep = format!("{}ls;{}", "{ ".repeat(5000), " }".repeat(5000));
    assert!(parse_err(&deep).message.contains("nested more than"));

    let deep = "if true; then ".repeat(1000) + "ls" + &"; fi".repeat(1000);
    assert!(parse_err(&deep).message.contains("nested more than"));

    let ok = format!("{}ls{}", "(".repeat(100), ")".repeat(100));
    parse_ok(&ok);
}

// --- Assignments ---

#[test]
fn test_lone_assignment() {
    let cmd = parse_ok("FOO=bar");
    match &cmd {
        Command::Assignment(a) => {
            assert_eq!(a.name, "FOO");
            assert_eq!(a.value.to_str(), "bar");
        }
        _ => panic!("Expected assignment"),
    }
}

#[test]
fn test_array_assignment() {
    let cmd = parse_ok("arr=(1 2 3); echo ${arr[@]}");
    match &cmd {
        Command::Sequence(cmds) => match &cmds[0] {
            Command::Assignment(a) => {
                assert_eq!(a.name, "arr");
                assert_eq!(a.value.to_str(), "(1 2 3)");
            }
            other => panic!("Expected assignment, got {other:?}"),
        },
        _ => panic!("Expected sequence"),
    }

    let cmd = parse_ok("files+=(\n  \"$a\"   # first\n  b\n)");
    match &cmd {
        Command::Assignment(a) => {
            assert_eq!(a.name, "files");
            assert_eq!(a.value.to_str(), "($a b)");
            assert!(a.value.has_expansion());
        }
        _ => panic!("Expected assignment"),
    }

    let cmd = parse_ok("declare -A m=([k]=v [x]=\"y z\")");
    assert_eq!(words(simple(&cmd)), vec!["declare", "-A", "m=([k]=v [x]=y z)"]);

    let cmd = parse_ok("local -a parts=() && echo ok");
    assert!(matches!(cmd, Command::And(..)));

    assert!(parse_err("arr=(1 2").message.contains("array"));
    assert!(parse_err("arr=(a; b)").message.contains("in array"));
}

#[test]
fn test_assignment_prefix() {
    let cmd = parse_ok("GOOS=linux go build ./...");
    let sc = simple(&cmd);
    assert_eq!(sc.assignments.len(), 1);
    assert_eq!(words(sc), vec!["go", "build", "./..."]);
}

// --- Redirections ---

#[test]
fn test_redirection_kinds() {
    let cases = [
        ("echo x > out", RedirectionKind::Output),
        ("echo x >> out", RedirectionKind::Append),
        ("echo x >| out", RedirectionKind::Clobber),
        ("make &> out", RedirectionKind::OutputAll),
        ("make &>> out", RedirectionKind::AppendAll),
        ("sort < out", RedirectionKind::Input),
    ];
    for (input, kind) in cases {
        let cmd = parse_ok(input);
        let redir = &simple(&cmd).redirections[0];
        assert_eq!(redir.kind, kind, "{input}");
        assert_eq!(redir.target, RedirectionTarget::File(Word::literal("out")), "{input}");
    }
}

#[test]
fn test_fd_duplication() {
    let cmd = parse_ok("make 2>&1 | tee log");
    match &cmd {
        Command::Pipeline(cmds) => {
            let redir = &simple(&cmds[0]).redirections[0];
            assert_eq!(redir.fd, Some(2));
            assert_eq!(redir.kind, RedirectionKind::DupOutput);
            assert_eq!(redir.target, RedirectionTarget::Fd(1));
        }
        _ => panic!("Expected pipeline"),
    }
}

#[test]
fn test_redirection_line() {
    let cmd = parse_ok("echo a\necho b > /tmp/out");
    match &cmd {
        Command::Sequence(cmds) => assert_eq!(simple(&cmds[1]).redirections[0].line, 2),
        _ => panic!("Expected sequence"),
    }
}

// --- Here-documents ---

#[test]
fn test_heredoc_keeps_rest_of_line() {
    let cmd = parse_ok("cat <<EOF > out.txt\nhello\nEOF");
    let sc = simple(&cmd);
    assert_eq!(sc.redirections.len(), 2);
    assert_eq!(sc.redirections[0].target, RedirectionTarget::Heredoc("hello\n".into()));
    assert_eq!(sc.redirections[1].target, RedirectionTarget::File(Word::literal("out.txt")));
}

#[test]
fn test_multiple_heredocs_in_order() {
    let cmd = parse_ok("cat <<A <<-B\none\nA\n\ttwo\n\tB\necho after");
    match &cmd {
        Command::Sequence(cmds) => {
            let sc = simple(&cmds[0]);
            assert_eq!(sc.redirections[0].target, RedirectionTarget::Heredoc("one\n".into()));
            assert_eq!(sc.redirections[1].target, RedirectionTarget::Heredoc("two\n".into()));
            let after = simple(&cmds[1]);
            assert_eq!(words(after), vec!["echo", "after"]);
            assert_eq!(after.line, 6);
        }
        _ => panic!("Expected sequence"),
    }
}

#[test]
fn test_quoted_heredoc_delimiter() {
    let cmd = parse_ok("bash <<'SCRIPT'\nrm -rf $HOME\nSCRIPT\n");
    assert_eq!(
        simple(&cmd).redirections[0].target,
        RedirectionTarget::Heredoc("rm -rf $HOME\n".into())
    );
}

// --- Words ---

#[test]
fn test_word_flattening() {
    let cmd = parse_ok("echo \"$HOME/x\" ${VAR} ${VAR:-d} $(pwd) `date` $((1+2)) {a,b} 'q s'");
    assert_eq!(
        words(simple(&cmd)),
        vec!["echo", "$HOME/x", "$VAR", "${VAR:-d}", "$(pwd)", "`date`", "$((1+2))", "{a,b}", "q s"]
    );
}

#[test]
fn test_word_expansion_detection() {
    let cmd = parse_ok("echo \"$HOME/x\" 'lit' plain \"$(date)\"");
    let flags: Vec<bool> = simple(&cmd).words.iter().map(Word::has_expansion).collect();
    assert_eq!(flags, vec![false, true, false, false, true]);
}

#[test]
fn test_escapes() {
    let cmd = parse_ok(r#"echo "a \"b\"" c\ d $'x\ty'"#);
    assert_eq!(words(simple(&cmd)), vec!["echo", "a \"b\"", "c d", "x\ty"]);
}

#[test]
fn test_command_substitution_with_quoted_paren() {
    let cmd = parse_ok("echo $(echo \")\") done");
    assert_eq!(words(simple(&cmd)), vec!["echo", "$(echo \")\")", "done"]);
}

#[test]
fn test_process_substitution() {
    let cmd = parse_ok("diff <(ls a) <(ls b)");
    assert_eq!(words(simple(&cmd)), vec!["diff", "<(ls a)", "<(ls b)"]);
}

// --- Errors ---

#[test]
fn test_unterminated_quotes_and_substitutions() {
    let cases = [
        ("echo 'abc", "quote"),
        ("echo \"abc", "quote"),
        ("echo `date", "backquote"),
        ("echo $(ls", "`$(`"),
        ("echo $((1 + 2", "`$((`"),
        ("echo ${HOME", "`${`"),
    ];
    for (input, needle) in cases {
        let err = parse_err(input);
        assert!(err.message.contains(needle), "{input}: {}", err.message);
    }
}

#[test]
fn test_unclosed_heredoc() {
    let err = parse_err("cat <<EOF\nhello");
    assert_eq!(err.message, "unclosed here-document `EOF`");

    let err = parse_err("cat <<EOF");
    assert!(err.message.contains("here-document"));
}

#[test]
fn test_missing_keywords() {
    let cases = [
        ("if true; then echo x", "`fi`"),
        ("if true; echo x; fi", "`then`"),
        ("for f in a b; echo $f; done", "`do`"),
        ("while true; do sleep 1", "`done`"),
        ("case x in a) echo ;;", "`esac`"),
        ("(echo a", "`)`"),
        ("{ echo a;", "`}`"),
    ];
    for (input, needle) in cases {
        let err = parse_err(input);
        assert!(err.message.contains(needle), "{input}: {}", err.message);
    }
}

#[test]
fn test_dangling_operators() {
    assert_eq!(parse_err("| grep x").message, "`|` can only follow a command");
    assert_eq!(parse_err("; ls").message, "`;` can only follow a command");
    assert_eq!(parse_err("&& ls").message, "`&&` can only follow a command");
    assert_eq!(parse_err("ls &&").message, "`&&` must be followed by a command");
    assert_eq!(parse_err("ls ||").message, "`||` must be followed by a command");
    assert_eq!(parse_err("ls |").message, "`|` must be followed by a command");
    assert_eq!(parse_err("echo >").message, "> must be followed by a word");
}

#[test]
fn test_leftover_tokens() {
    assert_eq!(parse_err("echo a )").message, "unexpected `)`");
    assert_eq!(parse_err("ls ;; ls").message, "`;;` can only follow a command");
}

#[test]
fn test_error_position() {
    let err = parse_err("echo ok\necho 'bad");
    assert_eq!((err.line, err.column), (2, 6));
    assert_eq!(err.offset(), 13);
    assert_eq!(err.to_string(), "2:6: reached end of input without closing quote `'`");
}

#[test]
fn test_offset_to_line_col() {
    assert_eq!(offset_to_line_col("abc", 0), (1, 1));
    assert_eq!(offset_to_line_col("ab\ncd", 4), (2, 2));
    assert_eq!(offset_to_line_col("ab", 99), (1, 3));
}
