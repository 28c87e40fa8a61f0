// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use bloblang::unstable::*;
use serde::{Deserialize, Serialize};
use std::env;
use test_generator::test_resources;

fn get_tokens(source: &Source) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut lex = Lexer::new(source);
    loop {
        let tok = lex.next_token()?;
        tokens.push(tok.clone());
        if tok.0 == TokenKind::Eof {
            break;
        }
    }

    Ok(tokens)
}

// The token's line and column must point at the first character of its text.
fn check_loc(tok: &Token) -> Result<()> {
    let line = tok.1.source.line(tok.1.line.saturating_sub(1));
    let rest: String = line.chars().skip(tok.1.col as usize - 1).collect();
    let first = tok.1.text().split('\n').next().unwrap_or_default();
    if !rest.starts_with(first) {
        bail!(
            "location mismatch for {tok:?}{}",
            tok.1.message("mismatch-error", first)
        );
    }
    Ok(())
}

#[test]
#[ignore = "intended for lexing a single mapping file"]
fn one_file() -> Result<()> {
    let Some(file) = env::args().find(|a| a.ends_with(".blobl")) else {
        bail!("missing <mapping.blobl>")
    };

    let source = Source::from_file(&file)?;
    for tok in &get_tokens(&source)? {
        if tok.0 == TokenKind::Eof {
            break;
        }
        check_loc(tok)?;
        println!("{:?}", tok);
    }

    Ok(())
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Case {
    pub mapping: String,
    pub note: String,
    #[serde(default)]
    pub tokens: Vec<String>,
    pub kinds: Option<Vec<String>>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {}", file);

    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        let source = Source::from_contents("case.blobl".to_string(), case.mapping.clone())?;

        print!("case {} ", &case.note);

        match get_tokens(&source) {
            Ok(tokens) => {
                if let Some(e) = &case.error {
                    bail!("expected error `{e}` but lexing succeeded: {tokens:?}");
                }
                for (idx, tok) in tokens.iter().enumerate() {
                    if idx >= case.tokens.len() {
                        break;
                    }
                    assert_eq!(
                        tok.1.text(),
                        case.tokens[idx],
                        "{} Expected token `{}` not found",
                        tok.1.message("mismatch-error", &case.tokens[idx]),
                        &case.tokens[idx]
                    );

                    if let Some(k) = &case.kinds {
                        if idx >= k.len() {
                            break;
                        }
                        assert_eq!(
                            format!("{:?}", tok.0),
                            k[idx],
                            "{}",
                            tok.1.message("mismatch-error", "token kind mismatch")
                        );
                    }

                    check_loc(tok)?;
                }
                assert_eq!(
                    tokens.len(),
                    case.tokens.len(),
                    "\n. Token count mismatch.\nLexed tokens:{:?}",
                    tokens
                );
                if let Some(k) = &case.kinds {
                    assert_eq!(
                        tokens.len(),
                        k.len(),
                        "\n. Kind count mismatch.\nLexed tokens:{:?}",
                        tokens
                    );
                }
            }
            Err(actual) => match &case.error {
                Some(expected) => {
                    let actual = actual.to_string();
                    if !actual.contains(expected) {
                        bail!(
                            "Error message\n`{}\n`\ndoes not contain `{}`",
                            actual,
                            expected
                        );
                    }
                }
                _ => return Err(actual),
            },
        }

        println!("passed");
    }
    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
#[ignore = "intended for running a single yaml file"]
fn one_yaml() -> Result<()> {
    let Some(file) = env::args().find(|a| a.ends_with(".yaml")) else {
        bail!("missing yaml test file");
    };

    yaml_test(file.as_str())
}

#[test_resources("tests/lexer/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
fn eof_sits_after_trailing_newline() -> Result<()> {
    let source = Source::from_contents("eof".to_string(), "root = 1\n".to_string())?;
    let tokens = get_tokens(&source)?;
    let eof = &tokens[tokens.len() - 1];
    assert_eq!(eof.0, TokenKind::Eof);
    assert_eq!((eof.1.line, eof.1.col), (2, 1));
    assert_eq!(eof.1.start as usize, source.contents().len());
    Ok(())
}

#[test]
fn lexing_from_an_offset() -> Result<()> {
    let source = Source::from_contents("field".to_string(), "id-${! this.id }".to_string())?;
    let mut lex = Lexer::new_at(&source, 6);
    let tok = lex.next_token()?;
    assert_eq!(tok.0, TokenKind::Ident);
    assert_eq!(tok.1.text(), "this");
    assert_eq!((tok.1.line, tok.1.col, tok.1.start), (1, 8, 7));
    Ok(())
}
