//! Structural parser.
//!
//! Breaks script text into a tree of blocks, lines and atoms. No semantic
//! knowledge lives here: a word is a word until the evaluator decides whether
//! it is a keyword, a note name or a plain string.

use crate::error::EvalError;

/// One token of a line: a bare word, a quoted string, or a nested block.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Word(String),
    Str(String),
    Block(Block),
}

/// Ordered atoms; the first one is inspected as a candidate keyword name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub atoms: Vec<Atom>,
}

/// Ordered lines between `{` and `}` (or the whole script).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub lines: Vec<Line>,
}

impl Line {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Line { atoms }
    }
}

impl Block {
    pub fn new(lines: Vec<Line>) -> Self {
        Block { lines }
    }
}

// One nesting level while lexing: finished lines plus the line being built.
#[derive(Default)]
struct Level {
    lines: Vec<Line>,
    line: Vec<Atom>,
}

fn flush_word(word: &mut String, level: &mut Level) {
    if !word.is_empty() {
        level.line.push(Atom::Word(std::mem::take(word)));
    }
}

fn flush_line(level: &mut Level) {
    if !level.line.is_empty() {
        level.lines.push(Line::new(std::mem::take(&mut level.line)));
    }
}

/// Reads a quoted string after the opening `"`. `\"` and `\\` escape.
fn read_string(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<String, EvalError> {
    let mut buf = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(buf),
            Some('\\') => match chars.peek() {
                Some('"') | Some('\\') => {
                    buf.push(chars.next().unwrap_or_default());
                }
                _ => buf.push('\\'),
            },
            Some(c) => buf.push(c),
            None => return Err(EvalError::Syntax("unterminated string literal".into())),
        }
    }
}

/// Reads a `config "path";` directive after the `config` word.
fn read_config(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<String, EvalError> {
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
    match chars.next() {
        Some('"') => {}
        _ => return Err(EvalError::Syntax("expected a string after 'config'".into())),
    }
    let path = read_string(chars)?;
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
    match chars.next() {
        Some(';') => Ok(path),
        _ => Err(EvalError::Syntax("expected ';' after 'config' directive".into())),
    }
}

/// Skips a `/* ... */` comment; the leading `/*` is already consumed.
fn skip_block_comment(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<(), EvalError> {
    let mut prev = '\0';
    for c in chars.by_ref() {
        if prev == '*' && c == '/' {
            return Ok(());
        }
        prev = c;
    }
    Err(EvalError::Syntax("unterminated '/*' comment".into()))
}

/// Lexes a whole script into its root block, extracting the optional
/// `config "path";` directive on the way.
///
/// Every line must be terminated by `;` before a `}` or the end of input.
pub fn lex(source: &str) -> Result<(Block, Option<String>), EvalError> {
    // The stack always holds at least the root level.
    fn top(stack: &mut Vec<Level>) -> &mut Level {
        stack.last_mut().expect("lexer stack is never empty")
    }

    let mut stack: Vec<Level> = vec![Level::default()];
    let mut word = String::new();
    let mut config: Option<String> = None;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        // Comments only start at a word boundary, so accidentals like C# keep
        // their '#'.
        if c == '#' && word.is_empty() {
            for c in chars.by_ref() {
                if c == '\n' {
                    break;
                }
            }
            continue;
        }
        if c == '*' && word.ends_with('/') {
            word.pop();
            skip_block_comment(&mut chars)?;
            continue;
        }

        match c {
            c if c.is_whitespace() => {
                if word == "config" {
                    word.clear();
                    config = Some(read_config(&mut chars)?);
                } else {
                    flush_word(&mut word, top(&mut stack));
                }
            }
            ';' => {
                let level = top(&mut stack);
                flush_word(&mut word, level);
                flush_line(level);
            }
            '{' => {
                flush_word(&mut word, top(&mut stack));
                stack.push(Level::default());
            }
            '}' => {
                if !word.is_empty() || !top(&mut stack).line.is_empty() {
                    return Err(EvalError::Syntax(
                        "line did not end before end of block".into(),
                    ));
                }
                let closed = stack.pop().expect("lexer stack is never empty");
                let parent = stack
                    .last_mut()
                    .ok_or_else(|| EvalError::Syntax("unmatched '}'".into()))?;
                parent.line.push(Atom::Block(Block::new(closed.lines)));
            }
            '"' => {
                let s = read_string(&mut chars)?;
                let level = top(&mut stack);
                flush_word(&mut word, level);
                level.line.push(Atom::Str(s));
            }
            _ => word.push(c),
        }
    }

    if stack.len() > 1 {
        return Err(EvalError::Syntax("unmatched '{'".into()));
    }
    let root = stack.pop().expect("lexer stack is never empty");
    if !word.is_empty() || !root.line.is_empty() {
        return Err(EvalError::Syntax(
            "line did not end before end of input".into(),
        ));
    }
    Ok((Block::new(root.lines), config))
}
