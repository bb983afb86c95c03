//! Shell-like splitting of slash-command text.
//!
//! Spaces separate tokens except inside quotes. Straight quotes and both
//! typographic quotes (which Slack clients substitute automatically) are
//! interchangeable as opening and closing marks.

const QUOTE_MARKS: [char; 3] = ['"', '\u{201C}', '\u{201D}'];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    InToken,
    Quoted,
}

fn is_quote(ch: char) -> bool {
    QUOTE_MARKS.contains(&ch)
}

/// Splits `text` into tokens, keeping quoted spans together.
///
/// A quote can open in the middle of a token (`foo"bar baz"` is one token),
/// runs of spaces inside quotes collapse to one, and an unterminated quote
/// still yields its partial token. Empty tokens are never produced.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let mut state = State::Idle;

    for ch in text.chars() {
        state = match (state, ch) {
            (State::Idle, ' ') => State::Idle,
            (State::Idle, ch) if is_quote(ch) => State::Quoted,
            (State::Idle, ch) => {
                buffer.push(ch);
                State::InToken
            }
            (State::InToken, ' ') => {
                flush(&mut buffer, &mut tokens);
                State::Idle
            }
            (State::InToken, ch) if is_quote(ch) => State::Quoted,
            (State::InToken, ch) => {
                buffer.push(ch);
                State::InToken
            }
            (State::Quoted, ch) if is_quote(ch) => State::InToken,
            (State::Quoted, ' ') => {
                if !buffer.is_empty() && !buffer.ends_with(' ') {
                    buffer.push(' ');
                }
                State::Quoted
            }
            (State::Quoted, ch) => {
                buffer.push(ch);
                State::Quoted
            }
        };
    }

    flush(&mut buffer, &mut tokens);
    tokens
}

fn flush(buffer: &mut String, tokens: &mut Vec<String>) {
    if !buffer.is_empty() {
        tokens.push(std::mem::take(buffer));
    }
}
