//! Lexical analysis: splitting one input line into shell words.

use thiserror::Error;

/// One word produced by the lexer.
///
/// `quoted` is set when any part of the word came from a quoted span or a
/// backslash escape. The redirection parser refuses to treat such tokens as
/// operators, so `'>'` stays an ordinary argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub quoted: bool,
}

impl Token {
    pub fn word(text: impl Into<String>) -> Self {
        Token {
            text: text.into(),
            quoted: false,
        }
    }
}

/// Errors that can occur during lexical analysis.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    /// A closing quote (single or double) was not found before end of input.
    #[error("syntax error: unterminated quote")]
    UnterminatedQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Start,
    Word,
    SingleQuote,
    DoubleQuote,
}

struct LexingFsm {
    input: Vec<char>,
    pos: usize,
    state: LexState,
    buffer: String,
    // whether the token being built saw a quote or an escape
    quoted: bool,
}

impl LexingFsm {
    fn new(line: &str) -> Self {
        LexingFsm {
            input: line.chars().collect(),
            pos: 0,
            state: LexState::Start,
            buffer: String::new(),
            quoted: false,
        }
    }

    fn make_tokens(&mut self) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexState::Start => self.handle_start(ch),
                LexState::Word => self.handle_word(ch, &mut out),
                LexState::SingleQuote => self.handle_single_quote(ch),
                LexState::DoubleQuote => self.handle_double_quote(ch),
            }
        }

        match self.state {
            LexState::SingleQuote | LexState::DoubleQuote => {
                return Err(LexError::UnterminatedQuote);
            }
            _ => {}
        }

        self.finish_token(&mut out);
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char) {
        match ch {
            ' ' | '\t' => {}
            '\'' => {
                self.quoted = true;
                self.state = LexState::SingleQuote;
            }
            '"' => {
                self.quoted = true;
                self.state = LexState::DoubleQuote;
            }
            '\\' => {
                self.escape_next();
                self.state = LexState::Word;
            }
            c => {
                self.buffer.push(c);
                self.state = LexState::Word;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            ' ' | '\t' => {
                self.finish_token(out);
                self.state = LexState::Start;
            }
            '\'' => {
                self.quoted = true;
                self.state = LexState::SingleQuote;
            }
            '"' => {
                self.quoted = true;
                self.state = LexState::DoubleQuote;
            }
            '\\' => self.escape_next(),
            c => self.buffer.push(c),
        }
    }

    // Everything up to the closing quote is literal; backslash included.
    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexState::Word,
            c => self.buffer.push(c),
        }
    }

    // Backslash is special only before `"` and `\`; otherwise it is data.
    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexState::Word,
            '\\' => match self.input.get(self.pos).copied() {
                Some(next @ ('"' | '\\')) => {
                    self.pos += 1;
                    self.buffer.push(next);
                }
                _ => self.buffer.push('\\'),
            },
            c => self.buffer.push(c),
        }
    }

    /// Unescaped backslash outside quotes: the backslash itself is dropped
    /// and the following character is taken literally. A backslash at end of
    /// input has nothing to escape and stays in the token as-is.
    fn escape_next(&mut self) {
        self.quoted = true;
        match self.read_char() {
            Some(next) => self.buffer.push(next),
            None => self.buffer.push('\\'),
        }
    }

    /// Emit the pending token, if any. A token with an empty buffer is still
    /// emitted when it came from quotes (`''` is a real, zero-length word).
    fn finish_token(&mut self, out: &mut Vec<Token>) {
        if !self.buffer.is_empty() || self.quoted {
            out.push(Token {
                text: std::mem::take(&mut self.buffer),
                quoted: self.quoted,
            });
        }
        self.quoted = false;
    }
}

/// Tokenize one line of input (no trailing newline) into shell words.
///
/// Returns an error when a quote span is still open at end of input; nothing
/// from such a line should be executed.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = LexingFsm::new(line);
    lexer.make_tokens()
}
