//! Line ending detection and conversion.
//!
//! The buffer always holds LF-only text. The ending found on load is remembered so the file is
//! written back the way it came.

use std::fmt;

/// Newline sequence used by a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `"\n"`
    #[default]
    Lf,
    /// `"\r\n"`
    Crlf,
    /// `"\r"` (classic Mac OS)
    Cr,
}

impl LineEnding {
    /// Ending of the first line break in `text`; [`LineEnding::Lf`] when there is none.
    pub fn detect(text: &str) -> Self {
        match text.find(['\r', '\n']) {
            Some(i) if text[i..].starts_with("\r\n") => Self::Crlf,
            Some(i) if text.as_bytes()[i] == b'\r' => Self::Cr,
            _ => Self::Lf,
        }
    }

    /// The newline sequence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Convert LF-only text to this ending.
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Lf => text.to_string(),
            other => text.replace('\n', other.as_str()),
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lf => "LF",
            Self::Crlf => "CRLF",
            Self::Cr => "CR",
        })
    }
}

/// Replace every `"\r\n"` and lone `'\r'` with `'\n'`.
pub fn normalize(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
