//! Loading and saving text files.
//!
//! Loading detects the character encoding and line ending and hands back LF-only text. Saving
//! reverses both steps. When a read or write is refused by the OS and an acquired
//! [`ShellSession`] is available, the bytes go through the shell instead.

use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use tracing::{debug, warn};

use crate::error::FileError;
use crate::line_ending::{self, LineEnding};
use crate::shell::ShellSession;

/// How files are decoded and where privileged access comes from.
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Detect the encoding from the file's bytes.
    pub auto_encoding: bool,
    /// Encoding used when detection is off or inconclusive.
    pub default_encoding: &'static Encoding,
    /// Session for files the current user cannot access.
    pub shell: Option<ShellSession>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            auto_encoding: true,
            default_encoding: UTF_8,
            shell: None,
        }
    }
}

impl FileOptions {
    /// Options with the default encoding given by `label` (e.g. `"UTF-8"`, `"latin1"`).
    pub fn with_encoding_label(label: &str) -> Result<Self, FileError> {
        Ok(Self {
            default_encoding: encoding_for_label(label)?,
            ..Self::default()
        })
    }

    fn usable_shell(&self) -> Option<&ShellSession> {
        self.shell.as_ref().filter(|shell| shell.is_acquired())
    }
}

/// A decoded file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFile {
    /// LF-only text.
    pub text: String,
    /// Encoding the bytes were decoded with.
    pub encoding: &'static Encoding,
    /// Line ending found in the file.
    pub line_ending: LineEnding,
    /// File name without directories.
    pub file_name: String,
    /// Lowercase extension, empty if none.
    pub extension: String,
}

/// Resolve an encoding label (WHATWG names and aliases, case-insensitive).
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, FileError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| FileError::UnknownEncoding(label.to_string()))
}

/// Pick the encoding for `bytes` and the length of any byte order mark.
pub fn detect_encoding(bytes: &[u8], fallback: &'static Encoding) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, 0);
    }
    // Invalid UTF-8 needs a single-byte fallback that can decode anything.
    if fallback == UTF_8 {
        (WINDOWS_1252, 0)
    } else {
        (fallback, 0)
    }
}

/// Decode `bytes` into LF-only text.
pub fn decode(bytes: &[u8], options: &FileOptions) -> (String, &'static Encoding, LineEnding) {
    let (encoding, raw) = if options.auto_encoding {
        let (encoding, bom_len) = detect_encoding(bytes, options.default_encoding);
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            warn!(encoding = encoding.name(), "malformed input replaced while decoding");
        }
        (encoding, text)
    } else {
        let encoding = options.default_encoding;
        let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
        if had_errors {
            warn!(encoding = encoding.name(), "malformed input replaced while decoding");
        }
        (encoding, text)
    };

    let ending = LineEnding::detect(&raw);
    (line_ending::normalize(&raw), encoding, ending)
}

/// Encode LF-only `text` with `line_ending` applied.
///
/// UTF-16 output carries no byte order mark.
pub fn encode(
    text: &str,
    encoding: &'static Encoding,
    line_ending: LineEnding,
) -> Result<Vec<u8>, FileError> {
    let text = line_ending.apply(text);
    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }

    let (bytes, used, had_errors) = encoding.encode(&text);
    if had_errors || used != encoding.output_encoding() {
        return Err(FileError::Unencodable {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(bytes.into_owned())
}

/// Read and decode `path`.
pub fn load_file(path: impl AsRef<Path>, options: &FileOptions) -> Result<LoadedFile, FileError> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            let err = FileError::io(path, err);
            match options.usable_shell() {
                Some(shell) if err.is_permission_denied() => {
                    debug!(path = %path.display(), "reading through shell session");
                    shell.read_file(&path.to_string_lossy())?
                }
                _ => return Err(err),
            }
        }
    };

    let (text, encoding, line_ending) = decode(&bytes, options);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = viper_lang::extension_of(&file_name);
    debug!(
        path = %path.display(),
        encoding = encoding.name(),
        %line_ending,
        chars = text.chars().count(),
        "file loaded"
    );

    Ok(LoadedFile {
        text,
        encoding,
        line_ending,
        file_name,
        extension,
    })
}

/// Encode and write `text` to `path`, creating or truncating it.
pub fn save_file(
    path: impl AsRef<Path>,
    text: &str,
    encoding: &'static Encoding,
    line_ending: LineEnding,
    options: &FileOptions,
) -> Result<(), FileError> {
    let path = path.as_ref();
    let bytes = encode(text, encoding, line_ending)?;
    if let Err(err) = fs::write(path, &bytes) {
        let err = FileError::io(path, err);
        match options.usable_shell() {
            Some(shell) if err.is_permission_denied() => {
                debug!(path = %path.display(), "writing through shell session");
                shell.write_file(&path.to_string_lossy(), &bytes)?;
            }
            _ => return Err(err),
        }
    }
    debug!(path = %path.display(), encoding = encoding.name(), %line_ending, "file saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_bom_and_utf8() {
        assert_eq!(detect_encoding(b"\xEF\xBB\xBFhi", UTF_8), (UTF_8, 3));
        assert_eq!(detect_encoding(b"\xFF\xFEh\0", UTF_8), (UTF_16LE, 2));
        assert_eq!(detect_encoding(b"\xFE\xFF\0h", UTF_8), (UTF_16BE, 2));
        assert_eq!(detect_encoding("héllo".as_bytes(), WINDOWS_1252), (UTF_8, 0));
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_single_byte() {
        let latin = b"caf\xE9";
        assert_eq!(detect_encoding(latin, UTF_8), (WINDOWS_1252, 0));

        let (text, encoding, _) = decode(latin, &FileOptions::default());
        assert_eq!(text, "café");
        assert_eq!(encoding, WINDOWS_1252);
    }

    #[test]
    fn test_decode_normalizes_line_endings() {
        let (text, _, ending) = decode(b"a\r\nb\r\n", &FileOptions::default());
        assert_eq!(text, "a\nb\n");
        assert_eq!(ending, LineEnding::Crlf);
    }

    #[test]
    fn test_decode_with_fixed_encoding() {
        let options = FileOptions {
            auto_encoding: false,
            ..FileOptions::with_encoding_label("latin1").unwrap()
        };
        let (text, encoding, _) = decode("é".as_bytes(), &options);
        assert_eq!(encoding, WINDOWS_1252);
        assert_eq!(text, "Ã©");
    }

    #[test]
    fn test_encode_utf16_and_unencodable() {
        assert_eq!(encode("a\n", UTF_16LE, LineEnding::Lf).unwrap(), b"a\0\n\0");
        assert_eq!(encode("a", UTF_16BE, LineEnding::Lf).unwrap(), b"\0a");
        assert!(matches!(
            encode("日本", WINDOWS_1252, LineEnding::Lf),
            Err(FileError::Unencodable { .. })
        ));
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            encoding_for_label("klingon"),
            Err(FileError::UnknownEncoding(_))
        ));
    }
}
