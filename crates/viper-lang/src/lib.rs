#![warn(missing_docs)]
//! `viper-lang` - data-driven file extension tables for `viper-core`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any regex or
//! highlighting machinery. It answers two questions about a file extension:
//!
//! - which highlighting rule family applies ([`LanguageFamily`])
//! - what kind of file it is for a browser listing ([`FileKind`])
//!
//! Extensions are compared case-insensitively and without the leading dot.

/// Extensions treated as plain text documents.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "ajx", "am", "asa", "asc", "asp", "aspx", "awk", "bat", "c", "cdf", "cf", "cfg", "cfm", "cgi",
    "cnf", "conf", "cc", "cpp", "css", "csv", "ctl", "dat", "dhtml", "diz", "file", "forward",
    "grp", "h", "hh", "hpp", "hqx", "hta", "htaccess", "htc", "htm", "html", "htpasswd", "htt",
    "htx", "in", "inc", "info", "ini", "ink", "java", "js", "jsp", "key", "latex", "log",
    "logfile", "m3u", "m4", "m4a", "mak", "map", "md", "markdown", "model", "msg", "nfo", "nsi",
    "old", "pas", "patch", "perl", "php", "php2", "php3", "php4", "php5", "php6", "phtml", "pix",
    "pl", "pm", "po", "pwd", "py", "qmail", "rb", "rbl", "rbw", "readme", "reg", "rss", "rtf",
    "ruby", "session", "setup", "sh", "shtm", "shtml", "sql", "ssh", "stm", "style", "svg", "tcl",
    "tex", "text", "threads", "tmpl", "tpl", "txt", "ubb", "vbs", "xhtml", "xml", "xrc", "xsl",
];

/// Extensions highlighted with the code rule family.
pub const CODE_EXTENSIONS: &[&str] = &[
    "cs", "php", "js", "java", "py", "rb", "aspx", "cshtml", "vbhtml", "go", "c", "h", "cc", "cpp",
    "hh", "hpp", "pl", "pm", "t", "pod", "m", "f", "for", "f90", "f95", "asp", "json", "wiki",
    "lua", "r", "rs",
];

/// Extensions of HTML documents.
pub const HTML_EXTENSIONS: &[&str] = &["htm", "html", "xhtml"];

/// Extensions of raster/vector pictures.
pub const PICTURE_EXTENSIONS: &[&str] = &[
    "bmp", "eps", "png", "jpeg", "jpg", "ico", "gif", "tiff", "webp",
];

/// Extensions of audio files.
pub const MUSIC_EXTENSIONS: &[&str] = &[
    "aac", "flac", "mp3", "mpga", "oga", "ogg", "opus", "webma", "wav",
];

/// Extensions of video files.
pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mp4", "mkv", "wmw", "ogv", "webm"];

/// Extensions of archives.
pub const ARCHIVE_EXTENSIONS: &[&str] = &[
    "7z", "arj", "bz2", "gz", "rar", "tar", "tgz", "zip", "xz",
];

/// Extensions of SQL scripts and database files.
pub const SQL_EXTENSIONS: &[&str] = &["sql", "mdf", "ndf", "ldf"];

/// Extensions of markdown documents.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdown", "markdown"];

fn normalize(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

fn listed(table: &[&str], ext: &str) -> bool {
    table.contains(&ext)
}

/// Keyword vocabulary used by the code rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordSet {
    /// Language-neutral superset of C-family keywords.
    General,
    /// Python keywords, builtins and exception names.
    Python,
    /// Lua keywords and standard library names.
    Lua,
}

/// Flags refining the plain-text rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlainFlags {
    /// Markdown document: no keywords, links highlighted.
    pub markdown: bool,
    /// Only block and `#` comments; `//` is not a comment (property/conf files).
    pub hash_comments_only: bool,
}

/// The highlighting rule family selected for a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFamily {
    /// HTML/XML style markup.
    Markup,
    /// Cascading style sheets.
    Css,
    /// C-like source code.
    Code {
        /// Keyword vocabulary.
        keywords: KeywordSet,
        /// Highlight `$name` variables (PHP).
        variables: bool,
    },
    /// SQL scripts.
    Sql,
    /// Anything else.
    Plain(PlainFlags),
}

impl LanguageFamily {
    /// Select the rule family for `ext`.
    ///
    /// Dispatch order matters: `htm`/`xml` substrings win over everything, then `css`
    /// substrings, then the code table, then the SQL table.
    pub fn from_extension(ext: &str) -> Self {
        let ext = normalize(ext);

        if ext.contains("htm") || ext.contains("xml") {
            return Self::Markup;
        }
        if ext.contains("css") {
            return Self::Css;
        }
        if listed(CODE_EXTENSIONS, &ext) {
            let keywords = match ext.as_str() {
                "lua" => KeywordSet::Lua,
                "py" => KeywordSet::Python,
                _ => KeywordSet::General,
            };
            return Self::Code {
                keywords,
                variables: ext == "php",
            };
        }
        if listed(SQL_EXTENSIONS, &ext) {
            return Self::Sql;
        }

        let markdown = listed(MARKDOWN_EXTENSIONS, &ext);
        Self::Plain(PlainFlags {
            markdown,
            hash_comments_only: markdown || ext == "prop" || ext.contains("conf"),
        })
    }
}

impl Default for LanguageFamily {
    fn default() -> Self {
        Self::Plain(PlainFlags::default())
    }
}

/// Coarse file classification used by directory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Directory entry.
    Directory,
    /// HTML document.
    Html,
    /// Source code.
    Code,
    /// SQL script.
    Sql,
    /// Markdown document.
    Markdown,
    /// Other text document.
    Text,
    /// Picture.
    Picture,
    /// Audio.
    Music,
    /// Video.
    Video,
    /// Archive.
    Archive,
    /// Unknown extension.
    Other,
}

impl FileKind {
    /// Classify a file by extension.
    pub fn from_extension(ext: &str) -> Self {
        let ext = normalize(ext);
        let tables: [(&[&str], FileKind); 9] = [
            (HTML_EXTENSIONS, Self::Html),
            (MARKDOWN_EXTENSIONS, Self::Markdown),
            (SQL_EXTENSIONS, Self::Sql),
            (CODE_EXTENSIONS, Self::Code),
            (TEXT_EXTENSIONS, Self::Text),
            (PICTURE_EXTENSIONS, Self::Picture),
            (MUSIC_EXTENSIONS, Self::Music),
            (VIDEO_EXTENSIONS, Self::Video),
            (ARCHIVE_EXTENSIONS, Self::Archive),
        ];

        tables
            .iter()
            .find(|(table, _)| listed(table, &ext))
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::Other)
    }

    /// Returns `true` if the editor should open this kind as text.
    pub fn is_editable(self) -> bool {
        matches!(
            self,
            Self::Html | Self::Code | Self::Sql | Self::Markdown | Self::Text | Self::Other
        )
    }
}

/// Extract the lowercase extension from a file name (`"Main.JAVA"` -> `"java"`).
///
/// Returns an empty string for names without an extension, including dotfiles like `.bashrc`.
pub fn extension_of(file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(dot) => name[dot + 1..].to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_wins_over_code_table() {
        assert_eq!(LanguageFamily::from_extension("html"), LanguageFamily::Markup);
        assert_eq!(LanguageFamily::from_extension("XML"), LanguageFamily::Markup);
        assert_eq!(LanguageFamily::from_extension("cshtml"), LanguageFamily::Markup);
    }

    #[test]
    fn test_code_keyword_sets() {
        assert_eq!(
            LanguageFamily::from_extension("py"),
            LanguageFamily::Code {
                keywords: KeywordSet::Python,
                variables: false
            }
        );
        assert_eq!(
            LanguageFamily::from_extension(".php"),
            LanguageFamily::Code {
                keywords: KeywordSet::General,
                variables: true
            }
        );
        assert_eq!(
            LanguageFamily::from_extension("lua"),
            LanguageFamily::Code {
                keywords: KeywordSet::Lua,
                variables: false
            }
        );
    }

    #[test]
    fn test_plain_flags() {
        let LanguageFamily::Plain(flags) = LanguageFamily::from_extension("md") else {
            panic!("markdown should be plain");
        };
        assert!(flags.markdown);
        assert!(flags.hash_comments_only);

        let LanguageFamily::Plain(flags) = LanguageFamily::from_extension("nginxconf") else {
            panic!("conf should be plain");
        };
        assert!(!flags.markdown);
        assert!(flags.hash_comments_only);

        assert_eq!(LanguageFamily::from_extension(""), LanguageFamily::default());
        assert_eq!(LanguageFamily::from_extension("sql"), LanguageFamily::Sql);
        assert_eq!(LanguageFamily::from_extension("less.css"), LanguageFamily::Css);
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(FileKind::from_extension("PNG"), FileKind::Picture);
        assert_eq!(FileKind::from_extension("java"), FileKind::Code);
        assert_eq!(FileKind::from_extension("txt"), FileKind::Text);
        assert_eq!(FileKind::from_extension("zip"), FileKind::Archive);
        assert_eq!(FileKind::from_extension("weird"), FileKind::Other);
        assert!(!FileKind::Picture.is_editable());
        assert!(FileKind::Other.is_editable());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Main.JAVA"), "java");
        assert_eq!(extension_of("/tmp/archive.tar.gz"), "gz");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of("README"), "");
    }
}
