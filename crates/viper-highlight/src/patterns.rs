//! Regex sources for the built-in rule tables.

/// `"..."` or `'...'`, non-greedy, single line.
pub(crate) const GENERAL_STRINGS: &str = r#""(.*?)"|'(.*?)'"#;

/// Word-bounded decimal literal.
pub(crate) const NUMBERS: &str = r"\b\d*\.?\d+\b";

/// Operators and punctuation (share the number color).
pub(crate) const SYMBOLS: &str = r"[!,()+\-*<>=.?;{}\[\]|]";

/// Block, `//` and `#` comments.
///
/// A `//` directly after `:` is rejected by the rule guard, so URLs survive.
pub(crate) const GENERAL_COMMENTS: &str = r"/\*(?s:.*?)\*/|//.*|#.*";

/// Block and `#` comments only (property/conf/markdown files).
pub(crate) const HASH_COMMENTS: &str = r"/\*(?s:.*?)\*/|#.*";

/// Block comments only.
pub(crate) const BLOCK_COMMENTS: &str = r"/\*(?s:.*?)\*/";

/// SQL comments.
pub(crate) const SQL_COMMENTS: &str = r"--.*|/\*(?s:.*?)\*/";

/// Markup comments.
pub(crate) const XML_COMMENTS: &str = r"(?s)<!--.*?-->";

/// Opening or closing tag: group 1 is `<name` / `</name`, group 2 is `>` / `/>`.
pub(crate) const HTML_TAGS: &str =
    r#"(</?[A-Za-z][A-Za-z0-9:-]*)\b(?:"[^"]*"|'[^']*'|[^'">])*?(/?>)"#;

/// Attribute name before `=` (group 1).
pub(crate) const HTML_ATTRS: &str = r"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=";

/// CSS property name (group 1).
pub(crate) const CSS_ATTRS: &str = r"(?m)(?:^|[{;])\s*([A-Za-z-]+)\s*:";

/// CSS property value (group 1).
pub(crate) const CSS_ATTR_VALUE: &str = r":[ \t]*([^;{}\n]+);";

/// PHP-style `$name` variables.
pub(crate) const PHP_VARIABLES: &str = r"\$\s*(\w+)";

/// Web links in markdown.
pub(crate) const LINKS: &str = r#"(?:https?|ftp)://[^\s<>"'()\[\]]+|www\.[^\s<>"'()\[\]]+"#;

pub(crate) const GENERAL_KEYWORDS: &str = concat!(
    r"(?i)\b(?:",
    "alignas|alignof|and|and_eq|asm|auto|bitand|bitor|bool|break|case|catch|char|",
    "char16_t|char32_t|class|compl|const|constexpr|const_cast|continue|decltype|",
    "default|delete|do|double|dynamic_cast|echo|else|enum|explicit|export|extern|",
    "false|float|for|friend|function|goto|if|inline|int|mutable|namespace|new|noexcept|",
    "not|not_eq|null|nullptr|operator|or|or_eq|private|protected|public|register|",
    "reinterpret_cast|return|short|signed|sizeof|static|static_assert|static_cast|",
    "struct|switch|template|this|thread_local|throw|true|try|typedef|typeid|typename|",
    "undefined|union|unsigned|using|var|virtual|void|volatile|wchar_t|while|xor|xor_eq",
    r")\b"
);

pub(crate) const PY_KEYWORDS: &str = concat!(
    r"(?i)\b(?:",
    "int|float|long|complex|str|unicode|list|tuple|bytearray|buffer|xrange|set|frozenset|",
    "dict|bool|True|False|None|self|NotImplemented|Ellipsis|__debug__|__file__|",
    "and|del|from|not|while|as|elif|global|or|with|assert|else|if|pass|yield|break|",
    "except|import|print|class|exec|in|raise|continue|finally|is|return|def|for|lambda|try|",
    "ArithmeticError|AssertionError|AttributeError|BaseException|DeprecationWarning|",
    "EnvironmentError|EOFError|Exception|FloatingPointError|FutureWarning|GeneratorExit|",
    "IOError|ImportError|ImportWarning|IndexError|KeyError|KeyboardInterrupt|LookupError|",
    "MemoryError|NameError|NotImplementedError|OSError|OverflowError|",
    "PendingDeprecationWarning|ReferenceError|RuntimeError|RuntimeWarning|StandardError|",
    "StopIteration|SyntaxError|SyntaxWarning|SystemError|SystemExit|TypeError|",
    "UnboundLocalError|UserWarning|UnicodeError|UnicodeWarning|UnicodeEncodeError|",
    "UnicodeDecodeError|UnicodeTranslateError|ValueError|Warning|WindowsError|",
    "ZeroDivisionError",
    r")\b"
);

pub(crate) const LUA_KEYWORDS: &str = concat!(
    r"@[A-Za-z0-9_.]*|\b(?:",
    "local|global|boolean|number|userdata|true|false|nil|return|then|while|and|break|do|",
    "else|elseif|end|for|function|if|in|not|or|repeat|until|thread|table",
    r")\b|(?i)\b(?:",
    r"assert|collectgarbage|coroutine\.create|coroutine\.resume|coroutine\.running|",
    r"coroutine\.status|coroutine\.wrap|coroutine\.yield|debug\.traceback|dofile|error|",
    r"getmetatable|io\.close|io\.flush|io\.input|io\.lines|io\.open|io\.output|io\.popen|",
    r"io\.read|io\.write|ipairs|load|loadfile|loadstring|math\.abs|math\.ceil|math\.floor|",
    r"math\.max|math\.min|math\.random|math\.sqrt|module|next|os\.clock|os\.date|",
    r"os\.execute|os\.exit|os\.getenv|os\.remove|os\.rename|os\.time|pairs|pcall|print|",
    r"rawequal|rawget|rawset|require|select|setmetatable|string\.byte|string\.char|",
    r"string\.find|string\.format|string\.gmatch|string\.gsub|string\.len|string\.lower|",
    r"string\.match|string\.rep|string\.sub|string\.upper|table\.concat|table\.insert|",
    r"table\.remove|table\.sort|tonumber|tostring|type|unpack|xpcall",
    r")\b"
);

pub(crate) const SQL_KEYWORDS: &str = concat!(
    r"(?i)\b(?:",
    "ADD|EXCEPT|PERCENT|ALL|EXEC|PLAN|ALTER|EXECUTE|PRECISION|AND|EXISTS|PRIMARY|ANY|EXIT|",
    "PRINT|AS|FETCH|PROC|ASC|FILE|PROCEDURE|AUTHORIZATION|FILLFACTOR|PUBLIC|BACKUP|FOR|",
    "RAISERROR|BEGIN|FOREIGN|READ|BETWEEN|FREETEXT|READTEXT|BREAK|FREETEXTTABLE|",
    "RECONFIGURE|BROWSE|FROM|REFERENCES|BULK|FULL|REPLICATION|BY|FUNCTION|RESTORE|CASCADE|",
    "GOTO|RESTRICT|CASE|GRANT|RETURN|CHECK|GROUP|REVOKE|CHECKPOINT|HAVING|RIGHT|CLOSE|",
    "HOLDLOCK|ROLLBACK|CLUSTERED|IDENTITY|ROWCOUNT|COALESCE|IDENTITY_INSERT|ROWGUIDCOL|",
    "COLLATE|IDENTITYCOL|RULE|COLUMN|IF|SAVE|COMMIT|IN|SCHEMA|COMPUTE|INDEX|SELECT|",
    "CONSTRAINT|INNER|SESSION_USER|CONTAINS|INSERT|SET|CONTAINSTABLE|INTERSECT|SETUSER|",
    "CONTINUE|INTO|SHUTDOWN|CONVERT|IS|SOME|CREATE|JOIN|STATISTICS|CROSS|KEY|SYSTEM_USER|",
    "CURRENT|KILL|TABLE|CURRENT_DATE|LEFT|TEXTSIZE|CURRENT_TIME|LIKE|THEN|",
    "CURRENT_TIMESTAMP|LINENO|TO|CURRENT_USER|LOAD|TOP|CURSOR|NATIONAL|TRAN|DATABASE|",
    "NOCHECK|TRANSACTION|DBCC|NONCLUSTERED|TRIGGER|DEALLOCATE|NOT|TRUNCATE|DECLARE|NULL|",
    "TSEQUAL|DEFAULT|NULLIF|UNION|DELETE|OF|UNIQUE|DENY|OFF|UPDATE|DESC|OFFSETS|UPDATETEXT|",
    "DISK|ON|USE|DISTINCT|OPEN|USER|DISTRIBUTED|OPENDATASOURCE|VALUES|DOUBLE|OPENQUERY|",
    "VARYING|DROP|OPENROWSET|VIEW|DUMMY|OPENXML|WAITFOR|DUMP|OPTION|WHEN|ELSE|OR|WHERE|END|",
    "ORDER|WHILE|ERRLVL|OUTER|WITH|ESCAPE|OVER|WRITETEXT",
    r")\b"
);
