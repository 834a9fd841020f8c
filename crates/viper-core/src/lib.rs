#![warn(missing_docs)]
//! Viper Core - Headless Editable-Text Engine
//!
//! # Overview
//!
//! `viper-core` is the text engine behind the Viper editor. It owns a document and keeps the
//! state a renderer needs in step with every edit: undo/redo history, syntax highlight spans
//! for the visible window, soft-wrap layout and gutter line numbers. It draws nothing.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextCore (edit / undo / redo / highlight)  │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  EventBus + LatestJob                       │  ← Notifications, background work
//! ├─────────────────────────────────────────────┤
//! │  HighlightDriver (viper-highlight)          │  ← Windowed color spans
//! ├─────────────────────────────────────────────┤
//! │  Viewport + WrapLayout + LineMapper         │  ← Geometry, line numbers
//! ├─────────────────────────────────────────────┤
//! │  EditHistory                                │  ← Linear undo log
//! ├─────────────────────────────────────────────┤
//! │  Document (rope)                            │  ← Text storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Files, paging, persisted history and the directory browser sit beside the core and are
//! used by front ends.
//!
//! # Quick Start
//!
//! ```rust
//! use viper_core::TextCore;
//!
//! let mut core = TextCore::new("hello world");
//! core.replace(0, 5, "goodbye").unwrap();
//! assert_eq!(core.text(), "goodbye world");
//!
//! core.undo();
//! assert_eq!(core.text(), "hello world");
//! // The cursor ends where the restored text ends.
//! assert_eq!(core.cursor(), 5);
//! ```
//!
//! ## Highlighting and line numbers
//!
//! ```rust
//! use viper_core::{TextCore, Viewport, LayoutGeometry};
//! use viper_highlight::{ColorCategory, HighlightDriver};
//!
//! let mut core = TextCore::with_highlighter(
//!     "int a;\n// note\n",
//!     Box::new(HighlightDriver::new("c")),
//! );
//! let rows = core.layout().visual_line_count();
//! core.set_viewport(Viewport::rows(0, 24, rows));
//!
//! assert_eq!(core.spans()[0].category, ColorCategory::Keyword);
//! let gutter: Vec<_> = core.line_map().numbered_lines().collect();
//! assert_eq!(gutter, vec![(0, 1), (1, 2), (2, 3)]);
//! ```
//!
//! # Offsets
//!
//! Every public offset is a character offset (Unicode scalar value) into LF-only text.

pub mod browse;
pub mod buffer;
pub mod config;
pub mod error;
pub mod events;
pub mod files;
pub mod history;
pub mod layout;
pub mod line_ending;
pub mod line_map;
pub mod paging;
pub mod persist;
pub mod search;
pub mod shell;
pub mod text_core;
pub mod viewport;
pub mod worker;

pub use browse::{FileEntry, alphanum_cmp, list_directory};
pub use buffer::Document;
pub use config::EditorConfig;
pub use error::{ConfigError, EditError, FileError, RestoreError, ShellError, StoreError};
pub use events::{EditorEvent, EventBus, EventSender};
pub use files::{FileOptions, LoadedFile, load_file, save_file};
pub use history::{EditHistory, EditItem};
pub use layout::{LayoutGeometry, WrapLayout};
pub use line_ending::LineEnding;
pub use line_map::{LineMap, LineMapper};
pub use paging::PageSystem;
pub use persist::{JsonFileStore, KeyValueStore, MemoryStore};
pub use search::{SearchMatch, SearchOptions, SearchResult};
pub use shell::ShellSession;
pub use text_core::{EditMode, Selection, TextCore};
pub use viewport::{CHARS_TO_COLOR, Viewport};
pub use worker::LatestJob;
