//! Load/save of the XML configuration document (`bot_config.xml`).
//!
//! The document is a record-oriented export: every `<table>` element is one
//! entry whose fields are its direct `<column name="...">` children:
//!
//! ```xml
//! <table name="config">
//!     <column name="key">poll_interval</column>
//!     <column name="value">30</column>
//!     <column name="ettc">Polling interval in seconds</column>
//! </table>
//! ```
//!
//! Saving re-streams the original source and only rewrites the text of
//! changed value columns, so comments, attributes, unrelated elements and
//! whitespace survive untouched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::core::document::{ConfigDocument, ConfigEntry};

const TABLE: &[u8] = b"table";
const COLUMN: &[u8] = b"column";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("config document not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("malformed config document {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load and parse the configuration document.
pub fn load_document(path: &Path) -> Result<ConfigDocument, DocumentError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(DocumentError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(DocumentError::Io {
                action: "read config document",
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let source = String::from_utf8(bytes).map_err(|err| parse_error(path, err))?;
    let entries = parse_entries(&source).map_err(|message| parse_error(path, message))?;
    debug!(path = %path.display(), entries = entries.len(), "config document loaded");
    Ok(ConfigDocument::new(source, entries))
}

/// Atomically write the document back to `path` (temp file + rename).
///
/// Only dirty values are rewritten. A declaration header is added when the
/// source has none. The replaced file's permissions are kept.
pub fn save_document(document: &ConfigDocument, path: &Path) -> Result<(), DocumentError> {
    let rendered = render_document(document).map_err(|message| parse_error(path, message))?;
    write_atomic(path, &rendered)?;
    debug!(path = %path.display(), bytes = rendered.len(), "config document saved");
    Ok(())
}

fn parse_error(path: &Path, message: impl ToString) -> DocumentError {
    DocumentError::Parse {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Key,
    Value,
    Description,
}

impl Field {
    fn from_column_name(name: &str) -> Option<Self> {
        match name {
            "key" => Some(Self::Key),
            "value" => Some(Self::Value),
            "ettc" => Some(Self::Description),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// `<table>` with its index in document order.
    Table(usize),
    /// First column of its kind directly under table `.0`.
    Column(usize, Field),
    Other,
}

/// Element stack that maps XML events onto table/column positions.
///
/// Load and save both drive the same tracker, so table indices agree
/// between the parsed entries and the re-streamed output.
#[derive(Debug, Default)]
struct TableTracker {
    stack: Vec<Frame>,
    claimed: Vec<[bool; 3]>,
}

impl TableTracker {
    fn enter(&mut self, start: &BytesStart<'_>) -> Result<Frame, String> {
        let name = start.name();
        let frame = if name.as_ref() == TABLE {
            self.claimed.push([false; 3]);
            Frame::Table(self.claimed.len() - 1)
        } else if name.as_ref() == COLUMN {
            match self.stack.last().copied() {
                Some(Frame::Table(index)) => self.claim_column(index, start)?,
                _ => Frame::Other,
            }
        } else {
            Frame::Other
        };
        self.stack.push(frame);
        Ok(frame)
    }

    fn claim_column(&mut self, index: usize, start: &BytesStart<'_>) -> Result<Frame, String> {
        let Some(attr) = start
            .try_get_attribute("name")
            .map_err(|err| err.to_string())?
        else {
            return Ok(Frame::Other);
        };
        let name = attr.unescape_value().map_err(|err| err.to_string())?;
        let Some(field) = Field::from_column_name(&name) else {
            return Ok(Frame::Other);
        };
        let claimed = &mut self.claimed[index][field.slot()];
        if *claimed {
            return Ok(Frame::Other);
        }
        *claimed = true;
        Ok(Frame::Column(index, field))
    }

    fn leave(&mut self) -> Option<Frame> {
        self.stack.pop()
    }

    fn current(&self) -> Option<Frame> {
        self.stack.last().copied()
    }
}

fn parse_entries(source: &str) -> Result<Vec<ConfigEntry>, String> {
    let mut reader = Reader::from_str(source);
    let mut tracker = TableTracker::default();
    let mut entries: Vec<ConfigEntry> = Vec::new();
    let mut text = String::new();
    let mut saw_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| format!("{err} (near byte {})", reader.buffer_position()))?;
        match event {
            Event::Start(start) => {
                saw_root = true;
                match tracker.enter(&start)? {
                    Frame::Table(_) => entries.push(ConfigEntry::default()),
                    Frame::Column(..) => text.clear(),
                    Frame::Other => {}
                }
            }
            Event::Empty(start) => {
                saw_root = true;
                match tracker.enter(&start)? {
                    Frame::Table(_) => entries.push(ConfigEntry::default()),
                    Frame::Column(index, field) => {
                        set_field(&mut entries[index], field, String::new());
                    }
                    Frame::Other => {}
                }
                tracker.leave();
            }
            Event::Text(raw) => {
                if let Some(Frame::Column(..)) = tracker.current() {
                    text.push_str(&raw.unescape().map_err(|err| err.to_string())?);
                }
            }
            Event::CData(raw) => {
                if let Some(Frame::Column(..)) = tracker.current() {
                    text.push_str(std::str::from_utf8(&raw).map_err(|err| err.to_string())?);
                }
            }
            Event::End(_) => {
                if let Some(Frame::Column(index, field)) = tracker.leave() {
                    set_field(&mut entries[index], field, std::mem::take(&mut text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err("no root element".to_string());
    }
    if !tracker.stack.is_empty() {
        return Err("unexpected end of document (unclosed element)".to_string());
    }
    Ok(entries)
}

fn set_field(entry: &mut ConfigEntry, field: Field, text: String) {
    match field {
        Field::Key => entry.key = Some(text),
        Field::Value => entry.value = Some(text),
        Field::Description => entry.description = Some(text),
    }
}

/// New text for the column at `frame`, if it is a changed value column.
fn replacement(document: &ConfigDocument, frame: Option<Frame>) -> Option<&str> {
    let Some(Frame::Column(index, Field::Value)) = frame else {
        return None;
    };
    let entry = document.entries().get(index)?;
    if !entry.is_dirty() {
        return None;
    }
    Some(entry.value.as_deref().unwrap_or(""))
}

fn render_document(document: &ConfigDocument) -> Result<Vec<u8>, String> {
    let mut reader = Reader::from_str(document.source());
    let mut writer = Writer::new(Vec::with_capacity(document.source().len() + 64));
    let mut tracker = TableTracker::default();
    let mut written = vec![false; document.entries().len()];
    let mut first = true;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| format!("{err} (near byte {})", reader.buffer_position()))?;
        if first {
            first = false;
            if !matches!(event, Event::Decl(_)) {
                write(
                    &mut writer,
                    Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
                )?;
                writer.get_mut().push(b'\n');
            }
        }
        match event {
            Event::Eof => break,
            Event::Start(start) => {
                let frame = tracker.enter(&start)?;
                write(&mut writer, Event::Start(start))?;
                if let Some(value) = replacement(document, Some(frame)) {
                    write(&mut writer, Event::Text(BytesText::new(value)))?;
                    mark_written(&mut written, frame);
                }
            }
            Event::Empty(start) => {
                let frame = tracker.enter(&start)?;
                tracker.leave();
                match replacement(document, Some(frame)) {
                    Some(value) => {
                        mark_written(&mut written, frame);
                        let end = start.to_end().into_owned();
                        write(&mut writer, Event::Start(start))?;
                        write(&mut writer, Event::Text(BytesText::new(value)))?;
                        write(&mut writer, Event::End(end))?;
                    }
                    None => write(&mut writer, Event::Empty(start))?,
                }
            }
            Event::Text(_) | Event::CData(_)
                if replacement(document, tracker.current()).is_some() => {}
            Event::End(end) => {
                tracker.leave();
                write(&mut writer, Event::End(end))?;
            }
            other => write(&mut writer, other)?,
        }
    }

    let unwritten = document
        .entries()
        .iter()
        .zip(&written)
        .find(|(entry, written)| entry.is_dirty() && !**written);
    if let Some((entry, _)) = unwritten {
        return Err(format!(
            "entry '{}' has no value column to update",
            entry.key.as_deref().unwrap_or("")
        ));
    }
    Ok(writer.into_inner())
}

fn mark_written(written: &mut [bool], frame: Frame) {
    if let Frame::Column(index, _) = frame {
        written[index] = true;
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), String> {
    writer.write_event(event).map_err(|err| err.to_string())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DocumentError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_error = |action: &'static str| {
        move |source: io::Error| DocumentError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    };

    // Dropping the temp file on any early return removes it.
    let mut temp = NamedTempFile::new_in(parent).map_err(io_error("create temp file for"))?;
    temp.write_all(contents).map_err(io_error("write temp file for"))?;
    temp.as_file()
        .sync_all()
        .map_err(io_error("sync temp file for"))?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .map_err(io_error("copy permissions of"))?;
    }
    temp.persist(path)
        .map_err(|err| io_error("replace config document")(err.error))?;
    Ok(())
}
