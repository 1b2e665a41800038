use crate::error::{AppError, Result};
use serde::Serialize;
use serde_json::ser::Formatter;
use std::collections::BTreeMap;
use std::io::{self, Write};

const INDENT: &[u8] = b"    ";

/// The single document a run produces. Fields are declared in key order so the
/// top-level object comes out sorted, like `contracts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleDocument {
    pub contracts: BTreeMap<String, String>,
    #[serde(rename = "manifest-path")]
    pub manifest_path: String,
}

impl BundleDocument {
    pub fn new(manifest_path: impl Into<String>, contracts: BTreeMap<String, String>) -> Self {
        Self {
            contracts,
            manifest_path: manifest_path.into(),
        }
    }

    pub fn file_count(&self) -> usize {
        self.contracts.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.contracts.values().map(|c| c.len() as u64).sum()
    }

    pub fn to_json(&self, style: JsonStyle) -> Result<String> {
        let mut rendered = serialize_context_to_json(self, style)?;
        rendered.push('\n');
        Ok(rendered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonStyle {
    /// Write every character outside `' '..='~'` as a `\uXXXX` escape.
    pub escape_non_ascii: bool,
}

impl Default for JsonStyle {
    fn default() -> Self {
        Self {
            escape_non_ascii: true,
        }
    }
}

/// Four-space indented JSON with bare `,` and `:` separators.
#[derive(Debug, Clone)]
pub struct BundleFormatter {
    current_indent: usize,
    has_value: bool,
    escape_non_ascii: bool,
}

impl BundleFormatter {
    pub fn new(style: JsonStyle) -> Self {
        Self {
            current_indent: 0,
            has_value: false,
            escape_non_ascii: style.escape_non_ascii,
        }
    }

    fn indent<W: ?Sized + Write>(&self, writer: &mut W) -> io::Result<()> {
        for _ in 0..self.current_indent {
            writer.write_all(INDENT)?;
        }
        Ok(())
    }

    fn begin_nested<W: ?Sized + Write>(&mut self, writer: &mut W, open: &[u8]) -> io::Result<()> {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(open)
    }

    fn end_nested<W: ?Sized + Write>(&mut self, writer: &mut W, close: &[u8]) -> io::Result<()> {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            self.indent(writer)?;
        }
        writer.write_all(close)
    }

    fn begin_item<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        writer.write_all(if first { b"\n" } else { b",\n" })?;
        self.indent(writer)
    }
}

impl Formatter for BundleFormatter {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.begin_nested(writer, b"[")
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.end_nested(writer, b"]")
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.begin_item(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.begin_nested(writer, b"{")
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.end_nested(writer, b"}")
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.begin_item(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b":")
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    // serde_json has already escaped quotes, backslashes and control characters
    // by the time a fragment gets here.
    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if !self.escape_non_ascii {
            return writer.write_all(fragment.as_bytes());
        }
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            if start < i {
                writer.write_all(fragment[start..i].as_bytes())?;
            }
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units).iter() {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        if start < fragment.len() {
            writer.write_all(fragment[start..].as_bytes())?;
        }
        Ok(())
    }
}

pub fn serialize_context_to_json<T: Serialize>(context: &T, style: JsonStyle) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, BundleFormatter::new(style));
    context.serialize(&mut serializer)?;
    String::from_utf8(buf)
        .map_err(|e| AppError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
