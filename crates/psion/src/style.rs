//! Named styles and paragraph formats.
//!
//! Style 0 is always "Normal". Every other style stores its layouts as
//! differences from Normal, and every paragraph stores its layouts as
//! differences from the style it names, so after decoding each layout is
//! complete on its own.
//!
//! A style sheet is written as a count, a table of 32-bit offsets and the
//! style records themselves:
//!
//! ```text
//! count:   u8
//! offsets: u32 * count      positions in the enclosing stream
//! records: name (u8 length + ISO 8859-1), hotkey u32, layout list
//! ```

use std::io::{Read, Seek, SeekFrom};

use byyte::{ByteReader, ByteWriter};

use crate::error::{Error, Result};
use crate::layout::{CharacterLayout, ParagraphLayout};
use crate::layout_list::{decode_layout_list, encode_layout_list};
use crate::reloc_buffer::RelocBuffer;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub name: String,
    pub hotkey: u32,
    pub character: CharacterLayout,
    pub paragraph: ParagraphLayout,
}

impl Style {
    pub fn normal() -> Self {
        Style {
            name: "Normal".to_owned(),
            hotkey: 0,
            character: CharacterLayout::default(),
            paragraph: ParagraphLayout::default(),
        }
    }

    /// A style that starts out identical to `base`.
    pub fn derived(name: impl Into<String>, base: &Style) -> Self {
        Style {
            name: name.into(),
            hotkey: 0,
            character: base.character.clone(),
            paragraph: base.paragraph.clone(),
        }
    }

    fn write(&self, out: &mut RelocBuffer, base: Option<&Style>) -> Result<()> {
        let length = u8::try_from(self.name.chars().count()).map_err(|_| {
            Error::Generate(format!("style name {:?} longer than 255 characters", self.name))
        })?;
        out.write_u8(length)?;
        out.write_latin1(&self.name)?;
        out.write_u32(self.hotkey)?;
        encode_layout_list(
            out,
            &self.paragraph,
            base.map(|b| &b.paragraph),
            &self.character,
            base.map(|b| &b.character),
        )
    }

    fn read<R: Read + Seek>(reader: &mut R, session: &mut Session, base: &Style) -> Result<Self> {
        let length = reader.read_u8()?;
        let name = reader.read_latin1(length.into())?;
        let hotkey = reader.read_u32()?;
        let (paragraph, character) =
            decode_layout_list(reader, session, &base.paragraph, &base.character)?;
        Ok(Style {
            name,
            hotkey,
            character,
            paragraph,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    normal: Style,
    styles: Vec<Style>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        StyleSheet::new(Style::normal())
    }
}

impl StyleSheet {
    pub fn new(normal: Style) -> Self {
        StyleSheet {
            normal,
            styles: Vec::new(),
        }
    }

    /// Adds a style and returns the index paragraphs use to name it.
    pub fn add(&mut self, style: Style) -> usize {
        self.styles.push(style);
        self.styles.len()
    }

    pub fn normal(&self) -> &Style {
        &self.normal
    }

    /// Number of styles, Normal included.
    pub fn len(&self) -> usize {
        self.styles.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Result<&Style> {
        match index {
            0 => Ok(&self.normal),
            n => self.styles.get(n - 1).ok_or_else(|| {
                Error::Other(format!(
                    "style {index} out of range, sheet has {}",
                    self.len()
                ))
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Style> {
        std::iter::once(&self.normal).chain(self.styles.iter())
    }

    /// Lays out the sheet with its offset table left as references.
    ///
    /// The returned buffer must be resolved (possibly after being
    /// concatenated into a larger one) before it is written out.
    pub fn encode(&self, session: &mut Session) -> Result<RelocBuffer> {
        let count = u8::try_from(self.len())
            .map_err(|_| Error::Generate(format!("{} styles in one sheet", self.len())))?;

        let mut out = RelocBuffer::new();
        out.write_u8(count)?;
        let mut records = RelocBuffer::new();
        for (index, style) in self.iter().enumerate() {
            let base = if index == 0 { None } else { Some(&self.normal) };
            let id = session.next_id();
            out.add_reference(id)?;

            let mut record = RelocBuffer::new();
            record.add_target(id);
            style.write(&mut record, base)?;
            records.concat(&record)?;
        }
        out.concat(&records)?;
        Ok(out)
    }

    /// Reads a sheet at the current position. Its offsets are positions in
    /// the whole stream, as left by resolving the buffer it was written into.
    pub fn decode<R: Read + Seek>(reader: &mut R, session: &mut Session) -> Result<Self> {
        let origin = reader.stream_position()?;
        let count = reader.read_u8()?;
        let mut offsets = Vec::with_capacity(count.into());
        for _ in 0..count {
            offsets.push(u64::from(reader.read_u32()?));
        }
        let Some((first, rest)) = offsets.split_first() else {
            return Err(Error::Parse(format!(
                "style sheet at {origin:#x} has no Normal style"
            )));
        };

        reader.seek(SeekFrom::Start(*first))?;
        let normal = Style::read(reader, session, &Style::normal())?;
        let mut sheet = StyleSheet::new(normal);
        for offset in rest {
            reader.seek(SeekFrom::Start(*offset))?;
            let style = Style::read(reader, session, &sheet.normal)?;
            sheet.add(style);
        }
        tracing::debug!(styles = sheet.len(), "decoded style sheet");
        Ok(sheet)
    }
}

/// Layouts of a single paragraph, resolved against its style.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphFormat {
    pub style: u8,
    pub paragraph: ParagraphLayout,
    pub character: CharacterLayout,
}

impl ParagraphFormat {
    /// A paragraph that uses its style unchanged.
    pub fn from_style(sheet: &StyleSheet, style: u8) -> Result<Self> {
        let base = sheet.get(style.into())?;
        Ok(ParagraphFormat {
            style,
            paragraph: base.paragraph.clone(),
            character: base.character.clone(),
        })
    }

    pub fn encode(&self, out: &mut RelocBuffer, sheet: &StyleSheet) -> Result<()> {
        let base = sheet.get(self.style.into())?;
        out.write_u8(self.style)?;
        encode_layout_list(
            out,
            &self.paragraph,
            Some(&base.paragraph),
            &self.character,
            Some(&base.character),
        )
    }

    pub fn decode<R: Read + Seek>(
        reader: &mut R,
        session: &mut Session,
        sheet: &StyleSheet,
    ) -> Result<Self> {
        let style = reader.read_u8()?;
        let base = sheet.get(style.into())?;
        let (paragraph, character) =
            decode_layout_list(reader, session, &base.paragraph, &base.character)?;
        Ok(ParagraphFormat {
            style,
            paragraph,
            character,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{JustifyHorizontal, Length, Size};
    use std::io::Cursor;

    fn heading(normal: &Style) -> Style {
        let mut style = Style::derived("Heading 1", normal);
        style.hotkey = u32::from(b'1');
        style.character.bold = true;
        style.character.font_size = Size::from_points(16.0);
        style.paragraph.space_below = Size::from_points(6.0);
        style
    }

    #[test]
    fn test_style_indices() {
        let mut sheet = StyleSheet::default();
        let index = sheet.add(heading(sheet.normal()));
        assert_eq!(index, 1);
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.get(0).unwrap().name, "Normal");
        assert_eq!(sheet.get(1).unwrap().name, "Heading 1");
        assert!(matches!(sheet.get(2), Err(Error::Other(_))));
    }

    #[test]
    fn test_sheet_round_trip() {
        let mut sheet = StyleSheet::default();
        sheet.add(heading(sheet.normal()));
        let mut quote = Style::derived("Quote", sheet.normal());
        quote.paragraph.indent_left = Length::from_cm(1.0);
        quote.character.italic = true;
        sheet.add(quote);

        let mut session = Session::default();
        let mut buf = sheet.encode(&mut session).unwrap();
        buf.resolve().unwrap();
        let bytes = buf.into_bytes().unwrap();

        // first record starts right after the count and three offsets
        assert_eq!(&bytes[1..5], &13u32.to_le_bytes());

        let decoded = StyleSheet::decode(&mut Cursor::new(bytes), &mut session).unwrap();
        assert_eq!(decoded, sheet);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_derived_style_stores_only_differences() {
        let sheet = StyleSheet::default();
        let plain = Style::derived("Plain", sheet.normal());
        let mut out = RelocBuffer::new();
        plain.write(&mut out, Some(sheet.normal())).unwrap();
        // name, hotkey and an empty layout list
        assert_eq!(out.len(), 1 + 5 + 4 + 4);
    }

    #[test]
    fn test_paragraph_format_against_style() {
        let mut sheet = StyleSheet::default();
        let index = sheet.add(heading(sheet.normal()));
        let style = u8::try_from(index).unwrap();

        let mut format = ParagraphFormat::from_style(&sheet, style).unwrap();
        format.paragraph.justify_hor = JustifyHorizontal::Centre;

        let mut out = RelocBuffer::new();
        format.encode(&mut out, &sheet).unwrap();
        // style byte, list length, one tag with a one byte value
        assert_eq!(out.as_bytes(), &[1, 2, 0, 0, 0, 0x05, 1]);

        let mut session = Session::default();
        let decoded =
            ParagraphFormat::decode(&mut Cursor::new(out.as_bytes()), &mut session, &sheet)
                .unwrap();
        assert_eq!(decoded, format);
        assert!(decoded.character.bold);
    }

    #[test]
    fn test_paragraph_format_unknown_style() {
        let sheet = StyleSheet::default();
        let mut session = Session::default();
        let err = ParagraphFormat::decode(&mut Cursor::new(vec![4, 0, 0, 0, 0]), &mut session, &sheet)
            .unwrap_err();
        assert!(matches!(err, Error::Other(_)));
    }
}
