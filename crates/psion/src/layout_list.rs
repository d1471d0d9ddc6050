//! Tagged layout lists.
//!
//! A list is a `u32` byte length followed by `(u8 tag, value)` pairs. Only
//! the fields that differ from a base layout are written; decoding starts
//! from a clone of the base, so unlisted fields are inherited.
//!
//! ```text
//! length: u32        bytes that follow
//! tag:    u8         paragraph tags 0x01..=0x17, character tags 0x19..=0x22
//! value:  ...        encoding depends on the tag
//! ```

use std::io::{Read, Seek, Write};

use byyte::{ByteReader, ByteWriter};

use crate::config::UnknownTagPolicy;
use crate::error::{Error, Result};
use crate::layout::{
    Border, BorderKind, Bullet, CharacterLayout, Color, Font, JustifyHorizontal, JustifyVertical,
    Length, ParagraphLayout, ScreenFont, Size, SuperSub, Tab, TabKind,
};
use crate::reloc_buffer::RelocBuffer;
use crate::session::Session;

pub mod tag {
    pub const BACK_COLOR: u8 = 0x01;
    pub const INDENT_LEFT: u8 = 0x02;
    pub const INDENT_RIGHT: u8 = 0x03;
    pub const INDENT_FIRST: u8 = 0x04;
    pub const JUSTIFY_HOR: u8 = 0x05;
    pub const JUSTIFY_VER: u8 = 0x06;
    pub const LINESPACING: u8 = 0x07;
    pub const LINESPACING_EXACT: u8 = 0x08;
    pub const SPACE_ABOVE: u8 = 0x09;
    pub const SPACE_BELOW: u8 = 0x0a;
    pub const KEEP_TOGETHER: u8 = 0x0b;
    pub const KEEP_WITH_NEXT: u8 = 0x0c;
    pub const ON_NEXT_PAGE: u8 = 0x0d;
    pub const NO_WIDOW_PROTECTION: u8 = 0x0e;
    pub const WRAP_TO_FIT_CELL: u8 = 0x0f;
    pub const BORDER_DISTANCE: u8 = 0x10;
    pub const BULLET: u8 = 0x11;
    pub const LEFT_BORDER: u8 = 0x12;
    pub const RIGHT_BORDER: u8 = 0x13;
    pub const TOP_BORDER: u8 = 0x14;
    pub const BOTTOM_BORDER: u8 = 0x15;
    pub const TAB_NORMAL: u8 = 0x16;
    pub const TAB_EXTRA: u8 = 0x17;

    pub const COLOR: u8 = 0x19;
    pub const CHAR_BACK_COLOR: u8 = 0x1a;
    pub const FONT_SIZE: u8 = 0x1c;
    pub const ITALIC: u8 = 0x1d;
    pub const BOLD: u8 = 0x1e;
    pub const SUPER_SUB: u8 = 0x1f;
    pub const UNDERLINE: u8 = 0x20;
    pub const STRIKETHROUGH: u8 = 0x21;
    pub const FONT: u8 = 0x22;
}

/// Decoder state that lives for one list.
#[derive(Default)]
struct ListState {
    tabs_replaced: bool,
}

/// A layout record that can be written and read as tagged differences.
trait LayoutRecord: Sized {
    fn write_diff<W: Write>(&self, base: Option<&Self>, out: &mut W) -> Result<()>;

    /// Applies the value of `tag`. Returns `false` if the tag is not one of
    /// this record's, in which case nothing was read.
    fn read_tag<R: Read + Seek>(
        &mut self,
        tag: u8,
        reader: &mut R,
        session: &mut Session,
        state: &mut ListState,
    ) -> Result<bool>;
}

fn differs<L, T: PartialEq>(value: &L, base: Option<&L>, pick: impl Fn(&L) -> &T) -> bool {
    base.is_none_or(|base| pick(base) != pick(value))
}

fn position<R: Seek>(reader: &mut R) -> Result<u64> {
    Ok(reader.stream_position()?)
}

fn read_color<R: Read>(reader: &mut R) -> Result<Color> {
    let red = reader.read_u8()?;
    let green = reader.read_u8()?;
    let blue = reader.read_u8()?;
    Ok(Color { red, green, blue })
}

fn write_color<W: Write>(out: &mut W, color: Color) -> Result<()> {
    out.write_u8(color.red)?;
    out.write_u8(color.green)?;
    out.write_u8(color.blue)?;
    Ok(())
}

fn read_length<R: Read>(reader: &mut R) -> Result<Length> {
    Ok(Length(reader.read_i32()?))
}

fn read_size<R: Read>(reader: &mut R) -> Result<Size> {
    Ok(Size(reader.read_u32()?))
}

fn read_bool<R: Read + Seek>(reader: &mut R, session: &mut Session) -> Result<bool> {
    let at = position(reader)?;
    match reader.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => {
            session.warn(at, format!("boolean byte {other:#04x}, reading as true"));
            Ok(true)
        }
    }
}

fn write_bool<W: Write>(out: &mut W, value: bool) -> Result<()> {
    out.write_u8(u8::from(value))?;
    Ok(())
}

fn read_font<R: Read + Seek>(reader: &mut R, session: &mut Session) -> Result<Font> {
    let length = reader.read_u8()?;
    let name = reader.read_latin1(length.into())?;
    let at = position(reader)?;
    let screenfont = match reader.read_u8()? {
        1 => ScreenFont::SansSerif,
        2 => ScreenFont::NonProportional,
        3 => ScreenFont::Serif,
        other => {
            session.warn(at, format!("unknown screen font {other}, using serif"));
            ScreenFont::Serif
        }
    };
    Ok(Font { name, screenfont })
}

fn write_font<W: Write>(out: &mut W, font: &Font) -> Result<()> {
    let length = u8::try_from(font.name.chars().count()).map_err(|_| {
        Error::Generate(format!("font name {:?} longer than 255 characters", font.name))
    })?;
    out.write_u8(length)?;
    out.write_latin1(&font.name)?;
    out.write_u8(match font.screenfont {
        ScreenFont::SansSerif => 1,
        ScreenFont::NonProportional => 2,
        ScreenFont::Serif => 3,
    })?;
    Ok(())
}

fn read_border<R: Read + Seek>(reader: &mut R, session: &mut Session) -> Result<Border> {
    let at = position(reader)?;
    let kind = match reader.read_u8()? {
        0 => BorderKind::None,
        1 => BorderKind::Single,
        2 => BorderKind::Double,
        3 => BorderKind::Dotted,
        4 => BorderKind::Dashed,
        5 => BorderKind::DotDashed,
        6 => BorderKind::DotDotDashed,
        other => {
            session.warn(at, format!("unknown border kind {other}, using single"));
            BorderKind::Single
        }
    };
    let thickness = read_size(reader)?;
    let color = read_color(reader)?;
    // trailing byte, always 1 in files seen so far
    reader.read_u8()?;
    Ok(Border {
        kind,
        thickness,
        color,
    })
}

fn write_border<W: Write>(out: &mut W, border: &Border) -> Result<()> {
    out.write_u8(match border.kind {
        BorderKind::None => 0,
        BorderKind::Single => 1,
        BorderKind::Double => 2,
        BorderKind::Dotted => 3,
        BorderKind::Dashed => 4,
        BorderKind::DotDashed => 5,
        BorderKind::DotDotDashed => 6,
    })?;
    out.write_u32(border.thickness.0)?;
    write_color(out, border.color)?;
    out.write_u8(1)?;
    Ok(())
}

fn read_bullet<R: Read + Seek>(reader: &mut R, session: &mut Session) -> Result<Bullet> {
    let length = u64::from(reader.read_u8()?);
    let start = position(reader)?;
    let font_size = read_size(reader)?;
    let character = char::from(reader.read_u8()?);
    let on = read_bool(reader, session)?;
    let indent = read_bool(reader, session)?;
    let color = read_color(reader)?;
    let font = read_font(reader, session)?;

    let consumed = position(reader)? - start;
    if consumed != length {
        return Err(Error::Parse(format!(
            "bullet at {start:#x} declares {length} bytes but holds {consumed}"
        )));
    }
    Ok(Bullet {
        on,
        font_size,
        character,
        indent,
        color,
        font,
    })
}

fn write_bullet<W: Write>(out: &mut W, bullet: &Bullet) -> Result<()> {
    let character = u8::try_from(u32::from(bullet.character)).map_err(|_| {
        Error::Generate(format!(
            "bullet character {:?} outside ISO 8859-1",
            bullet.character
        ))
    })?;

    let mut body = Vec::new();
    body.write_u32(bullet.font_size.0)?;
    body.write_u8(character)?;
    write_bool(&mut body, bullet.on)?;
    write_bool(&mut body, bullet.indent)?;
    write_color(&mut body, bullet.color)?;
    write_font(&mut body, &bullet.font)?;

    let length = u8::try_from(body.len())
        .map_err(|_| Error::Generate(format!("bullet record of {} bytes", body.len())))?;
    out.write_u8(length)?;
    out.write_all(&body)?;
    Ok(())
}

fn read_tab<R: Read + Seek>(reader: &mut R, session: &mut Session) -> Result<Tab> {
    let location = read_length(reader)?;
    let at = position(reader)?;
    let kind = match reader.read_u8()? {
        0 => TabKind::Left,
        1 => TabKind::Centre,
        2 => TabKind::Right,
        other => {
            session.warn(at, format!("unknown tab kind {other}, using left"));
            TabKind::Left
        }
    };
    Ok(Tab { location, kind })
}

fn write_tab<W: Write>(out: &mut W, tab: &Tab) -> Result<()> {
    out.write_i32(tab.location.0)?;
    out.write_u8(match tab.kind {
        TabKind::Left => 0,
        TabKind::Centre => 1,
        TabKind::Right => 2,
    })?;
    Ok(())
}

fn read_justify_hor<R: Read + Seek>(
    reader: &mut R,
    session: &mut Session,
) -> Result<JustifyHorizontal> {
    let at = position(reader)?;
    Ok(match reader.read_u8()? {
        0 => JustifyHorizontal::Left,
        1 => JustifyHorizontal::Centre,
        2 => JustifyHorizontal::Right,
        3 => JustifyHorizontal::Full,
        other => {
            session.warn(at, format!("unknown horizontal justification {other}, using left"));
            JustifyHorizontal::Left
        }
    })
}

fn read_justify_ver<R: Read + Seek>(
    reader: &mut R,
    session: &mut Session,
) -> Result<JustifyVertical> {
    let at = position(reader)?;
    Ok(match reader.read_u8()? {
        0 => JustifyVertical::Top,
        1 => JustifyVertical::Middle,
        2 => JustifyVertical::Bottom,
        other => {
            session.warn(at, format!("unknown vertical justification {other}, using top"));
            JustifyVertical::Top
        }
    })
}

fn read_super_sub<R: Read + Seek>(reader: &mut R, session: &mut Session) -> Result<SuperSub> {
    let at = position(reader)?;
    Ok(match reader.read_u8()? {
        0 => SuperSub::Normal,
        1 => SuperSub::Superscript,
        2 => SuperSub::Subscript,
        other => {
            session.warn(at, format!("unknown super/subscript {other}, using normal"));
            SuperSub::Normal
        }
    })
}

impl LayoutRecord for ParagraphLayout {
    fn write_diff<W: Write>(&self, base: Option<&Self>, out: &mut W) -> Result<()> {
        if differs(self, base, |l| &l.back_color) {
            out.write_u8(tag::BACK_COLOR)?;
            write_color(out, self.back_color)?;
        }
        if differs(self, base, |l| &l.indent_left) {
            out.write_u8(tag::INDENT_LEFT)?;
            out.write_i32(self.indent_left.0)?;
        }
        if differs(self, base, |l| &l.indent_right) {
            out.write_u8(tag::INDENT_RIGHT)?;
            out.write_i32(self.indent_right.0)?;
        }
        if differs(self, base, |l| &l.indent_first) {
            out.write_u8(tag::INDENT_FIRST)?;
            out.write_i32(self.indent_first.0)?;
        }
        if differs(self, base, |l| &l.justify_hor) {
            out.write_u8(tag::JUSTIFY_HOR)?;
            out.write_u8(self.justify_hor as u8)?;
        }
        if differs(self, base, |l| &l.justify_ver) {
            out.write_u8(tag::JUSTIFY_VER)?;
            out.write_u8(self.justify_ver as u8)?;
        }
        if differs(self, base, |l| &l.linespacing) {
            out.write_u8(tag::LINESPACING)?;
            out.write_u32(self.linespacing.0)?;
        }
        if differs(self, base, |l| &l.linespacing_exact) {
            out.write_u8(tag::LINESPACING_EXACT)?;
            write_bool(out, self.linespacing_exact)?;
        }
        if differs(self, base, |l| &l.space_above) {
            out.write_u8(tag::SPACE_ABOVE)?;
            out.write_u32(self.space_above.0)?;
        }
        if differs(self, base, |l| &l.space_below) {
            out.write_u8(tag::SPACE_BELOW)?;
            out.write_u32(self.space_below.0)?;
        }
        if differs(self, base, |l| &l.keep_together) {
            out.write_u8(tag::KEEP_TOGETHER)?;
            write_bool(out, self.keep_together)?;
        }
        if differs(self, base, |l| &l.keep_with_next) {
            out.write_u8(tag::KEEP_WITH_NEXT)?;
            write_bool(out, self.keep_with_next)?;
        }
        if differs(self, base, |l| &l.on_next_page) {
            out.write_u8(tag::ON_NEXT_PAGE)?;
            write_bool(out, self.on_next_page)?;
        }
        if differs(self, base, |l| &l.no_widow_protection) {
            out.write_u8(tag::NO_WIDOW_PROTECTION)?;
            write_bool(out, self.no_widow_protection)?;
        }
        if differs(self, base, |l| &l.wrap_to_fit_cell) {
            out.write_u8(tag::WRAP_TO_FIT_CELL)?;
            write_bool(out, self.wrap_to_fit_cell)?;
        }
        if differs(self, base, |l| &l.border_distance) {
            out.write_u8(tag::BORDER_DISTANCE)?;
            out.write_i32(self.border_distance.0)?;
        }
        if differs(self, base, |l| &l.bullet) {
            out.write_u8(tag::BULLET)?;
            write_bullet(out, &self.bullet)?;
        }
        let borders = [
            (tag::LEFT_BORDER, &self.left_border, base.map(|b| &b.left_border)),
            (tag::RIGHT_BORDER, &self.right_border, base.map(|b| &b.right_border)),
            (tag::TOP_BORDER, &self.top_border, base.map(|b| &b.top_border)),
            (tag::BOTTOM_BORDER, &self.bottom_border, base.map(|b| &b.bottom_border)),
        ];
        for (id, border, base_border) in borders {
            if base_border != Some(border) {
                out.write_u8(id)?;
                write_border(out, border)?;
            }
        }
        if differs(self, base, |l| &l.tabs.normal) {
            out.write_u8(tag::TAB_NORMAL)?;
            out.write_i32(self.tabs.normal.0)?;
        }
        if differs(self, base, |l| &l.tabs.extras) {
            if self.tabs.extras.is_empty() && base.is_some() {
                return Err(Error::Generate(
                    "cannot express removing every inherited extra tab".to_owned(),
                ));
            }
            for tab in &self.tabs.extras {
                out.write_u8(tag::TAB_EXTRA)?;
                write_tab(out, tab)?;
            }
        }
        Ok(())
    }

    fn read_tag<R: Read + Seek>(
        &mut self,
        tag: u8,
        reader: &mut R,
        session: &mut Session,
        state: &mut ListState,
    ) -> Result<bool> {
        match tag {
            tag::BACK_COLOR => self.back_color = read_color(reader)?,
            tag::INDENT_LEFT => self.indent_left = read_length(reader)?,
            tag::INDENT_RIGHT => self.indent_right = read_length(reader)?,
            tag::INDENT_FIRST => self.indent_first = read_length(reader)?,
            tag::JUSTIFY_HOR => self.justify_hor = read_justify_hor(reader, session)?,
            tag::JUSTIFY_VER => self.justify_ver = read_justify_ver(reader, session)?,
            tag::LINESPACING => self.linespacing = read_size(reader)?,
            tag::LINESPACING_EXACT => self.linespacing_exact = read_bool(reader, session)?,
            tag::SPACE_ABOVE => self.space_above = read_size(reader)?,
            tag::SPACE_BELOW => self.space_below = read_size(reader)?,
            tag::KEEP_TOGETHER => self.keep_together = read_bool(reader, session)?,
            tag::KEEP_WITH_NEXT => self.keep_with_next = read_bool(reader, session)?,
            tag::ON_NEXT_PAGE => self.on_next_page = read_bool(reader, session)?,
            tag::NO_WIDOW_PROTECTION => self.no_widow_protection = read_bool(reader, session)?,
            tag::WRAP_TO_FIT_CELL => self.wrap_to_fit_cell = read_bool(reader, session)?,
            tag::BORDER_DISTANCE => self.border_distance = read_length(reader)?,
            tag::BULLET => self.bullet = read_bullet(reader, session)?,
            tag::LEFT_BORDER => self.left_border = read_border(reader, session)?,
            tag::RIGHT_BORDER => self.right_border = read_border(reader, session)?,
            tag::TOP_BORDER => self.top_border = read_border(reader, session)?,
            tag::BOTTOM_BORDER => self.bottom_border = read_border(reader, session)?,
            tag::TAB_NORMAL => self.tabs.normal = read_length(reader)?,
            tag::TAB_EXTRA => {
                let tab = read_tab(reader, session)?;
                if !state.tabs_replaced {
                    self.tabs.extras.clear();
                    state.tabs_replaced = true;
                }
                self.tabs.extras.push(tab);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl LayoutRecord for CharacterLayout {
    fn write_diff<W: Write>(&self, base: Option<&Self>, out: &mut W) -> Result<()> {
        if differs(self, base, |l| &l.color) {
            out.write_u8(tag::COLOR)?;
            write_color(out, self.color)?;
        }
        if differs(self, base, |l| &l.back_color) {
            out.write_u8(tag::CHAR_BACK_COLOR)?;
            write_color(out, self.back_color)?;
        }
        if differs(self, base, |l| &l.font_size) {
            out.write_u8(tag::FONT_SIZE)?;
            out.write_u32(self.font_size.0)?;
        }
        if differs(self, base, |l| &l.italic) {
            out.write_u8(tag::ITALIC)?;
            write_bool(out, self.italic)?;
        }
        if differs(self, base, |l| &l.bold) {
            out.write_u8(tag::BOLD)?;
            write_bool(out, self.bold)?;
        }
        if differs(self, base, |l| &l.super_sub) {
            out.write_u8(tag::SUPER_SUB)?;
            out.write_u8(self.super_sub as u8)?;
        }
        if differs(self, base, |l| &l.underline) {
            out.write_u8(tag::UNDERLINE)?;
            write_bool(out, self.underline)?;
        }
        if differs(self, base, |l| &l.strikethrough) {
            out.write_u8(tag::STRIKETHROUGH)?;
            write_bool(out, self.strikethrough)?;
        }
        if differs(self, base, |l| &l.font) {
            out.write_u8(tag::FONT)?;
            write_font(out, &self.font)?;
        }
        Ok(())
    }

    fn read_tag<R: Read + Seek>(
        &mut self,
        tag: u8,
        reader: &mut R,
        session: &mut Session,
        _state: &mut ListState,
    ) -> Result<bool> {
        match tag {
            tag::COLOR => self.color = read_color(reader)?,
            tag::CHAR_BACK_COLOR => self.back_color = read_color(reader)?,
            tag::FONT_SIZE => self.font_size = read_size(reader)?,
            tag::ITALIC => self.italic = read_bool(reader, session)?,
            tag::BOLD => self.bold = read_bool(reader, session)?,
            tag::SUPER_SUB => self.super_sub = read_super_sub(reader, session)?,
            tag::UNDERLINE => self.underline = read_bool(reader, session)?,
            tag::STRIKETHROUGH => self.strikethrough = read_bool(reader, session)?,
            tag::FONT => self.font = read_font(reader, session)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn write_list(out: &mut RelocBuffer, body: &RelocBuffer) -> Result<()> {
    let length = u32::try_from(body.len())
        .map_err(|_| Error::Generate(format!("layout list of {} bytes", body.len())))?;
    out.write_u32(length)?;
    out.concat(body)
}

fn read_list<R: Read + Seek>(
    reader: &mut R,
    session: &mut Session,
    mut paragraph: Option<&mut ParagraphLayout>,
    mut character: Option<&mut CharacterLayout>,
) -> Result<()> {
    let length = u64::from(reader.read_u32()?);
    let start = position(reader)?;
    let end = start + length;
    let mut state = ListState::default();

    let mut at = start;
    while at < end {
        let tag = reader.read_u8()?;
        let mut handled = false;
        if let Some(layout) = paragraph.as_deref_mut() {
            handled = layout.read_tag(tag, reader, session, &mut state)?;
        }
        if !handled {
            if let Some(layout) = character.as_deref_mut() {
                handled = layout.read_tag(tag, reader, session, &mut state)?;
            }
        }
        if !handled {
            match session.config().unknown_layout_tags {
                UnknownTagPolicy::SkipByte => {
                    session.warn(at, format!("unknown layout tag {tag:#04x}, skipping one byte"));
                }
                UnknownTagPolicy::Reject => {
                    return Err(Error::Parse(format!("unknown layout tag {tag:#04x} at {at:#x}")));
                }
            }
        } else {
            tracing::trace!(tag, offset = at, "layout tag");
        }
        at = position(reader)?;
    }

    if at != end {
        return Err(Error::Parse(format!(
            "layout list at {start:#x} declares {length} bytes but holds {}",
            at - start
        )));
    }
    Ok(())
}

pub fn encode_paragraph_layout_list(
    out: &mut RelocBuffer,
    value: &ParagraphLayout,
    base: Option<&ParagraphLayout>,
) -> Result<()> {
    let mut body = RelocBuffer::new();
    value.write_diff(base, &mut body)?;
    write_list(out, &body)
}

pub fn encode_character_layout_list(
    out: &mut RelocBuffer,
    value: &CharacterLayout,
    base: Option<&CharacterLayout>,
) -> Result<()> {
    let mut body = RelocBuffer::new();
    value.write_diff(base, &mut body)?;
    write_list(out, &body)
}

/// Writes one list holding the paragraph tags followed by the character tags.
pub fn encode_layout_list(
    out: &mut RelocBuffer,
    paragraph: &ParagraphLayout,
    paragraph_base: Option<&ParagraphLayout>,
    character: &CharacterLayout,
    character_base: Option<&CharacterLayout>,
) -> Result<()> {
    let mut body = RelocBuffer::new();
    paragraph.write_diff(paragraph_base, &mut body)?;
    character.write_diff(character_base, &mut body)?;
    write_list(out, &body)
}

pub fn decode_paragraph_layout_list<R: Read + Seek>(
    reader: &mut R,
    session: &mut Session,
    base: &ParagraphLayout,
) -> Result<ParagraphLayout> {
    let mut layout = base.clone();
    read_list(reader, session, Some(&mut layout), None)?;
    Ok(layout)
}

pub fn decode_character_layout_list<R: Read + Seek>(
    reader: &mut R,
    session: &mut Session,
    base: &CharacterLayout,
) -> Result<CharacterLayout> {
    let mut layout = base.clone();
    read_list(reader, session, None, Some(&mut layout))?;
    Ok(layout)
}

pub fn decode_layout_list<R: Read + Seek>(
    reader: &mut R,
    session: &mut Session,
    paragraph_base: &ParagraphLayout,
    character_base: &CharacterLayout,
) -> Result<(ParagraphLayout, CharacterLayout)> {
    let mut paragraph = paragraph_base.clone();
    let mut character = character_base.clone();
    read_list(reader, session, Some(&mut paragraph), Some(&mut character))?;
    Ok((paragraph, character))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn encoded_paragraph(value: &ParagraphLayout, base: Option<&ParagraphLayout>) -> Vec<u8> {
        let mut out = RelocBuffer::new();
        encode_paragraph_layout_list(&mut out, value, base).unwrap();
        out.into_bytes().unwrap()
    }

    fn decoded_paragraph(bytes: Vec<u8>, base: &ParagraphLayout) -> Result<ParagraphLayout> {
        let mut session = Session::default();
        decode_paragraph_layout_list(&mut Cursor::new(bytes), &mut session, base)
    }

    #[test]
    fn test_single_changed_field() {
        let base = ParagraphLayout {
            indent_left: Length::from_cm(0.0),
            ..ParagraphLayout::default()
        };
        let value = ParagraphLayout {
            indent_left: Length::from_cm(0.64),
            ..base.clone()
        };

        let bytes = encoded_paragraph(&value, Some(&base));
        assert_eq!(bytes, vec![5, 0, 0, 0, tag::INDENT_LEFT, 0x6b, 0x01, 0, 0]);

        let decoded = decoded_paragraph(bytes, &base).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(decoded.indent_left, Length::from_cm(0.64));
    }

    #[test]
    fn test_identical_layout_is_empty() {
        let value = ParagraphLayout::default();
        assert_eq!(encoded_paragraph(&value, Some(&value)), vec![0, 0, 0, 0]);

        let mut out = RelocBuffer::new();
        let character = CharacterLayout::default();
        encode_character_layout_list(&mut out, &character, Some(&character)).unwrap();
        assert_eq!(out.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_no_base_writes_every_field() {
        let bytes = encoded_paragraph(&ParagraphLayout::default(), None);
        let tags_seen: Vec<u8> = {
            let mut cursor = Cursor::new(&bytes[4..]);
            let mut tags = vec![];
            let mut session = Session::default();
            let mut scratch = ParagraphLayout::default();
            let mut state = ListState::default();
            while (cursor.position() as usize) < bytes.len() - 4 {
                let tag = cursor.read_u8().unwrap();
                assert!(scratch.read_tag(tag, &mut cursor, &mut session, &mut state).unwrap());
                tags.push(tag);
            }
            tags
        };
        // every paragraph tag except the extra tab, which has nothing to carry
        assert_eq!(tags_seen, (tag::BACK_COLOR..=tag::TAB_NORMAL).collect::<Vec<_>>());

        let mut out = RelocBuffer::new();
        encode_character_layout_list(&mut out, &CharacterLayout::default(), None).unwrap();
        let mut session = Session::default();
        let odd_base = CharacterLayout {
            bold: true,
            font_size: Size::from_points(24.0),
            ..CharacterLayout::default()
        };
        let decoded =
            decode_character_layout_list(&mut Cursor::new(out.as_bytes()), &mut session, &odd_base)
                .unwrap();
        assert_eq!(decoded, CharacterLayout::default());
    }

    #[test]
    fn test_tabs_replace_inherited_extras() {
        let base = ParagraphLayout {
            tabs: crate::layout::TabSet {
                normal: Length::from_cm(1.0),
                extras: vec![Tab {
                    location: Length::from_cm(3.0),
                    kind: TabKind::Right,
                }],
            },
            ..ParagraphLayout::default()
        };
        let mut value = base.clone();
        value.tabs.extras = vec![
            Tab {
                location: Length::from_cm(1.5),
                kind: TabKind::Left,
            },
            Tab {
                location: Length::from_cm(4.0),
                kind: TabKind::Centre,
            },
        ];

        let bytes = encoded_paragraph(&value, Some(&base));
        assert_eq!(bytes.iter().filter(|b| **b == tag::TAB_EXTRA).count(), 2);
        assert_eq!(decoded_paragraph(bytes, &base).unwrap(), value);

        let mut cleared = base.clone();
        cleared.tabs.extras.clear();
        let mut out = RelocBuffer::new();
        let err = encode_paragraph_layout_list(&mut out, &cleared, Some(&base)).unwrap_err();
        assert!(matches!(err, Error::Generate(_)));
    }

    #[test]
    fn test_combined_list() {
        let paragraph = ParagraphLayout {
            justify_hor: JustifyHorizontal::Centre,
            ..ParagraphLayout::default()
        };
        let character = CharacterLayout {
            italic: true,
            font: Font {
                name: "Arial".to_owned(),
                screenfont: ScreenFont::SansSerif,
            },
            ..CharacterLayout::default()
        };

        let mut out = RelocBuffer::new();
        encode_layout_list(
            &mut out,
            &paragraph,
            Some(&ParagraphLayout::default()),
            &character,
            Some(&CharacterLayout::default()),
        )
        .unwrap();
        assert_eq!(out.as_bytes()[4], tag::JUSTIFY_HOR);

        let mut session = Session::default();
        let (p, c) = decode_layout_list(
            &mut Cursor::new(out.as_bytes()),
            &mut session,
            &ParagraphLayout::default(),
            &CharacterLayout::default(),
        )
        .unwrap();
        assert_eq!(p, paragraph);
        assert_eq!(c, character);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_unknown_tag_skips_one_byte() {
        let bytes = vec![4, 0, 0, 0, 0x30, tag::BOLD, 1, 0x31];
        let mut session = Session::default();
        let base = CharacterLayout::default();
        let decoded =
            decode_character_layout_list(&mut Cursor::new(bytes), &mut session, &base).unwrap();
        assert!(decoded.bold);
        assert_eq!(session.warnings().len(), 2);
        assert_eq!(session.warnings()[0].offset, 4);
    }

    #[test]
    fn test_unknown_tag_rejected_when_strict() {
        let bytes = vec![1, 0, 0, 0, 0x30];
        let mut session =
            Session::new(Config::default().with_unknown_layout_tags(UnknownTagPolicy::Reject));
        let err = decode_character_layout_list(
            &mut Cursor::new(bytes),
            &mut session,
            &CharacterLayout::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_character_tag_in_paragraph_list_is_unknown() {
        let bytes = vec![1, 0, 0, 0, tag::ITALIC];
        let mut session = Session::default();
        let base = ParagraphLayout::default();
        let decoded = decode_paragraph_layout_list(&mut Cursor::new(bytes), &mut session, &base)
            .unwrap();
        assert_eq!(decoded, base);
        assert_eq!(session.warnings().len(), 1);
    }

    #[test]
    fn test_length_mismatch_fails() {
        // declares 2 bytes, the indent value needs 4
        let bytes = vec![2, 0, 0, 0, tag::INDENT_LEFT, 1, 0, 0, 0];
        let err = decoded_paragraph(bytes, &ParagraphLayout::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_truncated_list_fails() {
        let bytes = vec![9, 0, 0, 0, tag::INDENT_LEFT, 1];
        let err = decoded_paragraph(bytes, &ParagraphLayout::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_unknown_enum_values_warn() {
        let bytes = vec![
            4, 0, 0, 0, tag::JUSTIFY_HOR, 9, tag::KEEP_TOGETHER, 7,
        ];
        let mut session = Session::default();
        let decoded = decode_paragraph_layout_list(
            &mut Cursor::new(bytes),
            &mut session,
            &ParagraphLayout::default(),
        )
        .unwrap();
        assert_eq!(decoded.justify_hor, JustifyHorizontal::Left);
        assert!(decoded.keep_together);
        assert_eq!(session.warnings().len(), 2);
    }

    #[test]
    fn test_bullet_and_border_round_trip() {
        let base = ParagraphLayout::default();
        let value = ParagraphLayout {
            bullet: Bullet {
                on: true,
                character: '*',
                color: Color::rgb(0x10, 0x20, 0x30),
                ..Bullet::default()
            },
            top_border: Border {
                kind: BorderKind::Dashed,
                thickness: Size::from_points(2.5),
                color: Color::rgb(0xff, 0, 0),
            },
            ..base.clone()
        };
        let bytes = encoded_paragraph(&value, Some(&base));
        assert_eq!(decoded_paragraph(bytes, &base).unwrap(), value);

        let unencodable = ParagraphLayout {
            bullet: Bullet {
                character: '\u{2022}',
                ..Bullet::default()
            },
            ..base.clone()
        };
        let mut out = RelocBuffer::new();
        let err = encode_paragraph_layout_list(&mut out, &unencodable, Some(&base)).unwrap_err();
        assert!(matches!(err, Error::Generate(_)));
    }

    fn arb_color() -> impl Strategy<Value = Color> {
        any::<(u8, u8, u8)>().prop_map(|(r, g, b)| Color::rgb(r, g, b))
    }

    fn arb_character() -> impl Strategy<Value = CharacterLayout> {
        (
            arb_color(),
            arb_color(),
            0u32..2000,
            any::<(bool, bool, bool, bool)>(),
            prop_oneof![
                Just(SuperSub::Normal),
                Just(SuperSub::Superscript),
                Just(SuperSub::Subscript)
            ],
            "[A-Za-z ]{0,20}",
        )
            .prop_map(
                |(color, back_color, size, (italic, bold, underline, strikethrough), super_sub, name)| {
                    CharacterLayout {
                        color,
                        back_color,
                        font_size: Size(size),
                        italic,
                        bold,
                        super_sub,
                        underline,
                        strikethrough,
                        font: Font {
                            name,
                            screenfont: ScreenFont::Serif,
                        },
                    }
                },
            )
    }

    fn arb_paragraph() -> impl Strategy<Value = ParagraphLayout> {
        (
            arb_color(),
            (-2000i32..2000, -2000i32..2000, -2000i32..2000),
            any::<(bool, bool, bool, bool, bool, bool)>(),
            proptest::collection::vec((0i32..10_000, 0u8..3), 1..4),
            0u32..400,
        )
            .prop_map(|(back_color, (left, right, first), flags, tabs, space)| {
                let (exact, together, next, page, widow, wrap) = flags;
                let mut layout = ParagraphLayout {
                    back_color,
                    indent_left: Length(left),
                    indent_right: Length(right),
                    indent_first: Length(first),
                    linespacing_exact: exact,
                    keep_together: together,
                    keep_with_next: next,
                    on_next_page: page,
                    no_widow_protection: widow,
                    wrap_to_fit_cell: wrap,
                    space_above: Size(space),
                    ..ParagraphLayout::default()
                };
                layout.tabs.extras = tabs
                    .into_iter()
                    .map(|(location, kind)| Tab {
                        location: Length(location),
                        kind: match kind {
                            0 => TabKind::Left,
                            1 => TabKind::Centre,
                            _ => TabKind::Right,
                        },
                    })
                    .collect();
                layout
            })
    }

    proptest! {
        #[test]
        fn prop_character_round_trip(value in arb_character(), base in arb_character()) {
            let mut out = RelocBuffer::new();
            encode_character_layout_list(&mut out, &value, Some(&base)).unwrap();
            let mut session = Session::default();
            let decoded = decode_character_layout_list(
                &mut Cursor::new(out.as_bytes()), &mut session, &base,
            ).unwrap();
            prop_assert_eq!(decoded, value);
        }

        #[test]
        fn prop_paragraph_round_trip(value in arb_paragraph(), base in arb_paragraph()) {
            let bytes = encoded_paragraph(&value, Some(&base));
            prop_assert_eq!(decoded_paragraph(bytes, &base).unwrap(), value);
        }
    }
}
