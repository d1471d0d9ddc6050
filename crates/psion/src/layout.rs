//! Paragraph and character layout records.
//!
//! Layouts are always complete: the wire format only carries differences
//! from a base, but every decoded value has all of its fields filled in.

/// A distance, held as twips (1/1440 inch) so the wire value round-trips
/// exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Length(pub i32);

impl Length {
    const TWIPS_PER_CM: f32 = 1440.0 / 2.54;

    pub fn from_cm(cm: f32) -> Self {
        Length((cm * Self::TWIPS_PER_CM).round() as i32)
    }

    pub fn cm(self) -> f32 {
        self.0 as f32 / Self::TWIPS_PER_CM
    }

    pub fn twips(self) -> i32 {
        self.0
    }
}

/// A typographic size in twentieths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Size(pub u32);

impl Size {
    pub fn from_points(points: f32) -> Self {
        Size((points.max(0.0) * 20.0).round() as u32)
    }

    pub fn points(self) -> f32 {
        self.0 as f32 / 20.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Color { red, green, blue }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenFont {
    SansSerif,
    NonProportional,
    #[default]
    Serif,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    pub name: String,
    pub screenfont: ScreenFont,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            name: "Times New Roman".to_owned(),
            screenfont: ScreenFont::Serif,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderKind {
    #[default]
    None,
    Single,
    Double,
    Dotted,
    Dashed,
    DotDashed,
    DotDotDashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Border {
    pub kind: BorderKind,
    pub thickness: Size,
    pub color: Color,
}

impl Default for Border {
    fn default() -> Self {
        Border {
            kind: BorderKind::None,
            thickness: Size::from_points(1.0),
            color: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bullet {
    pub on: bool,
    pub font_size: Size,
    pub character: char,
    /// Whether the bullet text is indented past the bullet.
    pub indent: bool,
    pub color: Color,
    pub font: Font,
}

impl Default for Bullet {
    fn default() -> Self {
        Bullet {
            on: false,
            font_size: Size::from_points(10.0),
            character: '\u{95}',
            indent: true,
            color: Color::BLACK,
            font: Font::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TabKind {
    #[default]
    Left,
    Centre,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tab {
    pub location: Length,
    pub kind: TabKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabSet {
    /// Spacing of the implicit tabs between explicit ones.
    pub normal: Length,
    pub extras: Vec<Tab>,
}

impl Default for TabSet {
    fn default() -> Self {
        TabSet {
            normal: Length::from_cm(0.64),
            extras: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JustifyHorizontal {
    #[default]
    Left,
    Centre,
    Right,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JustifyVertical {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SuperSub {
    #[default]
    Normal,
    Superscript,
    Subscript,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterLayout {
    pub color: Color,
    pub back_color: Color,
    pub font_size: Size,
    pub italic: bool,
    pub bold: bool,
    pub super_sub: SuperSub,
    pub underline: bool,
    pub strikethrough: bool,
    pub font: Font,
}

impl Default for CharacterLayout {
    fn default() -> Self {
        CharacterLayout {
            color: Color::BLACK,
            back_color: Color::WHITE,
            font_size: Size::from_points(10.0),
            italic: false,
            bold: false,
            super_sub: SuperSub::Normal,
            underline: false,
            strikethrough: false,
            font: Font::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParagraphLayout {
    pub back_color: Color,
    pub indent_left: Length,
    pub indent_right: Length,
    pub indent_first: Length,
    pub justify_hor: JustifyHorizontal,
    pub justify_ver: JustifyVertical,
    pub linespacing: Size,
    pub linespacing_exact: bool,
    pub space_above: Size,
    pub space_below: Size,
    pub keep_together: bool,
    pub keep_with_next: bool,
    pub on_next_page: bool,
    pub no_widow_protection: bool,
    pub wrap_to_fit_cell: bool,
    pub border_distance: Length,
    pub bullet: Bullet,
    pub left_border: Border,
    pub right_border: Border,
    pub top_border: Border,
    pub bottom_border: Border,
    pub tabs: TabSet,
}

impl Default for ParagraphLayout {
    fn default() -> Self {
        ParagraphLayout {
            back_color: Color::WHITE,
            indent_left: Length::default(),
            indent_right: Length::default(),
            indent_first: Length::default(),
            justify_hor: JustifyHorizontal::Left,
            justify_ver: JustifyVertical::Top,
            linespacing: Size::from_points(10.0),
            linespacing_exact: false,
            space_above: Size::default(),
            space_below: Size::default(),
            keep_together: false,
            keep_with_next: false,
            on_next_page: false,
            no_widow_protection: false,
            wrap_to_fit_cell: false,
            border_distance: Length::from_cm(0.176),
            bullet: Bullet::default(),
            left_border: Border::default(),
            right_border: Border::default(),
            top_border: Border::default(),
            bottom_border: Border::default(),
            tabs: TabSet::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_units() {
        let indent = Length::from_cm(0.64);
        assert_eq!(indent.twips(), 363);
        assert!((indent.cm() - 0.64).abs() < 0.001);
        assert_eq!(Length::from_cm(2.54).twips(), 1440);
        assert_eq!(Length::from_cm(-1.27).twips(), -720);
    }

    #[test]
    fn test_size_units() {
        assert_eq!(Size::from_points(10.0), Size(200));
        assert_eq!(Size(250).points(), 12.5);
        assert_eq!(Size::from_points(-3.0), Size(0));
    }

    #[test]
    fn test_defaults_are_plain_text() {
        let character = CharacterLayout::default();
        assert_eq!(character.color, Color::BLACK);
        assert_eq!(character.font.name, "Times New Roman");

        let paragraph = ParagraphLayout::default();
        assert!(!paragraph.bullet.on);
        assert_eq!(paragraph.tabs.normal, Length::from_cm(0.64));
        assert!(paragraph.tabs.extras.is_empty());
    }
}
