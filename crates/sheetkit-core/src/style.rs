//! Style builder and runtime management.
//!
//! Provides high-level, ergonomic style types that map to the low-level XML
//! stylesheet structures in `sheetkit-xml`. Each `add_style` call appends a
//! new record to every component table it touches (fonts, fills, borders,
//! number formats, cellXfs) and returns the new index, even when an
//! identical style was registered before: these tables are not deduplicated
//! automatically.

use sheetkit_xml::styles::{
    Alignment, Border, BorderSide, Borders, Color, Fill, Fills, Font, Fonts, NumFmt, NumFmts,
    PatternFill, Protection, StyleSheet, Xf,
};

use crate::error::{Error, Result};

/// Maximum number of cell XFs Excel supports.
const MAX_CELL_XFS: usize = 65430;

/// First ID available for custom number formats (0-163 are reserved).
const CUSTOM_NUM_FMT_BASE: u32 = 164;

/// Built-in number format IDs.
pub mod builtin_num_fmts {
    /// General
    pub const GENERAL: u32 = 0;
    /// 0
    pub const INTEGER: u32 = 1;
    /// 0.00
    pub const DECIMAL_2: u32 = 2;
    /// #,##0
    pub const THOUSANDS: u32 = 3;
    /// #,##0.00
    pub const THOUSANDS_DECIMAL: u32 = 4;
    /// 0%
    pub const PERCENT: u32 = 9;
    /// 0.00%
    pub const PERCENT_DECIMAL: u32 = 10;
    /// 0.00E+00
    pub const SCIENTIFIC: u32 = 11;
    /// m/d/yyyy
    pub const DATE_MDY: u32 = 14;
    /// d-mmm-yy
    pub const DATE_DMY: u32 = 15;
    /// d-mmm
    pub const DATE_DM: u32 = 16;
    /// mmm-yy
    pub const DATE_MY: u32 = 17;
    /// h:mm AM/PM
    pub const TIME_HM_AP: u32 = 18;
    /// h:mm:ss AM/PM
    pub const TIME_HMS_AP: u32 = 19;
    /// h:mm
    pub const TIME_HM: u32 = 20;
    /// h:mm:ss
    pub const TIME_HMS: u32 = 21;
    /// m/d/yyyy h:mm
    pub const DATETIME: u32 = 22;
    /// @
    pub const TEXT: u32 = 49;
}

/// User-facing style definition.
#[derive(Debug, Clone, Default)]
pub struct Style {
    pub font: Option<FontStyle>,
    pub fill: Option<FillStyle>,
    pub border: Option<BorderStyle>,
    pub alignment: Option<AlignmentStyle>,
    pub num_fmt: Option<NumFmtStyle>,
    pub protection: Option<ProtectionStyle>,
}

/// Font style definition.
#[derive(Debug, Clone, Default)]
pub struct FontStyle {
    /// Font name, e.g. "Calibri", "Arial".
    pub name: Option<String>,
    /// Font size, e.g. 11.0.
    pub size: Option<f64>,
    /// Bold.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Underline.
    pub underline: bool,
    /// Strikethrough.
    pub strikethrough: bool,
    /// Font color.
    pub color: Option<StyleColor>,
}

/// Color specification.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleColor {
    /// ARGB hex color, e.g. "FF0000FF".
    Rgb(String),
    /// Theme color index.
    Theme(u32),
    /// Indexed color.
    Indexed(u32),
}

/// Fill style definition.
#[derive(Debug, Clone)]
pub struct FillStyle {
    /// Pattern type.
    pub pattern: PatternType,
    /// Foreground color.
    pub fg_color: Option<StyleColor>,
    /// Background color.
    pub bg_color: Option<StyleColor>,
    /// Gradient fill (mutually exclusive with pattern fill when gradient is set).
    pub gradient: Option<GradientFillStyle>,
}

/// Gradient fill style definition.
#[derive(Debug, Clone)]
pub struct GradientFillStyle {
    /// Gradient type: linear or path.
    pub gradient_type: GradientType,
    /// Rotation angle in degrees for linear gradients.
    pub degree: Option<f64>,
    /// Left coordinate for path gradients (0.0-1.0).
    pub left: Option<f64>,
    /// Right coordinate for path gradients (0.0-1.0).
    pub right: Option<f64>,
    /// Top coordinate for path gradients (0.0-1.0).
    pub top: Option<f64>,
    /// Bottom coordinate for path gradients (0.0-1.0).
    pub bottom: Option<f64>,
    /// Gradient stops defining the color transitions.
    pub stops: Vec<GradientStop>,
}

/// Gradient type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientType {
    Linear,
    Path,
}

impl GradientType {
    fn from_str(s: &str) -> Self {
        match s {
            "path" => GradientType::Path,
            _ => GradientType::Linear,
        }
    }
}

/// A single stop in a gradient fill.
#[derive(Debug, Clone)]
pub struct GradientStop {
    /// Position of this stop (0.0-1.0).
    pub position: f64,
    /// Color at this stop.
    pub color: StyleColor,
}

/// Pattern fill type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternType {
    None,
    Solid,
    Gray125,
    DarkGray,
    MediumGray,
    LightGray,
}

impl PatternType {
    fn as_str(&self) -> &str {
        match self {
            PatternType::None => "none",
            PatternType::Solid => "solid",
            PatternType::Gray125 => "gray125",
            PatternType::DarkGray => "darkGray",
            PatternType::MediumGray => "mediumGray",
            PatternType::LightGray => "lightGray",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "none" => PatternType::None,
            "solid" => PatternType::Solid,
            "gray125" => PatternType::Gray125,
            "darkGray" => PatternType::DarkGray,
            "mediumGray" => PatternType::MediumGray,
            "lightGray" => PatternType::LightGray,
            _ => PatternType::None,
        }
    }
}

/// Border style definition.
#[derive(Debug, Clone, Default)]
pub struct BorderStyle {
    pub left: Option<BorderSideStyle>,
    pub right: Option<BorderSideStyle>,
    pub top: Option<BorderSideStyle>,
    pub bottom: Option<BorderSideStyle>,
    pub diagonal: Option<BorderSideStyle>,
}

/// Border side style definition.
#[derive(Debug, Clone)]
pub struct BorderSideStyle {
    pub style: BorderLineStyle,
    pub color: Option<StyleColor>,
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderLineStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderLineStyle {
    fn as_str(&self) -> &str {
        match self {
            BorderLineStyle::Thin => "thin",
            BorderLineStyle::Medium => "medium",
            BorderLineStyle::Thick => "thick",
            BorderLineStyle::Dashed => "dashed",
            BorderLineStyle::Dotted => "dotted",
            BorderLineStyle::Double => "double",
            BorderLineStyle::Hair => "hair",
            BorderLineStyle::MediumDashed => "mediumDashed",
            BorderLineStyle::DashDot => "dashDot",
            BorderLineStyle::MediumDashDot => "mediumDashDot",
            BorderLineStyle::DashDotDot => "dashDotDot",
            BorderLineStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderLineStyle::SlantDashDot => "slantDashDot",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "thin" => Some(BorderLineStyle::Thin),
            "medium" => Some(BorderLineStyle::Medium),
            "thick" => Some(BorderLineStyle::Thick),
            "dashed" => Some(BorderLineStyle::Dashed),
            "dotted" => Some(BorderLineStyle::Dotted),
            "double" => Some(BorderLineStyle::Double),
            "hair" => Some(BorderLineStyle::Hair),
            "mediumDashed" => Some(BorderLineStyle::MediumDashed),
            "dashDot" => Some(BorderLineStyle::DashDot),
            "mediumDashDot" => Some(BorderLineStyle::MediumDashDot),
            "dashDotDot" => Some(BorderLineStyle::DashDotDot),
            "mediumDashDotDot" => Some(BorderLineStyle::MediumDashDotDot),
            "slantDashDot" => Some(BorderLineStyle::SlantDashDot),
            _ => None,
        }
    }
}

/// Alignment style definition.
#[derive(Debug, Clone, Default)]
pub struct AlignmentStyle {
    pub horizontal: Option<HorizontalAlign>,
    pub vertical: Option<VerticalAlign>,
    pub wrap_text: bool,
    pub text_rotation: Option<u32>,
    pub indent: Option<u32>,
    pub shrink_to_fit: bool,
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizontalAlign {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HorizontalAlign {
    fn as_str(&self) -> &str {
        match self {
            HorizontalAlign::General => "general",
            HorizontalAlign::Left => "left",
            HorizontalAlign::Center => "center",
            HorizontalAlign::Right => "right",
            HorizontalAlign::Fill => "fill",
            HorizontalAlign::Justify => "justify",
            HorizontalAlign::CenterContinuous => "centerContinuous",
            HorizontalAlign::Distributed => "distributed",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "general" => Some(HorizontalAlign::General),
            "left" => Some(HorizontalAlign::Left),
            "center" => Some(HorizontalAlign::Center),
            "right" => Some(HorizontalAlign::Right),
            "fill" => Some(HorizontalAlign::Fill),
            "justify" => Some(HorizontalAlign::Justify),
            "centerContinuous" => Some(HorizontalAlign::CenterContinuous),
            "distributed" => Some(HorizontalAlign::Distributed),
            _ => None,
        }
    }
}

/// Vertical alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalAlign {
    Top,
    Center,
    Bottom,
    Justify,
    Distributed,
}

impl VerticalAlign {
    fn as_str(&self) -> &str {
        match self {
            VerticalAlign::Top => "top",
            VerticalAlign::Center => "center",
            VerticalAlign::Bottom => "bottom",
            VerticalAlign::Justify => "justify",
            VerticalAlign::Distributed => "distributed",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "top" => Some(VerticalAlign::Top),
            "center" => Some(VerticalAlign::Center),
            "bottom" => Some(VerticalAlign::Bottom),
            "justify" => Some(VerticalAlign::Justify),
            "distributed" => Some(VerticalAlign::Distributed),
            _ => None,
        }
    }
}

/// Number format style.
#[derive(Debug, Clone)]
pub enum NumFmtStyle {
    /// Built-in format ID (0-49).
    Builtin(u32),
    /// Custom format code string.
    Custom(String),
}

/// Protection style definition.
#[derive(Debug, Clone)]
pub struct ProtectionStyle {
    pub locked: bool,
    pub hidden: bool,
}

/// Builder for creating Style objects with a fluent API.
///
/// Each setter method initializes the relevant sub-struct if it has not been
/// set yet, then applies the value. Call `build()` to obtain the final Style.
pub struct StyleBuilder {
    style: Style,
}

impl StyleBuilder {
    /// Create a new StyleBuilder with all fields set to None.
    pub fn new() -> Self {
        Self {
            style: Style::default(),
        }
    }

    // -- Font methods --

    /// Set the bold flag on the font.
    pub fn bold(mut self, bold: bool) -> Self {
        self.style.font.get_or_insert_with(FontStyle::default).bold = bold;
        self
    }

    /// Set the italic flag on the font.
    pub fn italic(mut self, italic: bool) -> Self {
        self.style
            .font
            .get_or_insert_with(FontStyle::default)
            .italic = italic;
        self
    }

    /// Set the underline flag on the font.
    pub fn underline(mut self, underline: bool) -> Self {
        self.style
            .font
            .get_or_insert_with(FontStyle::default)
            .underline = underline;
        self
    }

    /// Set the strikethrough flag on the font.
    pub fn strikethrough(mut self, strikethrough: bool) -> Self {
        self.style
            .font
            .get_or_insert_with(FontStyle::default)
            .strikethrough = strikethrough;
        self
    }

    /// Set the font name (e.g. "Arial", "Calibri").
    pub fn font_name(mut self, name: &str) -> Self {
        self.style.font.get_or_insert_with(FontStyle::default).name = Some(name.to_string());
        self
    }

    /// Set the font size in points.
    pub fn font_size(mut self, size: f64) -> Self {
        self.style.font.get_or_insert_with(FontStyle::default).size = Some(size);
        self
    }

    /// Set the font color using a StyleColor value.
    pub fn font_color(mut self, color: StyleColor) -> Self {
        self.style.font.get_or_insert_with(FontStyle::default).color = Some(color);
        self
    }

    /// Set the font color using an ARGB hex string (e.g. "FF0000FF").
    pub fn font_color_rgb(self, rgb: &str) -> Self {
        self.font_color(StyleColor::Rgb(rgb.to_string()))
    }

    // -- Fill methods --

    /// Set the fill pattern type.
    pub fn fill_pattern(mut self, pattern: PatternType) -> Self {
        self.style
            .fill
            .get_or_insert(FillStyle {
                pattern: PatternType::None,
                fg_color: None,
                bg_color: None,
                gradient: None,
            })
            .pattern = pattern;
        self
    }

    /// Set the fill foreground color.
    pub fn fill_fg_color(mut self, color: StyleColor) -> Self {
        self.style
            .fill
            .get_or_insert(FillStyle {
                pattern: PatternType::None,
                fg_color: None,
                bg_color: None,
                gradient: None,
            })
            .fg_color = Some(color);
        self
    }

    /// Set the fill foreground color using an ARGB hex string.
    pub fn fill_fg_color_rgb(self, rgb: &str) -> Self {
        self.fill_fg_color(StyleColor::Rgb(rgb.to_string()))
    }

    /// Set the fill background color.
    pub fn fill_bg_color(mut self, color: StyleColor) -> Self {
        self.style
            .fill
            .get_or_insert(FillStyle {
                pattern: PatternType::None,
                fg_color: None,
                bg_color: None,
                gradient: None,
            })
            .bg_color = Some(color);
        self
    }

    /// Convenience method: set a solid fill with the given ARGB foreground color.
    pub fn solid_fill(mut self, rgb: &str) -> Self {
        self.style.fill = Some(FillStyle {
            pattern: PatternType::Solid,
            fg_color: Some(StyleColor::Rgb(rgb.to_string())),
            bg_color: self.style.fill.and_then(|f| f.bg_color),
            gradient: None,
        });
        self
    }

    // -- Border methods --

    /// Set the left border style and color.
    pub fn border_left(mut self, style: BorderLineStyle, color: StyleColor) -> Self {
        self.style
            .border
            .get_or_insert_with(BorderStyle::default)
            .left = Some(BorderSideStyle {
            style,
            color: Some(color),
        });
        self
    }

    /// Set the right border style and color.
    pub fn border_right(mut self, style: BorderLineStyle, color: StyleColor) -> Self {
        self.style
            .border
            .get_or_insert_with(BorderStyle::default)
            .right = Some(BorderSideStyle {
            style,
            color: Some(color),
        });
        self
    }

    /// Set the top border style and color.
    pub fn border_top(mut self, style: BorderLineStyle, color: StyleColor) -> Self {
        self.style
            .border
            .get_or_insert_with(BorderStyle::default)
            .top = Some(BorderSideStyle {
            style,
            color: Some(color),
        });
        self
    }

    /// Set the bottom border style and color.
    pub fn border_bottom(mut self, style: BorderLineStyle, color: StyleColor) -> Self {
        self.style
            .border
            .get_or_insert_with(BorderStyle::default)
            .bottom = Some(BorderSideStyle {
            style,
            color: Some(color),
        });
        self
    }

    /// Set all four border sides (left, right, top, bottom) to the same style and color.
    pub fn border_all(mut self, style: BorderLineStyle, color: StyleColor) -> Self {
        let side = || BorderSideStyle {
            style,
            color: Some(color.clone()),
        };
        let border = self.style.border.get_or_insert_with(BorderStyle::default);
        border.left = Some(side());
        border.right = Some(side());
        border.top = Some(side());
        border.bottom = Some(side());
        self
    }

    // -- Alignment methods --

    /// Set horizontal alignment.
    pub fn horizontal_align(mut self, align: HorizontalAlign) -> Self {
        self.style
            .alignment
            .get_or_insert_with(AlignmentStyle::default)
            .horizontal = Some(align);
        self
    }

    /// Set vertical alignment.
    pub fn vertical_align(mut self, align: VerticalAlign) -> Self {
        self.style
            .alignment
            .get_or_insert_with(AlignmentStyle::default)
            .vertical = Some(align);
        self
    }

    /// Set the wrap text flag.
    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.style
            .alignment
            .get_or_insert_with(AlignmentStyle::default)
            .wrap_text = wrap;
        self
    }

    /// Set text rotation in degrees.
    pub fn text_rotation(mut self, degrees: u32) -> Self {
        self.style
            .alignment
            .get_or_insert_with(AlignmentStyle::default)
            .text_rotation = Some(degrees);
        self
    }

    /// Set the indent level.
    pub fn indent(mut self, indent: u32) -> Self {
        self.style
            .alignment
            .get_or_insert_with(AlignmentStyle::default)
            .indent = Some(indent);
        self
    }

    /// Set the shrink to fit flag.
    pub fn shrink_to_fit(mut self, shrink: bool) -> Self {
        self.style
            .alignment
            .get_or_insert_with(AlignmentStyle::default)
            .shrink_to_fit = shrink;
        self
    }

    // -- Number format methods --

    /// Set a built-in number format by ID (see `builtin_num_fmts` constants).
    pub fn num_format_builtin(mut self, id: u32) -> Self {
        self.style.num_fmt = Some(NumFmtStyle::Builtin(id));
        self
    }

    /// Set a custom number format string (e.g. "#,##0.00").
    pub fn num_format_custom(mut self, format: &str) -> Self {
        self.style.num_fmt = Some(NumFmtStyle::Custom(format.to_string()));
        self
    }

    // -- Protection methods --

    /// Set the locked flag for cell protection.
    pub fn locked(mut self, locked: bool) -> Self {
        self.style
            .protection
            .get_or_insert(ProtectionStyle {
                locked: true,
                hidden: false,
            })
            .locked = locked;
        self
    }

    /// Set the hidden flag for cell protection.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.style
            .protection
            .get_or_insert(ProtectionStyle {
                locked: true,
                hidden: false,
            })
            .hidden = hidden;
        self
    }

    // -- Build --

    /// Consume the builder and return the constructed Style.
    pub fn build(self) -> Style {
        self.style
    }
}

impl Default for StyleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a `StyleColor` to the XML `Color` struct.
fn style_color_to_xml(color: &StyleColor) -> Color {
    match color {
        StyleColor::Rgb(rgb) => Color {
            auto: None,
            indexed: None,
            rgb: Some(rgb.clone()),
            theme: None,
            tint: None,
        },
        StyleColor::Theme(t) => Color {
            auto: None,
            indexed: None,
            rgb: None,
            theme: Some(*t),
            tint: None,
        },
        StyleColor::Indexed(i) => Color {
            auto: None,
            indexed: Some(*i),
            rgb: None,
            theme: None,
            tint: None,
        },
    }
}

/// Convert an XML `Color` back to a `StyleColor`.
fn xml_color_to_style(color: &Color) -> Option<StyleColor> {
    if let Some(ref rgb) = color.rgb {
        Some(StyleColor::Rgb(rgb.clone()))
    } else if let Some(theme) = color.theme {
        Some(StyleColor::Theme(theme))
    } else {
        color.indexed.map(StyleColor::Indexed)
    }
}

/// Convert a `FontStyle` to the XML `Font` struct.
fn font_style_to_xml(font: &FontStyle) -> Font {
    use sheetkit_xml::styles::{BoolVal, FontName, FontSize, Underline};

    Font {
        b: if font.bold {
            Some(BoolVal { val: None })
        } else {
            None
        },
        i: if font.italic {
            Some(BoolVal { val: None })
        } else {
            None
        },
        strike: if font.strikethrough {
            Some(BoolVal { val: None })
        } else {
            None
        },
        u: if font.underline {
            Some(Underline { val: None })
        } else {
            None
        },
        sz: font.size.map(|val| FontSize { val }),
        color: font.color.as_ref().map(style_color_to_xml),
        name: font.name.as_ref().map(|val| FontName { val: val.clone() }),
        family: None,
        scheme: None,
    }
}

/// Convert an XML `Font` to a `FontStyle`.
fn xml_font_to_style(font: &Font) -> FontStyle {
    FontStyle {
        name: font.name.as_ref().map(|n| n.val.clone()),
        size: font.sz.as_ref().map(|s| s.val),
        bold: font.b.is_some(),
        italic: font.i.is_some(),
        underline: font.u.is_some(),
        strikethrough: font.strike.is_some(),
        color: font.color.as_ref().and_then(xml_color_to_style),
    }
}

/// Convert a `FillStyle` to the XML `Fill` struct.
fn fill_style_to_xml(fill: &FillStyle) -> Fill {
    if let Some(ref grad) = fill.gradient {
        return Fill {
            pattern_fill: None,
            gradient_fill: Some(gradient_style_to_xml(grad)),
        };
    }
    Fill {
        pattern_fill: Some(PatternFill {
            pattern_type: Some(fill.pattern.as_str().to_string()),
            fg_color: fill.fg_color.as_ref().map(style_color_to_xml),
            bg_color: fill.bg_color.as_ref().map(style_color_to_xml),
        }),
        gradient_fill: None,
    }
}

/// Convert a `GradientFillStyle` to the XML `GradientFill` struct.
fn gradient_style_to_xml(grad: &GradientFillStyle) -> sheetkit_xml::styles::GradientFill {
    sheetkit_xml::styles::GradientFill {
        gradient_type: match grad.gradient_type {
            GradientType::Linear => None,
            GradientType::Path => Some("path".to_string()),
        },
        degree: grad.degree,
        left: grad.left,
        right: grad.right,
        top: grad.top,
        bottom: grad.bottom,
        stops: grad
            .stops
            .iter()
            .map(|s| sheetkit_xml::styles::GradientStop {
                position: s.position,
                color: style_color_to_xml(&s.color),
            })
            .collect(),
    }
}

/// Convert an XML `Fill` to a `FillStyle`.
fn xml_fill_to_style(fill: &Fill) -> Option<FillStyle> {
    if let Some(ref gf) = fill.gradient_fill {
        let gradient_type = gf
            .gradient_type
            .as_ref()
            .map(|s| GradientType::from_str(s))
            .unwrap_or(GradientType::Linear);
        let stops: Vec<GradientStop> = gf
            .stops
            .iter()
            .filter_map(|s| {
                xml_color_to_style(&s.color).map(|c| GradientStop {
                    position: s.position,
                    color: c,
                })
            })
            .collect();
        return Some(FillStyle {
            pattern: PatternType::None,
            fg_color: None,
            bg_color: None,
            gradient: Some(GradientFillStyle {
                gradient_type,
                degree: gf.degree,
                left: gf.left,
                right: gf.right,
                top: gf.top,
                bottom: gf.bottom,
                stops,
            }),
        });
    }
    let pf = fill.pattern_fill.as_ref()?;
    let pattern = pf
        .pattern_type
        .as_ref()
        .map(|s| PatternType::from_str(s))
        .unwrap_or(PatternType::None);
    Some(FillStyle {
        pattern,
        fg_color: pf.fg_color.as_ref().and_then(xml_color_to_style),
        bg_color: pf.bg_color.as_ref().and_then(xml_color_to_style),
        gradient: None,
    })
}

/// Convert a `BorderSideStyle` to the XML `BorderSide` struct.
fn border_side_to_xml(side: &BorderSideStyle) -> BorderSide {
    BorderSide {
        style: Some(side.style.as_str().to_string()),
        color: side.color.as_ref().map(style_color_to_xml),
    }
}

/// Convert an XML `BorderSide` to a `BorderSideStyle`.
fn xml_border_side_to_style(side: &BorderSide) -> Option<BorderSideStyle> {
    let style_str = side.style.as_ref()?;
    let style = BorderLineStyle::from_str(style_str)?;
    Some(BorderSideStyle {
        style,
        color: side.color.as_ref().and_then(xml_color_to_style),
    })
}

/// Convert a `BorderStyle` to the XML `Border` struct.
fn border_style_to_xml(border: &BorderStyle) -> Border {
    Border {
        diagonal_up: None,
        diagonal_down: None,
        left: border.left.as_ref().map(border_side_to_xml),
        right: border.right.as_ref().map(border_side_to_xml),
        top: border.top.as_ref().map(border_side_to_xml),
        bottom: border.bottom.as_ref().map(border_side_to_xml),
        diagonal: border.diagonal.as_ref().map(border_side_to_xml),
    }
}

/// Convert an XML `Border` to a `BorderStyle`.
fn xml_border_to_style(border: &Border) -> BorderStyle {
    BorderStyle {
        left: border.left.as_ref().and_then(xml_border_side_to_style),
        right: border.right.as_ref().and_then(xml_border_side_to_style),
        top: border.top.as_ref().and_then(xml_border_side_to_style),
        bottom: border.bottom.as_ref().and_then(xml_border_side_to_style),
        diagonal: border.diagonal.as_ref().and_then(xml_border_side_to_style),
    }
}

/// Convert an `AlignmentStyle` to the XML `Alignment` struct.
fn alignment_style_to_xml(align: &AlignmentStyle) -> Alignment {
    Alignment {
        horizontal: align.horizontal.map(|h| h.as_str().to_string()),
        vertical: align.vertical.map(|v| v.as_str().to_string()),
        wrap_text: if align.wrap_text { Some(true) } else { None },
        text_rotation: align.text_rotation,
        indent: align.indent,
        shrink_to_fit: if align.shrink_to_fit {
            Some(true)
        } else {
            None
        },
    }
}

/// Convert an XML `Alignment` to an `AlignmentStyle`.
fn xml_alignment_to_style(align: &Alignment) -> AlignmentStyle {
    AlignmentStyle {
        horizontal: align
            .horizontal
            .as_ref()
            .and_then(|s| HorizontalAlign::from_str(s)),
        vertical: align
            .vertical
            .as_ref()
            .and_then(|s| VerticalAlign::from_str(s)),
        wrap_text: align.wrap_text.unwrap_or(false),
        text_rotation: align.text_rotation,
        indent: align.indent,
        shrink_to_fit: align.shrink_to_fit.unwrap_or(false),
    }
}

/// Convert a `ProtectionStyle` to the XML `Protection` struct.
fn protection_style_to_xml(prot: &ProtectionStyle) -> Protection {
    Protection {
        locked: Some(prot.locked),
        hidden: Some(prot.hidden),
    }
}

/// Convert an XML `Protection` to a `ProtectionStyle`.
fn xml_protection_to_style(prot: &Protection) -> ProtectionStyle {
    ProtectionStyle {
        locked: prot.locked.unwrap_or(true), // Excel default: locked=true
        hidden: prot.hidden.unwrap_or(false),
    }
}

/// Convert a `FontStyle` to the XML `Font` struct and append it to the fonts
/// list. Always appends, even if an identical font already exists, so that
/// two styles created from equal `FontStyle` values do not silently alias
/// the same font record. Returns the 0-based font index.
fn add_font(fonts: &mut Fonts, font: &FontStyle) -> u32 {
    let xml_font = font_style_to_xml(font);
    let id = fonts.fonts.len() as u32;
    fonts.fonts.push(xml_font);
    fonts.count = Some(fonts.fonts.len() as u32);
    id
}

/// Convert a `FillStyle` to the XML `Fill` struct and append it. Always
/// appends; see [`add_font`]. Returns the 0-based fill index.
fn add_fill(fills: &mut Fills, fill: &FillStyle) -> u32 {
    let xml_fill = fill_style_to_xml(fill);
    let id = fills.fills.len() as u32;
    fills.fills.push(xml_fill);
    fills.count = Some(fills.fills.len() as u32);
    id
}

/// Convert a `BorderStyle` to the XML `Border` struct and append it. Always
/// appends; see [`add_font`]. Returns the 0-based border index.
fn add_border(borders: &mut Borders, border: &BorderStyle) -> u32 {
    let xml_border = border_style_to_xml(border);
    let id = borders.borders.len() as u32;
    borders.borders.push(xml_border);
    borders.count = Some(borders.borders.len() as u32);
    id
}

/// Register a custom number format and return its ID (starting from 164).
/// Always appends a new record, even if an identical format code already
/// exists; see [`add_font`].
fn add_num_fmt(stylesheet: &mut StyleSheet, fmt: &str) -> u32 {
    let num_fmts = stylesheet.num_fmts.get_or_insert_with(|| NumFmts {
        count: Some(0),
        num_fmts: Vec::new(),
    });

    let next_id = num_fmts
        .num_fmts
        .iter()
        .map(|nf| nf.num_fmt_id)
        .max()
        .map(|max_id| max_id + 1)
        .unwrap_or(CUSTOM_NUM_FMT_BASE);

    let next_id = next_id.max(CUSTOM_NUM_FMT_BASE);

    num_fmts.num_fmts.push(NumFmt {
        num_fmt_id: next_id,
        format_code: fmt.to_string(),
    });
    num_fmts.count = Some(num_fmts.num_fmts.len() as u32);

    next_id
}

/// Convert a high-level `Style` to XML components and register in the stylesheet.
/// Returns the style ID (index into cellXfs).
pub fn add_style(stylesheet: &mut StyleSheet, style: &Style) -> Result<u32> {
    if stylesheet.cell_xfs.xfs.len() >= MAX_CELL_XFS {
        return Err(Error::CellStylesExceeded { max: MAX_CELL_XFS });
    }

    let font_id = match &style.font {
        Some(font) => add_font(&mut stylesheet.fonts, font),
        None => 0, // default font
    };

    let fill_id = match &style.fill {
        Some(fill) => add_fill(&mut stylesheet.fills, fill),
        None => 0, // default fill (none)
    };

    let border_id = match &style.border {
        Some(border) => add_border(&mut stylesheet.borders, border),
        None => 0, // default border (empty)
    };

    let num_fmt_id = match &style.num_fmt {
        Some(NumFmtStyle::Builtin(id)) => *id,
        Some(NumFmtStyle::Custom(code)) => add_num_fmt(stylesheet, code),
        None => 0, // General
    };

    let alignment = style.alignment.as_ref().map(alignment_style_to_xml);
    let protection = style.protection.as_ref().map(protection_style_to_xml);

    let xf = Xf {
        num_fmt_id: Some(num_fmt_id),
        font_id: Some(font_id),
        fill_id: Some(fill_id),
        border_id: Some(border_id),
        xf_id: Some(0),
        apply_number_format: if num_fmt_id != 0 { Some(true) } else { None },
        apply_font: if font_id != 0 { Some(true) } else { None },
        apply_fill: if fill_id != 0 { Some(true) } else { None },
        apply_border: if border_id != 0 { Some(true) } else { None },
        apply_alignment: if alignment.is_some() {
            Some(true)
        } else {
            None
        },
        alignment,
        protection,
    };

    let id = stylesheet.cell_xfs.xfs.len() as u32;
    stylesheet.cell_xfs.xfs.push(xf);
    stylesheet.cell_xfs.count = Some(stylesheet.cell_xfs.xfs.len() as u32);

    Ok(id)
}

/// Get the `Style` from a style ID (reverse lookup from XML components).
pub fn get_style(stylesheet: &StyleSheet, style_id: u32) -> Option<Style> {
    let xf = stylesheet.cell_xfs.xfs.get(style_id as usize)?;

    let font = xf
        .font_id
        .and_then(|id| stylesheet.fonts.fonts.get(id as usize))
        .map(xml_font_to_style);

    let fill = xf
        .fill_id
        .and_then(|id| stylesheet.fills.fills.get(id as usize))
        .and_then(xml_fill_to_style);

    let border = xf
        .border_id
        .and_then(|id| stylesheet.borders.borders.get(id as usize))
        .map(xml_border_to_style);

    let alignment = xf.alignment.as_ref().map(xml_alignment_to_style);

    let num_fmt = xf.num_fmt_id.and_then(|id| {
        if id == 0 {
            return None;
        }
        // Check if it's a built-in format (0-163).
        if id < CUSTOM_NUM_FMT_BASE {
            Some(NumFmtStyle::Builtin(id))
        } else {
            // Look up custom format code.
            stylesheet
                .num_fmts
                .as_ref()
                .and_then(|nfs| nfs.num_fmts.iter().find(|nf| nf.num_fmt_id == id))
                .map(|nf| NumFmtStyle::Custom(nf.format_code.clone()))
        }
    });

    let protection = xf.protection.as_ref().map(xml_protection_to_style);

    Some(Style {
        font,
        fill,
        border,
        alignment,
        num_fmt,
        protection,
    })
}
