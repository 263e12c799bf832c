//! Cell display styles
//!
//! Exported sheets only need a handful of looks: the bold, centred header
//! and the two-decimal number format used for amounts and weights. The
//! model keeps the pieces separate so the writer can deduplicate them.

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// 0 - General
    pub const ID_GENERAL: u32 = 0;
    /// 2 - 0.00
    pub const ID_NUMBER_DEC2: u32 = 2;
    /// 4 - #,##0.00
    pub const ID_NUMBER_SEP_DEC2: u32 = 4;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// First ID available for custom formats
    pub const FIRST_CUSTOM_ID: u32 = 164;

    /// Create a number format from a format string
    pub fn from_string<S: Into<String>>(format: S) -> Self {
        NumberFormat::Custom(format.into())
    }

    /// Number with thousands separator and two decimals (#,##0.00)
    pub fn thousands_decimal() -> Self {
        NumberFormat::BuiltIn(Self::ID_NUMBER_SEP_DEC2)
    }

    /// The built-in ID, if this is a built-in (or general) format
    pub fn builtin_id(&self) -> Option<u32> {
        match self {
            NumberFormat::General => Some(Self::ID_GENERAL),
            NumberFormat::BuiltIn(id) => Some(*id),
            NumberFormat::Custom(_) => None,
        }
    }

    /// The format code, for the formats this crate knows about
    pub fn format_code(&self) -> Option<&str> {
        match self {
            NumberFormat::General => Some("General"),
            NumberFormat::BuiltIn(NumberFormat::ID_NUMBER_DEC2) => Some("0.00"),
            NumberFormat::BuiltIn(NumberFormat::ID_NUMBER_SEP_DEC2) => Some("#,##0.00"),
            NumberFormat::BuiltIn(NumberFormat::ID_TEXT) => Some("@"),
            NumberFormat::BuiltIn(_) => None,
            NumberFormat::Custom(code) => Some(code.as_str()),
        }
    }
}

/// Horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    /// Spreadsheet default (text left, numbers right)
    #[default]
    General,
    /// Left aligned
    Left,
    /// Centered
    Center,
    /// Right aligned
    Right,
}

/// Cell style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Bold font
    pub bold: bool,
    /// Horizontal alignment
    pub horizontal: HorizontalAlignment,
    /// Number format
    pub number_format: NumberFormat,
}

impl Style {
    /// Check whether this is the default style
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }

    /// Bold, centred header style
    pub fn header() -> Self {
        Self {
            bold: true,
            horizontal: HorizontalAlignment::Center,
            number_format: NumberFormat::General,
        }
    }

    /// Two-decimal amount style (#,##0.00)
    pub fn two_decimals() -> Self {
        Self {
            number_format: NumberFormat::thousands_decimal(),
            ..Default::default()
        }
    }
}
