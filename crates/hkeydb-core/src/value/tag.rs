///
/// ValueTag
///
/// Stable canonical value-variant tag used by ordering and encoding surfaces.
///
/// IMPORTANT:
/// Tag values define cross-variant order and are written into stored keys.
/// They must stay below 0xFF so an appended 0xFF byte sorts after every
/// key sharing the same prefix.
///

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum ValueTag {
    Null = 0x10,
    Bool = 0x20,
    Int = 0x30,
    Uint = 0x40,
    Text = 0x50,
    Blob = 0x60,
}

impl ValueTag {
    /// Stable byte tag for this variant.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Stable human-readable value kind label for diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Uint => "Uint",
            Self::Text => "Text",
            Self::Blob => "Blob",
        }
    }
}
