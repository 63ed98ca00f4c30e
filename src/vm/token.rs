use std::fmt;

/// Table tag occupying the high byte of every [`FunctionToken`].
///
/// Tokens and interned-name references share the same 32-bit call-site encoding; giving tokens a
/// nonzero high byte keeps the two value spaces disjoint, so a token never passes the name
/// plausibility check and vice versa.
pub const FUNCTION_TABLE: u8 = 0x06;

/// Identity of one hookable dispatch target, stable for the lifetime of its runtime.
///
/// Tokens consist of a 32-bit value where:
/// - The high byte (bits 24-31) carries the table tag ([`FUNCTION_TABLE`])
/// - The low 24 bits (bits 0-23) carry the row allocated when the function was registered
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionToken(pub u32);

impl FunctionToken {
    /// Creates a token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        FunctionToken(value)
    }

    /// Builds the token for a freshly allocated row
    #[must_use]
    pub(crate) fn for_row(row: u32) -> Self {
        FunctionToken(u32::from(FUNCTION_TABLE) << 24 | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table tag from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for FunctionToken {
    fn from(value: u32) -> Self {
        FunctionToken(value)
    }
}

impl From<FunctionToken> for u32 {
    fn from(token: FunctionToken) -> Self {
        token.0
    }
}

impl fmt::Debug for FunctionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FunctionToken(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for FunctionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
