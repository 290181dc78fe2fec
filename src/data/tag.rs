//! Type tags for arena objects.
//!
//! The tag is the first field of every object, stored as LEB128.
//! Every tag below 128 takes a single byte.
//! Tags are also the parse order: the reader offers each position
//! to every kind in tag order, which is why `Symbol` comes last.

macro_rules! tags {
    ($($variant:ident = $value:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum Tag {
            $($variant = $value,)*
        }

        impl Tag {
            /// Every tag, in ascending (parse) order.
            pub const ALL: &'static [Tag] = &[$(Tag::$variant,)*];
        }

        impl TryFrom<u64> for Tag {
            type Error = u64;

            fn try_from(value: u64) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Tag::$variant),)*
                    v => Err(v),
                }
            }
        }
    };
}

tags! {
    Integer = 0,
    NegInteger = 1,
    Decimal = 2,
    Text = 3,

    Quote = 4,
    List = 5,
    Program = 6,

    IfThen = 7,
    IfThenElse = 8,
    DoUntil = 9,
    WhileRepeat = 10,
    StartNext = 11,
    StartStep = 12,

    Dup = 13,
    Drop = 14,
    Swap = 15,
    Over = 16,
    Rot = 17,
    Depth = 18,
    Clear = 19,
    Pick = 20,
    DropN = 21,
    Dup2 = 22,
    Drop2 = 23,

    Add = 24,
    Sub = 25,
    Mul = 26,
    Div = 27,
    Neg = 28,
    Abs = 29,

    Eq = 30,
    Ne = 31,
    Lt = 32,
    Gt = 33,
    Le = 34,
    Ge = 35,
    And = 36,
    Or = 37,
    Not = 38,

    Eval = 39,
    Sto = 40,
    Rcl = 41,
    Purge = 42,
    ToList = 43,
    FromList = 44,
    Size = 45,
    ToText = 46,
    Mem = 47,
    Gc = 48,

    Symbol = 49,
}

impl Tag {
    /// The tag value as stored in the arena.
    pub const fn value(self) -> u64 {
        self as u16 as u64
    }

    /// Bytes taken by the encoded tag.
    pub const fn encoded_len(self) -> usize {
        super::leb128::encoded_len(self.value())
    }

    /// Decode the tag at the start of an object.
    pub fn read(bytes: &[u8]) -> Result<(Tag, usize), u64> {
        let (value, len) = super::leb128::read(bytes).ok_or(u64::MAX)?;
        Ok((Tag::try_from(value)?, len))
    }

    /// Human-readable name, used for diagnostics and for command lookup.
    pub fn name(self) -> &'static str {
        crate::dispatch::handlers(self).name
    }

    pub fn is_command(self) -> bool {
        self >= Tag::Dup && self <= Tag::Gc
    }
}

impl core::fmt::Display for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::Tag;

    #[test]
    fn all_tags_round_trip() {
        for (i, &tag) in Tag::ALL.iter().enumerate() {
            assert_eq!(tag.value(), i as u64, "tags must be dense");
            assert_eq!(Tag::try_from(tag.value()), Ok(tag));
            assert_eq!(tag.encoded_len(), 1);
        }
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(Tag::try_from(4000), Err(4000));
        assert!(Tag::read(&[0xff, 0x7f]).is_err());
    }

    #[test]
    fn symbol_parses_last() {
        assert_eq!(Tag::ALL.last(), Some(&Tag::Symbol));
    }
}
