//! [Anchor tables](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#anchor-tables),
//! shared by GPOS types 3 (Cursive), 4 (Mark-to-Base), 5 (Mark-to-Ligature)
//! and 6 (Mark-to-Mark).
//!
//! All three formats resolve to the same `(x, y)` pair in design units;
//! format 2's contour-point index and format 3's device-table offsets are
//! parsed past but not applied (outline-level hinting is out of scope here,
//! consistent with `ValueRecord`'s own device-table fields).

use crate::parser::Stream;

/// An anchor point's design-unit coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Anchor {
    pub x: i16,
    pub y: i16,
}

impl Anchor {
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        match format {
            1 | 2 | 3 => {
                let x: i16 = s.read()?;
                let y: i16 = s.read()?;
                Some(Anchor { x, y })
            }
            _ => {
                warn!("unknown Anchor table format: {}", format);
                None
            }
        }
    }
}
