//! The [Coverage table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table):
//! decides whether a glyph participates in a subtable and, if so, at what
//! dense index into that subtable's companion arrays.

use crate::GlyphId;
use crate::parser::{FromData, SafeStream, Stream, LazyArray16};

#[derive(Clone, Copy, Debug)]
struct RangeRecord {
    start: GlyphId,
    end: GlyphId,
    start_coverage_index: u16,
}

impl RangeRecord {
    #[inline]
    fn contains(&self, glyph_id: GlyphId) -> bool {
        self.start <= glyph_id && glyph_id <= self.end
    }

    #[inline]
    fn coverage_index(&self, glyph_id: GlyphId) -> u16 {
        self.start_coverage_index + (glyph_id.0 - self.start.0)
    }
}

impl FromData for RangeRecord {
    const SIZE: usize = 6;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        RangeRecord {
            start: s.read(),
            end: s.read(),
            start_coverage_index: s.read(),
        }
    }
}

/// A [Coverage Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table).
#[derive(Clone, Copy, Debug)]
pub(crate) enum CoverageTable<'a> {
    Format1 { glyphs: LazyArray16<'a, GlyphId> },
    Format2 { ranges: LazyArray16<'a, RangeRecord> },
}

impl<'a> CoverageTable<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        match format {
            1 => Some(CoverageTable::Format1 { glyphs: s.read_array16()? }),
            2 => Some(CoverageTable::Format2 { ranges: s.read_array16()? }),
            _ => {
                warn!("unknown Coverage table format: {}", format);
                None
            }
        }
    }

    /// Returns the dense coverage index of `glyph_id`, if covered.
    pub fn get(&self, glyph_id: GlyphId) -> Option<u16> {
        match self {
            CoverageTable::Format1 { glyphs } => {
                glyphs.binary_search(&glyph_id).map(|(idx, _)| idx)
            }
            CoverageTable::Format2 { ranges } => {
                ranges.binary_search_by(|r| {
                    if glyph_id < r.start {
                        core::cmp::Ordering::Greater
                    } else if glyph_id > r.end {
                        core::cmp::Ordering::Less
                    } else {
                        core::cmp::Ordering::Equal
                    }
                }).map(|(_, r)| r.coverage_index(glyph_id))
            }
        }
    }

    #[inline]
    pub fn contains(&self, glyph_id: GlyphId) -> bool {
        self.get(glyph_id).is_some()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    // OpenType spec §8, scenario 1: format 1 miss/hit.
    #[test]
    fn format1_hit_miss() {
        let data = [0x00, 0x01, 0x00, 0x03, 0x00, 0x0A, 0x00, 0x0B, 0x00, 0x0C];
        let table = CoverageTable::parse(&data).unwrap();
        assert_eq!(table.get(GlyphId(0x0A)), Some(0));
        assert_eq!(table.get(GlyphId(0x0B)), Some(1));
        assert_eq!(table.get(GlyphId(0x0C)), Some(2));
        assert_eq!(table.get(GlyphId(0x09)), None);
        assert_eq!(table.get(GlyphId(0x0D)), None);
    }

    #[test]
    fn format2_ranges() {
        // format=2, nRanges=1, range(10..=20, startCovIndex=5)
        let mut data = vec![0x00, 0x02, 0x00, 0x01];
        data.extend_from_slice(&10u16.to_be_bytes());
        data.extend_from_slice(&20u16.to_be_bytes());
        data.extend_from_slice(&5u16.to_be_bytes());

        let table = CoverageTable::parse(&data).unwrap();
        assert_eq!(table.get(GlyphId(10)), Some(5));
        assert_eq!(table.get(GlyphId(15)), Some(10));
        assert_eq!(table.get(GlyphId(20)), Some(15));
        assert_eq!(table.get(GlyphId(21)), None);
        assert_eq!(table.get(GlyphId(9)), None);
    }

    #[test]
    fn unknown_format_is_none() {
        assert!(CoverageTable::parse(&[0x00, 0x09]).is_none());
    }

}
