//! The [Class Definition table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table):
//! maps a glyph id to an integer class, with 0 meaning "not listed / default".

use crate::GlyphId;
use crate::parser::{FromData, SafeStream, Stream, LazyArray16};

/// A glyph class, as produced by a `ClassDef` table. Class 0 is the default
/// and is never explicitly stored.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Class(pub u16);

impl FromData for Class {
    #[inline]
    fn parse(data: &[u8]) -> Self {
        Class(SafeStream::new(data).read())
    }
}

#[derive(Clone, Copy, Debug)]
struct ClassRangeRecord {
    start: GlyphId,
    end: GlyphId,
    class: Class,
}

impl ClassRangeRecord {
    #[inline]
    fn contains(&self, glyph_id: GlyphId) -> bool {
        self.start <= glyph_id && glyph_id <= self.end
    }
}

impl FromData for ClassRangeRecord {
    const SIZE: usize = 6;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        ClassRangeRecord {
            start: s.read(),
            end: s.read(),
            class: s.read(),
        }
    }
}

/// A [Class Definition Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table).
#[derive(Clone, Copy, Debug)]
pub(crate) enum ClassDefTable<'a> {
    Format1 { start: GlyphId, classes: LazyArray16<'a, Class> },
    Format2 { ranges: LazyArray16<'a, ClassRangeRecord> },
}

impl<'a> ClassDefTable<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        match format {
            1 => {
                let start: GlyphId = s.read()?;
                Some(ClassDefTable::Format1 { start, classes: s.read_array16()? })
            }
            2 => Some(ClassDefTable::Format2 { ranges: s.read_array16()? }),
            _ => {
                warn!("unknown ClassDef table format: {}", format);
                None
            }
        }
    }

    /// Any glyph not included in the covered ranges belongs to class 0.
    pub fn get(&self, glyph_id: GlyphId) -> Class {
        match self {
            ClassDefTable::Format1 { start, classes } => {
                if glyph_id < *start {
                    return Class(0);
                }
                classes.get(glyph_id.0 - start.0).unwrap_or(Class(0))
            }
            ClassDefTable::Format2 { ranges } => {
                ranges.into_iter()
                    .find(|r| r.contains(glyph_id))
                    .map(|r| r.class)
                    .unwrap_or(Class(0))
            }
        }
    }

    /// Enumerates all explicitly-listed (glyph, class) pairs (class 0 omitted).
    pub fn glyph_classes(&self) -> ClassDefIter<'a> {
        match self {
            ClassDefTable::Format1 { start, classes } => ClassDefIter::Format1 {
                start: *start,
                classes: *classes,
                index: 0,
            },
            ClassDefTable::Format2 { ranges } => ClassDefIter::Format2 {
                ranges: *ranges,
                range_index: 0,
                offset_in_range: 0,
            },
        }
    }
}

/// Iterator over (glyph, class) pairs with class != 0.
pub(crate) enum ClassDefIter<'a> {
    Format1 { start: GlyphId, classes: LazyArray16<'a, Class>, index: u16 },
    Format2 { ranges: LazyArray16<'a, ClassRangeRecord>, range_index: u16, offset_in_range: u16 },
}

impl<'a> Iterator for ClassDefIter<'a> {
    type Item = (GlyphId, Class);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ClassDefIter::Format1 { start, classes, index } => {
                loop {
                    let class = classes.get(*index)?;
                    let gid = GlyphId(start.0 + *index);
                    *index += 1;
                    if class.0 != 0 {
                        return Some((gid, class));
                    }
                }
            }
            ClassDefIter::Format2 { ranges, range_index, offset_in_range } => {
                loop {
                    let record = ranges.get(*range_index)?;
                    let span = record.end.0 - record.start.0 + 1;
                    if *offset_in_range >= span {
                        *range_index += 1;
                        *offset_in_range = 0;
                        continue;
                    }
                    let gid = GlyphId(record.start.0 + *offset_in_range);
                    *offset_in_range += 1;
                    if record.class.0 != 0 {
                        return Some((gid, record.class));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // OpenType spec §8, scenario 2.
    #[test]
    fn format2() {
        let data = [
            0x00, 0x02, 0x00, 0x02,
            0x00, 0x10, 0x00, 0x12, 0x00, 0x01,
            0x00, 0x20, 0x00, 0x20, 0x00, 0x02,
        ];
        let table = ClassDefTable::parse(&data).unwrap();
        assert_eq!(table.get(GlyphId(0x10)), Class(1));
        assert_eq!(table.get(GlyphId(0x11)), Class(1));
        assert_eq!(table.get(GlyphId(0x12)), Class(1));
        assert_eq!(table.get(GlyphId(0x20)), Class(2));
        assert_eq!(table.get(GlyphId(0x21)), Class(0));
    }

    #[test]
    fn format1_out_of_range_is_class_zero() {
        // format=1, startGlyph=10, count=2, classes=[1, 2]
        let data = [0x00, 0x01, 0x00, 0x0A, 0x00, 0x02, 0x00, 0x01, 0x00, 0x02];
        let table = ClassDefTable::parse(&data).unwrap();
        assert_eq!(table.get(GlyphId(9)), Class(0));
        assert_eq!(table.get(GlyphId(10)), Class(1));
        assert_eq!(table.get(GlyphId(11)), Class(2));
        assert_eq!(table.get(GlyphId(12)), Class(0));
    }

    #[test]
    fn enumerate_skips_class_zero() {
        let data = [0x00, 0x01, 0x00, 0x0A, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02];
        let table = ClassDefTable::parse(&data).unwrap();
        let pairs: Vec<_> = table.glyph_classes().collect();
        assert_eq!(pairs, vec![(GlyphId(11), Class(1)), (GlyphId(12), Class(2))]);
    }
}
