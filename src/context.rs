//! The shared contextual matcher (GPOS lookup type 7 / GSUB lookup type 5).
//!
//! All three subformats resolve to the same result: how many glyphs (counting
//! skipped ones in between) the match spans, which array positions the
//! matched input glyphs actually live at (skipped glyphs shift the mapping
//! from a rule's logical sequence index to a real array index), and which
//! nested lookups to invoke at which of those positions.

use crate::GlyphId;
use crate::parser::{Stream, FromData, SafeStream, Offset16, LazyArray16};
use crate::classdef::ClassDefTable;
use crate::coverage::CoverageTable;
use crate::layout::{GlyphFilter, LookupIndex};

#[cfg(feature = "std")]
use std::vec::Vec;

/// One `(sequenceIndex, lookupIndex)` pair from a matched rule.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SequenceLookupRecord {
    pub sequence_index: u16,
    pub lookup_index: LookupIndex,
}

impl FromData for SequenceLookupRecord {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        SequenceLookupRecord {
            sequence_index: s.read(),
            lookup_index: s.read(),
        }
    }
}

/// The result of a successful contextual or chained-context match.
#[cfg(feature = "std")]
pub(crate) struct SequenceMatch {
    /// Real glyph-array positions of each matched input glyph, in order.
    /// `positions[0]` is always the lookup's trigger position.
    pub positions: Vec<usize>,
    pub records: Vec<SequenceLookupRecord>,
}

#[cfg(feature = "std")]
impl SequenceMatch {
    /// Number of glyph-array slots this match spans, including any glyphs
    /// skipped by the lookup flag in between matched positions.
    pub fn span(&self) -> usize {
        self.positions.last().copied().unwrap_or(0) + 1 - self.positions[0]
    }

    /// Resolves a record's logical sequence index into a real glyph-array
    /// position.
    pub fn position_for(&self, record: &SequenceLookupRecord) -> Option<usize> {
        self.positions.get(record.sequence_index as usize).copied()
    }
}

/// Advances from `i` to the next glyph not skipped by `filter`.
pub(crate) fn advance_significant(glyphs: &[GlyphId], mut i: usize, filter: &GlyphFilter) -> Option<usize> {
    while i < glyphs.len() {
        if !filter.should_skip(glyphs[i]) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Retreats from just-before `i` to the previous glyph not skipped by
/// `filter`. `i` is exclusive (the search starts at `i - 1`).
pub(crate) fn retreat_significant(glyphs: &[GlyphId], mut i: usize, filter: &GlyphFilter) -> Option<usize> {
    while i > 0 {
        i -= 1;
        if !filter.should_skip(glyphs[i]) {
            return Some(i);
        }
    }
    None
}

/// Matches a forward sequence of per-position predicates starting at `start`,
/// skipping glyphs per `filter`, appending each matched real position to
/// `positions`.
#[cfg(feature = "std")]
pub(crate) fn match_forward<F, I>(
    glyphs: &[GlyphId],
    start: usize,
    filter: &GlyphFilter,
    preds: I,
    positions: &mut Vec<usize>,
) -> bool
where
    I: IntoIterator<Item = F>,
    F: Fn(GlyphId) -> bool,
{
    let mut i = start;
    for pred in preds {
        let p = match advance_significant(glyphs, i, filter) {
            Some(p) => p,
            None => return false,
        };
        if !pred(glyphs[p]) {
            return false;
        }
        positions.push(p);
        i = p + 1;
    }
    true
}

/// Matches a backward sequence of per-position predicates, searching
/// strictly before `start`. Used for backtrack arrays, which are stored in
/// reversed order (nearest glyph first).
#[cfg(feature = "std")]
pub(crate) fn match_backward<F, I>(
    glyphs: &[GlyphId],
    start: usize,
    filter: &GlyphFilter,
    preds: I,
) -> bool
where
    I: IntoIterator<Item = F>,
    F: Fn(GlyphId) -> bool,
{
    let mut i = start;
    for pred in preds {
        let p = match retreat_significant(glyphs, i, filter) {
            Some(p) => p,
            None => return false,
        };
        if !pred(glyphs[p]) {
            return false;
        }
        i = p;
    }
    true
}

#[cfg(feature = "std")]
fn glyph_predicates(array: LazyArray16<GlyphId>) -> impl Iterator<Item = impl Fn(GlyphId) -> bool> {
    array.into_iter().map(|expected| move |g: GlyphId| g == expected)
}

#[cfg(feature = "std")]
fn class_predicates<'a>(
    array: LazyArray16<'a, crate::classdef::Class>,
    classes: ClassDefTable<'a>,
) -> impl Iterator<Item = impl Fn(GlyphId) -> bool + 'a> {
    array.into_iter().map(move |expected| move |g: GlyphId| classes.get(g) == expected)
}

#[cfg(feature = "std")]
fn coverage_predicates<'a>(
    offsets: LazyArray16<'a, Offset16>,
    base: &'a [u8],
) -> impl Iterator<Item = impl Fn(GlyphId) -> bool + 'a> {
    offsets.into_iter().map(move |offset| {
        let table = base.get(offset.to_usize()..).and_then(CoverageTable::parse);
        move |g: GlyphId| table.map(|t| t.contains(g)).unwrap_or(false)
    })
}

/// Tries to match a contextual (GPOS-7 / GSUB-5) subtable at `pos`.
#[cfg(feature = "std")]
pub(crate) fn match_context(data: &[u8], glyphs: &[GlyphId], pos: usize, filter: &GlyphFilter) -> Option<SequenceMatch> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    match format {
        1 => match_context_format1(data, &mut s, glyphs, pos, filter),
        2 => match_context_format2(data, &mut s, glyphs, pos, filter),
        3 => match_context_format3(data, &mut s, glyphs, pos, filter),
        _ => {
            warn!("unknown SequenceContext format: {}", format);
            None
        }
    }
}

#[cfg(feature = "std")]
fn match_context_format1(
    data: &[u8],
    s: &mut Stream,
    glyphs: &[GlyphId],
    pos: usize,
    filter: &GlyphFilter,
) -> Option<SequenceMatch> {
    let coverage_offset: Offset16 = s.read()?;
    let rule_set_offsets: LazyArray16<Offset16> = s.read_array16()?;

    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
    let cov_index = coverage.get(glyphs[pos])?;
    let rule_set_data = data.get(rule_set_offsets.get(cov_index)?.to_usize()..)?;

    let mut rs = Stream::new(rule_set_data);
    let rule_offsets: LazyArray16<Offset16> = rs.read_array16()?;
    for rule_offset in rule_offsets {
        let rule_data = rule_set_data.get(rule_offset.to_usize()..)?;
        let mut r = Stream::new(rule_data);
        let glyph_count: u16 = r.read()?;
        let lookup_count: u16 = r.read()?;
        let input: LazyArray16<GlyphId> = r.read_array(glyph_count.saturating_sub(1))?;
        let records: LazyArray16<SequenceLookupRecord> = r.read_array(lookup_count)?;

        let mut positions = Vec::with_capacity(glyph_count as usize);
        positions.push(pos);
        if match_forward(glyphs, pos + 1, filter, glyph_predicates(input), &mut positions) {
            return Some(SequenceMatch { positions, records: records.into_iter().collect() });
        }
    }
    None
}

#[cfg(feature = "std")]
fn match_context_format2(
    data: &[u8],
    s: &mut Stream,
    glyphs: &[GlyphId],
    pos: usize,
    filter: &GlyphFilter,
) -> Option<SequenceMatch> {
    let coverage_offset: Offset16 = s.read()?;
    let class_def_offset: Offset16 = s.read()?;
    let rule_set_offsets: LazyArray16<Offset16> = s.read_array16()?;

    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
    coverage.get(glyphs[pos])?;
    let classes = ClassDefTable::parse(data.get(class_def_offset.to_usize()..)?)?;
    let class0 = classes.get(glyphs[pos]);

    let rule_set_data = data.get(rule_set_offsets.get(class0.0)?.to_usize()..)?;
    let mut rs = Stream::new(rule_set_data);
    let rule_offsets: LazyArray16<Offset16> = rs.read_array16()?;
    for rule_offset in rule_offsets {
        let rule_data = rule_set_data.get(rule_offset.to_usize()..)?;
        let mut r = Stream::new(rule_data);
        let glyph_count: u16 = r.read()?;
        let lookup_count: u16 = r.read()?;
        let input: LazyArray16<crate::classdef::Class> = r.read_array(glyph_count.saturating_sub(1))?;
        let records: LazyArray16<SequenceLookupRecord> = r.read_array(lookup_count)?;

        let mut positions = Vec::with_capacity(glyph_count as usize);
        positions.push(pos);
        if match_forward(glyphs, pos + 1, filter, class_predicates(input, classes), &mut positions) {
            return Some(SequenceMatch { positions, records: records.into_iter().collect() });
        }
    }
    None
}

#[cfg(feature = "std")]
fn match_context_format3(
    data: &[u8],
    s: &mut Stream,
    glyphs: &[GlyphId],
    pos: usize,
    filter: &GlyphFilter,
) -> Option<SequenceMatch> {
    let input_count: u16 = s.read()?;
    let lookup_count: u16 = s.read()?;
    let coverage_offsets: LazyArray16<Offset16> = s.read_array(input_count)?;
    let records: LazyArray16<SequenceLookupRecord> = s.read_array(lookup_count)?;

    if input_count == 0 {
        return None;
    }

    let first = CoverageTable::parse(data.get(coverage_offsets.get(0)?.to_usize()..)?)?;
    first.get(glyphs[pos])?;

    let mut positions = Vec::with_capacity(input_count as usize);
    positions.push(pos);
    let tail_offsets = coverage_offsets.into_iter().skip(1);
    if match_forward(glyphs, pos + 1, filter, coverage_predicates_iter(tail_offsets, data), &mut positions) {
        return Some(SequenceMatch { positions, records: records.into_iter().collect() });
    }
    None
}

#[cfg(feature = "std")]
fn coverage_predicates_iter<'a>(
    offsets: impl Iterator<Item = Offset16> + 'a,
    base: &'a [u8],
) -> impl Iterator<Item = impl Fn(GlyphId) -> bool + 'a> {
    offsets.map(move |offset| {
        let table = base.get(offset.to_usize()..).and_then(CoverageTable::parse);
        move |g: GlyphId| table.map(|t| t.contains(g)).unwrap_or(false)
    })
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::layout::LookupFlag;

    fn be16(v: u16) -> [u8; 2] { v.to_be_bytes() }

    // Format 3: input = [cov(A), cov(B)], one lookup record at seqIndex 0.
    #[test]
    fn format3_matches_literal_coverage_array() {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&be16(3)); // format
        data.extend_from_slice(&be16(2)); // inputCount
        data.extend_from_slice(&be16(1)); // lookupRecordCount
        data.extend_from_slice(&be16(10)); // coverage offset 0
        data.extend_from_slice(&be16(16)); // coverage offset 1
        data.extend_from_slice(&be16(0)); // seqIndex
        data.extend_from_slice(&be16(0)); // lookupIndex

        // Coverage at 10: format1, glyph 0x41
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x41));
        // Coverage at 16: format1, glyph 0x42
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x42));

        let glyphs = [GlyphId(0x41), GlyphId(0x42)];
        let filter = GlyphFilter::none();
        let m = match_context(&data, &glyphs, 0, &filter).unwrap();
        assert_eq!(m.positions, std::vec![0, 1]);
        assert_eq!(m.span(), 2);
        assert_eq!(m.records[0].sequence_index, 0);
    }

    #[test]
    fn filter_skips_marks_when_matching() {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&be16(3));
        data.extend_from_slice(&be16(2));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(10));
        data.extend_from_slice(&be16(16));
        data.extend_from_slice(&be16(0));
        data.extend_from_slice(&be16(0));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x41));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x42));

        // A mark glyph (0x99) sits between A and B. GDEF marks it class 3;
        // without any ignore flag it still counts as a real input glyph and
        // breaks the literal A-then-B match.
        let mut gdef_classes = std::vec::Vec::new();
        gdef_classes.extend_from_slice(&be16(1)); // ClassDef format 1
        gdef_classes.extend_from_slice(&be16(0x99)); // startGlyph
        gdef_classes.extend_from_slice(&be16(1)); // glyphCount
        gdef_classes.extend_from_slice(&be16(3)); // class 3 (Mark)
        let glyph_class = ClassDefTable::parse(&gdef_classes).unwrap();

        let glyphs = [GlyphId(0x41), GlyphId(0x99), GlyphId(0x42)];

        let filter = GlyphFilter::none();
        assert!(match_context(&data, &glyphs, 0, &filter).is_none());

        let filter = GlyphFilter::new(LookupFlag(0x0008 /* IGNORE_MARKS */), Some(glyph_class), None, None);
        let m = match_context(&data, &glyphs, 0, &filter).unwrap();
        assert_eq!(m.positions, std::vec![0, 2]);
    }
}
