//! The shared chained-context matcher (GPOS lookup type 8 / GSUB lookup
//! type 6): like `context`, but a rule also carries backtrack and lookahead
//! arrays that must match for the rule to fire.

use crate::GlyphId;
use crate::parser::{Stream, Offset16, LazyArray16};
use crate::classdef::ClassDefTable;
use crate::coverage::CoverageTable;
use crate::layout::GlyphFilter;
use crate::context::{
    SequenceLookupRecord, SequenceMatch, match_forward, match_backward,
};

#[cfg(feature = "std")]
use std::vec::Vec;

fn glyph_preds(array: LazyArray16<GlyphId>) -> impl Iterator<Item = impl Fn(GlyphId) -> bool> {
    array.into_iter().map(|expected| move |g: GlyphId| g == expected)
}

fn class_preds<'a>(
    array: LazyArray16<'a, crate::classdef::Class>,
    classes: ClassDefTable<'a>,
) -> impl Iterator<Item = impl Fn(GlyphId) -> bool + 'a> {
    array.into_iter().map(move |expected| move |g: GlyphId| classes.get(g) == expected)
}

fn coverage_preds<'a>(
    offsets: impl Iterator<Item = Offset16> + 'a,
    base: &'a [u8],
) -> impl Iterator<Item = impl Fn(GlyphId) -> bool + 'a> {
    offsets.map(move |offset| {
        let table = base.get(offset.to_usize()..).and_then(CoverageTable::parse);
        move |g: GlyphId| table.map(|t| t.contains(g)).unwrap_or(false)
    })
}

/// Tries to match a chained-context (GPOS-8 / GSUB-6) subtable at `pos`.
#[cfg(feature = "std")]
pub(crate) fn match_chain_context(data: &[u8], glyphs: &[GlyphId], pos: usize, filter: &GlyphFilter) -> Option<SequenceMatch> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    match format {
        1 => match_format1(data, &mut s, glyphs, pos, filter),
        2 => match_format2(data, &mut s, glyphs, pos, filter),
        3 => match_format3(data, &mut s, glyphs, pos, filter),
        _ => {
            warn!("unknown ChainedSequenceContext format: {}", format);
            None
        }
    }
}

#[cfg(feature = "std")]
fn match_format1(
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

        let backtrack_count: u16 = r.read()?;
        let backtrack: LazyArray16<GlyphId> = r.read_array(backtrack_count)?;
        let input_count: u16 = r.read()?;
        let input: LazyArray16<GlyphId> = r.read_array(input_count.saturating_sub(1))?;
        let lookahead_count: u16 = r.read()?;
        let lookahead: LazyArray16<GlyphId> = r.read_array(lookahead_count)?;
        let lookup_count: u16 = r.read()?;
        let records: LazyArray16<SequenceLookupRecord> = r.read_array(lookup_count)?;

        if !match_backward(glyphs, pos, filter, glyph_preds(backtrack)) {
            continue;
        }

        let mut positions = Vec::with_capacity(input_count as usize);
        positions.push(pos);
        if !match_forward(glyphs, pos + 1, filter, glyph_preds(input), &mut positions) {
            continue;
        }

        let after_input = positions.last().copied().unwrap_or(pos) + 1;
        if !match_forward(glyphs, after_input, filter, glyph_preds(lookahead), &mut Vec::new()) {
            continue;
        }

        return Some(SequenceMatch { positions, records: records.into_iter().collect() });
    }
    None
}

#[cfg(feature = "std")]
fn match_format2(
    data: &[u8],
    s: &mut Stream,
    glyphs: &[GlyphId],
    pos: usize,
    filter: &GlyphFilter,
) -> Option<SequenceMatch> {
    let coverage_offset: Offset16 = s.read()?;
    let backtrack_class_def_offset: Offset16 = s.read()?;
    let input_class_def_offset: Offset16 = s.read()?;
    let lookahead_class_def_offset: Offset16 = s.read()?;
    let rule_set_offsets: LazyArray16<Offset16> = s.read_array16()?;

    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
    coverage.get(glyphs[pos])?;

    let backtrack_classes = ClassDefTable::parse(data.get(backtrack_class_def_offset.to_usize()..)?)?;
    let input_classes = ClassDefTable::parse(data.get(input_class_def_offset.to_usize()..)?)?;
    let lookahead_classes = ClassDefTable::parse(data.get(lookahead_class_def_offset.to_usize()..)?)?;

    let class0 = input_classes.get(glyphs[pos]);
    let rule_set_data = data.get(rule_set_offsets.get(class0.0)?.to_usize()..)?;
    let mut rs = Stream::new(rule_set_data);
    let rule_offsets: LazyArray16<Offset16> = rs.read_array16()?;

    for rule_offset in rule_offsets {
        let rule_data = rule_set_data.get(rule_offset.to_usize()..)?;
        let mut r = Stream::new(rule_data);

        let backtrack_count: u16 = r.read()?;
        let backtrack: LazyArray16<crate::classdef::Class> = r.read_array(backtrack_count)?;
        let input_count: u16 = r.read()?;
        let input: LazyArray16<crate::classdef::Class> = r.read_array(input_count.saturating_sub(1))?;
        let lookahead_count: u16 = r.read()?;
        let lookahead: LazyArray16<crate::classdef::Class> = r.read_array(lookahead_count)?;
        let lookup_count: u16 = r.read()?;
        let records: LazyArray16<SequenceLookupRecord> = r.read_array(lookup_count)?;

        if !match_backward(glyphs, pos, filter, class_preds(backtrack, backtrack_classes)) {
            continue;
        }

        let mut positions = Vec::with_capacity(input_count as usize);
        positions.push(pos);
        if !match_forward(glyphs, pos + 1, filter, class_preds(input, input_classes), &mut positions) {
            continue;
        }

        let after_input = positions.last().copied().unwrap_or(pos) + 1;
        if !match_forward(glyphs, after_input, filter, class_preds(lookahead, lookahead_classes), &mut Vec::new()) {
            continue;
        }

        return Some(SequenceMatch { positions, records: records.into_iter().collect() });
    }
    None
}

#[cfg(feature = "std")]
fn match_format3(
    data: &[u8],
    s: &mut Stream,
    glyphs: &[GlyphId],
    pos: usize,
    filter: &GlyphFilter,
) -> Option<SequenceMatch> {
    let backtrack_count: u16 = s.read()?;
    let backtrack_offsets: LazyArray16<Offset16> = s.read_array(backtrack_count)?;
    let input_count: u16 = s.read()?;
    let input_offsets: LazyArray16<Offset16> = s.read_array(input_count)?;
    let lookahead_count: u16 = s.read()?;
    let lookahead_offsets: LazyArray16<Offset16> = s.read_array(lookahead_count)?;
    let lookup_count: u16 = s.read()?;
    let records: LazyArray16<SequenceLookupRecord> = s.read_array(lookup_count)?;

    if input_count == 0 {
        return None;
    }

    let first = CoverageTable::parse(data.get(input_offsets.get(0)?.to_usize()..)?)?;
    first.get(glyphs[pos])?;

    if !match_backward(glyphs, pos, filter, coverage_preds(backtrack_offsets.into_iter(), data)) {
        return None;
    }

    let mut positions = Vec::with_capacity(input_count as usize);
    positions.push(pos);
    let tail = input_offsets.into_iter().skip(1);
    if !match_forward(glyphs, pos + 1, filter, coverage_preds(tail, data), &mut positions) {
        return None;
    }

    let after_input = positions.last().copied().unwrap_or(pos) + 1;
    if !match_forward(glyphs, after_input, filter, coverage_preds(lookahead_offsets.into_iter(), data), &mut Vec::new()) {
        return None;
    }

    Some(SequenceMatch { positions, records: records.into_iter().collect() })
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    fn be16(v: u16) -> [u8; 2] { v.to_be_bytes() }

    // OpenType spec §8, scenario 6: backtrack [A], input [B], lookahead [C].
    #[test]
    fn format3_backtrack_input_lookahead() {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&be16(3)); // format
        data.extend_from_slice(&be16(1)); // backtrackGlyphCount
        data.extend_from_slice(&be16(30)); // backtrack coverage offset (A)
        data.extend_from_slice(&be16(1)); // inputGlyphCount
        data.extend_from_slice(&be16(36)); // input coverage offset (B)
        data.extend_from_slice(&be16(1)); // lookaheadGlyphCount
        data.extend_from_slice(&be16(42)); // lookahead coverage offset (C)
        data.extend_from_slice(&be16(1)); // seqLookupCount
        data.extend_from_slice(&be16(0)); // seqIndex
        data.extend_from_slice(&be16(0)); // lookupIndex

        assert_eq!(data.len(), 30);
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x41)); // A

        assert_eq!(data.len(), 36);
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x42)); // B

        assert_eq!(data.len(), 42);
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x43)); // C

        let filter = GlyphFilter::none();

        let glyphs = [GlyphId(0x41), GlyphId(0x42), GlyphId(0x43)];
        let m = match_chain_context(&data, &glyphs, 1, &filter).unwrap();
        assert_eq!(m.positions, std::vec![1]);

        let glyphs_bad_backtrack = [GlyphId(0x99), GlyphId(0x42), GlyphId(0x43)];
        assert!(match_chain_context(&data, &glyphs_bad_backtrack, 1, &filter).is_none());

        let glyphs_bad_lookahead = [GlyphId(0x41), GlyphId(0x42), GlyphId(0x99)];
        assert!(match_chain_context(&data, &glyphs_bad_lookahead, 1, &filter).is_none());
    }
}
