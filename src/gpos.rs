//! [Glyph Positioning Table](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos):
//! GPOS lookup-type dispatch and the `position_glyphs` top-level driver.
//!
//! Lookup types 1–2 (Single/Pair) and 7–9 (Context/ChainContext/Extension)
//! mirror GSUB's shared infrastructure; types 3–6 (Cursive and the three
//! Mark-to-* flavours) are this crate's own addition — declared but not
//! implemented in the teacher crate this was grown from — built from the
//! OpenType specification's anchor-table chapter (see `anchor.rs`).

use crate::GlyphId;
use crate::GlyphAdjustment;
use crate::error::{Error, Result};
use crate::parser::{Stream, SafeStream, FromData, Offset, Offset16, LazyArray16};
use crate::coverage::CoverageTable;
use crate::classdef::ClassDefTable;
use crate::anchor::Anchor;
use crate::gdef::GdefTable;
use crate::context::{advance_significant, retreat_significant, match_context};
use crate::chain::match_chain_context;
use crate::layout::{LayoutTable, LookupTable, LookupIndex, Lookups, Scripts, Features, GlyphFilter, FeatureSet};

#[cfg(feature = "std")]
use std::collections::HashMap;
#[cfg(feature = "std")]
use std::vec::Vec;

/// The maximum depth a contextual lookup may recurse into nested lookups
/// before the engine gives up and treats the site as no-match (§5).
pub const MAX_RECURSION_DEPTH: u8 = 64;

/// A parsed [GPOS table](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos).
#[derive(Clone, Copy)]
pub struct GposTable<'a> {
    layout: LayoutTable<'a>,
}

impl<'a> GposTable<'a> {
    /// Parses a GPOS table from a byte window starting at `majorVersion`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        LayoutTable::parse(data).map(|layout| GposTable { layout }).ok_or(Error::Malformed)
    }

    /// The table's scripts.
    pub fn scripts(&self) -> Scripts<'a> {
        self.layout.scripts
    }

    /// The table's features.
    pub fn features(&self) -> Features<'a> {
        self.layout.features
    }

    /// The table's lookups, in lookup-index order.
    pub fn lookups(&self) -> Lookups<'a> {
        self.layout.lookups
    }
}

impl core::fmt::Debug for GposTable<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GposTable()")
    }
}

fn value_record_size(value_format: u16) -> usize {
    (value_format.count_ones() as usize) * 2
}

/// Reads a `ValueRecord`: only the fields selected by `value_format`'s bits
/// are present on the wire, in a fixed order; device-table offsets are
/// consumed but never resolved (outline hinting is out of scope).
fn parse_value_record(s: &mut Stream, value_format: u16) -> Option<GlyphAdjustment> {
    let mut adjustment = GlyphAdjustment::default();
    if value_format & 0x0001 != 0 { adjustment.x_placement = s.read::<i16>()?; }
    if value_format & 0x0002 != 0 { adjustment.y_placement = s.read::<i16>()?; }
    if value_format & 0x0004 != 0 { adjustment.x_advance = s.read::<i16>()?; }
    if value_format & 0x0008 != 0 { adjustment.y_advance = s.read::<i16>()?; }
    if value_format & 0x0010 != 0 { s.skip::<Offset16>(); } // xPlaDevice
    if value_format & 0x0020 != 0 { s.skip::<Offset16>(); } // yPlaDevice
    if value_format & 0x0040 != 0 { s.skip::<Offset16>(); } // xAdvDevice
    if value_format & 0x0080 != 0 { s.skip::<Offset16>(); } // yAdvDevice
    Some(adjustment)
}

// ---- Type 1: Single ----

fn apply_single(data: &[u8], glyphs: &[GlyphId], pos: usize) -> Option<GlyphAdjustment> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    let coverage_offset: Offset16 = s.read()?;
    let value_format: u16 = s.read()?;

    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
    let cov_index = coverage.get(glyphs[pos])?;

    match format {
        1 => parse_value_record(&mut s, value_format),
        2 => {
            let count: u16 = s.read()?;
            if cov_index >= count {
                return None;
            }
            let stride = value_record_size(value_format);
            let start = s.offset() + cov_index as usize * stride;
            let record = data.get(start..start + stride)?;
            parse_value_record(&mut Stream::new(record), value_format)
        }
        _ => {
            warn!("unknown SinglePos table format: {}", format);
            None
        }
    }
}

// ---- Type 2: Pair ----

fn parse_pair_set(
    pair_set_data: &[u8],
    value_format1: u16,
    value_format2: u16,
    second_glyph: GlyphId,
) -> Option<(GlyphAdjustment, Option<GlyphAdjustment>)> {
    let mut s = Stream::new(pair_set_data);
    let count: u16 = s.read()?;
    let stride = 2 + value_record_size(value_format1) + value_record_size(value_format2);
    let records = pair_set_data.get(s.offset()..)?;

    let mut lo: i64 = 0;
    let mut hi: i64 = count as i64 - 1;
    while lo <= hi {
        let mid = (lo + hi) / 2;
        let start = mid as usize * stride;
        let record = records.get(start..start + stride)?;
        let gid = u16::from_be_bytes([record[0], record[1]]);
        if gid == second_glyph.0 {
            let mut rs = Stream::new(&record[2..]);
            let v1 = parse_value_record(&mut rs, value_format1)?;
            let v2 = if value_format2 != 0 { Some(parse_value_record(&mut rs, value_format2)?) } else { None };
            return Some((v1, v2));
        } else if gid < second_glyph.0 {
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }
    None
}

fn parse_class_pair(
    matrix_data: &[u8],
    value_format1: u16,
    value_format2: u16,
    class2_count: u16,
    class1: u16,
    class2: u16,
) -> Option<(GlyphAdjustment, Option<GlyphAdjustment>)> {
    let stride = value_record_size(value_format1) + value_record_size(value_format2);
    let index = (class1 as usize * class2_count as usize + class2 as usize) * stride;
    let record = matrix_data.get(index..index + stride)?;
    let mut rs = Stream::new(record);
    let v1 = parse_value_record(&mut rs, value_format1)?;
    let v2 = if value_format2 != 0 { Some(parse_value_record(&mut rs, value_format2)?) } else { None };
    Some((v1, v2))
}

fn apply_pair(data: &[u8], glyphs: &[GlyphId], pos: usize) -> Option<(GlyphAdjustment, Option<GlyphAdjustment>)> {
    if pos + 1 >= glyphs.len() {
        return None;
    }
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    match format {
        1 => {
            let coverage_offset: Offset16 = s.read()?;
            let value_format1: u16 = s.read()?;
            let value_format2: u16 = s.read()?;
            let pair_set_offsets: LazyArray16<Offset16> = s.read_array16()?;

            let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
            let cov_index = coverage.get(glyphs[pos])?;
            let pair_set_offset = pair_set_offsets.get(cov_index)?;
            let pair_set_data = data.get(pair_set_offset.to_usize()..)?;
            parse_pair_set(pair_set_data, value_format1, value_format2, glyphs[pos + 1])
        }
        2 => {
            let coverage_offset: Offset16 = s.read()?;
            let value_format1: u16 = s.read()?;
            let value_format2: u16 = s.read()?;
            let class_def1_offset: Offset16 = s.read()?;
            let class_def2_offset: Offset16 = s.read()?;
            let class1_count: u16 = s.read()?;
            let class2_count: u16 = s.read()?;

            let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
            coverage.get(glyphs[pos])?;

            let classes1 = ClassDefTable::parse(data.get(class_def1_offset.to_usize()..)?)?;
            let classes2 = ClassDefTable::parse(data.get(class_def2_offset.to_usize()..)?)?;
            let class1 = classes1.get(glyphs[pos]).0;
            let class2 = classes2.get(glyphs[pos + 1]).0;
            if class1 >= class1_count || class2 >= class2_count {
                return None;
            }

            let matrix_data = data.get(s.offset()..)?;
            parse_class_pair(matrix_data, value_format1, value_format2, class2_count, class1, class2)
        }
        _ => {
            warn!("unknown PairPos table format: {}", format);
            None
        }
    }
}

// ---- Types 3–6: Cursive and Mark-to-* (anchor-based) ----

#[derive(Clone, Copy)]
struct EntryExitRecord {
    entry: Option<Offset16>,
    exit: Option<Offset16>,
}

impl FromData for EntryExitRecord {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        EntryExitRecord { entry: s.read(), exit: s.read() }
    }
}

fn apply_cursive(data: &[u8], glyphs: &[GlyphId], pos: usize, filter: &GlyphFilter) -> Option<(usize, GlyphAdjustment)> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown CursivePos table format: {}", format);
        return None;
    }
    let coverage_offset: Offset16 = s.read()?;
    let records: LazyArray16<EntryExitRecord> = s.read_array16()?;
    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;

    let idx1 = coverage.get(glyphs[pos])?;
    let exit_offset = records.get(idx1)?.exit?;

    let next = advance_significant(glyphs, pos + 1, filter)?;
    let idx2 = coverage.get(glyphs[next])?;
    let entry_offset = records.get(idx2)?.entry?;

    let exit = Anchor::parse(data.get(exit_offset.to_usize()..)?)?;
    let entry = Anchor::parse(data.get(entry_offset.to_usize()..)?)?;

    let mut adjustment = GlyphAdjustment::default();
    adjustment.x_placement = exit.x.saturating_sub(entry.x);
    adjustment.y_placement = exit.y.saturating_sub(entry.y);
    Some((next, adjustment))
}

/// Reads the anchor offset at `(row, col)` of a matrix of `row_width` anchor
/// offsets per row, immediately following a `u16` row count already consumed
/// by the caller — the shared shape of `BaseArray`, `Mark2Array`, and a
/// single `LigatureAttach` component row.
fn matrix_anchor_offset(matrix_data: &[u8], row_count: u16, row: u16, row_width: u16, col: u16) -> Option<Offset16> {
    if row >= row_count || col >= row_width {
        return None;
    }
    let header = 2; // the u16 count
    let start = header + (row as usize * row_width as usize + col as usize) * 2;
    let raw: u16 = Stream::read_at(matrix_data, start)?;
    if raw == 0 { None } else { Some(Offset16(raw)) }
}

fn parse_mark_record(mark_array_data: &[u8], mark_index: u16) -> Option<(u16, Offset16)> {
    let mut s = Stream::new(mark_array_data);
    let count: u16 = s.read()?;
    if mark_index >= count {
        return None;
    }
    let start = s.offset() + mark_index as usize * 4;
    let record = mark_array_data.get(start..start + 4)?;
    let mut rs = Stream::new(record);
    let class: u16 = rs.read()?;
    let anchor_offset: Offset16 = rs.read()?;
    Some((class, anchor_offset))
}

fn apply_mark_to_base(data: &[u8], glyphs: &[GlyphId], pos: usize, filter: &GlyphFilter) -> Option<(usize, GlyphAdjustment)> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown MarkBasePos table format: {}", format);
        return None;
    }
    let mark_coverage_offset: Offset16 = s.read()?;
    let base_coverage_offset: Offset16 = s.read()?;
    let mark_class_count: u16 = s.read()?;
    let mark_array_offset: Offset16 = s.read()?;
    let base_array_offset: Offset16 = s.read()?;

    let mark_coverage = CoverageTable::parse(data.get(mark_coverage_offset.to_usize()..)?)?;
    let mark_index = mark_coverage.get(glyphs[pos])?;
    let mark_array_data = data.get(mark_array_offset.to_usize()..)?;
    let (mark_class, mark_anchor_offset) = parse_mark_record(mark_array_data, mark_index)?;
    let mark_anchor = Anchor::parse(mark_array_data.get(mark_anchor_offset.to_usize()..)?)?;

    let base_pos = retreat_significant(glyphs, pos, filter)?;
    let base_coverage = CoverageTable::parse(data.get(base_coverage_offset.to_usize()..)?)?;
    let base_index = base_coverage.get(glyphs[base_pos])?;
    let base_array_data = data.get(base_array_offset.to_usize()..)?;
    let mut bs = Stream::new(base_array_data);
    let base_count: u16 = bs.read()?;
    let anchor_offset = matrix_anchor_offset(base_array_data, base_count, base_index, mark_class_count, mark_class)?;
    let base_anchor = Anchor::parse(base_array_data.get(anchor_offset.to_usize()..)?)?;

    let mut adjustment = GlyphAdjustment::default();
    adjustment.x_placement = base_anchor.x.saturating_sub(mark_anchor.x);
    adjustment.y_placement = base_anchor.y.saturating_sub(mark_anchor.y);
    Some((pos, adjustment))
}

/// Mark-to-ligature always attaches to component 0 of the ligature glyph:
/// correctly resolving the *matched* component would require ligature-index
/// bookkeeping threaded in from GSUB application, out of scope here (see
/// `DESIGN.md`).
fn apply_mark_to_ligature(data: &[u8], glyphs: &[GlyphId], pos: usize, filter: &GlyphFilter) -> Option<(usize, GlyphAdjustment)> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown MarkLigPos table format: {}", format);
        return None;
    }
    let mark_coverage_offset: Offset16 = s.read()?;
    let ligature_coverage_offset: Offset16 = s.read()?;
    let mark_class_count: u16 = s.read()?;
    let mark_array_offset: Offset16 = s.read()?;
    let ligature_array_offset: Offset16 = s.read()?;

    let mark_coverage = CoverageTable::parse(data.get(mark_coverage_offset.to_usize()..)?)?;
    let mark_index = mark_coverage.get(glyphs[pos])?;
    let mark_array_data = data.get(mark_array_offset.to_usize()..)?;
    let (mark_class, mark_anchor_offset) = parse_mark_record(mark_array_data, mark_index)?;
    let mark_anchor = Anchor::parse(mark_array_data.get(mark_anchor_offset.to_usize()..)?)?;

    let lig_pos = retreat_significant(glyphs, pos, filter)?;
    let ligature_coverage = CoverageTable::parse(data.get(ligature_coverage_offset.to_usize()..)?)?;
    let lig_index = ligature_coverage.get(glyphs[lig_pos])?;

    let ligature_array_data = data.get(ligature_array_offset.to_usize()..)?;
    let mut ls = Stream::new(ligature_array_data);
    let ligature_offsets: LazyArray16<Offset16> = ls.read_array16()?;
    let attach_offset = ligature_offsets.get(lig_index)?;
    let attach_data = ligature_array_data.get(attach_offset.to_usize()..)?;

    let mut as_ = Stream::new(attach_data);
    let component_count: u16 = as_.read()?;
    const COMPONENT: u16 = 0;
    let anchor_offset = matrix_anchor_offset(attach_data, component_count, COMPONENT, mark_class_count, mark_class)?;
    let base_anchor = Anchor::parse(attach_data.get(anchor_offset.to_usize()..)?)?;

    let mut adjustment = GlyphAdjustment::default();
    adjustment.x_placement = base_anchor.x.saturating_sub(mark_anchor.x);
    adjustment.y_placement = base_anchor.y.saturating_sub(mark_anchor.y);
    Some((pos, adjustment))
}

fn apply_mark_to_mark(data: &[u8], glyphs: &[GlyphId], pos: usize, filter: &GlyphFilter) -> Option<(usize, GlyphAdjustment)> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown MarkMarkPos table format: {}", format);
        return None;
    }
    let mark1_coverage_offset: Offset16 = s.read()?;
    let mark2_coverage_offset: Offset16 = s.read()?;
    let mark_class_count: u16 = s.read()?;
    let mark1_array_offset: Offset16 = s.read()?;
    let mark2_array_offset: Offset16 = s.read()?;

    let mark1_coverage = CoverageTable::parse(data.get(mark1_coverage_offset.to_usize()..)?)?;
    let mark1_index = mark1_coverage.get(glyphs[pos])?;
    let mark1_array_data = data.get(mark1_array_offset.to_usize()..)?;
    let (mark_class, mark1_anchor_offset) = parse_mark_record(mark1_array_data, mark1_index)?;
    let mark1_anchor = Anchor::parse(mark1_array_data.get(mark1_anchor_offset.to_usize()..)?)?;

    let mark2_pos = retreat_significant(glyphs, pos, filter)?;
    let mark2_coverage = CoverageTable::parse(data.get(mark2_coverage_offset.to_usize()..)?)?;
    let mark2_index = mark2_coverage.get(glyphs[mark2_pos])?;
    let mark2_array_data = data.get(mark2_array_offset.to_usize()..)?;
    let mut m2s = Stream::new(mark2_array_data);
    let mark2_count: u16 = m2s.read()?;
    let anchor_offset = matrix_anchor_offset(mark2_array_data, mark2_count, mark2_index, mark_class_count, mark_class)?;
    let mark2_anchor = Anchor::parse(mark2_array_data.get(anchor_offset.to_usize()..)?)?;

    let mut adjustment = GlyphAdjustment::default();
    adjustment.x_placement = mark2_anchor.x.saturating_sub(mark1_anchor.x);
    adjustment.y_placement = mark2_anchor.y.saturating_sub(mark1_anchor.y);
    Some((pos, adjustment))
}

// ---- Driver ----

#[cfg(feature = "std")]
fn merge_adjustment(result: &mut HashMap<usize, GlyphAdjustment>, pos: usize, adjustment: GlyphAdjustment) {
    result.entry(pos).or_insert_with(GlyphAdjustment::default).accumulate(&adjustment);
}

#[cfg(feature = "std")]
fn build_filter<'a>(lookup: &LookupTable<'a>, gdef: Option<&GdefTable<'a>>) -> GlyphFilter<'a> {
    match gdef {
        Some(gdef) => GlyphFilter::new(
            lookup.lookup_flag(),
            gdef.glyph_class_def(),
            gdef.mark_attach_class_def(),
            if lookup.lookup_flag().use_mark_filtering_set() {
                gdef.mark_glyph_set(lookup.mark_filtering_set())
            } else {
                None
            },
        ),
        None => GlyphFilter::none(),
    }
}

#[cfg(feature = "std")]
fn apply_lookup_at(
    table: &GposTable,
    lookup: &LookupTable,
    glyphs: &[GlyphId],
    pos: usize,
    result: &mut HashMap<usize, GlyphAdjustment>,
    gdef: Option<&GdefTable>,
    depth: u8,
) {
    if depth >= MAX_RECURSION_DEPTH {
        warn!("GPOS recursion depth exceeded at position {}", pos);
        return;
    }

    let filter = build_filter(lookup, gdef);
    let lookup_type = lookup.lookup_type();

    for subtable in lookup.subtables() {
        let (subtable, dispatch_type) = if lookup_type == 9 {
            match resolve_extension(subtable) {
                Some((ext_type, ext_data)) if ext_type != 9 => (ext_data, ext_type),
                _ => continue,
            }
        } else {
            (subtable, lookup_type)
        };

        let matched = match dispatch_type {
            1 => apply_single(subtable, glyphs, pos).map(|adj| {
                merge_adjustment(result, pos, adj);
            }),
            2 => apply_pair(subtable, glyphs, pos).map(|(adj1, adj2)| {
                merge_adjustment(result, pos, adj1);
                if let Some(adj2) = adj2 {
                    merge_adjustment(result, pos + 1, adj2);
                }
            }),
            3 => apply_cursive(subtable, glyphs, pos, &filter).map(|(p, adj)| {
                merge_adjustment(result, p, adj);
            }),
            4 => apply_mark_to_base(subtable, glyphs, pos, &filter).map(|(p, adj)| {
                merge_adjustment(result, p, adj);
            }),
            5 => apply_mark_to_ligature(subtable, glyphs, pos, &filter).map(|(p, adj)| {
                merge_adjustment(result, p, adj);
            }),
            6 => apply_mark_to_mark(subtable, glyphs, pos, &filter).map(|(p, adj)| {
                merge_adjustment(result, p, adj);
            }),
            7 => match_context(subtable, glyphs, pos, &filter).map(|m| {
                apply_nested(table, &m, glyphs, result, gdef, depth);
            }),
            8 => match_chain_context(subtable, glyphs, pos, &filter).map(|m| {
                apply_nested(table, &m, glyphs, result, gdef, depth);
            }),
            _ => {
                warn!("unknown GPOS lookup type: {}", dispatch_type);
                None
            }
        };

        if matched.is_some() {
            return;
        }
    }
}

#[cfg(feature = "std")]
fn apply_nested(
    table: &GposTable,
    m: &crate::context::SequenceMatch,
    glyphs: &[GlyphId],
    result: &mut HashMap<usize, GlyphAdjustment>,
    gdef: Option<&GdefTable>,
    depth: u8,
) {
    for record in &m.records {
        let real_pos = match m.position_for(record) {
            Some(p) => p,
            None => continue,
        };
        if let Some(nested) = table.lookups().at(record.lookup_index) {
            apply_lookup_at(table, &nested, glyphs, real_pos, result, gdef, depth + 1);
        }
    }
}

fn resolve_extension(data: &[u8]) -> Option<(u16, &[u8])> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown ExtensionPos table format: {}", format);
        return None;
    }
    let ext_type: u16 = s.read()?;
    let ext_offset: u32 = s.read()?;
    let ext_data = data.get(ext_offset as usize..)?;
    Some((ext_type, ext_data))
}

/// Computes per-position placement/advance adjustments for `glyphs` under
/// `feature_set`, implementing §4.4's top-level `positionGlyphs` operation.
///
/// `gdef` supplies lookup-flag glyph-class filtering; pass `None` to degrade
/// to "only the flag's own ignore-bits apply, nothing is GDEF-filtered".
#[cfg(feature = "std")]
pub fn position_glyphs(
    table: &GposTable,
    glyphs: &[GlyphId],
    feature_set: &FeatureSet,
    gdef: Option<&GdefTable>,
) -> HashMap<usize, GlyphAdjustment> {
    let mut result = HashMap::new();
    let lookup_indices: Vec<LookupIndex> = table.layout.resolve_lookups(feature_set);

    for lookup_index in lookup_indices {
        let lookup = match table.lookups().at(lookup_index) {
            Some(l) => l,
            None => continue,
        };
        for pos in 0..glyphs.len() {
            apply_lookup_at(table, &lookup, glyphs, pos, &mut result, gdef, 0);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be16(v: u16) -> [u8; 2] { v.to_be_bytes() }
    fn be16i(v: i16) -> [u8; 2] { v.to_be_bytes() }

    // OpenType spec §8, scenario 3: Single format 1, xAdvance-only.
    #[test]
    fn single_format1_x_advance() {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&be16(1)); // format
        data.extend_from_slice(&be16(8)); // coverage offset
        data.extend_from_slice(&be16(0x0004)); // valueFormat: xAdvance
        data.extend_from_slice(&be16i(-16)); // xAdvance value
        // coverage at 8: format1, glyph 0x41
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x41));

        let glyphs = [GlyphId(0x41)];
        let adj = apply_single(&data, &glyphs, 0).unwrap();
        assert_eq!(adj.x_advance, -16);
        assert_eq!(adj.x_placement, 0);
    }

    // OpenType spec §8, scenario 4: Pair format 1, two pairs off glyph A.
    #[test]
    fn pair_format1() {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&be16(1)); // format
        data.extend_from_slice(&be16(10)); // coverage offset
        data.extend_from_slice(&be16(0x0004)); // valueFormat1: xAdvance
        data.extend_from_slice(&be16(0)); // valueFormat2: none
        data.extend_from_slice(&be16(1)); // pairSetCount
        data.extend_from_slice(&be16(16)); // pairSet offset

        // coverage at 10: format1, glyph 0x41
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x41));

        // pairSet at 16: 2 records, sorted by secondGlyph
        data.extend_from_slice(&be16(2));
        data.extend_from_slice(&be16(0x42)); // B
        data.extend_from_slice(&be16i(-50));
        data.extend_from_slice(&be16(0x43)); // C
        data.extend_from_slice(&be16i(-80));

        let glyphs_ab = [GlyphId(0x41), GlyphId(0x42)];
        let (adj, adj2) = apply_pair(&data, &glyphs_ab, 0).unwrap();
        assert_eq!(adj.x_advance, -50);
        assert!(adj2.is_none());

        let glyphs_ac = [GlyphId(0x41), GlyphId(0x43)];
        let (adj, _) = apply_pair(&data, &glyphs_ac, 0).unwrap();
        assert_eq!(adj.x_advance, -80);

        let glyphs_ad = [GlyphId(0x41), GlyphId(0x44)];
        assert!(apply_pair(&data, &glyphs_ad, 0).is_none());
    }
}
