//! [Glyph Substitution Table](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub):
//! GSUB lookup-type dispatch and the `substitute_glyphs` top-level driver.
//!
//! Types 1–4 and 7 mirror GPOS's shared infrastructure; type 8 (reverse
//! chaining single substitution) walks its own right-to-left sweep and never
//! recurses, per the OpenType specification.

use crate::GlyphId;
use crate::GlyphLigature;
use crate::error::{Error, Result};
use crate::parser::{Stream, Offset, Offset16, LazyArray16};
use crate::coverage::CoverageTable;
use crate::gdef::GdefTable;
use crate::context::match_context;
use crate::chain::match_chain_context;
use crate::layout::{LayoutTable, LookupTable, LookupIndex, Lookups, Scripts, Features, GlyphFilter, FeatureSet};

#[cfg(feature = "std")]
use std::vec::Vec;

/// A parsed [GSUB table](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub).
#[derive(Clone, Copy)]
pub struct GsubTable<'a> {
    layout: LayoutTable<'a>,
}

impl<'a> GsubTable<'a> {
    /// Parses a GSUB table from a byte window starting at `majorVersion`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        LayoutTable::parse(data).map(|layout| GsubTable { layout }).ok_or(Error::Malformed)
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

impl core::fmt::Debug for GsubTable<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GsubTable()")
    }
}

/// The maximum depth a contextual substitution may recurse into nested
/// lookups before the engine gives up on that site (shares GPOS's bound).
pub use crate::gpos::MAX_RECURSION_DEPTH;

/// A substitution a subtable application produced at some position: replace
/// `consumed` input glyphs with `replacement`.
#[cfg(feature = "std")]
struct Edit {
    consumed: usize,
    replacement: Vec<GlyphId>,
}

// ---- Type 1: Single ----

fn apply_single(data: &[u8], glyphs: &[GlyphId], pos: usize) -> Option<GlyphId> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    let coverage_offset: Offset16 = s.read()?;
    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
    let cov_index = coverage.get(glyphs[pos])?;

    match format {
        1 => {
            let delta: i16 = s.read()?;
            Some(GlyphId((glyphs[pos].0 as i32 + delta as i32) as u16))
        }
        2 => {
            let count: u16 = s.read()?;
            if cov_index >= count {
                return None;
            }
            let substitutes: LazyArray16<GlyphId> = s.read_array(count)?;
            substitutes.get(cov_index)
        }
        _ => {
            warn!("unknown SingleSubst table format: {}", format);
            None
        }
    }
}

// ---- Type 2: Multiple ----

#[cfg(feature = "std")]
fn apply_multiple(data: &[u8], glyphs: &[GlyphId], pos: usize) -> Option<Vec<GlyphId>> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown MultipleSubst table format: {}", format);
        return None;
    }
    let coverage_offset: Offset16 = s.read()?;
    let sequence_offsets: LazyArray16<Offset16> = s.read_array16()?;

    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
    let cov_index = coverage.get(glyphs[pos])?;
    let sequence_data = data.get(sequence_offsets.get(cov_index)?.to_usize()..)?;

    let mut ss = Stream::new(sequence_data);
    let count: u16 = ss.read()?;
    if count == 0 {
        // An empty replacement is spec-forbidden; treat as no match.
        return None;
    }
    let substitutes: LazyArray16<GlyphId> = ss.read_array(count)?;
    Some(substitutes.into_iter().collect())
}

// ---- Type 3: Alternate ----

fn apply_alternate(data: &[u8], glyphs: &[GlyphId], pos: usize, alt_index: u16) -> Option<GlyphId> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown AlternateSubst table format: {}", format);
        return None;
    }
    let coverage_offset: Offset16 = s.read()?;
    let alt_set_offsets: LazyArray16<Offset16> = s.read_array16()?;

    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
    let cov_index = coverage.get(glyphs[pos])?;
    let alt_set_data = data.get(alt_set_offsets.get(cov_index)?.to_usize()..)?;

    let mut as_ = Stream::new(alt_set_data);
    let count: u16 = as_.read()?;
    if alt_index >= count {
        return None;
    }
    let alternates: LazyArray16<GlyphId> = as_.read_array(count)?;
    alternates.get(alt_index)
}

// ---- Type 4: Ligature ----

fn parse_ligature(data: &[u8], first: GlyphId) -> Option<GlyphLigature> {
    let mut s = Stream::new(data);
    let substitute: GlyphId = s.read()?;
    let component_count: u16 = s.read()?;
    // A ligature always covers at least the glyph that triggered the match.
    if component_count == 0 {
        return None;
    }
    let tail_count = component_count - 1;
    let tail: LazyArray16<GlyphId> = s.read_array(tail_count)?;

    // `components[0]` is the triggering glyph; a ligature needing more than
    // `GlyphLigature::CAPACITY` total components is silently skipped (§3).
    if component_count as usize > GlyphLigature::CAPACITY {
        return None;
    }

    let mut components = [GlyphId::default(); GlyphLigature::CAPACITY];
    components[0] = first;
    for (i, g) in tail.into_iter().enumerate() {
        components[i + 1] = g;
    }

    Some(GlyphLigature { components, component_count, substitute })
}

/// Tries each ligature in the set's stored order, filtering skipped glyphs
/// per `filter` between components. The set's order determines priority —
/// conformant fonts store longest-match-first, and this scans linearly and
/// accepts the first full match rather than re-sorting (§4.5).
#[cfg(feature = "std")]
fn apply_ligature(data: &[u8], glyphs: &[GlyphId], pos: usize, filter: &GlyphFilter) -> Option<(usize, GlyphId)> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown LigatureSubst table format: {}", format);
        return None;
    }
    let coverage_offset: Offset16 = s.read()?;
    let lig_set_offsets: LazyArray16<Offset16> = s.read_array16()?;

    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
    let cov_index = coverage.get(glyphs[pos])?;
    let lig_set_data = data.get(lig_set_offsets.get(cov_index)?.to_usize()..)?;

    let mut ls = Stream::new(lig_set_data);
    let lig_offsets: LazyArray16<Offset16> = ls.read_array16()?;

    'ligatures: for lig_offset in lig_offsets {
        let lig_data = lig_set_data.get(lig_offset.to_usize()..)?;
        let ligature = match parse_ligature(lig_data, glyphs[pos]) {
            Some(l) => l,
            None => continue,
        };

        let mut i = pos + 1;
        for &component in &ligature.components[1..ligature.component_count as usize] {
            let next = loop {
                if i >= glyphs.len() {
                    continue 'ligatures;
                }
                if !filter.should_skip(glyphs[i]) {
                    break i;
                }
                i += 1;
            };
            if glyphs[next] != component {
                continue 'ligatures;
            }
            i = next + 1;
        }

        return Some((i - pos, ligature.substitute));
    }
    None
}

// ---- Type 8: Reverse chain single ----

#[cfg(feature = "std")]
fn apply_reverse_chain(data: &[u8], glyphs: &[GlyphId], pos: usize, filter: &GlyphFilter) -> Option<GlyphId> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown ReverseChainSingleSubst table format: {}", format);
        return None;
    }
    let coverage_offset: Offset16 = s.read()?;
    let backtrack_count: u16 = s.read()?;
    let backtrack_offsets: LazyArray16<Offset16> = s.read_array(backtrack_count)?;
    let lookahead_count: u16 = s.read()?;
    let lookahead_offsets: LazyArray16<Offset16> = s.read_array(lookahead_count)?;
    let glyph_count: u16 = s.read()?;
    let substitutes: LazyArray16<GlyphId> = s.read_array(glyph_count)?;

    let coverage = CoverageTable::parse(data.get(coverage_offset.to_usize()..)?)?;
    let cov_index = coverage.get(glyphs[pos])?;

    use crate::context::{match_backward, match_forward};

    let backtrack_preds = backtrack_offsets.into_iter().map(|offset| {
        let table = data.get(offset.to_usize()..).and_then(CoverageTable::parse);
        move |g: GlyphId| table.map(|t| t.contains(g)).unwrap_or(false)
    });
    if !match_backward(glyphs, pos, filter, backtrack_preds) {
        return None;
    }

    let lookahead_preds = lookahead_offsets.into_iter().map(|offset| {
        let table = data.get(offset.to_usize()..).and_then(CoverageTable::parse);
        move |g: GlyphId| table.map(|t| t.contains(g)).unwrap_or(false)
    });
    if !match_forward(glyphs, pos + 1, filter, lookahead_preds, &mut Vec::new()) {
        return None;
    }

    substitutes.get(cov_index)
}

// ---- Driver ----

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

fn resolve_extension(data: &[u8]) -> Option<(u16, &[u8])> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    if format != 1 {
        warn!("unknown ExtensionSubst table format: {}", format);
        return None;
    }
    let ext_type: u16 = s.read()?;
    let ext_offset: u32 = s.read()?;
    let ext_data = data.get(ext_offset as usize..)?;
    Some((ext_type, ext_data))
}

/// Tries one lookup's subtables at `pos`, returning the first edit produced.
/// Types 5/6 (contextual/chained substitution) recurse into nested lookups,
/// re-reading positions from `glyphs` as sub-edits apply so later nested
/// calls see earlier ones' output.
#[cfg(feature = "std")]
fn apply_lookup_at(
    table: &GsubTable,
    lookup: &LookupTable,
    glyphs: &mut Vec<GlyphId>,
    pos: usize,
    gdef: Option<&GdefTable>,
    depth: u8,
) -> Option<Edit> {
    if depth >= MAX_RECURSION_DEPTH {
        warn!("GSUB recursion depth exceeded at position {}", pos);
        return None;
    }

    let filter = build_filter(lookup, gdef);
    let lookup_type = lookup.lookup_type();

    for subtable in lookup.subtables() {
        let (subtable, dispatch_type) = if lookup_type == 7 {
            match resolve_extension(subtable) {
                Some((ext_type, ext_data)) if ext_type != 7 => (ext_data, ext_type),
                _ => continue,
            }
        } else {
            (subtable, lookup_type)
        };

        let edit = match dispatch_type {
            1 => apply_single(subtable, glyphs, pos).map(|g| Edit { consumed: 1, replacement: std::vec![g] }),
            2 => apply_multiple(subtable, glyphs, pos).map(|r| Edit { consumed: 1, replacement: r }),
            3 => apply_alternate(subtable, glyphs, pos, 0).map(|g| Edit { consumed: 1, replacement: std::vec![g] }),
            4 => apply_ligature(subtable, glyphs, pos, &filter).map(|(consumed, g)| Edit { consumed, replacement: std::vec![g] }),
            5 => match_context(subtable, glyphs, pos, &filter)
                .map(|m| apply_nested_context(table, &m, glyphs, gdef, depth)),
            6 => match_chain_context(subtable, glyphs, pos, &filter)
                .map(|m| apply_nested_context(table, &m, glyphs, gdef, depth)),
            8 => apply_reverse_chain(subtable, glyphs, pos, &filter).map(|g| Edit { consumed: 1, replacement: std::vec![g] }),
            _ => {
                warn!("unknown GSUB lookup type: {}", dispatch_type);
                None
            }
        };

        if let Some(edit) = edit {
            return Some(edit);
        }
    }
    None
}

/// Applies every nested lookup the matcher recorded, one position at a time,
/// immediately splicing each sub-edit into `glyphs`; returns a no-op edit
/// covering the match's (possibly now-shifted) span since the mutation
/// already happened in place.
#[cfg(feature = "std")]
fn apply_nested_context(
    table: &GsubTable,
    m: &crate::context::SequenceMatch,
    glyphs: &mut Vec<GlyphId>,
    gdef: Option<&GdefTable>,
    depth: u8,
) -> Edit {
    let start = m.positions[0];
    let mut span = m.span();

    // Apply in ascending sequence-index order so that positions recorded
    // relative to the original match still line up; re-resolve each
    // position against the *current* state of `glyphs` since earlier
    // nested edits in this same loop may have shifted later ones.
    let mut shift: isize = 0;
    for record in &m.records {
        let logical_pos = match m.position_for(record) {
            Some(p) => p,
            None => continue,
        };
        let real_pos = (logical_pos as isize + shift) as usize;
        if real_pos >= glyphs.len() {
            continue;
        }
        if let Some(nested) = table.lookups().at(record.lookup_index) {
            if let Some(edit) = apply_lookup_at(table, &nested, glyphs, real_pos, gdef, depth + 1) {
                let removed = edit.consumed;
                let added = edit.replacement.len();
                glyphs.splice(real_pos..real_pos + removed, edit.replacement);
                shift += added as isize - removed as isize;
            }
        }
    }

    let new_span = (span as isize + shift).max(0) as usize;
    span = new_span;
    Edit { consumed: span, replacement: glyphs[start..start + span].to_vec() }
}

/// Rewrites `glyphs` under `feature_set`, implementing §4.5's top-level
/// `substituteGlyphs` operation: lookups apply in ascending lookup-index
/// order; each lookup sweeps its own pass left-to-right (right-to-left for
/// reverse-chaining single substitution, type 8), never re-applying itself
/// to glyphs it just produced within that same pass.
#[cfg(feature = "std")]
pub fn substitute_glyphs(
    table: &GsubTable,
    glyphs: &[GlyphId],
    feature_set: &FeatureSet,
    gdef: Option<&GdefTable>,
) -> Vec<GlyphId> {
    let mut glyphs: Vec<GlyphId> = glyphs.to_vec();
    let lookup_indices: Vec<LookupIndex> = table.layout.resolve_lookups(feature_set);

    for lookup_index in lookup_indices {
        let lookup = match table.lookups().at(lookup_index) {
            Some(l) => l,
            None => continue,
        };

        if lookup.lookup_type() == 8 {
            let filter = build_filter(&lookup, gdef);
            let mut pos = glyphs.len();
            while pos > 0 {
                pos -= 1;
                for subtable in lookup.subtables() {
                    if let Some(g) = apply_reverse_chain(subtable, &glyphs, pos, &filter) {
                        glyphs[pos] = g;
                        break;
                    }
                }
            }
            continue;
        }

        let mut pos = 0;
        while pos < glyphs.len() {
            match apply_lookup_at(table, &lookup, &mut glyphs, pos, gdef, 0) {
                Some(edit) => {
                    let advance = edit.replacement.len();
                    glyphs.splice(pos..pos + edit.consumed, edit.replacement);
                    pos += advance;
                }
                None => pos += 1,
            }
        }
    }

    glyphs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be16(v: u16) -> [u8; 2] { v.to_be_bytes() }

    // OpenType spec §8, scenario 5: Ligature type 4. Coverage covers gid
    // 0x66 ("f"); one ligature {glyphs=[f,i], substitute=0xFB01}.
    #[test]
    #[cfg(feature = "std")]
    fn ligature_fi() {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&be16(1)); // format
        data.extend_from_slice(&be16(8)); // coverage offset
        data.extend_from_slice(&be16(1)); // ligSetCount
        data.extend_from_slice(&be16(14)); // ligSet offset

        // coverage at 8: format1, glyph 0x66
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x66));

        // ligSet at 14
        assert_eq!(data.len(), 14);
        data.extend_from_slice(&be16(1)); // ligatureCount
        data.extend_from_slice(&be16(4)); // ligature offset (from ligSet start)

        // Ligature at 14 + 4
        data.extend_from_slice(&be16(0xFB01)); // ligatureGlyph
        data.extend_from_slice(&be16(2)); // componentCount
        data.extend_from_slice(&be16(0x69)); // component[1]: 'i'

        let filter = GlyphFilter::none();

        let glyphs_fix = [GlyphId(0x66), GlyphId(0x69), GlyphId(0x78)];
        let (consumed, sub) = apply_ligature(&data, &glyphs_fix, 0, &filter).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(sub, GlyphId(0xFB01));

        let glyphs_fxi = [GlyphId(0x66), GlyphId(0x78), GlyphId(0x69)];
        assert!(apply_ligature(&data, &glyphs_fxi, 0, &filter).is_none());
    }

    #[test]
    fn single_format1_delta() {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&be16(1)); // format
        data.extend_from_slice(&be16(6)); // coverage offset
        data.extend_from_slice(&be16(1)); // deltaGlyphID
        // coverage at 6: format1, glyph 0x41
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0x41));

        let glyphs = [GlyphId(0x41)];
        assert_eq!(apply_single(&data, &glyphs, 0), Some(GlyphId(0x42)));
    }

    #[test]
    fn single_format2_substitute_array() {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&be16(2)); // format
        data.extend_from_slice(&be16(10)); // coverage offset
        data.extend_from_slice(&be16(2)); // glyphCount
        data.extend_from_slice(&be16(0x51)); // substituteGlyphIDs[0], for 0x41
        data.extend_from_slice(&be16(0x52)); // substituteGlyphIDs[1], for 0x43
        // coverage at 10: format1, glyphs 0x41, 0x43 (coverage indices 0, 1)
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(2));
        data.extend_from_slice(&be16(0x41));
        data.extend_from_slice(&be16(0x43));

        assert_eq!(apply_single(&data, &[GlyphId(0x41)], 0), Some(GlyphId(0x51)));
        assert_eq!(apply_single(&data, &[GlyphId(0x43)], 0), Some(GlyphId(0x52)));
        assert_eq!(apply_single(&data, &[GlyphId(0x42)], 0), None);
    }
}
