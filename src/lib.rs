/*!
A zero-allocation OpenType GPOS/GSUB layout engine.

## Scope

This crate parses the [GPOS](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos)
and [GSUB](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub) tables of an
OpenType/TrueType font and applies them to a caller-supplied sequence of glyph IDs:

- [`position_glyphs()`] computes per-position placement/advance adjustments
  (kerning, mark attachment, cursive attachment, contextual positioning).
- [`substitute_glyphs()`] rewrites a glyph sequence (ligatures, alternates,
  contextual and chained-contextual substitution).

Both operate against a resolved [`FeatureSet`] — a script, a language, and the
set of enabled feature tags — produced by walking the ScriptList/FeatureList/
LookupList triad the two tables share (see [`GposTable::scripts()`] /
[`GsubTable::scripts()`] and friends).

Lookup-flag glyph filtering (ignoring base glyphs, ligatures, marks, or all
marks outside a given attachment class or mark-glyph-set) is driven by an
optional [`GdefTable`]: pass `None` and only a lookup's own ignore-bits apply,
with nothing GDEF-filtered.

This crate does not parse glyph outlines, metrics, or any other table outside
GPOS/GSUB/GDEF — it is a layout engine, not a font parser.

## Error handling

Parsing a whole table (`GposTable::parse`, `GsubTable::parse`, `GdefTable::parse`)
returns a `Result` with a small [`Error`] enum, since a malformed top-level
table is a condition callers generally want to report. Everything below that —
subtable parsing, lookup resolution, matching — collapses malformed or
unrecognized data to `None`/no-match; an unknown subtable format inside a
lookup is logged and the next subtable is tried, which matches how real-world
fonts are handled in practice.

## Safety

- The library must not panic. Any panic is considered as a critical bug and should be reported.
- The library forbids unsafe code.
*/

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]

#[cfg(feature = "std")]
#[macro_use]
extern crate std;

#[cfg(feature = "logging")]
macro_rules! warn {
    ($($arg:tt)+) => (
        log::log!(log::Level::Warn, $($arg)+);
    )
}

#[cfg(not(feature = "logging"))]
macro_rules! warn {
    ($($arg:tt)+) => () // do nothing
}

mod anchor;
mod chain;
mod classdef;
mod context;
mod coverage;
mod error;
mod gdef;
mod gpos;
mod gsub;
mod layout;
mod parser;
mod tag;

use parser::{SafeStream, FromData};

pub use error::{Error, Result};
pub use tag::Tag;
pub use classdef::Class;
pub use gdef::{GdefTable, GlyphClass};
pub use layout::{
    FeatureIndex, LookupIndex, Script, Languages, Language, Scripts,
    Feature, Features, LookupFlag, LookupTable, Lookups, FeatureSet,
};
pub use gpos::{GposTable, MAX_RECURSION_DEPTH};
#[cfg(feature = "std")]
pub use gpos::position_glyphs;
pub use gsub::GsubTable;
#[cfg(feature = "std")]
pub use gsub::substitute_glyphs;

/// A type-safe wrapper for a glyph ID.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct GlyphId(pub u16);

impl FromData for GlyphId {
    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        GlyphId(s.read())
    }
}

impl Default for GlyphId {
    fn default() -> Self {
        GlyphId(0)
    }
}

/// A single glyph's placement and advance adjustment, in font design units.
///
/// Adjustments from multiple lookups (and both halves of a pair positioning
/// record) accumulate additively via [`GlyphAdjustment::accumulate()`], using
/// saturating arithmetic so a pathological font cannot make the engine panic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub struct GlyphAdjustment {
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
}

impl GlyphAdjustment {
    /// Adds `other`'s fields into `self`, saturating on overflow.
    pub fn accumulate(&mut self, other: &GlyphAdjustment) {
        self.x_placement = self.x_placement.saturating_add(other.x_placement);
        self.y_placement = self.y_placement.saturating_add(other.y_placement);
        self.x_advance = self.x_advance.saturating_add(other.x_advance);
        self.y_advance = self.y_advance.saturating_add(other.y_advance);
    }
}

/// A decoded GSUB ligature: one or more tail components (the first component
/// is implied by the coverage table that found this ligature set) plus the
/// glyph that replaces the whole sequence.
///
/// Ligatures with more than [`GlyphLigature::CAPACITY`] components are
/// silently skipped during parsing, matching real-world font practice of
/// never producing ligatures anywhere near that large.
#[derive(Clone, Copy, Debug)]
pub struct GlyphLigature {
    /// Component glyph IDs, `components[0]` is the glyph that triggered the
    /// match; only the first `component_count` entries are meaningful.
    pub components: [GlyphId; GlyphLigature::CAPACITY],
    /// Number of meaningful entries in `components`.
    pub component_count: u16,
    /// The glyph that replaces the whole matched sequence.
    pub substitute: GlyphId,
}

impl GlyphLigature {
    /// The fixed capacity of [`GlyphLigature::components`].
    pub const CAPACITY: usize = 8;
}
