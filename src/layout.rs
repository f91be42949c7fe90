//! Shared GSUB/GPOS infrastructure: the ScriptList/FeatureList/LookupList
//! triad and the per-lookup flag word that drives glyph skipping during
//! matching.
//!
//! Both tables share byte-for-byte identical headers and list layouts; only
//! the subtable contents differ (decoded in `gpos`/`gsub`).

use core::convert::TryFrom;

use crate::{GlyphId, Tag};
use crate::parser::*;
use crate::classdef::ClassDefTable;

#[derive(Clone, Copy, Debug)]
pub(crate) struct TaggedListRecord {
    tag: Tag,
    offset: Offset16,
}

impl FromData for TaggedListRecord {
    const SIZE: usize = 6;

    #[inline]
    fn parse(data: &[u8]) -> Self {
        let mut s = SafeStream::new(data);
        TaggedListRecord {
            tag: s.read(),
            offset: s.read(),
        }
    }
}

/// A type-safe wrapper for a feature index.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct FeatureIndex(pub u16);

impl FromData for FeatureIndex {
    #[inline]
    fn parse(data: &[u8]) -> Self {
        FeatureIndex(u16::parse(data))
    }
}

/// A type-safe wrapper for a lookup index. Lookup indices are global within
/// their table (GPOS or GSUB).
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct LookupIndex(pub u16);

impl FromData for LookupIndex {
    #[inline]
    fn parse(data: &[u8]) -> Self {
        LookupIndex(u16::parse(data))
    }
}

/// A font script: a tag plus a default language and a set of named
/// languages.
#[derive(Clone, Copy)]
pub struct Script<'a> {
    data: &'a [u8], // from the start of this ScriptTable
    tag: Tag,
    default_lang_offset: Option<Offset16>,
    lang_records: LazyArray16<'a, TaggedListRecord>,
}

impl<'a> Script<'a> {
    /// The script's tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The script's default language system, if any.
    pub fn default_language(&self) -> Option<Language<'a>> {
        let data = self.data.get(self.default_lang_offset?.to_usize()..)?;
        parse_lang_sys(data, Tag::DEFAULT_LANGUAGE)
    }

    /// Iterates the script's named languages (excludes the default).
    pub fn languages(&self) -> Languages<'a> {
        Languages { data: self.data, records: self.lang_records, index: 0 }
    }

    /// Looks up a language by tag using binary search. Falls back to the
    /// default language system when the tag does not match (per §4.3 step 2).
    pub fn language_or_default(&self, tag: Tag) -> Option<Language<'a>> {
        if let Some((_, record)) = self.lang_records.binary_search_by(|r| r.tag.cmp(&tag)) {
            let data = self.data.get(record.offset.to_usize()..)?;
            return parse_lang_sys(data, tag);
        }
        self.default_language()
    }
}

impl core::fmt::Debug for Script<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Script({})", self.tag)
    }
}

/// An iterator over a script's named language systems.
#[derive(Clone, Copy)]
pub struct Languages<'a> {
    data: &'a [u8],
    records: LazyArray16<'a, TaggedListRecord>,
    index: u16,
}

impl<'a> Iterator for Languages<'a> {
    type Item = Language<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.get(self.index)?;
        self.index += 1;
        let data = self.data.get(record.offset.to_usize()..)?;
        parse_lang_sys(data, record.tag)
    }
}

fn parse_lang_sys(data: &[u8], tag: Tag) -> Option<Language> {
    let mut s = Stream::new(data);
    s.skip::<u16>(); // lookupOrder, reserved
    let required_feature_index = match s.read::<u16>()? {
        0xFFFF => None,
        n => Some(FeatureIndex(n)),
    };
    let feature_indices = s.read_array16()?;
    Some(Language { tag, required_feature_index, feature_indices })
}

/// A language system: an optional required feature plus a list of optional
/// feature indices.
#[derive(Clone, Copy, Debug)]
pub struct Language<'a> {
    /// The language tag, or `Tag::DEFAULT_LANGUAGE` for the script's default.
    pub tag: Tag,
    /// The feature that must always be applied for this language, if any.
    pub required_feature_index: Option<FeatureIndex>,
    /// Optional features available under this language.
    pub feature_indices: LazyArray16<'a, FeatureIndex>,
}

/// An iterator over a table's scripts.
#[derive(Clone, Copy, Default)]
pub struct Scripts<'a> {
    data: &'a [u8], // from the start of the ScriptList
    records: LazyArray16<'a, TaggedListRecord>,
    index: u16,
}

impl<'a> Iterator for Scripts<'a> {
    type Item = Script<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.get(self.index)?;
        self.index += 1;
        let data = self.data.get(record.offset.to_usize()..)?;
        let mut s = Stream::new(data);
        let default_lang_offset: Option<Offset16> = s.read()?;
        let lang_records = s.read_array16()?;
        Some(Script { data, tag: record.tag, default_lang_offset, lang_records })
    }
}

impl<'a> Scripts<'a> {
    /// Finds a script by tag, falling back to `DFLT` (per §4.3 step 1).
    pub fn get_or_default(&self, tag: Tag) -> Option<Script<'a>> {
        self.find(tag).or_else(|| self.find(Tag::from_bytes(b"DFLT")))
    }

    fn find(&self, tag: Tag) -> Option<Script<'a>> {
        let (_, record) = self.records.binary_search_by(|r| r.tag.cmp(&tag))?;
        let data = self.data.get(record.offset.to_usize()..)?;
        let mut s = Stream::new(data);
        let default_lang_offset: Option<Offset16> = s.read()?;
        let lang_records = s.read_array16()?;
        Some(Script { data, tag: record.tag, default_lang_offset, lang_records })
    }
}

/// A feature: a tag and the lookups it activates.
#[derive(Clone, Copy, Debug)]
pub struct Feature<'a> {
    /// The feature's tag, e.g. `kern` or `liga`.
    pub tag: Tag,
    /// Lookup indices this feature activates, in the order listed.
    pub lookup_indices: LazyArray16<'a, LookupIndex>,
}

/// An iterator over a table's features.
#[derive(Clone, Copy, Default)]
pub struct Features<'a> {
    data: &'a [u8], // from the start of the FeatureList
    records: LazyArray16<'a, TaggedListRecord>,
    index: u16,
}

impl<'a> Iterator for Features<'a> {
    type Item = Feature<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.get(self.index)?;
        self.index += 1;
        Some(item)
    }
}

impl<'a> Features<'a> {
    fn get(&self, index: u16) -> Option<Feature<'a>> {
        let record = self.records.get(index)?;
        let data = self.data.get(record.offset.to_usize()..)?;
        let mut s = Stream::new(data);
        s.skip::<Offset16>(); // featureParams
        Some(Feature { tag: record.tag, lookup_indices: s.read_array16()? })
    }

    /// Returns the feature at `index` (0-based, as stored in `LangSys`
    /// feature-index lists).
    pub fn at(&self, index: FeatureIndex) -> Option<Feature<'a>> {
        self.get(index.0)
    }
}

/// The per-lookup `u16` flag word (OpenType `LookupFlag`).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct LookupFlag(pub u16);

impl LookupFlag {
    const RIGHT_TO_LEFT: u16 = 0x0001;
    const IGNORE_BASE_GLYPHS: u16 = 0x0002;
    const IGNORE_LIGATURES: u16 = 0x0004;
    const IGNORE_MARKS: u16 = 0x0008;
    const USE_MARK_FILTERING_SET: u16 = 0x0010;
    const MARK_ATTACHMENT_TYPE_MASK: u16 = 0xFF00;

    /// Lookup should process the glyph sequence from right to left.
    #[inline]
    pub fn right_to_left(self) -> bool {
        self.0 & Self::RIGHT_TO_LEFT != 0
    }

    /// Base glyphs (GDEF class 1) should be skipped during matching.
    #[inline]
    pub fn ignore_base_glyphs(self) -> bool {
        self.0 & Self::IGNORE_BASE_GLYPHS != 0
    }

    /// Ligature glyphs (GDEF class 2) should be skipped during matching.
    #[inline]
    pub fn ignore_ligatures(self) -> bool {
        self.0 & Self::IGNORE_LIGATURES != 0
    }

    /// Mark glyphs (GDEF class 3) should be skipped during matching.
    #[inline]
    pub fn ignore_marks(self) -> bool {
        self.0 & Self::IGNORE_MARKS != 0
    }

    /// The lookup's `markFilteringSet` field names a GDEF mark glyph set;
    /// marks outside it should be skipped.
    #[inline]
    pub fn use_mark_filtering_set(self) -> bool {
        self.0 & Self::USE_MARK_FILTERING_SET != 0
    }

    /// If non-zero, only marks with this GDEF mark-attachment class
    /// participate in matching; other marks are skipped.
    #[inline]
    pub fn mark_attachment_type(self) -> u8 {
        ((self.0 & Self::MARK_ATTACHMENT_TYPE_MASK) >> 8) as u8
    }
}

impl FromData for LookupFlag {
    #[inline]
    fn parse(data: &[u8]) -> Self {
        LookupFlag(SafeStream::new(data).read())
    }
}

/// A predicate, bound once per lookup invocation, answering whether a glyph
/// should be skipped during matching.
///
/// Degrades gracefully when no GDEF data is available: only `right_to_left`
/// (which this type does not apply itself — the driver reads it directly)
/// behaves the same either way, and no glyph is skipped.
#[derive(Clone, Copy)]
pub struct GlyphFilter<'a> {
    flag: LookupFlag,
    glyph_class: Option<ClassDefTable<'a>>,
    mark_attach_class: Option<ClassDefTable<'a>>,
    mark_glyph_set: Option<crate::coverage::CoverageTable<'a>>,
}

impl<'a> GlyphFilter<'a> {
    pub(crate) fn new(
        flag: LookupFlag,
        glyph_class: Option<ClassDefTable<'a>>,
        mark_attach_class: Option<ClassDefTable<'a>>,
        mark_glyph_set: Option<crate::coverage::CoverageTable<'a>>,
    ) -> Self {
        GlyphFilter { flag, glyph_class, mark_attach_class, mark_glyph_set }
    }

    /// A filter that skips nothing — used when a lookup has an all-zero flag
    /// or no GDEF table was supplied.
    pub(crate) fn none() -> Self {
        GlyphFilter {
            flag: LookupFlag(0),
            glyph_class: None,
            mark_attach_class: None,
            mark_glyph_set: None,
        }
    }

    /// Whether `glyph_id` should be skipped during matching for this lookup.
    pub fn should_skip(&self, glyph_id: GlyphId) -> bool {
        let class = self.glyph_class.map(|c| c.get(glyph_id).0).unwrap_or(0);

        if self.flag.ignore_base_glyphs() && class == 1 {
            return true;
        }
        if self.flag.ignore_ligatures() && class == 2 {
            return true;
        }
        if self.flag.ignore_marks() && class == 3 {
            return true;
        }

        if class == 3 {
            let mat = self.flag.mark_attachment_type();
            if mat != 0 {
                let mark_class = self.mark_attach_class.map(|c| c.get(glyph_id).0).unwrap_or(0);
                if mark_class != mat as u16 {
                    return true;
                }
            }

            if self.flag.use_mark_filtering_set() {
                if let Some(set) = self.mark_glyph_set {
                    if !set.contains(glyph_id) {
                        return true;
                    }
                }
            }
        }

        false
    }
}

/// A single lookup: its type, its flag word, and its ordered subtables.
#[derive(Clone, Copy)]
pub struct LookupTable<'a> {
    lookup_type: u16,
    lookup_flag: LookupFlag,
    mark_filtering_set: u16,
    subtables: Offsets16<'a>,
}

impl<'a> LookupTable<'a> {
    /// The lookup type; interpretation depends on whether this came from a
    /// GPOS or GSUB table.
    #[inline]
    pub fn lookup_type(&self) -> u16 {
        self.lookup_type
    }

    #[inline]
    pub fn lookup_flag(&self) -> LookupFlag {
        self.lookup_flag
    }

    #[inline]
    pub fn mark_filtering_set(&self) -> u16 {
        self.mark_filtering_set
    }

    /// Iterates the lookup's subtable byte windows in order.
    pub fn subtables(&self) -> impl Iterator<Item = &'a [u8]> {
        self.subtables.into_iter()
    }
}

impl core::fmt::Debug for LookupTable<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("LookupTable")
            .field("lookup_type", &self.lookup_type)
            .field("lookup_flag", &self.lookup_flag)
            .finish()
    }
}

/// An iterator over a table's lookups.
#[derive(Clone, Copy, Default)]
pub struct Lookups<'a> {
    data: &'a [u8], // from the start of the LookupList
    offsets: LazyArray16<'a, Offset16>,
    index: u16,
}

impl<'a> Iterator for Lookups<'a> {
    type Item = LookupTable<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.get(self.index)?;
        self.index += 1;
        Some(item)
    }
}

impl<'a> Lookups<'a> {
    fn get(&self, index: u16) -> Option<LookupTable<'a>> {
        let offset = self.offsets.get(index)?;
        let data = self.data.get(offset.to_usize()..)?;
        let mut s = Stream::new(data);
        let lookup_type: u16 = s.read()?;
        let lookup_flag: LookupFlag = s.read()?;
        let subtables = s.read_offsets16(data)?;
        let mark_filtering_set = if lookup_flag.use_mark_filtering_set() {
            s.read()?
        } else {
            0
        };
        Some(LookupTable { lookup_type, lookup_flag, mark_filtering_set, subtables })
    }

    /// Returns the lookup at the given global lookup index.
    pub fn at(&self, index: LookupIndex) -> Option<LookupTable<'a>> {
        self.get(index.0)
    }

    /// Number of lookups in the table.
    pub fn len(&self) -> u16 {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// The ScriptList/FeatureList/LookupList triad shared by GPOS and GSUB.
#[derive(Clone, Copy, Default)]
pub(crate) struct LayoutTable<'a> {
    pub scripts: Scripts<'a>,
    pub features: Features<'a>,
    pub lookups: Lookups<'a>,
}

impl<'a> LayoutTable<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let version: u32 = s.read()?;
        if version != 0x0001_0000 && version != 0x0001_0001 {
            return None;
        }

        let script_list_offset: Offset16 = s.read()?;
        let feature_list_offset: Offset16 = s.read()?;
        let lookup_list_offset: Offset16 = s.read()?;
        if version == 0x0001_0001 {
            s.skip::<u32>(); // featureVariationsOffset: parsed-past, application deferred
        }

        let scripts = {
            let data = data.get(script_list_offset.to_usize()..)?;
            Scripts { data, records: Stream::new(data).read_array16()?, index: 0 }
        };

        let features = {
            let data = data.get(feature_list_offset.to_usize()..)?;
            Features { data, records: Stream::new(data).read_array16()?, index: 0 }
        };

        let lookups = {
            let data = data.get(lookup_list_offset.to_usize()..)?;
            let mut s = Stream::new(data);
            Lookups { data, offsets: s.read_array16()?, index: 0 }
        };

        Some(LayoutTable { scripts, features, lookups })
    }
}

/// A script/language/feature selection used to resolve which lookups apply.
#[derive(Clone, Copy, Debug)]
pub struct FeatureSet<'a> {
    /// The requested script tag (e.g. `latn`).
    pub script: Tag,
    /// The requested language tag, or `Tag::DEFAULT_LANGUAGE` to use the
    /// script's default language system.
    pub language: Tag,
    /// The feature tags the caller wants enabled (e.g. `kern`, `liga`).
    pub features: &'a [Tag],
}

#[cfg(feature = "std")]
impl<'a> LayoutTable<'a> {
    /// Implements §4.3's resolution algorithm: script (falling back to
    /// `DFLT`) → language (falling back to the script's default) → required
    /// plus enabled optional features → deduplicated, ascending lookup
    /// indices.
    pub fn resolve_lookups(&self, feature_set: &FeatureSet) -> std::vec::Vec<LookupIndex> {
        use std::vec::Vec;

        let script = match self.scripts.get_or_default(feature_set.script) {
            Some(s) => s,
            None => return Vec::new(),
        };

        let language = if feature_set.language == Tag::DEFAULT_LANGUAGE {
            script.default_language()
        } else {
            script.language_or_default(feature_set.language)
        };
        let language = match language {
            Some(l) => l,
            None => return Vec::new(),
        };

        let mut indices: Vec<u16> = Vec::new();

        let mut collect = |feature_index: FeatureIndex| {
            if let Some(feature) = self.features.at(feature_index) {
                indices.extend(feature.lookup_indices.into_iter().map(|l| l.0));
            }
        };

        if let Some(required) = language.required_feature_index {
            collect(required);
        }
        for feature_index in language.feature_indices {
            if let Some(feature) = self.features.at(feature_index) {
                if feature_set.features.contains(&feature.tag) {
                    indices.extend(feature.lookup_indices.into_iter().map(|l| l.0));
                }
            }
        }

        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().map(LookupIndex).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be16(v: u16) -> [u8; 2] { v.to_be_bytes() }

    // One script `latn`, default LangSys with one required feature (index 0)
    // and no optional features. FeatureList has a single `kern` feature
    // pointing at lookup 0. LookupList has a single lookup.
    fn build_table() -> std::vec::Vec<u8> {
        let mut data = std::vec::Vec::new();
        data.extend_from_slice(&0x00010000u32.to_be_bytes()); // version
        data.extend_from_slice(&be16(10)); // scriptList offset
        data.extend_from_slice(&be16(0)); // featureList offset (patched below)
        data.extend_from_slice(&be16(0)); // lookupList offset (patched below)

        let script_list_start = data.len();
        assert_eq!(script_list_start, 10);
        data.extend_from_slice(&be16(1)); // scriptCount
        data.extend_from_slice(b"latn");
        data.extend_from_slice(&be16(8)); // offset from ScriptList start to ScriptTable

        // ScriptTable at script_list_start + 8
        data.extend_from_slice(&be16(4)); // defaultLangSys offset (from ScriptTable start)
        data.extend_from_slice(&be16(0)); // langSysCount

        // LangSys at (script_list_start + 8) + 4
        data.extend_from_slice(&be16(0)); // lookupOrder
        data.extend_from_slice(&be16(0)); // requiredFeatureIndex
        data.extend_from_slice(&be16(0)); // featureIndexCount

        let feature_list_start = data.len();
        data.extend_from_slice(&be16(1)); // featureCount
        data.extend_from_slice(b"kern");
        data.extend_from_slice(&be16(8));

        data.extend_from_slice(&be16(0)); // featureParams
        data.extend_from_slice(&be16(1)); // lookupIndexCount
        data.extend_from_slice(&be16(0)); // lookupListIndex[0]

        let lookup_list_start = data.len();
        data.extend_from_slice(&be16(1)); // lookupCount
        data.extend_from_slice(&be16(4)); // offset to Lookup table

        data.extend_from_slice(&be16(1)); // lookupType
        data.extend_from_slice(&be16(0)); // lookupFlag
        data.extend_from_slice(&be16(1)); // subtableCount
        data.extend_from_slice(&be16(8)); // subtable offset
        data.extend_from_slice(&[0xAB, 0xCD]); // dummy subtable bytes

        let feature_list_offset = (feature_list_start as u16).to_be_bytes();
        data[4] = feature_list_offset[0];
        data[5] = feature_list_offset[1];
        let lookup_list_offset = (lookup_list_start as u16).to_be_bytes();
        data[6] = lookup_list_offset[0];
        data[7] = lookup_list_offset[1];

        data
    }

    #[test]
    fn parse_and_resolve() {
        let data = build_table();
        let table = LayoutTable::parse(&data).unwrap();
        assert_eq!(table.scripts.clone().count(), 1);
        assert_eq!(table.lookups.len(), 1);

        let feature_set = FeatureSet {
            script: Tag::from_bytes(b"latn"),
            language: Tag::DEFAULT_LANGUAGE,
            features: &[],
        };
        let lookups = table.resolve_lookups(&feature_set);
        assert_eq!(lookups, std::vec![LookupIndex(0)]);
    }

    #[test]
    fn unknown_script_falls_back_to_dflt() {
        let data = build_table();
        let table = LayoutTable::parse(&data).unwrap();
        assert!(table.scripts.get_or_default(Tag::from_bytes(b"grek")).is_none());
    }

    #[test]
    fn lookup_flag_bits() {
        let flag = LookupFlag(0x0001 | 0x0008 | 0x0300);
        assert!(flag.right_to_left());
        assert!(flag.ignore_marks());
        assert!(!flag.ignore_base_glyphs());
        assert_eq!(flag.mark_attachment_type(), 3);
    }
}
