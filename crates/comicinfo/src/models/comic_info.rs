use crate::error::Result;
use crate::models::{AgeRating, Manga, Page, YesNo};
use crate::schema::{Field, fields, lookup};

/// The ComicInfo v2 metadata record.
///
/// Every scalar is optional: `None` means "not present in the document" and
/// is never written back out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComicInfo {
    pub title: Option<String>,
    pub series: Option<String>,
    /// Issue number. Text, because "1.5" and "Annual 2" are both common.
    pub number: Option<String>,
    /// Total number of issues in the series.
    pub count: Option<i32>,
    pub volume: Option<i32>,
    pub alternate_series: Option<String>,
    pub alternate_number: Option<String>,
    pub alternate_count: Option<i32>,
    pub summary: Option<String>,
    pub notes: Option<String>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
    pub writer: Option<String>,
    pub penciller: Option<String>,
    pub inker: Option<String>,
    pub colorist: Option<String>,
    pub letterer: Option<String>,
    pub cover_artist: Option<String>,
    pub editor: Option<String>,
    pub translator: Option<String>,
    pub publisher: Option<String>,
    pub imprint: Option<String>,
    pub genre: Option<String>,
    pub tags: Option<String>,
    pub web: Option<String>,
    pub page_count: Option<i32>,
    pub language_iso: Option<String>,
    pub format: Option<String>,
    pub black_and_white: Option<YesNo>,
    pub manga: Option<Manga>,
    pub characters: Option<String>,
    pub teams: Option<String>,
    pub locations: Option<String>,
    pub scan_information: Option<String>,
    pub story_arc: Option<String>,
    pub story_arc_number: Option<String>,
    pub series_group: Option<String>,
    pub age_rating: Option<AgeRating>,
    pub community_rating: Option<f64>,
    pub main_character_or_team: Option<String>,
    pub review: Option<String>,
    pub gtin: Option<String>,
    /// Per-page records. Written as `<Pages>` only when non-empty.
    pub pages: Vec<Page>,
}

impl ComicInfo {
    /// Element table, in schema order.
    pub const FIELDS: &'static [Field<Self>] = fields!(Self {
        title: String => "Title",
        series: String => "Series",
        number: String => "Number",
        count: i32 => "Count",
        volume: i32 => "Volume",
        alternate_series: String => "AlternateSeries",
        alternate_number: String => "AlternateNumber",
        alternate_count: i32 => "AlternateCount",
        summary: String => "Summary",
        notes: String => "Notes",
        year: i32 => "Year",
        month: i32 => "Month",
        day: i32 => "Day",
        writer: String => "Writer",
        penciller: String => "Penciller",
        inker: String => "Inker",
        colorist: String => "Colorist",
        letterer: String => "Letterer",
        cover_artist: String => "CoverArtist",
        editor: String => "Editor",
        translator: String => "Translator",
        publisher: String => "Publisher",
        imprint: String => "Imprint",
        genre: String => "Genre",
        tags: String => "Tags",
        web: String => "Web",
        page_count: i32 => "PageCount",
        language_iso: String => "LanguageISO",
        format: String => "Format",
        black_and_white: YesNo => "BlackAndWhite",
        manga: Manga => "Manga",
        characters: String => "Characters",
        teams: String => "Teams",
        locations: String => "Locations",
        scan_information: String => "ScanInformation",
        story_arc: String => "StoryArc",
        story_arc_number: String => "StoryArcNumber",
        series_group: String => "SeriesGroup",
        age_rating: AgeRating => "AgeRating",
        community_rating: f64 => "CommunityRating",
        main_character_or_team: String => "MainCharacterOrTeam",
        review: String => "Review",
        gtin: String => "GTIN",
    });

    /// Returns `true` when no scalar is set and there are no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && Self::FIELDS.iter().all(|field| field.get(self).is_none())
    }

    /// Set fields as `(XML name, rendered value)` pairs, in schema order.
    pub fn values(&self) -> impl Iterator<Item = (&'static str, String)> + '_ {
        Self::FIELDS.iter().filter_map(|field| field.get(self).map(|value| (field.element, value)))
    }

    /// Read one field by key (`cover_artist`) or XML name (`CoverArtist`).
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lookup(Self::FIELDS, key)?.get(self))
    }

    /// Parse `value` into the field named `key`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        lookup(Self::FIELDS, key)?.set(self, value)
    }

    /// Unset the field named `key`.
    pub fn clear(&mut self, key: &str) -> Result<()> {
        lookup(Self::FIELDS, key)?.clear(self);
        Ok(())
    }

    /// Overlay every field that is set in `patch`. Pages are replaced only
    /// when the patch carries some.
    pub fn apply(&mut self, patch: &ComicInfo) {
        for field in Self::FIELDS {
            field.copy(patch, self);
        }
        if !patch.pages.is_empty() {
            self.pages = patch.pages.clone();
        }
    }

    /// Copy of this record restricted to the named fields. Unknown names are
    /// rejected so a typo never silently copies nothing.
    pub fn select<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Result<ComicInfo> {
        let mut out = ComicInfo::default();
        for key in keys {
            if key.eq_ignore_ascii_case("pages") {
                out.pages = self.pages.clone();
                continue;
            }
            lookup(Self::FIELDS, key)?.copy(self, &mut out);
        }
        Ok(out)
    }
}
