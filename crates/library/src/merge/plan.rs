use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::LazyLock;

use exn::OptionExt;
use regex::Regex;
use tankobon_archive::Entry;

use crate::error::{ErrorKind, Result};
use crate::number::{Number, digits};

static RANGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)$").unwrap());
static NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*?)(\d+(?:\.\d+)?)$").unwrap());

/// Suffixes tried on a colliding name that has no number.
const MAX_SUFFIX: usize = 1000;
/// Base names never renumbered on collision: later copies are dropped.
const SINGLETONS: [&str; 2] = ["comicinfo", "cover"];

/// One entry copied into the merged archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRename {
    pub from: String,
    pub to: String,
}

/// The entries taken from one source archive, in copy order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSource {
    pub path: PathBuf,
    pub renames: Vec<MergeRename>,
}

/// Where every merged entry comes from and what it is called afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub sources: Vec<MergeSource>,
}

impl MergePlan {
    /// Number of entries the merged archive will hold.
    pub fn len(&self) -> usize {
        self.sources.iter().map(|source| source.renames.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An entry name split into prefix, numbering and extension.
#[derive(Debug, Clone)]
struct Key {
    prefix: String,
    start: Option<Number>,
    end: Option<Number>,
    ext: String,
}

impl Key {
    fn parse(entry: &Entry) -> Self {
        Self::from_stem(&entry.name[..entry.name.len() - entry.ext.len()], &entry.ext)
    }

    fn from_stem(stem: &str, ext: &str) -> Self {
        let ext = ext.to_string();
        let numbered: Option<(String, Number, Option<Number>)> = RANGE_REGEX
            .captures(stem)
            .and_then(|c| Some((c[1].to_string(), c[2].parse().ok()?, Some(c[3].parse().ok()?))))
            .or_else(|| NUMBER_REGEX.captures(stem).and_then(|c| Some((c[1].to_string(), c[2].parse().ok()?, None))));
        match numbered {
            Some((prefix, start, end)) => Self { prefix, start: Some(start), end, ext },
            None => Self { prefix: stem.to_string(), start: None, end: None, ext },
        }
    }

    /// Lowest and highest number covered, whichever way round a range is
    /// written.
    fn span(&self) -> Option<(Number, Number)> {
        let start = self.start.clone()?;
        let end = self.end.clone().unwrap_or_else(|| start.clone());
        Some(if end < start { (end, start) } else { (start, end) })
    }

    /// Integer part of the highest number covered.
    fn floor(&self) -> Option<u64> {
        self.span().map(|(_, high)| high.int)
    }

    /// Move the key so it starts at `int`, keeping its fraction and range
    /// width.
    fn shift_to(&mut self, int: u64, name: &str) -> Result<()> {
        let Some(start) = &self.start else {
            return Ok(());
        };
        let end = match &self.end {
            Some(end) => {
                let shifted = int.checked_add(end.int.saturating_sub(start.int));
                Some(end.with_int(shifted.ok_or_raise(|| ErrorKind::NumberOverflow(name.to_string()))?))
            },
            None => None,
        };
        self.start = Some(start.with_int(int));
        self.end = end;
        Ok(())
    }

    fn render(&self, width: usize) -> String {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => {
                format!("{}{}-{}{}", self.prefix, start.padded(width), end.padded(width), self.ext)
            },
            (Some(start), None) => format!("{}{}{}", self.prefix, start.padded(width), self.ext),
            _ => format!("{}{}", self.prefix, self.ext),
        }
    }
}

/// Names already taken in the merged archive, ignoring extensions.
///
/// Numbered names are kept as disjoint closed intervals per prefix, so a range
/// costs one slot however many pages it spans.
#[derive(Debug, Default)]
struct Claims {
    plain: HashSet<String>,
    numbered: HashMap<String, BTreeMap<Number, Number>>,
}

impl Claims {
    fn overlaps(&self, key: &Key) -> bool {
        match key.span() {
            Some((low, high)) => self.numbered.get(&key.prefix).is_some_and(|spans| {
                spans.range(..=high).next_back().is_some_and(|(_, end)| *end >= low)
            }),
            // A suffixed name such as `credits0` also stands for page 0 of
            // `credits`.
            None => self.plain.contains(&key.prefix) || Self::numeric_reading(key).is_some_and(|key| self.overlaps(&key)),
        }
    }

    fn insert(&mut self, key: &Key) {
        match key.span() {
            Some((low, high)) => {
                self.numbered.entry(key.prefix.clone()).or_default().insert(low, high);
            },
            None => {
                self.plain.insert(key.prefix.clone());
                if let Some(key) = Self::numeric_reading(key) {
                    self.insert(&key);
                }
            },
        }
    }

    fn numeric_reading(key: &Key) -> Option<Key> {
        Some(Key::from_stem(&key.prefix, &key.ext)).filter(|key| key.start.is_some())
    }
}

/// Decide the merged name of every file entry across `sources`.
///
/// Sources are processed in order and keep their numbering while it is free.
/// A colliding numbered entry moves past the highest number assigned so far,
/// keeping its fraction and range width. A colliding unnumbered entry gets the
/// first free suffix in `0..1000`, except `ComicInfo` and `cover`, which are
/// dropped. Numbers are padded to the width of the highest one.
///
/// # Errors
///
/// [`MergeCollisionExhausted`](ErrorKind::MergeCollisionExhausted) when no
/// suffix is free or two entries would still end up with the same name, and
/// [`NumberOverflow`](ErrorKind::NumberOverflow) when renumbering runs past
/// `u64::MAX`.
pub fn plan_merge(sources: &[(PathBuf, Vec<Entry>)]) -> Result<MergePlan> {
    let mut claims = Claims::default();
    let mut last = 0u64;
    let mut assigned: Vec<(PathBuf, Vec<(String, Key)>)> = Vec::with_capacity(sources.len());

    for (path, entries) in sources {
        let mut keys = Vec::new();
        for entry in entries.iter().filter(|entry| !entry.is_directory) {
            let mut key = Key::parse(entry);
            if claims.overlaps(&key) {
                if SINGLETONS.iter().any(|name| entry.base_name.eq_ignore_ascii_case(name)) {
                    tracing::debug!(source = %path.display(), entry = %entry.name, "Dropping duplicate");
                    continue;
                }
                if key.start.is_some() {
                    let next = last.checked_add(1).ok_or_raise(|| ErrorKind::NumberOverflow(entry.name.clone()))?;
                    key.shift_to(next, &entry.name)?;
                } else {
                    key.prefix = free_suffix(&claims, &key, &entry.name)?;
                }
                tracing::debug!(entry = %entry.name, "Renumbered colliding entry");
            }
            claims.insert(&key);
            let floor = key.floor().or_else(|| Claims::numeric_reading(&key).and_then(|key| key.floor()));
            last = last.max(floor.unwrap_or(0));
            keys.push((entry.name.clone(), key));
        }
        assigned.push((path.clone(), keys));
    }

    let width = digits(last);
    let mut rendered = HashSet::new();
    let mut merged = Vec::with_capacity(assigned.len());
    for (path, keys) in assigned {
        let mut renames = Vec::with_capacity(keys.len());
        for (from, key) in keys {
            let to = key.render(width);
            if !rendered.insert(to.clone()) {
                exn::bail!(ErrorKind::MergeCollisionExhausted(from));
            }
            renames.push(MergeRename { from, to });
        }
        merged.push(MergeSource { path, renames });
    }
    Ok(MergePlan { sources: merged })
}

fn free_suffix(claims: &Claims, key: &Key, name: &str) -> Result<String> {
    (0..MAX_SUFFIX)
        .map(|i| Key { prefix: format!("{}{i}", key.prefix), ..key.clone() })
        .find(|candidate| !claims.overlaps(candidate))
        .map(|candidate| candidate.prefix)
        .ok_or_else(|| exn::Exn::from(ErrorKind::MergeCollisionExhausted(name.to_string())))
}
