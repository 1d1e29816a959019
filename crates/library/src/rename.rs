//! Rename planning.
//!
//! [`plan_renames`] turns an entry list into a parallel list of new names,
//! which [`rename_map`] converts into the map [`Archive::rename_entries`]
//! consumes. An empty new name deletes the entry.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use exn::{OptionExt, ResultExt};
use regex::Regex;
use tankobon_archive::{Archive, Entry, Rename};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::number::{Number, digits};
use crate::rules::Rule;

/// The last `number` or `number-number` token in a base name.
static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)(\d+(?:\.\d+)?)(?:-(\d+(?:\.\d+)?))?(\D*)$").unwrap());
/// Any number, used to pad the ones before the last token.
static DIGITS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Independent toggles applied after the rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameOptions {
    /// Strip surrounding whitespace from base names.
    pub trim: bool,
    /// Make page numbers strictly increasing and pad them to a common width.
    pub numbers: bool,
    /// Drop directory components; directory entries are deleted.
    pub flatten: bool,
}

/// A base name split around its numeric token.
struct Numbered {
    prefix: String,
    start: Number,
    end: Option<Number>,
    suffix: String,
}

impl Numbered {
    fn parse(base: &str) -> Option<Self> {
        let captures = NUMBER_REGEX.captures(base)?;
        Some(Self {
            prefix: captures[1].to_string(),
            start: captures[2].parse().ok()?,
            end: match captures.get(3) {
                Some(end) => Some(end.as_str().parse().ok()?),
                None => None,
            },
            suffix: captures[4].to_string(),
        })
    }

    /// Highest value this token covers.
    fn last(&self) -> &Number {
        self.end.as_ref().unwrap_or(&self.start)
    }

    /// Move the token up to `int`, keeping the range width. `None` when the
    /// range end would not fit in a `u64`.
    fn shift_to(&mut self, int: u64) -> Option<()> {
        if let Some(end) = &mut self.end {
            *end = end.with_int(int.checked_add(end.int.saturating_sub(self.start.int))?);
        }
        self.start = self.start.with_int(int);
        Some(())
    }

    fn render(&self, width: usize) -> String {
        let prefix = DIGITS_REGEX.replace_all(&self.prefix, |captures: &regex::Captures| {
            captures[0].parse::<Number>().map_or_else(|_| captures[0].to_string(), |number| number.padded(width))
        });
        match &self.end {
            Some(end) => format!("{prefix}{}-{}{}", self.start.padded(width), end.padded(width), self.suffix),
            None => format!("{prefix}{}{}", self.start.padded(width), self.suffix),
        }
    }
}

/// Compute the new name of every entry, in entry order.
///
/// Rules rewrite each file's base name in order, then the base name is
/// optionally trimmed and `.jpeg` becomes `.jpg`. With
/// [`numbers`](RenameOptions::numbers), any number not above the previous
/// one is raised to one past it, and every number in the name is padded to
/// the width of the largest. Files whose base name ends up empty are mapped to
/// `""`.
///
/// # Errors
///
/// [`NumberOverflow`](ErrorKind::NumberOverflow) when a number would have to
/// be raised past `u64::MAX`.
pub fn plan_renames(entries: &[Entry], rules: &[Rule], options: RenameOptions) -> Result<Vec<String>> {
    let bases: Vec<Option<String>> = entries
        .iter()
        .map(|entry| {
            if entry.is_directory {
                return None;
            }
            let base = rules.iter().fold(entry.base_name.clone(), |base, rule| rule.apply(&base));
            Some(if options.trim { base.trim().to_string() } else { base })
        })
        .collect();

    let bases = if options.numbers { normalize_numbers(entries, bases)? } else { bases };

    let names = entries
        .iter()
        .zip(bases)
        .map(|(entry, base)| match base {
            None if options.flatten => String::new(),
            None => entry.name.clone(),
            Some(base) if base.is_empty() => String::new(),
            Some(base) => {
                let ext = if entry.ext.eq_ignore_ascii_case(".jpeg") { ".jpg" } else { entry.ext.as_str() };
                match &entry.dir {
                    Some(dir) if !options.flatten => format!("{dir}/{base}{ext}"),
                    _ => format!("{base}{ext}"),
                }
            },
        })
        .collect();
    Ok(names)
}

fn normalize_numbers(entries: &[Entry], bases: Vec<Option<String>>) -> Result<Vec<Option<String>>> {
    let mut parsed: Vec<Option<Numbered>> =
        bases.iter().map(|base| base.as_deref().filter(|base| !base.is_empty()).and_then(Numbered::parse)).collect();

    let mut last: Option<Number> = None;
    for (entry, numbered) in entries.iter().zip(parsed.iter_mut()) {
        let Some(numbered) = numbered else {
            continue;
        };
        if let Some(previous) = &last
            && numbered.start <= *previous
        {
            let next = previous.int.checked_add(1).and_then(|next| numbered.shift_to(next).map(|()| next));
            let next = next.ok_or_raise(|| ErrorKind::NumberOverflow(entry.name.clone()))?;
            tracing::trace!(entry = %entry.name, to = next, "Raising out-of-order number");
        }
        last = Some(numbered.last().clone());
    }
    let width = parsed.iter().flatten().map(|numbered| digits(numbered.last().int)).max().unwrap_or(1);

    let bases = bases
        .into_iter()
        .zip(parsed)
        .map(|(base, numbered)| match numbered {
            Some(numbered) => Some(numbered.render(width)),
            None => base,
        })
        .collect();
    Ok(bases)
}

/// Pair every entry with its planned name.
pub fn rename_map(entries: &[Entry], names: Vec<String>) -> BTreeMap<String, Rename> {
    entries.iter().zip(names).map(|(entry, name)| (entry.name.clone(), Rename::from(name))).collect()
}

/// Plan and apply a rename over `archive`, returning the applied map.
#[instrument(skip(archive, rules), fields(path = %archive.path().display()))]
pub async fn rename(archive: &mut Archive, rules: &[Rule], options: RenameOptions) -> Result<BTreeMap<String, Rename>> {
    let entries = archive.entries().await.or_raise(|| ErrorKind::Archive)?;
    let renames = rename_map(&entries, plan_renames(&entries, rules, options)?);
    archive.rename_entries(&renames).await.or_raise(|| ErrorKind::Archive)?;
    Ok(renames)
}
