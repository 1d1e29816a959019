//! Subcommand implementations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use exn::{OptionExt, ResultExt};
use tankobon_archive::{Archive, CancellationToken, Context, Image, JoinPair, SplitPlan};
use tankobon_comicinfo::ComicInfo;
use tankobon_config::{Config, RenameConfig};
use tankobon_imaging::Color;
use tankobon_library::{RenameOptions, Rule, parse_rules};
use tankobon_storage::BackendHandle;
use tankobon_storage::backend::{LocalBackend, ReadOnlyBackend};

use crate::cli::{Command, RenameArgs};
use crate::error::{ErrorKind, Result};

/// Everything a subcommand needs.
pub struct Runner {
    ctx: Context,
    config: Config,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self> {
        let local = LocalBackend::new("local", &config.root).or_raise(|| ErrorKind::Storage)?;
        let backend: BackendHandle = if config.dry_run {
            tracing::info!("Dry run: no files will be written");
            Arc::new(ReadOnlyBackend::new(Arc::new(local)))
        } else {
            Arc::new(local)
        };
        let ctx = Context::new(backend).with_encode_options(config.encode.options());
        Ok(Self { ctx, config, cancel })
    }

    fn open(&self, path: &Path) -> Archive {
        self.ctx.open(path).with_cancellation(self.cancel.clone())
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Entries { archive } => {
                for entry in self.open(&archive).entries().await.or_raise(|| ErrorKind::Archive)? {
                    let mime = entry.mime.unwrap_or("-");
                    println!("{}\t{}", mime, entry.name);
                }
            },
            Command::Info { archive, fields } => {
                let info = self.open(&archive).metadata().await.or_raise(|| ErrorKind::Archive)?;
                let info = if fields.is_empty() {
                    info
                } else {
                    info.select(fields.iter().map(String::as_str)).or_raise(|| ErrorKind::InvalidArgument(fields.join(",")))?
                };
                print_info(&info);
            },
            Command::Set { archive, values, clear } => self.set(&archive, &values, &clear).await?,
            Command::Cover { archive, output } => {
                let cover = self.open(&archive).cover().await.or_raise(|| ErrorKind::Archive)?;
                let cover = cover.ok_or_raise(|| ErrorKind::NoImage("cover".to_string()))?;
                save(cover, output).await?;
            },
            Command::SetCover { archive, entry } => {
                self.open(&archive).set_cover(&entry).await.or_raise(|| ErrorKind::Archive)?;
            },
            Command::Image { archive, entry, output } => {
                let image = self.open(&archive).image(&entry).await.or_raise(|| ErrorKind::Archive)?;
                save(image.ok_or_raise(|| ErrorKind::NoImage(entry))?, output).await?;
            },
            Command::Flatten { archive } => self.open(&archive).flatten().await.or_raise(|| ErrorKind::Archive)?,
            Command::StripExif { archive } => self.open(&archive).remove_exif().await.or_raise(|| ErrorKind::Archive)?,
            Command::Rename { archive, options } => self.rename(&archive, options).await?,
            Command::Merge { destination, sources } => {
                let plan = tankobon_library::merge(&self.ctx, &sources, &destination, self.cancel.clone())
                    .await
                    .or_raise(|| ErrorKind::Library)?;
                for source in &plan.sources {
                    for rename in &source.renames {
                        println!("{}:{}\t{}", source.path.display(), rename.from, rename.to);
                    }
                }
            },
            Command::Split { archive, parts } => {
                let plans: Vec<SplitPlan> =
                    parts.into_iter().map(|(destination, entries)| SplitPlan::new(destination, entries)).collect();
                self.open(&archive).split(&plans).await.or_raise(|| ErrorKind::Archive)?;
            },
            Command::Join { archive, pairs, gap, color } => {
                let gap = gap.unwrap_or(self.config.join.gap);
                let color = match color {
                    Some(color) => color.parse::<Color>().or_raise(|| ErrorKind::InvalidArgument(color.clone()))?,
                    None => self.config.join.color().or_raise(|| ErrorKind::Config)?,
                };
                let pairs: Vec<JoinPair> = pairs.into_iter().map(|(left, right)| JoinPair::new(left, right)).collect();
                self.open(&archive).combine_images(&pairs, gap, color).await.or_raise(|| ErrorKind::Archive)?;
            },
            Command::Pages { archive } => {
                let info = tankobon_library::sync_pages(&mut self.open(&archive)).await.or_raise(|| ErrorKind::Library)?;
                println!("{} pages", info.pages.len());
            },
        }
        Ok(())
    }

    async fn set(&self, archive: &Path, values: &[(String, String)], clear: &[String]) -> Result<()> {
        let mut archive = self.open(archive);
        if !values.is_empty() {
            let mut patch = ComicInfo::default();
            for (key, value) in values {
                patch.set(key, value).or_raise(|| ErrorKind::InvalidArgument(format!("{key}={value}")))?;
            }
            tankobon_library::patch_metadata(&mut archive, &patch).await.or_raise(|| ErrorKind::Library)?;
        }
        if !clear.is_empty() {
            let mut info = archive.metadata().await.or_raise(|| ErrorKind::Archive)?;
            for key in clear {
                info.clear(key).or_raise(|| ErrorKind::InvalidArgument(key.clone()))?;
            }
            archive.set_metadata(&info).await.or_raise(|| ErrorKind::Archive)?;
        }
        Ok(())
    }

    async fn rename(&self, archive: &Path, args: RenameArgs) -> Result<()> {
        let (rules, options) = rename_settings(&args, &self.config.rename)?;
        let renames = tankobon_library::rename::rename(&mut self.open(archive), &rules, options)
            .await
            .or_raise(|| ErrorKind::Library)?;
        print_renames(&renames);
        Ok(())
    }
}

/// Command-line rules replace the configured ones; each toggle is on when
/// either side turns it on.
fn rename_settings(args: &RenameArgs, defaults: &RenameConfig) -> Result<(Vec<Rule>, RenameOptions)> {
    let rules = if args.rules.is_empty() { &defaults.rules } else { &args.rules };
    let rules = parse_rules(rules).or_raise(|| ErrorKind::InvalidArgument("rename rule".to_string()))?;
    let options = RenameOptions {
        trim: args.trim || defaults.trim,
        numbers: args.numbers || defaults.numbers,
        flatten: args.flatten || defaults.flatten,
    };
    Ok((rules, options))
}

fn print_info(info: &ComicInfo) {
    for (element, value) in info.values() {
        println!("{element}: {value}");
    }
    for page in &info.pages {
        let image = page.image.map_or_else(|| "?".to_string(), |image| image.to_string());
        let page_type = page.page_type.map_or("", |page_type| page_type.as_str());
        println!("Page {image}: {page_type}");
    }
}

fn print_renames(renames: &BTreeMap<String, tankobon_archive::Rename>) {
    for (from, to) in renames {
        match to {
            tankobon_archive::Rename::To(to) if to == from => {},
            tankobon_archive::Rename::To(to) => println!("{from} -> {to}"),
            tankobon_archive::Rename::Delete => println!("{from} (deleted)"),
        }
    }
}

/// Write an extracted image, named after its entry unless `output` is given.
async fn save(image: Image, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| {
        PathBuf::from(image.name.rsplit('/').next().unwrap_or(image.name.as_str()))
    });
    tokio::fs::write(&output, &image.data).await.or_raise(|| ErrorKind::Output(output.clone()))?;
    tracing::info!(path = %output.display(), mime = image.mime, size = image.data.len(), "Saved image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankobon_archive::format::{ArchiveFormat, ZipFormat};

    const ARCHIVE: &str = "Saga 001.cbz";

    fn container(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipFormat.create();
        for (name, data) in files {
            if name.ends_with('/') {
                writer.add_directory(name).unwrap();
            } else {
                writer.add_file(name, data.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap()
    }

    fn runner(root: &Path, dry_run: bool, rename: RenameConfig) -> Runner {
        let config = Config { root: root.to_path_buf(), dry_run, rename, ..Config::default() };
        Runner::new(config, CancellationToken::new()).unwrap()
    }

    async fn entry_names(runner: &Runner) -> Vec<String> {
        let entries = runner.open(Path::new(ARCHIVE)).entries().await.unwrap();
        entries.into_iter().map(|entry| entry.name).collect()
    }

    #[tokio::test]
    async fn dry_run_leaves_the_archive_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(ARCHIVE);
        let data = container(&[("Saga/", ""), ("Saga/p1.jpg", "1"), ("Saga/p2.jpg", "2")]);
        std::fs::write(&path, &data).unwrap();

        let runner = runner(temp_dir.path(), true, RenameConfig::default());
        runner.run(Command::Flatten { archive: PathBuf::from(ARCHIVE) }).await.unwrap();
        let args = RenameArgs { rules: vec!["/p/page /".to_string()], ..RenameArgs::default() };
        runner.run(Command::Rename { archive: PathBuf::from(ARCHIVE), options: args }).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), data);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn changes_are_written_without_dry_run() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data = container(&[("Saga/", ""), ("Saga/p1.jpg", "1")]);
        std::fs::write(temp_dir.path().join(ARCHIVE), &data).unwrap();

        let runner = runner(temp_dir.path(), false, RenameConfig::default());
        runner.run(Command::Flatten { archive: PathBuf::from(ARCHIVE) }).await.unwrap();
        assert_ne!(std::fs::read(temp_dir.path().join(ARCHIVE)).unwrap(), data);
        assert_eq!(entry_names(&runner).await, vec!["p1.jpg"]);
    }

    #[tokio::test]
    async fn configured_rules_apply_when_none_are_given() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data = container(&[("Scan_1.jpeg", "1"), ("Scan_10.jpeg", "10")]);
        std::fs::write(temp_dir.path().join(ARCHIVE), &data).unwrap();

        let defaults = RenameConfig { rules: vec!["/^scan_/p/i".to_string()], numbers: true, ..RenameConfig::default() };
        let runner = runner(temp_dir.path(), false, defaults);
        let archive = PathBuf::from(ARCHIVE);
        runner.run(Command::Rename { archive, options: RenameArgs::default() }).await.unwrap();
        assert_eq!(entry_names(&runner).await, vec!["p01.jpg", "p10.jpg"]);
    }

    #[test]
    fn command_line_rules_replace_configured_ones() {
        let defaults = RenameConfig { rules: vec!["/a/b/".to_string()], trim: true, ..RenameConfig::default() };
        let args = RenameArgs { rules: vec!["/a/c/g".to_string()], numbers: true, ..RenameArgs::default() };
        let (rules, options) = rename_settings(&args, &defaults).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].apply("aa"), "cc");
        assert_eq!(options, RenameOptions { trim: true, numbers: true, flatten: false });
    }

    #[test]
    fn configured_rules_are_the_fallback() {
        let defaults = RenameConfig { rules: vec!["/a/b/".to_string()], flatten: true, ..RenameConfig::default() };
        let (rules, options) = rename_settings(&RenameArgs::default(), &defaults).unwrap();
        assert_eq!(rules[0].apply("aa"), "ba");
        assert_eq!(options, RenameOptions { trim: false, numbers: false, flatten: true });
    }

    #[test]
    fn invalid_configured_rules_are_reported() {
        let defaults = RenameConfig { rules: vec!["no slashes".to_string()], ..RenameConfig::default() };
        let err = rename_settings(&RenameArgs::default(), &defaults).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(arg) if arg == "rename rule"));
    }
}
