use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Inspect and rewrite comic book archives
#[derive(Debug, Parser)]
#[command(name = "tankobon", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short = 'c', global = true, env = "TANKOBON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory archive paths are resolved against
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Show what would change without writing anything
    #[arg(long, short = 'n', global = true)]
    pub dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List archive entries (alias: ls)
    #[command(alias = "ls")]
    Entries {
        archive: PathBuf,
    },

    /// Print the ComicInfo record
    Info {
        archive: PathBuf,

        /// Only print these fields
        #[arg(long = "field", short = 'f')]
        fields: Vec<String>,
    },

    /// Set or clear ComicInfo fields
    Set {
        archive: PathBuf,

        /// FIELD=VALUE assignments
        #[arg(value_parser = parse_assignment)]
        values: Vec<(String, String)>,

        /// Fields to remove
        #[arg(long)]
        clear: Vec<String>,
    },

    /// Extract the cover image
    Cover {
        archive: PathBuf,

        /// Output file; defaults to the entry's file name
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Make an image the cover
    SetCover {
        archive: PathBuf,
        entry: String,
    },

    /// Extract one image
    Image {
        archive: PathBuf,
        entry: String,

        /// Output file; defaults to the entry's file name
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Move every entry to the top level
    Flatten {
        archive: PathBuf,
    },

    /// Re-encode images to drop embedded metadata
    StripExif {
        archive: PathBuf,
    },

    /// Rename entries with regex rules
    Rename {
        archive: PathBuf,

        #[command(flatten)]
        options: RenameArgs,
    },

    /// Merge archives into one, renumbering colliding pages
    Merge {
        destination: PathBuf,

        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },

    /// Split entries out into new archives
    Split {
        archive: PathBuf,

        /// DESTINATION=ENTRY[,ENTRY...]; repeatable
        #[arg(long = "part", short = 'p', required = true, value_parser = parse_part)]
        parts: Vec<(PathBuf, Vec<String>)>,
    },

    /// Join pairs of pages into spreads
    Join {
        archive: PathBuf,

        /// LEFT:RIGHT entry names; repeatable
        #[arg(long = "pair", short = 'p', required = true, value_parser = parse_pair)]
        pairs: Vec<(String, String)>,

        /// Pixels between the pages
        #[arg(long)]
        gap: Option<u32>,

        /// Hex colour of the gap
        #[arg(long)]
        color: Option<String>,
    },

    /// Rebuild the ComicInfo page list from the archive's images
    Pages {
        archive: PathBuf,
    },
}

#[derive(Debug, Default, Args)]
pub struct RenameArgs {
    /// /pattern/flags or /pattern/replacement/flags; repeatable
    #[arg(long = "rule", short = 'r', allow_hyphen_values = true)]
    pub rules: Vec<String>,

    /// Strip whitespace around names
    #[arg(long)]
    pub trim: bool,

    /// Make page numbers increasing and evenly padded
    #[arg(long)]
    pub numbers: bool,

    /// Drop directories
    #[arg(long)]
    pub flatten: bool,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected FIELD=VALUE, got {s:?}"))?;
    if key.trim().is_empty() {
        return Err(format!("missing field name in {s:?}"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

fn parse_part(s: &str) -> Result<(PathBuf, Vec<String>), String> {
    let (destination, entries) = s.split_once('=').ok_or_else(|| format!("expected DESTINATION=ENTRIES, got {s:?}"))?;
    if destination.is_empty() {
        return Err(format!("missing destination in {s:?}"));
    }
    let entries = entries.split(',').filter(|entry| !entry.is_empty()).map(str::to_string).collect();
    Ok((PathBuf::from(destination), entries))
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() => Ok((left.to_string(), right.to_string())),
        _ => Err(format!("expected LEFT:RIGHT, got {s:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("series=Saga", Some(("series", "Saga")))]
    #[case("Summary=a=b", Some(("Summary", "a=b")))]
    #[case("title=", Some(("title", "")))]
    #[case("=Saga", None)]
    #[case("series", None)]
    fn assignments(#[case] input: &str, #[case] expected: Option<(&str, &str)>) {
        let parsed = parse_assignment(input).ok();
        assert_eq!(parsed.as_ref().map(|(k, v)| (k.as_str(), v.as_str())), expected);
    }

    #[test]
    fn parts() {
        let (destination, entries) = parse_part("Saga 001b.cbz=p3.png,p4.png").unwrap();
        assert_eq!(destination, PathBuf::from("Saga 001b.cbz"));
        assert_eq!(entries, vec!["p3.png", "p4.png"]);
        assert!(parse_part("=p1.png").is_err());
        assert!(parse_part("out.cbz").is_err());
    }

    #[rstest]
    #[case("p1.png:p2.png", true)]
    #[case("p1.png:", false)]
    #[case("p1.png", false)]
    fn pairs(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(parse_pair(input).is_ok(), ok);
    }

    #[test]
    fn parse_join() {
        let cli = Cli::try_parse_from([
            "tankobon", "-n", "join", "Saga 001.cbz", "--pair", "p1.png:p2.png", "--pair", "p3.png:p4.png", "--gap", "4",
        ])
        .unwrap();
        assert!(cli.dry_run);
        let Command::Join { pairs, gap, color, .. } = cli.command else {
            panic!("expected join");
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(gap, Some(4));
        assert_eq!(color, None);
    }

    #[test]
    fn parse_rename_rules() {
        let cli = Cli::try_parse_from(["tankobon", "rename", "a.cbz", "-r", "/^scan_//i", "--numbers"]).unwrap();
        let Command::Rename { options, .. } = cli.command else {
            panic!("expected rename");
        };
        assert_eq!(options.rules, vec!["/^scan_//i"]);
        assert!(options.numbers && !options.trim);
    }
}
