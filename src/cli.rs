use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "clipin", version)]
#[command(
    about = "Move Python wheels to an offline machine through the clipboard",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download wheels for a package and copy them to the clipboard
    Copy {
        /// Requirement to download (e.g., 'requests==2.32.3')
        package: String,

        /// Also download dependency wheels
        #[arg(long, overrides_with = "no_deps")]
        deps: bool,

        #[arg(long, overrides_with = "deps")]
        no_deps: bool,
    },
    /// Restore wheels from the clipboard and install them offline
    Install {
        /// Directory to restore .whl files into
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Remove restored wheels after a successful install
        #[arg(long, overrides_with = "no_clean")]
        clean: bool,

        #[arg(long, overrides_with = "clean")]
        no_clean: bool,

        /// Reinstall even if the same version is already installed
        #[arg(long, overrides_with = "no_force")]
        force: bool,

        #[arg(long, overrides_with = "force")]
        no_force: bool,
    },
    /// Restore wheels from the clipboard without installing
    Paste {
        /// Directory to restore .whl files into
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

/// Resolve a `--flag/--no-flag` pair, `None` when neither was given.
pub fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_copy_defaults_to_no_deps() {
        let cli = Cli::parse_from(["clipin", "copy", "requests==2.32.3"]);
        match cli.command {
            Commands::Copy { package, deps, no_deps } => {
                assert_eq!(package, "requests==2.32.3");
                assert_eq!(toggle(deps, no_deps), None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_last_toggle_wins() {
        let cli = Cli::parse_from(["clipin", "copy", "pkg", "--deps", "--no-deps"]);
        let Commands::Copy { deps, no_deps, .. } = cli.command else {
            panic!("expected copy");
        };
        assert_eq!(toggle(deps, no_deps), Some(false));

        let cli = Cli::parse_from([
            "clipin",
            "install",
            "--no-force",
            "--force",
            "--dir",
            "wheels",
        ]);
        let Commands::Install { dir, force, no_force, clean, no_clean } = cli.command else {
            panic!("expected install");
        };
        assert_eq!(dir, Some(PathBuf::from("wheels")));
        assert_eq!(toggle(force, no_force), Some(true));
        assert_eq!(toggle(clean, no_clean), None);
    }

    #[test]
    fn test_paste_accepts_dir() {
        let cli = Cli::parse_from(["clipin", "-v", "paste", "--dir", "temp"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Paste { dir: Some(_) }));
    }
}
