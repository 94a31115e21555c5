//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::Style;

/// Loader hierarchy inspector: snapshot trees plus a cumulative tree of every loader ever seen
#[derive(Parser, Debug)]
#[command(name = "loadertree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one iteration and print both trees
    Show {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Run at start, every N seconds, and once more on Ctrl-C
    Watch {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments shared by commands that run iterations.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Runtime manifest (TOML), re-read on every iteration
    #[arg(value_hint = ValueHint::FilePath)]
    pub manifest: PathBuf,

    /// Option string, e.g. "maxPackages=3,every=10"
    #[arg(short, long, env = "LOADERTREE_OPTIONS")]
    pub options: Option<String>,

    /// Override maxPackages from the option string
    #[arg(long)]
    pub max_packages: Option<usize>,

    /// Override every (seconds) from the option string
    #[arg(long)]
    pub every: Option<u64>,

    /// Output layout
    #[arg(long, value_enum, default_value_t = StyleArg::Indented)]
    pub style: StyleArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleArg {
    Indented,
    Ascii,
}

impl From<StyleArg> for Style {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Indented => Style::Indented,
            StyleArg::Ascii => Style::Ascii,
        }
    }
}
