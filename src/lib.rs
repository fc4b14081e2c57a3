use clap::{Parser, Subcommand};

pub mod build;
pub mod create;
pub mod system;

use crate::system::Error;

/// CLI entry point
#[derive(Debug, Clone, Default, PartialEq, Parser)]
#[command(author, version, about)]
pub struct Biu {
    /// Set the workspace root (where BUILD is)
    ///
    /// Defaults to the current working directory
    #[clap(short('C'), long, default_value = ".")]
    pub dir: String,

    /// Subcommand
    #[clap(subcommand)]
    pub command: Option<BiuCommand>,

    /// Build options
    #[clap(flatten)]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum BiuCommand {
    /// Write a BUILD scaffold into the workspace directory
    Create(create::CreateArgs),
    /// Evaluate BUILD and generate the Makefile tree
    Build,
    /// Remove generated Makefiles, build state and outputs
    Clean,
}

impl BiuCommand {
    pub fn run(&self, args: &Biu) -> Result<(), Error> {
        match self {
            Self::Create(create_args) => create::create(&args.dir, create_args),
            Self::Build => build::run(&args.dir, &args.options),
            Self::Clean => build::clean(&args.dir, &args.options),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Parser)]
pub struct Options {
    /// Suppress progress output
    #[clap(short, long)]
    pub quiet: bool,

    /// Print verbose output from each build step
    #[clap(short, long)]
    pub verbose: bool,
}

impl Biu {
    /// Build the workspace
    pub fn build(&self) -> Result<(), Error> {
        build::run(&self.dir, &self.options)
    }
}
