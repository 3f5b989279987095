pub mod args;
pub mod commands;

pub use args::{CompileArgs, DotArgs, ValidateArgs};
use clap::{Parser, Subcommand};
use std::path::Path;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
PIPELINE COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "morphflow")]
#[command(version = crate::VERSION)]
#[command(about = "Compile typed event pipelines into state machines")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: validate a manifest, compile it to a deployable artifact, then render it with dot to review the graph."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Compile a pipeline manifest into a state machine and trigger rule",
        long_about = "Compile type-checks the manifest steps, lowers them into states, and writes the state machine definition together with the rule that starts it.",
        after_help = "Example:\n    morphflow compile recommend.yaml --output build/recommend.json"
    )]
    Compile(CompileArgs),
    #[command(
        about = "Check a pipeline manifest without writing an artifact",
        long_about = "Validate runs every check compile runs, including compilation itself, and reports the first failure with its error code.",
        after_help = "Example:\n    morphflow validate recommend.yaml"
    )]
    Validate(ValidateArgs),
    #[command(
        about = "Render the compiled state graph as Graphviz DOT",
        long_about = "Dot compiles the manifest and prints every state, nested ones included, with next, each and catch edges.",
        after_help = "Example:\n    morphflow dot recommend.yaml | dot -Tsvg > recommend.svg"
    )]
    Dot(DotArgs),
}

impl Command {
    pub fn manifest(&self) -> &Path {
        match self {
            Command::Compile(args) => &args.manifest,
            Command::Validate(args) => &args.manifest,
            Command::Dot(args) => &args.manifest,
        }
    }

    /// Whether the command prints its artifact on stdout.
    pub fn writes_stdout(&self) -> bool {
        match self {
            Command::Compile(args) => args.output.is_none(),
            Command::Validate(_) => true,
            Command::Dot(args) => args.output.is_none(),
        }
    }
}

pub fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Compile(compile_args) => commands::compile(compile_args),
        Command::Validate(validate_args) => commands::validate(validate_args),
        Command::Dot(dot_args) => commands::dot(dot_args),
    }
}
