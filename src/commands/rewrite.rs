use clap::Args;

use crate::app::Runtime;
use crate::commands::document::{self, InputArgs, OutputArgs};
use crate::errors::CliError;
use crate::prompts::RewriteStyle;
use crate::views::document::DocumentTool;

#[derive(Debug, Args)]
pub struct RewriteArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Tone of the rewritten text
    #[arg(long, value_enum, default_value_t = RewriteStyle::Academic)]
    pub style: RewriteStyle,
    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn handle(runtime: &Runtime, args: RewriteArgs) -> Result<(), CliError> {
    let text = document::resolve_input(&args.input, std::io::stdin())?;
    document::run(runtime, DocumentTool::Rewrite(args.style), text, &args.output).await
}
