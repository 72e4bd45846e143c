use clap::Args;

use crate::app::Runtime;
use crate::commands::document::{self, InputArgs, OutputArgs};
use crate::errors::CliError;
use crate::views::document::DocumentTool;

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn handle(runtime: &Runtime, args: SummarizeArgs) -> Result<(), CliError> {
    let text = document::resolve_input(&args.input, std::io::stdin())?;
    document::run(runtime, DocumentTool::Summarize, text, &args.output).await
}
