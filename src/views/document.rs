use crate::errors::CliError;
use crate::export::ExportMeta;
use crate::format::{self, Document};
use crate::parse::response::Completion;
use crate::prompts::{self, ChatMessage, RewriteStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentTool {
    Summarize,
    Rewrite(RewriteStyle),
}

impl DocumentTool {
    pub fn export_meta(self) -> ExportMeta {
        match self {
            DocumentTool::Summarize => ExportMeta {
                stem: "summary",
                title: "Summary Document",
                subject: "Text Summarization",
            },
            DocumentTool::Rewrite(_) => ExportMeta {
                stem: "rewritten",
                title: "Rewritten Content",
                subject: "Content Rewriter",
            },
        }
    }

    pub fn empty_input_message(self) -> &'static str {
        match self {
            DocumentTool::Summarize => "Please enter some text to summarize.",
            DocumentTool::Rewrite(_) => "Please enter some text to rewrite.",
        }
    }

    pub fn failure_notice(self) -> &'static str {
        match self {
            DocumentTool::Summarize => "Failed to summarize text. Please try again.",
            DocumentTool::Rewrite(_) => "Failed to rewrite text. Please try again.",
        }
    }

    pub fn progress_label(self) -> &'static str {
        match self {
            DocumentTool::Summarize => "Summarizing...",
            DocumentTool::Rewrite(_) => "Rewriting...",
        }
    }

    fn messages(self, input: &str) -> Vec<ChatMessage> {
        match self {
            DocumentTool::Summarize => prompts::summarize(input),
            DocumentTool::Rewrite(style) => prompts::rewrite(input, style),
        }
    }
}

/// Input text in, one formatted answer out.
#[derive(Debug, Clone)]
pub struct DocumentView {
    tool: DocumentTool,
    input: String,
    output: Option<String>,
    loading: bool,
}

impl DocumentView {
    pub fn new(tool: DocumentTool, input: impl Into<String>) -> Self {
        Self {
            tool,
            input: input.into(),
            output: None,
            loading: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Marks the view as loading and returns the request to send.
    pub fn begin(&mut self) -> Result<Vec<ChatMessage>, CliError> {
        if self.loading {
            return Err(CliError::Usage("A request is already in progress.".to_string()));
        }
        if self.input.trim().is_empty() {
            return Err(CliError::Usage(self.tool.empty_input_message().to_string()));
        }
        self.loading = true;
        Ok(self.tool.messages(&self.input))
    }

    /// Clears the loading flag whatever the outcome. A failure keeps the
    /// previous output.
    pub fn finish(&mut self, result: Result<Completion, CliError>) -> Result<&str, CliError> {
        self.loading = false;
        let completion = result?;
        let output = self.output.insert(completion.content);
        Ok(output.as_str())
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn document(&self) -> Option<Document> {
        self.output.as_deref().map(format::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(text: &str) -> Completion {
        Completion {
            content: text.to_string(),
            ..Completion::default()
        }
    }

    #[test]
    fn empty_input_is_refused() {
        let mut view = DocumentView::new(DocumentTool::Summarize, "   \n");
        let err = view.begin().unwrap_err();
        assert_eq!(err.to_string(), "Please enter some text to summarize.");
        assert!(!view.is_loading());

        let mut view = DocumentView::new(DocumentTool::Rewrite(RewriteStyle::Casual), "");
        assert_eq!(view.begin().unwrap_err().to_string(), "Please enter some text to rewrite.");
    }

    #[test]
    fn second_submission_while_loading_is_refused() {
        let mut view = DocumentView::new(DocumentTool::Summarize, "Some notes");
        let messages = view.begin().unwrap();
        assert!(messages[1].content.ends_with("Some notes"));
        assert!(view.is_loading());
        assert!(matches!(view.begin(), Err(CliError::Usage(_))));
    }

    #[test]
    fn finish_stores_output_and_clears_loading() {
        let mut view = DocumentView::new(DocumentTool::Rewrite(RewriteStyle::Academic), "text");
        view.begin().unwrap();
        assert_eq!(view.finish(Ok(completion("**Done**"))).unwrap(), "**Done**");
        assert!(!view.is_loading());
        assert_eq!(format::to_plain(&view.document().unwrap()), "Done");
    }

    #[test]
    fn failure_keeps_previous_output() {
        let mut view = DocumentView::new(DocumentTool::Summarize, "text");
        view.begin().unwrap();
        view.finish(Ok(completion("first"))).unwrap();

        view.begin().unwrap();
        let err = view
            .finish(Err(CliError::Upstream("boom".to_string())))
            .unwrap_err();
        assert!(matches!(err, CliError::Upstream(_)));
        assert!(!view.is_loading());
        assert_eq!(view.output(), Some("first"));
    }

    #[test]
    fn export_names_follow_the_tool() {
        assert_eq!(DocumentTool::Summarize.export_meta().stem, "summary");
        let meta = DocumentTool::Rewrite(RewriteStyle::Creative).export_meta();
        assert_eq!(meta.stem, "rewritten");
        assert_eq!(meta.title, "Rewritten Content");
    }
}
