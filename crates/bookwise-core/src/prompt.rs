/// Number of books the recommendation prompt asks for
pub const RECOMMENDATION_COUNT: usize = 5;

/// Renders the task prompts sent to providers
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: String,
}

impl PromptBuilder {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Prompt for a 100-200 character chapter summary.
    ///
    /// `prepared_content` is expected to be the output of [`crate::text::prepare`].
    pub fn build_summary_prompt(
        &self,
        book_name: &str,
        chapter_title: &str,
        prepared_content: &str,
    ) -> String {
        let language = &self.language;

        format!(
            "Write a concise summary in {language} of the chapter \"{chapter_title}\" from the novel \"{book_name}\".\n\n\
Requirements:\n\
1. 100-200 characters\n\
2. Cover the main plot of this chapter\n\
3. Mention the key characters and events\n\
4. Plain, fluent prose\n\n\
Chapter content:\n\
{prepared_content}\n\n\
Output only the summary, nothing else."
        )
    }

    /// Prompt that asks for book suggestions as a single JSON object
    pub fn build_recommendation_prompt(&self, user_query: &str) -> String {
        let language = &self.language;
        let count = RECOMMENDATION_COUNT;

        format!(
            "You are a book recommendation assistant for web novels. The reader describes what they \
want to read and you recommend {count} novels that match.\n\n\
Requirements:\n\
1. The response must be JSON\n\
2. Each book has a title, an author, a reason (at most 50 characters, in {language}) and tags (an array)\n\
3. Only recommend real, well-known books\n\
4. Prefer finished works or popular ongoing serials\n\n\
Reader request: {user_query}\n\n\
Respond strictly in the following JSON format with nothing else:\n\
{{\n  \"recommendations\": [\n    {{\"title\": \"Title\", \"author\": \"Author\", \"reason\": \"Reason\", \"tags\": [\"tag1\", \"tag2\"]}}\n  ]\n}}"
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new("Chinese")
    }
}
