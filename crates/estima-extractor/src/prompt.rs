//! LLM prompt engineering for field extraction

/// Builds the prompt asking the model to extract one field from retrieved context
pub struct PromptBuilder<'a> {
    field: &'a str,
    context: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(field: &'a str, context: &'a str) -> Self {
        Self { field, context }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(self.context.len() + OUTPUT_CONTRACT.len() + 128);

        prompt.push_str(&format!(
            "Extract {} from the following text:\n",
            self.field
        ));
        prompt.push_str("---\n");
        prompt.push_str(self.context);
        prompt.push_str("\n---\n\n");
        prompt.push_str(OUTPUT_CONTRACT);

        prompt
    }
}

const OUTPUT_CONTRACT: &str = r#"Extract the relevant information from the text and format it as a clean JSON object with the following rules:

1. Structure related data using nested objects. Example:
   { "participants": { "placebo": 200, "treatment": 600 } }

2. Always respond only with a JSON object. Do not include any extra text, explanation, or markdown.

3. Include an "explain" field in the JSON object describing where the values came from, or why they are absent.

4. Ensure the JSON is valid: proper quotes, colons and commas.

5. If a piece of data is missing, omit the field or use an empty object for that section. If no relevant data exists at all, respond with an empty JSON object: {}

6. The output must start with { and end with }. Do not include ```json or any other formatting characters.

7. All numeric values must be numbers, not strings, unless explicitly textual."#;
