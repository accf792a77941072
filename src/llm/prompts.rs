//! Prompt templates for the router and pipeline stages

/// Minimal `{{variable}}` template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fill in the template with `(name, value)` pairs
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut result = self.template.clone();
        for (name, value) in values {
            result = result.replace(&format!("{{{{{name}}}}}"), value);
        }
        result
    }
}

/// Prompts used by the assistant
pub struct AssistantPrompts;

impl AssistantPrompts {
    /// Phrase a retrieved FAQ passage as a customer-facing answer
    pub fn faq_answer() -> PromptTemplate {
        PromptTemplate::new(
            r"You are a friendly customer support representative at a fashion retailer.

A customer asked: {{question}}

The relevant passage from the company guide is:

{{passage}}

Answer the customer's question using only the passage above. Be concise and
courteous. If the passage does not fully answer the question, share what it
does say and suggest contacting support for the rest.

Answer:",
        )
    }

    /// Warm reply to greetings and small talk
    pub fn small_talk() -> PromptTemplate {
        PromptTemplate::new(
            r"You are a friendly customer support representative at a fashion retailer.
The customer said: {{message}}

Reply warmly and naturally in one or two sentences. Do not invent order or
product details.

Reply:",
        )
    }

    /// Apology for a damaged or defective item
    pub fn complaint() -> PromptTemplate {
        PromptTemplate::new(
            r"You are a customer support representative at a fashion retailer.
The customer reports receiving a damaged or defective item: {{message}}

Apologize sincerely, acknowledge the problem, and offer to arrange a return
or replacement through support. Two to three sentences.

Reply:",
        )
    }

    /// Short shopping summary for the presentation stage
    pub fn presentation() -> PromptTemplate {
        PromptTemplate::new(
            r"You are a fashion shopping assistant. The customer searched for:
{{query}}

These products matched (name, attributes):
{{products}}

Write a short, enthusiastic message (2-3 sentences) introducing the matches.
Mention standout attributes. Plain text only, no lists, no JSON.

Message:",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_variables() {
        let template = PromptTemplate::new("Hello {{name}}, welcome to {{store}}!");
        let out = template.render(&[("name", "Ada"), ("store", "Deeplearners Fashion")]);
        assert_eq!(out, "Hello Ada, welcome to Deeplearners Fashion!");
    }

    #[test]
    fn test_render_leaves_unknown_variables() {
        let template = PromptTemplate::new("Hello {{name}}!");
        let out = template.render(&[("other", "x")]);
        assert_eq!(out, "Hello {{name}}!");
    }

    #[test]
    fn test_faq_answer_prompt_includes_inputs() {
        let prompt = AssistantPrompts::faq_answer().render(&[
            ("question", "What is your return policy?"),
            ("passage", "Returns are accepted within 30 days."),
        ]);
        assert!(prompt.contains("What is your return policy?"));
        assert!(prompt.contains("Returns are accepted within 30 days."));
    }
}
