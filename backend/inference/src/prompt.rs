use snaplens_core::{InferenceRequest, PromptVariant};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Build the fixed instruction template for `variant` around the input
/// text. Each variant pins its own output-length constraint and sampling
/// temperature.
pub fn build_request(input_text: &str, variant: PromptVariant) -> InferenceRequest {
    let (user_prompt, max_tokens, temperature) = match variant {
        PromptVariant::ShortAnswer => (
            format!(
                "Question: {input_text}\nProvide a short answer to this, ideally 1 or 2 words \
                 max, but use up to 5 if you deem necessary."
            ),
            100,
            0.0,
        ),
        PromptVariant::Hint => (
            format!(
                "Question: {input_text}\nProvide a hint to the answer of this question in one \
                 sentence or less. Don't include Hint: at the front, just give the hint by itself."
            ),
            50,
            0.0,
        ),
        PromptVariant::Pointers => (
            format!(
                "Question: {input_text}\nProvide 5 bullet points with memory jogs/pointers for \
                 the answer; they don't have to be grammatically correct, just as valuable words \
                 as possible."
            ),
            100,
            0.0,
        ),
        PromptVariant::FreeformCapture => (
            format!(
                "Please provide as short as possible and concise response to the following. \
                 If it's a math equation, just provide the solution, e.g. solve it and find the \
                 variables, e.g. if it was 7x - y = 14, find what x and y are and respond with those. \
                 If it's a text-based question, provide the briefest possible answer, ideally \
                 1-2 words, but less than 5 if possible.\n\nInput: \"{input_text}\""
            ),
            50,
            0.1,
        ),
    };

    InferenceRequest {
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt,
        max_tokens,
        temperature,
        variant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_variant_has_its_own_constraints() {
        let short = build_request("q", PromptVariant::ShortAnswer);
        let hint = build_request("q", PromptVariant::Hint);
        let pointers = build_request("q", PromptVariant::Pointers);
        let capture = build_request("q", PromptVariant::FreeformCapture);

        assert_eq!(short.max_tokens, 100);
        assert_eq!(hint.max_tokens, 50);
        assert_eq!(pointers.max_tokens, 100);
        assert_eq!(capture.max_tokens, 50);

        assert_eq!(capture.temperature, 0.1);
        assert_eq!(short.temperature, 0.0);
    }

    #[test]
    fn test_input_text_is_embedded() {
        let req = build_request("7x - y = 14", PromptVariant::FreeformCapture);
        assert!(req.user_prompt.contains("Input: \"7x - y = 14\""));
        assert_eq!(req.variant, PromptVariant::FreeformCapture);

        let req = build_request("capital of France?", PromptVariant::Hint);
        assert!(req.user_prompt.starts_with("Question: capital of France?"));
        assert!(req.user_prompt.contains("one sentence or less"));
    }

    #[test]
    fn test_pointers_asks_for_five_bullets() {
        let req = build_request("q", PromptVariant::Pointers);
        assert!(req.user_prompt.contains("5 bullet points"));
    }
}
