//! Token counting for Preview nodes (cl100k_base BPE)

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

/// Shared tokenizer; `None` if the BPE tables failed to load
fn tokenizer() -> Option<&'static CoreBPE> {
    static TOKENIZER: OnceLock<Option<CoreBPE>> = OnceLock::new();
    TOKENIZER
        .get_or_init(|| match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!(error = %e, "tokenizer unavailable, estimating token counts");
                None
            }
        })
        .as_ref()
}

/// Number of tokens in `text`
///
/// Falls back to a chars/3 estimate when the tokenizer cannot load.
pub fn count_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    match tokenizer() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => estimate_tokens(text),
    }
}

fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(3)
}
