//! Token counting using tiktoken.
//!
//! Counting uses the `cl100k_base` encoding, the tokenizer of the supported
//! gpt-3.5/gpt-4 model family. The encoding is deliberately fixed: message
//! rows persist their token count at insert time, and windows computed after
//! a restart must stay comparable with counts stored before it. Changing the
//! encoding invalidates every stored `token_count`.

use std::sync::OnceLock;

use tiktoken_rs::{CoreBPE, cl100k_base};

/// The tiktoken encoder is expensive to initialize (loads vocabulary data),
/// so we create it once and reuse it across all `TokenCounter` instances.
static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn get_encoder() -> Option<&'static CoreBPE> {
    ENCODER.get_or_init(|| cl100k_base().ok()).as_ref()
}

/// Thread-safe token counter over the fixed `cl100k_base` encoding.
///
/// Side-effect free. If the encoder cannot be initialized the counter
/// degrades to byte-length estimates and logs an error once; budgets then
/// overestimate, which errs toward smaller windows rather than oversized
/// requests.
#[derive(Clone, Copy)]
pub struct TokenCounter {
    encoder: Option<&'static CoreBPE>,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoder", &self.encoder.as_ref().map(|_| "<CoreBPE>"))
            .finish()
    }
}

impl TokenCounter {
    #[must_use]
    pub fn new() -> Self {
        let encoder = get_encoder();
        if encoder.is_none() {
            tracing::error!(
                "Failed to initialize tiktoken cl100k_base encoder. Falling back to byte-length estimates."
            );
        }

        Self { encoder }
    }

    /// Counts the tokens in a single string.
    #[must_use]
    pub fn count_str(&self, text: &str) -> u32 {
        let len = match self.encoder {
            Some(encoder) => encoder.encode_ordinary(text).len(),
            None => text.len(),
        };

        u32::try_from(len).unwrap_or(u32::MAX)
    }

    /// Sums [`TokenCounter::count_str`] over an ordered sequence of texts.
    #[must_use]
    pub fn count_all<'a, I>(&self, texts: I) -> u64
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts
            .into_iter()
            .map(|text| u64::from(self.count_str(text)))
            .sum()
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}
