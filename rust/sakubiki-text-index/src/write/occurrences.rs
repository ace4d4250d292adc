use std::collections::BTreeSet;

use sakubiki_common::{Result, error::Error};

use crate::{
    tokenizers::Tokenizer,
    word_idx::{DocumentId, WordIdx},
};

use super::WordOccurrenceMap;

/// Tokenizes `content` and groups the resulting occurrence records of
/// document `id` by base form, skipping stopwords and empty base forms.
///
/// Content that is not valid UTF-8 is tokenized run by run: each maximal
/// valid run is handed to the tokenizer on its own and invalid bytes never
/// produce words. Offsets are always relative to the start of `content`.
///
/// Produces the same map for the same input and tokenizer.
pub fn collect_occurrences<T: Tokenizer>(
    tokenizer: &T,
    stopwords: &BTreeSet<String>,
    id: DocumentId,
    content: &[u8],
) -> Result<WordOccurrenceMap> {
    let mut map = WordOccurrenceMap::new();
    let mut run_start = 0;
    for chunk in content.utf8_chunks() {
        let text = chunk.valid();
        for token in tokenizer.tokenize(text) {
            if token.base.is_empty() || stopwords.contains(&*token.base) {
                continue;
            }
            let offset = run_start + token.offset;
            let offset = u32::try_from(offset).map_err(|_| {
                Error::invalid_arg("content", format!("offset {offset} exceeds u32"))
            })?;
            map.push(&token.base, WordIdx::new(id, offset));
        }
        run_start += text.len() + chunk.invalid().len();
    }
    Ok(map)
}
