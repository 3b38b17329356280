//! Offline keyword-overlap question answering.
//!
//! Splits the context into sentences and answers with the sentence whose
//! words cover the largest share of the question's keywords, weighting each
//! keyword by its length so that content words outrank short function words.
//! Ties go to the earlier sentence. Loading is instantaneous and needs no
//! network, which makes this backend suitable for demos and local testing.

use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{Answer, InferenceError, InferencePipeline, LoadError, ModelLoader, ModelName};
use tracing::debug;

/// Keywords shorter than this (in characters) are ignored unless numeric.
const MIN_KEYWORD_CHARS: usize = 2;

/// Loads [`LexicalPipeline`]s.
///
/// With an empty allow-list every model name loads; otherwise only the listed
/// names do and the rest fail with [`LoadError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct LexicalModelLoader {
    allowed: Vec<ModelName>,
}

impl LexicalModelLoader {
    /// Creates a loader restricted to `allowed` (empty = accept all).
    pub fn new(allowed: Vec<ModelName>) -> Self {
        Self { allowed }
    }
}

#[async_trait]
impl ModelLoader for LexicalModelLoader {
    async fn load(&self, model_name: &ModelName) -> Result<Arc<dyn InferencePipeline>, LoadError> {
        if !self.allowed.is_empty() && !self.allowed.contains(model_name) {
            return Err(LoadError::NotFound);
        }
        debug!(model = %model_name, "lexical pipeline ready");
        Ok(Arc::new(LexicalPipeline))
    }
}

/// Answers with the best-matching context sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalPipeline;

#[async_trait]
impl InferencePipeline for LexicalPipeline {
    async fn infer(&self, question: &str, context: &str) -> Result<Answer, InferenceError> {
        Ok(best_sentence(question, context))
    }
}

/// Byte range of one sentence within the context.
struct Sentence {
    start: usize,
    end: usize,
}

fn best_sentence(question: &str, context: &str) -> Answer {
    let keywords = keywords(question);
    let total_weight: usize = keywords.iter().map(|k| k.chars().count()).sum();

    let mut best: Option<(usize, &Sentence)> = None;
    let sentences = sentences(context);
    for sentence in &sentences {
        let words = sentence_words(&context[sentence.start..sentence.end]);
        let weight: usize = keywords
            .iter()
            .filter(|k| words.contains(*k))
            .map(|k| k.chars().count())
            .sum();
        if best.map_or(true, |(w, _)| weight > w) {
            best = Some((weight, sentence));
        }
    }

    match best {
        Some((weight, sentence)) => {
            let score = if total_weight == 0 {
                0.0
            } else {
                weight as f64 / total_weight as f64
            };
            let start = context[..sentence.start].chars().count();
            let end = start + context[sentence.start..sentence.end].chars().count();
            Answer::new(&context[sentence.start..sentence.end])
                .with_score(score)
                .with_span(start, end)
        }
        None => Answer::new("").with_score(0.0),
    }
}

/// Splits on sentence terminators and line breaks, trimming whitespace.
fn sentences(context: &str) -> Vec<Sentence> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in context.char_indices() {
        if matches!(c, '.' | '?' | '!' | '\n' | '。') {
            push_trimmed(context, start, i + c.len_utf8(), &mut out);
            start = i + c.len_utf8();
        }
    }
    push_trimmed(context, start, context.len(), &mut out);
    out
}

fn push_trimmed(context: &str, start: usize, end: usize, out: &mut Vec<Sentence>) {
    let slice = &context[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading + trailing < slice.len() {
        out.push(Sentence {
            start: start + leading,
            end: end - trailing,
        });
    }
}

fn keywords(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in words(text) {
        let numeric = word.chars().all(|c| c.is_numeric());
        if (numeric || word.chars().count() >= MIN_KEYWORD_CHARS) && !out.contains(&word) {
            out.push(word);
        }
    }
    out
}

fn sentence_words(text: &str) -> Vec<String> {
    words(text).collect()
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: &str = "The festival opens on 3 May. \
        Tickets are sold at the north gate! \
        Parking is free for residents?";

    #[tokio::test]
    async fn picks_sentence_with_most_keyword_overlap() {
        let answer = LexicalPipeline
            .infer("Where are tickets sold?", CONTEXT)
            .await
            .unwrap();
        assert_eq!(answer.text, "Tickets are sold at the north gate!");
        let (start, end) = answer.span.unwrap();
        let chars: String = CONTEXT.chars().skip(start).take(end - start).collect();
        assert_eq!(chars, answer.text);
        assert!(answer.score.unwrap() > 0.5);
    }

    #[tokio::test]
    async fn numeric_keywords_count() {
        let answer = LexicalPipeline.infer("What is on 3?", CONTEXT).await.unwrap();
        assert_eq!(answer.text, "The festival opens on 3 May.");
    }

    #[tokio::test]
    async fn ties_go_to_earliest_sentence() {
        let answer = LexicalPipeline
            .infer("unrelated question", "First line\nSecond line")
            .await
            .unwrap();
        assert_eq!(answer.text, "First line");
        assert_eq!(answer.score, Some(0.0));
    }

    #[tokio::test]
    async fn handles_multibyte_context() {
        let context = "서울은 수도이다. 부산은 항구 도시이다.";
        let answer = LexicalPipeline.infer("부산은 어떤 도시?", context).await.unwrap();
        assert_eq!(answer.text, "부산은 항구 도시이다.");
        assert_eq!(answer.span, Some((10, 22)));
    }

    #[tokio::test]
    async fn empty_context_yields_empty_answer() {
        let answer = LexicalPipeline.infer("Anything?", "   ").await.unwrap();
        assert_eq!(answer.text, "");
        assert_eq!(answer.span, None);
    }

    #[tokio::test]
    async fn allow_list_restricts_loading() {
        let allowed = ModelName::new("demo-model").unwrap();
        let loader = LexicalModelLoader::new(vec![allowed.clone()]);

        assert!(loader.load(&allowed).await.is_ok());
        let err = loader
            .load(&ModelName::new("other").unwrap())
            .await
            .err()
            .unwrap();
        assert_eq!(err, LoadError::NotFound);
    }

    #[tokio::test]
    async fn empty_allow_list_accepts_anything() {
        let loader = LexicalModelLoader::default();
        assert!(loader.load(&ModelName::new("anything").unwrap()).await.is_ok());
    }
}
