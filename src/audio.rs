//! Translated speech rendering of the final sentiment narrative.
//!
//! Both steps use Google's public web endpoints and are best effort:
//! - [`translate`] returns the original text when anything goes wrong
//! - [`synthesize`] returns `None` when no audio could be produced
//!
//! Neither ever fails the analysis.

use rand::{rng, Rng};
use reqwest::Client;
use serde_json::Value;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";
const TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Longest text the translate endpoint accepts in one request.
pub const TRANSLATE_CHUNK_CHARS: usize = 4500;
/// Longest text the speech endpoint accepts in one request.
pub const TTS_CHUNK_CHARS: usize = 100;

/// Split `text` into pieces of at most `max_chars` characters, breaking between words.
///
/// Words longer than `max_chars` are split mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if current.is_empty() { word_len } else { word_len + 1 };

        if current_len + needed <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len += needed;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if word_len <= max_chars {
            current.push_str(word);
            current_len = word_len;
        } else {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Concatenate the translated segments of a `translate_a/single` response.
pub fn parse_translation(body: &str) -> Result<String, Box<dyn Error>> {
    let value: Value = serde_json::from_str(body)?;
    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or("translation response has no segment list")?;
    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        return Err("translation response contained no text".into());
    }
    Ok(text)
}

async fn translate_chunk(client: &Client, chunk: &str, target: &str) -> Result<String, Box<dyn Error>> {
    let url = format!(
        "{}?client=gtx&sl=auto&tl={}&dt=t&q={}",
        TRANSLATE_URL,
        urlencoding::encode(target),
        urlencoding::encode(chunk)
    );
    let body = client.get(&url).send().await?.error_for_status()?.text().await?;
    parse_translation(&body)
}

/// Translate `text` into `target`, returning `text` unchanged on any failure.
#[instrument(level = "info", skip(client, text), fields(chars = text.chars().count()))]
pub async fn translate(client: &Client, text: &str, target: &str) -> String {
    let mut translated = Vec::new();
    for chunk in chunk_text(text, TRANSLATE_CHUNK_CHARS) {
        match translate_chunk(client, &chunk, target).await {
            Ok(t) => translated.push(t),
            Err(e) => {
                warn!(error = %e, "Translation failed; keeping original text");
                return text.to_string();
            }
        }
    }
    translated.join(" ")
}

async fn synthesize_chunks(client: &Client, chunks: &[String], language: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut audio = Vec::new();
    for (idx, chunk) in chunks.iter().enumerate() {
        let url = format!(
            "{}?ie=UTF-8&q={}&tl={}&client=tw-ob&total={}&idx={}&textlen={}",
            TTS_URL,
            urlencoding::encode(chunk),
            urlencoding::encode(language),
            chunks.len(),
            idx,
            chunk.chars().count()
        );
        let bytes = client.get(&url).send().await?.error_for_status()?.bytes().await?;
        if bytes.is_empty() {
            return Err(format!("speech endpoint returned no audio for chunk {idx}").into());
        }
        audio.extend_from_slice(&bytes);
    }
    Ok(audio)
}

/// Render `text` as MP3 speech in `language` under `dir`.
///
/// Returns the written file's path, or `None` when nothing was produced.
#[instrument(level = "info", skip(client, text), fields(chars = text.chars().count()))]
pub async fn synthesize(client: &Client, text: &str, language: &str, dir: &Path) -> Option<PathBuf> {
    let chunks = chunk_text(text, TTS_CHUNK_CHARS);
    if chunks.is_empty() {
        warn!("Nothing to synthesize");
        return None;
    }

    let audio = match synthesize_chunks(client, &chunks, language).await {
        Ok(audio) => audio,
        Err(e) => {
            warn!(error = %e, "Speech synthesis failed");
            return None;
        }
    };

    let path = dir.join(format!("tts_{:032x}.mp3", rng().random::<u128>()));
    match fs::write(&path, &audio).await {
        Ok(()) => {
            info!(path = %path.display(), bytes = audio.len(), "Wrote audio summary");
            Some(path)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to write audio file");
            None
        }
    }
}

/// Translate `text` into `language`, then synthesize it.
pub async fn summarize_to_audio(client: &Client, text: &str, language: &str, dir: &Path) -> Option<PathBuf> {
    let translated = translate(client, text, language).await;
    if translated.is_ascii() && !language.starts_with("en") {
        warn!(%language, "Translated text is plain ASCII; translation probably did not happen");
    }
    debug!(preview = %crate::utils::truncate_for_log(&translated, 120), "Text for speech");
    synthesize(client, &translated, language, dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_packs_words() {
        let chunks = chunk_text("one two three four five", 9);
        assert_eq!(chunks, vec!["one two", "three", "four five"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 9));
    }

    #[test]
    fn test_chunk_text_splits_long_words_and_counts_chars() {
        let chunks = chunk_text("abcdefghij xy", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij", "xy"]);

        let hindi = "नमस्ते ".repeat(40);
        let chunks = chunk_text(&hindi, TTS_CHUNK_CHARS);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= TTS_CHUNK_CHARS));
        assert_eq!(chunks.join(" "), hindi.trim_end());
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("   ", 100).is_empty());
    }

    #[test]
    fn test_parse_translation_concatenates_segments() {
        let body = r#"[[["टेस्ला के शेयर बढ़े। ","Tesla shares rose. ",null,null,10],["निवेशक खुश हैं।","Investors are happy.",null,null,10]],null,"en"]"#;
        assert_eq!(parse_translation(body).unwrap(), "टेस्ला के शेयर बढ़े। निवेशक खुश हैं।");
    }

    #[test]
    fn test_parse_translation_rejects_unexpected_shapes() {
        assert!(parse_translation("{}").is_err());
        assert!(parse_translation("[null]").is_err());
        assert!(parse_translation("[[]]").is_err());
        assert!(parse_translation("not json").is_err());
    }

    #[tokio::test]
    async fn test_synthesize_empty_text_produces_nothing() {
        let client = Client::new();
        assert!(synthesize(&client, "  ", "hi", Path::new(".")).await.is_none());
    }
}
