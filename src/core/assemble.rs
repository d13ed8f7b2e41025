//! Builds the user-facing inline result for a track hit.
//!
//! Pure: the same hit and language always produce the same article,
//! including its id (the track id), so the host can collapse repeats.

use crate::adapters::telegram::{
    InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResultArticle, InputTextMessageContent,
};
use crate::domain::{TrackHit, TrackId};
use crate::text::{t, Key};

/// Callback payload prefix for the fetch-and-deliver action.
pub const CALLBACK_PREFIX: &str = "dl";

/// Build the display article for one hit: title, attribution, thumbnail,
/// a localized message body, and two actions: fetch-and-deliver via
/// callback, and an external link to the source.
pub fn assemble(hit: &TrackHit, lang: &str) -> InlineQueryResultArticle {
    let message_text = format!(
        "🎧 *{}*\n🎵 *{}*\n👤 {} {}",
        t(lang, Key::NowPlaying),
        hit.title,
        t(lang, Key::By),
        hit.channel,
    );

    let keyboard = InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton {
                text: "⬇ Download & Play".to_string(),
                callback_data: Some(format!("{}|{}", CALLBACK_PREFIX, hit.id)),
                url: None,
            },
            InlineKeyboardButton {
                text: "▶ Open on YouTube".to_string(),
                callback_data: None,
                url: Some(hit.id.watch_url()),
            },
        ]],
    };

    InlineQueryResultArticle {
        result_type: "article",
        id: hit.id.to_string(),
        title: format!("🎵 {}", hit.title),
        description: format!("👤 {}", hit.channel),
        thumbnail_url: (!hit.thumbnail_url.is_empty()).then(|| hit.thumbnail_url.clone()),
        input_message_content: InputTextMessageContent {
            message_text,
            parse_mode: Some("Markdown"),
        },
        reply_markup: keyboard,
    }
}

/// Parse a callback payload back into a track id.
pub fn parse_callback(data: &str) -> Option<TrackId> {
    let (prefix, id) = data.split_once('|')?;
    (prefix == CALLBACK_PREFIX && !id.is_empty()).then(|| TrackId::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit() -> TrackHit {
        TrackHit {
            id: TrackId::new("abc123"),
            title: "Test Song".to_string(),
            channel: "Test Channel".to_string(),
            thumbnail_url: "https://thumb/mq.jpg".to_string(),
        }
    }

    #[test]
    fn test_assemble_is_deterministic() {
        assert_eq!(assemble(&hit(), "en"), assemble(&hit(), "en"));
    }

    #[test]
    fn test_assemble_fields() {
        let article = assemble(&hit(), "en");

        assert_eq!(article.result_type, "article");
        assert_eq!(article.id, "abc123");
        assert_eq!(article.title, "🎵 Test Song");
        assert_eq!(article.description, "👤 Test Channel");
        assert_eq!(article.thumbnail_url.as_deref(), Some("https://thumb/mq.jpg"));
        assert!(article
            .input_message_content
            .message_text
            .contains("Test Song"));
    }

    #[test]
    fn test_assemble_actions() {
        let article = assemble(&hit(), "en");
        let row = &article.reply_markup.inline_keyboard[0];

        assert_eq!(row[0].callback_data.as_deref(), Some("dl|abc123"));
        assert!(row[0].url.is_none());
        assert_eq!(
            row[1].url.as_deref(),
            Some("https://www.youtube.com/watch?v=abc123")
        );
    }

    #[test]
    fn test_assemble_localizes_message() {
        let article = assemble(&hit(), "es");
        assert!(article
            .input_message_content
            .message_text
            .contains("Reproduciendo"));
    }

    #[test]
    fn test_empty_thumbnail_is_omitted() {
        let mut h = hit();
        h.thumbnail_url.clear();
        assert!(assemble(&h, "en").thumbnail_url.is_none());
    }

    #[test]
    fn test_callback_roundtrip() {
        let article = assemble(&hit(), "en");
        let data = article.reply_markup.inline_keyboard[0][0]
            .callback_data
            .clone()
            .unwrap();

        assert_eq!(parse_callback(&data), Some(TrackId::new("abc123")));
    }

    #[test]
    fn test_parse_callback_rejects_garbage() {
        assert_eq!(parse_callback("dl|"), None);
        assert_eq!(parse_callback("xx|abc123"), None);
        assert_eq!(parse_callback("no-separator"), None);
    }
}
