//! Localized reply strings.
//!
//! Keyed by the sender's language code; unknown languages fall back to
//! English.

/// Reply string keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    NowPlaying,
    By,
    Downloading,
    DownloadFailed,
}

/// Look up a reply string for a language code.
pub fn t(lang: &str, key: Key) -> &'static str {
    // "es-MX" and friends collapse to their base language
    let lang = lang.split('-').next().unwrap_or("en");
    match (lang, key) {
        ("hi", Key::NowPlaying) => "अब चल रहा है",
        ("hi", Key::By) => "द्वारा",
        ("hi", Key::Downloading) => "⬇ डाउनलोड हो रहा है… कृपया प्रतीक्षा करें",
        ("hi", Key::DownloadFailed) => "⚠ डाउनलोड विफल रहा। कृपया बाद में पुनः प्रयास करें।",

        ("es", Key::NowPlaying) => "Reproduciendo",
        ("es", Key::By) => "por",
        ("es", Key::Downloading) => "⬇ Descargando… espera",
        ("es", Key::DownloadFailed) => "⚠ Error de descarga. Inténtalo más tarde.",

        (_, Key::NowPlaying) => "Now playing",
        (_, Key::By) => "by",
        (_, Key::Downloading) => "⬇ Downloading… please wait",
        (_, Key::DownloadFailed) => "⚠ Download failed. Try again later.",
    }
}
