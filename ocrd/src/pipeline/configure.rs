use crate::models::RecognitionOptions;
use crate::ocr::RecognitionConfig;

/// Overlay the caller's options on the engine defaults.
///
/// Present options win; absent ones, including empty lists, keep the
/// default. The revision is assumed to have been validated already.
pub fn build(options: &RecognitionOptions, defaults: RecognitionConfig) -> RecognitionConfig {
    let mut config = defaults;

    if let Some(revision) = &options.revision {
        config.revision = revision.clone();
    }
    if let Some(mode) = options.mode {
        config.level = mode.into();
    }
    if !options.words.is_empty() {
        config.custom_words = options.words.clone();
    }
    if let Some(autocorrect) = options.autocorrect {
        config.uses_language_correction = autocorrect;
    }
    if !options.languages.is_empty() {
        config.languages = options.languages.clone();
    }
    if let Some(detect) = options.detect_language {
        config.detect_language = detect;
    }

    config
}
