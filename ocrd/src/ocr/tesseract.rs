use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use leptess::{LepTess, Variable};
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::engine::{
    NormalizedPoint, RawObservation, RecognitionConfig, RecognitionEngine, RecognitionLevel,
    TextCandidate,
};
use super::preprocessing::{prepare_for_engine, PreparedImage};
use super::vocabulary::Vocabulary;
use crate::config::OcrConfig;
use crate::error::PipelineError;
use crate::models::{LanguageTag, Revision};
use crate::pipeline::decode::Bitmap;

/// Tesseract language codes and the tags they are reported as.
const LANGUAGE_TABLE: &[(&str, &str)] = &[
    ("eng", "en"),
    ("deu", "de"),
    ("fra", "fr"),
    ("spa", "es"),
    ("ita", "it"),
    ("por", "pt"),
    ("nld", "nl"),
    ("swe", "sv"),
    ("dan", "da"),
    ("nor", "no"),
    ("fin", "fi"),
    ("pol", "pl"),
    ("ces", "cs"),
    ("slk", "sk"),
    ("hun", "hu"),
    ("ron", "ro"),
    ("tur", "tr"),
    ("ell", "el"),
    ("rus", "ru"),
    ("ukr", "uk"),
    ("bul", "bg"),
    ("heb", "he"),
    ("ara", "ar"),
    ("fas", "fa"),
    ("hin", "hi"),
    ("tha", "th"),
    ("vie", "vi"),
    ("ind", "id"),
    ("msa", "ms"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("chi_sim", "zh-Hans"),
    ("chi_tra", "zh-Hant"),
];

/// traineddata files that are not recognition languages.
const NON_LANGUAGE_DATA: &[&str] = &["osd", "equ"];

fn code_to_tag(code: &str) -> Option<LanguageTag> {
    LANGUAGE_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, tag)| *tag)
        .unwrap_or(code)
        .parse()
        .ok()
}

/// Map a tag back to a tesseract code: exact tag first, then a code given
/// verbatim, then the bare language subtag.
fn tag_to_code(tag: &LanguageTag, installed: &[String]) -> Option<String> {
    if let Some((code, _)) = LANGUAGE_TABLE.iter().find(|(_, t)| *t == tag.as_str()) {
        return Some(code.to_string());
    }
    if installed.iter().any(|code| code == tag.as_str()) {
        return Some(tag.as_str().to_string());
    }
    LANGUAGE_TABLE
        .iter()
        .find(|(_, t)| t.split('-').next() == Some(tag.language()))
        .map(|(code, _)| code.to_string())
}

/// Language codes of every `*.traineddata` file in `dir`, sorted.
fn scan_tessdata(dir: &Path) -> Option<Vec<String>> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut codes: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension()? != "traineddata" {
                return None;
            }
            let code = path.file_stem()?.to_str()?.to_string();
            (!NON_LANGUAGE_DATA.contains(&code.as_str())).then_some(code)
        })
        .collect();

    if codes.is_empty() {
        return None;
    }
    codes.sort();
    Some(codes)
}

fn default_tessdata_dirs() -> Vec<PathBuf> {
    match std::env::var("TESSDATA_PREFIX") {
        Ok(prefix) if !prefix.is_empty() => {
            let prefix = PathBuf::from(prefix);
            vec![prefix.clone(), prefix.join("tessdata")]
        }
        _ => Vec::new(),
    }
}

struct RevisionData {
    revision: Revision,
    data_path: Option<PathBuf>,
    /// Installed tesseract codes.
    installed: Vec<String>,
}

type HandleKey = (String, String);
type Handle = Arc<Mutex<LepTess>>;

enum Backend {
    Local,
    Unavailable { reason: String },
}

struct Shared {
    revisions: Vec<RevisionData>,
    default_languages: Vec<String>,
    max_image_dimension: u32,
    handles: StdMutex<LruCache<HandleKey, Handle>>,
}

/// Local Tesseract engine.
///
/// Each revision is a tessdata directory. Handles are created per
/// (revision, languages) pair on first use and kept in an LRU cache; a
/// handle serves one image at a time.
pub struct TesseractEngine {
    backend: Backend,
    shared: Arc<Shared>,
    timeout: Duration,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Self {
        let revisions: Vec<RevisionData> = config
            .revisions
            .iter()
            .map(|rev| {
                let dirs = match &rev.data_path {
                    Some(path) => vec![path.clone()],
                    None => default_tessdata_dirs(),
                };
                let installed = dirs
                    .iter()
                    .find_map(|dir| scan_tessdata(dir))
                    .unwrap_or_else(|| config.languages.clone());

                RevisionData {
                    revision: Revision::new(&rev.name),
                    data_path: rev.data_path.clone(),
                    installed,
                }
            })
            .collect();

        let capacity = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        let shared = Arc::new(Shared {
            revisions,
            default_languages: config.languages.clone(),
            max_image_dimension: config.max_image_dimension,
            handles: StdMutex::new(LruCache::new(capacity)),
        });

        let backend = match shared.revisions.first() {
            Some(first) => {
                let languages = shared.default_languages.join("+");
                match shared.handle(first, &languages) {
                    Ok(_) => {
                        info!(
                            revision = %first.revision,
                            languages = %languages,
                            "Tesseract OCR initialized"
                        );
                        Backend::Local
                    }
                    Err(e) => {
                        let reason = format!("Tesseract not available: {e}");
                        warn!("{}", reason);
                        Backend::Unavailable { reason }
                    }
                }
            }
            None => {
                let reason = "No OCR revisions configured".to_string();
                warn!("{}", reason);
                Backend::Unavailable { reason }
            }
        };

        Self {
            backend,
            shared,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, Backend::Unavailable { .. })
    }
}

impl Shared {
    fn revision(&self, revision: &Revision) -> Option<&RevisionData> {
        self.revisions.iter().find(|r| &r.revision == revision)
    }

    /// Tesseract language string (`eng+deu`) for a request.
    fn language_string(&self, revision: &RevisionData, config: &RecognitionConfig) -> String {
        let mut codes: Vec<String> = Vec::new();

        if !config.languages.is_empty() {
            for tag in &config.languages {
                match tag_to_code(tag, &revision.installed) {
                    Some(code) if !codes.contains(&code) => codes.push(code),
                    Some(_) => {}
                    None => debug!(language = %tag, "No tesseract language for tag, skipping"),
                }
            }
        } else if config.detect_language {
            codes = revision.installed.clone();
        }

        if codes.is_empty() {
            codes = self.default_languages.clone();
        }
        codes.join("+")
    }

    fn handle(&self, revision: &RevisionData, languages: &str) -> Result<Handle, String> {
        let key = (revision.revision.as_str().to_string(), languages.to_string());

        let mut handles = self
            .handles
            .lock()
            .map_err(|_| "Tesseract handle cache poisoned".to_string())?;
        if let Some(handle) = handles.get(&key) {
            return Ok(Arc::clone(handle));
        }

        let data_path = revision
            .data_path
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned());
        let lt = LepTess::new(data_path.as_deref(), languages).map_err(|e| e.to_string())?;
        debug!(revision = %revision.revision, languages, "Created tesseract handle");

        let handle = Arc::new(Mutex::new(lt));
        handles.put(key, Arc::clone(&handle));
        Ok(handle)
    }

    /// Pick the handle for a request and build the engine input. Blocking:
    /// may load traineddata and re-encodes the image.
    fn prepare(&self, bitmap: &Bitmap, config: &RecognitionConfig) -> Result<Job, String> {
        let revision = self
            .revision(&config.revision)
            .ok_or_else(|| format!("Unknown revision {}", config.revision))?;
        let languages = self.language_string(revision, config);

        let image = prepare_for_engine(bitmap.image(), self.max_image_dimension)
            .map_err(|e| format!("Failed to prepare image: {e}"))?;
        let handle = self.handle(revision, &languages)?;

        Ok(Job { handle, image })
    }
}

struct Job {
    handle: Handle,
    image: PreparedImage,
}

/// Run one image on a handle the caller already holds.
fn recognize_locked(
    lt: &mut LepTess,
    image: &PreparedImage,
    config: &RecognitionConfig,
) -> Result<Vec<RawObservation>, String> {
    let invert = match config.level {
        RecognitionLevel::Fast => "0",
        RecognitionLevel::Accurate => "1",
    };
    lt.set_variable(Variable::TesseditDoInvert, invert)
        .map_err(|e| format!("Failed to set recognition level: {e}"))?;
    let correction = if config.uses_language_correction { "1" } else { "0" };
    lt.set_variable(Variable::TesseditEnableDictCorrection, correction)
        .map_err(|e| format!("Failed to set language correction: {e}"))?;

    lt.set_image_from_mem(&image.png)
        .map_err(|e| format!("Failed to set image: {e}"))?;
    let tsv = lt
        .get_tsv_text(0)
        .map_err(|e| format!("Failed to extract text: {e}"))?;

    let mut observations = parse_tsv(&tsv, image.width, image.height);
    if config.uses_language_correction {
        if let Some(vocabulary) = Vocabulary::new(&config.custom_words) {
            apply_vocabulary(&mut observations, &vocabulary);
        }
    }
    Ok(observations)
}

fn apply_vocabulary(observations: &mut [RawObservation], vocabulary: &Vocabulary) {
    for candidate in observations.iter_mut().flat_map(|o| o.candidates.iter_mut()) {
        candidate.text = vocabulary.correct(&candidate.text);
    }
}

/// Lock `handle` without occupying a blocking thread, then run `work` on it
/// in the blocking pool. The guard moves into the blocking task, so a caller
/// that gives up only leaves that one task holding the handle.
async fn with_handle<T, R, F>(handle: Arc<Mutex<T>>, work: F) -> Result<R, String>
where
    T: Send + 'static,
    R: Send + 'static,
    F: FnOnce(&mut T) -> R + Send + 'static,
{
    let mut guard = handle.lock_owned().await;
    tokio::task::spawn_blocking(move || work(&mut *guard))
        .await
        .map_err(|e| format!("Tesseract task panicked: {e}"))
}

async fn recognize_with(
    shared: Arc<Shared>,
    bitmap: Bitmap,
    config: RecognitionConfig,
) -> Result<Vec<RawObservation>, String> {
    let job = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || shared.prepare(&bitmap, &config))
            .await
            .map_err(|e| format!("Tesseract task panicked: {e}"))??
    };

    let Job { handle, image } = job;
    with_handle(handle, move |lt| recognize_locked(lt, &image, &config)).await?
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn revisions(&self) -> Vec<Revision> {
        self.shared
            .revisions
            .iter()
            .map(|r| r.revision.clone())
            .collect()
    }

    fn default_revision(&self) -> Revision {
        self.shared
            .revisions
            .first()
            .map(|r| r.revision.clone())
            .unwrap_or_else(|| Revision::new(crate::config::DEFAULT_REVISION))
    }

    fn supported_languages(&self, revision: &Revision) -> Option<Vec<LanguageTag>> {
        self.shared.revision(revision).map(|r| {
            r.installed
                .iter()
                .filter_map(|code| code_to_tag(code))
                .collect()
        })
    }

    fn defaults(&self) -> RecognitionConfig {
        RecognitionConfig {
            revision: self.default_revision(),
            level: RecognitionLevel::Accurate,
            custom_words: Vec::new(),
            uses_language_correction: true,
            languages: Vec::new(),
            detect_language: false,
        }
    }

    async fn recognize(
        &self,
        bitmap: &Bitmap,
        config: &RecognitionConfig,
    ) -> Result<Vec<RawObservation>, PipelineError> {
        if let Backend::Unavailable { reason } = &self.backend {
            debug!(reason = %reason, "Recognition requested while tesseract is unavailable");
            return Err(PipelineError::RecognitionFailed);
        }

        let work = recognize_with(Arc::clone(&self.shared), bitmap.clone(), config.clone());

        match tokio::time::timeout(self.timeout, work).await {
            Ok(Ok(observations)) => Ok(observations),
            Ok(Err(e)) => {
                warn!(error = %e, "Tesseract recognition failed");
                Err(PipelineError::RecognitionFailed)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Tesseract recognition timed out"
                );
                Err(PipelineError::RecognitionFailed)
            }
        }
    }
}

#[derive(Default)]
struct LineAccumulator {
    bounds: Option<(u32, u32, u32, u32)>,
    words: Vec<String>,
    confidences: Vec<f32>,
}

/// Turn tesseract TSV into one observation per text line, normalized against
/// a `width` x `height` image.
///
/// Columns: level, page, block, par, line, word, left, top, width, height,
/// conf, text. Level 4 rows carry the line box, level 5 rows its words.
fn parse_tsv(tsv: &str, width: u32, height: u32) -> Vec<RawObservation> {
    let mut lines: Vec<((u32, u32, u32, u32), LineAccumulator)> = Vec::new();

    for row in tsv.lines() {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 11 {
            continue;
        }
        let Ok(level) = cols[0].parse::<u32>() else {
            continue;
        };
        if level != 4 && level != 5 {
            continue;
        }

        let nums: Option<Vec<u32>> = cols[1..10].iter().map(|c| c.parse().ok()).collect();
        let Some(nums) = nums else {
            continue;
        };
        let key = (nums[0], nums[1], nums[2], nums[3]);
        let bounds = (nums[5], nums[6], nums[7], nums[8]);

        let index = match lines.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                lines.push((key, LineAccumulator::default()));
                lines.len() - 1
            }
        };
        let line = &mut lines[index].1;

        if level == 4 {
            line.bounds = Some(bounds);
            continue;
        }

        let text = cols.get(11).map(|t| t.trim()).unwrap_or("");
        let conf = cols[10].trim().parse::<f32>().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }
        line.words.push(text.to_string());
        line.confidences.push(conf);
        if line.bounds.is_none() {
            line.bounds = Some(bounds);
        }
    }

    let max_x = f64::from(width.saturating_sub(1).max(1));
    let max_y = f64::from(height.saturating_sub(1).max(1));

    lines
        .into_iter()
        .filter_map(|(_, line)| {
            if line.words.is_empty() {
                return None;
            }
            let (left, top, w, h) = line.bounds?;
            let confidence = (line.confidences.iter().sum::<f32>()
                / line.confidences.len() as f32
                / 100.0)
                .clamp(0.0, 1.0);

            Some(RawObservation {
                top_left: NormalizedPoint::new(
                    f64::from(left) / max_x,
                    1.0 - f64::from(top) / max_y,
                ),
                bottom_right: NormalizedPoint::new(
                    f64::from(left + w) / max_x,
                    1.0 - f64::from(top + h) / max_y,
                ),
                confidence,
                candidates: vec![TextCandidate {
                    text: line.words.join(" "),
                    confidence,
                }],
            })
        })
        .collect()
}
