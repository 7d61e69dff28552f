//! whisper.cpp backend via `whisper-rs`.
//!
//! Requires the `whisper` feature (and cmake to build). The pipeline itself
//! never depends on this module; it is one possible `SpeechEngine`
//! implementor, wired in by the host.

use std::path::PathBuf;

use tracing::debug;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::error::{Result, ScribaError};
use crate::inference::{DecodeOptions, RawSegment, RawToken, SpeechEngine};

/// Configuration for the whisper backend.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to a ggml model file (see `crate::models::discover`).
    pub model_path: PathBuf,
    /// Language code (e.g. "en"); `None` lets the model detect it.
    pub language: Option<String>,
    /// Inference threads; `None` uses the library default.
    pub threads: Option<i32>,
}

/// `SpeechEngine` backed by a whisper.cpp context.
pub struct WhisperEngine {
    context: WhisperContext,
    config: WhisperConfig,
    eot_id: i32,
}

impl WhisperEngine {
    /// Load the model at `config.model_path`.
    ///
    /// # Errors
    /// `ScribaError::ModelNotFound` when the file does not exist,
    /// `ScribaError::Recognition` when whisper.cpp rejects it.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(ScribaError::ModelNotFound {
                path: config.model_path.clone(),
            });
        }

        let path = config.model_path.to_str().ok_or_else(|| {
            ScribaError::Recognition("invalid UTF-8 in model path".to_string())
        })?;
        let context =
            WhisperContext::new_with_params(path, WhisperContextParameters::default())
                .map_err(|e| ScribaError::Recognition(format!("model load failed: {e}")))?;
        let eot_id = context.token_eot();

        Ok(Self {
            context,
            config,
            eot_id,
        })
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    fn build_params<'a>(&'a self, options: &DecodeOptions) -> FullParams<'a, 'a> {
        // Only greedy decoding is exposed; `options.greedy` is always set by
        // the pipeline and beam search is not worth the latency here.
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_translate(false);
        params.set_no_context(options.no_context);
        params.set_suppress_non_speech_tokens(options.suppress_non_speech);
        params.set_token_timestamps(options.token_timestamps);
        params.set_max_len(if options.max_segment_length { 1 } else { 0 });
        params.set_split_on_word(options.split_on_word);
        params.set_language(self.config.language.as_deref());
        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads);
        }
        params
    }
}

impl SpeechEngine for WhisperEngine {
    fn warm_up(&mut self) -> Result<()> {
        // Weights are resident after `new`; nothing further to prime.
        debug!(model = %self.config.model_path.display(), "whisper context ready");
        Ok(())
    }

    fn transcribe(&mut self, samples: &[f32], options: &DecodeOptions) -> Result<Vec<RawSegment>> {
        let params = self.build_params(options);
        let mut state = self
            .context
            .create_state()
            .map_err(|e| ScribaError::Recognition(format!("state creation failed: {e}")))?;
        state
            .full(params, samples)
            .map_err(|e| ScribaError::Recognition(format!("decode failed: {e}")))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| ScribaError::Recognition(format!("segment count failed: {e}")))?;

        let mut segments = Vec::with_capacity(n_segments as usize);
        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| ScribaError::Recognition(format!("segment text failed: {e}")))?;
            let start_cs = state
                .full_get_segment_t0(i)
                .map_err(|e| ScribaError::Recognition(format!("segment t0 failed: {e}")))?;
            let end_cs = state
                .full_get_segment_t1(i)
                .map_err(|e| ScribaError::Recognition(format!("segment t1 failed: {e}")))?;

            let mut tokens = Vec::new();
            if options.token_timestamps {
                let n_tokens = state
                    .full_n_tokens(i)
                    .map_err(|e| ScribaError::Recognition(format!("token count failed: {e}")))?;
                tokens.reserve(n_tokens as usize);
                for j in 0..n_tokens {
                    let data = state.full_get_token_data(i, j).map_err(|e| {
                        ScribaError::Recognition(format!("token data failed: {e}"))
                    })?;
                    let token_text = state.full_get_token_text(i, j).map_err(|e| {
                        ScribaError::Recognition(format!("token text failed: {e}"))
                    })?;
                    tokens.push(RawToken {
                        start_cs: data.t0,
                        end_cs: data.t1,
                        text: token_text,
                        probability: data.p,
                        id: data.id,
                    });
                }
            }

            segments.push(RawSegment {
                start_cs,
                end_cs,
                text,
                tokens,
            });
        }
        Ok(segments)
    }

    fn end_of_text_id(&self) -> i32 {
        self.eot_id
    }

    fn reset(&mut self) {
        // Each transcribe call uses a fresh state; nothing persists.
        debug!("WhisperEngine::reset");
    }
}
