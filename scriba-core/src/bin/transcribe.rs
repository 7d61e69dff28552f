//! WAV → transcription features, printed as JSON lines.
//!
//! Drives the full pipeline over a file: blocks are fed at a fixed size to
//! mimic a streaming host, boundaries may be supplied in seconds, and each
//! emitted feature is printed as one JSON object per line. Uses the stub
//! engine unless built with the `whisper` feature and given `--model`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use scriba_core::{PipelineConfig, SpeechEngine, SplitMode, StubEngine, TranscriptionPipeline};

#[derive(Debug)]
struct Args {
    input: PathBuf,
    block_len: usize,
    boundaries: Vec<f64>,
    split_mode: SplitMode,
    keep_non_speech: bool,
    model: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut input: Option<PathBuf> = None;
    let mut block_len = 4096usize;
    let mut boundaries = Vec::new();
    let mut split_mode = SplitMode::Tokens;
    let mut keep_non_speech = false;
    let mut model: Option<PathBuf> = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--block" => {
                let v = it.next().context("missing value for --block")?;
                block_len = v.parse().context("invalid value for --block")?;
                if block_len == 0 {
                    bail!("--block must be at least 1");
                }
            }
            "--boundaries" => {
                let v = it.next().context("missing value for --boundaries")?;
                for part in v.split(',').filter(|p| !p.is_empty()) {
                    boundaries.push(
                        part.trim()
                            .parse::<f64>()
                            .with_context(|| format!("invalid boundary time: {part}"))?,
                    );
                }
            }
            "--split" => {
                let v = it.next().context("missing value for --split")?;
                split_mode = match v.as_str() {
                    "sentences" => SplitMode::Sentences,
                    "words" => SplitMode::Words,
                    "tokens" => SplitMode::Tokens,
                    other => bail!("unknown split mode: {other}"),
                };
            }
            "--keep-non-speech" => keep_non_speech = true,
            "--model" => {
                let v = it.next().context("missing value for --model")?;
                model = Some(PathBuf::from(v));
            }
            "--help" | "-h" => {
                println!(
                    "Usage: transcribe <file.wav> [--block <samples>] [--boundaries <s,s,...>] \\
  [--split sentences|words|tokens] [--keep-non-speech] [--model <ggml.bin>]"
                );
                std::process::exit(0);
            }
            other if input.is_none() && !other.starts_with('-') => {
                input = Some(PathBuf::from(other));
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(Args {
        input: input.context("no input file given (see --help)")?,
        block_len,
        boundaries,
        split_mode,
        keep_non_speech,
        model,
    })
}

fn read_wav_mono_f32(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample <= 16 {
                reader
                    .samples::<i16>()
                    .map(|s| s.map(|v| f32::from(v) / f32::from(i16::MAX)))
                    .collect::<Result<_, _>>()?
            } else {
                let max = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max))
                    .collect::<Result<_, _>>()?
            }
        }
    };

    if channels == 1 {
        return Ok((interleaved, spec.sample_rate));
    }
    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks(channels) {
        mono.push(frame.iter().copied().sum::<f32>() / channels as f32);
    }
    Ok((mono, spec.sample_rate))
}

fn build_engine(model: Option<PathBuf>) -> Result<Box<dyn SpeechEngine>> {
    match model {
        None => Ok(Box::new(StubEngine::new())),
        #[cfg(feature = "whisper")]
        Some(path) => {
            let engine = scriba_core::WhisperEngine::new(scriba_core::WhisperConfig {
                model_path: path,
                language: None,
                threads: None,
            })?;
            Ok(Box::new(engine))
        }
        #[cfg(not(feature = "whisper"))]
        Some(_) => bail!("--model requires a build with the 'whisper' feature"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let (samples, sample_rate) = read_wav_mono_f32(&args.input)?;

    let config = PipelineConfig {
        split_mode: args.split_mode,
        suppress_non_speech: !args.keep_non_speech,
        ..PipelineConfig::default()
    };
    let mut pipeline = TranscriptionPipeline::new(config, build_engine(args.model)?);
    pipeline.warm_up()?;
    pipeline.prepare(f64::from(sample_rate))?;
    pipeline.boundaries_from_seconds(&args.boundaries);

    let mut emitted = 0usize;
    for block in samples.chunks(args.block_len) {
        for feature in pipeline.process(block)? {
            println!("{}", serde_json::to_string(&feature)?);
            emitted += 1;
        }
    }
    for feature in pipeline.flush()? {
        println!("{}", serde_json::to_string(&feature)?);
        emitted += 1;
    }

    eprintln!(
        "{}: {} samples at {} Hz, {} features",
        args.input.display(),
        samples.len(),
        sample_rate,
        emitted
    );
    Ok(())
}
