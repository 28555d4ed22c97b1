use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use tritts_core::{MissingSegmentPolicy, ReferenceVoice, RunConfig};
use tritts_engine::{GrpcTransport, InferenceTransport, NullTransport, StrategyRegistry, Synthesizer};

#[derive(Parser)]
#[command(name = "tritts", about = "Streaming text-to-speech client for Triton")]
struct Cli {
    /// Triton server address
    #[arg(long, default_value = "localhost")]
    server_addr: String,

    /// Triton gRPC port
    #[arg(long, default_value_t = 8001)]
    server_port: u16,

    /// Model to run: f5_tts, spark_tts or cosyvoice2
    #[arg(long, default_value = "cosyvoice2")]
    model_name: String,

    /// Reference (prompt) audio, required unless the speaker cache is used
    #[arg(long)]
    reference_audio: Option<PathBuf>,

    /// Transcript of the reference audio
    #[arg(long, default_value = "")]
    reference_text: String,

    /// Text to synthesize
    #[arg(long)]
    target_text: String,

    /// Where to write the synthesized WAV
    #[arg(long, default_value = "output.wav")]
    output_path: PathBuf,

    /// Sample rate of the synthesized audio
    #[arg(long, default_value_t = 24000)]
    target_sr: u32,

    /// Seconds of cross-fade between streamed chunks
    #[arg(long, default_value_t = 0.1)]
    chunk_overlap_duration: f64,

    /// Minimum words per segment
    #[arg(long, default_value_t = 10)]
    min_words: usize,

    /// Maximum words per segment before a forced split
    #[arg(long, default_value_t = 30)]
    max_words: usize,

    /// Use the speaker profile cached on the server instead of sending reference audio
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    use_spk2info_cache: bool,

    /// Seconds to wait for each streamed response
    #[arg(long, default_value_t = 30.0)]
    timeout_secs: f64,

    /// Minimum pause between segment launches, in seconds
    #[arg(long, default_value_t = 1.0)]
    min_delay: f64,

    /// Maximum pause between segment launches, in seconds
    #[arg(long, default_value_t = 2.0)]
    max_delay: f64,

    /// Streams open at once (0 = one per segment, no cap)
    #[arg(long, default_value_t = 0)]
    max_concurrency: usize,

    /// Fail instead of leaving gaps when a segment produces no audio
    #[arg(long)]
    strict: bool,

    /// Run the pipeline against an offline transport that returns silence
    #[arg(long)]
    dry_run: bool,

    /// Skip the server liveness probe
    #[arg(long)]
    skip_health_check: bool,

    /// Tracing filter directive
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let secs = |name: &str, value: f64| -> Result<Duration> {
            Duration::try_from_secs_f64(value)
                .with_context(|| format!("--{name} must be a non-negative number of seconds"))
        };

        Ok(RunConfig {
            server_addr: self.server_addr.clone(),
            server_port: self.server_port,
            model_name: self.model_name.clone(),
            min_words: self.min_words,
            max_words: self.max_words,
            chunk_overlap_duration: self.chunk_overlap_duration,
            output_sample_rate: self.target_sr,
            cache_mode: self.use_spk2info_cache,
            receive_timeout: secs("timeout-secs", self.timeout_secs)?,
            min_launch_delay: secs("min-delay", self.min_delay)?,
            max_launch_delay: secs("max-delay", self.max_delay)?,
            max_concurrency: self.max_concurrency,
            missing_policy: if self.strict {
                MissingSegmentPolicy::Fail
            } else {
                MissingSegmentPolicy::Skip
            },
            ..RunConfig::default()
        })
    }
}

fn load_reference(cli: &Cli, config: &RunConfig) -> Result<Option<ReferenceVoice>> {
    if config.cache_mode {
        if cli.reference_audio.is_some() {
            tracing::info!("speaker cache enabled, reference audio will not be sent");
        }
        return Ok(None);
    }

    let Some(path) = &cli.reference_audio else {
        bail!("--reference-audio is required when --use-spk2info-cache is false");
    };
    if cli.reference_text.trim().is_empty() {
        bail!("--reference-text is required when --use-spk2info-cache is false");
    }

    let wav = tritts_audio::load_mono(path, config.reference_sample_rate)
        .with_context(|| format!("failed to load reference audio {:?}", path))?;
    tracing::info!(
        "loaded reference audio {:?}: {:.2}s at {}Hz",
        path,
        wav.frames() as f64 / wav.sample_rate as f64,
        wav.sample_rate
    );

    Ok(Some(ReferenceVoice {
        samples: wav.samples,
        channels: wav.channels,
        sample_rate: wav.sample_rate,
        text: cli.reference_text.clone(),
    }))
}

async fn connect(cli: &Cli, config: &RunConfig) -> Result<Arc<dyn InferenceTransport>> {
    if cli.dry_run {
        tracing::info!("dry run, using offline transport");
        return Ok(Arc::new(NullTransport::new(config.output_sample_rate)));
    }

    let url = config.server_url();
    let transport = GrpcTransport::new(&url).with_context(|| format!("invalid server url {url}"))?;

    if !cli.skip_health_check {
        let live = transport
            .is_live()
            .await
            .with_context(|| format!("failed to reach server at {url}"))?;
        if !live {
            bail!("server at {url} is not live");
        }
        tracing::info!("server at {url} is live");
    }

    Ok(Arc::new(transport))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let config = cli.run_config()?;
    let registry = StrategyRegistry::new();
    if registry.create(&config.model_name, 0).is_err() {
        bail!(
            "unknown model '{}', expected one of: {}",
            config.model_name,
            registry.list_models().join(", ")
        );
    }

    tracing::info!(
        model = %config.model_name,
        cache = config.cache_mode,
        "tritts starting"
    );

    let reference = load_reference(&cli, &config)?;
    let transport = connect(&cli, &config).await?;

    let synthesizer = Synthesizer::with_registry(config.clone(), transport, reference, &registry)
        .context("failed to configure synthesizer")?;
    let (audio, stats) = synthesizer
        .synthesize(&cli.target_text)
        .await
        .context("synthesis failed")?;

    tritts_audio::write_wav(&cli.output_path, &audio, config.output_sample_rate)
        .with_context(|| format!("failed to write {:?}", cli.output_path))?;

    tracing::info!("wrote {:?}", cli.output_path);
    tracing::info!("total time: {:.3}s", stats.total_time.as_secs_f64());
    tracing::info!(
        "segments: {} ({} succeeded, failed: {:?})",
        stats.num_segments,
        stats.succeeded,
        stats.failed
    );
    if let Some(ttfb) = stats.avg_first_chunk_latency {
        tracing::info!("average first chunk latency: {:.3}s", ttfb.as_secs_f64());
    }
    tracing::info!(
        "audio duration: {:.3}s",
        stats.audio_duration_secs(config.output_sample_rate)
    );
    if let Some(rtf) = stats.real_time_factor(config.output_sample_rate) {
        tracing::info!("RTF: {:.4}", rtf);
    }

    Ok(())
}
