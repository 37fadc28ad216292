use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use socksense::config::{default_activities, PipelineConfig};
use socksense::pipeline::classifier::ModelArtifact;
use socksense::pipeline::engine::ActivityEngine;
use socksense::pipeline::features::FeatureExtractor;
use socksense::pipeline::source::SampleSource;
use socksense::quality::{validate_recording, QualityConfig};
use socksense::recording::{parse_recording_name, read_recording};
use socksense::sim::SyntheticGait;
use socksense::table::TableBuilder;

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("featurize") => featurize(
            args.get(2).context("usage: featurize <input_dir> <output.csv>")?,
            args.get(3).context("usage: featurize <input_dir> <output.csv>")?,
        ),
        Some("validate") => validate(args.get(2).context("usage: validate <recording.csv>")?),
        Some("demo") => demo(args.get(2).map(String::as_str)),
        _ => {
            eprintln!("usage: socksense <featurize|validate|demo> [...]");
            eprintln!("  featurize <input_dir> <output.csv>   build a training feature table");
            eprintln!("  validate <recording.csv>             quality-check a raw recording");
            eprintln!("  demo [model.json]                    classify a synthetic walking session");
            Ok(())
        }
    }
}

/// Batch path: every raw recording in a directory becomes labelled rows of
/// one feature table, using the same extractor the live engine runs.
fn featurize(input_dir: &str, output: &str) -> Result<()> {
    let config = PipelineConfig::default();
    let extractor = FeatureExtractor::new(config.layout.clone(), config.window.sample_rate_hz);
    let activities = default_activities();
    let mut builder = TableBuilder::new(&extractor, config.window);

    let mut paths: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .with_context(|| format!("reading {input_dir}"))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "csv"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        bail!("no CSV recordings found in {input_dir}");
    }

    let mut total = 0usize;
    for path in &paths {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let (subject, label) = parse_recording_name(filename, &activities);
        let samples = read_recording(path, &config.layout)?;
        total += builder.add_recording(&samples, &label, &subject)?;
    }

    let table = builder.finish();
    table.write_csv(Path::new(output))?;
    println!(
        "{} windows from {} recordings -> {output} ({} feature columns)",
        total,
        paths.len(),
        table.columns.len()
    );
    Ok(())
}

fn validate(path: &str) -> Result<()> {
    let config = PipelineConfig::default();
    let samples = read_recording(Path::new(path), &config.layout)?;
    let report = validate_recording(
        &samples,
        &config.layout,
        &QualityConfig::default(),
        config.window.sample_rate_hz,
    );
    println!("{} samples", report.sample_count);
    for issue in &report.issues {
        println!("ISSUE: {issue}");
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    if report.passed() {
        println!("OK");
        Ok(())
    } else {
        bail!("recording failed quality checks");
    }
}

/// Live path against a synthetic walking session. With no model argument a
/// toy two-centroid artifact is built in place so the loop has something
/// to call.
fn demo(model_path: Option<&str>) -> Result<()> {
    let config = PipelineConfig::default();
    let artifact = match model_path {
        Some(path) => ModelArtifact::load(Path::new(path))?,
        None => toy_artifact(&config),
    };
    let (model, scaler) = artifact.into_parts();
    let mut engine = ActivityEngine::new(config, model, scaler)?;

    let mut source = SyntheticGait::walking(9, 30 * 50); // 30 seconds
    while let Some(sample) = source.next_sample()? {
        if let Some(update) = engine.ingest(sample)? {
            println!(
                "activity: {:<20} confidence: {:.2}  steps: {}",
                update.label, update.confidence, update.step_count
            );
        }
    }
    let summary = engine.summary();
    println!(
        "session: {} samples, {} windows, {} steps, mean latency {:.2} ms",
        summary.samples, summary.windows, summary.steps, summary.mean_latency_ms
    );
    Ok(())
}

/// Two standard-space centroids biased apart on the pressure-variance
/// features; enough for the demo loop to flip labels plausibly.
fn toy_artifact(config: &PipelineConfig) -> ModelArtifact {
    use socksense::pipeline::classifier::FeatureScaler;
    use socksense::pipeline::features::FeatureSchema;

    let schema = FeatureSchema::for_layout(&config.layout);
    let width = schema.len();
    let mut walking = vec![0.0; width];
    let mut standing = vec![0.0; width];
    for (i, name) in schema.names().iter().enumerate() {
        if name.ends_with("_std") || name.ends_with("_range") || name.ends_with("_zcr") {
            walking[i] = 1.0;
            standing[i] = -1.0;
        }
    }
    ModelArtifact {
        feature_names: schema.names().to_vec(),
        classes: vec!["walking_forward".into(), "standing_upright".into()],
        scaler: FeatureScaler::identity(width),
        centroids: vec![walking, standing],
    }
}
