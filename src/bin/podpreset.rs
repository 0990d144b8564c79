//! podpreset - PodPreset injection CLI tool
//!
//! Runs pods and admission requests through the injector against presets
//! read from YAML files.

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kube::core::admission::AdmissionReview;
use kube::core::DynamicObject;
use tracing::{info, warn, Dispatch};
use tracing_subscriber::EnvFilter;

use podpreset::admission::{parse_presets, MutationOutcome};
use podpreset::api::ObjectMetaExt;
use podpreset::config::{LogFormat, Settings};
use podpreset::{inject, Pod, PodPresetMutator, PresetStore};

#[derive(Debug, Parser)]
#[command(name = "podpreset", version, about = "PodPreset injection CLI tool")]
struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Namespace to evaluate in, overriding the pod's own
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Output location. Use '-' for stdout
    #[arg(short, long, global = true, default_value = "-")]
    output: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report every conflict between a pod and the presets selecting it
    Probe(PodArgs),
    /// Inject the presets selecting a pod and print the result
    Apply {
        #[command(flatten)]
        args: PodArgs,

        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
    /// Answer an AdmissionReview request
    Review {
        /// AdmissionReview file (JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Preset files (YAML)
        #[arg(short, long, required = true, num_args = 1..)]
        presets: Vec<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct PodArgs {
    /// Pod file (YAML or JSON)
    #[arg(long)]
    pod: PathBuf,

    /// Preset files (YAML)
    #[arg(short, long, required = true, num_args = 1..)]
    presets: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let settings = Settings::load(cli.config.as_deref())?;
    let dispatch = log_dispatch(&settings)?;
    tracing::dispatcher::set_global_default(dispatch.clone())
        .map_err(|e| format!("Failed to install log subscriber: {}", e))?;

    let mut output: Box<dyn Write> = if cli.output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            fs::File::create(&cli.output)
                .map_err(|e| format!("Failed to create output file {:?}: {}", cli.output, e))?,
        )
    };

    match cli.command {
        Command::Probe(args) => {
            let (pod, namespace, store) = load(&args, cli.namespace.as_deref(), &settings)?;
            let mutator = PodPresetMutator::new(store).with_dispatch(dispatch);
            probe(&mutator, &namespace, &pod, &mut output)
        }
        Command::Apply { args, format } => {
            let (pod, namespace, store) = load(&args, cli.namespace.as_deref(), &settings)?;
            let mutator = PodPresetMutator::new(store).with_dispatch(dispatch);
            apply(&mutator, &namespace, pod, format, &mut output)
        }
        Command::Review { request, presets } => {
            let store = preset_store(&presets, &settings)?;
            let mutator = PodPresetMutator::new(store).with_dispatch(dispatch);
            review(&mutator, &request, &mut output)
        }
    }
}

fn log_dispatch(settings: &Settings) -> Result<Dispatch, Box<dyn Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.log_filter)?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    Ok(match settings.log_format {
        LogFormat::Text => Dispatch::new(builder.finish()),
        LogFormat::Json => Dispatch::new(builder.json().finish()),
    })
}

fn read_presets(files: &[PathBuf]) -> Result<Vec<podpreset::PodPreset>, Box<dyn Error>> {
    let mut presets = Vec::new();
    for file in files {
        let content = fs::read_to_string(file)
            .map_err(|e| format!("Failed to read preset file {:?}: {}", file, e))?;
        let parsed = parse_presets(&content)
            .map_err(|e| format!("Failed to parse preset file {:?}: {}", file, e))?;
        presets.extend(parsed);
    }
    Ok(presets)
}

fn load(
    args: &PodArgs,
    namespace: Option<&str>,
    settings: &Settings,
) -> Result<(Pod, String, PresetStore), Box<dyn Error>> {
    let pod = read_pod(&args.pod)?;
    let namespace = match (namespace, pod.metadata.namespace()) {
        (Some(ns), _) => ns.to_string(),
        (None, "") => settings.namespace.clone(),
        (None, ns) => ns.to_string(),
    };
    info!(pod = %pod.display_name(), namespace = %namespace, "loaded pod");
    let store = preset_store(&args.presets, settings)?;
    Ok((pod, namespace, store))
}

fn preset_store(files: &[PathBuf], settings: &Settings) -> Result<PresetStore, Box<dyn Error>> {
    let store = PresetStore::from_presets(read_presets(files)?, &settings.namespace);
    if store.is_empty() {
        warn!(files = files.len(), "preset files hold no podpresets");
    } else {
        info!(presets = store.len(), "loaded podpresets");
    }
    Ok(store)
}

fn read_pod(file: &Path) -> Result<Pod, Box<dyn Error>> {
    let content = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read pod file {:?}: {}", file, e))?;
    let pod = serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse pod file {:?}: {}", file, e))?;
    Ok(pod)
}

fn probe(
    mutator: &PodPresetMutator<PresetStore>,
    namespace: &str,
    pod: &Pod,
    output: &mut dyn Write,
) -> Result<ExitCode, Box<dyn Error>> {
    let presets = mutator.matching_presets(namespace, pod)?;
    if presets.is_empty() {
        writeln!(output, "No podpresets match")?;
        return Ok(ExitCode::SUCCESS);
    }

    writeln!(output, "Matching podpresets:")?;
    for preset in &presets {
        writeln!(output, "  - {}", preset.name())?;
    }

    match inject::probe(pod, &presets) {
        Ok(_) => {
            writeln!(output, "No conflicts")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(conflicts) => {
            writeln!(output, "Conflicts:")?;
            for conflict in conflicts.iter() {
                writeln!(output, "  - {}", conflict)?;
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn apply(
    mutator: &PodPresetMutator<PresetStore>,
    namespace: &str,
    pod: Pod,
    format: Format,
    output: &mut dyn Write,
) -> Result<ExitCode, Box<dyn Error>> {
    let outcome = mutator.mutate(namespace, &pod)?;
    match &outcome {
        MutationOutcome::Excluded(reason) => eprintln!("Pod excluded: {}", reason),
        MutationOutcome::Unmatched => eprintln!("No podpresets match"),
        MutationOutcome::Conflicted { conflicts, .. } => {
            eprintln!("Pod left unchanged, conflicts:\n{}", conflicts)
        }
        MutationOutcome::Applied { presets, .. } => {
            eprintln!("Applied podpresets: {}", presets.join(", "))
        }
    }

    let result = outcome.into_pod(pod);
    match format {
        Format::Yaml => write!(output, "{}", serde_yaml::to_string(&result)?)?,
        Format::Json => writeln!(output, "{}", serde_json::to_string_pretty(&result)?)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn review(
    mutator: &PodPresetMutator<PresetStore>,
    file: &Path,
    output: &mut dyn Write,
) -> Result<ExitCode, Box<dyn Error>> {
    let content = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read request file {:?}: {}", file, e))?;
    let request: AdmissionReview<DynamicObject> = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse request file {:?}: {}", file, e))?;

    let answer = mutator.review(request);
    writeln!(output, "{}", serde_json::to_string_pretty(&answer)?)?;
    Ok(ExitCode::SUCCESS)
}
