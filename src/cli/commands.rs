use crate::{
    cli::args::{CompileArgs, DotArgs, ValidateArgs},
    core::{
        config::CONFIG_FILE_NAME,
        state_machine::{dot::pipeline_to_dot, StateKind},
        CompiledPipeline, Compiler, ConfigLoader, ConfigValidator, MorphflowConfig,
        PipelineManifest,
    },
    utils::serialization::{encode, FileSerializer, FileUtils},
    Result,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// Manifest, effective configuration and the compiled artifact.
struct Compiled {
    manifest: PipelineManifest,
    config: MorphflowConfig,
    pipeline: CompiledPipeline,
}

fn config_path(manifest: &Path, explicit: Option<&PathBuf>) -> PathBuf {
    match explicit {
        Some(path) => path.clone(),
        None => manifest_dir(manifest).join(CONFIG_FILE_NAME),
    }
}

/// Directory holding the manifest; `.` for a bare file name.
pub fn manifest_dir(manifest: &Path) -> PathBuf {
    match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn compile_manifest(manifest_path: &Path, config: Option<&PathBuf>) -> Result<Compiled> {
    let config = ConfigLoader::load(&config_path(manifest_path, config))?;
    ConfigValidator::validate(&config)?;

    let manifest = PipelineManifest::load_from_file(manifest_path)?;
    let ast = manifest.build()?;
    let options = config.compiler_options(&manifest)?;
    let pipeline = Compiler::new(options).compile_ast(&ast)?;
    warn_on_shared_dead_letter_queue(&pipeline);

    info!(
        pipeline = manifest.name(),
        manifest = %manifest_path.display(),
        "manifest compiled"
    );
    Ok(Compiled {
        manifest,
        config,
        pipeline,
    })
}

fn warn_on_shared_dead_letter_queue(pipeline: &CompiledPipeline) {
    let states = pipeline.state_machine.chain.all_states();
    let sink = states.iter().find_map(|state| match &state.kind {
        StateKind::SendToQueue { queue } => Some(queue),
        _ => None,
    });
    let dead_letter = states.iter().find_map(|state| match &state.kind {
        StateKind::CatchAndForward { target } => Some(target),
        _ => None,
    });
    if let (Some(sink), Some(dead_letter)) = (sink, dead_letter) {
        if sink == dead_letter {
            warn!(
                queue = %sink.id,
                "dead-letter queue is also the pipeline sink; consumers must tell results and failures apart"
            );
        }
    }
}

fn emit(output: Option<&PathBuf>, content: &[u8]) -> Result<()> {
    match output {
        Some(path) => FileUtils.write_bytes(path, content),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(content)?;
            handle.flush()?;
            Ok(())
        }
    }
}

pub fn compile(args: CompileArgs) -> Result<()> {
    let compiled = compile_manifest(&args.manifest, args.config.as_ref())?;
    let format = args.format.unwrap_or(compiled.config.output.format);
    let content = encode(format, &compiled.pipeline.to_document())?;
    emit(args.output.as_ref(), &content)?;
    if let Some(path) = &args.output {
        info!(path = %path.display(), %format, "artifact written");
    }
    Ok(())
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    let compiled = compile_manifest(&args.manifest, args.config.as_ref())?;
    let machine = &compiled.pipeline.state_machine;
    let sink = match compiled.manifest.pipeline.steps.last() {
        Some(step) => step.name(),
        None => "none",
    };
    println!(
        "{}: ok ({} states, start at {}, sink {}, trigger on {})",
        compiled.manifest.name(),
        machine.chain.all_states().len(),
        machine.start_at().unwrap_or_default(),
        sink,
        compiled.pipeline.rule.pattern.detail_type.join(", ")
    );
    Ok(())
}

pub fn dot(args: DotArgs) -> Result<()> {
    let compiled = compile_manifest(&args.manifest, args.config.as_ref())?;
    let mut rendered = pipeline_to_dot(&compiled.pipeline);
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    emit(args.output.as_ref(), rendered.as_bytes())
}
