mod cli;

use anyhow::Context;
use spacectx::context::ContextValues;
use spacectx::documents::Documents;
use std::path::Path;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_env("SPACECTX_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.logging.level().to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Generate(generate_cli) => generate(generate_cli),
        cli::Command::Process(process_cli) => process(process_cli),
        cli::Command::Inspect(inspect_cli) => inspect(inspect_cli),
    };

    if let Err(e) = command_result {
        report(&e);
        std::process::exit(1);
    }
}

fn report(e: &anyhow::Error) {
    for error in e.chain() {
        eprintln!("{error}")
    }
}

pub fn generate(cli: cli::GenerateCommand) -> anyhow::Result<()> {
    let context_name = cli
        .name
        .filter(|name| !name.is_empty())
        .context("context name is not set, use --name or TF_VAR_spacelift_stack_id")?;
    tracing::debug!(%context_name, "using context name");

    let mut documents = Documents::default();
    documents.load_path(&cli.path)?;

    let outputs = spacectx::outputs::collect_outputs(&documents)?;
    if outputs.is_empty() {
        tracing::info!("No outputs defined, skipping.");
        return Ok(());
    }

    let provider_requirement_exists = documents.has_provider_requirement(spacectx::PROVIDER_NAME);
    let generator =
        spacectx::generate::ContextGenerator::new(context_name, cli.provider_version);
    let files = generator.generate(&outputs, provider_requirement_exists)?;

    write(&cli.output, &files.context)?;
    tracing::info!(path=%cli.output.display(), outputs=outputs.len(), "Finished creating spacelift context file");

    // the override is only written next to an existing context file
    if let Some(provider_requirements) = &files.provider_requirements {
        let override_path = cli
            .output
            .parent()
            .unwrap_or(Path::new(""))
            .join(spacectx::PROVIDER_OVERRIDE_FILE);

        write(&override_path, provider_requirements)?;
        tracing::info!(path=%override_path.display(), "Created provider requirements");
    }

    Ok(())
}

pub fn process(cli: cli::ProcessCommand) -> anyhow::Result<()> {
    match process_file(&cli) {
        Err(e) if cli.ignore_errors => {
            report(&e);
            tracing::warn!("ignoring errors as requested");
            Ok(())
        }
        result => result,
    }
}

fn process_file(cli: &cli::ProcessCommand) -> anyhow::Result<()> {
    std::fs::symlink_metadata(&cli.file)
        .with_context(|| format!("Failed to stat {}", cli.file.display()))?;

    anyhow::ensure!(
        cli.file.extension().is_some_and(|extension| extension == "tfvars"),
        "Can only process tfvars files"
    );

    let mut documents = Documents::default();
    documents.load_file(&cli.file)?;

    let processed = spacectx::resolve::process(&documents, &cli.source.folder)?;

    match &cli.output {
        Some(path) => write(path, &processed)?,
        None => print!("{processed}"),
    }

    Ok(())
}

/// (spacectx-)developer utility
///
/// A quick way to check what `process` would see for a context
pub fn inspect(cli: cli::InspectCommand) -> anyhow::Result<()> {
    let values = spacectx::context::load_context(&cli.source.folder, &cli.name);
    output(&cli.format, &values)
}

fn output(format: &cli::OutputFormat, values: &ContextValues) -> anyhow::Result<()> {
    match format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), values)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), values)?,
    };

    Ok(())
}

fn write(path: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
