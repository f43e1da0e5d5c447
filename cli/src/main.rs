//! CLI entrypoint for storytime
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use storytime_application::{
    AuthorStoryInput, AuthorStoryUseCase, ConversationLogger, EvaluateStoryInput,
    EvaluateStoryUseCase, FailurePolicy, NoConversationLogger, NoProgress,
    SessionProgressNotifier, SimulationHarness, StoryStore,
};
use storytime_domain::{DocumentRecord, Model, StoryLocation};
use storytime_infrastructure::{
    ConfigLoader, FileConfig, JsonReportStore, JsonSchemaToolConverter, JsonStoryStore,
    JsonlConversationLogger, OpenAiGateway, OpenAiImageGenerator, PerplexitySearch, Severity,
};
use storytime_presentation::{
    Cli, Command, OutputFormat, ProgressReporter, SimpleProgress, StoriesCommand, formatter_for,
};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the tracing subscriber: stderr always, plus a daily file when
/// `logging.dir` is set. The returned guard flushes the file writer on drop.
fn init_logging(verbose: u8, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "storytime.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

fn progress_for(cli: &Cli) -> Box<dyn SessionProgressNotifier> {
    if cli.quiet || (cli.output == OutputFormat::Json && !std::io::stderr().is_terminal()) {
        Box::new(NoProgress)
    } else if !std::io::stderr().is_terminal() {
        Box::new(SimpleProgress)
    } else if cli.verbose > 0 {
        Box::new(ProgressReporter::verbose())
    } else {
        Box::new(ProgressReporter::new())
    }
}

/// Adapters shared by the session commands.
struct Services {
    gateway: Arc<OpenAiGateway>,
    search: Arc<PerplexitySearch>,
    story_store: Arc<JsonStoryStore>,
    report_store: Arc<JsonReportStore>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl Services {
    fn build(config: &FileConfig) -> Result<Self> {
        let gateway = OpenAiGateway::from_config(&config.providers.openai)
            .context("Failed to configure the OpenAI gateway")?;
        let search = PerplexitySearch::from_config(&config.providers.perplexity)
            .context("Failed to configure Perplexity search")?;

        let conversation_logger: Arc<dyn ConversationLogger> =
            match config.logging.conversation_log_path() {
                Some(path) => match JsonlConversationLogger::new(path) {
                    Some(logger) => {
                        info!("Writing conversation transcript to {}", logger.path().display());
                        Arc::new(logger)
                    }
                    None => Arc::new(NoConversationLogger),
                },
                None => Arc::new(NoConversationLogger),
            };

        Ok(Self {
            gateway: Arc::new(gateway),
            search: Arc::new(search),
            story_store: Arc::new(JsonStoryStore::new(&config.storage.story_dir)),
            report_store: Arc::new(JsonReportStore::new(&config.storage.evaluation_dir)),
            conversation_logger,
        })
    }

    fn author(&self, config: &FileConfig) -> Result<AuthorStoryUseCase> {
        let images = OpenAiImageGenerator::from_config(&config.providers.openai)
            .context("Failed to configure image generation")?;
        Ok(AuthorStoryUseCase::new(
            self.gateway.clone(),
            Arc::new(JsonSchemaToolConverter),
            self.story_store.clone(),
            self.search.clone(),
            Arc::new(images),
        )
        .with_conversation_logger(self.conversation_logger.clone()))
    }

    fn evaluate(&self) -> EvaluateStoryUseCase {
        EvaluateStoryUseCase::new(
            self.gateway.clone(),
            Arc::new(JsonSchemaToolConverter),
            self.report_store.clone(),
            self.search.clone(),
        )
        .with_conversation_logger(self.conversation_logger.clone())
    }
}

fn parse_model(name: Option<&str>, fallback: Model) -> Model {
    match name {
        Some(name) => {
            let Ok(model) = name.parse::<Model>();
            model
        }
        None => fallback,
    }
}

async fn generate(cli: &Cli, config: &FileConfig, topic: Option<&str>, model: Option<&str>) -> Result<()> {
    let services = Services::build(config)?;
    let use_case = services.author(config)?;
    let models = config.models.to_session_models();
    let model = parse_model(model, models.author);
    let execution = config.execution_params();

    let input = match topic {
        Some(topic) => AuthorStoryInput::for_topic(topic, model, execution),
        None => {
            let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
            AuthorStoryInput::random_topic(
                StoryLocation::from_topic(&format!("story {}", stamp)),
                model,
                execution,
            )
        }
    };

    let progress = progress_for(cli);
    let outcome = use_case.execute(input, progress.as_ref()).await?;

    let formatter = formatter_for(cli.output);
    println!("{}", formatter.format_story(&outcome.document.serialize()));

    if outcome.is_rejected() {
        warn!("The model declined to write this story");
    }
    match &outcome.saved_path {
        Some(path) => eprintln!("Saved to {}", path.display()),
        None => warn!("Story was not saved (final state: {})", outcome.state),
    }
    if outcome.exhausted {
        warn!("Authoring stopped at the tool turn limit");
    }

    outcome.require_title()?;
    Ok(())
}

async fn evaluate(
    cli: &Cli,
    config: &FileConfig,
    story: &Path,
    name: Option<&str>,
    model: Option<&str>,
) -> Result<()> {
    let document = JsonStoryStore::read_document(story)
        .with_context(|| format!("Failed to read story {}", story.display()))?;
    if document.title().is_empty() {
        bail!("Story {} has no title", story.display());
    }

    let services = Services::build(config)?;
    let models = config.models.to_session_models();
    let mut input = EvaluateStoryInput::new(
        Arc::new(document),
        parse_model(model, models.evaluator),
        config.execution_params(),
    );
    if let Some(name) = name {
        input = input.with_report_name(name);
    }

    let progress = progress_for(cli);
    let outcome = services.evaluate().execute(input, progress.as_ref()).await?;

    println!("{}", formatter_for(cli.output).format_report(&outcome.record));
    match &outcome.saved_path {
        Some(path) => eprintln!("Report saved to {}", path.display()),
        None => warn!("Evaluation report was not saved"),
    }
    Ok(())
}

async fn simulate(
    cli: &Cli,
    config: &FileConfig,
    cycles: Option<usize>,
    keep: bool,
    abort_on_failure: bool,
) -> Result<()> {
    let services = Services::build(config)?;
    let harness = SimulationHarness::new(
        services.author(config)?,
        services.evaluate(),
        services.story_store.clone(),
    );

    let mut sim_config = config.simulation_config();
    if let Some(cycles) = cycles {
        sim_config = sim_config.with_cycles(cycles);
    }
    if keep {
        sim_config = sim_config.with_keep_stories(true);
    }
    if abort_on_failure {
        sim_config = sim_config.with_failure_policy(FailurePolicy::Abort);
    }

    let progress = progress_for(cli);
    let report = harness.run(&sim_config, progress.as_ref()).await?;
    println!("{}", formatter_for(cli.output).format_simulation(&report));
    Ok(())
}

fn stories(cli: &Cli, config: &FileConfig, action: &StoriesCommand) -> Result<()> {
    let store = JsonStoryStore::new(&config.storage.story_dir);
    let formatter = formatter_for(cli.output);

    match action {
        StoriesCommand::List => {
            let stories = store.list().context("Failed to list stories")?;
            print!("{}", formatter.format_stories(&stories));
        }
        StoriesCommand::Show { filename } => {
            let Some(json) = store.load(filename)? else {
                bail!("No story named {} in {}", filename, store.dir().display());
            };
            let record: DocumentRecord = serde_json::from_str(&json)
                .with_context(|| format!("Story {} is not valid JSON", filename))?;
            println!("{}", formatter.format_story(&record));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    let _log_guard = init_logging(cli.verbose, config.logging.log_dir());
    info!("Starting storytime");

    for issue in config.validate() {
        match issue.severity {
            Severity::Warning => warn!("config: {}", issue),
            Severity::Error => error!("config: {}", issue),
        }
    }

    let Some(command) = &cli.command else {
        bail!("No command given. Run `storytime --help` for usage.");
    };

    match command {
        Command::Generate { topic, model } => {
            generate(&cli, &config, topic.as_deref(), model.as_deref()).await
        }
        Command::Evaluate { story, name, model } => {
            evaluate(&cli, &config, story, name.as_deref(), model.as_deref()).await
        }
        Command::Simulate {
            cycles,
            keep,
            abort_on_failure,
        } => simulate(&cli, &config, *cycles, *keep, *abort_on_failure).await,
        Command::Stories { action } => stories(&cli, &config, action),
    }
}
