use crate::{
    cli::{args::MigrateArgs, EXIT_COMPLETED, EXIT_NO_MODELS},
    core::{
        config::{loader::ConfigOverrides, ConfigLoader, ConfigValidator, MigrateConfig},
        error::{AppError, ErrorReporter, TracingErrorReporter},
        migration::{MigrationOptions, MigrationPipeline, RunOutcome},
        model::ModelLoader,
        results_processor::ResultsProcessor,
    },
    twins::{Credential, DigitalTwinsClient, ServiceEndpoint, TwinService},
    Result,
};
use anyhow::Context;
use std::{env, path::Path, process::ExitCode, sync::Arc, time::Duration};

pub async fn migrate(args: MigrateArgs) -> Result<ExitCode> {
    let working_dir = env::current_dir().context("failed to resolve working directory")?;
    let config = resolve_config(&args, &working_dir)?;
    let base_url = ConfigValidator::validate(&config)?;

    let reporter: Arc<dyn ErrorReporter> = Arc::new(TracingErrorReporter);
    let loader = ModelLoader::new(&config.models.extensions, Arc::clone(&reporter));
    let batch = loader.load(&args.paths);
    tracing::info!(models = batch.len(), "model batch loaded");

    let endpoint = ServiceEndpoint {
        base_url,
        api_version: config.service.api_version.clone(),
        page_size: config.service.page_size,
    };
    let credential = read_credential(&config.service.token_env);
    if credential.is_none() {
        tracing::debug!(
            token_env = %config.service.token_env,
            "no access token found; requests are sent unauthenticated"
        );
    }
    let service: Arc<dyn TwinService> = Arc::new(DigitalTwinsClient::new(endpoint, credential));

    let options = MigrationOptions {
        patch_failure_policy: config.migration.patch_failure_policy,
        dry_run: args.dry_run,
        max_runtime: config.migration.max_runtime_seconds.map(Duration::from_secs),
    };
    let pipeline = MigrationPipeline::new(service, options);

    let cancel = pipeline.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling outstanding migrations");
            cancel.cancel();
        }
    });
    let outcome = pipeline.run(batch).await;
    interrupt.abort();

    match outcome.map_err(AppError::from)? {
        RunOutcome::NoModels => {
            reporter.report_warning(
                "no valid model files found; nothing was published or migrated",
                Some(format!("{} input path(s)", args.paths.len())),
            );
            Ok(ExitCode::from(EXIT_NO_MODELS))
        }
        RunOutcome::Completed(report) => {
            let rendered = ResultsProcessor::generate_report(&report, args.format)?;
            println!("{}", rendered.trim_end());
            Ok(ExitCode::from(EXIT_COMPLETED))
        }
    }
}

#[allow(clippy::result_large_err)]
fn resolve_config(
    args: &MigrateArgs,
    working_dir: &Path,
) -> std::result::Result<MigrateConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_explicit(path)?,
        None => ConfigLoader::load_from_workspace(working_dir)?,
    };
    ConfigLoader::apply_overrides(
        &mut config,
        &ConfigOverrides {
            endpoint: args.endpoint.clone(),
            patch_failure_policy: args.patch_policy,
            max_runtime: args.max_runtime,
        },
    );
    Ok(config)
}

fn read_credential(token_env: &str) -> Option<Credential> {
    env::var(token_env)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(Credential::bearer)
}
