use crate::{
    commands::{Commands, ListArgs, SourceCommand},
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::introspect::Introspector;
use engine_core::{
    config::EngineConfig,
    engine::{Page, QueryEngine},
    repository::catalog::Catalog,
};
use model::{core::params::Params, metadata::rows::ListFilter};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod env;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(name = "metaquery", version, about = "Metadata-driven query engine")]
struct Cli {
    #[arg(long, global = true, help = "Catalog file with models and connections")]
    catalog: Option<String>,

    #[arg(long, global = true, help = "Extra KEY=VALUE settings loaded over the environment")]
    env_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => ExitCode::ShutdownRequested,
        Err(err) => {
            error!("{err}");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

async fn run(cli: Cli, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    let mut env = EnvManager::new();
    if let Some(path) = &cli.env_file {
        env.load_from_file(path)?;
    }
    let config = EngineConfig::from_env(&env.to_context())?;
    let catalog = Catalog::load(env.catalog_path(cli.catalog.as_deref())?).await?;

    if let Commands::Models = cli.command {
        return output::emit(&catalog.model_ids(), None).await;
    }

    let engine = QueryEngine::from_catalog(catalog, &config);
    let token = shutdown.cancel_token();
    let result = tokio::select! {
        result = dispatch(&engine, cli.command) => result,
        _ = token.cancelled() => Err(CliError::ShutdownRequested),
    };

    engine.shutdown().await;
    result
}

async fn dispatch(engine: &QueryEngine, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Compile(args) => {
            let query = engine
                .compile(&args.model, &parse_params(args.params.as_deref())?)
                .await?;
            output::emit(&output::compiled_json(&query), args.output.as_deref()).await
        }
        Commands::Run(args) => {
            let rows = engine
                .run(&args.model, &parse_params(args.params.as_deref())?)
                .await?;
            info!(model = %args.model, rows = rows.len(), "Model executed");
            output::emit(&rows, args.output.as_deref()).await
        }
        Commands::Count(args) => {
            let total = engine
                .count(&args.model, &parse_params(args.params.as_deref())?)
                .await?;
            output::emit(&json!({ "total": total }), args.output.as_deref()).await
        }
        Commands::List(args) => {
            let page = list(engine, &args).await?;
            output::emit(&page, args.output.as_deref()).await
        }
        Commands::Models => Ok(()),
        Commands::TestConn { conn } => {
            let introspector = Introspector::new(engine.registry().resolve(&conn).await?)?;
            introspector.test_connection().await?;
            output::emit(&json!({ "conn_id": conn, "status": "ok" }), None).await
        }
        Commands::Source { command } => {
            let introspector = Introspector::new(engine.registry().resolve(command.conn()).await?)?;
            match command {
                SourceCommand::Schemas { .. } => {
                    output::emit(&introspector.list_schemas().await?, None).await
                }
                SourceCommand::Tables { schema, .. } => {
                    let tables = introspector.list_tables(schema.as_deref()).await?;
                    output::emit(&tables, None).await
                }
                SourceCommand::Columns { table, .. } => {
                    output::emit(&introspector.list_columns(&table).await?, None).await
                }
                SourceCommand::Indexes { table, .. } => {
                    output::emit(&introspector.list_indexes(&table).await?, None).await
                }
                SourceCommand::Preview { table, limit, .. } => {
                    output::emit(&introspector.preview_rows(&table, limit).await?, None).await
                }
            }
        }
    }
}

async fn list(engine: &QueryEngine, args: &ListArgs) -> Result<Page, CliError> {
    let params = parse_params(args.params.as_deref())?;
    let filters = parse_filters(args.filters.as_deref())?;
    let page = match (&args.model, &args.code) {
        (Some(model), _) => engine.list_filtered(model, &params, &filters).await?,
        (None, Some(code)) => engine.list_by_code(code, &params, &filters).await?,
        (None, None) => return Err(CliError::Config("either --model or --code is required".into())),
    };
    Ok(page)
}

fn parse_params(raw: Option<&str>) -> Result<Params, CliError> {
    match raw {
        Some(raw) => Ok(Params::from_json(raw)?),
        None => Ok(Params::new()),
    }
}

fn parse_filters(raw: Option<&str>) -> Result<Vec<ListFilter>, CliError> {
    match raw {
        Some(raw) => serde_json::from_str(raw).map_err(|e| CliError::Filters(e.to_string())),
        None => Ok(Vec::new()),
    }
}
