//! schemabridge CLI entrypoint.
//!
//! This is the main entrypoint for the schemabridge command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use schemabridge::catalog::Catalog;
use schemabridge::cli::{Cli, Commands, OutputFormatter, StateCommands};
use schemabridge::engine::{decode_config, ConversionEngine};
use schemabridge::error::{BridgeError, ConversionError, Result, StateError};
use schemabridge::schema::{ResourceSchema, SchemaParser, SchemaValidator};
use schemabridge::state::{LocalStateStore, StateSnapshot, StateStore};
use schemabridge::value::{encode_config, ConfigNode, GraphNode};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    if let Err(e) = SchemaParser::new().load_dotenv() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. Logs go to stderr so documents on stdout
/// stay pipeable.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point. Returns `false` when the command reported errors.
async fn run(cli: Cli) -> Result<bool> {
    let formatter = OutputFormatter::new(cli.output);
    let catalog = load_catalog(cli.schema_dir.as_deref())?;

    match cli.command {
        Commands::Schemas => {
            println!("{}", formatter.format_schemas(&catalog));
            Ok(true)
        }
        Commands::Validate { schema, resource } => {
            cmd_validate(&catalog, schema.as_deref(), resource.as_deref(), &formatter)
        }
        Commands::Expand { resource, file } => {
            cmd_expand(catalog.get(&resource)?, &file, &formatter)
        }
        Commands::Flatten {
            resource,
            file,
            prior,
            state,
            save,
        } => {
            let store = create_state_store(cli.state_dir)?;
            let request = FlattenRequest {
                file: &file,
                prior: prior.as_deref(),
                state: state.as_deref(),
                save: save.as_deref(),
            };
            cmd_flatten(catalog.get(&resource)?, request, store.as_ref(), &formatter).await
        }
        Commands::Roundtrip { resource, file } => {
            cmd_roundtrip(catalog.get(&resource)?, &file, &formatter)
        }
        Commands::State { command } => {
            let store = create_state_store(cli.state_dir)?;
            cmd_state(store.as_ref(), command, &formatter).await
        }
    }
}

/// Validate one schema file, one catalog schema, or the whole catalog.
fn cmd_validate(
    catalog: &Catalog,
    schema_file: Option<&Path>,
    resource: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let validator = SchemaValidator::new();

    let loaded;
    let schemas: Vec<&ResourceSchema> = match (schema_file, resource) {
        (Some(path), _) => {
            loaded = SchemaParser::new().load_file(path)?;
            vec![&loaded]
        }
        (None, Some(name)) => vec![catalog.get(name)?],
        (None, None) => catalog.iter().collect(),
    };

    let mut valid = true;
    for schema in schemas {
        info!("Validating schema: {}", schema.resource);
        let result = validator.check(schema);
        valid &= result.is_valid();
        println!("{}", formatter.format_validation(&schema.resource, &result));
    }
    Ok(valid)
}

/// Expand a configuration document.
fn cmd_expand(schema: &ResourceSchema, file: &Path, formatter: &OutputFormatter) -> Result<bool> {
    let Some(config) = read_config(schema, file, formatter)? else {
        return Ok(false);
    };

    let engine = ConversionEngine::new(schema);
    let result = engine.expand(&config);
    println!("{}", formatter.format_conversion(&result, &result.output.to_json()));

    Ok(!result.has_error())
}

/// Inputs of the flatten command.
struct FlattenRequest<'a> {
    file: &'a Path,
    prior: Option<&'a Path>,
    state: Option<&'a str>,
    save: Option<&'a str>,
}

/// Flatten a backend document, optionally against a prior and into state.
async fn cmd_flatten(
    schema: &ResourceSchema,
    request: FlattenRequest<'_>,
    store: &dyn StateStore,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let document = read_json(request.file)?;
    let graph = GraphNode::from_json(&document)
        .ok_or_else(|| ConversionError::decode("backend document", "document is null"))?;

    let prior = match (request.prior, request.state) {
        (Some(path), _) => match read_config(schema, path, formatter)? {
            Some(config) => Some(config),
            None => return Ok(false),
        },
        (None, Some(id)) => Some(load_snapshot(store, id).await?.config(schema)?),
        (None, None) => None,
    };

    let engine = ConversionEngine::new(schema);
    let result = engine.flatten(&graph, prior.as_ref());
    let rendered = encode_config(&result.output).unwrap_or(serde_json::Value::Null);
    println!("{}", formatter.format_conversion(&result, &rendered));

    if result.has_error() {
        return Ok(false);
    }

    if let Some(id) = request.save {
        save_state(store, id, schema, &result.output).await?;
    }
    Ok(true)
}

/// Expand a configuration and flatten it back against itself.
fn cmd_roundtrip(schema: &ResourceSchema, file: &Path, formatter: &OutputFormatter) -> Result<bool> {
    let Some(config) = read_config(schema, file, formatter)? else {
        return Ok(false);
    };

    let engine = ConversionEngine::new(schema);
    let result = engine.round_trip(&config);
    let stable = result.output == config;
    debug!("Round trip stable: {stable}");
    println!("{}", formatter.format_round_trip(&result, stable));

    Ok(stable && !result.has_error())
}

/// Manage stored state.
async fn cmd_state(
    store: &dyn StateStore,
    command: StateCommands,
    formatter: &OutputFormatter,
) -> Result<bool> {
    match command {
        StateCommands::List => {
            let mut snapshots = Vec::new();
            for id in store.list().await? {
                if let Some(snapshot) = store.load(&id).await? {
                    snapshots.push(snapshot);
                }
            }
            println!("{}", formatter.format_state_list(&snapshots));
        }
        StateCommands::Show { id } => {
            let snapshot = load_snapshot(store, &id).await?;
            println!("{}", formatter.format_snapshot(&snapshot));
        }
        StateCommands::Rm { id } => {
            if !store.delete(&id).await? {
                return Err(BridgeError::State(StateError::NotFound { id }));
            }
            eprintln!("Deleted state: {id}");
        }
    }

    Ok(true)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Builds the catalog from the built-in schemas and an optional directory.
fn load_catalog(schema_dir: Option<&Path>) -> Result<Catalog> {
    let mut catalog = Catalog::builtin()?;
    if let Some(dir) = schema_dir {
        let loaded = catalog.load_dir(dir)?;
        debug!("Loaded {loaded} schema(s) from {}", dir.display());
    }
    Ok(catalog)
}

/// Creates the state store.
fn create_state_store(state_dir: Option<PathBuf>) -> Result<Box<dyn StateStore>> {
    let store = match state_dir {
        Some(dir) => LocalStateStore::with_base_dir(dir),
        None => LocalStateStore::new()?,
    };
    debug!("Using {} state store", store.backend_type());
    Ok(Box::new(store))
}

/// Reads a JSON document from disk.
fn read_json(path: &Path) -> Result<serde_json::Value> {
    debug!("Reading document: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Reads a configuration document. Prints the diagnostics and returns
/// `None` when it does not fit the schema.
fn read_config(
    schema: &ResourceSchema,
    path: &Path,
    formatter: &OutputFormatter,
) -> Result<Option<ConfigNode>> {
    let decoded = decode_config(schema, &read_json(path)?);
    if decoded.has_error() {
        eprintln!("{}", formatter.format_diagnostics(&decoded.diagnostics));
        return Ok(None);
    }
    for warning in decoded.diagnostics.warnings() {
        eprintln!("{warning}");
    }
    Ok(Some(decoded.output))
}

/// Loads a snapshot that must exist.
async fn load_snapshot(store: &dyn StateStore, id: &str) -> Result<StateSnapshot> {
    store
        .load(id)
        .await?
        .ok_or_else(|| BridgeError::State(StateError::NotFound { id: id.to_string() }))
}

/// Stores a flattened configuration, continuing the existing lineage.
async fn save_state(
    store: &dyn StateStore,
    id: &str,
    schema: &ResourceSchema,
    config: &ConfigNode,
) -> Result<()> {
    let snapshot = match store.load(id).await? {
        Some(existing) if existing.resource == schema.resource => {
            if existing.is_unchanged(config) {
                info!("State {id} is unchanged at serial {}", existing.serial);
                return Ok(());
            }
            existing.next(schema, config)
        }
        Some(existing) => {
            return Err(BridgeError::State(StateError::ResourceMismatch {
                expected: schema.resource.clone(),
                found: existing.resource,
            }));
        }
        None => StateSnapshot::new(id, schema, config),
    };

    store.save(&snapshot).await?;
    eprintln!("Saved state {id} (serial {})", snapshot.serial);
    Ok(())
}
