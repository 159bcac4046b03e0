use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use serde::Serialize;
use serde_json::{Map, Value};

use permify_gate::client::PermifyClient;
use permify_gate::config::PermifyConfig;
use permify_gate::models::bundle::{BundleNameRequest, DataBundle, WriteBundleRequest};
use permify_gate::models::data::{
    DeleteRelationshipsRequest, ReadRelationshipsRequest, RunBundleRequest, WriteRelationshipsRequest,
};
use permify_gate::models::permission::CheckRequest;
use permify_gate::models::schema::{ListSchemasRequest, ReadSchemaRequest, WriteSchemaRequest};
use permify_gate::models::tenancy::{CreateTenantRequest, ListTenantsRequest};
use permify_gate::models::watch::{WatchPermissionsRequest, WatchRequest};
use permify_gate::models::{Entity, EntityFilter, Tuple, TupleFilter};

const DEFAULT_TENANT: &str = "t1";

#[derive(Parser, Debug)]
#[command(author, version, about = "Permify administration tool", long_about = None)]
struct Cli {
    /// Overrides PERMIFY_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Overrides PERMIFY_API_KEY
    #[arg(long, global = true)]
    api_key: Option<String>,
    /// Per-request timeout in seconds, overrides PERMIFY_TIMEOUT_SECS
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe the service health endpoint
    Health,
    /// Manage tenants
    #[command(subcommand)]
    Tenant(TenantCommand),
    /// Write or inspect authorization schemas
    #[command(subcommand)]
    Schema(SchemaCommand),
    /// Write, read or delete relationship tuples
    #[command(subcommand)]
    Relationship(RelationshipCommand),
    /// Ask whether a subject holds a permission on an entity
    Check(CheckArgs),
    /// Manage and run data bundles
    #[command(subcommand)]
    Bundle(BundleCommand),
    /// Stream committed data changes until interrupted
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
struct TenantArg {
    #[arg(short, long, default_value = DEFAULT_TENANT)]
    tenant: String,
}

#[derive(Subcommand, Debug)]
enum TenantCommand {
    Create {
        id: String,
        #[arg(long)]
        name: Option<String>,
    },
    Delete {
        id: String,
    },
    List {
        #[arg(long)]
        page_size: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Write the schema in FILE as a new version
    Write {
        #[command(flatten)]
        tenant: TenantArg,
        file: PathBuf,
    },
    Read {
        #[command(flatten)]
        tenant: TenantArg,
        #[arg(long)]
        version: Option<String>,
    },
    List {
        #[command(flatten)]
        tenant: TenantArg,
    },
}

#[derive(Subcommand, Debug)]
enum RelationshipCommand {
    /// Write tuples given as `type:id#relation@type:id[#relation]`
    Write {
        #[command(flatten)]
        tenant: TenantArg,
        #[arg(required = true)]
        tuples: Vec<Tuple>,
    },
    Read {
        #[command(flatten)]
        tenant: TenantArg,
        #[command(flatten)]
        filter: FilterArgs,
    },
    Delete {
        #[command(flatten)]
        tenant: TenantArg,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    entity_type: String,
    #[arg(long = "id")]
    ids: Vec<String>,
    #[arg(long)]
    relation: Option<String>,
}

impl FilterArgs {
    fn into_filter(self) -> TupleFilter {
        let filter = TupleFilter::for_entity(EntityFilter::new(self.entity_type).with_ids(self.ids));
        match self.relation {
            Some(relation) => filter.with_relation(relation),
            None => filter,
        }
    }
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    tenant: TenantArg,
    /// Entity as `type:id`
    entity: Entity,
    permission: String,
    /// Subject as `type:id`
    subject: Entity,
    /// Extra context data as a JSON object
    #[arg(long, value_parser = parse_json_object)]
    context: Option<Map<String, Value>>,
    #[arg(long)]
    snap_token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum BundleCommand {
    /// Write the bundles listed in a JSON FILE
    Write {
        #[command(flatten)]
        tenant: TenantArg,
        file: PathBuf,
    },
    Read {
        #[command(flatten)]
        tenant: TenantArg,
        name: String,
    },
    Delete {
        #[command(flatten)]
        tenant: TenantArg,
        name: String,
    },
    Run {
        #[command(flatten)]
        tenant: TenantArg,
        name: String,
        /// Template argument as `key=value`
        #[arg(long = "arg", value_parser = parse_key_val)]
        arguments: Vec<(String, String)>,
    },
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[command(flatten)]
    tenant: TenantArg,
    #[arg(long)]
    snap_token: Option<String>,
    /// Only show tuple changes on this entity type (requires --permission)
    #[arg(long, requires = "permission")]
    entity_type: Option<String>,
    #[arg(long, requires = "entity_type")]
    permission: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Health => {
            let client = PermifyClient::new(&config)?;
            print_json(&client.health_check().await?)?;
        }
        Commands::Tenant(command) => {
            let client = PermifyClient::connect(&config).await?;
            run_tenant(&client, command).await?;
        }
        Commands::Schema(command) => {
            let client = PermifyClient::connect(&config).await?;
            run_schema(&client, command).await?;
        }
        Commands::Relationship(command) => {
            let client = PermifyClient::connect(&config).await?;
            run_relationship(&client, command).await?;
        }
        Commands::Check(args) => {
            let client = PermifyClient::connect(&config).await?;
            run_check(&client, args).await?;
        }
        Commands::Bundle(command) => {
            let client = PermifyClient::connect(&config).await?;
            run_bundle(&client, command).await?;
        }
        Commands::Watch(args) => {
            let client = PermifyClient::connect(&config).await?;
            run_watch(&client, args).await?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<PermifyConfig> {
    let mut config = match cli.base_url {
        Some(ref base_url) => {
            let mut config = PermifyConfig::new(base_url);
            if let Ok(key) = std::env::var("PERMIFY_API_KEY") {
                config = config.with_api_key(key);
            }
            config
        }
        None => PermifyConfig::from_env()?,
    };

    if let Some(ref key) = cli.api_key {
        config = config.with_api_key(key);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

async fn run_tenant(client: &PermifyClient, command: TenantCommand) -> anyhow::Result<()> {
    let tenants = client.tenants();
    match command {
        TenantCommand::Create { id, name } => {
            let mut request = CreateTenantRequest::new(id);
            if let Some(name) = name {
                request = request.with_name(name);
            }
            print_json(&tenants.create(&request).await?)
        }
        TenantCommand::Delete { id } => print_json(&tenants.delete(&id).await?),
        TenantCommand::List { page_size } => {
            let request = ListTenantsRequest {
                page_size,
                continuous_token: None,
            };
            print_json(&tenants.list(&request).await?)
        }
    }
}

async fn run_schema(client: &PermifyClient, command: SchemaCommand) -> anyhow::Result<()> {
    let schemas = client.schemas();
    match command {
        SchemaCommand::Write { tenant, file } => {
            let schema = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read schema file {}", file.display()))?;
            print_json(&schemas.write(&WriteSchemaRequest::new(tenant.tenant, schema)).await?)
        }
        SchemaCommand::Read { tenant, version } => {
            print_json(&schemas.read(&ReadSchemaRequest::new(tenant.tenant, version)).await?)
        }
        SchemaCommand::List { tenant } => print_json(&schemas.list(&ListSchemasRequest::new(tenant.tenant)).await?),
    }
}

async fn run_relationship(client: &PermifyClient, command: RelationshipCommand) -> anyhow::Result<()> {
    let data = client.data();
    match command {
        RelationshipCommand::Write { tenant, tuples } => {
            let request = WriteRelationshipsRequest::new(tenant.tenant, tuples);
            print_json(&data.write_relationships(&request).await?)
        }
        RelationshipCommand::Read { tenant, filter } => {
            let request = ReadRelationshipsRequest::new(tenant.tenant, filter.into_filter());
            print_json(&data.read_relationships(&request).await?)
        }
        RelationshipCommand::Delete { tenant, filter } => {
            let request = DeleteRelationshipsRequest {
                tenant_id: tenant.tenant,
                filter: filter.into_filter(),
            };
            print_json(&data.delete_relationships(&request).await?)
        }
    }
}

async fn run_check(client: &PermifyClient, args: CheckArgs) -> anyhow::Result<()> {
    let request = CheckRequest {
        tenant_id: args.tenant.tenant,
        entity_type: args.entity.entity_type,
        entity_id: args.entity.id,
        permission: args.permission,
        subject_type: args.subject.entity_type,
        subject_id: args.subject.id,
        context: args.context.unwrap_or_default(),
        snap_token: args.snap_token,
    };

    let decision = client.permissions().check(&request).await?;
    print_json(&serde_json::json!({
        "allowed": decision.allowed,
        "metadata": decision.metadata,
    }))
}

async fn run_bundle(client: &PermifyClient, command: BundleCommand) -> anyhow::Result<()> {
    let bundles = client.bundles();
    match command {
        BundleCommand::Write { tenant, file } => {
            let raw = std::fs::read(&file).with_context(|| format!("failed to read bundle file {}", file.display()))?;
            let parsed: Vec<DataBundle> =
                serde_json::from_slice(&raw).with_context(|| format!("invalid bundle file {}", file.display()))?;
            let request = WriteBundleRequest {
                tenant_id: tenant.tenant,
                bundles: parsed,
            };
            print_json(&bundles.write(&request).await?)
        }
        BundleCommand::Read { tenant, name } => {
            print_json(&bundles.read(&BundleNameRequest::new(tenant.tenant, name)).await?)
        }
        BundleCommand::Delete { tenant, name } => {
            print_json(&bundles.delete(&BundleNameRequest::new(tenant.tenant, name)).await?)
        }
        BundleCommand::Run { tenant, name, arguments } => {
            let request = arguments
                .into_iter()
                .fold(RunBundleRequest::new(tenant.tenant, name), |request, (key, value)| {
                    request.argument(key, value)
                });
            print_json(&client.data().run_bundle(&request).await?)
        }
    }
}

async fn run_watch(client: &PermifyClient, args: WatchArgs) -> anyhow::Result<()> {
    let watch = client.watch();
    let mut changes = match (args.entity_type, args.permission) {
        (Some(entity_type), Some(permission)) => {
            let request = WatchPermissionsRequest {
                tenant_id: args.tenant.tenant,
                entity_type,
                permission,
                snap_token: args.snap_token,
            };
            watch.permission_changes(&request).await?
        }
        _ => watch.changes(&WatchRequest::new(args.tenant.tenant, args.snap_token)).await?,
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("watch interrupted");
                break;
            }
            batch = changes.next() => match batch {
                Some(batch) => print_json(&batch?)?,
                None => break,
            },
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_json_object(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("context must be a JSON object".to_string()),
        Err(err) => Err(format!("invalid JSON: {err}")),
    }
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected `key=value`, got `{raw}`"))
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
