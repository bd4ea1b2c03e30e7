use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use beanstack::application::ingest::{setup_indices, Ingestor};
use beanstack::application::pipeline::{
    generate_organization, generate_reports, load_organization, save_organization, Organization,
};
use beanstack::application::platform::{
    enable_agent_builder, load_workflow_files, setup_agent, setup_workflows,
};
use beanstack::application::relay::{run_terminal, CliSurface, RelayBot};
use beanstack::core::config::{AppConfig, Command, GenerationSettings, PlatformArgs, ReportsArgs};
use beanstack::core::store::DataDir;
use beanstack::domain::default_tool_catalog;
use beanstack::infrastructure::agent_builder::{ConverseClient, KibanaClient};
use beanstack::infrastructure::llm::OpenAIClient;
use beanstack::infrastructure::logger;
use beanstack::infrastructure::search::SearchClient;
use clap::Parser;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logger::init(logger::DEFAULT_FILTER);

    let cfg = AppConfig::parse();
    let data = DataDir::new(&cfg.data_dir);
    debug!("Data directory: {}", data.root().display());

    match &cfg.command {
        Command::Org => {
            let settings = cfg.generation_settings()?;
            let org = generate_organization(&settings)?;
            save_organization(&data, &org)?;
        }
        Command::Reports(args) => {
            let settings = cfg.generation_settings()?;
            let org = load_organization(&data)?;
            run_reports(&settings, &data, &org, args).await?;
        }
        Command::All(args) => {
            let settings = cfg.generation_settings()?;
            args.llm.api_key()?;
            let org = generate_organization(&settings)?;
            save_organization(&data, &org)?;
            run_reports(&settings, &data, &org, args).await?;
        }
        Command::SetupIndices(args) => {
            let (endpoint, api_key) = args.search.connection()?;
            let client = connect(&endpoint, &api_key).await?;
            setup_indices(
                &client,
                &args.indices,
                args.force,
                args.delete,
                args.search.cohere_api_key.as_deref(),
            )
            .await?;
        }
        Command::Ingest(args) => {
            let (endpoint, api_key) = args.search.connection()?;
            let client = connect(&endpoint, &api_key).await?;
            let ingestor = Ingestor::new(&client, data.clone(), args.batch_size);
            for report in ingestor.ingest_all(&args.indices).await? {
                info!(
                    "{}: {} indexed, {} errors, {} skipped",
                    report.kind,
                    report.indexed,
                    report.errors.len(),
                    report.skipped
                );
            }
        }
        Command::EnableAgentBuilder(args) => {
            let kibana = kibana(args)?;
            enable_agent_builder(&kibana).await?;
        }
        Command::SetupWorkflows(args) => {
            let kibana = kibana(&args.platform)?;
            let files = load_workflow_files(&args.workflows_dir)?;
            info!(
                "Deploying {} workflow(s) from {}",
                files.len(),
                args.workflows_dir.display()
            );
            let previous = data.load_workflow_ids()?;
            let deployment = setup_workflows(&kibana, &files, &previous).await?;
            let path = data.save_workflow_ids(&deployment.ids)?;
            info!(
                "{} workflow id(s) saved to {}",
                deployment.ids.len(),
                path.display()
            );
            if !deployment.invalid.is_empty() {
                warn!("Invalid workflows: {}", deployment.invalid.join(", "));
            }
            info!("Workflows UI: {}/app/workflows", kibana.base_url());
        }
        Command::SetupAgent(args) => {
            let kibana = kibana(&args.platform)?;
            let workflow_ids = data.load_workflow_ids()?;
            let setup = setup_agent(
                &kibana,
                &args.agent_id,
                &default_tool_catalog(),
                &workflow_ids,
            )
            .await?;
            if !setup.unresolved_workflows.is_empty() {
                warn!(
                    "Run setup-workflows first; unresolved: {}",
                    setup.unresolved_workflows.join(", ")
                );
            }
            info!(
                "Chat: {}/app/agent_builder/chat/{}",
                kibana.base_url(),
                setup.agent_id
            );
        }
        Command::Relay(args) => {
            let (endpoint, api_key) = args.platform.connection()?;
            let agent = ConverseClient::new(&endpoint, api_key, args.agent_id.clone())?;
            info!("Agent: {}", agent.agent_id());
            info!("Kibana: {}", agent.base_url());

            let bot = RelayBot::new(Arc::new(agent), Arc::new(CliSurface::new()), "beanstack")?
                .with_tick(Duration::from_secs(args.tick_secs.max(1)));
            run_terminal(&bot).await?;
        }
    }

    Ok(())
}

async fn run_reports(
    settings: &GenerationSettings,
    data: &DataDir,
    org: &Organization,
    args: &ReportsArgs,
) -> Result<()> {
    let api_key = args.llm.api_key()?;
    let llm = OpenAIClient::new_with_base_url(
        api_key.to_string(),
        args.llm.openai_model.clone(),
        args.llm.openai_base_url.clone(),
    );
    info!("Writing reports with model {}", llm.model());

    let narratives = data.load_narratives(args.narratives.as_deref())?;
    let summary = generate_reports(
        settings,
        data,
        org,
        Arc::new(llm),
        narratives,
        &args.branch_ids,
    )
    .await?;

    if summary.fallbacks > 0 {
        warn!("{} reports used the fallback body", summary.fallbacks);
    }
    Ok(())
}

fn kibana(args: &PlatformArgs) -> Result<KibanaClient> {
    let (endpoint, api_key) = args.connection()?;
    KibanaClient::new(&endpoint, api_key)
}

async fn connect(endpoint: &str, api_key: &str) -> Result<SearchClient> {
    let client = SearchClient::new(endpoint, api_key);
    let info = client.info().await?;
    info!(
        "Connected to cluster: {} (v{})",
        info.cluster_name, info.version.number
    );
    Ok(client)
}
