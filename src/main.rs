use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use leadcluster::db::LEADS_PER_PAGE;
use leadcluster::{
    summary, AppConfig, ClusterRun, KPrototypes, Record, ResultStore, Silhouette,
};
use serde_json::json;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "leadcluster", version, about = "Segment sales leads into prospect clusters")]
struct Cli {
    /// SQLite file holding the stored results (overrides LEADCLUSTER_DB)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Seed for the clustering engine (overrides LEADCLUSTER_SEED)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Largest cluster count to try (overrides LEADCLUSTER_MAX_K)
    #[arg(long, global = true)]
    max_k: Option<usize>,

    /// Iteration cap per fit (overrides LEADCLUSTER_MAX_ITER)
    #[arg(long, global = true)]
    max_iters: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cluster leads and replace the stored results
    Run {
        /// JSON array of leads to cluster instead of the stored ones ("-" for stdin)
        #[arg(long, short)]
        input: Option<String>,
    },
    /// Manage the stored leads
    #[command(subcommand)]
    Lead(LeadCommand),
    /// Report per-cluster statistics for the stored results
    Summary,
    /// Print the stored leads of one cluster
    Detail { cluster: usize },
    /// Delete the stored results
    Clear,
}

#[derive(Subcommand)]
enum LeadCommand {
    /// Store a new lead
    Add(NewLead),
    /// Store every lead of a JSON array
    Import {
        /// Input file ("-" for stdin)
        #[arg(long, short)]
        input: String,
    },
    /// List stored leads, oldest first
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Change fields of a stored lead
    Edit {
        id: String,
        #[command(flatten)]
        changes: LeadChanges,
    },
    /// Remove a stored lead
    Delete { id: String },
}

#[derive(Args)]
struct NewLead {
    #[arg(long)]
    agent: String,
    #[arg(long)]
    customer: String,
    #[arg(long)]
    job: String,
    /// One of Inisiasi, SPH, Negosiasi, BAKN, Win
    #[arg(long)]
    stage: String,
    /// One of PD, PM, PS
    #[arg(long)]
    portfolio: String,
    #[arg(long)]
    sales_amount: f64,
}

#[derive(Args)]
struct LeadChanges {
    #[arg(long)]
    agent: Option<String>,
    #[arg(long)]
    customer: Option<String>,
    #[arg(long)]
    job: Option<String>,
    #[arg(long)]
    stage: Option<String>,
    #[arg(long)]
    portfolio: Option<String>,
    #[arg(long)]
    sales_amount: Option<f64>,
}

impl LeadChanges {
    fn apply(self, lead: &mut Record) {
        if let Some(agent) = self.agent {
            lead.agent = agent;
        }
        if let Some(customer) = self.customer {
            lead.customer = customer;
        }
        if let Some(job) = self.job {
            lead.job = job;
        }
        if let Some(stage) = self.stage {
            lead.stage = stage;
        }
        if let Some(portfolio) = self.portfolio {
            lead.portfolio = portfolio;
        }
        if let Some(sales_amount) = self.sales_amount {
            lead.sales_amount = sales_amount;
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    match cli.command {
        Command::Run { input } => run(&cfg, input.as_deref()),
        Command::Lead(command) => manage_leads(&cfg, command),
        Command::Summary => show_summary(&cfg),
        Command::Detail { cluster } => show_detail(&cfg, cluster),
        Command::Clear => {
            let mut store = ResultStore::open(&cfg.db_path)?;
            store.clear()
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut cfg = AppConfig::from_env()?;
    if let Some(db) = &cli.db {
        cfg.db_path = db.clone();
    }
    if let Some(seed) = cli.seed {
        cfg.seed = seed;
    }
    if let Some(max_k) = cli.max_k {
        cfg.max_k = max_k;
    }
    if let Some(max_iters) = cli.max_iters {
        cfg.max_iters = max_iters;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn read_batch(input: &str) -> Result<Vec<Record>> {
    let reader: Box<dyn Read> = match input {
        "-" => Box::new(io::stdin()),
        path => Box::new(File::open(path).context(format!("Failed to open input: {}", path))?),
    };

    serde_json::from_reader(BufReader::new(reader)).context("Failed to parse lead batch as JSON")
}

fn run(cfg: &AppConfig, input: Option<&str>) -> Result<()> {
    let start = Instant::now();
    let mut store = ResultStore::open(&cfg.db_path)?;
    let batch = match input {
        Some(input) => read_batch(input)?,
        None => store.list_leads()?.into_iter().map(|doc| doc.body).collect(),
    };
    info!(records = batch.len(), stored = input.is_none(), "loaded lead batch");

    let engine = KPrototypes::new(cfg.max_iters);

    let response = ClusterRun::new(&engine, &Silhouette)
        .config(cfg.search())
        .execute(&batch, &mut store)?;

    info!(
        k = response.k,
        score = response.score,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "clustering complete"
    );

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn manage_leads(cfg: &AppConfig, command: LeadCommand) -> Result<()> {
    let mut store = ResultStore::open(&cfg.db_path)?;

    match command {
        LeadCommand::Add(lead) => {
            let id = store.add_lead(&Record {
                agent: lead.agent,
                customer: lead.customer,
                job: lead.job,
                stage: lead.stage,
                portfolio: lead.portfolio,
                sales_amount: lead.sales_amount,
            })?;
            println!("{}", id);
        }
        LeadCommand::Import { input } => {
            let ids = store.add_leads(&read_batch(&input)?)?;
            println!("{}", serde_json::to_string_pretty(&ids)?);
        }
        LeadCommand::List { page } => {
            let page = store.lead_page(page, LEADS_PER_PAGE)?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        LeadCommand::Edit { id, changes } => {
            let mut lead = store
                .get_lead(&id)?
                .with_context(|| format!("No lead with id {}", id))?
                .body;
            changes.apply(&mut lead);
            store.update_lead(&id, &lead)?;
            println!("{}", serde_json::to_string_pretty(&lead)?);
        }
        LeadCommand::Delete { id } => {
            if !store.delete_lead(&id)? {
                anyhow::bail!("No lead with id {}", id);
            }
        }
    }
    Ok(())
}

fn show_summary(cfg: &AppConfig) -> Result<()> {
    let store = ResultStore::open(&cfg.db_path)?;
    let records: Vec<_> = store.load_results()?.into_iter().map(|doc| doc.body).collect();
    if records.is_empty() {
        anyhow::bail!("No stored results; run `leadcluster run` first");
    }

    let output = json!({
        "metadata": store.load_metadata()?,
        "run": store.run_info()?,
        "report": summary::report(&records),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn show_detail(cfg: &AppConfig, cluster: usize) -> Result<()> {
    let store = ResultStore::open(&cfg.db_path)?;
    let records: Vec<_> = store
        .results_in_cluster(cluster)?
        .into_iter()
        .map(|doc| doc.body)
        .collect();

    let output = json!({
        "cluster": cluster,
        "description": leadcluster::describe(cluster),
        "count": records.len(),
        "records": records,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
