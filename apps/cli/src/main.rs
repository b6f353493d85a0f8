use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{
    load_settings, ConfirmationOutcome, SearchView, StatusMessage, SubscriptionForm,
    SubsidyClient,
};
use shared::{
    domain::{
        AreaId, EmailFrequency, FilterField, FilterOption, FilterSelection, GrantId, RegionId,
        SubscriptionId,
    },
    protocol::SubscriptionUpdate,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "subvenciones",
    version,
    about = "Busca subvenciones y gestiona suscripciones a sus avisos"
)]
struct Cli {
    /// Backend base URL; overrides settings and origin detection.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Origin to resolve the backend for (loopback hosts use the local backend).
    #[arg(long, global = true)]
    origin: Option<String>,
    /// Settings file (defaults to ./subvenciones.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    organo: Vec<String>,
    #[arg(long)]
    tipo_convocatoria: Vec<String>,
    #[arg(long)]
    instrumento: Vec<String>,
    #[arg(long)]
    sector: Vec<String>,
    #[arg(long)]
    finalidad: Vec<String>,
}

impl FilterArgs {
    fn selection(&self) -> FilterSelection {
        let mut selection = FilterSelection::new();
        for (field, values) in [
            (FilterField::Organo, &self.organo),
            (FilterField::TipoConvocatoria, &self.tipo_convocatoria),
            (FilterField::Instrumento, &self.instrumento),
            (FilterField::Sector, &self.sector),
            (FilterField::Finalidad, &self.finalidad),
        ] {
            for value in values {
                selection.insert(field, value.as_str());
            }
        }
        selection
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Frequency {
    Inmediata,
    Diaria,
    Semanal,
}

impl From<Frequency> for EmailFrequency {
    fn from(value: Frequency) -> Self {
        match value {
            Frequency::Inmediata => EmailFrequency::Inmediata,
            Frequency::Diaria => EmailFrequency::Diaria,
            Frequency::Semanal => EmailFrequency::Semanal,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the values offered for every search filter.
    Catalogs,
    /// List region ids accepted by `subscribe --region`.
    Regions,
    /// List thematic area ids accepted by `subscribe --area`.
    Areas,
    /// Search active grants.
    Search {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one grant in full.
    Grant { id: i64 },
    /// Subscribe an e-mail address to grant notifications.
    Subscribe {
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        min_budget: Option<f64>,
        #[arg(long)]
        max_budget: Option<f64>,
        #[arg(long = "region")]
        regions: Vec<i64>,
        #[arg(long = "area")]
        areas: Vec<i64>,
        #[arg(long, value_enum, default_value_t = Frequency::Inmediata)]
        frequency: Frequency,
        /// Filters to search with first; the subscription stores them.
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Confirm a subscription from the link received by e-mail.
    Confirm { link: String },
    /// Show the active subscription of an e-mail address.
    Status { email: String },
    /// Change the preferences of an existing subscription; omitted flags are kept.
    Update {
        id: i64,
        #[arg(long = "region")]
        regions: Vec<i64>,
        #[arg(long = "area")]
        areas: Vec<i64>,
        #[arg(long)]
        min_budget: Option<f64>,
        #[arg(long)]
        max_budget: Option<f64>,
        #[arg(long)]
        notify: Option<bool>,
        #[arg(long, value_enum)]
        frequency: Option<Frequency>,
    },
    /// Cancel a subscription by id.
    Cancel { id: i64 },
    /// Print the public calendar URL.
    Calendar,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn report(status: &StatusMessage) -> ExitCode {
    if status.is_success() {
        println!("{}", status.text);
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", status.text);
        ExitCode::FAILURE
    }
}

fn print_options(options: &[FilterOption]) {
    if options.is_empty() {
        println!("(sin valores)");
    }
    for option in options {
        println!("{:>4}  {}", option.id, option.label);
    }
}

fn print_search(view: &SearchView) -> ExitCode {
    print_lines(&view.render());
    match view {
        SearchView::Error { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = load_settings(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(url) = cli.api_url {
        settings.api_base_url = Some(url);
    }
    if let Some(origin) = cli.origin {
        settings.origin = Some(origin);
    }
    if let Command::Search {
        limit: Some(limit), ..
    } = &cli.command
    {
        settings.search_limit = *limit;
    }

    let client = SubsidyClient::new(&settings);

    let code = match cli.command {
        Command::Catalogs => {
            client.load_catalogs().await;
            for control in client.controls().await.iter() {
                println!("{}:", control.field().label());
                for option in control.options() {
                    println!("  - {}", option.label);
                }
            }
            ExitCode::SUCCESS
        }
        Command::Regions => {
            print_options(&client.regions().await?);
            ExitCode::SUCCESS
        }
        Command::Areas => {
            print_options(&client.areas().await?);
            ExitCode::SUCCESS
        }
        Command::Search { filters, .. } => {
            let view = client.search().apply(filters.selection()).await?;
            print_search(&view)
        }
        Command::Grant { id } => {
            let card = client.grant(GrantId(id)).await?;
            print_lines(&card.render());
            ExitCode::SUCCESS
        }
        Command::Subscribe {
            email,
            name,
            min_budget,
            max_budget,
            regions,
            areas,
            frequency,
            filters,
        } => {
            let selection = filters.selection();
            if !selection.is_empty() {
                let view = client.search().apply(selection).await?;
                if let Some(label) = view.count_label() {
                    println!("Filtros aplicados ({label})");
                }
            }

            let mut form = SubscriptionForm {
                email,
                nombre: name,
                presupuesto_min: min_budget,
                presupuesto_max: max_budget,
                regiones: regions.into_iter().map(RegionId).collect(),
                areas_tematicas: areas.into_iter().map(AreaId).collect(),
                frecuencia_email: frequency.into(),
            };
            report(&client.subscription().submit(&mut form).await)
        }
        Command::Confirm { link } => match client.confirmation().run(Some(&link)).await {
            ConfirmationOutcome::Confirmed(status) | ConfirmationOutcome::Failed(status) => {
                report(&status)
            }
            ConfirmationOutcome::NoToken => {
                eprintln!("El enlace no contiene un token de confirmación.");
                ExitCode::FAILURE
            }
            ConfirmationOutcome::AlreadyRan => ExitCode::SUCCESS,
        },
        Command::Status { email } => {
            let summary = client.subscription_status(&email).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            ExitCode::SUCCESS
        }
        Command::Update {
            id,
            regions,
            areas,
            min_budget,
            max_budget,
            notify,
            frequency,
        } => {
            let update = SubscriptionUpdate {
                regiones: (!regions.is_empty())
                    .then(|| regions.into_iter().map(RegionId).collect()),
                areas_tematicas: (!areas.is_empty())
                    .then(|| areas.into_iter().map(AreaId).collect()),
                presupuesto_min: min_budget,
                presupuesto_max: max_budget,
                notificar_email: notify,
                frecuencia_email: frequency.map(EmailFrequency::from),
            };
            report(
                &client
                    .update_subscription(SubscriptionId(id), &update)
                    .await,
            )
        }
        Command::Cancel { id } => report(&client.cancel_subscription(SubscriptionId(id)).await),
        Command::Calendar => {
            println!("{}", client.calendar_url().await?);
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
