mod display;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use zam_core::model::{AN_SEANCE, SENAT_SEANCE};
use zam_core::{Chambre, Subject, Texte, TypeTexte, User};
use zam_store::amendements::{batch_members, find_amendement, list_amendements};
use zam_store::articles::list_articles;
use zam_store::events::events_for;
use zam_store::lectures::{find_or_create_lecture, get_lecture, list_lectures};
use zam_store::users::find_or_create_user;
use zam_store::{Connection, SqliteStore};
use zam_sync::batch::{batch_amendements, unbatch};
use zam_sync::tables::put_on_table;
use zam_sync::{FetchContext, SyncConfig, fetch_amendement, get_amendements, get_articles, refresh_lecture};

#[derive(Debug, Parser)]
#[command(name = "zam")]
#[command(about = "Fetch and triage amendements of the French Parliament", version)]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "ZAM_DB", default_value = "zam.sqlite3", global = true)]
    db: PathBuf,

    /// JSON sync configuration.
    #[arg(long, env = "ZAM_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[arg(long, env = "ZAM_AN_BASE_URL", global = true)]
    an_base_url: Option<String>,

    #[arg(long, env = "ZAM_SENAT_BASE_URL", global = true)]
    senat_base_url: Option<String>,

    /// Misses past the highest known number before AN discovery stops.
    #[arg(long, env = "ZAM_MAX_404", global = true)]
    max_404: Option<u32>,

    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage lectures.
    Lecture {
        #[command(subcommand)]
        command: LectureCommand,
    },
    /// Refresh from upstream.
    Fetch {
        #[command(subcommand)]
        command: FetchCommand,
    },
    /// List the amendements of a lecture in discussion order.
    Amendements { lecture_id: i64 },
    /// Show the event log.
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },
    /// Group amendements into one batch.
    Batch(BatchArgs),
    /// Take one amendement out of its batch.
    Unbatch(UnbatchArgs),
    /// Move amendements between tables.
    Table {
        #[command(subcommand)]
        command: TableCommand,
    },
}

#[derive(Debug, Subcommand)]
enum LectureCommand {
    Add(LectureAddArgs),
    List,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChambreArg {
    An,
    Senat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TypeArg {
    Projet,
    Proposition,
}

#[derive(Debug, Args)]
struct LectureAddArgs {
    #[arg(long, value_enum)]
    chambre: ChambreArg,
    /// Legislature number at the AN, session such as `2017-2018` at the Sénat.
    #[arg(long)]
    session: String,
    #[arg(long)]
    texte: u32,
    #[arg(long)]
    organe: String,
    /// Part of a finance bill (1 or 2).
    #[arg(long)]
    partie: Option<u8>,
    #[arg(long = "type", value_enum, default_value_t = TypeArg::Projet)]
    type_: TypeArg,
    #[arg(long)]
    titre: Option<String>,
    /// Full title of the text, used to resolve "article unique" subdivisions.
    #[arg(long, default_value = "")]
    titre_long: String,
}

#[derive(Debug, Subcommand)]
enum FetchCommand {
    /// Every amendement of the lecture.
    Amendements { lecture_id: i64 },
    /// One amendement by number.
    Amendement { lecture_id: i64, num: u32 },
    /// Article contents.
    Articles { lecture_id: i64 },
    /// Articles, then amendements.
    All { lecture_id: i64 },
}

#[derive(Debug, Subcommand)]
enum EventsCommand {
    Amendement {
        lecture_id: i64,
        num: u32,
        /// Include diffs.
        #[arg(long, default_value_t = false)]
        details: bool,
    },
    Lecture { lecture_id: i64 },
}

#[derive(Debug, Args)]
struct UserArgs {
    #[arg(long = "user", env = "ZAM_USER")]
    email: String,
    /// Display name, defaults to the local part of the email.
    #[arg(long)]
    name: Option<String>,
}

#[derive(Debug, Args)]
struct BatchArgs {
    lecture_id: i64,
    #[command(flatten)]
    user: UserArgs,
    #[arg(required = true)]
    nums: Vec<u32>,
}

#[derive(Debug, Args)]
struct UnbatchArgs {
    lecture_id: i64,
    #[command(flatten)]
    user: UserArgs,
    num: u32,
}

#[derive(Debug, Subcommand)]
enum TableCommand {
    /// Place amendements on the user's table. Already there means back to the index.
    Put {
        lecture_id: i64,
        #[command(flatten)]
        user: UserArgs,
        #[arg(required = true)]
        nums: Vec<u32>,
    },
}

fn sync_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = match &cli.config {
        Some(path) => SyncConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => SyncConfig::default(),
    };
    if let Some(url) = &cli.an_base_url {
        config.an_base_url = url.clone();
    }
    if let Some(url) = &cli.senat_base_url {
        config.senat_base_url = url.clone();
    }
    if let Some(max_404) = cli.max_404 {
        config.max_404 = max_404;
    }
    if cli.no_cache {
        config.http_cache = false;
    }
    Ok(config)
}

fn user(conn: &Connection, args: &UserArgs) -> Result<User> {
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args.email.split('@').next().unwrap_or_default().to_string(),
    };
    Ok(find_or_create_user(conn, &args.email, &name)?)
}

fn texte(args: &LectureAddArgs) -> Result<Texte> {
    let type_ = match args.type_ {
        TypeArg::Projet => TypeTexte::Projet,
        TypeArg::Proposition => TypeTexte::Proposition,
    };
    let (chambre, legislature, session) = match args.chambre {
        ChambreArg::An => {
            let legislature = args
                .session
                .parse()
                .with_context(|| format!("AN legislature must be a number, got {:?}", args.session))?;
            (Chambre::An, Some(legislature), None)
        }
        ChambreArg::Senat => (Chambre::Senat, None, Some(args.session.clone())),
    };
    Ok(Texte {
        chambre,
        type_,
        numero: args.texte,
        legislature,
        session,
        titre_long: args.titre_long.clone(),
    })
}

fn add_lecture(store: &SqliteStore, args: &LectureAddArgs) -> Result<()> {
    let texte = texte(args)?;
    let titre = match &args.titre {
        Some(titre) => titre.clone(),
        None if args.organe == AN_SEANCE || args.organe == SENAT_SEANCE => "Séance publique".to_string(),
        None => "Commission".to_string(),
    };
    let (lecture, created) = find_or_create_lecture(store.conn(), &texte, &args.organe, args.partie, &titre)?;
    if created {
        println!("Lecture {} créée : {lecture}", lecture.id);
    } else {
        println!("Lecture {} existante : {lecture}", lecture.id);
    }
    Ok(())
}

async fn fetch(cli: &Cli, store: &mut SqliteStore, command: &FetchCommand) -> Result<()> {
    let ctx = FetchContext::from_config(sync_config(cli)?)?;
    match command {
        FetchCommand::Amendements { lecture_id } => {
            let result = get_amendements(&ctx, store, *lecture_id).await?;
            display::print_fetch_result(&result);
        }
        FetchCommand::Amendement { lecture_id, num } => {
            let (amendement, created) = fetch_amendement(&ctx, store, *lecture_id, *num).await?;
            let verb = if created { "créé" } else { "mis à jour" };
            println!("Amendement {} {verb}", amendement.num_disp());
        }
        FetchCommand::Articles { lecture_id } => {
            if get_articles(&ctx, store, *lecture_id).await? {
                println!("Le contenu des articles a été récupéré.");
            } else {
                println!("Articles inchangés.");
            }
        }
        FetchCommand::All { lecture_id } => {
            let report = refresh_lecture(&ctx, store, *lecture_id).await?;
            display::print_report(&report);
        }
    }
    Ok(())
}

fn show_amendements(store: &SqliteStore, lecture_id: i64) -> Result<()> {
    let lecture = get_lecture(store.conn(), lecture_id)?;
    let articles: HashMap<i64, _> = list_articles(store.conn(), lecture.id)?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();
    let amendements = list_amendements(store.conn(), lecture.id)?;
    println!("=== {lecture} ===");
    display::print_amendements(&amendements, &articles);
    Ok(())
}

fn show_events(store: &SqliteStore, command: &EventsCommand) -> Result<()> {
    match command {
        EventsCommand::Amendement {
            lecture_id,
            num,
            details,
        } => {
            let lecture = get_lecture(store.conn(), *lecture_id)?;
            let amendement = find_amendement(store.conn(), lecture.id, *num)?
                .ok_or_else(|| anyhow!("no amendement {num} in lecture {lecture}"))?;
            let events = events_for(store.conn(), Subject::Amendement(amendement.id))?;
            display::print_events(&events, lecture.chambre(), *details);
        }
        EventsCommand::Lecture { lecture_id } => {
            let lecture = get_lecture(store.conn(), *lecture_id)?;
            let events = events_for(store.conn(), Subject::Lecture(lecture.id))?;
            display::print_events(&events, lecture.chambre(), false);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zam=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut store = SqliteStore::open_persistent(&cli.db)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;

    match &cli.command {
        Command::Lecture { command } => match command {
            LectureCommand::Add(args) => add_lecture(&store, args)?,
            LectureCommand::List => display::print_lectures(&list_lectures(store.conn())?),
        },
        Command::Fetch { command } => fetch(&cli, &mut store, command).await?,
        Command::Amendements { lecture_id } => show_amendements(&store, *lecture_id)?,
        Command::Events { command } => show_events(&store, command)?,
        Command::Batch(args) => {
            let tx = store.transaction()?;
            let user = user(&tx, &args.user)?;
            let batch_id = batch_amendements(&tx, args.lecture_id, &args.nums, &user)?;
            let members = batch_members(&tx, batch_id)?;
            tx.commit()?;
            println!("Lot {batch_id} : {} amendement(s)", members.len());
        }
        Command::Unbatch(args) => {
            let tx = store.transaction()?;
            let user = user(&tx, &args.user)?;
            unbatch(&tx, args.lecture_id, args.num, &user)?;
            tx.commit()?;
            println!("Amendement {} sorti de son lot", args.num);
        }
        Command::Table {
            command: TableCommand::Put { lecture_id, user: who, nums },
        } => {
            let tx = store.transaction()?;
            let user = user(&tx, who)?;
            for num in nums {
                let mut amendement = find_amendement(&tx, *lecture_id, *num)?
                    .ok_or_else(|| anyhow!("no amendement {num} in lecture {lecture_id}"))?;
                put_on_table(&tx, &mut amendement, &user, Some(&user))?;
                match &amendement.location.user_table {
                    Some(_) => println!("{} → table de {user}", amendement.num_disp()),
                    None => println!("{} → index", amendement.num_disp()),
                }
            }
            tx.commit()?;
        }
    }
    Ok(())
}
