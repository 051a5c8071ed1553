use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use travel_chat::backend::HttpBackend;
use travel_chat::client::{ChatBackend, ClientError};
use travel_chat::controller::{ChatController, Submission};
use travel_chat::form::TravelForm;
use travel_chat::guide::GuideStyle;
use travel_chat::history::{self, Conversation};
use travel_chat::model::AgentType;
use travel_chat::options::ClientConfig;
use travel_chat::planner::TravelPlanner;
use travel_chat::render::highlight::SyntectHighlighter;
use travel_chat::session::SessionOutcome;
use travel_chat::transcript::Transcript;

#[derive(Parser)]
#[command(name = "travel-chat", version, about = "Terminal client for the travel-planning assistant")]
struct Cli {
    /// Print a standalone HTML page (transcript plus highlight stylesheet)
    #[arg(long, global = true)]
    page: bool,

    /// Account for history commands; overrides TRAVEL_CHAT_EMAIL
    #[arg(long, global = true)]
    email: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a chat message
    Chat {
        message: String,

        /// general, travel, pdf_generator or attraction_guide
        #[arg(long, default_value = "general")]
        agent: AgentType,
    },
    /// Request a travel plan
    Plan(PlanArgs),
    /// Request an attraction guide
    Guide {
        attraction: String,

        /// academic, storytelling, family-friendly, influencer or humorous
        #[arg(long, default_value = "academic")]
        style: GuideStyle,
    },
    /// Stored conversations
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

#[derive(Args)]
struct PlanArgs {
    #[arg(long = "from")]
    source: String,

    #[arg(long = "to")]
    destination: String,

    /// YYYY-MM-DD; defaults to tomorrow
    #[arg(long)]
    start: Option<String>,

    /// YYYY-MM-DD; defaults to a week after the start
    #[arg(long)]
    end: Option<String>,

    #[arg(long)]
    budget: String,

    #[arg(long, default_value = "hotel")]
    accommodation: String,

    /// Repeat for several preferences
    #[arg(long = "preference", required = true)]
    preferences: Vec<String>,

    #[arg(long = "transport")]
    transportation: Vec<String>,

    #[arg(long = "dietary")]
    dietary: Vec<String>,

    /// Ask for a PDF summary once the plan is ready
    #[arg(long)]
    export: bool,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List conversations with a short preview
    List,
    /// Open a stored conversation by its number in `history list`
    Show { number: usize },
    /// Delete every stored conversation
    Clear,
    /// Delete one conversation
    Delete { id: String },
    /// Start a new server-side conversation
    New,
}

impl PlanArgs {
    fn into_form(self) -> TravelForm {
        let mut form = TravelForm::with_default_dates(chrono::Local::now().date_naive());
        form.source = self.source;
        form.destination = self.destination;
        if let Some(start) = self.start {
            form.set_start_date(start);
        }
        if let Some(end) = self.end {
            form.end_date = end;
        }
        form.budget = self.budget;
        form.accommodation_type = self.accommodation;
        form.preferences = self.preferences;
        form.transportation_mode = self.transportation;
        form.dietary_restrictions = self.dietary;
        form
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the reply completed without an error.
async fn run(cli: Cli) -> Result<bool, Box<dyn Error>> {
    let mut config = ClientConfig::from_env()?;
    if cli.email.is_some() {
        config.email = cli.email;
    }
    let backend = Arc::new(HttpBackend::new(config.transport.clone())?);
    let theme = config.render.theme.clone();

    match cli.command {
        Commands::Chat { message, agent } => {
            let mut controller = ChatController::new(backend, config.render);
            let mut transcript = Transcript::new();
            let outcome = controller
                .submit(&mut transcript, Submission::chat(message, agent), |_| {})
                .await?;
            print_reply(&controller, &transcript, cli.page, &theme)?;
            Ok(outcome.is_success())
        }
        Commands::Guide { attraction, style } => {
            let mut planner = TravelPlanner::new(backend, config.render);
            let outcome = planner.attraction_guide(&attraction, style).await?;
            print_reply(planner.controller(), planner.transcript(), cli.page, &theme)?;
            Ok(outcome.is_success())
        }
        Commands::Plan(args) => {
            let export = args.export;
            let mut planner = TravelPlanner::new(backend, config.render);
            let mut outcome: SessionOutcome = planner.plan(&args.into_form()).await?;
            if export && outcome.is_success() {
                outcome = planner.export_pdf().await?;
            }
            print_reply(planner.controller(), planner.transcript(), cli.page, &theme)?;
            Ok(outcome.is_success())
        }
        Commands::History { command } => {
            let email = config
                .email
                .ok_or_else(|| ClientError::Config("TRAVEL_CHAT_EMAIL is not set".to_string()))?;
            let controller = ChatController::new(backend, config.render);
            run_history(&controller, &email, command, cli.page, &theme).await?;
            Ok(true)
        }
    }
}

fn print_reply<B: ChatBackend + ?Sized>(
    controller: &ChatController<B>,
    transcript: &Transcript,
    page: bool,
    theme: &str,
) -> Result<(), Box<dyn Error>> {
    if page {
        print_transcript(controller, transcript, true, theme)?;
    } else if let Some(reply) = transcript.last_assistant() {
        println!("{}", reply.inner_html());
    }
    Ok(())
}

fn print_transcript<B: ChatBackend + ?Sized>(
    controller: &ChatController<B>,
    transcript: &Transcript,
    page: bool,
    theme: &str,
) -> Result<(), Box<dyn Error>> {
    let body = transcript.to_html(controller.renderer().pipeline());
    if page {
        print!("{}", html_page(&body, theme)?);
    } else {
        print!("{body}");
    }
    Ok(())
}

/// Replays the `number`-th conversation (1-based, as listed) into a fresh
/// transcript and prints it.
async fn show_conversation(
    controller: &ChatController<HttpBackend>,
    email: &str,
    number: usize,
    page: bool,
    theme: &str,
) -> Result<(), Box<dyn Error>> {
    let conversations = controller.backend().load_history(email).await?;
    let conversation = history::listed(&conversations, number).ok_or_else(|| {
        ClientError::Config(format!(
            "no conversation {number}; history has {}",
            conversations.len()
        ))
    })?;

    let mut transcript = Transcript::new();
    history::replay(conversation, &mut transcript, controller.renderer().pipeline());
    print_transcript(controller, &transcript, page, theme)
}

fn html_page(body: &str, theme: &str) -> Result<String, Box<dyn Error>> {
    let css = SyntectHighlighter::stylesheet(theme)?;
    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>travel-chat</title>\n\
         <style>\n{css}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    ))
}

async fn run_history(
    controller: &ChatController<HttpBackend>,
    email: &str,
    command: HistoryCommands,
    page: bool,
    theme: &str,
) -> Result<(), Box<dyn Error>> {
    let backend = controller.backend();
    match command {
        HistoryCommands::List => {
            let conversations = backend.load_history(email).await?;
            if conversations.is_empty() {
                println!("No conversations yet");
            }
            for (index, conversation) in conversations.iter().enumerate() {
                print_conversation(index, conversation);
            }
        }
        HistoryCommands::Clear => {
            backend.clear_history(email).await?;
            println!("History cleared");
        }
        HistoryCommands::Delete { id } => {
            backend.delete_conversation(email, &id).await?;
            println!("Deleted conversation {id}");
        }
        HistoryCommands::New => {
            backend.new_conversation().await?;
            println!("Started a new conversation");
        }
        HistoryCommands::Show { number } => {
            show_conversation(controller, email, number, page, theme).await?;
        }
    }
    Ok(())
}

fn print_conversation(index: usize, conversation: &Conversation) {
    println!("{} [{}]", conversation.label(index), conversation.id);
    for line in conversation.preview() {
        println!("    {line}");
    }
}
