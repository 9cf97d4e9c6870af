use clap::{Parser, Subcommand};
use school_vote_client::{
    AppConfig, AppState, ClientError, Env, Navigation, Route,
    pages::{AdminDashboard, ErrorBoundary, Modal, ThankYouPage, Transition, VotingPage, VotingState},
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line front end for the school election backend.
#[derive(Debug, Parser)]
#[command(name = "school-vote", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in with a personal code
    Login { code: String },
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// List the candidates on the ballot
    Candidates,
    /// Show the ballot, or cast a vote for the given candidate ids
    Vote { ids: Vec<i64> },
    /// Manage candidates and votes (admin only)
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    /// Show candidates and the current tally
    Show,
    /// Add a candidate
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        image_url: String,
    },
    /// Edit a candidate; omitted fields keep their current value
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Delete a candidate
    Delete { id: i64 },
    /// Remove every recorded vote
    ResetVotes,
}

/// main
///
/// Loads configuration and logging, then runs the requested command inside the error
/// boundary so any escaping failure ends on the generic failure screen.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "school_vote_client=info,school_vote=info,reqwest=warn".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
    }

    tracing::debug!(api_url = %config.api_url, "client starting in {:?} mode", config.env);

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("startup error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match ErrorBoundary::run(run(state, cli.command)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(screen) => {
            eprintln!("{screen}");
            ExitCode::FAILURE
        }
    }
}

async fn run(state: AppState, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login { code } => {
            let mut page = state.login_page();
            page.set_personal_code(code);
            let transition = page.submit().await;
            report(&transition);
            if let Some(route) = transition.route() {
                println!("Logged in. Continue at {route}");
            }
        }
        Command::Logout => {
            let route = state.login_page().logout()?;
            println!("Logged out. Back at {route}");
        }
        Command::Whoami => match state.session.current()? {
            Some(session) => println!("Logged in as {}", session.role),
            None => println!("Not logged in."),
        },
        Command::Candidates => {
            if !permitted(&state, Route::Voting) {
                return Ok(());
            }
            for candidate in state.api.get_candidates().await? {
                println!("{:>4}  {}  {}", candidate.id, candidate.name, candidate.description);
            }
        }
        Command::Vote { ids } => {
            if !permitted(&state, Route::Voting) {
                return Ok(());
            }
            let mut page = state.voting_page();
            cast_ballot(&mut page, &ids).await;
        }
        Command::Admin { action } => {
            if !permitted(&state, Route::Admin) {
                return Ok(());
            }
            let mut dashboard = state.admin_dashboard();
            let loaded = dashboard.load().await;
            report(&loaded);
            if loaded.route().is_some() {
                return Ok(());
            }
            administer(&mut dashboard, action).await;
            print_dashboard(&dashboard);
        }
    }
    Ok(())
}

fn permitted(state: &AppState, route: Route) -> bool {
    match state.guard.navigate(route) {
        Navigation::Render(_) => true,
        Navigation::Redirect(to) => {
            eprintln!("Access to {route} denied; redirected to {to}. Log in first.");
            false
        }
    }
}

async fn cast_ballot(page: &mut VotingPage, ids: &[i64]) {
    let entered = page.enter().await;
    report(&entered);

    match page.state() {
        VotingState::AlreadyVoted => {
            println!("You have already voted. Thank you for participating in the election.");
            return;
        }
        VotingState::Selecting => {}
        VotingState::Loading | VotingState::Submitting | VotingState::LoadFailed => return,
    }

    if ids.is_empty() {
        for candidate in page.candidates() {
            println!("{:>4}  {}  {}", candidate.id, candidate.name, candidate.description);
        }
        println!("Pass candidate ids to cast your vote.");
        return;
    }

    if let Err(e) = page.choose(ids) {
        eprintln!("Ballot not cast: {e}");
        return;
    }

    let submitted = page.submit().await;
    report(&submitted);
    if submitted.route() == Some(Route::ThankYou) {
        let thanks = ThankYouPage;
        println!("{}\n{}", thanks.title(), thanks.message());
    }
}

async fn administer(dashboard: &mut AdminDashboard, action: AdminCommand) {
    let transition = match action {
        AdminCommand::Show => return,
        AdminCommand::Add {
            name,
            description,
            image_url,
        } => {
            dashboard.open_add();
            if let Some(form) = dashboard.form_mut() {
                form.name = name;
                form.description = description;
                form.image_url = image_url;
            }
            dashboard.submit_modal().await
        }
        AdminCommand::Edit {
            id,
            name,
            description,
            image_url,
        } => {
            if !dashboard.open_edit(id) {
                eprintln!("Candidate {id} not found.");
                return;
            }
            if let Some(form) = dashboard.form_mut() {
                if let Some(name) = name {
                    form.name = name;
                }
                if let Some(description) = description {
                    form.description = description;
                }
                if let Some(image_url) = image_url {
                    form.image_url = image_url;
                }
            }
            dashboard.submit_modal().await
        }
        AdminCommand::Delete { id } => dashboard.delete_candidate(id).await,
        AdminCommand::ResetVotes => dashboard.remove_all_votes().await,
    };
    report(&transition);
    if let Some(stale) = dashboard.load_error() {
        eprintln!("{}: {} The list below may be out of date.", stale.title, stale.message);
    }
    if *dashboard.modal() != Modal::Closed {
        dashboard.close_modal();
    }
}

fn print_dashboard(dashboard: &AdminDashboard) {
    println!("Total votes: {}", dashboard.stats().total_votes);
    for candidate in dashboard.candidates() {
        let votes = dashboard
            .stats()
            .candidates
            .iter()
            .find(|s| s.id == candidate.id)
            .map(|s| s.votes)
            .unwrap_or(0);
        println!("{:>4}  {:<24} {:>6} votes", candidate.id, candidate.name, votes);
    }
}

fn report(transition: &Transition) {
    if let Some(notification) = transition.notification() {
        if notification.is_error() {
            eprintln!("{}: {}", notification.title, notification.message);
        } else {
            println!("{}: {}", notification.title, notification.message);
        }
    }
    if transition.route() == Some(Route::Login) {
        eprintln!("Please log in again.");
    }
}
