use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use connect_local::auth::PocketBaseAuth;
use connect_local::config::AppConfig;
use connect_local::location::{GeolocationProvider, NominatimGeocoder, StaticGeolocation};
use connect_local::onboarding::Screen;
use connect_local::session::{Session, SessionDeps};
use connect_local::store::{KeyValueStore, LibSqlStore};

/// Which group the chat commands apply to.
#[derive(Default)]
struct CliState {
    open_group: Option<String>,
}

enum Flow {
    Continue,
    Quit,
}

/// A line typed on the main screen.
#[derive(Debug, PartialEq, Eq)]
enum MainInput<'a> {
    Groups,
    Open(&'a str),
    Leave(&'a str),
    Back,
    Find,
    Chat(&'a str),
    Unknown,
}

/// While a chat is open only `/`-prefixed lines are commands; everything else
/// is message text. Otherwise the slash is optional.
fn parse_main_input(line: &str, chat_open: bool) -> MainInput<'_> {
    let command_line = match line.strip_prefix('/') {
        Some(stripped) => stripped,
        None if chat_open => return MainInput::Chat(line),
        None => line,
    };
    let (command, rest) = command_line.split_once(' ').unwrap_or((command_line, ""));
    let rest = rest.trim();
    match command {
        "groups" => MainInput::Groups,
        "open" => MainInput::Open(rest),
        "leave" => MainInput::Leave(rest),
        "back" => MainInput::Back,
        "find" => MainInput::Find,
        _ => MainInput::Unknown,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    eprintln!("📍 Connect Local v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Auth: {}", config.pocketbase_url);
    eprintln!("   Geocoder: {}", config.geocoder_url);

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn KeyValueStore> = Arc::new(
        LibSqlStore::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Geolocation ──────────────────────────────────────────────────────
    let native: Option<Arc<dyn GeolocationProvider>> = match config.static_position {
        Some((lat, lon)) => {
            eprintln!("   Position: {lat}, {lon} (static)");
            Some(Arc::new(StaticGeolocation::new(lat, lon)))
        }
        None => {
            eprintln!("   Position: unavailable (set CONNECT_LOCAL_STATIC_POSITION=lat,lon)");
            None
        }
    };

    let deps = SessionDeps {
        store,
        auth: Arc::new(PocketBaseAuth::new(config.pocketbase_url.clone())),
        geocoder: Arc::new(NominatimGeocoder::new(
            config.geocoder_url.clone(),
            config.user_agent.clone(),
        )),
        native_geolocation: native,
        fallback_geolocation: None,
    };

    let session = Arc::new(Session::new(&config, deps));
    let screen = session.init().await;
    eprintln!("   Type /help for commands. /quit to exit.\n");
    print_screen(&session, screen).await;

    // Print assistant replies as they land in the open group.
    let mut rx = session.subscribe();
    tokio::spawn(async move {
        while let Ok(message) = rx.recv().await {
            if message.is_assistant {
                println!("\n[{}] {}: {}\n", message.group_id, message.sender, message.text);
                eprint!("> ");
            }
        }
    });

    let mut state = CliState::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    eprint!("> ");
                    continue;
                }
                if let Flow::Quit = handle_line(&session, &mut state, line).await {
                    break;
                }
                eprint!("> ");
            }
            Ok(None) => break, // EOF
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                break;
            }
        }
    }

    session.shutdown();
    Ok(())
}

async fn handle_line(session: &Session, state: &mut CliState, line: &str) -> Flow {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "/quit" | "/exit" => return Flow::Quit,
        "/help" => print_help(session.current_screen().await),
        "/screen" => print_screen(session, session.current_screen().await).await,
        "/logout" => {
            state.open_group = None;
            let screen = session.logout().await;
            print_screen(session, screen).await;
        }
        _ => match session.current_screen().await {
            Screen::Login => login_command(session, command, rest).await,
            Screen::Location => location_command(session, command, rest).await,
            Screen::Interests => interests_command(session, command, rest).await,
            Screen::Profile => profile_command(session, command, rest).await,
            Screen::Main => main_command(session, state, line).await,
        },
    }
    Flow::Continue
}

async fn login_command(session: &Session, command: &str, rest: &str) {
    let args: Vec<&str> = rest.split_whitespace().collect();
    let result = match (command, args.as_slice()) {
        ("login", [email, password]) => session.login(email, password).await,
        ("register", [email, password, name @ ..]) if !name.is_empty() => {
            session.register(email, password, &name.join(" ")).await
        }
        ("google", []) => session.login_with_provider("google").await,
        _ => {
            print_help(Screen::Login);
            return;
        }
    };
    match result {
        Ok(screen) => print_screen(session, screen).await,
        Err(e) => println!("Sign-in failed: {e}. Please try again."),
    }
}

async fn location_command(session: &Session, command: &str, rest: &str) {
    match command {
        "enable" => match session.enable_location().await {
            Ok(location) => {
                println!("Location set to {}", location.name);
                print_screen(session, session.current_screen().await).await;
            }
            Err(e) => println!("Could not get your location: {e}"),
        },
        "skip" => {
            session.skip_location().await;
            print_screen(session, session.current_screen().await).await;
        }
        "radius" => set_radius(session, rest).await,
        _ => print_help(Screen::Location),
    }
}

async fn interests_command(session: &Session, command: &str, rest: &str) {
    match command {
        "list" | "search" => print_interests(session, rest).await,
        "toggle" => {
            let selected = session.toggle_interest(rest).await;
            println!("Selected ({}): {}", selected.len(), selected.join(", "));
        }
        "add" => match session.add_custom_interest(rest).await {
            Some(interest) => println!("Added {interest}"),
            None => println!("Type an interest to add"),
        },
        "continue" => {
            let screen = session.confirm_interests().await;
            if screen == Screen::Interests {
                println!("Pick at least one interest first");
            } else {
                print_screen(session, screen).await;
            }
        }
        _ => print_help(Screen::Interests),
    }
}

async fn profile_command(session: &Session, command: &str, rest: &str) {
    match command {
        "radius" => set_radius(session, rest).await,
        "find" => {
            println!("Finding groups...");
            let groups = session.find_groups().await;
            println!("Joined {} groups", groups.len());
            print_screen(session, session.current_screen().await).await;
        }
        _ => print_help(Screen::Profile),
    }
}

async fn main_command(session: &Session, state: &mut CliState, line: &str) {
    match parse_main_input(line, state.open_group.is_some()) {
        MainInput::Groups => print_groups(session).await,
        MainInput::Open(arg) => {
            let Some(group) = group_by_index(session, arg).await else {
                println!("No such group");
                return;
            };
            println!("── {} ──", group.name);
            for message in session.open_group(&group.id).await {
                println!("{}: {}", message.sender, message.text);
            }
            state.open_group = Some(group.id);
        }
        MainInput::Leave(arg) => {
            let Some(group) = group_by_index(session, arg).await else {
                println!("No such group");
                return;
            };
            if session.leave_group(&group.id).await {
                println!("Left {}", group.name);
            }
            if state.open_group.as_deref() == Some(group.id.as_str()) {
                state.open_group = None;
            }
        }
        MainInput::Back => state.open_group = None,
        MainInput::Find => {
            let groups = session.find_groups().await;
            state.open_group = None;
            println!("Joined {} groups", groups.len());
        }
        MainInput::Chat(text) => {
            if let Some(group_id) = &state.open_group {
                session.send_message(group_id, text).await;
            }
        }
        MainInput::Unknown => print_help(Screen::Main),
    }
}

async fn set_radius(session: &Session, rest: &str) {
    match rest.parse::<u32>() {
        Ok(miles) if miles > 0 => {
            session.set_travel_radius(miles).await;
            println!("Travel radius: {miles} miles");
        }
        _ => println!("Usage: radius <miles>"),
    }
}

async fn group_by_index(session: &Session, arg: &str) -> Option<connect_local::groups::Group> {
    let index: usize = arg.parse().ok()?;
    session.groups().await.into_iter().nth(index.checked_sub(1)?)
}

async fn print_screen(session: &Session, screen: Screen) {
    match screen {
        Screen::Login => println!("Sign in to get started."),
        Screen::Location => println!("Share your location so we can find groups near you."),
        Screen::Interests => print_interests(session, "").await,
        Screen::Profile => {
            let summary = session.render_profile_summary().await;
            println!("Location: {}", summary.location);
            println!("Travel radius: {}", summary.radius);
            println!("Interests: {}", summary.interests.join(", "));
        }
        Screen::Main => print_groups(session).await,
    }
    print_help(screen);
}

async fn print_interests(session: &Session, query: &str) {
    let chips = session.render_interests(query).await;
    let line: Vec<String> = chips
        .iter()
        .map(|chip| {
            if chip.selected {
                format!("[{}]", chip.name)
            } else {
                chip.name.clone()
            }
        })
        .collect();
    println!("{}", line.join("  "));
}

async fn print_groups(session: &Session) {
    let cards = session.render_groups().await;
    if cards.is_empty() {
        println!("No groups yet. Complete your profile to find groups!");
        return;
    }
    for (i, card) in cards.iter().enumerate() {
        let badge = card
            .unread_badge
            .map(|n| format!(" ({n} unread)"))
            .unwrap_or_default();
        println!(
            "{}. {} · {} members · {}{}",
            i + 1,
            card.name,
            card.member_count,
            card.location_name,
            badge
        );
        if let Some(last) = &card.last_message {
            println!("   {last}");
        }
    }
}

fn print_help(screen: Screen) {
    let commands = match screen {
        Screen::Login => "login <email> <password> | register <email> <password> <name> | google",
        Screen::Location => "enable | skip | radius <miles>",
        Screen::Interests => "list | search <text> | toggle <interest> | add <interest> | continue",
        Screen::Profile => "radius <miles> | find",
        Screen::Main => {
            "groups | open <n> | leave <n> | back | find (use /open, /back... while chatting; other text is sent)"
        }
    };
    eprintln!("   [{screen}] {commands} | /logout | /quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_chat_sends_plain_lines() {
        for line in ["find a cafe near the park?", "open 2 tickets left", "back soon", "groups are fun"] {
            assert_eq!(parse_main_input(line, true), MainInput::Chat(line));
        }
    }

    #[test]
    fn slash_commands_work_while_chatting() {
        assert_eq!(parse_main_input("/open 2", true), MainInput::Open("2"));
        assert_eq!(parse_main_input("/leave  1", true), MainInput::Leave("1"));
        assert_eq!(parse_main_input("/back", true), MainInput::Back);
        assert_eq!(parse_main_input("/groups", true), MainInput::Groups);
        assert_eq!(parse_main_input("/find", true), MainInput::Find);
        assert_eq!(parse_main_input("/send hi", true), MainInput::Unknown);
    }

    #[test]
    fn slash_is_optional_without_open_chat() {
        assert_eq!(parse_main_input("open 2", false), MainInput::Open("2"));
        assert_eq!(parse_main_input("/open 2", false), MainInput::Open("2"));
        assert_eq!(parse_main_input("find", false), MainInput::Find);
        assert_eq!(parse_main_input("hello there", false), MainInput::Unknown);
    }
}
