//! Headless console entry point.
//!
//! Keeps the session in a JSON file so it can be inspected and exercised from a
//! terminal with the same store, guards and route table the frontend uses.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context};

use staffdesk_auth::{Credentials, FileStorage, HistoryNavigator, NavigationRequest, SessionError};
use staffdesk_console::{Console, ConsoleConfig, HttpAuthBackend, Resolution};

const USAGE: &str = "usage: staffdesk [status | login <email> | refresh | open <url> | logout]";

fn session_file() -> PathBuf {
    if let Ok(path) = std::env::var("STAFFDESK_SESSION_FILE") {
        return PathBuf::from(path);
    }
    dirs::data_dir()
        .map(|dir| dir.join("staffdesk").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("staffdesk-session.json"))
}

fn describe(request: &NavigationRequest) -> String {
    let query: Vec<String> = request.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    if query.is_empty() {
        request.path.clone()
    } else {
        format!("{}?{}", request.path, query.join("&"))
    }
}

fn print_status(console: &Console) {
    let session = console.session().session();
    let Some(user) = session.user() else {
        println!("not signed in");
        return;
    };

    println!("{} <{}>", user.full_name(), user.email);
    println!("role: {}", user.role.name);
    for permission in &user.role.permissions {
        println!("  {:<20} {}", permission.name, permission.description);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let format = std::env::var("STAFFDESK_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    staffdesk_observability::init_with(format);

    let config = ConsoleConfig::from_env();
    let storage = Rc::new(FileStorage::new(session_file()));
    let navigator = Rc::new(HistoryNavigator::new());
    let backend = Rc::new(HttpAuthBackend::new(config.clone()));

    let console = Console::start(config, storage, navigator.clone(), backend)?;
    if console.session().run_deferred() > 0 {
        println!("stored session was unusable and has been cleared");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] | ["status"] => print_status(&console),
        ["login", email] => {
            let password = std::env::var("STAFFDESK_PASSWORD")
                .context("STAFFDESK_PASSWORD must hold the account password")?;
            match console.session().login(&Credentials::new(*email, password)).await {
                Ok(_) => print_status(&console),
                Err(SessionError::Backend(e)) => bail!(console.errors().handle(e)),
                Err(e) => return Err(e).context("login failed"),
            }
        }
        ["refresh"] => {
            console.session().refresh().await.context("refresh failed")?;
            print_status(&console);
        }
        ["open", url] => match console.router().resolve(url) {
            Resolution::Render(page) => println!("render: {}", page.title()),
            Resolution::Redirect(to) => println!("redirect: {}", describe(&to)),
            Resolution::Blocked => {
                let to = navigator.last().map(|r| describe(&r)).unwrap_or_default();
                println!("blocked: {to}");
            }
        },
        ["logout"] => {
            console.session().logout();
            println!("signed out");
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
