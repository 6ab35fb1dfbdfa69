use clap::{Args, Parser, Subcommand};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, LOCATION, SET_COOKIE};
use reqwest::redirect::Policy;
use serde_json::Value;

const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing session token; run `login` and set YATUBE_SESSION_TOKEN")]
    MissingSessionToken,
    #[error("login succeeded but no session cookie was returned")]
    NoSessionCookie,
    #[error("invalid filter {0:?}; expected field=value")]
    InvalidFilter(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "yatube-cli", about = "Yatube API and admin CLI")]
struct Cli {
    #[arg(long, env = "YATUBE_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "YATUBE_SESSION_TOKEN")]
    session_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    session_token: Option<String>,
}

impl CliContext {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    /// Log in and print the session token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "YATUBE_PASSWORD")]
        password: String,
    },
    Posts(PostsCommand),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct PostsCommand {
    #[command(subcommand)]
    command: PostsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PostsSubcommand {
    List {
        #[arg(long, conflicts_with = "author")]
        group: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    Show {
        post_id: i64,
    },
    Comment {
        post_id: i64,
        #[arg(long)]
        text: String,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    /// Registered entities.
    Entities,
    /// One changelist page.
    List {
        entity: String,
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "filter", help = "Date filter as field=value, e.g. pub_date=today")]
        filters: Vec<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Change a post's group; omit --group to clear it.
    SetGroup {
        post_id: i64,
        #[arg(long)]
        group: Option<i64>,
    },
    AddGroup {
        #[arg(long)]
        title: String,
        #[arg(long)]
        slug: String,
        #[arg(long)]
        description: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url, session_token: cli.session_token };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Login { username, password } => run_login(&ctx, &username, &password).await,
        Command::Posts(posts) => run_posts(&ctx, posts).await,
        Command::Admin(admin) => run_admin(&ctx, admin).await,
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let response = reqwest::Client::new().get(cli.url("/healthz")).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn run_login(cli: &CliContext, username: &str, password: &str) -> Result<(), CliError> {
    let client = reqwest::Client::builder().redirect(Policy::none()).build()?;
    let response = client
        .post(cli.url("/auth/login/"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await?;
    let status = response.status();
    if !status.is_redirection() {
        let message = response.text().await.unwrap_or_default();
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }

    let token = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(session_token_from_set_cookie)
        .ok_or(CliError::NoSessionCookie)?;
    println!("{token}");
    Ok(())
}

async fn run_posts(cli: &CliContext, posts: PostsCommand) -> Result<(), CliError> {
    match posts.command {
        PostsSubcommand::List { group, author, page } => {
            let path = match (group, author) {
                (Some(slug), _) => format!("/group/{slug}/"),
                (None, Some(username)) => format!("/profile/{username}/"),
                (None, None) => "/".to_owned(),
            };
            let query = page_query(page);
            let json = send(cli, reqwest::Method::GET, &path, &query, None, false).await?;
            print_json(&json)
        }
        PostsSubcommand::Show { post_id } => {
            let path = format!("/posts/{post_id}/");
            let json = send(cli, reqwest::Method::GET, &path, &[], None, false).await?;
            print_json(&json)
        }
        PostsSubcommand::Comment { post_id, text } => {
            let path = format!("/posts/{post_id}/comment/");
            let form = vec![("text".to_owned(), text)];
            let json = send(cli, reqwest::Method::POST, &path, &[], Some(form), true).await?;
            print_json(&json)
        }
    }
}

async fn run_admin(cli: &CliContext, admin: AdminCommand) -> Result<(), CliError> {
    match admin.command {
        AdminSubcommand::Entities => {
            let json = send(cli, reqwest::Method::GET, "/admin/", &[], None, true).await?;
            print_json(&json)
        }
        AdminSubcommand::List { entity, search, filters, page } => {
            let mut query = page_query(page);
            if let Some(q) = search {
                query.push(("q".to_owned(), q));
            }
            for raw in &filters {
                query.push(parse_filter(raw)?);
            }
            let path = format!("/admin/{entity}/");
            let json = send(cli, reqwest::Method::GET, &path, &query, None, true).await?;
            print_json(&json)
        }
        AdminSubcommand::SetGroup { post_id, group } => {
            let form = vec![("group".to_owned(), group.map(|g| g.to_string()).unwrap_or_default())];
            let path = format!("/admin/post/{post_id}/");
            let json = send(cli, reqwest::Method::POST, &path, &[], Some(form), true).await?;
            print_json(&json)
        }
        AdminSubcommand::AddGroup { title, slug, description } => {
            let form = vec![
                ("title".to_owned(), title),
                ("slug".to_owned(), slug),
                ("description".to_owned(), description),
            ];
            let json = send(cli, reqwest::Method::POST, "/admin/group/add/", &[], Some(form), true).await?;
            print_json(&json)
        }
    }
}

/// Send one request. Redirects are not followed; a 3xx answer is reported as
/// `{"redirect": <location>}` so form submissions show where they landed.
async fn send(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    query: &[(String, String)],
    form: Option<Vec<(String, String)>>,
    authenticated: bool,
) -> Result<Value, CliError> {
    let mut headers = HeaderMap::new();
    if authenticated {
        let token = cli.session_token.as_deref().ok_or(CliError::MissingSessionToken)?;
        headers.insert(COOKIE, HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}"))?);
    }

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(Policy::none())
        .build()?;

    let request = client.request(method, cli.url(path)).query(query);
    let request = match form {
        Some(fields) => request.form(&fields),
        None => request,
    };

    let response = request.send().await?;
    let status = response.status();
    if status.is_redirection() {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        return Ok(serde_json::json!({ "redirect": location }));
    }

    let text = response.text().await?;
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: text });
    }
    if text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

fn page_query(page: Option<u32>) -> Vec<(String, String)> {
    page.map(|p| vec![("page".to_owned(), p.to_string())])
        .unwrap_or_default()
}

/// Split `field=value` into a query pair.
fn parse_filter(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((field, value)) if !field.is_empty() && !value.is_empty() => Ok((field.to_owned(), value.to_owned())),
        _ => Err(CliError::InvalidFilter(raw.to_owned())),
    }
}

/// Extract the session token from one `Set-Cookie` header value.
fn session_token_from_set_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_owned())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_filter_splits_on_first_equals() {
        assert_eq!(parse_filter("pub_date=today").unwrap(), ("pub_date".into(), "today".into()));
        assert_eq!(parse_filter("a=b=c").unwrap(), ("a".into(), "b=c".into()));
    }

    #[test]
    fn parse_filter_rejects_missing_parts() {
        for raw in ["pub_date", "=today", "pub_date="] {
            assert!(matches!(parse_filter(raw), Err(CliError::InvalidFilter(_))), "{raw}");
        }
    }

    #[test]
    fn session_token_read_from_set_cookie() {
        let header = "session_token=abc123; Path=/; HttpOnly; SameSite=Lax";
        assert_eq!(session_token_from_set_cookie(header).as_deref(), Some("abc123"));
        assert_eq!(session_token_from_set_cookie("other=1; Path=/"), None);
        assert_eq!(session_token_from_set_cookie("session_token=; Max-Age=0"), None);
    }

    #[test]
    fn page_query_is_empty_without_page() {
        assert!(page_query(None).is_empty());
        assert_eq!(page_query(Some(2)), [("page".to_owned(), "2".to_owned())]);
    }

    #[test]
    fn context_url_joins_without_double_slash() {
        let ctx = CliContext { base_url: "http://localhost:3000/".into(), session_token: None };
        assert_eq!(ctx.url("/admin/"), "http://localhost:3000/admin/");
    }
}
