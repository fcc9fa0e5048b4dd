use super::actions::Action;
use super::{Item, ItemArg, Workflow};
use reqwest::Url;

const KEYWORD: &str = "server";

/// Absolute http(s) URL, or None
pub fn parse_server_url(text: &str) -> Option<Url> {
    let url = Url::parse(text.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Some(url),
        _ => None,
    }
}

pub fn items(wf: &Workflow, arg: &str) -> Vec<Item> {
    let text = arg.trim();

    if text.is_empty() {
        let item = if wf.config.has_server() {
            Item::new(wf.config.server_url.clone()).subtitle("Current server")
        } else {
            Item::new("Enter the URL of your Redmine server")
        };
        return vec![item];
    }

    match parse_server_url(text) {
        Some(_) => {
            let url = text.trim_end_matches('/').to_string();
            vec![Item::new(format!("Use server at {}", url))
                .subtitle("Save this server address")
                .arg(ItemArg::action(KEYWORD, &Action::ChangeServer { url }))]
        }
        None => vec![Item::new(text.to_string()).subtitle("Not a valid http(s) URL")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_url() {
        assert!(parse_server_url("https://redmine.example.com").is_some());
        assert!(parse_server_url("http://localhost:3000/redmine").is_some());
        assert!(parse_server_url("redmine.example.com").is_none());
        assert!(parse_server_url("ftp://redmine.example.com").is_none());
        assert!(parse_server_url("").is_none());
    }
}
