//! Download of a single image from a shared Google Drive link.

use std::time::Duration;

use futures_util::StreamExt;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use tracing::debug;

/// Name given to the downloaded image in the result table.
pub const DRIVE_FILE_NAME: &str = "imagem_drive.jpg";

const DOWNLOAD_URL: &str = "https://drive.google.com/uc?export=download";

/// Upper bound on the downloaded body.
const MAX_DOWNLOAD_BYTES: usize = 50 * 1024 * 1024;

lazy_static! {
    /// `.../file/d/<id>/view` style links.
    static ref FILE_PATH_ID: Regex = Regex::new(r"/d/([a-zA-Z0-9_-]+)").unwrap();

    /// `...?id=<id>` style links.
    static ref QUERY_ID: Regex = Regex::new(r"id=([a-zA-Z0-9_-]+)").unwrap();

    /// Confirmation token Drive appends for files it will not scan, in a
    /// redirect URL or in a link on the warning page.
    static ref CONFIRM_TOKEN: Regex = Regex::new(r"confirm=([0-9A-Za-z_-]+)").unwrap();

    /// Target of the download form on the warning page.
    static ref FORM_ACTION: Regex = Regex::new(r#"<form[^>]*\baction="([^"]+)""#).unwrap();

    /// Hidden fields of that form (`id`, `export`, `confirm`, `uuid`).
    static ref HIDDEN_INPUT: Regex =
        Regex::new(r#"<input[^>]*\btype="hidden"[^>]*\bname="([^"]+)"[^>]*\bvalue="([^"]*)""#).unwrap();
}

/// How to get past Drive's "can't scan this file for viruses" page.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Confirmation {
    /// Repeat the download URL with `confirm=<token>`.
    Token(String),
    /// Submit the page's download form.
    Form {
        action: String,
        fields: Vec<(String, String)>,
    },
}

impl Confirmation {
    /// Read the confirmation out of the warning page markup.
    fn from_html(page: &str) -> Option<Self> {
        if let Some(action) = FORM_ACTION.captures(page).and_then(|caps| caps.get(1)) {
            let fields: Vec<(String, String)> = HIDDEN_INPUT
                .captures_iter(page)
                .map(|caps| (unescape(&caps[1]), unescape(&caps[2])))
                .collect();
            if fields.iter().any(|(name, _)| name == "confirm") {
                return Some(Confirmation::Form {
                    action: unescape(action.as_str()),
                    fields,
                });
            }
        }

        confirm_token(page).map(Confirmation::Token)
    }

    fn request(&self, client: &reqwest::Client, file_id: &str) -> reqwest::RequestBuilder {
        match self {
            Confirmation::Token(token) => client.get(download_url(file_id, Some(token))),
            Confirmation::Form { action, fields } => client.get(action).query(fields),
        }
    }
}

/// Undo the entity escaping Drive applies to attribute values.
fn unescape(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
}

fn is_html_content_type(value: &str) -> bool {
    value
        .trim_start()
        .get(..9)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("text/html"))
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_html_content_type)
}

/// File id from a share link, trying the path form before the query form.
pub fn drive_file_id(link: &str) -> Option<String> {
    [&*FILE_PATH_ID, &*QUERY_ID]
        .iter()
        .find_map(|re| re.captures(link))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn confirm_token(url: &str) -> Option<String> {
    CONFIRM_TOKEN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn download_url(file_id: &str, confirm: Option<&str>) -> String {
    match confirm {
        Some(token) => format!("{}&confirm={}&id={}", DOWNLOAD_URL, token, file_id),
        None => format!("{}&id={}", DOWNLOAD_URL, file_id),
    }
}

/// Fetch the file behind `link`. Each request is bounded by `timeout`.
///
/// When Drive answers with a confirmation redirect or its virus-scan warning
/// page instead of the file, the download is retried once past it. An HTML
/// body after that is an error, never image bytes.
pub async fn fetch(link: &str, timeout: Duration) -> anyhow::Result<Vec<u8>> {
    let file_id = drive_file_id(link)
        .ok_or_else(|| anyhow::anyhow!("Not a Google Drive file link: {}", link))?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("vocr-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?;

    let first = client
        .get(download_url(&file_id, None))
        .send()
        .await?
        .error_for_status()?;

    let response = if let Some(token) = confirm_token(first.url().as_str()) {
        debug!("Drive redirected to a confirmation URL");
        Confirmation::Token(token)
            .request(&client, &file_id)
            .send()
            .await?
            .error_for_status()?
    } else if is_html(&first) {
        let page = first.text().await?;
        let confirmation = Confirmation::from_html(&page).ok_or_else(|| {
            anyhow::anyhow!("Drive returned a web page instead of the file; is the link shared publicly?")
        })?;
        debug!("Drive served a confirmation page");
        confirmation
            .request(&client, &file_id)
            .send()
            .await?
            .error_for_status()?
    } else {
        first
    };

    if is_html(&response) {
        anyhow::bail!("Drive returned a web page instead of the file");
    }

    let mut stream = response.bytes_stream();
    let mut body = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > MAX_DOWNLOAD_BYTES {
            anyhow::bail!("Download exceeds {} bytes", MAX_DOWNLOAD_BYTES);
        }
        body.extend_from_slice(&chunk);
    }

    debug!("Downloaded {} bytes from Drive", body.len());
    Ok(body)
}
