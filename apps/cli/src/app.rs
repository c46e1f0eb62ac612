//! Command implementations.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use snaptrack_client::{HttpApi, StaticToken, TokenStore, WsPushTransport};
use snaptrack_protocol::fields::{self, PollStatus};
use snaptrack_protocol::{JobHandle, ProgressEvent, UploadRequest};
use snaptrack_tracker::{CredentialProvider, NoCredentials, StatusApi, TransferClient};

use crate::Command;
use crate::config::Config;

/// Exit code after Ctrl-C, as shells report SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

pub async fn run(
    config: Config,
    auth_token: Option<String>,
    command: Command,
) -> anyhow::Result<ExitCode> {
    let auth = credentials(&config, auth_token.as_deref());
    match command {
        Command::Upload {
            file,
            content_type,
            json,
        } => upload(&config, auth, &file, content_type, json).await,
        Command::Status { job } => status(&config, auth.as_ref(), &job).await,
        Command::Login { token } => {
            let store = token_store(&config)?;
            store.set_auth_token(token.trim())?;
            println!("token saved to {}", store.path().display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Logout => {
            let store = token_store(&config)?;
            store.clear_auth_token()?;
            println!("token removed");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn upload(
    config: &Config,
    auth: Arc<dyn CredentialProvider>,
    file: &Path,
    content_type: Option<String>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut request = UploadRequest::new(data, name);
    if let Some(content_type) = content_type {
        request = request.with_content_type(content_type);
    }

    let api = Arc::new(HttpApi::new(config.require_api_base()?)?);
    let client = TransferClient::new(api.clone())
        .with_upload(api)
        .with_push(Arc::new(WsPushTransport::new()))
        .with_credentials(auth)
        .with_config(config.tracker_config());

    if client.config().push_base().is_none() {
        tracing::debug!("no push channel configured, polling only");
    }

    let mut stream = client.upload(&request);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut outcome = None;
    loop {
        tokio::select! {
            event = stream.recv() => {
                let Some(event) = event else { break };
                println!("{}", render(&event, json)?);
                if event.is_terminal() {
                    outcome = Some(event);
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted, cancelling upload");
                stream.cancel().await;
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
        }
    }

    Ok(match outcome {
        Some(ProgressEvent::Completed { .. }) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn status(
    config: &Config,
    provider: &dyn CredentialProvider,
    job: &str,
) -> anyhow::Result<ExitCode> {
    let api = HttpApi::new(config.require_api_base()?)?;
    let auth = provider.authorization();
    let body = api.job_status(&JobHandle::new(job), auth.as_deref()).await?;

    match fields::poll_status(&body) {
        PollStatus::Ready(result) => println!("ready: result {result}"),
        PollStatus::Pending => println!("pending"),
    }
    Ok(ExitCode::SUCCESS)
}

fn token_store(config: &Config) -> anyhow::Result<TokenStore> {
    let path = config
        .token_path()
        .context("cannot determine token file location; set `token_file`")?;
    TokenStore::open(path.clone())
        .with_context(|| format!("opening token store {}", path.display()))
}

/// Credentials for API requests.
///
/// A token given on the command line wins over the token store. Without
/// either, requests go out unauthenticated.
fn credentials(config: &Config, auth_token: Option<&str>) -> Arc<dyn CredentialProvider> {
    if let Some(token) = auth_token {
        return Arc::new(StaticToken::new(token));
    }
    match token_store(config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "token store unavailable, sending requests without credentials"
            );
            Arc::new(NoCredentials)
        }
    }
}

/// Formats one event for stdout.
fn render(event: &ProgressEvent, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string(event)?);
    }
    Ok(match event {
        ProgressEvent::Started => "upload started".to_string(),
        ProgressEvent::Progress { percent } => format!("uploading {percent}%"),
        ProgressEvent::Accepted { job } => format!("accepted as job {job}"),
        ProgressEvent::Completed { result_id, source } => {
            format!("completed: result {result_id} (via {source})")
        }
        ProgressEvent::Failed { reason } => format!("failed: {reason}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaptrack_protocol::{CompletionSource, ResultId};

    #[test]
    fn render_human() {
        assert_eq!(
            render(&ProgressEvent::Progress { percent: 42 }, false).unwrap(),
            "uploading 42%"
        );
        assert_eq!(
            render(
                &ProgressEvent::Completed {
                    result_id: ResultId::new("R1"),
                    source: CompletionSource::Push,
                },
                false
            )
            .unwrap(),
            "completed: result R1 (via push)"
        );
        let failed = ProgressEvent::Failed {
            reason: "no job id returned".into(),
        };
        assert_eq!(
            render(&failed, false).unwrap(),
            "failed: no job id returned"
        );
    }

    #[test]
    fn render_json_lines() {
        let line = render(
            &ProgressEvent::Accepted {
                job: JobHandle::new("J1"),
            },
            true,
        )
        .unwrap();
        assert_eq!(line, r#"{"type":"accepted","job":"J1"}"#);
    }

    #[test]
    fn credentials_from_token_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            token_file: Some(tmp.path().join("tokens.json")),
            ..Config::default()
        };
        token_store(&config).unwrap().set_auth_token("abc").unwrap();

        assert_eq!(
            credentials(&config, None).authorization().as_deref(),
            Some("Bearer abc")
        );
    }

    #[test]
    fn command_line_token_overrides_store() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            token_file: Some(tmp.path().join("tokens.json")),
            ..Config::default()
        };
        token_store(&config).unwrap().set_auth_token("old").unwrap();

        let auth = credentials(&config, Some(" flag "));
        assert_eq!(auth.authorization().as_deref(), Some("Bearer flag"));
    }

    #[test]
    fn blank_command_line_token_sends_nothing() {
        let config = Config::default();
        assert_eq!(credentials(&config, Some("  ")).authorization(), None);
    }
}
