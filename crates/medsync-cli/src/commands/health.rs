//! Health command handler

use anyhow::{Context, Result};

use medsync_core::{Config, HttpRemoteClient, RemoteClient};

use crate::output::{Output, OutputFormat};

/// Check that the remote API is reachable
pub async fn check(config: &Config, output: &Output) -> Result<()> {
    let client = HttpRemoteClient::from_config(config)?;
    let health = client
        .health()
        .await
        .with_context(|| format!("Health check failed for {}", client.base_url()))?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "api_url": client.base_url().as_str(),
                    "status": health.status
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", health.status);
        }
        OutputFormat::Human => {
            output.success(&format!("{} is {}", client.base_url(), health.status));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_reports_server_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let config = Config {
            api_url: Some(server.url()),
            ..Config::default()
        };
        check(&config, &Output::new(OutputFormat::Quiet)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_requires_url() {
        let err = check(&Config::default(), &Output::new(OutputFormat::Quiet))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("api_url"));
    }
}
