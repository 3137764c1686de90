use std::sync::Arc;

use dashboard_api_client::{ApiClient, Config, Credentials, FileSession};
use serde_json::json;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional: enable basic logging for the example
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    // Load configuration from a JSON file placed next to the binary
    let cfg = Config::from_file("config.json")?;
    let session = Arc::new(FileSession::open(".dashboard-session.json")?);
    println!("session file: {}", session.path().display());
    let client = ApiClient::new(cfg, session)?;

    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("session event: {event:?}");
        }
    });

    client
        .login(&Credentials {
            username: "admin".into(),
            password: "change-me".into(),
        })
        .await?;

    let countries = client.get("/countries").await?;
    println!("countries: {countries:?}");

    let csrf = client.fetch_csrf_token().await?;
    client
        .post("/countries", Some(&json!({ "name": "Peru" })), Some(&csrf.token))
        .await?;

    client.logout().await?;
    Ok(())
}
