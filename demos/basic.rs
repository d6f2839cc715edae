use jsonapi_http::{ApiClient, ClientOptions, RetryPolicy};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct User {
    id: u64,
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("API_BASE_URL")?;

    let client = ApiClient::new(ClientOptions::new(base_url).with_timeout_ms(5_000));
    client.set_default_headers([("X-Client", "jsonapi-http-demo")]);

    let users: Vec<User> = client
        .retry_request(|| client.get("/users", None))
        .await?;
    for user in &users {
        println!("{} {}", user.id, user.name);
    }

    let payload = serde_json::json!({"name": "Kit"});
    let created: User = jsonapi_http::retry_request(
        || client.post("/users", &payload, None),
        RetryPolicy::new(1, std::time::Duration::ZERO),
    )
    .await?;
    println!("created {created:?}");

    Ok(())
}
