// lazyorg binary.
// Lists an organization's public repositories and prints users older than 25.

use dotenv::dotenv;

use lazyorg::{Config, GitHubClient, OrgClient, Result, UserStore, batch_processing};

fn init_dotenv() {
    if let Ok(path) = dotenv() {
        let path = path.to_string_lossy();
        println!("additional environment variables loaded from {path}");
    }
}

async fn list_repos(config: &Config, org: &str) -> Result<()> {
    let client = GitHubClient::from_config(&config.github)?;
    let mut org_client = OrgClient::new(client, &config.github.base_url, org);

    let license = config.github.license.as_deref();
    for name in org_client.list_public_repos(license).await? {
        println!("{name}");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_dotenv();
    lazyorg::init_logging();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };

    if let Some(org) = config.github.org.as_deref() {
        if let Err(e) = list_repos(&config, org).await {
            log::error!("listing repositories for {org} failed: {e}");
            std::process::exit(1);
        }
    }

    let result = async {
        let store = UserStore::open(&config.database).await?;
        batch_processing(store, config.batch_size, |row| {
            println!("{}", serde_json::Value::Object(row));
        })
        .await
    }
    .await;

    match result {
        Ok(count) => log::info!("{count} matching rows"),
        Err(e) => {
            log::error!("batch processing failed: {e}");
            std::process::exit(1);
        }
    }
}
