use database::DbRepository;

// This main function is the entry point when running `cargo run -p web-server`.
// It wires settings, logging and the database together, then hands off to `run_server`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = configuration::load_settings()?;
    let _log_guard = configuration::init_logging(&settings.logging);

    let executor = database::connect(&settings.database).await?;
    let addr = settings.server.socket_addr()?;

    web_server::run_server(addr, DbRepository::new(executor)).await
}
