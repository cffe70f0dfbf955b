use hostel::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenvy::dotenv().ok();
	hostel::init_tracing();

	let config = Config::from_env()?;
	hostel::start_server(config).await
}
