use dotenvy::dotenv;

use larabasex::models::config::load_server_config;
use larabasex::run;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let server_config = match load_server_config() {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {err}");
            std::process::exit(1);
        }
    };

    if server_config.secret.len() < 64 {
        log::error!("The configured secret must be at least 64 bytes long");
        std::process::exit(1);
    }

    run(server_config).await
}
