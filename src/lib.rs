//! Admin service for users, roles, permissions, employees and enquiries,
//! with backup and cache tooling for the console.

pub mod db;
pub mod domain;
pub mod models;
pub mod repository;
pub mod schema;

#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod forms;
#[cfg(feature = "server")]
pub mod middleware;
#[cfg(feature = "server")]
pub mod pagination;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod services;

#[cfg(feature = "server")]
pub use server::{configure, run};

#[cfg(feature = "server")]
mod server {
    use actix_cors::Cors;
    use actix_files::Files;
    use actix_identity::IdentityMiddleware;
    use actix_session::{SessionMiddleware, storage::CookieSessionStore};
    use actix_web::cookie::Key;
    use actix_web::{App, HttpServer, middleware, web};
    use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
    use tera::Tera;

    use crate::db::establish_connection_pool;
    use crate::domain::types::Guard;
    use crate::middleware::{AdminAccess, RedirectUnauthorized};
    use crate::models::config::ServerConfig;
    use crate::repository::DieselRepository;
    use crate::routes::{
        api, auth, dashboard, employees, enquiries, health, permission_groups, permissions,
        roles, users,
    };

    /// Registers every route. Public routes come first; the catch-all scope
    /// holding the signed-in pages is last.
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.service(health::health)
            .service(auth::show_login)
            .service(auth::do_login)
            .service(auth::logout)
            .service(auth::issue_token)
            .service(enquiries::submit)
            .service(
                web::scope("/api/v1")
                    .wrap(AdminAccess::new(Guard::Api, "/api/v1"))
                    .service(api::api_v1_users)
                    .service(api::api_v1_enquiries),
            )
            .service(
                web::scope("/admin")
                    .wrap(AdminAccess::new(Guard::Web, "/admin"))
                    .service(users::index)
                    .service(users::create)
                    .service(users::store)
                    .service(users::show)
                    .service(users::edit)
                    .service(users::update)
                    .service(users::destroy)
                    .service(users::toggle_status)
                    .service(roles::index)
                    .service(roles::create)
                    .service(roles::store)
                    .service(roles::show)
                    .service(roles::edit)
                    .service(roles::update)
                    .service(roles::destroy)
                    .service(permissions::index)
                    .service(permissions::create)
                    .service(permissions::store)
                    .service(permissions::show)
                    .service(permissions::edit)
                    .service(permissions::update)
                    .service(permissions::destroy)
                    .service(permission_groups::index)
                    .service(permission_groups::create)
                    .service(permission_groups::store)
                    .service(permission_groups::show)
                    .service(permission_groups::edit)
                    .service(permission_groups::update)
                    .service(permission_groups::destroy)
                    .service(employees::index)
                    .service(employees::create)
                    .service(employees::store)
                    .service(employees::show)
                    .service(employees::edit)
                    .service(employees::update)
                    .service(employees::destroy)
                    .service(enquiries::index)
                    .service(enquiries::export)
                    .service(enquiries::show)
                    .service(enquiries::edit)
                    .service(enquiries::update)
                    .service(enquiries::destroy),
            )
            .service(
                web::scope("")
                    .wrap(RedirectUnauthorized)
                    .service(dashboard::home)
                    .service(dashboard::dashboard),
            );
    }

    /// Builds and runs the Actix-Web HTTP server using the provided configuration.
    pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
        // Establish Diesel connection pool for the SQLite database.
        let pool = establish_connection_pool(&server_config.database_url).map_err(|e| {
            std::io::Error::other(format!("Failed to establish database connection: {e}"))
        })?;

        let repo = DieselRepository::new(pool);

        // Keys and stores for identity, sessions, and flash messages.
        let secret_key = Key::try_from(server_config.secret.as_bytes())
            .map_err(|e| std::io::Error::other(format!("Invalid secret: {e}")))?;

        let message_store = CookieMessageStore::builder(secret_key.clone()).build();
        let message_framework = FlashMessagesFramework::builder(message_store).build();

        let tera = Tera::new(&server_config.templates_dir)
            .map_err(|e| std::io::Error::other(format!("Template parsing error(s): {e}")))?;

        let bind_address = (server_config.address.clone(), server_config.port);
        log::info!("Listening on {}:{}", bind_address.0, bind_address.1);

        HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .wrap(message_framework.clone())
                .wrap(IdentityMiddleware::default())
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                        .cookie_secure(false) // set to true in prod
                        .cookie_domain(Some(server_config.domain.clone()))
                        .build(),
                )
                .wrap(middleware::Compress::default())
                .wrap(middleware::Logger::default())
                .service(Files::new("/assets", "./assets"))
                .configure(configure)
                .app_data(web::Data::new(tera.clone()))
                .app_data(web::Data::new(repo.clone()))
                .app_data(web::Data::new(server_config.clone()))
        })
        .bind(bind_address)?
        .run()
        .await
    }
}
