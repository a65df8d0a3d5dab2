use std::io::ErrorKind;
use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing_actix_web::TracingLogger;

use crate::authentication::AdminAuth;
use crate::config::{DatabaseSettings, Settings};
use crate::email_client::EmailClient;
use crate::error::ApiError;
use crate::repository::{
    AdminRepository, NewsletterRepository, PgRepository, SubscriberRepository,
};
use crate::routes;
use crate::services::{PublicationManager, SubscriptionManager};

/// Base URL used when building links that leave the service (e.g. the
/// unsubscribe link inside outbound emails).
pub struct ApplicationBaseUrl(pub String);

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let repository = PgRepository::new(db_pool);

        let sender_email = config
            .get_email_client_sender()
            .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;
        let email_client = EmailClient::new(
            config.email_client.base_url.clone(),
            sender_email,
            config.email_client.api_key.clone(),
            None,
        );

        // The configured admin is the author identity behind every
        // privileged write; make sure its row exists before serving.
        let admin_id = repository
            .upsert_admin(&config.admin.username, &config.admin.name)
            .await
            .map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;
        let admin_auth = AdminAuth {
            token: config.admin.token.clone(),
            admin_id,
        };

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            repository,
            email_client,
            admin_auth,
            config.get_app_base_url(),
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run<R>(
    listener: TcpListener,
    repository: R,
    email_client: EmailClient,
    admin_auth: AdminAuth,
    base_url: String,
) -> Result<Server, std::io::Error>
where
    R: SubscriberRepository + NewsletterRepository + AdminRepository,
{
    let subscriptions = web::Data::new(SubscriptionManager::new(repository.clone()));
    let publications = web::Data::new(PublicationManager::new(repository));
    let email_client = web::Data::new(email_client);
    let admin_auth = web::Data::new(admin_auth);
    let base_url = web::Data::new(ApplicationBaseUrl(base_url));

    let server = HttpServer::new(move || {
        // Malformed JSON bodies go through the same stable error shape as
        // the typed service errors.
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into());

        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(routes::health_check))
            .route("/subscribers", web::post().to(routes::create_subscriber::<R>))
            .route("/subscribers", web::get().to(routes::list_subscribers::<R>))
            .route(
                "/subscribers/{id}",
                web::delete().to(routes::delete_subscriber::<R>),
            )
            .route("/unsubscribe", web::post().to(routes::unsubscribe::<R>))
            .route("/newsletters", web::get().to(routes::list_newsletters::<R>))
            .route("/newsletters", web::post().to(routes::create_newsletter::<R>))
            .route("/newsletters/{id}", web::get().to(routes::get_newsletter::<R>))
            .route(
                "/newsletters/{id}",
                web::put().to(routes::update_newsletter::<R>),
            )
            .route(
                "/newsletters/{id}",
                web::delete().to(routes::delete_newsletter::<R>),
            )
            .route("/admin/stats", web::get().to(routes::admin_stats::<R>))
            .app_data(json_config)
            .app_data(subscriptions.clone())
            .app_data(publications.clone())
            .app_data(email_client.clone())
            .app_data(admin_auth.clone())
            .app_data(base_url.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
