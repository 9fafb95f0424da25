use actix_files::Files;
use actix_web::{App, HttpServer};
use dotenv::dotenv;
use log::info;

use schedule_service::config::Config;
use schedule_service::{db, handlers, service};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    service::log::init_logger();

    let config = Config::from_env();
    let pool = db::init_db_pool(&config.database_url)
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;

    info!("server starting on {}", config.bind_addr);
    let bind_addr = config.bind_addr.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(service::log::RequestLogger)
            .configure(|cfg| handlers::configure(cfg, pool.clone(), config.clone()))
            .service(Files::new("/", "web").index_file("index.html"))
    })
    .bind(bind_addr)?
    .run()
    .await
}
