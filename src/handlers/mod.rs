pub mod schedule;
pub mod user;

use actix_web::{guard, web};

use crate::config::Config;
use crate::service::auth::AuthGate;
use crate::DbPool;

/// Route table shared by the binary and the integration tests. Read paths on
/// schedules are public; mutation and the admin listing sit behind the gate.
pub fn configure(cfg: &mut web::ServiceConfig, pool: DbPool, config: Config) {
    let auth = AuthGate::new(&config.jwt_secret);
    cfg.app_data(web::Data::new(pool))
        .app_data(web::Data::new(config))
        .service(
            web::scope("/api")
                .service(web::resource("/users/register").route(web::post().to(user::register)))
                .service(web::resource("/users/login").route(web::post().to(user::login)))
                .service(
                    web::resource("/users/{owner_id}/schedules")
                        .route(web::get().to(schedule::list_by_owner)),
                )
                .service(
                    web::resource("/admin/users")
                        .route(web::get().to(user::list_all))
                        .wrap(auth.clone()),
                )
                .service(
                    web::resource("/schedules")
                        .route(web::post().to(schedule::create))
                        .wrap(auth.clone()),
                )
                .service(
                    web::resource("/schedules/{schedule_id}")
                        .guard(guard::Get())
                        .route(web::get().to(schedule::get_by_id)),
                )
                .service(
                    web::resource("/schedules/{schedule_id}")
                        .guard(guard::Any(guard::Put()).or(guard::Delete()))
                        .route(web::put().to(schedule::update))
                        .route(web::delete().to(schedule::delete))
                        .wrap(auth),
                ),
        );
}
