use actix_web::web;

pub mod community;
pub mod tasks;
pub mod users;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(users::configure)
            .configure(tasks::configure)
            .configure(community::configure),
    );
}
