use actix_web::web;

mod advance;
mod attendance;
mod auth;
mod salary;
mod settings;
mod staff;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(web::scope("/auth")
            .configure(auth::config))
        .service(web::scope("/staff")
            .configure(staff::config))
        .service(web::scope("/settings")
            .configure(settings::config))
        .service(web::scope("/attendance")
            .configure(attendance::config))
        .service(web::scope("/advance")
            .configure(advance::config))
        .service(web::scope("/salary")
            .configure(salary::config));
}
