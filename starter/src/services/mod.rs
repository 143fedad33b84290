use crate::web;

pub mod home;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home::index).service(home::redirect);
}
