use std::future::{ready, Ready};
use std::io::Write;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use env_logger::Builder;
use futures_util::future::LocalBoxFuture;
use log::{info, Level};

/// Logs every request line and the status it resolved to.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerService { service }))
    }
}

pub struct RequestLoggerService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let line = format!("{} {}", req.method(), req.uri());
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            info!("{line} -> {}", res.status());
            Ok(res)
        })
    }
}

pub fn init_logger() {
    Builder::from_default_env()
        .parse_default_env()
        .format(|buf, record| {
            let color = match record.level() {
                Level::Error => "\x1b[31;1m",
                Level::Warn => "\x1b[33;1m",
                Level::Info => "\x1b[32;1m",
                Level::Debug => "\x1b[34;1m",
                Level::Trace => "\x1b[35;1m",
            };
            writeln!(
                buf,
                "{color}{:<5}\x1b[0m [{}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init()
}
