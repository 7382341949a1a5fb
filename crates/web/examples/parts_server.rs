//! curl -v http://127.0.0.1:5000/api/example
//! curl -v -H 'Content-Type: application/json' -d '{"username":"u","password":"p"}' http://127.0.0.1:5000/api/part/42/bob

use async_trait::async_trait;
use http::StatusCode;
use relay_web::handler::{BoxError, Endpoint, RequestHandler};
use relay_web::{Method, Request, Response, Router, Server};
use serde::Deserialize;
use std::fmt::Write;
use tracing::{debug, Level};

#[derive(Default)]
struct ExampleHandler;

#[async_trait]
impl RequestHandler for ExampleHandler {
    async fn handle(&mut self, _request: &Request) -> Result<Response, BoxError> {
        Ok(Response::new().status(StatusCode::OK).with_default_status_message())
    }
}

impl Endpoint for ExampleHandler {
    const METHOD: Method = Method::Get;
    const PATH: &'static str = "/api/example";
}

impl Drop for ExampleHandler {
    fn drop(&mut self) {
        debug!("drop example handler");
    }
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Default)]
struct PartsHandler {
    part: u32,
    name: String,
    credentials: Option<Credentials>,
}

#[async_trait]
impl RequestHandler for PartsHandler {
    fn preprocess(&mut self, request: &mut Request) -> Result<(), BoxError> {
        (self.part, self.name) = request.captures::<(u32, String)>()?;
        let body = request.body().ok_or("json body required")?;
        self.credentials = Some(body.json()?);
        Ok(())
    }

    async fn handle(&mut self, _request: &Request) -> Result<Response, BoxError> {
        let credentials = self.credentials.as_ref().ok_or("preprocess didn't run")?;

        let mut response = Response::new().status(StatusCode::OK);
        writeln!(response, "hello from parts handler!")?;
        writeln!(response, "current part: {}, name: {}", self.part, self.name)?;
        writeln!(response, "password: '{}'", credentials.password)?;
        write!(response, "username: '{}'", credentials.username)?;
        Ok(response)
    }
}

impl Endpoint for PartsHandler {
    const METHOD: Method = Method::Post;
    const PATH: &'static str = "/api/part/{int}/{string}";
}

fn main() -> Result<(), BoxError> {
    let router = Router::builder().endpoint::<ExampleHandler>().endpoint::<PartsHandler>().build()?;

    let server = Server::builder().router(router).subscriber(relay_web::logging::fmt_dispatch(Level::DEBUG)).build()?;
    server.run("127.0.0.1", 5000)?;
    Ok(())
}
