use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;
use wire_web::handler::HandlerResult;
use wire_web::router::{Router, get};
use wire_web::{Request, Response, Server};

async fn hello_world(request: &Request, response: &mut Response) -> HandlerResult {
    response.set_header("Content-Type", mime::TEXT_PLAIN_UTF_8.as_ref())?;
    response.write(b"hello world")?;
    response.flush(Some(request), false).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder().route("/", get(hello_world)).build().expect("routes must be valid");

    let server = match Server::builder().router(router).address("127.0.0.1:3000").build() {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "invalid server setup");
            return;
        }
    };

    if let Err(e) = server.start().await {
        error!(cause = %e, "server stopped");
    }
}
