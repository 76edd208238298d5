use std::time::Duration;

use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use wire_web::handler::HandlerResult;
use wire_web::router::{Router, get, post};
use wire_web::{Config, Request, Response, Server, StatusCode};

async fn static_route(request: &Request, response: &mut Response) -> HandlerResult {
    response.write(b"WOHOO !!! It is working")?;
    response.flush(Some(request), false).await?;
    Ok(())
}

async fn param_route(request: &Request, response: &mut Response) -> HandlerResult {
    let output = format!("Id {}", request.param("id").unwrap_or_default());
    response.write(output.as_bytes())?;
    response.flush(Some(request), false).await?;
    Ok(())
}

async fn profile_route(request: &Request, response: &mut Response) -> HandlerResult {
    let id = request.param("id").unwrap_or_default();
    let name = request.param("name").unwrap_or_default();
    let output = format!("Id {id} Name {name}");
    response.write(output.as_bytes())?;
    response.flush(Some(request), false).await?;
    Ok(())
}

async fn wildcard_route(request: &Request, response: &mut Response) -> HandlerResult {
    let output = format!("wild path {}", request.param("anything").unwrap_or_default());
    response.write(output.as_bytes())?;
    response.flush(Some(request), false).await?;
    Ok(())
}

async fn wake_up(request: &Request, response: &mut Response) -> HandlerResult {
    info!(body = %String::from_utf8_lossy(request.body()), "wake up received");
    response.write_header(StatusCode::CREATED)?;
    response.flush(Some(request), false).await?;
    Ok(())
}

async fn stream(_request: &Request, response: &mut Response) -> HandlerResult {
    response.set_header("Content-Type", mime::TEXT_PLAIN.as_ref())?;
    response.set_header("Transfer-Encoding", "chunked")?;

    for chunk in ["Testing\n", "Transfer\n", "Encoding\n", "With\n", "HTTP\n", "1.1\n"] {
        if let Err(e) = response.write_chunk(chunk.as_bytes()).await {
            warn!(cause = %e, "write chunk failed");
            return Ok(());
        }
    }

    if let Err(e) = response.end_chunked().await {
        warn!(cause = %e, "end chunked failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder()
        .route("/api/static", get(static_route))
        .route("/api/param/:id", get(param_route))
        .route("/api/param/:id/profile/:name", get(profile_route))
        .route("/api/wildcard/*anything", get(wildcard_route))
        .route("/api/wake-up", post(wake_up))
        .route("/stream", get(stream))
        .build()
        .expect("routes must be valid");

    let config = Config::default()
        .with_buffer_size(4 * 1024)
        .with_header_limit(8 * 1024)
        .with_body_limit(2 * 1024 * 1024)
        .with_read_timeout(Duration::from_secs(10))
        .with_write_timeout(Duration::from_secs(10));

    let server = match Server::builder().address("0.0.0.0:1783").router(router).config(config).build() {
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
