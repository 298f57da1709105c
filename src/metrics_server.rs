use crate::error::AppError;
use crate::metrics;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

/// Serve Prometheus metrics over a minimal HTTP listener.
///
/// Only `/metrics` and `/health` exist; anything else is a 404. Request
/// parsing is a prefix check on the first read.
pub async fn serve(port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind metrics server: {}", e)))?;

    info!("Metrics server listening on {}", addr);

    loop {
        match listener.accept().await {
            Ok((socket, _)) => {
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(socket).await {
                        error!("Metrics connection error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_connection(mut socket: TcpStream) -> Result<(), AppError> {
    let mut buffer = [0u8; 1024];
    socket.read(&mut buffer).await?;

    let request = String::from_utf8_lossy(&buffer);
    let response = if request.starts_with("GET /metrics") {
        match metrics::gather_metrics() {
            Ok(body) => http_response("200 OK", "text/plain; version=0.0.4", &body),
            Err(e) => {
                error!("Failed to gather metrics: {}", e);
                http_response("500 Internal Server Error", "text/plain", "metrics error")
            }
        }
    } else if request.starts_with("GET /health") {
        http_response("200 OK", "text/plain", "OK")
    } else {
        http_response("404 Not Found", "text/plain", "Not Found")
    };

    socket.write_all(response.as_bytes()).await?;
    Ok(())
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}
