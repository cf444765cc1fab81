use super::auth::{AuthorizationCallback, AuthorizationRequest};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use dialoguer::Input;
use tiny_http::{Response, Server};
use tracing::{debug, instrument};
use url::Url;

/// Shows the authorization URL to the user and captures the redirect.
///
/// Hosts choose how: a browser plus loopback listener, an embedded view, or a
/// prompt where the user pastes what they were redirected to.
#[async_trait]
pub trait AuthorizationPresenter: Send + Sync {
    async fn present(&self, request: &AuthorizationRequest) -> Result<AuthorizationCallback>;
}

/// Waits for the redirect on a loopback HTTP listener.
pub struct LocalCallbackPresenter {
    port: u16,
}

impl LocalCallbackPresenter {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl AuthorizationPresenter for LocalCallbackPresenter {
    #[instrument(name = "Waiting for authorization callback", skip_all, fields(port = self.port))]
    async fn present(&self, request: &AuthorizationRequest) -> Result<AuthorizationCallback> {
        // Bind before showing the URL so a fast redirect isn't missed
        let bind_addr = format!("127.0.0.1:{}", self.port);
        let server = Server::http(&bind_addr)
            .map_err(|e| AppError::Auth(format!("Failed to bind to {}: {}", bind_addr, e)))?;

        println!("Open this URL in your browser:\n{}", request.url);
        println!();
        println!("Waiting for authorization...");

        let port = self.port;
        tokio::task::spawn_blocking(move || receive_callback(&server, port))
            .await
            .map_err(|e| AppError::Other(e.into()))?
    }
}

const CALLBACK_PATH: &str = "/callback";

fn receive_callback(server: &Server, port: u16) -> Result<AuthorizationCallback> {
    loop {
        let request = server
            .recv()
            .map_err(|e| AppError::Auth(format!("Failed to receive request: {}", e)))?;

        let callback_url = format!("http://localhost:{}{}", port, request.url());
        let url = match Url::parse(&callback_url) {
            Ok(url) if url.path() == CALLBACK_PATH => url,
            _ => {
                debug!(path = request.url(), "Ignoring unrelated request");
                let _ = request.respond(Response::from_string("Not found").with_status_code(404));
                continue;
            }
        };
        let callback = AuthorizationCallback::from_redirect_url(&url);

        // The code is not exchanged yet, so success can't be claimed here
        let message = match &callback {
            Ok(_) => "Authorization received. You can close this window and return to the app.",
            Err(_) => "Authorization failed. You can close this window.",
        };
        request
            .respond(Response::from_string(message))
            .map_err(|e| AppError::Auth(format!("Failed to send response: {}", e)))?;

        return callback;
    }
}

/// For hosts without a listener: the user pastes the redirect URL or the code.
#[derive(Default)]
pub struct ConsolePresenter;

#[async_trait]
impl AuthorizationPresenter for ConsolePresenter {
    async fn present(&self, request: &AuthorizationRequest) -> Result<AuthorizationCallback> {
        println!("Open this URL in your browser:\n{}", request.url);
        println!();

        let input = tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt("Paste the URL you were redirected to (or the code)")
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| AppError::Other(e.into()))?
        .map_err(|e| AppError::Auth(format!("Failed to read input: {}", e)))?;

        parse_pasted(&input)
    }
}

fn parse_pasted(input: &str) -> Result<AuthorizationCallback> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::AuthorizationCancelled("no code entered".to_string()));
    }

    match Url::parse(input) {
        Ok(url) => AuthorizationCallback::from_redirect_url(&url),
        Err(_) => Ok(AuthorizationCallback {
            code: input.to_string(),
            state: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::thread;

    /// Sends one GET and returns the raw response.
    fn get(port: u16, path: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        write!(
            stream,
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    fn bind() -> (Server, u16) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        (server, port)
    }

    #[test]
    fn test_receive_callback_skips_unrelated_paths() {
        let (server, port) = bind();
        let browser = thread::spawn(move || {
            vec![
                get(port, "/favicon.ico"),
                get(port, "/callbackfoo?code=forged&state=forged"),
                get(port, "/callback?code=abc&state=xyz"),
            ]
        });

        let callback = receive_callback(&server, port).unwrap();
        let responses = browser.join().unwrap();

        assert_eq!(
            callback,
            AuthorizationCallback {
                code: "abc".to_string(),
                state: Some("xyz".to_string()),
            }
        );
        assert!(responses[0].starts_with("HTTP/1.1 404"));
        assert!(responses[1].starts_with("HTTP/1.1 404"));
        assert!(responses[2].starts_with("HTTP/1.1 200"));
        assert!(responses[2].contains("Authorization received"));
        assert!(!responses[2].contains("successful"));
    }

    #[test]
    fn test_receive_callback_denied() {
        let (server, port) = bind();
        let browser = thread::spawn(move || get(port, "/callback?error=access_denied&state=xyz"));

        let result = receive_callback(&server, port);
        let response = browser.join().unwrap();

        assert!(matches!(result, Err(AppError::AuthorizationCancelled(_))));
        assert!(response.contains("Authorization failed"));
    }

    #[test]
    fn test_parse_pasted_url() {
        let callback =
            parse_pasted(" http://localhost:3000/callback?code=abc&state=xyz \n").unwrap();
        assert_eq!(callback.code, "abc");
        assert_eq!(callback.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_pasted_code() {
        let callback = parse_pasted("abc123").unwrap();
        assert_eq!(callback.code, "abc123");
        assert_eq!(callback.state, None);
    }

    #[test]
    fn test_parse_pasted_empty() {
        assert!(matches!(
            parse_pasted("   "),
            Err(AppError::AuthorizationCancelled(_))
        ));
    }
}
