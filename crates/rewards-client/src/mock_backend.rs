//! Mock rewards backend for development and testing
//!
//! Serves `/api/validate`, `/wallet/{pubkey}` and `/health` from an
//! in-process axum server bound to an ephemeral local port. Responses are
//! scripted per route and every request is recorded.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// A proof upload as seen by the backend
#[derive(Debug, Clone, Default)]
pub struct ReceivedProof {
    pub barcode_id: Option<String>,
    pub pubkey: Option<String>,
    pub image: Option<Vec<u8>>,
    pub image_file_name: Option<String>,
    pub image_content_type: Option<String>,
}

/// Scripted response for one route
#[derive(Debug, Clone)]
struct Scripted {
    status: u16,
    body: String,
    delay: Duration,
}

impl Scripted {
    fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    async fn respond(&self) -> Response {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body.clone(),
        )
            .into_response()
    }
}

struct MockState {
    validate: Mutex<Scripted>,
    wallet: Mutex<Scripted>,
    validate_calls: AtomicUsize,
    wallet_calls: AtomicUsize,
    proofs: Mutex<Vec<ReceivedProof>>,
    wallets: Mutex<Vec<String>>,
}

/// Mock backend server
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a mock backend on `127.0.0.1` with an OS-assigned port
    ///
    /// Defaults: validation awards 1 point, wallet lookups report zero.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockState {
            validate: Mutex::new(Scripted::ok(r#"{"status":"success","points_awarded":1}"#)),
            wallet: Mutex::new(Scripted::ok(r#"{"reward_balance":0,"points":0}"#)),
            validate_calls: AtomicUsize::new(0),
            wallet_calls: AtomicUsize::new(0),
            proofs: Mutex::new(Vec::new()),
            wallets: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/api/validate", post(validate_handler))
            .route("/wallet/{pubkey}", get(wallet_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock backend stopped: {}", e);
            }
        });

        debug!("Mock rewards backend listening on {}", addr);

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL to hand to a client
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Script the `/api/validate` response
    pub async fn set_validate_response(&self, status: u16, body: impl Into<String>) {
        let mut scripted = self.state.validate.lock().await;
        scripted.status = status;
        scripted.body = body.into();
    }

    /// Hold every `/api/validate` response for `delay`
    pub async fn set_validate_delay(&self, delay: Duration) {
        self.state.validate.lock().await.delay = delay;
    }

    /// Script the `/wallet/{pubkey}` response
    pub async fn set_wallet_response(&self, status: u16, body: impl Into<String>) {
        let mut scripted = self.state.wallet.lock().await;
        scripted.status = status;
        scripted.body = body.into();
    }

    pub fn validate_calls(&self) -> usize {
        self.state.validate_calls.load(Ordering::SeqCst)
    }

    pub fn wallet_calls(&self) -> usize {
        self.state.wallet_calls.load(Ordering::SeqCst)
    }

    /// Proof uploads received so far, in arrival order
    pub async fn received_proofs(&self) -> Vec<ReceivedProof> {
        self.state.proofs.lock().await.clone()
    }

    /// Wallet addresses looked up so far, in arrival order
    pub async fn requested_wallets(&self) -> Vec<String> {
        self.state.wallets.lock().await.clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, r#"{"status":"healthy"}"#)
}

async fn validate_handler(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    state.validate_calls.fetch_add(1, Ordering::SeqCst);

    let mut proof = ReceivedProof::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };

        match name.as_str() {
            "barcode_id" => proof.barcode_id = Some(String::from_utf8_lossy(&data).into_owned()),
            "pubkey" => proof.pubkey = Some(String::from_utf8_lossy(&data).into_owned()),
            "image" => {
                proof.image = Some(data.to_vec());
                proof.image_file_name = file_name;
                proof.image_content_type = content_type;
            }
            _ => {}
        }
    }

    state.proofs.lock().await.push(proof);

    let scripted = state.validate.lock().await.clone();
    scripted.respond().await
}

async fn wallet_handler(State(state): State<Arc<MockState>>, Path(pubkey): Path<String>) -> Response {
    state.wallet_calls.fetch_add(1, Ordering::SeqCst);
    state.wallets.lock().await.push(pubkey);

    let scripted = state.wallet.lock().await.clone();
    scripted.respond().await
}
