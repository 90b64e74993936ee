//! Shared fakes and a scripted LCD server for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use oracle_feeder::blockchain::types::{
    BlockHeight, ChainError, ChainResult, ExchangeRate, OracleParams, TxHash,
};
use oracle_feeder::blockchain::{Broadcaster, ChainQuery, RateQuery};
use oracle_feeder::voting::{OracleMsg, SaltSource, VoteMessage, VoterIdentity};

/// A request seen by the mock LCD.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Start an HTTP/1.1 server on an ephemeral port that answers each request
/// with `f(request)` and records what it saw.
pub async fn start_mock_lcd<F>(f: F) -> (SocketAddr, Arc<Mutex<Vec<SeenRequest>>>)
where
    F: Fn(&SeenRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let _ = serve_one(socket, f.as_ref(), &log).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

async fn serve_one<F>(
    mut socket: TcpStream,
    f: &F,
    log: &Mutex<Vec<SeenRequest>>,
) -> std::io::Result<()>
where
    F: Fn(&SeenRequest) -> (u16, String),
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut parts = head.lines().next().unwrap_or_default().split_whitespace();
    let request = SeenRequest {
        method: parts.next().unwrap_or_default().to_string(),
        path: parts.next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    };
    let (status, body) = f(&request);
    log.lock().unwrap().push(request);

    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

pub fn voter() -> VoterIdentity {
    VoterIdentity {
        feeder: "terra1feeder".to_string(),
        validator: "terravaloper1validator".to_string(),
    }
}

pub fn reference_rates() -> Vec<ExchangeRate> {
    vec![
        ExchangeRate::new("uusd", "1.2"),
        ExchangeRate::new("ukrw", "1500.5"),
        ExchangeRate::new("xyz", "9"),
    ]
}

/// Chain whose height moves through a script; the last entry repeats.
pub struct ScriptedChain {
    heights: Mutex<VecDeque<BlockHeight>>,
    pub height_queries: AtomicU32,
}

impl ScriptedChain {
    pub fn new(heights: &[BlockHeight]) -> Arc<Self> {
        Arc::new(Self {
            heights: Mutex::new(heights.iter().copied().collect()),
            height_queries: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl ChainQuery for ScriptedChain {
    async fn latest_block_height(&self) -> ChainResult<BlockHeight> {
        self.height_queries.fetch_add(1, Ordering::SeqCst);
        let mut heights = self.heights.lock().unwrap();
        let height = *heights.front().unwrap_or(&0);
        if heights.len() > 1 {
            heights.pop_front();
        }
        Ok(height)
    }

    async fn oracle_params(&self) -> ChainResult<OracleParams> {
        Ok(OracleParams::default())
    }
}

/// Chain whose height advances by `step` on every query, starting at `start`.
pub struct AdvancingChain {
    next: AtomicU64,
    step: u64,
}

impl AdvancingChain {
    pub fn new(start: u64, step: u64) -> Arc<Self> {
        Arc::new(Self {
            next: AtomicU64::new(start),
            step,
        })
    }
}

#[async_trait]
impl ChainQuery for AdvancingChain {
    async fn latest_block_height(&self) -> ChainResult<BlockHeight> {
        Ok(self.next.fetch_add(self.step, Ordering::SeqCst))
    }

    async fn oracle_params(&self) -> ChainResult<OracleParams> {
        Err(ChainError::Decode("params endpoint down".to_string()))
    }
}

/// Rate source that fails for the first `failures` calls.
pub struct FlakyRates {
    failures: AtomicU32,
}

impl FlakyRates {
    pub fn failing_first(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures: AtomicU32::new(failures),
        })
    }
}

#[async_trait]
impl RateQuery for FlakyRates {
    async fn exchange_rates(&self) -> ChainResult<Vec<ExchangeRate>> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ChainError::Status {
                status: 503,
                path: "exchange_rates".to_string(),
            });
        }
        Ok(reference_rates())
    }
}

/// Broadcaster recording every message list; fails the attempts listed.
#[derive(Default)]
pub struct RecordingBroadcaster {
    sent: Mutex<Vec<Vec<OracleMsg>>>,
    fail_attempts: Vec<usize>,
}

impl RecordingBroadcaster {
    pub fn failing_on(attempts: &[usize]) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail_attempts: attempts.to_vec(),
        })
    }

    pub fn sent(&self) -> Vec<Vec<OracleMsg>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn broadcast(&self, msgs: &[OracleMsg]) -> ChainResult<TxHash> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(msgs.to_vec());
        let attempt = sent.len();
        if self.fail_attempts.contains(&attempt) {
            Err(ChainError::Rejected {
                code: 19,
                log: "tx already in mempool".to_string(),
            })
        } else {
            Ok(TxHash(format!("HASH{}", attempt)))
        }
    }
}

/// Counting salt source that fails on the listed calls (1-based).
pub struct FailingSalt {
    calls: AtomicU32,
    fail_calls: Vec<u32>,
}

impl FailingSalt {
    pub fn failing_on(calls: &[u32]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            fail_calls: calls.to_vec(),
        })
    }
}

impl SaltSource for FailingSalt {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_calls.contains(&call) {
            return Err(rand::Error::new("entropy source unavailable"));
        }
        let bytes = (call as u16).to_be_bytes();
        for (i, b) in dest.iter_mut().enumerate() {
            *b = bytes[i % 2];
        }
        Ok(())
    }
}

/// The reveal carried by a transaction, if any.
pub fn reveal_of(msgs: &[OracleMsg]) -> Option<VoteMessage> {
    msgs.iter().find_map(|m| match m {
        OracleMsg::Vote(v) => Some(v.clone()),
        OracleMsg::Prevote(_) => None,
    })
}

/// The prevote hash carried by a transaction.
pub fn prevote_hash_of(msgs: &[OracleMsg]) -> Option<String> {
    msgs.iter().find_map(|m| match m {
        OracleMsg::Prevote(p) => Some(p.hash.clone()),
        OracleMsg::Vote(_) => None,
    })
}
