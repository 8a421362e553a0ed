//! Strata - An In-Process Multi-Type Key-Value Store
//!
//! This is a demonstration driver. It exercises every command family
//! against a shared store, runs a multi-threaded stress pass and finishes
//! with an explicit expiry sweep.

use anyhow::{bail, Context};
use bytes::Bytes;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use strata::SharedStore;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Longest TTL the expiry demo will wait out.
const MAX_TTL_SECS: i64 = 3600;

/// Demo configuration
struct Config {
    /// Number of writer threads in the stress pass
    threads: usize,
    /// SET + GET pairs per thread
    ops_per_thread: usize,
    /// TTL used by the expiry demo, in seconds. Always positive.
    ttl_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 10,
            ops_per_thread: 1000,
            ttl_secs: 2,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> anyhow::Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        Self::parse(&args)
    }

    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut config = Config::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--threads" | "-t" => {
                    config.threads = parse_value(args, i)?;
                    i += 2;
                }
                "--ops" | "-n" => {
                    config.ops_per_thread = parse_value(args, i)?;
                    i += 2;
                }
                "--ttl" => {
                    config.ttl_secs = parse_value(args, i)?;
                    i += 2;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("Strata version {}", strata::VERSION);
                    std::process::exit(0);
                }
                other => {
                    print_help();
                    bail!("unknown argument: {}", other);
                }
            }
        }

        if config.threads == 0 {
            bail!("--threads must be at least 1");
        }
        if !(1..=MAX_TTL_SECS).contains(&config.ttl_secs) {
            bail!("--ttl must be between 1 and {} seconds", MAX_TTL_SECS);
        }

        Ok(config)
    }
}

/// Parses the value following the flag at `args[i]`.
fn parse_value<T>(args: &[String], i: usize) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let flag = &args[i];
    let raw = args
        .get(i + 1)
        .with_context(|| format!("{} requires a value", flag))?;
    raw.parse()
        .with_context(|| format!("invalid value for {}: {}", flag, raw))
}

fn print_help() {
    println!(
        r#"
Strata - In-Process Multi-Type Key-Value Store (demo)

USAGE:
    strata [OPTIONS]

OPTIONS:
    -t, --threads <N>    Writer threads in the stress pass (default: 10)
    -n, --ops <N>        SET + GET pairs per thread (default: 1000)
        --ttl <SECS>     TTL used by the expiry demo, 1 to 3600 (default: 2)
    -v, --version        Print version information
    -h, --help           Print this help message

LOGGING:
    Set RUST_LOG to control verbosity, e.g. RUST_LOG=strata=debug
"#
    );
}

fn b(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

fn show(value: Option<Bytes>) -> String {
    value
        .map(|v| String::from_utf8_lossy(&v).into_owned())
        .unwrap_or_else(|| "(nil)".to_string())
}

fn demo_strings(store: &SharedStore) {
    info!("── STRING operations ──");

    store.set(b("name"), b("Ariz"), 0);
    store.set(b("role"), b("Backend Engineer"), 0);

    info!(value = %show(store.get(b"name")), "GET name");
    info!(value = %show(store.get(b"role")), "GET role");
    info!(exists = store.exists(b"name"), "EXISTS name");
    if let Some(kind) = store.key_type(b"name") {
        info!(%kind, "TYPE name");
    }
}

fn demo_lists(store: &SharedStore) {
    info!("── LIST operations ──");

    store.rpush(b("tasks"), vec![b("Write code"), b("Review PR"), b("Deploy")]);
    store.lpush(b("tasks"), vec![b("Fix bug")]);
    info!(len = store.llen(b"tasks"), "RPUSH + LPUSH tasks");

    for (i, task) in store.lrange(b"tasks", 0, -1).into_iter().enumerate() {
        info!(index = i, task = %show(Some(task)), "LRANGE tasks 0 -1");
    }

    info!(value = %show(store.lpop(b"tasks")), "LPOP tasks");
    info!(len = store.llen(b"tasks"), "LLEN tasks");
}

fn demo_sets(store: &SharedStore) {
    info!("── SET operations ──");

    let added = store.sadd(b("skills"), vec![b("rust"), b("redis"), b("backend")]);
    info!(added, "SADD skills rust redis backend");

    let added = store.sadd(b("skills"), vec![b("rust"), b("python")]);
    info!(added, "SADD skills rust python (rust is a duplicate)");

    info!(member = store.sismember(b"skills", b"rust"), "SISMEMBER skills rust");
    info!(member = store.sismember(b"skills", b"java"), "SISMEMBER skills java");
    info!(card = store.scard(b"skills"), "SCARD skills");
}

fn demo_hashes(store: &SharedStore) {
    info!("── HASH operations ──");

    store.hset(b("user:1001"), b("name"), b("Alice"));
    store.hset(b("user:1001"), b("email"), b("alice@example.com"));
    store.hset(b("user:1001"), b("age"), b("28"));

    info!(value = %show(store.hget(b"user:1001", b"name")), "HGET user:1001 name");
    info!(exists = store.hexists(b"user:1001", b"phone"), "HEXISTS user:1001 phone");

    for (field, value) in store.hgetall(b"user:1001") {
        info!(field = %show(Some(field)), value = %show(Some(value)), "HGETALL user:1001");
    }
    info!(len = store.hlen(b"user:1001"), "HLEN user:1001");
}

fn demo_mixed(store: &SharedStore) {
    info!("── Mixed types ──");

    for key in store.keys() {
        let kind = store
            .key_type(&key)
            .map_or("none", |kind| kind.as_str());
        info!(key = %show(Some(key)), kind, "KEYS *");
    }
    info!(size = store.size(), "DBSIZE");
}

fn demo_expiry(store: &SharedStore, ttl_secs: i64) {
    info!("── TTL and expiry ──");

    store.set(b("session"), b("abc123"), ttl_secs);
    store.sadd(b("online"), vec![b("alice")]);
    store.expire(b"online", ttl_secs);
    info!(ttl = store.ttl(b"session"), "TTL session");

    thread::sleep(Duration::from_secs(ttl_secs.unsigned_abs()) + Duration::from_millis(100));

    // `online` is never read, so only the sweep removes it
    info!(
        value = %show(store.get(b"session")),
        ttl = store.ttl(b"session"),
        "GET session after expiry"
    );
    let removed = store.cleanup_expired();
    info!(removed, size = store.size(), "Expired keys swept");
}

fn stress(store: &Arc<SharedStore>, config: &Config) -> anyhow::Result<()> {
    info!(
        threads = config.threads,
        ops = config.ops_per_thread,
        "── Thread safety stress pass ──"
    );

    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|id| {
            let store = Arc::clone(store);
            let ops = config.ops_per_thread;
            thread::spawn(move || {
                let mut corrupted = 0usize;
                for i in 0..ops {
                    let key = format!("thread:{}:count:{}", id, i);
                    let value = Bytes::from(i.to_string());
                    store.set(Bytes::from(key.clone()), value.clone(), 0);
                    if store.get(key.as_bytes()).as_ref() != Some(&value) {
                        corrupted += 1;
                    }
                }
                corrupted
            })
        })
        .collect();

    let mut corrupted = 0;
    for handle in handles {
        match handle.join() {
            Ok(count) => corrupted += count,
            Err(_) => bail!("stress worker panicked"),
        }
    }

    let elapsed = start.elapsed();
    if corrupted > 0 {
        bail!("{} reads did not observe their own write", corrupted);
    }

    let total_ops = config.threads * config.ops_per_thread * 2;
    let ops_per_sec = total_ops as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        total_ops,
        ops_per_sec = ops_per_sec as u64,
        "Stress pass completed"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_args()?;

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    info!("Strata v{} demo", strata::VERSION);

    let store = Arc::new(SharedStore::new());

    demo_strings(&store);
    demo_lists(&store);
    demo_sets(&store);
    demo_hashes(&store);
    demo_mixed(&store);
    demo_expiry(&store, config.ttl_secs);
    stress(&store, &config).context("thread safety stress pass failed")?;

    let expected = config.threads * config.ops_per_thread;
    let stats = store.stats();
    info!(
        size = store.size(),
        reads = stats.read_ops,
        writes = stats.write_ops,
        expired = stats.expired,
        "Final DBSIZE"
    );
    if store.size() < expected {
        warn!(expected, "Fewer keys than the stress pass wrote");
    }

    Ok(())
}
