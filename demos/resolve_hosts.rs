use hostresolver::base::neterror::NetError;
use hostresolver::dns::{
    HostResolverConfig, ResolutionRequest, ResolveListener, ResolverHandle, ResolverPool,
    SystemLookup,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

struct PrintListener;

impl ResolveListener for PrintListener {
    fn on_resolved(&self, request: &ResolutionRequest) {
        let addrs = request.addresses().map(|list| {
            list.iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        });
        println!("{} -> {}", request.hostname(), addrs.unwrap_or_default());
    }

    fn on_resolution_failed(&self, request: &ResolutionRequest, error: NetError) {
        println!("{} -> error {} ({})", request.hostname(), error, error.as_i32());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=hostresolver=debug shows dispatch and retry decisions
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut hosts: Vec<String> = std::env::args().skip(1).collect();
    if hosts.is_empty() {
        hosts = vec!["localhost".into(), "example.com".into(), "nonexistent.invalid".into()];
    }

    // A JSON file in HOSTRESOLVER_CONFIG overrides the defaults
    let config = match std::env::var("HOSTRESOLVER_CONFIG") {
        Ok(path) => HostResolverConfig::from_file(path)?,
        Err(_) => HostResolverConfig::default().with_max_threads(4),
    };

    let pool = ResolverPool::with_config(SystemLookup::new(), config);
    let listener: Arc<dyn ResolveListener> = Arc::new(PrintListener);

    let mut handles = Vec::with_capacity(hosts.len());
    for host in &hosts {
        let mut handle = ResolverHandle::new(&pool, Arc::clone(&listener));
        if let Err(e) = handle.resolve(host.as_str()) {
            println!("{host} -> rejected: {e}");
        }
        handles.push(handle);
    }

    pool.run_until_idle().await;
    println!("{:?}", pool.stats());

    drop(handles);
    pool.shutdown()?;
    Ok(())
}
