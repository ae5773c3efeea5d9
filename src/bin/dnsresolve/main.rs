//! A small iterative DNS resolver, command line front-end.
use std::time::Instant;

use dnslib::cache::{shared_cache, SharedCache};
use dnslib::resolver::{cache_key, resolve_cached};
use dnslib::transport::UdpTransport;
use dnslib::{DNSResult, DnsResult};

mod args;
use args::CliOptions;

fn main() -> DNSResult<()> {
    let options = CliOptions::options()?;

    if options.trace {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();
    } else {
        env_logger::init();
    }

    let transport = UdpTransport::new();
    let cache: SharedCache<String, DnsResult> = shared_cache(512);

    if options.show_ttl {
        show_cached_ttl(&cache, &options);
        return Ok(());
    }

    if let Some(iterations) = options.bench {
        run_bench(&transport, &cache, &options, iterations);
        return Ok(());
    }

    let result = dnslib::resolve_with_ttl(&transport, &options.domain, options.qtype);

    if result.nxdomain {
        println!("NXDOMAIN");
        std::process::exit(1);
    }

    for answer in &result.answers {
        println!("{}", answer);
    }

    Ok(())
}

/// `--show-ttl`: a cache-only lookup, the way `main.cpp`'s flag of the same
/// name queried the `LruTtlCache` without touching the network.
fn show_cached_ttl(cache: &SharedCache<String, DnsResult>, options: &CliOptions) {
    let key = cache_key(&options.domain, options.qtype);
    match cache.lock().unwrap().get(&key) {
        Some((_, ttl_left)) => println!("{}", ttl_left),
        None => println!("no entry"),
    }
}

/// Repeat the resolution through a local cache and report hit/miss timing,
/// the way `main.cpp`'s `--bench=N` flag did against its `LruTtlCache`.
/// Purges expired entries between runs, the way the original called its
/// cache's sweep opportunistically rather than on a timer.
fn run_bench(
    transport: &UdpTransport,
    cache: &SharedCache<String, DnsResult>,
    options: &CliOptions,
    iterations: u32,
) {
    for i in 0..iterations {
        let start = Instant::now();
        let result = resolve_cached(transport, cache, &options.domain, options.qtype);

        if options.trace {
            println!(
                "[{:>3}] {:?} answers={} min_ttl={}",
                i,
                start.elapsed(),
                result.answers.len(),
                result.min_ttl
            );
        }

        cache.lock().unwrap().purge_expired();
    }

    let guard = cache.lock().unwrap();
    println!("cache hits={} misses={}", guard.hits(), guard.misses());
}
