//! Iterative resolution, ported from the original implementation's
//! `resolve_with_ttl` (`src/resolver.cpp`): start at a root server, follow
//! referrals down through the delegation chain using glue when it's offered
//! and sub-resolving NS names when it isn't, chase CNAMEs, and cap both the
//! referral walk and the CNAME chain so a malicious or broken zone can't spin
//! this forever.
use std::collections::HashSet;
use std::net::IpAddr;

use log::{debug, trace};

use crate::cache::SharedCache;
use crate::error::DNSResult;
use crate::transport::Transport;
use crate::wire::{build_query, parse_response, AnswerRecord, QType};

/// Seed servers for the walk down from the root. A mix of well-known public
/// resolvers and IANA root servers, queried in order until one answers.
pub const ROOT_SERVERS: &[&str] = &[
    "1.1.1.1",
    "8.8.8.8",
    "9.9.9.9",
    "198.41.0.4",   // a.root-servers.net
    "199.9.14.201", // b.root-servers.net
];

/// Referrals followed (and recursive sub-resolutions of ungloued NS names)
/// before giving up, matching the original's depth guard.
const MAX_REFERRAL_DEPTH: usize = 16;
/// CNAME hops followed before declaring a loop.
const MAX_CNAME_CHAIN: usize = 16;

/// The outcome of a resolution: the answers found, the TTL they should be
/// cached under, and whether the name doesn't exist at all.
#[derive(Debug, Clone, Default)]
pub struct DnsResult {
    pub answers: Vec<String>,
    pub min_ttl: u32,
    pub nxdomain: bool,
}

fn is_ip_literal(qtype: QType, s: &str) -> bool {
    match qtype {
        QType::AAAA => s.parse::<std::net::Ipv6Addr>().is_ok(),
        _ => s.parse::<std::net::Ipv4Addr>().is_ok(),
    }
}

/// Resolve `domain` for `qtype`, starting from `ROOT_SERVERS` and following
/// the delegation chain. This is the TTL-aware form; see [`resolve`] for the
/// plain answer-list form the original also exposed.
///
/// Never throws: a timed-out nameserver list, a referral chain too deep, or a
/// CNAME chain too long all collapse into an empty `DnsResult` rather than an
/// error, matching `resolver.cpp`'s `DnsResult{}` fallthrough.
pub fn resolve_with_ttl<T: Transport>(transport: &T, domain: &str, qtype: QType) -> DnsResult {
    let mut current_name = domain.trim_end_matches('.').to_string();
    let mut visited_cnames: HashSet<String> = HashSet::new();
    let mut chain_ttl: u32 = 0;

    for _ in 0..MAX_CNAME_CHAIN {
        let step = match resolve_one_name(transport, &current_name, qtype, MAX_REFERRAL_DEPTH) {
            Ok(step) => step,
            Err(e) => {
                debug!("giving up resolving {}: {}", current_name, e);
                return DnsResult::default();
            }
        };

        if step.nxdomain {
            return DnsResult { answers: vec![], min_ttl: 60, nxdomain: true };
        }

        chain_ttl = combine_ttl(chain_ttl, step.min_ttl);

        let wants_address = matches!(qtype, QType::A | QType::AAAA);
        if wants_address && step.answers.len() == 1 && !is_ip_literal(qtype, &step.answers[0].value) {
            if let Some(cname_target) = step
                .answers
                .iter()
                .find(|a| a.rtype == QType::CNAME)
                .map(|a| a.value.clone())
            {
                if !visited_cnames.insert(current_name.clone()) {
                    debug!("CNAME loop detected at {}", current_name);
                    return DnsResult::default();
                }
                debug!("following CNAME {} -> {}", current_name, cname_target);
                current_name = cname_target;
                continue;
            }
        }

        let answers = step.answers.into_iter().map(|a| a.value).collect();
        return DnsResult { answers, min_ttl: chain_ttl, nxdomain: false };
    }

    debug!("CNAME chain too long resolving {}", domain);
    DnsResult::default()
}

/// Min-TTL-across-the-chain combinator, treating an unset (0) running total
/// as "no constraint yet" the way the original's CNAME-chase loop does.
fn combine_ttl(running: u32, next: u32) -> u32 {
    match (running, next) {
        (0, n) => n,
        (r, 0) => r,
        (r, n) => r.min(n),
    }
}

#[derive(Default)]
struct StepResult {
    answers: Vec<AnswerRecord>,
    min_ttl: u32,
    nxdomain: bool,
}

/// Walk referrals for one name (no CNAME chasing here; that's the caller's
/// job) starting from the root servers.
fn resolve_one_name<T: Transport>(
    transport: &T,
    name: &str,
    qtype: QType,
    max_depth: usize,
) -> DNSResult<StepResult> {
    let mut servers: Vec<IpAddr> = ROOT_SERVERS
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    for depth in 0..max_depth {
        let mut last_err = None;
        let mut answered = None;

        for &server in &servers {
            trace!("querying {} for {} {}", server, name, qtype);
            let query = build_query(name, qtype)?;
            debug!("query bytes: {}", format_buffer!("X", &query));
            match transport.send_and_recv(server, &query) {
                Ok(bytes) => {
                    answered = Some(parse_response(&bytes, qtype)?);
                    break;
                }
                Err(e) => {
                    trace!("server {} failed: {:?}", server, e);
                    last_err = Some(e);
                    continue;
                }
            }
        }

        let parsed = match answered {
            Some(p) => p,
            None => {
                debug!("nameserver list exhausted for {}: {:?}", name, last_err);
                return Ok(StepResult::default());
            }
        };

        if parsed.is_nxdomain() {
            return Ok(StepResult { answers: vec![], min_ttl: 0, nxdomain: true });
        }

        if !parsed.answers.is_empty() {
            let min_ttl = parsed.min_ttl();
            return Ok(StepResult { answers: parsed.answers, min_ttl, nxdomain: false });
        }

        if !parsed.authority_ns.is_empty() {
            servers = next_hop_servers(transport, &parsed, depth, max_depth)?;
            if servers.is_empty() {
                debug!("referral for {} produced no usable next-hop servers", name);
                return Ok(StepResult::default());
            }
            continue;
        }

        // no answers, no referral: treat as an empty, non-authoritative result
        return Ok(StepResult { answers: vec![], min_ttl: 0, nxdomain: false });
    }

    debug!("referral chain too deep for {}", name);
    Ok(StepResult::default())
}

/// Turn a referral into the next set of servers to query: prefer glue
/// addresses shipped in the additional section, and only fall back to
/// resolving an NS name from scratch when no glue was offered for it.
fn next_hop_servers<T: Transport>(
    transport: &T,
    parsed: &crate::wire::ParsedResponse,
    depth: usize,
    max_depth: usize,
) -> DNSResult<Vec<IpAddr>> {
    let mut servers = Vec::new();

    for ns_name in &parsed.authority_ns {
        if let Some(glued) = parsed.glue.get(&ns_name.to_ascii_lowercase()) {
            if let Ok(addr) = glued.parse() {
                servers.push(addr);
                continue;
            }
        }

        if depth + 1 >= max_depth {
            continue; // don't spend remaining depth sub-resolving glueless NS names
        }
        if let Ok(sub) = resolve_one_name(transport, ns_name, QType::A, max_depth - depth - 1) {
            for a in sub.answers {
                if let Ok(addr) = a.value.parse() {
                    servers.push(addr);
                }
            }
        }
    }

    Ok(servers)
}

/// The original's no-TTL convenience form: just the answer strings.
pub fn resolve<T: Transport>(transport: &T, domain: &str, qtype: QType) -> Vec<String> {
    resolve_with_ttl(transport, domain, qtype).answers
}

/// Cache key: domain plus the numeric QTYPE, matching the original's
/// `domain + "|" + qtype_code` scheme. Exposed so callers (like the CLI's
/// `--show-ttl` cache-only lookup) can probe the cache without resolving.
pub fn cache_key(domain: &str, qtype: QType) -> String {
    format!("{}|{}", domain.to_ascii_lowercase(), qtype.code())
}

/// The floor applied to whatever TTL actually came back, so a record with a
/// 0 or tiny TTL doesn't get re-fetched on every single lookup.
const MIN_CACHE_TTL: u64 = 60;

/// Resolve through the cache: serve a fresh hit, otherwise resolve and
/// populate the cache, clamping both positive and NXDOMAIN TTLs to at least
/// `MIN_CACHE_TTL` seconds the way the original's `main.cpp` does.
///
/// Takes the cache behind its shared, mutex-guarded handle so concurrent
/// callers can resolve through the same cache without racing each other.
pub fn resolve_cached<T: Transport>(
    transport: &T,
    cache: &SharedCache<String, DnsResult>,
    domain: &str,
    qtype: QType,
) -> DnsResult {
    let key = cache_key(domain, qtype);

    if let Some((cached, _ttl_left)) = cache.lock().unwrap().get(&key) {
        return cached;
    }

    let result = resolve_with_ttl(transport, domain, qtype);
    let ttl_to_cache = if result.min_ttl == 0 { MIN_CACHE_TTL } else { (result.min_ttl as u64).max(MIN_CACHE_TTL) };
    cache.lock().unwrap().put(key, result.clone(), ttl_to_cache);
    result
}
