use payment_webhook_relay::config::AppConfig;
use std::collections::HashMap;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
}

const REQUIRED: [(&str, &str); 4] = [
    ("MIDTRANS_SERVER_KEY", "SB-Mid-server-TEST"),
    ("WAPISENDER_API_KEY", "wa-api"),
    ("WAPISENDER_DEVICE_KEY", "wa-device"),
    ("INTERNAL_API_KEY", "admin"),
];

#[test]
fn defaults_apply_when_only_secrets_are_set() {
    let cfg = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();
    assert_eq!(cfg.midtrans.server_key.reveal(), "SB-Mid-server-TEST");
    assert_eq!(cfg.midtrans.snap_base_url, "https://app.sandbox.midtrans.com");
    assert_eq!(cfg.midtrans.api_base_url, "https://api.sandbox.midtrans.com");
    assert!(cfg.midtrans.verify_status);
    assert_eq!(cfg.outbound_timeout_ms, 3000);
    assert!(!cfg.notify_on_pending);
    assert_eq!(cfg.notify_queue_capacity, 256);
    assert_eq!(cfg.rate_limit_per_minute, 60);
    assert_eq!(cfg.poll_interval_secs, 30);
    assert_eq!(cfg.poll_min_age_secs, 120);
}

#[test]
fn production_flag_switches_endpoints() {
    let mut vars = REQUIRED.to_vec();
    vars.push(("MIDTRANS_IS_PRODUCTION", "true"));
    vars.push(("NOTIFY_ON_PENDING", "1"));
    vars.push(("OUTBOUND_TIMEOUT_MS", "5000"));
    let cfg = AppConfig::from_lookup(lookup(&vars)).unwrap();
    assert_eq!(cfg.midtrans.snap_base_url, "https://app.midtrans.com");
    assert_eq!(cfg.midtrans.api_base_url, "https://api.midtrans.com");
    assert!(cfg.notify_on_pending);
    assert_eq!(cfg.outbound_timeout_ms, 5000);
}

#[test]
fn each_secret_is_required() {
    for (missing, _) in REQUIRED {
        let vars: Vec<(&str, &str)> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains(missing), "{missing}: {err}");
    }
}

#[test]
fn blank_secret_counts_as_missing() {
    let mut vars = REQUIRED.to_vec();
    vars.retain(|(k, _)| *k != "MIDTRANS_SERVER_KEY");
    vars.push(("MIDTRANS_SERVER_KEY", "   "));
    assert!(AppConfig::from_lookup(lookup(&vars)).is_err());
}

#[test]
fn malformed_numbers_are_rejected() {
    let mut vars = REQUIRED.to_vec();
    vars.push(("NOTIFY_QUEUE_CAPACITY", "lots"));
    let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
    assert!(err.to_string().contains("NOTIFY_QUEUE_CAPACITY"));
}

#[test]
fn secrets_do_not_leak_through_debug() {
    let cfg = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("SB-Mid-server-TEST"));
    assert!(!rendered.contains("wa-device"));
}

#[test]
fn readiness_endpoints_exist_in_readme() {
    let readme = std::fs::read_to_string("README.md").unwrap_or_default();
    assert!(readme.contains("/ops/readiness"));
    assert!(readme.contains("/ops/liveness"));
    assert!(readme.contains("/webhook/midtrans"));
    assert!(readme.contains("/admin/notifications/:id/retry"));
}
