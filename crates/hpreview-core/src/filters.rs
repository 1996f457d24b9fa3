//! Noise stripping and shape normalization (§4.3.1-4.3.2).

use serde_json::Value as Json;

use crate::path::NoisePattern;

/// Fields whose changes never carry semantic meaning for any resource kind.
pub const DEFAULT_NOISE_PATHS: &[&str] = &[
    "status",
    "metadata.creationTimestamp",
    "metadata.resourceVersion",
    "metadata.uid",
    "metadata.generation",
    "metadata.managedFields",
    "metadata.selfLink",
    "metadata.annotations.kubectl\\.kubernetes\\.io/last-applied-configuration",
];

/// Noise paths CRD diffing adds on top of [`DEFAULT_NOISE_PATHS`] (§4.5.2).
pub const CRD_EXTRA_NOISE_PATHS: &[&str] = &[
    "metadata.annotations.meta\\.helm\\.sh/*",
    "metadata.annotations.kubectl\\.kubernetes\\.io/last-applied-configuration",
    "metadata.labels.helm\\.sh/chart",
];

/// Remove noise keys from a deep copy of `value`; the original is untouched.
pub fn strip_noise(value: &Json, noise_paths: &[String]) -> Json {
    let mut out = value.clone();
    for pattern_str in noise_paths {
        let pattern = NoisePattern::parse(pattern_str);
        strip_one(&mut out, pattern.prefix_keys(), &pattern);
    }
    out
}

fn strip_one(node: &mut Json, remaining_prefix: &[String], pattern: &NoisePattern) {
    let Json::Object(map) = node else { return };
    if remaining_prefix.is_empty() {
        let to_remove: Vec<String> = map
            .keys()
            .filter(|k| pattern.matches_last(k))
            .cloned()
            .collect();
        for k in to_remove {
            map.shift_remove(&k);
        }
        return;
    }
    if let Some(child) = map.get_mut(&remaining_prefix[0]) {
        strip_one(child, &remaining_prefix[1..], pattern);
    }
}

/// Apply all normalization rules from §4.3.2. Idempotent.
pub fn normalize_body(value: &Json) -> Json {
    let mut out = value.clone();
    normalize_recursive(&mut out);
    out
}

fn normalize_recursive(node: &mut Json) {
    match node {
        Json::Object(map) => {
            for (key, child) in map.iter_mut() {
                normalize_recursive(child);
                if (key == "cpu" || key == "memory") && child.is_string() {
                    if let Json::String(s) = child {
                        if let Some(canonical) = canonicalize_quantity(s) {
                            *child = Json::String(canonical);
                        }
                    }
                }
            }
            if let Some(ports) = map.get_mut("ports") {
                sort_by_numeric_key(ports, "containerPort");
            }
            for key in ["volumeMounts", "env", "envFrom", "imagePullSecrets", "tolerations"] {
                if let Some(seq) = map.get_mut(key) {
                    sort_by_first_matching_key(seq, &["name", "key", "mountPath", "secretName"]);
                }
            }
        }
        Json::Array(items) => {
            for item in items.iter_mut() {
                normalize_recursive(item);
            }
        }
        _ => {}
    }
}

fn sort_by_numeric_key(value: &mut Json, key: &str) {
    let Json::Array(items) = value else { return };
    if !items.iter().all(|v| v.as_object().is_some_and(|o| o.contains_key(key))) {
        return;
    }
    items.sort_by_key(|v| v[key].as_i64().unwrap_or(0));
}

fn sort_by_first_matching_key(value: &mut Json, candidate_keys: &[&str]) {
    let Json::Array(items) = value else { return };
    if items.is_empty() || !items.iter().all(Json::is_object) {
        return;
    }
    let sort_key = candidate_keys
        .iter()
        .find(|k| items.iter().all(|v| v.as_object().unwrap().contains_key(**k)));
    if let Some(key) = sort_key {
        items.sort_by(|a, b| {
            a[*key]
                .as_str()
                .unwrap_or_default()
                .cmp(b[*key].as_str().unwrap_or_default())
        });
    }
}

/// Canonicalize a Kubernetes quantity string to an exact reduced fraction
/// `"<numerator>/<denominator>"`, so `"1000m" == "1"` and `"1024Mi" == "1Gi"`
/// compare equal without floating-point rounding. Returns `None` (leave the
/// string untouched) if `s` does not parse as a quantity.
pub fn canonicalize_quantity(s: &str) -> Option<String> {
    let (num, den) = parse_quantity(s)?;
    Some(format!("{num}/{den}"))
}

fn parse_quantity(s: &str) -> Option<(i128, i128)> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let split_at = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(s.len());
    let (num_str, suffix) = s.split_at(split_at);
    let (num, den) = parse_decimal(num_str)?;
    let (mul_num, mul_den) = suffix_multiplier(suffix)?;
    let (num, den) = (num * mul_num, den * mul_den);
    let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i128;
    Some((num / g, den / g))
}

fn parse_decimal(s: &str) -> Option<(i128, i128)> {
    if s.is_empty() {
        return None;
    }
    let negative = s.starts_with('-');
    let s = s.trim_start_matches(['+', '-']);
    match s.split_once('.') {
        Some((int_part, frac_part)) => {
            let int_part = if int_part.is_empty() { "0" } else { int_part };
            let digits: String = format!("{int_part}{frac_part}");
            let value: i128 = digits.parse().ok()?;
            let den = 10i128.checked_pow(frac_part.len() as u32)?;
            let value = if negative { -value } else { value };
            Some((value, den))
        }
        None => {
            let value: i128 = s.parse().ok()?;
            let value = if negative { -value } else { value };
            Some((value, 1))
        }
    }
}

fn suffix_multiplier(suffix: &str) -> Option<(i128, i128)> {
    Some(match suffix {
        "" => (1, 1),
        "n" => (1, 1_000_000_000),
        "u" => (1, 1_000_000),
        "m" => (1, 1_000),
        "k" | "K" => (1_000, 1),
        "M" => (1_000_000, 1),
        "G" => (1_000_000_000, 1),
        "T" => (1_000_000_000_000, 1),
        "P" => (1_000_000_000_000_000, 1),
        "E" => (1_000_000_000_000_000_000, 1),
        "Ki" => (1024, 1),
        "Mi" => (1024i128.pow(2), 1),
        "Gi" => (1024i128.pow(3), 1),
        "Ti" => (1024i128.pow(4), 1),
        "Pi" => (1024i128.pow(5), 1),
        "Ei" => (1024i128.pow(6), 1),
        _ => return None,
    })
}

fn gcd(a: u128, b: u128) -> u128 {
    if b == 0 { a } else { gcd(b, a % b) }
}
