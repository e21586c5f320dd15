//! Word pools for synthetic text.

use rand::seq::SliceRandom;
use rand::Rng;

const WORDS: &[&str] = &[
    "agreement", "quarterly", "review", "budget", "forecast", "meeting", "contract", "invoice",
    "schedule", "approval", "draft", "revision", "counsel", "privileged", "confidential",
    "shipment", "vendor", "pricing", "account", "balance", "audit", "compliance", "policy",
    "settlement", "deposition", "exhibit", "memo", "summary", "proposal", "estimate", "delivery",
    "warehouse", "inventory", "payroll", "benefits", "renewal", "lease", "property", "insurance",
    "claim", "escalation", "update", "minutes", "agenda", "timeline", "milestone", "deadline",
    "the", "and", "for", "with", "regarding", "pending", "attached", "please", "confirm",
    "before", "after", "during", "following", "revised", "final", "internal", "external",
];

pub const CUSTODIANS: &[&str] = &[
    "Adams, Jordan", "Baker, Morgan", "Chen, Riley", "Diaz, Casey", "Evans, Taylor",
    "Foster, Avery", "Garcia, Quinn", "Hughes, Parker", "Ito, Rowan", "Jensen, Skyler",
];

pub const DOMAINS: &[&str] = &["example.com", "example.org", "corp.example", "legal.example"];

pub fn word<R: Rng>(rng: &mut R) -> &'static str {
    WORDS.choose(rng).copied().unwrap_or("document")
}

pub fn pick<R: Rng>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or("")
}

/// Capitalized sentence of `len` words ending with a period.
pub fn sentence<R: Rng>(rng: &mut R, len: usize) -> String {
    let mut out = String::with_capacity(len * 9);
    for i in 0..len.max(1) {
        let w = word(rng);
        if i == 0 {
            let mut chars = w.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push(' ');
            out.push_str(w);
        }
    }
    out.push('.');
    out
}

/// Paragraph of `sentences` sentences of 6-14 words.
pub fn paragraph<R: Rng>(rng: &mut R, sentences: usize) -> String {
    let mut parts = Vec::with_capacity(sentences);
    for _ in 0..sentences.max(1) {
        let len = rng.gen_range(6..=14);
        parts.push(sentence(rng, len));
    }
    parts.join(" ")
}
