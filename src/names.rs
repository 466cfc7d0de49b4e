/*
 * Copyright (c) 2017, Alan Chen
 * See LICENCE file for BSD-2 terms
 */

//! camera make/model name cleanup

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// vendor make strings -> short names
static MAKE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("NIKON CORPORATION", "Nikon"),
        ("NIKON", "Nikon"),
        ("FUJIFILM", "Fujifilm"),
        ("Sony Ericsson", "Sony"),
        ("OLYMPUS IMAGING CORP.", "Olympus"),
        ("SIGMA", "Sigma"),
        ("LEICA", "Leica"),
        ("RICOH IMAGING COMPANY, LTD.", "Ricoh"),
        ("KODAK", "Kodak"),
        ("LG Electronics", "LG"),
        ("samsung", "Samsung"),
    ]
    .iter()
    .cloned()
    .collect()
});

static MODEL_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [("FinePix X100", "X100")].iter().cloned().collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static NOT_NAME_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9-]+").expect("name char regex"));

pub fn normalize_make(raw: &str) -> String
{
    normalize_with(&MAKE_MAP, raw)
}

pub fn normalize_model(raw: &str) -> String
{
    normalize_with(&MODEL_MAP, raw)
}

/// Table lookup first, then trim / hyphenate / strip. The cleaned name gets
/// one more lookup so that e.g. "NIKON " lands on the same name as "NIKON".
fn normalize_with(table: &HashMap<&'static str, &'static str>, raw: &str) -> String
{
    if let Some(name) = table.get(raw) {
        return String::from(*name);
    }

    let cleaned = generic_normalize(raw);
    match table.get(cleaned.as_str()) {
        Some(name) => String::from(*name),
        None => cleaned,
    }
}

fn generic_normalize(raw: &str) -> String
{
    let hyphenated = WHITESPACE.replace_all(raw.trim(), "-");
    NOT_NAME_CHAR.replace_all(&hyphenated, "").into_owned()
}
