use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SEPARATED: Regex = Regex::new(r"[:\-_]+[a-zA-Z]").unwrap();
    static ref HUMP: Regex = Regex::new(r"[a-z][A-Z]").unwrap();
}

/// `user_name`, `user-name` and `user:name` become `userName`
pub fn camel_case(text: &str) -> String {
    SEPARATED
        .replace_all(text, |caps: &regex::Captures| {
            let matched = &caps[0];
            matched[matched.len() - 1..].to_ascii_uppercase()
        })
        .into_owned()
}

/// Like [`camel_case`] with the first letter uppercased
pub fn big_camel_case(text: &str) -> String {
    first_upper(&camel_case(text))
}

pub fn first_upper(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `userName` becomes `user_name`
pub fn underline_case(text: &str) -> String {
    HUMP.replace_all(text, |caps: &regex::Captures| {
        let matched = &caps[0];
        format!("{}_{}", &matched[..1], &matched[1..])
    })
    .to_lowercase()
}

/// Splits a dotted identifier into path segments; empty text has no segments
pub fn split_path(ident: &str) -> Vec<&str> {
    if ident.is_empty() {
        Vec::new()
    } else {
        ident.split('.').collect()
    }
}
