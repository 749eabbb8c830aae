//! Supported-languages request and response messages.

use std::collections::BTreeMap;

use glossa_core::StatusCode;
use serde::{Deserialize, Serialize};

use crate::msg::{MsgType, PROTOCOL_VERSION};

/// A supported-languages request; envelope only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppLangReq {
    /// Protocol version.
    pub prot_ver: u32,
    /// Message-type tag; always [`MsgType::SuppLangReq`].
    pub msg_type: u32,
}

impl SuppLangReq {
    /// Build a request.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prot_ver: PROTOCOL_VERSION,
            msg_type: MsgType::SuppLangReq.as_u32(),
        }
    }
}

impl Default for SuppLangReq {
    fn default() -> Self {
        Self::new()
    }
}

/// A supported-languages response.
///
/// `langs` maps each source language onto the target languages reachable
/// from it. A `BTreeMap` keeps the serialised form deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppLangResp {
    /// Protocol version.
    pub prot_ver: u32,
    /// Message-type tag; always [`MsgType::SuppLangResp`].
    pub msg_type: u32,
    /// Response status.
    pub stat_code: StatusCode,
    /// Human-readable status detail.
    pub stat_msg: String,
    /// Source language → reachable target languages.
    pub langs: BTreeMap<String, Vec<String>>,
}

impl SuppLangResp {
    /// Build a successful response for the given language map.
    #[must_use]
    pub fn new(langs: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            prot_ver: PROTOCOL_VERSION,
            msg_type: MsgType::SuppLangResp.as_u32(),
            stat_code: StatusCode::Ok,
            stat_msg: String::new(),
            langs,
        }
    }

    /// Whether the pair `source → target` is listed.
    #[must_use]
    pub fn supports(&self, source: &str, target: &str) -> bool {
        self.langs
            .get(source)
            .is_some_and(|targets| targets.iter().any(|t| t == target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_checks_the_pair() {
        let mut langs = BTreeMap::new();
        langs.insert("en".to_owned(), vec!["de".to_owned(), "fr".to_owned()]);
        let resp = SuppLangResp::new(langs);

        assert!(resp.supports("en", "de"));
        assert!(resp.supports("en", "fr"));
        assert!(!resp.supports("en", "nl"));
        assert!(!resp.supports("de", "en"));
    }

    #[test]
    fn languages_serialize_deterministically() {
        let mut langs = BTreeMap::new();
        langs.insert("nl".to_owned(), vec!["en".to_owned()]);
        langs.insert("en".to_owned(), vec!["de".to_owned()]);
        let a = serde_json::to_string(&SuppLangResp::new(langs.clone())).unwrap();
        let b = serde_json::to_string(&SuppLangResp::new(langs)).unwrap();
        assert_eq!(a, b);
        // BTreeMap orders keys, "en" before "nl".
        assert!(a.find("\"en\"").unwrap() < a.find("\"nl\"").unwrap());
    }
}
