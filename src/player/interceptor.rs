use lazy_static::lazy_static;
use regex::Regex;

use super::config::{
    AD_URL_PATTERN, BRIDGE_SCHEME, EMBED_URL_PATTERN, OAUTH_URL_PATTERN,
    STATIC_PROXY_URL_PATTERN, SYNDICATION_URL_PATTERN,
};

lazy_static! {
    static ref PLAYER_INTERNAL_URLS: Vec<Regex> = [
        EMBED_URL_PATTERN,
        AD_URL_PATTERN,
        OAUTH_URL_PATTERN,
        STATIC_PROXY_URL_PATTERN,
        SYNDICATION_URL_PATTERN,
    ]
    .iter()
    .filter_map(|pattern| match Regex::new(&format!("(?i){}", pattern)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::error!("Interceptor: invalid url pattern '{}': {}", pattern, e);
            None
        }
    })
    .collect();
    static ref URL_PARTS: Option<Regex> =
        Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):(?://(?:[^@/?#]*@)?([^/?#:]*))?").ok();
}

/// How an outgoing navigation from the surface is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    /// A `ytplayer:` notification. Decode it and cancel the navigation.
    Notification,
    /// Content that belongs in the host shell, not in the player surface.
    OpenExternal,
    Allow,
}

/// Classifies navigations in a fixed order: bridge scheme, external-open, allow.
#[derive(Debug, Clone, Default)]
pub struct NavigationInterceptor {
    document_urls: Vec<String>,
    document_hosts: Vec<String>,
}

impl NavigationInterceptor {
    /// `origin` is the url the player document is loaded under. Only that exact
    /// url counts as the document; other pages on the same host open externally.
    pub fn new(origin: &str) -> Self {
        let mut interceptor = NavigationInterceptor::default();
        let document_url = normalized(origin);
        if !document_url.is_empty() {
            interceptor.document_urls.push(document_url);
        }
        interceptor
    }

    /// Treats `host` as part of the player document, never opened externally.
    pub fn allow_host(mut self, host: &str) -> Self {
        let host = host.to_ascii_lowercase();
        if !host.is_empty() && !self.document_hosts.contains(&host) {
            self.document_hosts.push(host);
        }
        self
    }

    pub fn classify(&self, url: &str) -> NavigationAction {
        let Some(scheme) = scheme_of(url) else {
            return NavigationAction::Allow;
        };

        if scheme.eq_ignore_ascii_case(BRIDGE_SCHEME) {
            return NavigationAction::Notification;
        }

        if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
            let candidate = normalized(url);
            if self.document_urls.iter().any(|document| *document == candidate) {
                return NavigationAction::Allow;
            }
            if let Some(host) = host_of(url) {
                if self.document_hosts.iter().any(|allowed| *allowed == host) {
                    return NavigationAction::Allow;
                }
            }
            if PLAYER_INTERNAL_URLS.iter().any(|pattern| pattern.is_match(url)) {
                return NavigationAction::Allow;
            }
            return NavigationAction::OpenExternal;
        }

        NavigationAction::Allow
    }
}

// Lowercased, without fragment or trailing slash.
fn normalized(url: &str) -> String {
    let url = url.trim();
    let url = url.split('#').next().unwrap_or_default();
    url.trim_end_matches('/').to_ascii_lowercase()
}

fn scheme_of(url: &str) -> Option<&str> {
    URL_PARTS
        .as_ref()?
        .captures(url.trim())
        .and_then(|captures| captures.get(1))
        .map(|scheme| scheme.as_str())
}

fn host_of(url: &str) -> Option<String> {
    URL_PARTS
        .as_ref()?
        .captures(url.trim())
        .and_then(|captures| captures.get(2))
        .map(|host| host.as_str().to_ascii_lowercase())
        .filter(|host| !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interceptor() -> NavigationInterceptor {
        NavigationInterceptor::new("https://www.youtube.com")
    }

    #[test]
    fn bridge_scheme_wins_over_everything() {
        let interceptor = interceptor();
        assert_eq!(
            interceptor.classify("ytplayer://onReady?data=null"),
            NavigationAction::Notification
        );
        assert_eq!(
            interceptor.classify("YTPLAYER://onStateChange?data=1"),
            NavigationAction::Notification
        );
    }

    #[test]
    fn document_origin_and_embeds_stay_inside() {
        let interceptor = interceptor();
        assert_eq!(interceptor.classify("https://www.youtube.com/"), NavigationAction::Allow);
        assert_eq!(interceptor.classify("https://www.youtube.com"), NavigationAction::Allow);
        assert_eq!(
            interceptor.classify("https://www.youtube.com/embed/M7lc1UVf-VE?enablejsapi=1"),
            NavigationAction::Allow
        );
        assert_eq!(
            interceptor.classify("https://accounts.google.com/o/oauth2/postmessageRelay"),
            NavigationAction::Allow
        );
        assert_eq!(
            interceptor.classify("https://tpc.googlesyndication.com/sodar/abc.html"),
            NavigationAction::Allow
        );
        assert_eq!(
            interceptor.classify("https://pubads.g.doubleclick.net/pagead/conversion/?ai=1"),
            NavigationAction::Allow
        );
    }

    #[test]
    fn other_web_content_opens_externally() {
        let interceptor = NavigationInterceptor::new("ytembed://localhost/player");
        assert_eq!(
            interceptor.classify("https://www.youtube.com/watch?v=M7lc1UVf-VE"),
            NavigationAction::OpenExternal
        );
        assert_eq!(
            interceptor.classify("http://example.com/ad-landing"),
            NavigationAction::OpenExternal
        );
        assert_eq!(
            interceptor.classify("https://m.youtube.com/embed/x"),
            NavigationAction::OpenExternal
        );
    }

    #[test]
    fn pages_on_the_origin_host_open_externally() {
        let interceptor = interceptor();
        assert_eq!(
            interceptor.classify("https://www.youtube.com/watch?v=M7lc1UVf-VE"),
            NavigationAction::OpenExternal
        );
        assert_eq!(
            interceptor.classify("https://www.youtube.com/channel/UC123"),
            NavigationAction::OpenExternal
        );
    }

    #[test]
    fn lookalike_hosts_do_not_count_as_origin() {
        let interceptor = interceptor();
        assert_eq!(
            interceptor.classify("https://www.youtube.com.evil.test/embed/x"),
            NavigationAction::OpenExternal
        );
    }

    #[test]
    fn non_web_schemes_are_allowed() {
        let interceptor = interceptor();
        assert_eq!(interceptor.classify("about:blank"), NavigationAction::Allow);
        assert_eq!(interceptor.classify("ytembed://localhost/player-1"), NavigationAction::Allow);
        assert_eq!(interceptor.classify("not a url"), NavigationAction::Allow);
    }

    #[test]
    fn extra_document_hosts_are_allowed() {
        let interceptor = interceptor().allow_host("YTEmbed.localhost");
        assert_eq!(
            interceptor.classify("http://ytembed.localhost/player-3"),
            NavigationAction::Allow
        );
    }
}
