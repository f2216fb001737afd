//! User agent rotation for browser launches.

use rand::seq::IndexedRandom;

/// Built-in desktop browser user agents.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:140.0) Gecko/20100101 Firefox/140.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:140.0) Gecko/20100101 Firefox/140.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.5 Safari/605.1.15",
];

/// Pool of user agents to pick from.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Use the configured agents, or the built-in list when none are given.
    pub fn from_config(agents: &[String]) -> Self {
        let agents: Vec<String> = agents
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        if agents.is_empty() {
            Self::default()
        } else {
            Self { agents }
        }
    }

    /// Pick a random agent.
    pub fn pick(&self) -> &str {
        self.agents
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self {
            agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Pick a random entry from a configured list (proxies), if any.
pub fn pick_random(items: &[String]) -> Option<&str> {
    items.choose(&mut rand::rng()).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_falls_back_to_builtin() {
        let pool = UserAgentPool::from_config(&[]);
        assert_eq!(pool.len(), DEFAULT_USER_AGENTS.len());
        assert!(pool.pick().contains("Mozilla"));
    }

    #[test]
    fn blank_entries_are_ignored() {
        let pool = UserAgentPool::from_config(&["  ".to_string()]);
        assert_eq!(pool.len(), DEFAULT_USER_AGENTS.len());
    }

    #[test]
    fn configured_pool_is_used() {
        let pool = UserAgentPool::from_config(&["MyBot/1.0".to_string()]);
        assert_eq!(pool.len(), 1);
        for _ in 0..10 {
            assert_eq!(pool.pick(), "MyBot/1.0");
        }
    }

    #[test]
    fn pick_random_from_list() {
        assert_eq!(pick_random(&[]), None);

        let proxies = vec![
            "http://10.0.0.1:80".to_string(),
            "http://10.0.0.2:8080".to_string(),
        ];
        for _ in 0..20 {
            let picked = pick_random(&proxies).unwrap();
            assert!(proxies.iter().any(|p| p == picked));
        }
    }
}
