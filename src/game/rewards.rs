//! Reward and rejection media pools.

/// Numbered media pools for placement feedback.
#[derive(Debug, Clone)]
pub struct RewardPools {
    /// Number of firework images available
    pub fireworks: usize,
    /// Number of cheer sounds available
    pub cheers: usize,
}

impl Default for RewardPools {
    fn default() -> Self {
        Self {
            fireworks: 10,
            cheers: 7,
        }
    }
}

impl RewardPools {
    pub fn firework_path(&self, index: usize) -> String {
        format!("fireworks/firework_{}.jpeg", index % self.fireworks.max(1))
    }

    pub fn cheer_path(&self, index: usize) -> String {
        format!("yay/yay_{}.mp3", index % self.cheers.max(1))
    }

    /// Path of the fixed incorrect-answer sound.
    pub fn rejection_path(&self) -> &'static str {
        "nope.mp3"
    }

    /// Pick a pool index from the current time.
    pub fn pick(&self, pool_size: usize) -> usize {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as usize % pool_size.max(1))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_stay_in_pool() {
        let pools = RewardPools::default();
        assert_eq!(pools.firework_path(3), "fireworks/firework_3.jpeg");
        assert_eq!(pools.firework_path(13), "fireworks/firework_3.jpeg");
        assert_eq!(pools.cheer_path(8), "yay/yay_1.mp3");
    }

    #[test]
    fn test_pick_in_range() {
        let pools = RewardPools::default();
        for _ in 0..10 {
            assert!(pools.pick(pools.fireworks) < pools.fireworks);
            assert!(pools.pick(pools.cheers) < pools.cheers);
        }
    }
}
